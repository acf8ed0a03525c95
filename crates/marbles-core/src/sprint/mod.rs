mod engine;

pub use engine::{Phase, SprintEngine, SprintEvent, StatusSnapshot};
