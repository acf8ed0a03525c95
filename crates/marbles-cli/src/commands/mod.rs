pub mod config;
pub mod sprint;
