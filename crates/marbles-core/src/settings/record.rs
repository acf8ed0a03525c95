//! The persisted settings record.

use serde::{Deserialize, Serialize};

/// User preferences, serialized as one flat JSON object.
///
/// `SprintTime` and `RestTime` stay strings on purpose: the host shows them
/// in text inputs and we keep whatever the user typed. They are parsed and
/// validated only when a sprint actually starts, not at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SettingsRecord {
    /// Sprint length in minutes, as typed by the user.
    pub sprint_time: String,
    /// Rest length in minutes, as typed by the user.
    pub rest_time: String,
    /// Sprints completed on `date_today`.
    pub marbles_done_today: i64,
    /// MM/DD/YYYY date the counter belongs to. Empty until the first sprint.
    pub date_today: String,
    pub show_sprint_badge: bool,
    pub show_rest_badge: bool,
    pub minimize_when_sprint_starts: bool,
    pub popup_when_rest_starts: bool,
    pub color_taskbar_during_sprint: bool,
    pub color_taskbar_during_rest: bool,
    pub show_yellow_flash_after_rest: bool,
    pub window_always_on_top: bool,
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Self {
            sprint_time: "25".to_string(),
            rest_time: "5".to_string(),
            marbles_done_today: 0,
            date_today: String::new(),
            show_sprint_badge: true,
            show_rest_badge: true,
            minimize_when_sprint_starts: false,
            popup_when_rest_starts: false,
            color_taskbar_during_sprint: true,
            color_taskbar_during_rest: true,
            show_yellow_flash_after_rest: true,
            window_always_on_top: false,
        }
    }
}

impl SettingsRecord {
    /// Clamp out-of-range values after a permissive parse. Most cleanup is
    /// already handled by the JSON type checks.
    pub fn sanitize(&mut self) {
        if self.marbles_done_today < 0 {
            self.marbles_done_today = 0;
        }
    }
}
