use serde::{Deserialize, Serialize};

/// A top-level container of tabs.
///
/// The active-tab cursor is not stored here: it is a per-window index kept
/// by the window registry inside the tab state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    pub window_id: i32,
    pub width: i32,
    pub height: i32,
    pub x: i32,
    pub y: i32,
    pub window_state: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub focused: bool,
}

impl Window {
    pub fn new(window_id: i32) -> Self {
        Self {
            window_id,
            width: 0,
            height: 0,
            x: 0,
            y: 0,
            window_state: "normal".to_string(),
            kind: "normal".to_string(),
            focused: false,
        }
    }
}
