use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Per-extension page-action state attached to a tab.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAction {
    pub enabled: bool,
}

/// Represents one browsing surface owned by exactly one window.
///
/// `id == 0` is the reserved "no tab" sentinel and never appears in the
/// tab store; real ids start at 1 and are never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: i32,
    pub window_id: i32,
    pub url: String,
    pub status_text: Option<String>,
    pub favicon: Option<String>,
    pub title: Option<String>,
    pub is_loading: bool,
    pub is_searching: bool,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub can_refresh: bool,
    pub error: bool,
    pub has_media: bool,
    pub is_audio_muted: bool,
    pub page_action_mapping: HashMap<String, PageAction>,
}

impl Tab {
    /// Title assigned when a main-frame load fails. Tabs carrying it are
    /// skipped by history recording and the recently-closed list.
    pub const ERROR_TITLE: &'static str = "error";

    /// Creates a blank tab record for `window_id` pointing at `url`.
    /// The caller assigns the id from the allocator.
    pub fn new(window_id: i32, url: impl Into<String>) -> Self {
        Self {
            id: 0,
            window_id,
            url: url.into(),
            status_text: None,
            favicon: None,
            title: None,
            is_loading: false,
            is_searching: false,
            can_go_back: false,
            can_go_forward: false,
            can_refresh: false,
            error: false,
            has_media: false,
            is_audio_muted: false,
            page_action_mapping: HashMap::new(),
        }
    }

    pub fn has_error_title(&self) -> bool {
        self.title.as_deref() == Some(Self::ERROR_TITLE)
    }
}
