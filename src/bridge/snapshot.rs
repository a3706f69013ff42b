//! Bridge-owned tab snapshots.
//!
//! The bridge answers capability calls from a cache of lightweight tab
//! views rather than handing out state-machine records. A snapshot knows
//! its owning window, its position there, and the fields extension code
//! queries on; `tabs.query` rebuilds the whole cache in one pass.

use serde::{Deserialize, Serialize};

use crate::types::Tab;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabSnapshot {
    pub window_id: i32,
    pub id: i32,
    pub index: i32,
    pub active: bool,
    pub url: String,
    pub title: Option<String>,
    pub favicon: Option<String>,
}

impl TabSnapshot {
    pub fn new(window_id: i32, id: i32, index: i32, active: bool) -> Self {
        Self {
            window_id,
            id,
            index,
            active,
            url: String::new(),
            title: None,
            favicon: None,
        }
    }

    /// The "no such tab" value: id -1, index -1, no window.
    pub fn sentinel() -> Self {
        Self::new(0, -1, -1, false)
    }

    pub fn is_sentinel(&self) -> bool {
        self.id == -1
    }

    /// Refreshes the cached view from a state-machine record.
    pub fn refresh(&mut self, tab: &Tab) {
        self.url = tab.url.clone();
        self.title = tab.title.clone();
        self.favicon = tab.favicon.clone();
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}
