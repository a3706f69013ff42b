use serde::{Deserialize, Serialize};

/// One visit recorded by the history ledger, most-recent-first.
///
/// `label` is the visit date and `time` the clock time, pre-split for the
/// shell's grouped history view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub title: String,
    pub url: String,
    pub favicon: Option<String>,
    pub label: String,
    pub time: String,
}

/// Snapshot pushed onto the recently-closed list when a tab closes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentlyClosedTab {
    pub title: Option<String>,
    pub url: String,
    pub favicon: Option<String>,
}
