use serde::{Deserialize, Serialize};

/// One file download tracked by the download ledger.
///
/// `start_time` is the unique key: progress and completion updates match
/// tasks by it, never by position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadTask {
    pub start_time: i64,
    pub received_bytes: u64,
    pub save_path: Option<String>,
    pub is_paused: bool,
    pub can_resume: bool,
    pub data_state: String,
    pub name: String,
    pub style: String,
}

impl DownloadTask {
    pub fn new(start_time: i64, name: impl Into<String>) -> Self {
        Self {
            start_time,
            received_bytes: 0,
            save_path: None,
            is_paused: false,
            can_resume: false,
            data_state: "progressing".to_string(),
            name: name.into(),
            style: String::new(),
        }
    }
}

/// Fields carried by a download progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadProgress {
    pub start_time: i64,
    pub received_bytes: u64,
    pub save_path: Option<String>,
    pub is_paused: bool,
    pub can_resume: bool,
    pub data_state: String,
}
