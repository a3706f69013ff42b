// tabshell shared type definitions
// Each submodule defines types used across the state machine and the bridge.

pub mod config;
pub mod download;
pub mod frame;
pub mod history;
pub mod tab;
pub mod window;

pub use config::{classify_internal, internal_page_title, InternalUrl, ShellConfig};
pub use download::{DownloadProgress, DownloadTask};
pub use frame::FrameInfo;
pub use history::{HistoryEntry, RecentlyClosedTab};
pub use tab::{PageAction, Tab};
pub use window::Window;
