//! tabshell: the state-and-dispatch core of a multi-window tabbed shell.
//!
//! Two halves, wired by [`app::Shell`]:
//!
//! - the tab state machine ([`managers::tab_state::TabState`]): ordered tab
//!   store, per-window active cursors and display orders, plus the history,
//!   download and permission ledgers;
//! - the extension bridge ([`bridge::ExtensionBridge`]): per-window
//!   capability surface that resolves extension calls against the state
//!   machine and fans events out through [`events::EventHub`].
//!
//! The crate has no UI and no content surface of its own; those sit behind
//! the [`bridge::UiDelegate`] and [`bridge::MessageTransport`] seams.

pub mod app;
pub mod bridge;
pub mod events;
pub mod managers;
pub mod types;

pub use app::Shell;
pub use types::ShellConfig;
