//! Collaborator seams of the extension bridge.
//!
//! The bridge never renders UI and never talks to a content surface
//! directly: it delegates through these traits. The shell's view layer
//! implements [`UiDelegate`]; whatever carries cross-context messages
//! implements [`MessageTransport`]. The core only calls them.

use serde_json::Value;

/// View-layer operations the bridge delegates to. Tab positions are indices
/// into the bridge window's tab sequence.
pub trait UiDelegate: Send + Sync {
    /// Open a new tab in `window_id`; `active` asks for focus to follow.
    fn on_new_tab(&self, window_id: i32, url: &str, active: bool);
    /// Focus the tab at `index` (user-visible activation).
    fn on_tab_click(&self, index: usize);
    /// Close the tab at `index`.
    fn on_tab_close(&self, index: usize);
    /// Duplicate the tab at `index`.
    fn on_tab_duplicate(&self, index: usize);

    // Content-surface operations.
    fn load_url(&self, index: usize, url: &str);
    fn reload(&self, index: usize);
    fn reload_ignoring_cache(&self, index: usize);
    fn execute_script(&self, index: usize, code: &str);
    fn insert_css(&self, index: usize, css: &str);
    fn send_to_page(&self, index: usize, message: Value);

    // Toolbar icon and badge setters.
    fn set_browser_action_icon(&self, extension_id: &str, path: &str);
    fn set_browser_action_badge_text(&self, extension_id: &str, text: &str);
    fn set_browser_action_badge_background_color(&self, extension_id: &str, color: &str);
    fn set_page_action_icon(&self, extension_id: &str, path: &str);

    /// Register context-menu items, already stamped with the originating
    /// context id.
    fn add_context_menus(&self, items: Vec<Value>, context_id: u32);

    // Content-surface introspection. The surface must be able to run code
    // and return a value; these are the values the bridge needs.
    /// Committed URL of the tab's top frame.
    fn page_url(&self, index: usize) -> Option<String>;
    /// URLs of the surface's subframes, document order.
    fn frame_urls(&self, index: usize) -> Vec<String>;
    /// OS process id backing the surface.
    fn os_process_id(&self, index: usize) -> i32;
    /// The page's reported language, if the surface can answer.
    fn page_language(&self, index: usize) -> Option<String>;
}

/// Fire-and-forget, at-most-once delivery of a named message to another
/// rendering context. No transport-level retry is expected.
pub trait MessageTransport: Send + Sync {
    fn send(&self, context_id: u32, channel: &str, payload: Value);
    /// Committed URL of a non-tab context (popup or background page).
    fn context_url(&self, context_id: u32) -> Option<String>;
}
