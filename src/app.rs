//! Shell composition root.
//!
//! `Shell` owns the single serialized tab state machine and the event hub,
//! wraps every mutation in lock-mutate-emit, and hands out per-window
//! extension bridges. All writers funnel through the one mutex, which is
//! what makes the ordering guarantees of the state machine hold.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::bridge::{ExtensionBridge, MessageTransport, UiDelegate};
use crate::events::{EventHub, NavigationEvent, TabActivated, TabRemoved, TabUpdated};
use crate::managers::tab_state::TabState;
use crate::types::{
    DownloadProgress, DownloadTask, HistoryEntry, ShellConfig, Tab, Window,
};

pub struct Shell {
    state: Arc<Mutex<TabState>>,
    hub: Arc<EventHub>,
    next_window_id: AtomicI32,
}

impl Shell {
    pub fn new(config: ShellConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(TabState::new(config))),
            hub: Arc::new(EventHub::new()),
            next_window_id: AtomicI32::new(1),
        }
    }

    pub fn state(&self) -> Arc<Mutex<TabState>> {
        Arc::clone(&self.state)
    }

    pub fn hub(&self) -> Arc<EventHub> {
        Arc::clone(&self.hub)
    }

    /// Builds the extension bridge for one window. Each window gets its own
    /// bridge; they all share this shell's state and hub.
    pub fn bridge(
        &self,
        window_id: i32,
        ui: Arc<dyn UiDelegate>,
        transport: Arc<dyn MessageTransport>,
    ) -> ExtensionBridge {
        ExtensionBridge::new(
            window_id,
            Arc::clone(&self.state),
            Arc::clone(&self.hub),
            ui,
            transport,
        )
    }

    fn lock(&self) -> MutexGuard<'_, TabState> {
        // A poisoned lock means a writer panicked mid-mutation; the state
        // itself is still structurally sound, so keep serving.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit_updated(&self, tab: &Tab) {
        self.hub.on_updated.emit(TabUpdated {
            tab_id: tab.id,
            tab: tab.clone(),
        });
    }

    // ─── Tab lifecycle ───

    pub fn create_tab(
        &self,
        window_id: i32,
        url: Option<&str>,
        is_url: bool,
        follow: bool,
    ) -> Tab {
        let tab = self.lock().create_tab(window_id, url, is_url, follow);
        self.hub.on_created.emit(tab.clone());
        if url.is_some() {
            self.hub.on_created_navigation_target.emit(NavigationEvent {
                tab_id: tab.id,
                url: tab.url.clone(),
            });
        }
        tab
    }

    pub fn close_tab(&self, window_id: i32, tab_id: i32, tab_index: usize) -> Option<Tab> {
        let removed = self.lock().close_tab(window_id, tab_id, tab_index)?;
        self.hub.on_removed.emit(TabRemoved {
            window_id,
            tab_id,
            index: tab_index,
        });
        Some(removed)
    }

    pub fn close_all_tabs(&self, window_id: i32) {
        self.lock().close_all_tabs(window_id);
    }

    /// User clicked a tab strip entry: move the cursor and announce it.
    pub fn click_tab(&self, window_id: i32, tab_index: usize) {
        let tab_id = {
            let mut state = self.lock();
            state.activate_tab(window_id, tab_index);
            state.window_tab_at(window_id, tab_index).map(|t| t.id)
        };
        if let Some(tab_id) = tab_id {
            self.hub.on_activated.emit(TabActivated {
                window_id,
                tab_id,
                index: tab_index,
            });
        }
    }

    pub fn set_tabs_order(&self, window_id: i32, order: Vec<usize>) {
        self.lock().set_tabs_order(window_id, order);
    }

    // ─── Lifecycle events from content surfaces ───

    pub fn did_start_loading(&self, tab_id: i32, url: &str) {
        if let Some(tab) = self.lock().did_start_loading(tab_id, url) {
            self.hub.on_before_navigate.emit(NavigationEvent {
                tab_id,
                url: tab.url.clone(),
            });
            self.emit_updated(&tab);
        }
    }

    pub fn load_commit(&self, tab_id: i32) {
        if let Some(tab) = self.lock().load_commit(tab_id) {
            self.hub.on_committed.emit(NavigationEvent {
                tab_id,
                url: tab.url.clone(),
            });
            self.emit_updated(&tab);
        }
    }

    pub fn page_title_set(&self, tab_id: i32, title: &str) {
        if let Some(tab) = self.lock().page_title_set(tab_id, title) {
            self.emit_updated(&tab);
        }
    }

    pub fn dom_ready(&self, tab_id: i32, can_go_back: bool, can_go_forward: bool) {
        if let Some(tab) = self.lock().dom_ready(tab_id, can_go_back, can_go_forward) {
            self.hub.on_dom_content_loaded.emit(NavigationEvent {
                tab_id,
                url: tab.url.clone(),
            });
            self.emit_updated(&tab);
        }
    }

    pub fn did_frame_finish_load(
        &self,
        tab_id: i32,
        url: &str,
        can_go_back: bool,
        can_go_forward: bool,
    ) {
        if let Some(tab) = self
            .lock()
            .did_frame_finish_load(tab_id, url, can_go_back, can_go_forward)
        {
            self.hub.on_completed.emit(NavigationEvent {
                tab_id,
                url: tab.url.clone(),
            });
            self.emit_updated(&tab);
        }
    }

    pub fn page_favicon_updated(&self, tab_id: i32, favicon_url: &str) {
        if let Some(tab) = self.lock().page_favicon_updated(tab_id, favicon_url) {
            self.emit_updated(&tab);
        }
    }

    pub fn did_stop_loading(&self, tab_id: i32, url: &str, can_go_back: bool, can_go_forward: bool) {
        if let Some(tab) = self
            .lock()
            .did_stop_loading(tab_id, url, can_go_back, can_go_forward)
        {
            self.emit_updated(&tab);
        }
    }

    pub fn did_fail_load(&self, tab_id: i32, is_main_frame: bool) {
        if let Some(tab) = self.lock().did_fail_load(tab_id, is_main_frame) {
            self.emit_updated(&tab);
        }
    }

    pub fn update_target_url(&self, tab_id: i32, url: &str) {
        if let Some(tab) = self.lock().update_target_url(tab_id, url) {
            self.emit_updated(&tab);
        }
    }

    pub fn media_started_playing(&self, tab_id: i32, is_audio_muted: bool) {
        if let Some(tab) = self.lock().media_started_playing(tab_id, is_audio_muted) {
            self.emit_updated(&tab);
        }
    }

    pub fn media_paused(&self, tab_id: i32) {
        if let Some(tab) = self.lock().media_paused(tab_id) {
            self.emit_updated(&tab);
        }
    }

    pub fn toggle_audio(&self, tab_id: i32, muted: bool) {
        if let Some(tab) = self.lock().toggle_audio(tab_id, muted) {
            self.emit_updated(&tab);
        }
    }

    pub fn set_page_action(&self, tab_id: i32, extension_id: &str, enabled: bool) {
        if let Some(tab) = self.lock().set_page_action(tab_id, extension_id, enabled) {
            self.emit_updated(&tab);
        }
    }

    pub fn clear_page_action(&self, tab_id: i32) {
        if let Some(tab) = self.lock().clear_page_action(tab_id) {
            self.emit_updated(&tab);
        }
    }

    // ─── Windows ───

    /// Registers a new window and returns its record.
    pub fn create_window(&self) -> Window {
        let window = Window::new(self.next_window_id.fetch_add(1, Ordering::SeqCst));
        self.lock().create_window(window.clone());
        window
    }

    pub fn close_window(&self, window_id: i32) {
        self.lock().close_window(window_id);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_window_properties(
        &self,
        window_id: i32,
        width: i32,
        height: i32,
        x: i32,
        y: i32,
        focused: bool,
        window_state: &str,
    ) -> Option<Window> {
        self.lock()
            .update_window_properties(window_id, width, height, x, y, focused, window_state)
    }

    // ─── Downloads ───

    pub fn create_download_task(&self, task: DownloadTask) {
        self.lock().create_download_task(task);
    }

    pub fn update_download_progress(&self, progress: DownloadProgress) {
        self.lock().update_download_progress(progress);
    }

    pub fn complete_download(&self, start_time: i64, name: &str, data_state: &str) {
        self.lock().complete_download(start_time, name, data_state);
    }

    pub fn hide_downloads(&self) {
        self.lock().hide_downloads();
    }

    // ─── Permissions ───

    pub fn set_permission(&self, hostname: &str, permission: &str, accepted: bool) {
        self.lock().set_permission(hostname, permission, accepted);
    }

    // ─── Preferences and restored session data ───

    pub fn set_search_engine_template(&self, template: &str) {
        self.lock().set_search_engine_template(template);
    }

    pub fn set_homepage(&self, homepage: &str) {
        self.lock().set_homepage(homepage);
    }

    pub fn set_pdf_viewer(&self, pdf_viewer: &str) {
        self.lock().set_pdf_viewer(pdf_viewer);
    }

    pub fn set_lang(&self, lang: &str) {
        self.lock().set_lang(lang);
    }

    pub fn replace_history(&self, entries: Vec<HistoryEntry>) {
        self.lock().replace_history(entries);
    }

    pub fn replace_downloads(&self, tasks: Vec<DownloadTask>) {
        self.lock().replace_downloads(tasks);
    }
}
