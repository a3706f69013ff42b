//! Tab state machine for tabshell.
//!
//! Owns the ordered tab store, the window registry (per-window active-tab
//! cursor plus optional custom display order) and the history, download and
//! permission ledgers. Every mutation below is total: a lookup miss is a
//! silent no-op because lifecycle events race with closes and the bridge can
//! observe entities slightly out of date.
//!
//! Mutators return a clone of the affected record so the shell layer can
//! notify event-hub subscribers without re-reading state.

use std::collections::HashMap;

use crate::managers::download_ledger::DownloadLedger;
use crate::managers::history_ledger::HistoryLedger;
use crate::managers::id_allocator::TabIdAllocator;
use crate::managers::permission_ledger::PermissionLedger;
use crate::types::{
    classify_internal, internal_page_title, DownloadProgress, DownloadTask, InternalUrl,
    RecentlyClosedTab, ShellConfig, Tab, Window,
};

pub struct TabState {
    ids: TabIdAllocator,
    config: ShellConfig,
    tabs: Vec<Tab>,
    windows: Vec<Window>,
    /// Per-window active-tab cursor, indexing into that window's tab
    /// sequence (not the global store).
    current_tab_indexes: HashMap<i32, usize>,
    /// Optional per-window display order: display position -> array position.
    tabs_order: HashMap<i32, Vec<usize>>,
    history: HistoryLedger,
    downloads: DownloadLedger,
    permissions: PermissionLedger,
    recently_closed: Vec<RecentlyClosedTab>,
}

impl TabState {
    pub fn new(config: ShellConfig) -> Self {
        Self {
            ids: TabIdAllocator::new(),
            config,
            tabs: Vec::new(),
            windows: Vec::new(),
            current_tab_indexes: HashMap::new(),
            tabs_order: HashMap::new(),
            history: HistoryLedger::new(),
            downloads: DownloadLedger::new(),
            permissions: PermissionLedger::new(),
            recently_closed: Vec::new(),
        }
    }

    // ─── Lookups ───

    fn find_tab_index(&self, tab_id: i32) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == tab_id)
    }

    pub fn tab_by_id(&self, tab_id: i32) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == tab_id)
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    /// The window's tab sequence, in store order.
    pub fn window_tabs(&self, window_id: i32) -> Vec<&Tab> {
        self.tabs
            .iter()
            .filter(|t| t.window_id == window_id)
            .collect()
    }

    pub fn window_tab_count(&self, window_id: i32) -> usize {
        self.tabs.iter().filter(|t| t.window_id == window_id).count()
    }

    /// The tab at `index` within the window's sequence.
    pub fn window_tab_at(&self, window_id: i32, index: usize) -> Option<&Tab> {
        self.tabs
            .iter()
            .filter(|t| t.window_id == window_id)
            .nth(index)
    }

    /// Position of a tab within its window's sequence, looked up by id.
    pub fn tab_position_in_window(&self, window_id: i32, tab_id: i32) -> Option<usize> {
        self.tabs
            .iter()
            .filter(|t| t.window_id == window_id)
            .position(|t| t.id == tab_id)
    }

    /// The window's active-tab cursor (0 when the window never had one).
    pub fn current_tab_index(&self, window_id: i32) -> usize {
        self.current_tab_indexes.get(&window_id).copied().unwrap_or(0)
    }

    pub fn current_tab(&self, window_id: i32) -> Option<&Tab> {
        self.window_tab_at(window_id, self.current_tab_index(window_id))
    }

    /// Id of the most recently created tab (0 sentinel if none yet).
    pub fn last_allocated_id(&self) -> i32 {
        self.ids.current()
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    pub fn downloads(&self) -> &DownloadLedger {
        &self.downloads
    }

    pub fn permissions(&self) -> &PermissionLedger {
        &self.permissions
    }

    pub fn recently_closed(&self) -> &[RecentlyClosedTab] {
        &self.recently_closed
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn window(&self, window_id: i32) -> Option<&Window> {
        self.windows.iter().find(|w| w.window_id == window_id)
    }

    pub fn focused_window_id(&self) -> Option<i32> {
        self.windows.iter().find(|w| w.focused).map(|w| w.window_id)
    }

    // ─── Tab lifecycle ───

    /// Creates a tab for `window_id` and returns it.
    ///
    /// URL resolution: `is_url` takes the text verbatim; otherwise non-empty
    /// text is expanded through the search-engine template; no text opens
    /// the configured default page. The active cursor follows the new tab
    /// when it is the window's only tab or `follow` is set.
    pub fn create_tab(
        &mut self,
        window_id: i32,
        url: Option<&str>,
        is_url: bool,
        follow: bool,
    ) -> Tab {
        let resolved = match url {
            Some(u) if is_url => u.to_string(),
            Some(query) if !query.is_empty() => {
                format!("{}{}", self.config.search_url_template, query)
            }
            _ => self.config.default_url.clone(),
        };
        let mut tab = Tab::new(window_id, resolved);
        tab.id = self.ids.next();
        self.tabs.push(tab);

        let last = self.window_tab_count(window_id) - 1;
        if follow || last == 0 {
            self.current_tab_indexes.insert(window_id, last);
        }
        log::debug!("tab {} created in window {}", self.ids.current(), window_id);
        self.tabs[self.tabs.len() - 1].clone()
    }

    fn create_default_tab(&mut self, window_id: i32) -> Tab {
        self.create_tab(window_id, None, false, false)
    }

    /// Removes a tab and repairs the window's active cursor.
    ///
    /// `tab_index` is the tab's position within the window's sequence; the
    /// id is the authoritative key, the index drives cursor repair. Returns
    /// the removed tab, or `None` when the lookup missed.
    pub fn close_tab(&mut self, window_id: i32, tab_id: i32, tab_index: usize) -> Option<Tab> {
        let tabs_index = self.find_tab_index(tab_id)?;
        let window_count = self.window_tab_count(window_id);
        if tab_index >= window_count {
            return None;
        }

        let removed = self.tabs[tabs_index].clone();
        if !removed.has_error_title() {
            self.recently_closed.insert(
                0,
                RecentlyClosedTab {
                    title: removed.title.clone(),
                    url: removed.url.clone(),
                    favicon: removed.favicon.clone(),
                },
            );
        }

        if window_count == 1 {
            // Last tab of the window: heal with a fresh default tab so the
            // window is never left empty.
            self.tabs.remove(tabs_index);
            self.create_default_tab(window_id);
            self.current_tab_indexes.insert(window_id, 0);
            return Some(removed);
        }

        // Display-order mapping: array position -> display position,
        // identity when no custom order is recorded.
        let order = self.tabs_order.get(&window_id);
        let mapping: Vec<usize> = (0..window_count)
            .map(|pos| match order {
                Some(o) => o.iter().position(|&p| p == pos).unwrap_or(pos),
                None => pos,
            })
            .collect();

        let current = self.current_tab_index(window_id);
        self.tabs.remove(tabs_index);
        if current == tab_index {
            // The active tab is going away: walk display order forward from
            // the removed tab, then backward, and land on the nearest
            // neighbor that exists. Positions after the removed array slot
            // shift down by one, hence the -1 compensation.
            let mut repaired = None;
            for display in mapping[tab_index] + 1..window_count {
                if let Some(pos) = mapping.iter().position(|&d| d == display) {
                    repaired = Some(if pos > tab_index { pos - 1 } else { pos });
                    break;
                }
            }
            if repaired.is_none() {
                for display in (0..mapping[tab_index]).rev() {
                    if let Some(pos) = mapping.iter().position(|&d| d == display) {
                        repaired = Some(if pos > tab_index { pos - 1 } else { pos });
                        break;
                    }
                }
            }
            if let Some(repaired) = repaired {
                self.current_tab_indexes.insert(window_id, repaired);
            }
        } else if current > tab_index {
            self.current_tab_indexes.insert(window_id, current - 1);
        }

        // A display order that went stale after earlier closes can defeat
        // the neighbor scan; clamp so the cursor always lands on a tab.
        let remaining = window_count - 1;
        if self.current_tab_index(window_id) >= remaining {
            self.current_tab_indexes.insert(window_id, remaining - 1);
        }
        Some(removed)
    }

    /// Removes every tab of the window. No default tab is recreated: the
    /// caller is expected to close the window or create tabs explicitly.
    pub fn close_all_tabs(&mut self, window_id: i32) {
        self.tabs.retain(|t| t.window_id != window_id);
    }

    /// Points the active cursor at `tab_index`. Bounds are the caller's
    /// responsibility.
    pub fn activate_tab(&mut self, window_id: i32, tab_index: usize) {
        self.current_tab_indexes.insert(window_id, tab_index);
    }

    /// Installs a custom display order for the window. An empty sequence is
    /// ignored so a stray drag event cannot wipe an existing order.
    pub fn set_tabs_order(&mut self, window_id: i32, order: Vec<usize>) {
        if !order.is_empty() {
            self.tabs_order.insert(window_id, order);
        }
    }

    pub fn tabs_order(&self, window_id: i32) -> Option<&Vec<usize>> {
        self.tabs_order.get(&window_id)
    }

    // ─── Lifecycle event mutators (keyed by tab id) ───

    pub fn did_start_loading(&mut self, tab_id: i32, url: &str) -> Option<Tab> {
        let index = self.find_tab_index(tab_id)?;
        let tab = &mut self.tabs[index];
        tab.url = url.to_string();
        tab.is_loading = true;
        tab.error = false;
        Some(tab.clone())
    }

    pub fn load_commit(&mut self, tab_id: i32) -> Option<Tab> {
        let index = self.find_tab_index(tab_id)?;
        let tab = &mut self.tabs[index];
        tab.has_media = false;
        Some(tab.clone())
    }

    pub fn page_title_set(&mut self, tab_id: i32, title: &str) -> Option<Tab> {
        let index = self.find_tab_index(tab_id)?;
        let tab = &mut self.tabs[index];
        tab.title = Some(title.to_string());
        Some(tab.clone())
    }

    pub fn dom_ready(&mut self, tab_id: i32, can_go_back: bool, can_go_forward: bool) -> Option<Tab> {
        let index = self.find_tab_index(tab_id)?;
        let tab = &mut self.tabs[index];
        tab.can_go_back = can_go_back;
        tab.can_go_forward = can_go_forward;
        tab.can_refresh = true;
        Some(tab.clone())
    }

    /// Main-frame finish-load: updates the committed URL, synthesizes titles
    /// for internal pages, and records ordinary navigations into history.
    pub fn did_frame_finish_load(
        &mut self,
        tab_id: i32,
        url: &str,
        can_go_back: bool,
        can_go_forward: bool,
    ) -> Option<Tab> {
        let index = self.find_tab_index(tab_id)?;
        if url.is_empty() {
            return None;
        }
        self.tabs[index].url = url.to_string();
        match classify_internal(url) {
            Some(InternalUrl::Shell) => {
                self.tabs[index].title = Some(internal_page_title(url));
                self.tabs[index].favicon = Some(self.config.internal_favicon.clone());
            }
            Some(InternalUrl::Extension) => {
                self.tabs[index].status_text = None;
                self.tabs[index].can_go_back = can_go_back;
                self.tabs[index].can_go_forward = can_go_forward;
                self.tabs[index].is_loading = false;
                self.tabs[index].favicon = Some(self.config.internal_favicon.clone());
            }
            None => {
                if self.tabs[index].title.as_deref() == Some("") {
                    self.tabs[index].title = Some(self.tabs[index].url.clone());
                }
                if !self.tabs[index].has_error_title() {
                    let title = self.tabs[index]
                        .title
                        .clone()
                        .unwrap_or_else(|| self.tabs[index].url.clone());
                    let url = self.tabs[index].url.clone();
                    let favicon = Some(self.config.default_favicon.clone());
                    self.history.record(&title, &url, favicon);
                }
            }
        }
        self.tabs[index].is_loading = false;
        Some(self.tabs[index].clone())
    }

    pub fn page_favicon_updated(&mut self, tab_id: i32, favicon_url: &str) -> Option<Tab> {
        let index = self.find_tab_index(tab_id)?;
        let tab = &mut self.tabs[index];
        tab.favicon = Some(favicon_url.to_string());
        Some(tab.clone())
    }

    /// Stop-loading: settles navigation state and back-fills favicons into
    /// recent history for ordinary pages.
    pub fn did_stop_loading(
        &mut self,
        tab_id: i32,
        url: &str,
        can_go_back: bool,
        can_go_forward: bool,
    ) -> Option<Tab> {
        let index = self.find_tab_index(tab_id)?;
        if classify_internal(url).is_none() {
            if self.tabs[index].favicon.is_none() {
                self.tabs[index].favicon = Some(self.config.default_favicon.clone());
            }
            if !self.tabs[index].has_error_title() {
                let favicon = self.tabs[index].favicon.clone();
                self.history.refresh_favicon(url, favicon);
            }
        }
        let tab = &mut self.tabs[index];
        tab.can_go_back = can_go_back;
        tab.can_go_forward = can_go_forward;
        tab.status_text = None;
        tab.is_loading = false;
        Some(tab.clone())
    }

    /// Fail-load marks the tab with the error sentinel title, but only for
    /// main-frame failures; sub-frame failures leave the tab untouched.
    pub fn did_fail_load(&mut self, tab_id: i32, is_main_frame: bool) -> Option<Tab> {
        let index = self.find_tab_index(tab_id)?;
        if !is_main_frame {
            return None;
        }
        let tab = &mut self.tabs[index];
        tab.title = Some(Tab::ERROR_TITLE.to_string());
        tab.error = true;
        Some(tab.clone())
    }

    pub fn update_target_url(&mut self, tab_id: i32, url: &str) -> Option<Tab> {
        let index = self.find_tab_index(tab_id)?;
        let tab = &mut self.tabs[index];
        tab.status_text = Some(url.to_string());
        Some(tab.clone())
    }

    pub fn media_started_playing(&mut self, tab_id: i32, is_audio_muted: bool) -> Option<Tab> {
        let index = self.find_tab_index(tab_id)?;
        let tab = &mut self.tabs[index];
        tab.has_media = true;
        tab.is_audio_muted = is_audio_muted;
        Some(tab.clone())
    }

    pub fn media_paused(&mut self, tab_id: i32) -> Option<Tab> {
        let index = self.find_tab_index(tab_id)?;
        let tab = &mut self.tabs[index];
        tab.has_media = false;
        Some(tab.clone())
    }

    pub fn toggle_audio(&mut self, tab_id: i32, muted: bool) -> Option<Tab> {
        let index = self.find_tab_index(tab_id)?;
        let tab = &mut self.tabs[index];
        tab.is_audio_muted = muted;
        Some(tab.clone())
    }

    pub fn set_page_action(
        &mut self,
        tab_id: i32,
        extension_id: &str,
        enabled: bool,
    ) -> Option<Tab> {
        let index = self.find_tab_index(tab_id)?;
        let tab = &mut self.tabs[index];
        tab.page_action_mapping
            .entry(extension_id.to_string())
            .or_default()
            .enabled = enabled;
        Some(tab.clone())
    }

    pub fn clear_page_action(&mut self, tab_id: i32) -> Option<Tab> {
        let index = self.find_tab_index(tab_id)?;
        let tab = &mut self.tabs[index];
        tab.page_action_mapping.clear();
        Some(tab.clone())
    }

    // ─── Download mutators ───

    pub fn create_download_task(&mut self, task: DownloadTask) {
        self.downloads.create(task);
    }

    pub fn update_download_progress(&mut self, progress: DownloadProgress) {
        self.downloads.update_progress(progress);
    }

    pub fn complete_download(&mut self, start_time: i64, name: &str, data_state: &str) {
        self.downloads.complete(start_time, name, data_state);
    }

    pub fn hide_downloads(&mut self) {
        self.downloads.hide_all();
    }

    // ─── Permission mutator ───

    pub fn set_permission(&mut self, hostname: &str, permission: &str, accepted: bool) {
        self.permissions.set(hostname, permission, accepted);
    }

    // ─── Window registry ───

    pub fn create_window(&mut self, window: Window) {
        log::debug!("window {} created", window.window_id);
        self.windows.push(window);
    }

    /// Removes the window record only; its tabs are left in the store
    /// because window and tab lifecycles are deliberately decoupled here.
    pub fn close_window(&mut self, window_id: i32) {
        if let Some(index) = self.windows.iter().position(|w| w.window_id == window_id) {
            self.windows.remove(index);
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_window_properties(
        &mut self,
        window_id: i32,
        width: i32,
        height: i32,
        x: i32,
        y: i32,
        focused: bool,
        window_state: &str,
    ) -> Option<Window> {
        let window = self.windows.iter_mut().find(|w| w.window_id == window_id)?;
        window.width = width;
        window.height = height;
        window.x = x;
        window.y = y;
        window.focused = focused;
        window.window_state = window_state.to_string();
        Some(window.clone())
    }

    // ─── Preference setters ───

    pub fn set_search_engine_template(&mut self, template: &str) {
        self.config.search_url_template = template.to_string();
    }

    pub fn set_homepage(&mut self, homepage: &str) {
        self.config.homepage = homepage.to_string();
    }

    pub fn set_pdf_viewer(&mut self, pdf_viewer: &str) {
        self.config.pdf_viewer = pdf_viewer.to_string();
    }

    pub fn set_lang(&mut self, lang: &str) {
        self.config.lang = lang.to_string();
    }

    pub fn replace_history(&mut self, entries: Vec<crate::types::HistoryEntry>) {
        self.history.replace(entries);
    }

    pub fn replace_downloads(&mut self, tasks: Vec<DownloadTask>) {
        self.downloads.replace(tasks);
    }
}
