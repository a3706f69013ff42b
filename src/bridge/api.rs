//! Extension-facing capability surface.
//!
//! One `ExtensionBridge` serves one window. It translates capability calls
//! (tabs.*, runtime.*, browserAction.*, pageAction.*, contextMenus.*,
//! webNavigation.*) into tab state machine reads, collaborator delegations
//! and event-hub emissions, resolving the caller's rendering-context id to
//! a tab through the bridge-owned context mapping.
//!
//! Everything here is total: lookup misses come back as the sentinel
//! snapshot, and cross-window targets are ignored to protect window
//! isolation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::bridge::collaborators::{MessageTransport, UiDelegate};
use crate::bridge::frames;
use crate::bridge::snapshot::TabSnapshot;
use crate::events::{
    ActionClicked, EventHub, NavigationEvent, RuntimeMessage, TabActivated, TabRemoved, TabUpdated,
};
use crate::managers::tab_state::TabState;
use crate::types::Tab;

/// Transport channel names used for asynchronous call results.
pub mod channels {
    pub const TABS_CREATE_RESULT: &str = "tabshell-tabs-create-result";
    pub const TABS_DUPLICATE_RESULT: &str = "tabshell-tabs-duplicate-result";
    pub const TABS_DETECT_LANGUAGE_RESULT: &str = "tabshell-tabs-detect-language-result";
    pub const RUNTIME_SEND_MESSAGE: &str = "tabshell-runtime-send-message";
    pub const WEB_NAVIGATION_GET_FRAME_RESULT: &str = "tabshell-web-navigation-get-frame-result";
    pub const WEB_NAVIGATION_GET_ALL_FRAMES_RESULT: &str =
        "tabshell-web-navigation-get-all-frames-result";
}

// ─── Capability call parameter shapes ───

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IconDetails {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BadgeTextDetails {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BadgeColorDetails {
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InjectDetails {
    pub code: Option<String>,
}

/// `tabs.update` fields; an update naming neither is a valid empty update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProperties {
    pub url: Option<String>,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProperties {
    pub url: Option<String>,
    pub window_id: Option<i32>,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadProperties {
    #[serde(default)]
    pub bypass_cache: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFrameDetails {
    pub tab_id: i32,
    pub process_id: i32,
    pub frame_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAllFramesDetails {
    pub tab_id: i32,
}

/// `tabs.query` filter: field name (camelCase, as extension code spells it)
/// to required value. Empty filter matches every known tab.
pub type QueryInfo = HashMap<String, Value>;

fn payload<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

pub struct ExtensionBridge {
    window_id: i32,
    state: Arc<Mutex<TabState>>,
    hub: Arc<EventHub>,
    ui: Arc<dyn UiDelegate>,
    transport: Arc<dyn MessageTransport>,
    /// Rendering-context id -> index into this window's tab sequence.
    /// Bridge-owned; the state machine never touches it.
    mappings: Mutex<HashMap<u32, usize>>,
    /// Snapshot cache keyed by tab id; rebuilt wholesale by `tabs.query`.
    cache: Mutex<HashMap<i32, TabSnapshot>>,
    /// Extension id -> background-page context id.
    background_pages: Mutex<HashMap<String, u32>>,
}

impl ExtensionBridge {
    pub fn new(
        window_id: i32,
        state: Arc<Mutex<TabState>>,
        hub: Arc<EventHub>,
        ui: Arc<dyn UiDelegate>,
        transport: Arc<dyn MessageTransport>,
    ) -> Self {
        Self {
            window_id,
            state,
            hub,
            ui,
            transport,
            mappings: Mutex::new(HashMap::new()),
            cache: Mutex::new(HashMap::new()),
            background_pages: Mutex::new(HashMap::new()),
        }
    }

    pub fn window_id(&self) -> i32 {
        self.window_id
    }

    fn state(&self) -> MutexGuard<'_, TabState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn cache_lock(&self) -> MutexGuard<'_, HashMap<i32, TabSnapshot>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn mappings_lock(&self) -> MutexGuard<'_, HashMap<u32, usize>> {
        self.mappings.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn background_pages_lock(&self) -> MutexGuard<'_, HashMap<String, u32>> {
        self.background_pages.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Associates a rendering context with a tab position in this window.
    pub fn update_mapping(&self, context_id: u32, tab_index: usize) {
        self.mappings_lock().insert(context_id, tab_index);
    }

    /// Registers an extension's background page so runtime messages can be
    /// routed to it.
    pub fn register_background_page(&self, extension_id: &str, context_id: u32) {
        self.background_pages_lock()
            .insert(extension_id.to_string(), context_id);
    }

    // ─── Tab resolution ───

    /// Resolves a capability call's tab reference to a snapshot.
    ///
    /// - explicit id -1: the sentinel, immediately;
    /// - id 0 with an index: the tab at that position in this window;
    /// - id 0 alone: this window's currently active tab;
    /// - a real id: located by scanning this window's tab sequence;
    /// - no id at all: rebuilds the whole snapshot cache (query pass) and
    ///   returns the sentinel.
    ///
    /// With `active`, every other cached snapshot is deactivated first so at
    /// most one snapshot is active across the entire cache, and the focus
    /// change is delegated to the UI.
    pub fn resolve_tab(
        &self,
        active: bool,
        tab_id: Option<i32>,
        tab_index: Option<usize>,
    ) -> TabSnapshot {
        match tab_id {
            Some(-1) => TabSnapshot::sentinel(),
            Some(0) => self.resolve_in_own_window(active, tab_index),
            Some(id) => self.resolve_by_id(active, id),
            None => {
                self.rebuild_cache();
                TabSnapshot::sentinel()
            }
        }
    }

    fn resolve_in_own_window(&self, active: bool, tab_index: Option<usize>) -> TabSnapshot {
        let snap = {
            // Tab sequence and cursor must be read under the same lock so a
            // concurrent close cannot slip a stale index through.
            let state = self.state();
            let (index, refresh_only) = match tab_index {
                Some(i) => (i, true),
                None => (state.current_tab_index(self.window_id), false),
            };
            let Some(tab) = state.window_tab_at(self.window_id, index) else {
                return TabSnapshot::sentinel();
            };
            let mut cache = self.cache_lock();
            if refresh_only {
                let entry = cache
                    .entry(tab.id)
                    .or_insert_with(|| TabSnapshot::new(self.window_id, tab.id, index as i32, active));
                entry.index = index as i32;
                entry.refresh(tab);
                entry.clone()
            } else {
                let mut entry = TabSnapshot::new(self.window_id, tab.id, index as i32, active);
                entry.refresh(tab);
                cache.insert(tab.id, entry.clone());
                entry
            }
        };
        if snap.index != -1 && active {
            return self.activate_snapshot(snap.id);
        }
        snap
    }

    fn resolve_by_id(&self, active: bool, tab_id: i32) -> TabSnapshot {
        let snap = {
            let state = self.state();
            let mut cache = self.cache_lock();
            if !cache.contains_key(&tab_id) {
                let Some(position) = state.tab_position_in_window(self.window_id, tab_id) else {
                    return TabSnapshot::sentinel();
                };
                let mut entry =
                    TabSnapshot::new(self.window_id, tab_id, position as i32, active);
                if let Some(tab) = state.window_tab_at(self.window_id, position) {
                    entry.refresh(tab);
                }
                cache.insert(tab_id, entry);
            }
            match cache.get(&tab_id) {
                Some(entry) => entry.clone(),
                None => return TabSnapshot::sentinel(),
            }
        };
        if active {
            return self.activate_snapshot(snap.id);
        }
        snap
    }

    fn activate_snapshot(&self, tab_id: i32) -> TabSnapshot {
        let snap = {
            let mut cache = self.cache_lock();
            for entry in cache.values_mut() {
                entry.set_active(false);
            }
            let Some(entry) = cache.get_mut(&tab_id) else {
                return TabSnapshot::sentinel();
            };
            entry.set_active(true);
            entry.clone()
        };
        if snap.index >= 0 {
            self.ui.on_tab_click(snap.index as usize);
        }
        snap
    }

    fn rebuild_cache(&self) {
        let state = self.state();
        let mut cache = self.cache_lock();
        cache.clear();
        let current = state.current_tab_index(self.window_id);
        let mut positions: HashMap<i32, usize> = HashMap::new();
        for tab in state.tabs() {
            let slot = positions.entry(tab.window_id).or_insert(0);
            let position = *slot;
            *slot += 1;
            let active = tab.window_id == self.window_id && position == current;
            let mut entry = TabSnapshot::new(tab.window_id, tab.id, position as i32, active);
            entry.refresh(tab);
            cache.insert(tab.id, entry);
        }
    }

    // ─── env ───

    pub fn app_name(&self) -> &'static str {
        env!("CARGO_PKG_NAME")
    }

    pub fn app_version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    // ─── browserAction / pageAction ───

    pub fn browser_action_set_icon(
        &self,
        extension_id: &str,
        start_page: &str,
        details: &IconDetails,
    ) {
        if let Some(path) = &details.path {
            self.ui
                .set_browser_action_icon(extension_id, &format!("{}/{}", start_page, path));
        }
    }

    pub fn browser_action_set_badge_text(&self, extension_id: &str, details: &BadgeTextDetails) {
        if let Some(text) = &details.text {
            self.ui.set_browser_action_badge_text(extension_id, text);
        }
    }

    pub fn browser_action_set_badge_background_color(
        &self,
        extension_id: &str,
        details: &BadgeColorDetails,
    ) {
        if let Some(color) = &details.color {
            self.ui
                .set_browser_action_badge_background_color(extension_id, color);
        }
    }

    pub fn browser_action_on_clicked(&self, context_id: u32) -> UnboundedReceiver<ActionClicked> {
        if !self.mappings_lock().contains_key(&context_id) {
            log::trace!("browserAction.onClicked from unmapped context {}", context_id);
        }
        self.hub.browser_action_clicked.subscribe()
    }

    pub fn page_action_set_icon(&self, extension_id: &str, start_page: &str, details: &IconDetails) {
        if let Some(path) = &details.path {
            self.ui
                .set_page_action_icon(extension_id, &format!("{}/{}", start_page, path));
        }
    }

    pub fn page_action_on_clicked(&self, context_id: u32) -> UnboundedReceiver<ActionClicked> {
        if !self.mappings_lock().contains_key(&context_id) {
            log::trace!("pageAction.onClicked from unmapped context {}", context_id);
        }
        self.hub.page_action_clicked.subscribe()
    }

    // ─── runtime ───

    /// Routes a message to the target extension's background page. The
    /// sender description carries `{tab}` when the caller is a tab and
    /// `{url}` when it is a non-tab context such as a popup.
    pub fn runtime_send_message(
        &self,
        extension_id: &str,
        message: Value,
        external: bool,
        context_id: u32,
    ) {
        let tab_index = self.mappings_lock().get(&context_id).copied();
        let (sender, tab_id) = match tab_index {
            None => {
                let url = self.transport.context_url(context_id).unwrap_or_default();
                (json!({ "url": url }), None)
            }
            Some(index) => {
                let snap = self.resolve_tab(false, Some(0), Some(index));
                let tab_id = (!snap.is_sentinel()).then_some(snap.id);
                (json!({ "tab": snap }), tab_id)
            }
        };

        let event = RuntimeMessage {
            tab_id,
            external,
            message: message.clone(),
        };
        if external {
            self.hub.on_message_external.emit(event);
        } else {
            self.hub.on_message.emit(event);
        }

        if let Some(&background) = self.background_pages_lock().get(extension_id) {
            self.transport.send(
                background,
                channels::RUNTIME_SEND_MESSAGE,
                json!({ "external": external, "message": message, "sender": sender }),
            );
        } else {
            log::trace!("runtime message for unknown extension {}", extension_id);
        }
    }

    /// Subscribes to messages for the tab behind `context_id`; `None` when
    /// the context is not a tab.
    pub fn runtime_on_message(&self, context_id: u32) -> Option<UnboundedReceiver<RuntimeMessage>> {
        self.mappings_lock().contains_key(&context_id).then(|| self.hub.on_message.subscribe())
    }

    pub fn runtime_on_message_external(
        &self,
        context_id: u32,
    ) -> Option<UnboundedReceiver<RuntimeMessage>> {
        self.mappings_lock()
            .contains_key(&context_id)
            .then(|| self.hub.on_message_external.subscribe())
    }

    // ─── tabs ───

    pub fn tabs_get(&self, tab_id: i32) -> TabSnapshot {
        self.resolve_tab(false, Some(tab_id), None)
    }

    pub fn tabs_get_current(&self, context_id: u32) -> TabSnapshot {
        let tab_index = self.mappings_lock().get(&context_id).copied();
        match tab_index {
            Some(index) => self.resolve_tab(false, Some(0), Some(index)),
            None => self.resolve_tab(false, Some(-1), None),
        }
    }

    pub fn tabs_duplicate(&self, tab_id: i32, context_id: u32) {
        let tab = self.resolve_tab(false, Some(tab_id), None);
        if tab.window_id == self.window_id {
            self.ui.on_tab_duplicate(tab.index as usize);
            let new_id = self.state().last_allocated_id();
            let snap = self.tabs_get(new_id);
            self.transport
                .send(context_id, channels::TABS_DUPLICATE_RESULT, payload(&snap));
            return;
        }
        self.transport.send(
            context_id,
            channels::TABS_DUPLICATE_RESULT,
            payload(&TabSnapshot::sentinel()),
        );
    }

    /// Returns every known tab matching the filter. `currentWindow: true` is
    /// rewritten to this window's id before matching; all other fields are
    /// exact-match against the snapshot's serialized form.
    pub fn tabs_query(&self, query: &QueryInfo) -> Vec<TabSnapshot> {
        self.resolve_tab(false, None, None);
        let mut snaps: Vec<TabSnapshot> = self.cache_lock().values().cloned().collect();
        snaps.sort_by_key(|s| s.id);
        if query.is_empty() {
            return snaps;
        }
        let mut filter = query.clone();
        if let Some(flag) = filter.remove("currentWindow") {
            if flag.as_bool() == Some(true) {
                filter.insert("windowId".to_string(), json!(self.window_id));
            } else {
                // A falsy currentWindow can never exact-match any snapshot.
                return Vec::new();
            }
        }
        snaps
            .into_iter()
            .filter(|snap| {
                let value = payload(snap);
                filter.iter().all(|(key, expected)| value.get(key) == Some(expected))
            })
            .collect()
    }

    pub fn tabs_update(&self, tab_id: i32, props: &UpdateProperties) -> TabSnapshot {
        let tab = self.resolve_tab(false, Some(tab_id), None);
        if tab.window_id == self.window_id && !tab.is_sentinel() {
            if let Some(url) = &props.url {
                self.ui.load_url(tab.index as usize, url);
            }
            if props.active {
                self.resolve_tab(true, Some(tab_id), None);
            }
            return tab;
        }
        TabSnapshot::sentinel()
    }

    pub fn tabs_reload(&self, tab_id: i32, props: &ReloadProperties) {
        let tab = self.resolve_tab(false, Some(tab_id), None);
        if tab.window_id == self.window_id && !tab.is_sentinel() {
            if props.bypass_cache {
                self.ui.reload_ignoring_cache(tab.index as usize);
            } else {
                self.ui.reload(tab.index as usize);
            }
        }
    }

    /// Opens a tab and replies with the created snapshot over the transport.
    /// The target window defaults to the currently focused one; creation in
    /// a window this bridge does not serve answers with the sentinel.
    pub fn tabs_create(&self, props: &CreateProperties, context_id: u32) {
        let window_id = props.window_id.or_else(|| self.state().focused_window_id());
        if window_id == Some(self.window_id) {
            if let Some(url) = &props.url {
                self.ui.on_new_tab(self.window_id, url, props.active);
                let new_id = self.state().last_allocated_id();
                let snap = self.tabs_get(new_id);
                self.transport
                    .send(context_id, channels::TABS_CREATE_RESULT, payload(&snap));
                return;
            }
        }
        self.transport.send(
            context_id,
            channels::TABS_CREATE_RESULT,
            payload(&TabSnapshot::sentinel()),
        );
    }

    /// Closes the given tabs; entries belonging to other windows are
    /// silently skipped.
    pub fn tabs_remove(&self, tab_ids: &[i32]) {
        for &tab_id in tab_ids {
            let tab = self.resolve_tab(false, Some(tab_id), None);
            if tab.window_id == self.window_id && !tab.is_sentinel() {
                self.ui.on_tab_close(tab.index as usize);
            }
        }
    }

    pub fn tabs_detect_language(&self, tab_id: i32, context_id: u32) {
        let tab = self.resolve_tab(false, Some(tab_id), None);
        if tab.window_id == self.window_id && !tab.is_sentinel() {
            if let Some(language) = self.ui.page_language(tab.index as usize) {
                self.transport.send(
                    context_id,
                    channels::TABS_DETECT_LANGUAGE_RESULT,
                    json!(language),
                );
            }
        }
    }

    pub fn tabs_execute_script(&self, tab_id: i32, details: &InjectDetails) {
        let tab = self.resolve_tab(false, Some(tab_id), None);
        if tab.window_id == self.window_id && !tab.is_sentinel() {
            if let Some(code) = &details.code {
                self.ui.execute_script(tab.index as usize, code);
            }
        }
    }

    pub fn tabs_insert_css(&self, tab_id: i32, details: &InjectDetails) {
        let tab = self.resolve_tab(false, Some(tab_id), None);
        if tab.window_id == self.window_id && !tab.is_sentinel() {
            if let Some(code) = &details.code {
                self.ui.insert_css(tab.index as usize, code);
            }
        }
    }

    pub fn tabs_send_message(&self, tab_id: i32, message: Value) {
        let tab = self.resolve_tab(false, Some(tab_id), None);
        if tab.window_id == self.window_id && !tab.is_sentinel() {
            self.ui.send_to_page(tab.index as usize, message);
        }
    }

    pub fn tabs_on_created(&self) -> UnboundedReceiver<Tab> {
        self.hub.on_created.subscribe()
    }

    pub fn tabs_on_updated(&self) -> UnboundedReceiver<TabUpdated> {
        self.hub.on_updated.subscribe()
    }

    pub fn tabs_on_activated(&self) -> UnboundedReceiver<TabActivated> {
        self.hub.on_activated.subscribe()
    }

    pub fn tabs_on_removed(&self) -> UnboundedReceiver<TabRemoved> {
        self.hub.on_removed.subscribe()
    }

    // ─── storage ───

    pub fn storage_on_changed(&self) -> UnboundedReceiver<Value> {
        self.hub.storage_changed.subscribe()
    }

    pub fn notify_storage_changed(&self, changes: Value) {
        self.hub.storage_changed.emit(changes);
    }

    // ─── contextMenus ───

    fn stamp_context(items: &mut [Value], context_id: u32) {
        for item in items.iter_mut() {
            if let Some(object) = item.as_object_mut() {
                object.insert("webContentsId".to_string(), json!(context_id));
                if let Some(submenu) = object.get_mut("submenu").and_then(Value::as_array_mut) {
                    for sub in submenu.iter_mut() {
                        if let Some(sub_object) = sub.as_object_mut() {
                            sub_object.insert("webContentsId".to_string(), json!(context_id));
                        }
                    }
                }
            }
        }
    }

    pub fn context_menus_create(&self, mut items: Vec<Value>, context_id: u32) {
        Self::stamp_context(&mut items, context_id);
        self.ui.add_context_menus(items, context_id);
    }

    /// Delegates exactly like `create`; the two are intentionally aliased
    /// until product intent says removal should differ.
    pub fn context_menus_remove(&self, mut items: Vec<Value>, context_id: u32) {
        Self::stamp_context(&mut items, context_id);
        self.ui.add_context_menus(items, context_id);
    }

    pub fn context_menus_remove_all(&self, items: Vec<Value>, context_id: u32) {
        self.ui.add_context_menus(items, context_id);
    }

    // ─── webNavigation ───

    pub fn web_navigation_get_frame(&self, details: &GetFrameDetails, context_id: u32) {
        let tab = self.resolve_tab(false, Some(details.tab_id), None);
        if tab.window_id != self.window_id || tab.is_sentinel() {
            return;
        }
        let index = tab.index as usize;
        let process_id = self.ui.os_process_id(index);
        if details.process_id != process_id {
            return;
        }
        let top_url = self.ui.page_url(index).unwrap_or_default();
        let child_urls = self.ui.frame_urls(index);
        let frame = frames::find_frame(process_id, details.frame_id, &top_url, &child_urls);
        self.transport.send(
            context_id,
            channels::WEB_NAVIGATION_GET_FRAME_RESULT,
            payload(&frame),
        );
    }

    pub fn web_navigation_get_all_frames(&self, details: &GetAllFramesDetails, context_id: u32) {
        let tab = self.resolve_tab(false, Some(details.tab_id), None);
        if tab.window_id != self.window_id || tab.is_sentinel() {
            return;
        }
        let index = tab.index as usize;
        let process_id = self.ui.os_process_id(index);
        let top_url = self.ui.page_url(index).unwrap_or_default();
        let child_urls = self.ui.frame_urls(index);
        let all = frames::all_frames(process_id, &top_url, &child_urls);
        self.transport.send(
            context_id,
            channels::WEB_NAVIGATION_GET_ALL_FRAMES_RESULT,
            payload(&all),
        );
    }

    pub fn web_navigation_on_before_navigate(&self) -> UnboundedReceiver<NavigationEvent> {
        self.hub.on_before_navigate.subscribe()
    }

    pub fn web_navigation_on_committed(&self) -> UnboundedReceiver<NavigationEvent> {
        self.hub.on_committed.subscribe()
    }

    pub fn web_navigation_on_dom_content_loaded(&self) -> UnboundedReceiver<NavigationEvent> {
        self.hub.on_dom_content_loaded.subscribe()
    }

    pub fn web_navigation_on_completed(&self) -> UnboundedReceiver<NavigationEvent> {
        self.hub.on_completed.subscribe()
    }

    pub fn web_navigation_on_created_navigation_target(
        &self,
    ) -> UnboundedReceiver<NavigationEvent> {
        self.hub.on_created_navigation_target.subscribe()
    }
}
