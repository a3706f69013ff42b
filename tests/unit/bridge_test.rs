use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tabshell::bridge::{
    channels, CreateProperties, ExtensionBridge, GetAllFramesDetails, GetFrameDetails,
    MessageTransport, ReloadProperties, UiDelegate, UpdateProperties,
};
use tabshell::types::ShellConfig;
use tabshell::Shell;

/// UI delegate backed by the real shell, so bridge delegations mutate the
/// same state the bridge reads. Calls are recorded for assertions.
struct MockUi {
    shell: Arc<Shell>,
    window_id: i32,
    calls: Mutex<Vec<String>>,
}

impl MockUi {
    fn new(shell: Arc<Shell>, window_id: i32) -> Self {
        Self {
            shell,
            window_id,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn tab_id_at(&self, index: usize) -> Option<i32> {
        let state = self.shell.state();
        let state = state.lock().unwrap();
        state.window_tab_at(self.window_id, index).map(|t| t.id)
    }
}

impl UiDelegate for MockUi {
    fn on_new_tab(&self, window_id: i32, url: &str, active: bool) {
        self.record(format!("new_tab:{}:{}", window_id, url));
        self.shell.create_tab(window_id, Some(url), true, active);
    }

    fn on_tab_click(&self, index: usize) {
        self.record(format!("click:{}", index));
        self.shell.click_tab(self.window_id, index);
    }

    fn on_tab_close(&self, index: usize) {
        self.record(format!("close:{}", index));
        if let Some(tab_id) = self.tab_id_at(index) {
            self.shell.close_tab(self.window_id, tab_id, index);
        }
    }

    fn on_tab_duplicate(&self, index: usize) {
        self.record(format!("duplicate:{}", index));
        let url = {
            let state = self.shell.state();
            let state = state.lock().unwrap();
            state
                .window_tab_at(self.window_id, index)
                .map(|t| t.url.clone())
        };
        if let Some(url) = url {
            self.shell.create_tab(self.window_id, Some(&url), true, false);
        }
    }

    fn load_url(&self, index: usize, url: &str) {
        self.record(format!("load_url:{}:{}", index, url));
    }

    fn reload(&self, index: usize) {
        self.record(format!("reload:{}", index));
    }

    fn reload_ignoring_cache(&self, index: usize) {
        self.record(format!("reload_nocache:{}", index));
    }

    fn execute_script(&self, index: usize, code: &str) {
        self.record(format!("execute:{}:{}", index, code));
    }

    fn insert_css(&self, index: usize, css: &str) {
        self.record(format!("css:{}:{}", index, css));
    }

    fn send_to_page(&self, index: usize, message: Value) {
        self.record(format!("send_to_page:{}:{}", index, message));
    }

    fn set_browser_action_icon(&self, extension_id: &str, path: &str) {
        self.record(format!("ba_icon:{}:{}", extension_id, path));
    }

    fn set_browser_action_badge_text(&self, extension_id: &str, text: &str) {
        self.record(format!("ba_badge:{}:{}", extension_id, text));
    }

    fn set_browser_action_badge_background_color(&self, extension_id: &str, color: &str) {
        self.record(format!("ba_color:{}:{}", extension_id, color));
    }

    fn set_page_action_icon(&self, extension_id: &str, path: &str) {
        self.record(format!("pa_icon:{}:{}", extension_id, path));
    }

    fn add_context_menus(&self, items: Vec<Value>, context_id: u32) {
        self.record(format!("menus:{}:{}", context_id, Value::Array(items)));
    }

    fn page_url(&self, _index: usize) -> Option<String> {
        Some("https://top.example/".to_string())
    }

    fn frame_urls(&self, _index: usize) -> Vec<String> {
        vec![
            "https://frame-a.example/".to_string(),
            "https://frame-b.example/".to_string(),
        ]
    }

    fn os_process_id(&self, _index: usize) -> i32 {
        41
    }

    fn page_language(&self, _index: usize) -> Option<String> {
        Some("en".to_string())
    }
}

#[derive(Default)]
struct MockTransport {
    sent: Mutex<Vec<(u32, String, Value)>>,
}

impl MockTransport {
    fn sent(&self) -> Vec<(u32, String, Value)> {
        self.sent.lock().unwrap().clone()
    }
}

impl MessageTransport for MockTransport {
    fn send(&self, context_id: u32, channel: &str, payload: Value) {
        self.sent
            .lock()
            .unwrap()
            .push((context_id, channel.to_string(), payload));
    }

    fn context_url(&self, context_id: u32) -> Option<String> {
        Some(format!("tabshell://popup/{}", context_id))
    }
}

fn setup() -> (Arc<Shell>, Arc<MockUi>, Arc<MockTransport>, ExtensionBridge) {
    let shell = Arc::new(Shell::new(ShellConfig::default()));
    let window = shell.create_window();
    let ui = Arc::new(MockUi::new(Arc::clone(&shell), window.window_id));
    let transport = Arc::new(MockTransport::default());
    let bridge = shell.bridge(
        window.window_id,
        Arc::clone(&ui) as Arc<dyn UiDelegate>,
        Arc::clone(&transport) as Arc<dyn MessageTransport>,
    );
    (shell, ui, transport, bridge)
}

// ─── resolve_tab ───

#[test]
fn test_resolve_minus_one_is_sentinel() {
    let (_shell, _ui, _transport, bridge) = setup();
    let snap = bridge.resolve_tab(false, Some(-1), None);
    assert!(snap.is_sentinel());
    assert_eq!(snap.index, -1);
}

#[test]
fn test_resolve_zero_alone_is_callers_active_tab() {
    let (shell, _ui, _transport, bridge) = setup();
    shell.create_tab(1, Some("https://a.example/"), true, true);
    let t2 = shell.create_tab(1, Some("https://b.example/"), true, true);
    let snap = bridge.resolve_tab(false, Some(0), None);
    assert_eq!(snap.id, t2.id);
    assert_eq!(snap.url, "https://b.example/");
    assert_eq!(snap.index, 1);
}

#[test]
fn test_resolve_zero_with_index_targets_that_position() {
    let (shell, _ui, _transport, bridge) = setup();
    let t1 = shell.create_tab(1, Some("https://a.example/"), true, true);
    shell.create_tab(1, Some("https://b.example/"), true, true);
    let snap = bridge.resolve_tab(false, Some(0), Some(0));
    assert_eq!(snap.id, t1.id);
    assert_eq!(snap.index, 0);
}

#[test]
fn test_resolve_by_real_id() {
    let (shell, _ui, _transport, bridge) = setup();
    shell.create_tab(1, Some("https://a.example/"), true, true);
    let t2 = shell.create_tab(1, Some("https://b.example/"), true, false);
    let snap = bridge.resolve_tab(false, Some(t2.id), None);
    assert_eq!(snap.id, t2.id);
    assert_eq!(snap.window_id, 1);
    assert_eq!(snap.index, 1);
}

#[test]
fn test_resolve_id_from_other_window_is_sentinel() {
    let (shell, _ui, _transport, bridge) = setup();
    shell.create_window();
    let other = shell.create_tab(2, Some("https://other.example/"), true, true);
    assert!(bridge.resolve_tab(false, Some(other.id), None).is_sentinel());
}

#[test]
fn test_resolve_activation_moves_cursor_and_clicks() {
    let (shell, ui, _transport, bridge) = setup();
    let t1 = shell.create_tab(1, Some("https://a.example/"), true, true);
    let t2 = shell.create_tab(1, Some("https://b.example/"), true, true);
    let snap = bridge.resolve_tab(true, Some(t1.id), None);
    assert!(snap.active);
    assert!(ui.calls().contains(&"click:0".to_string()));
    {
        let state = shell.state();
        let state = state.lock().unwrap();
        assert_eq!(state.current_tab(1).map(|t| t.id), Some(t1.id));
    }
    // At most one snapshot stays active across the cache.
    let all = bridge.tabs_query(&Default::default());
    let active: Vec<_> = all.iter().filter(|s| s.active).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, t1.id);
    let _ = t2;
}

// ─── tabs.* ───

#[test]
fn test_query_empty_filter_returns_all_sorted_by_id() {
    let (shell, _ui, _transport, bridge) = setup();
    shell.create_window();
    let t1 = shell.create_tab(1, Some("https://a.example/"), true, true);
    let t2 = shell.create_tab(2, Some("https://b.example/"), true, true);
    let t3 = shell.create_tab(1, Some("https://c.example/"), true, false);
    let all = bridge.tabs_query(&Default::default());
    let ids: Vec<i32> = all.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![t1.id, t2.id, t3.id]);
}

#[test]
fn test_query_current_window_true_rewrites_to_window_id() {
    let (shell, _ui, _transport, bridge) = setup();
    shell.create_window();
    shell.create_tab(1, Some("https://a.example/"), true, true);
    shell.create_tab(2, Some("https://b.example/"), true, true);
    let mut query = std::collections::HashMap::new();
    query.insert("currentWindow".to_string(), json!(true));
    let hits = bridge.tabs_query(&query);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].window_id, 1);
}

#[test]
fn test_query_current_window_falsy_matches_nothing() {
    let (shell, _ui, _transport, bridge) = setup();
    shell.create_tab(1, Some("https://a.example/"), true, true);
    let mut query = std::collections::HashMap::new();
    query.insert("currentWindow".to_string(), json!(false));
    assert!(bridge.tabs_query(&query).is_empty());
}

#[test]
fn test_query_filters_on_snapshot_fields() {
    let (shell, _ui, _transport, bridge) = setup();
    shell.create_tab(1, Some("https://a.example/"), true, true);
    let t2 = shell.create_tab(1, Some("https://b.example/"), true, true);
    let mut query = std::collections::HashMap::new();
    query.insert("url".to_string(), json!("https://b.example/"));
    let hits = bridge.tabs_query(&query);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, t2.id);

    let mut query = std::collections::HashMap::new();
    query.insert("active".to_string(), json!(true));
    let hits = bridge.tabs_query(&query);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, t2.id);
}

#[test]
fn test_tabs_create_defaults_to_focused_window() {
    let (shell, ui, transport, bridge) = setup();
    shell.update_window_properties(1, 800, 600, 0, 0, true, "normal");
    let props = CreateProperties {
        url: Some("https://new.example/".to_string()),
        window_id: None,
        active: true,
    };
    bridge.tabs_create(&props, 9);
    assert!(ui
        .calls()
        .contains(&"new_tab:1:https://new.example/".to_string()));
    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, channels::TABS_CREATE_RESULT);
    assert_eq!(sent[0].2["url"], json!("https://new.example/"));
    assert_eq!(sent[0].2["windowId"], json!(1));
}

#[test]
fn test_tabs_create_for_other_window_answers_sentinel() {
    let (shell, ui, transport, bridge) = setup();
    let other = shell.create_window();
    shell.update_window_properties(other.window_id, 800, 600, 0, 0, true, "normal");
    let props = CreateProperties {
        url: Some("https://new.example/".to_string()),
        window_id: None,
        active: false,
    };
    bridge.tabs_create(&props, 9);
    assert!(ui.calls().is_empty());
    let sent = transport.sent();
    assert_eq!(sent[0].2["id"], json!(-1));
}

#[test]
fn test_tabs_remove_skips_other_windows() {
    let (shell, ui, _transport, bridge) = setup();
    shell.create_window();
    let mine = shell.create_tab(1, Some("https://a.example/"), true, true);
    shell.create_tab(1, Some("https://b.example/"), true, false);
    let other = shell.create_tab(2, Some("https://c.example/"), true, true);
    bridge.tabs_remove(&[mine.id, other.id]);
    assert_eq!(ui.calls(), vec!["close:0".to_string()]);
    {
        let state = shell.state();
        let state = state.lock().unwrap();
        assert_eq!(state.window_tab_count(1), 1);
        assert_eq!(state.window_tab_count(2), 1);
    }
}

#[test]
fn test_tabs_update_loads_url_and_activates() {
    let (shell, ui, _transport, bridge) = setup();
    let t1 = shell.create_tab(1, Some("https://a.example/"), true, true);
    shell.create_tab(1, Some("https://b.example/"), true, true);
    let props = UpdateProperties {
        url: Some("https://elsewhere.example/".to_string()),
        active: true,
    };
    let snap = bridge.tabs_update(t1.id, &props);
    assert_eq!(snap.id, t1.id);
    let calls = ui.calls();
    assert!(calls.contains(&"load_url:0:https://elsewhere.example/".to_string()));
    assert!(calls.contains(&"click:0".to_string()));
}

#[test]
fn test_tabs_reload_honors_bypass_cache() {
    let (shell, ui, _transport, bridge) = setup();
    let t1 = shell.create_tab(1, Some("https://a.example/"), true, true);
    bridge.tabs_reload(t1.id, &ReloadProperties { bypass_cache: false });
    bridge.tabs_reload(t1.id, &ReloadProperties { bypass_cache: true });
    let calls = ui.calls();
    assert!(calls.contains(&"reload:0".to_string()));
    assert!(calls.contains(&"reload_nocache:0".to_string()));
}

#[test]
fn test_tabs_duplicate_reports_new_tab() {
    let (shell, ui, transport, bridge) = setup();
    let t1 = shell.create_tab(1, Some("https://a.example/"), true, true);
    bridge.tabs_duplicate(t1.id, 9);
    assert!(ui.calls().contains(&"duplicate:0".to_string()));
    let sent = transport.sent();
    assert_eq!(sent[0].1, channels::TABS_DUPLICATE_RESULT);
    assert_eq!(sent[0].2["url"], json!("https://a.example/"));
    assert_ne!(sent[0].2["id"], json!(t1.id));
}

#[test]
fn test_tabs_get_current_requires_mapping() {
    let (shell, _ui, _transport, bridge) = setup();
    let t1 = shell.create_tab(1, Some("https://a.example/"), true, true);
    assert!(bridge.tabs_get_current(5).is_sentinel());
    bridge.update_mapping(5, 0);
    assert_eq!(bridge.tabs_get_current(5).id, t1.id);
}

#[test]
fn test_tabs_detect_language_answers_over_transport() {
    let (shell, _ui, transport, bridge) = setup();
    let t1 = shell.create_tab(1, Some("https://a.example/"), true, true);
    bridge.tabs_detect_language(t1.id, 9);
    let sent = transport.sent();
    assert_eq!(sent[0].1, channels::TABS_DETECT_LANGUAGE_RESULT);
    assert_eq!(sent[0].2, json!("en"));
}

#[test]
fn test_tabs_script_and_css_injection() {
    let (shell, ui, _transport, bridge) = setup();
    let t1 = shell.create_tab(1, Some("https://a.example/"), true, true);
    bridge.tabs_execute_script(
        t1.id,
        &tabshell::bridge::InjectDetails {
            code: Some("1 + 1".to_string()),
        },
    );
    bridge.tabs_insert_css(
        t1.id,
        &tabshell::bridge::InjectDetails {
            code: Some("body{}".to_string()),
        },
    );
    bridge.tabs_send_message(t1.id, json!({"ping": true}));
    let calls = ui.calls();
    assert!(calls.contains(&"execute:0:1 + 1".to_string()));
    assert!(calls.contains(&"css:0:body{}".to_string()));
    assert!(calls.iter().any(|c| c.starts_with("send_to_page:0:")));
}

// ─── runtime.* ───

#[test]
fn test_runtime_message_from_tab_carries_tab_sender() {
    let (shell, _ui, transport, bridge) = setup();
    let t1 = shell.create_tab(1, Some("https://a.example/"), true, true);
    bridge.update_mapping(7, 0);
    bridge.register_background_page("ext-a", 99);
    let mut rx = bridge.runtime_on_message(7).unwrap();

    bridge.runtime_send_message("ext-a", json!({"hello": 1}), false, 7);

    let event = rx.try_recv().unwrap();
    assert_eq!(event.tab_id, Some(t1.id));
    assert!(!event.external);
    let sent = transport.sent();
    assert_eq!(sent[0].0, 99);
    assert_eq!(sent[0].1, channels::RUNTIME_SEND_MESSAGE);
    assert_eq!(sent[0].2["sender"]["tab"]["id"], json!(t1.id));
    assert_eq!(sent[0].2["message"], json!({"hello": 1}));
}

#[test]
fn test_runtime_message_from_popup_carries_url_sender() {
    let (shell, _ui, transport, bridge) = setup();
    shell.create_tab(1, Some("https://a.example/"), true, true);
    bridge.register_background_page("ext-a", 99);
    let mut rx = shell.hub().on_message_external.subscribe();

    bridge.runtime_send_message("ext-a", json!("ping"), true, 55);

    let event = rx.try_recv().unwrap();
    assert_eq!(event.tab_id, None);
    assert!(event.external);
    let sent = transport.sent();
    assert_eq!(sent[0].2["sender"]["url"], json!("tabshell://popup/55"));
    assert_eq!(sent[0].2["external"], json!(true));
}

#[test]
fn test_runtime_on_message_unmapped_context_gets_nothing() {
    let (_shell, _ui, _transport, bridge) = setup();
    assert!(bridge.runtime_on_message(123).is_none());
}

// ─── browserAction / pageAction ───

#[test]
fn test_action_setters_prefix_start_page() {
    let (_shell, ui, _transport, bridge) = setup();
    bridge.browser_action_set_icon(
        "ext-a",
        "tabshell-extension://ext-a",
        &tabshell::bridge::IconDetails {
            path: Some("icons/16.png".to_string()),
        },
    );
    bridge.browser_action_set_badge_text(
        "ext-a",
        &tabshell::bridge::BadgeTextDetails {
            text: Some("3".to_string()),
        },
    );
    bridge.browser_action_set_badge_background_color(
        "ext-a",
        &tabshell::bridge::BadgeColorDetails {
            color: Some("#ff0000".to_string()),
        },
    );
    let calls = ui.calls();
    assert!(calls.contains(&"ba_icon:ext-a:tabshell-extension://ext-a/icons/16.png".to_string()));
    assert!(calls.contains(&"ba_badge:ext-a:3".to_string()));
    assert!(calls.contains(&"ba_color:ext-a:#ff0000".to_string()));
}

// ─── contextMenus ───

#[test]
fn test_context_menus_stamp_items_and_submenus() {
    let (_shell, ui, _transport, bridge) = setup();
    let items = vec![json!({
        "label": "Top",
        "submenu": [{"label": "Child"}]
    })];
    bridge.context_menus_create(items, 12);
    let calls = ui.calls();
    assert_eq!(calls.len(), 1);
    let recorded: Value =
        serde_json::from_str(calls[0].trim_start_matches("menus:12:")).unwrap();
    assert_eq!(recorded[0]["webContentsId"], json!(12));
    assert_eq!(recorded[0]["submenu"][0]["webContentsId"], json!(12));
}

// ─── webNavigation.* ───

#[test]
fn test_get_frame_id_zero_is_top_frame() {
    let (shell, _ui, transport, bridge) = setup();
    let t1 = shell.create_tab(1, Some("https://top.example/"), true, true);
    let details = GetFrameDetails {
        tab_id: t1.id,
        process_id: 41,
        frame_id: 0,
    };
    bridge.web_navigation_get_frame(&details, 9);
    let sent = transport.sent();
    assert_eq!(sent[0].1, channels::WEB_NAVIGATION_GET_FRAME_RESULT);
    assert_eq!(sent[0].2["frameId"], json!(0));
    assert_eq!(sent[0].2["parentFrameId"], json!(-1));
    assert_eq!(sent[0].2["url"], json!("https://top.example/"));
}

#[test]
fn test_get_frame_wrong_process_is_ignored() {
    let (shell, _ui, transport, bridge) = setup();
    let t1 = shell.create_tab(1, Some("https://top.example/"), true, true);
    let details = GetFrameDetails {
        tab_id: t1.id,
        process_id: 999,
        frame_id: 0,
    };
    bridge.web_navigation_get_frame(&details, 9);
    assert!(transport.sent().is_empty());
}

#[test]
fn test_get_all_frames_lists_top_first() {
    let (shell, _ui, transport, bridge) = setup();
    let t1 = shell.create_tab(1, Some("https://top.example/"), true, true);
    bridge.web_navigation_get_all_frames(&GetAllFramesDetails { tab_id: t1.id }, 9);
    let sent = transport.sent();
    assert_eq!(sent[0].1, channels::WEB_NAVIGATION_GET_ALL_FRAMES_RESULT);
    let frames = sent[0].2.as_array().unwrap();
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0]["frameId"], json!(0));
    assert_eq!(frames[1]["parentFrameId"], json!(0));
    assert_ne!(frames[1]["frameId"], frames[2]["frameId"]);
    // Subframe ids are stable across calls.
    bridge.web_navigation_get_all_frames(&GetAllFramesDetails { tab_id: t1.id }, 9);
    let again = transport.sent();
    assert_eq!(again[1].2, again[0].2);
}

// ─── Shell event emissions ───

#[test]
fn test_shell_emits_created_and_removed() {
    let (shell, _ui, _transport, bridge) = setup();
    let mut created = bridge.tabs_on_created();
    let mut removed = bridge.tabs_on_removed();
    let t1 = shell.create_tab(1, Some("https://a.example/"), true, true);
    shell.create_tab(1, Some("https://b.example/"), true, false);
    assert_eq!(created.try_recv().unwrap().id, t1.id);
    shell.close_tab(1, t1.id, 0);
    let gone = removed.try_recv().unwrap();
    assert_eq!(gone.tab_id, t1.id);
    assert_eq!(gone.window_id, 1);
}

#[test]
fn test_shell_emits_navigation_chain() {
    let (shell, _ui, _transport, bridge) = setup();
    let t1 = shell.create_tab(1, Some("https://a.example/"), true, true);
    let mut before = bridge.web_navigation_on_before_navigate();
    let mut committed = bridge.web_navigation_on_committed();
    let mut dom = bridge.web_navigation_on_dom_content_loaded();
    let mut completed = bridge.web_navigation_on_completed();

    shell.did_start_loading(t1.id, "https://b.example/");
    shell.load_commit(t1.id);
    shell.dom_ready(t1.id, false, false);
    shell.did_frame_finish_load(t1.id, "https://b.example/", false, false);

    assert_eq!(before.try_recv().unwrap().url, "https://b.example/");
    assert_eq!(committed.try_recv().unwrap().tab_id, t1.id);
    assert_eq!(dom.try_recv().unwrap().tab_id, t1.id);
    assert_eq!(completed.try_recv().unwrap().url, "https://b.example/");
}

#[test]
fn test_shell_click_tab_emits_activated() {
    let (shell, _ui, _transport, bridge) = setup();
    shell.create_tab(1, Some("https://a.example/"), true, true);
    let t2 = shell.create_tab(1, Some("https://b.example/"), true, false);
    let mut activated = bridge.tabs_on_activated();
    shell.click_tab(1, 1);
    let event = activated.try_recv().unwrap();
    assert_eq!(event.tab_id, t2.id);
    assert_eq!(event.index, 1);
}

#[test]
fn test_app_identity_comes_from_manifest() {
    let (_shell, _ui, _transport, bridge) = setup();
    assert_eq!(bridge.app_name(), "tabshell");
    assert!(!bridge.app_version().is_empty());
}
