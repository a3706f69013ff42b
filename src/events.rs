//! Event hub for tabshell.
//!
//! One observable channel per capability event. Each listener gets its own
//! unbounded queue, so emitting never blocks on a slow consumer, and a given
//! emission reaches listeners in the order they subscribed. Channels of
//! different capabilities are independent: no cross-channel ordering is
//! guaranteed.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::types::Tab;

/// A multi-producer observable. Listeners subscribe once and receive every
/// subsequent emission; dropped listeners are pruned on the next emit.
pub struct EventChannel<T> {
    senders: Mutex<Vec<UnboundedSender<T>>>,
}

impl<T: Clone> EventChannel<T> {
    pub fn new() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
        }
    }

    fn senders(&self) -> std::sync::MutexGuard<'_, Vec<UnboundedSender<T>>> {
        self.senders.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers a listener. Events emitted before subscription are not
    /// replayed.
    pub fn subscribe(&self) -> UnboundedReceiver<T> {
        let (tx, rx) = unbounded_channel();
        self.senders().push(tx);
        rx
    }

    /// Delivers `event` to every live listener, in registration order.
    pub fn emit(&self, event: T) {
        self.senders().retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of listeners still subscribed (after pruning closed ones).
    pub fn listener_count(&self) -> usize {
        let mut senders = self.senders();
        senders.retain(|tx| !tx.is_closed());
        senders.len()
    }
}

impl<T: Clone> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Payloads ───

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabActivated {
    pub window_id: i32,
    pub tab_id: i32,
    pub index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabUpdated {
    pub tab_id: i32,
    pub tab: Tab,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabRemoved {
    pub window_id: i32,
    pub tab_id: i32,
    pub index: usize,
}

/// A runtime message routed through the bridge. `tab_id` is `None` when the
/// sender was a non-tab context (popup or background page).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeMessage {
    pub tab_id: Option<i32>,
    pub external: bool,
    pub message: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEvent {
    pub tab_id: i32,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionClicked {
    pub tab_id: i32,
}

/// The per-capability channels the shell and bridge publish into.
pub struct EventHub {
    pub on_created: EventChannel<Tab>,
    pub on_updated: EventChannel<TabUpdated>,
    pub on_activated: EventChannel<TabActivated>,
    pub on_removed: EventChannel<TabRemoved>,
    pub on_message: EventChannel<RuntimeMessage>,
    pub on_message_external: EventChannel<RuntimeMessage>,
    pub storage_changed: EventChannel<Value>,
    pub browser_action_clicked: EventChannel<ActionClicked>,
    pub page_action_clicked: EventChannel<ActionClicked>,
    pub on_before_navigate: EventChannel<NavigationEvent>,
    pub on_committed: EventChannel<NavigationEvent>,
    pub on_dom_content_loaded: EventChannel<NavigationEvent>,
    pub on_completed: EventChannel<NavigationEvent>,
    pub on_created_navigation_target: EventChannel<NavigationEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        Self {
            on_created: EventChannel::new(),
            on_updated: EventChannel::new(),
            on_activated: EventChannel::new(),
            on_removed: EventChannel::new(),
            on_message: EventChannel::new(),
            on_message_external: EventChannel::new(),
            storage_changed: EventChannel::new(),
            browser_action_clicked: EventChannel::new(),
            page_action_clicked: EventChannel::new(),
            on_before_navigate: EventChannel::new(),
            on_committed: EventChannel::new(),
            on_dom_content_loaded: EventChannel::new(),
            on_completed: EventChannel::new(),
            on_created_navigation_target: EventChannel::new(),
        }
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}
