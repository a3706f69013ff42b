//! History ledger for tabshell.
//!
//! An in-memory, most-recent-first log of main-frame navigations. Entries
//! are appended by the tab state machine on frame-finish-load; ordering is
//! independent of tab ordering.

use chrono::Local;

use crate::types::HistoryEntry;

pub struct HistoryLedger {
    entries: Vec<HistoryEntry>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Prepends a visit unless the most recent entry already carries the
    /// same URL (back-to-back reloads collapse into one entry).
    pub fn record(&mut self, title: &str, url: &str, favicon: Option<String>) {
        if self.entries.first().map(|e| e.url.as_str()) == Some(url) {
            log::trace!("history: skipping duplicate of {}", url);
            return;
        }
        let now = Local::now();
        self.entries.insert(
            0,
            HistoryEntry {
                title: title.to_string(),
                url: url.to_string(),
                favicon,
                label: now.format("%Y-%m-%d").to_string(),
                time: now.format("%H:%M:%S").to_string(),
            },
        );
    }

    /// Updates the favicon of recent entries matching `url`. Only the ten
    /// most recent entries are scanned; older entries keep the favicon they
    /// were recorded with.
    pub fn refresh_favicon(&mut self, url: &str, favicon: Option<String>) {
        let window = self.entries.len().min(10);
        for entry in &mut self.entries[..window] {
            if entry.url == url {
                entry.favicon = favicon.clone();
            }
        }
    }

    /// Replaces the whole log (session restore).
    pub fn replace(&mut self, entries: Vec<HistoryEntry>) {
        self.entries = entries;
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new()
    }
}
