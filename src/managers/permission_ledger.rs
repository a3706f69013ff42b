//! Permission ledger for tabshell.
//!
//! Sparse map of per-host permission decisions. A host's map is created
//! lazily on the first grant/deny for that host.

use std::collections::HashMap;

pub struct PermissionLedger {
    grants: HashMap<String, HashMap<String, bool>>,
}

impl PermissionLedger {
    pub fn new() -> Self {
        Self {
            grants: HashMap::new(),
        }
    }

    /// Records (or overwrites) the decision for `permission` on `hostname`.
    pub fn set(&mut self, hostname: &str, permission: &str, accepted: bool) {
        log::debug!("permission: {} {} -> {}", hostname, permission, accepted);
        self.grants
            .entry(hostname.to_string())
            .or_default()
            .insert(permission.to_string(), accepted);
    }

    /// The stored decision, or `None` when the host was never asked.
    pub fn get(&self, hostname: &str, permission: &str) -> Option<bool> {
        self.grants.get(hostname)?.get(permission).copied()
    }

    /// Every decision recorded for a host.
    pub fn site(&self, hostname: &str) -> Option<&HashMap<String, bool>> {
        self.grants.get(hostname)
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

impl Default for PermissionLedger {
    fn default() -> Self {
        Self::new()
    }
}
