//! Tab identity allocator.
//!
//! Issues process-wide, strictly increasing tab identifiers. Ids start at 1
//! because 0 is the reserved "no tab" sentinel; closed tabs never give their
//! id back.

use std::sync::atomic::{AtomicI32, Ordering};

pub struct TabIdAllocator {
    next: AtomicI32,
}

impl TabIdAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicI32::new(1),
        }
    }

    /// Returns a fresh id, strictly greater than every id issued before.
    pub fn next(&self) -> i32 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// The most recently issued id, or the 0 sentinel if none was issued.
    /// `tabs.create`/`tabs.duplicate` reply with the tab carrying this id.
    pub fn current(&self) -> i32 {
        self.next.load(Ordering::SeqCst) - 1
    }
}

impl Default for TabIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
