//! Session identifier generation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for one connection's user slot.
pub type Uid = String;

/// Generates unique session ids for new connections.
///
/// Ids are internal only (never shown on the wire), so a simple
/// monotonically increasing counter is enough.
pub struct UidGenerator {
    counter: AtomicU64,
}

impl UidGenerator {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
        }
    }

    /// Generate the next unique id.
    pub fn next(&self) -> Uid {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("w{:06}", n)
    }
}

impl Default for UidGenerator {
    fn default() -> Self {
        Self::new()
    }
}
