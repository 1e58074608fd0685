use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Per-user count of moderation violations since the last successful turn.
#[derive(Debug, Default)]
pub struct StrikeLedger {
    counts: Mutex<HashMap<String, u32>>,
}

impl StrikeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one strike and returns the user's new total.
    pub fn record_violation(&self, user_id: &str) -> u32 {
        let mut counts = self.lock();
        let count = counts.entry(user_id.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn clear(&self, user_id: &str) {
        self.lock().remove(user_id);
    }

    pub fn count(&self, user_id: &str) -> u32 {
        self.lock().get(user_id).copied().unwrap_or(0)
    }

    pub fn tracked_users(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, u32>> {
        // Counts stay consistent even if a holder panicked mid-turn.
        self.counts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
