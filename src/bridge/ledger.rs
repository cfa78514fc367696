//! Per-conversation record of calls handed to the host

use std::collections::HashMap;

use uuid::Uuid;

/// Maps generated call ids to the raw call text they stand for
///
/// Owned by one conversation. Nothing is evicted implicitly; use [`forget`],
/// [`retain`] or [`clear`] to drop entries the host no longer replays.
///
/// [`forget`]: CallLedger::forget
/// [`retain`]: CallLedger::retain
/// [`clear`]: CallLedger::clear
#[derive(Debug, Default, Clone)]
pub struct CallLedger {
    calls: HashMap<String, String>,
}

impl CallLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a call and return its new id
    pub fn record(&mut self, call_text: impl Into<String>) -> String {
        let id = format!("call_{}", Uuid::new_v4().simple());
        self.calls.insert(id.clone(), call_text.into());
        id
    }

    #[must_use]
    pub fn lookup(&self, call_id: &str) -> Option<&str> {
        self.calls.get(call_id).map(String::as_str)
    }

    /// Drop one call, returning its text
    pub fn forget(&mut self, call_id: &str) -> Option<String> {
        self.calls.remove(call_id)
    }

    /// Keep only the calls for which `keep(id, call_text)` is true
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        self.calls.retain(|id, call| keep(id, call));
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}
