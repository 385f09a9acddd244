//! Per-row locks for sequence increments
//!
//! One mutex per (party, purpose) key serializes increments on the same row
//! while leaving other rows free. Entries are never evicted, so callers only
//! ask for rows that exist.
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct RowLocks {
    rows: Mutex<HashMap<Vec<u8>, Arc<Mutex<()>>>>,
}

impl RowLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding `key`. Callers hold it for the whole read-modify-write.
    pub fn row(&self, key: &[u8]) -> Arc<Mutex<()>> {
        let mut rows = self.rows.lock();
        Arc::clone(rows.entry(key.to_vec()).or_default())
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }
}
