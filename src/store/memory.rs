//! An in-process record store with the same insert-if-absent semantics as the
//! SQLite store. Used by tests.

use super::StoreError;
use crate::core::{DomainRecord, InsertOutcome, RecordStore};
use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<String, DomainRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored domain, sorted.
    pub fn domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self.lock().keys().cloned().collect();
        domains.sort();
        domains
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, DomainRecord>> {
        // A poisoned map is still consistent: every mutation is a single insert.
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert_if_absent(&self, record: &DomainRecord) -> Result<InsertOutcome, StoreError> {
        match self.lock().entry(record.domain.clone()) {
            Entry::Occupied(_) => Ok(InsertOutcome::AlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    async fn get(&self, domain: &str) -> Result<Option<DomainRecord>, StoreError> {
        Ok(self.lock().get(domain).cloned())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.lock().len() as u64)
    }
}
