use std::collections::HashMap;

use parking_lot::RwLock;

use crate::engine::types::LearnerRecord;
use crate::store::{LearnerStore, StoreError};

/// In-process store, used by tests and embeddings that manage their own
/// durability.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, LearnerRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl LearnerStore for MemoryStore {
    fn load(&self, learner_id: &str) -> Result<Option<LearnerRecord>, StoreError> {
        Ok(self.records.read().get(learner_id).cloned())
    }

    fn save(&self, record: &LearnerRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .insert(record.learner_id.clone(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_absent_learner() {
        let store = MemoryStore::new();
        assert!(store.load("nobody").unwrap().is_none());
    }

    #[test]
    fn test_save_is_upsert() {
        let store = MemoryStore::new();
        let mut record = LearnerRecord::new("learner-1");
        store.save(&record).unwrap();

        record.current_page = 2;
        store.save(&record).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.load("learner-1").unwrap().unwrap().current_page, 2);
    }
}
