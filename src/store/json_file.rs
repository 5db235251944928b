use std::fs;
use std::path::PathBuf;

use parking_lot::Mutex;

use crate::engine::types::LearnerRecord;
use crate::store::{LearnerStore, StoreError};

/// File-backed store: one JSON document holding every learner record,
/// upserted by `learner_id`. A process-wide mutex serializes the
/// read-modify-write cycle; cross-process callers need their own exclusion.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> Result<Vec<LearnerRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn write_all(&self, records: &[LearnerRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

impl LearnerStore for JsonFileStore {
    fn load(&self, learner_id: &str) -> Result<Option<LearnerRecord>, StoreError> {
        let _guard = self.lock.lock();
        let records = self.read_all()?;
        Ok(records.into_iter().find(|r| r.learner_id == learner_id))
    }

    fn save(&self, record: &LearnerRecord) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut records = self.read_all()?;
        records.retain(|r| r.learner_id != record.learner_id);
        records.push(record.clone());
        self.write_all(&records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::DifficultyLevel;

    #[test]
    fn test_round_trip_and_upsert() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("progress.json"));

        assert!(store.load("learner-1").unwrap().is_none());

        let mut record = LearnerRecord::new("learner-1");
        store.save(&record).unwrap();

        record.difficulty_level = DifficultyLevel::Expert;
        store.save(&record).unwrap();

        let other = LearnerRecord::new("learner-2");
        store.save(&other).unwrap();

        let loaded = store.load("learner-1").unwrap().unwrap();
        assert_eq!(loaded.difficulty_level, DifficultyLevel::Expert);

        let all: Vec<LearnerRecord> =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("progress.json")).unwrap())
                .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_missing_parent_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/data/progress.json"));
        store.save(&LearnerRecord::new("learner-1")).unwrap();
        assert!(store.load("learner-1").unwrap().is_some());
    }
}
