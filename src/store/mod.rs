mod json_file;
mod memory;

use thiserror::Error;

use crate::engine::types::LearnerRecord;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Keyed storage of learner records: load by id, upsert by the record's
/// own id. Both operations are synchronous and durable on return.
pub trait LearnerStore: Send + Sync {
    fn load(&self, learner_id: &str) -> Result<Option<LearnerRecord>, StoreError>;
    fn save(&self, record: &LearnerRecord) -> Result<(), StoreError>;
}
