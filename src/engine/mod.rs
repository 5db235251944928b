pub mod adaptation;
pub mod clarification;
pub mod diagnostic;
pub mod evaluation;
pub mod progression;
pub mod session;
pub mod types;

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("diagnostic answer batch incomplete: expected {expected} answers, got {got}")]
    IncompleteDiagnostic { expected: usize, got: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub use clarification::{ClarificationQueue, ClarificationRequest};
pub use evaluation::{AnswerEvaluator, Evaluation, SuggestedAction};
pub use progression::AdvanceOutcome;
pub use session::LearningEngine;
pub use types::{
    ClarificationUnit, DifficultyLevel, LearnerRecord, LearningStyle, ModuleId, QuizAttempt,
};
