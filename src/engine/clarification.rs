use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::engine::types::{ClarificationUnit, DifficultyLevel, LearnerRecord, ModuleId};
use crate::services::ReasoningClient;

#[derive(Debug, Clone)]
pub struct ClarificationRequest {
    pub question: String,
    pub question_id: String,
    pub incorrect_answer: String,
    pub correct_answer: String,
    pub source_module: ModuleId,
    pub difficulty_level: DifficultyLevel,
}

/// Creates, lists and retires remediation units. One unit is created per
/// incorrect attempt; completion is at-most-once by id.
#[derive(Clone)]
pub struct ClarificationQueue {
    reasoning: Arc<ReasoningClient>,
}

impl ClarificationQueue {
    pub fn new(reasoning: Arc<ReasoningClient>) -> Self {
        Self { reasoning }
    }

    /// Generates remediation content (reasoning service first, templated
    /// fallback otherwise), appends a unit to the pending queue and
    /// returns a copy of it. Always succeeds.
    pub async fn enqueue(
        &self,
        record: &mut LearnerRecord,
        request: ClarificationRequest,
    ) -> ClarificationUnit {
        let content = match self.generate_content(&request).await {
            Some(content) => content,
            None => fallback_content(&request),
        };

        let created_at = Utc::now();
        let unit = ClarificationUnit {
            id: make_id(&request.question_id, created_at.timestamp_millis()),
            question_id: request.question_id,
            question: request.question,
            content,
            source_module: request.source_module,
            created_at,
        };
        record.pending_clarifications.push(unit.clone());
        debug!(clarification_id = %unit.id, "queued clarification");
        unit
    }

    /// Removes the pending unit with the given id. Unknown ids are a
    /// negative result, not an error, and repeated completion returns
    /// false.
    pub fn complete(record: &mut LearnerRecord, id: &str) -> bool {
        let before = record.pending_clarifications.len();
        record.pending_clarifications.retain(|c| c.id != id);
        record.pending_clarifications.len() < before
    }

    /// Pending units in FIFO order.
    pub fn list_pending(record: &LearnerRecord) -> &[ClarificationUnit] {
        &record.pending_clarifications
    }

    async fn generate_content(&self, request: &ClarificationRequest) -> Option<String> {
        if !self.reasoning.is_available() {
            return None;
        }

        let context = serde_json::json!({
            "question": request.question,
            "question_id": request.question_id,
            "incorrect_answer": request.incorrect_answer,
            "correct_answer": request.correct_answer,
            "current_module": request.source_module.as_str(),
            "difficulty_level": request.difficulty_level.as_index(),
            "learning_style": "examples",
        });
        let schema = serde_json::json!({ "content": "string" });
        let definition = format!(
            "Generate a clarification lesson to help the user understand a concept they got wrong.\n\n\
             Question: {}\nUser's answer: {}\nCorrect answer: {}\nCurrent module: {}\n\n\
             Create a brief, focused clarification that:\n\
             1. Explains why the correct answer is correct\n\
             2. Addresses common misconceptions (especially the one the user had)\n\
             3. Provides clear examples\n\
             4. Uses simple, beginner-friendly language\n\
             5. Is concise (1-2 pages max)\n\n\
             Return the clarification content in markdown format.",
            request.question, request.incorrect_answer, request.correct_answer,
            request.source_module.as_str(),
        );

        let result = self.reasoning.invoke(&definition, &context, &schema).await?;
        result
            .get("content")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.to_string())
    }
}

pub fn make_id(question_id: &str, created_at_millis: i64) -> String {
    format!("clarification_{question_id}_{created_at_millis}")
}

/// Deterministic remediation template. Names the question, the learner's
/// answer and the correct answer so it stays useful with no services at
/// all.
pub fn fallback_content(request: &ClarificationRequest) -> String {
    format!(
        "## Clarification: Understanding {question_id}\n\n\
         You answered: **{incorrect}**\n\n\
         The correct answer is: **{correct}**\n\n\
         ### Why this matters\n\n\
         This concept is part of {module}. The key is the difference between what you \
         answered and the correct answer: **{correct}** accurately describes the concept \
         being tested, while **{incorrect}** does not.\n\n\
         ### Moving forward\n\n\
         Review the points above, then continue with the main lesson. You will see this \
         concept again later.\n",
        question_id = request.question_id,
        incorrect = request.incorrect_answer,
        correct = request.correct_answer,
        module = request.source_module.title(),
    )
}
