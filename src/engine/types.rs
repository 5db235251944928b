use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Difficulty scale used for content selection: 0 (beginner) to 3 (expert).
/// Conversions saturate, so an out-of-range value can never be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
#[derive(Default)]
pub enum DifficultyLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    Expert,
}

impl DifficultyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Expert => "expert",
        }
    }

    pub fn as_index(&self) -> u8 {
        match self {
            Self::Beginner => 0,
            Self::Intermediate => 1,
            Self::Advanced => 2,
            Self::Expert => 3,
        }
    }

    pub fn from_index(index: i64) -> Self {
        match index {
            i64::MIN..=0 => Self::Beginner,
            1 => Self::Intermediate,
            2 => Self::Advanced,
            _ => Self::Expert,
        }
    }

    pub fn step_up(&self) -> Self {
        match self {
            Self::Beginner => Self::Intermediate,
            Self::Intermediate => Self::Advanced,
            _ => Self::Expert,
        }
    }

    pub fn step_down(&self) -> Self {
        match self {
            Self::Expert => Self::Advanced,
            Self::Advanced => Self::Intermediate,
            _ => Self::Beginner,
        }
    }
}

impl From<DifficultyLevel> for u8 {
    fn from(level: DifficultyLevel) -> Self {
        level.as_index()
    }
}

impl From<u8> for DifficultyLevel {
    fn from(index: u8) -> Self {
        Self::from_index(index as i64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleId {
    Diagnostic,
    Fundamentals,
    TransformersLlms,
    Agents,
    BuildTodoAgent,
    Clarification,
    CapstoneCompleted,
}

impl ModuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Diagnostic => "diagnostic",
            Self::Fundamentals => "fundamentals",
            Self::TransformersLlms => "transformers_llms",
            Self::Agents => "agents",
            Self::BuildTodoAgent => "build_todo_agent",
            Self::Clarification => "clarification",
            Self::CapstoneCompleted => "capstone_completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "diagnostic" => Some(Self::Diagnostic),
            "fundamentals" => Some(Self::Fundamentals),
            "transformers_llms" => Some(Self::TransformersLlms),
            "agents" => Some(Self::Agents),
            "build_todo_agent" => Some(Self::BuildTodoAgent),
            "clarification" => Some(Self::Clarification),
            "capstone_completed" => Some(Self::CapstoneCompleted),
            _ => None,
        }
    }

    /// Human-readable title, used in progress messages.
    pub fn title(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningStyle {
    Text,
    Visual,
    Examples,
}

impl LearningStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Visual => "visual",
            Self::Examples => "examples",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "visual" => Some(Self::Visual),
            "examples" => Some(Self::Examples),
            _ => None,
        }
    }
}

/// One recorded quiz attempt. Owned exclusively by the learner record;
/// `difficulty_level` is the level in effect at the time of the attempt and
/// is never edited afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    pub question_id: String,
    pub correct: bool,
    pub hesitation_seconds: f64,
    pub difficulty_level: DifficultyLevel,
    pub timestamp: DateTime<Utc>,
}

/// A remediation unit queued after an incorrect answer. Lives in
/// `pending_clarifications` until completed by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClarificationUnit {
    pub id: String,
    pub question_id: String,
    pub question: String,
    pub content: String,
    pub source_module: ModuleId,
    pub created_at: DateTime<Utc>,
}

/// Durable per-learner state, keyed by `learner_id`.
///
/// `quiz_performance` and `hesitation_history` are append-only and never
/// reordered or truncated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerRecord {
    pub learner_id: String,
    pub current_module: ModuleId,
    pub current_page: u32,
    pub difficulty_level: DifficultyLevel,
    pub completed_modules: Vec<ModuleId>,
    pub quiz_performance: Vec<QuizAttempt>,
    pub hesitation_history: Vec<f64>,
    pub preferred_learning_style: Option<LearningStyle>,
    pub pending_clarifications: Vec<ClarificationUnit>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl LearnerRecord {
    pub fn new(learner_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            learner_id: learner_id.into(),
            current_module: ModuleId::Diagnostic,
            current_page: 0,
            difficulty_level: DifficultyLevel::Intermediate,
            completed_modules: Vec::new(),
            quiz_performance: Vec::new(),
            hesitation_history: Vec::new(),
            preferred_learning_style: None,
            pending_clarifications: Vec::new(),
            created_at: now,
            last_active: now,
        }
    }

    pub fn has_answered(&self, question_id: &str) -> bool {
        self.quiz_performance
            .iter()
            .any(|attempt| attempt.question_id == question_id)
    }

    /// Appends an attempt stamped with the difficulty currently in effect.
    pub fn push_attempt(&mut self, question_id: impl Into<String>, correct: bool, hesitation_seconds: f64) {
        self.quiz_performance.push(QuizAttempt {
            question_id: question_id.into(),
            correct,
            hesitation_seconds,
            difficulty_level: self.difficulty_level,
            timestamp: Utc::now(),
        });
        self.hesitation_history.push(hesitation_seconds);
    }

    pub fn recent_attempts(&self, count: usize) -> &[QuizAttempt] {
        let start = self.quiz_performance.len().saturating_sub(count);
        &self.quiz_performance[start..]
    }

    /// Membership-checked append; repeat calls for the same module are no-ops.
    pub fn mark_completed(&mut self, module: ModuleId) {
        if !self.completed_modules.contains(&module) {
            self.completed_modules.push(module);
        }
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_conversions_saturate() {
        assert_eq!(DifficultyLevel::from_index(-4), DifficultyLevel::Beginner);
        assert_eq!(DifficultyLevel::from_index(9), DifficultyLevel::Expert);
        assert_eq!(DifficultyLevel::Expert.step_up(), DifficultyLevel::Expert);
        assert_eq!(DifficultyLevel::Beginner.step_down(), DifficultyLevel::Beginner);
    }

    #[test]
    fn test_module_serde_uses_snake_case_names() {
        let json = serde_json::to_string(&ModuleId::TransformersLlms).unwrap();
        assert_eq!(json, "\"transformers_llms\"");
        assert_eq!(ModuleId::parse("build_todo_agent"), Some(ModuleId::BuildTodoAgent));
        assert_eq!(ModuleId::parse("unknown"), None);
    }

    #[test]
    fn test_record_round_trip() {
        let mut record = LearnerRecord::new("learner-1");
        record.push_attempt("fundamentals_q0", true, 3.5);
        record.mark_completed(ModuleId::Diagnostic);

        let json = serde_json::to_string(&record).unwrap();
        let back: LearnerRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.learner_id, "learner-1");
        assert_eq!(back.quiz_performance.len(), 1);
        assert_eq!(back.difficulty_level, DifficultyLevel::Intermediate);
        assert_eq!(back.completed_modules, vec![ModuleId::Diagnostic]);
    }

    #[test]
    fn test_mark_completed_is_append_once() {
        let mut record = LearnerRecord::new("learner-1");
        record.mark_completed(ModuleId::Fundamentals);
        record.mark_completed(ModuleId::Fundamentals);
        assert_eq!(record.completed_modules.len(), 1);
    }

    #[test]
    fn test_attempt_difficulty_is_stamped_at_time_of_attempt() {
        let mut record = LearnerRecord::new("learner-1");
        record.push_attempt("q1", false, 2.0);
        record.difficulty_level = DifficultyLevel::Expert;
        record.push_attempt("q2", true, 2.0);

        assert_eq!(record.quiz_performance[0].difficulty_level, DifficultyLevel::Intermediate);
        assert_eq!(record.quiz_performance[1].difficulty_level, DifficultyLevel::Expert);
    }
}
