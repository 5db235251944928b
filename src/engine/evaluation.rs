use std::sync::Arc;

use serde::Serialize;

use crate::services::SemanticClient;

/// Phrases that signal confusion or frustration. Matching any of them
/// short-circuits evaluation entirely.
pub const CONFUSION_PHRASES: &[&str] = &[
    "all of it seems unclear",
    "i don't think you're listening",
    "i don't understand",
    "i don't know",
    "don't know",
    "dunno",
    "this doesn't make sense",
    "confused",
    "unclear",
    "not listening",
    "doesn't help",
    "still confused",
    "makes no sense",
    "i'm lost",
    "no idea",
    "clueless",
    "have no idea",
    "not sure",
];

/// Domain terms whose presence suggests a free-text answer engages with the
/// material. Used only by the heuristic fallback path.
pub const UNDERSTANDING_KEYWORDS: &[&str] = &[
    "pattern",
    "learn",
    "predict",
    "token",
    "model",
    "training",
    "data",
    "generate",
    "process",
    "input",
    "output",
    "neural",
    "algorithm",
    "autocomplete",
    "sequence",
    "context",
];

const TOO_SHORT_LEN: usize = 10;
const CONFUSED_LEN: usize = 15;
const SUBSTANTIAL_LEN: usize = 20;
const HIGH_CONFIDENCE_LEN: usize = 40;
const DETAILED_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    SimplifyAndExamples,
    ProvideExamples,
    Continue,
}

impl SuggestedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SimplifyAndExamples => "simplify_and_examples",
            Self::ProvideExamples => "provide_examples",
            Self::Continue => "continue",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "simplify_and_examples" => Self::SimplifyAndExamples,
            "provide_examples" => Self::ProvideExamples,
            _ => Self::Continue,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub is_correct: bool,
    pub is_confused: bool,
    pub confidence: f64,
    pub reasoning: String,
    pub suggested_action: SuggestedAction,
}

/// Dual-path answer evaluation: exact index matching for selections,
/// confidence-scored semantic or heuristic judgment for free text.
#[derive(Clone)]
pub struct AnswerEvaluator {
    semantic: Arc<SemanticClient>,
}

impl AnswerEvaluator {
    pub fn new(semantic: Arc<SemanticClient>) -> Self {
        Self { semantic }
    }

    /// Selection-based mode: correctness is integer equality, confusion is
    /// never inferred from a click.
    pub fn evaluate_choice(selected_option: usize, correct_option: usize) -> Evaluation {
        let is_correct = selected_option == correct_option;
        Evaluation {
            is_correct,
            is_confused: false,
            confidence: 1.0,
            reasoning: if is_correct {
                "Selected the correct option".to_string()
            } else {
                "Selected option does not match the correct option".to_string()
            },
            suggested_action: SuggestedAction::Continue,
        }
    }

    /// Free-text mode. The confusion-phrase check runs first and cannot be
    /// overridden; a semantic verdict may add confusion but never remove it.
    pub async fn evaluate_free_text(
        &self,
        question: &str,
        answer: &str,
        lesson_context: Option<&str>,
    ) -> Evaluation {
        let normalized = answer.to_lowercase();
        let locally_confused = CONFUSION_PHRASES
            .iter()
            .any(|phrase| normalized.contains(phrase));

        if locally_confused {
            return Evaluation {
                is_correct: false,
                is_confused: true,
                confidence: 0.0,
                reasoning: "Learner expressed confusion or frustration".to_string(),
                suggested_action: SuggestedAction::SimplifyAndExamples,
            };
        }

        if self.semantic.is_available() && !answer.trim().is_empty() {
            if let Some(verdict) = self.semantic.evaluate(question, answer, lesson_context).await {
                return Evaluation {
                    is_correct: verdict.understanding,
                    is_confused: verdict.confused || locally_confused,
                    confidence: verdict.confidence,
                    reasoning: verdict.reasoning,
                    suggested_action: SuggestedAction::parse(&verdict.action),
                };
            }
        }

        heuristic_evaluation(answer)
    }
}

/// Deterministic fallback used when the semantic collaborator is absent or
/// fails: judges by length and domain keywords.
fn heuristic_evaluation(answer: &str) -> Evaluation {
    let trimmed = answer.trim();
    let length = trimmed.chars().count();

    if length < TOO_SHORT_LEN {
        return Evaluation {
            is_correct: false,
            is_confused: true,
            confidence: 0.2,
            reasoning: "Answer too short, likely indicates confusion".to_string(),
            suggested_action: SuggestedAction::SimplifyAndExamples,
        };
    }

    let lower = trimmed.to_lowercase();
    let has_keywords = UNDERSTANDING_KEYWORDS.iter().any(|kw| lower.contains(kw));
    let is_correct = length >= SUBSTANTIAL_LEN && (has_keywords || length >= DETAILED_LEN);

    let confidence = if is_correct && length > HIGH_CONFIDENCE_LEN {
        0.7
    } else if is_correct {
        0.5
    } else {
        0.3
    };

    Evaluation {
        is_correct,
        is_confused: length < CONFUSED_LEN,
        confidence,
        reasoning: if is_correct {
            "Evaluated based on answer length and content".to_string()
        } else {
            "Answer could be more detailed. Try to explain your understanding more fully."
                .to_string()
        },
        suggested_action: SuggestedAction::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_evaluator() -> AnswerEvaluator {
        AnswerEvaluator::new(Arc::new(SemanticClient::disabled()))
    }

    #[tokio::test]
    async fn test_confusion_phrase_short_circuits() {
        let evaluator = offline_evaluator();
        let result = evaluator
            .evaluate_free_text("What is an LLM?", "I don't understand", None)
            .await;
        assert!(!result.is_correct);
        assert!(result.is_confused);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.suggested_action, SuggestedAction::SimplifyAndExamples);
    }

    #[tokio::test]
    async fn test_confusion_phrase_wins_over_keywords_and_length() {
        let evaluator = offline_evaluator();
        let answer = "The model predicts tokens from patterns but honestly this doesn't make sense to me";
        let result = evaluator.evaluate_free_text("q", answer, None).await;
        assert!(result.is_confused);
        assert_eq!(result.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_very_short_answer_is_confused() {
        let evaluator = offline_evaluator();
        let result = evaluator.evaluate_free_text("q", "tokens", None).await;
        assert!(!result.is_correct);
        assert!(result.is_confused);
        assert_eq!(result.confidence, 0.2);
    }

    #[tokio::test]
    async fn test_keyword_answer_is_correct() {
        let evaluator = offline_evaluator();
        let result = evaluator
            .evaluate_free_text("q", "An LLM predicts the next token", None)
            .await;
        assert!(result.is_correct);
        assert!(!result.is_confused);
        assert_eq!(result.confidence, 0.5);
    }

    #[tokio::test]
    async fn test_long_detailed_answer_without_keywords_is_correct() {
        let evaluator = offline_evaluator();
        let answer = "It works by looking at lots of writing and guessing what usually comes after";
        let result = evaluator.evaluate_free_text("q", answer, None).await;
        assert!(result.is_correct);
        assert_eq!(result.confidence, 0.7);
    }

    #[tokio::test]
    async fn test_medium_answer_without_keywords_is_incorrect() {
        let evaluator = offline_evaluator();
        let result = evaluator
            .evaluate_free_text("q", "some things about computers", None)
            .await;
        assert!(!result.is_correct);
        assert!(!result.is_confused);
        assert_eq!(result.confidence, 0.3);
    }

    #[test]
    fn test_choice_mode_never_reports_confusion() {
        let right = AnswerEvaluator::evaluate_choice(2, 2);
        assert!(right.is_correct);
        assert!(!right.is_confused);

        let wrong = AnswerEvaluator::evaluate_choice(1, 2);
        assert!(!wrong.is_correct);
        assert!(!wrong.is_confused);
    }

    #[test]
    fn test_suggested_action_parse_defaults_to_continue() {
        assert_eq!(SuggestedAction::parse("provide_examples"), SuggestedAction::ProvideExamples);
        assert_eq!(SuggestedAction::parse("???"), SuggestedAction::Continue);
    }
}
