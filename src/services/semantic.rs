use serde::Serialize;
use tracing::warn;

use crate::services::llm::LlmClient;

const SYSTEM_PROMPT: &str = "You are an educational assessment AI. Evaluate student answers for \
     understanding and detect confusion signals.";

const LESSON_CONTEXT_LIMIT: usize = 500;

/// Structured verdict from the semantic answer-evaluation collaborator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticVerdict {
    pub understanding: bool,
    pub confused: bool,
    pub confidence: f64,
    pub reasoning: String,
    pub action: String,
}

/// Free-text answer judge backed by the LLM client. Absence or failure of
/// the backing service yields `None`; callers always have a local fallback.
#[derive(Clone)]
pub struct SemanticClient {
    llm: LlmClient,
}

impl SemanticClient {
    pub fn from_env() -> Self {
        Self {
            llm: LlmClient::from_env(),
        }
    }

    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    pub fn disabled() -> Self {
        Self {
            llm: LlmClient::disabled(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.llm.is_available()
    }

    pub async fn evaluate(
        &self,
        question: &str,
        answer: &str,
        lesson_context: Option<&str>,
    ) -> Option<SemanticVerdict> {
        if !self.is_available() {
            return None;
        }

        let prompt = build_prompt(question, answer, lesson_context);
        match self.llm.complete_with_system(SYSTEM_PROMPT, &prompt).await {
            Ok(text) => parse_verdict(&text),
            Err(err) => {
                warn!(error = %err, "semantic evaluation unavailable, using heuristic fallback");
                None
            }
        }
    }
}

fn build_prompt(question: &str, answer: &str, lesson_context: Option<&str>) -> String {
    let context = lesson_context
        .map(|c| truncate(c, LESSON_CONTEXT_LIMIT))
        .unwrap_or("N/A");

    format!(
        "Lesson content: {context}\n\n\
         Evaluate this learning quiz answer. The question is: \"{question}\"\n\n\
         User's answer: \"{answer}\"\n\n\
         Evaluate:\n\
         1. Does the answer demonstrate understanding of the concept? (yes/no)\n\
         2. Is the user confused or frustrated? (yes/no)\n\
         3. Confidence level (0.0-1.0)\n\
         4. Brief reasoning\n\n\
         Respond in this exact format:\n\
         UNDERSTANDING: yes/no\n\
         CONFUSED: yes/no\n\
         CONFIDENCE: 0.0-1.0\n\
         REASONING: brief explanation\n\
         ACTION: simplify_and_examples/continue/provide_examples"
    )
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Parses the line-oriented verdict format. A response missing every field
/// still yields a usable verdict with conservative defaults.
fn parse_verdict(text: &str) -> Option<SemanticVerdict> {
    let lower = text.to_lowercase();
    let understanding = lower.contains("understanding: yes");
    let confused = lower.contains("confused: yes");

    let mut confidence = 0.5;
    let mut reasoning = String::from("LLM evaluation");
    let mut action = String::from("continue");

    for line in text.lines() {
        if let Some(rest) = line.trim().strip_prefix("CONFIDENCE:") {
            if let Ok(value) = rest.trim().parse::<f64>() {
                confidence = value.clamp(0.0, 1.0);
            }
        } else if let Some(rest) = line.trim().strip_prefix("REASONING:") {
            if !rest.trim().is_empty() {
                reasoning = rest.trim().to_string();
            }
        } else if let Some(rest) = line.trim().strip_prefix("ACTION:") {
            if !rest.trim().is_empty() {
                action = rest.trim().to_string();
            }
        }
    }

    Some(SemanticVerdict {
        understanding,
        confused,
        confidence,
        reasoning,
        action,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_verdict() {
        let text = "UNDERSTANDING: yes\nCONFUSED: no\nCONFIDENCE: 0.85\n\
                    REASONING: solid grasp of tokenization\nACTION: continue";
        let verdict = parse_verdict(text).unwrap();
        assert!(verdict.understanding);
        assert!(!verdict.confused);
        assert!((verdict.confidence - 0.85).abs() < 1e-9);
        assert_eq!(verdict.reasoning, "solid grasp of tokenization");
        assert_eq!(verdict.action, "continue");
    }

    #[test]
    fn test_parse_defaults_on_sparse_response() {
        let verdict = parse_verdict("UNDERSTANDING: no").unwrap();
        assert!(!verdict.understanding);
        assert!(!verdict.confused);
        assert!((verdict.confidence - 0.5).abs() < 1e-9);
        assert_eq!(verdict.action, "continue");
    }

    #[test]
    fn test_confidence_is_clamped() {
        let verdict = parse_verdict("CONFIDENCE: 7.5").unwrap();
        assert!((verdict.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_prompt_truncates_lesson_context() {
        let long = "x".repeat(2000);
        let prompt = build_prompt("q", "a", Some(&long));
        assert!(prompt.len() < 1500);
    }
}
