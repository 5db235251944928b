use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::config::EngineConfig;
use crate::content::{self, ContentLibrary};
use crate::engine::adaptation;
use crate::engine::clarification::{ClarificationQueue, ClarificationRequest};
use crate::engine::diagnostic::{self, DiagnosticAnswer, DiagnosticOutcome, DiagnosticPrompt};
use crate::engine::evaluation::{AnswerEvaluator, SuggestedAction};
use crate::engine::progression::{self, AdvanceOutcome};
use crate::engine::types::{
    ClarificationUnit, DifficultyLevel, LearnerRecord, LearningStyle, ModuleId,
};
use crate::engine::EngineError;
use crate::services::{PersonalizationClient, ReasoningClient, SemanticClient};
use crate::store::{JsonFileStore, LearnerStore};

/// How many trailing attempts are shared with the reasoning and
/// personalization services as recent-performance context.
const RECENT_PERFORMANCE_WINDOW: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    pub outcome: DiagnosticOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accelerated_module: Option<ModuleId>,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckQuestion {
    pub question_id: String,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option: Option<usize>,
    pub global_index: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPayload {
    pub module: ModuleId,
    pub content: String,
    pub difficulty: DifficultyLevel,
    pub learning_style: LearningStyle,
    pub check_questions: Vec<CheckQuestion>,
    pub current_page: u32,
    pub total_pages: u32,
    pub is_paginated: bool,
    pub is_clarification: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clarification_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_question_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_module: Option<ModuleId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights: Option<String>,
}

/// The two mutually exclusive answer modes of a submission.
#[derive(Debug, Clone)]
pub enum AnswerInput {
    /// Multiple choice: judged purely by index equality.
    Selected { option: usize, correct_option: usize },
    /// Free text: judged semantically, with heuristic fallback.
    FreeText(String),
}

#[derive(Debug, Clone)]
pub struct QuizSubmission {
    pub question_id: String,
    pub question: Option<String>,
    pub response: AnswerInput,
    pub correct_answer: Option<String>,
    pub hesitation_seconds: f64,
    pub lesson_context: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizFeedback {
    pub correct: bool,
    pub is_confused: bool,
    pub confidence: f64,
    pub reasoning: String,
    pub previous_difficulty: DifficultyLevel,
    pub new_difficulty: DifficultyLevel,
    pub difficulty_changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_direction: Option<&'static str>,
    pub should_switch_to_examples: bool,
    pub should_simplify: bool,
    pub suggested_action: SuggestedAction,
    /// Set when this submission queued a new clarification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clarification_id: Option<String>,
    /// True when the question id had already been recorded; the attempt
    /// log was left untouched.
    pub already_answered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervention: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapstonePayload {
    pub agent_code: String,
    pub agent_description: String,
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Adaptations {
    pub current_difficulty: DifficultyLevel,
    pub recommended_style: LearningStyle,
    pub should_use_examples: bool,
    pub should_simplify: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentTrend {
    pub accuracy: f64,
    pub avg_hesitation: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub learner_id: String,
    pub current_module: ModuleId,
    pub completed_modules: Vec<ModuleId>,
    pub difficulty_level: DifficultyLevel,
    pub total_questions: usize,
    pub correct_answers: usize,
    pub accuracy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_style: Option<LearningStyle>,
    pub pending_clarifications: usize,
    pub adaptations: Adaptations,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_trend: Option<RecentTrend>,
}

/// Lesson metadata as the reasoning service returns it; any shape mismatch
/// drops the whole plan onto the fallback path.
#[derive(Debug, Deserialize)]
struct RemoteLessonPlan {
    #[serde(default)]
    check_questions: Vec<RemoteCheckQuestion>,
    #[serde(default)]
    suggested_style: Option<String>,
    #[serde(default)]
    next_module: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoteCheckQuestion {
    question: String,
    #[serde(default)]
    options: Option<Vec<String>>,
    #[serde(default, alias = "correct_answer")]
    correct_option: Option<usize>,
}

#[derive(Debug, Clone)]
struct QuestionSeed {
    question: String,
    options: Option<Vec<String>>,
    correct_option: Option<usize>,
}

#[derive(Debug, Clone)]
struct LessonPlan {
    questions: Vec<QuestionSeed>,
    style: LearningStyle,
    next_module: Option<ModuleId>,
}

/// Session orchestrator. Stateless per request: every operation loads the
/// learner record, delegates to the relevant component, persists and
/// returns a payload. Requests for different learners are independent;
/// concurrent requests for the same learner need external serialization.
pub struct LearningEngine {
    store: Arc<dyn LearnerStore>,
    content: ContentLibrary,
    reasoning: Arc<ReasoningClient>,
    clarifications: ClarificationQueue,
    evaluator: AnswerEvaluator,
    personalization: Arc<PersonalizationClient>,
}

impl LearningEngine {
    pub fn new(
        store: Arc<dyn LearnerStore>,
        content: ContentLibrary,
        reasoning: ReasoningClient,
        semantic: SemanticClient,
        personalization: PersonalizationClient,
    ) -> Self {
        let reasoning = Arc::new(reasoning);
        Self {
            store,
            content,
            clarifications: ClarificationQueue::new(Arc::clone(&reasoning)),
            evaluator: AnswerEvaluator::new(Arc::new(semantic)),
            reasoning,
            personalization: Arc::new(personalization),
        }
    }

    pub fn from_env(store: Arc<dyn LearnerStore>) -> Self {
        Self::new(
            store,
            ContentLibrary::from_env(),
            ReasoningClient::from_env(),
            SemanticClient::from_env(),
            PersonalizationClient::from_env(),
        )
    }

    /// Full env-driven setup: file-backed store plus env-configured
    /// collaborators.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            Arc::new(JsonFileStore::new(config.data_file.clone())),
            ContentLibrary::new(config.content_dir.clone()),
            ReasoningClient::from_env(),
            SemanticClient::from_env(),
            PersonalizationClient::from_env(),
        )
    }

    /// A calibration question ready to present, or `None` past the end of
    /// the batch.
    pub fn diagnostic_prompt(&self, question_index: usize) -> Option<DiagnosticPrompt> {
        diagnostic::present(question_index)
    }

    /// Scores a full calibration batch and applies the assessed level. A
    /// perfect batch accelerates the learner past fundamentals; gated
    /// modules are never entered this way.
    pub async fn complete_diagnostic(
        &self,
        learner_id: &str,
        answers: &[DiagnosticAnswer],
    ) -> Result<DiagnosticReport, EngineError> {
        if answers.len() != diagnostic::QUESTION_COUNT {
            return Err(EngineError::IncompleteDiagnostic {
                expected: diagnostic::QUESTION_COUNT,
                got: answers.len(),
            });
        }

        let outcome = diagnostic::score_batch(answers);
        let mut record = self.load_or_init(learner_id).await?;
        record.difficulty_level = outcome.level;

        let mut accelerated_module = None;
        let mut reasoning = format!(
            "Diagnostic complete. Assessed level: {}",
            outcome.level.as_index()
        );

        if outcome.all_correct {
            let target = match record.current_module {
                ModuleId::Diagnostic | ModuleId::Fundamentals => Some(ModuleId::TransformersLlms),
                current => progression::sequence_index(current)
                    .and_then(|idx| progression::MODULE_SEQUENCE.get(idx + 1).copied())
                    .filter(|&next| !progression::is_gated(next)),
            };
            if let Some(next) = target {
                progression::enter_module(&mut record, next);
                accelerated_module = Some(next);
                reasoning = format!(
                    "Excellent! You answered all questions correctly. Accelerating to {}.",
                    next.title()
                );
            }
        }

        self.persist(&mut record)?;
        info!(learner_id, level = outcome.level.as_index(), "diagnostic assessed");

        self.personalization
            .ingest_event(
                learner_id,
                "diagnostic_completed",
                &json!({
                    "assessed_level": outcome.level.as_index(),
                    "all_correct": outcome.all_correct,
                    "all_unsure": outcome.all_unsure,
                }),
                &timestamp_metadata(),
            )
            .await;

        Ok(DiagnosticReport {
            outcome,
            accelerated_module,
            reasoning,
        })
    }

    /// The next lesson for a learner. With `skip_clarifications` false, a
    /// pending clarification is delivered first.
    pub async fn next_lesson(
        &self,
        learner_id: &str,
        skip_clarifications: bool,
    ) -> Result<LessonPayload, EngineError> {
        let mut record = self.load_or_init(learner_id).await?;

        if !skip_clarifications {
            if let Some(unit) = record.pending_clarifications.first() {
                return Ok(clarification_payload(unit, record.difficulty_level));
            }
        }

        let mut module_changed = false;
        if record.current_module == ModuleId::Diagnostic {
            progression::enter_module(&mut record, ModuleId::Fundamentals);
            module_changed = true;
        }
        let module = record.current_module;

        let insights = self.gather_insights(&record, module).await;
        let plan = self.lesson_plan(&record, module, insights.as_deref()).await;

        let total_pages = self.content.page_count(module);
        let current_page = record.current_page.min(total_pages.saturating_sub(1));
        let content = self.content.lesson_content(module, current_page);
        let check_questions = select_check_questions(&record, module, current_page, &plan.questions);

        if module_changed {
            self.persist(&mut record)?;
        }

        Ok(LessonPayload {
            module,
            content,
            difficulty: record.difficulty_level,
            learning_style: plan.style,
            check_questions,
            current_page,
            total_pages,
            is_paginated: total_pages > 1,
            is_clarification: false,
            clarification_id: None,
            source_question_id: None,
            next_module: plan.next_module,
            insights,
        })
    }

    /// Evaluates one answer and applies every downstream rule: remediation
    /// queueing, attempt dedup, difficulty adaptation and the immediate
    /// confusion reaction.
    pub async fn submit_answer(
        &self,
        learner_id: &str,
        submission: QuizSubmission,
    ) -> Result<QuizFeedback, EngineError> {
        let mut record = self.load_or_init(learner_id).await?;

        let question_text = submission
            .question
            .clone()
            .unwrap_or_else(|| submission.question_id.clone());

        let (evaluation, answer_text, correct_text) = match &submission.response {
            AnswerInput::Selected {
                option,
                correct_option,
            } => (
                AnswerEvaluator::evaluate_choice(*option, *correct_option),
                format!("Selected option {option}"),
                submission
                    .correct_answer
                    .clone()
                    .unwrap_or_else(|| format!("Option {correct_option}")),
            ),
            AnswerInput::FreeText(text) => (
                self.evaluator
                    .evaluate_free_text(&question_text, text, submission.lesson_context.as_deref())
                    .await,
                text.clone(),
                submission.correct_answer.clone().unwrap_or_default(),
            ),
        };

        let mut is_confused = evaluation.is_confused;

        let mut clarification_id = None;
        if !evaluation.is_correct && record.current_module != ModuleId::Clarification {
            let source_module = record.current_module;
            let difficulty_level = record.difficulty_level;
            let unit = self
                .clarifications
                .enqueue(
                    &mut record,
                    ClarificationRequest {
                        question: question_text.clone(),
                        question_id: submission.question_id.clone(),
                        incorrect_answer: answer_text.clone(),
                        correct_answer: correct_text,
                        source_module,
                        difficulty_level,
                    },
                )
                .await;
            clarification_id = Some(unit.id);
        }

        // Advisory struggle check; a positive signal can add confusion but
        // never clear a locally detected one.
        let mut intervention = None;
        if self.personalization.is_available() {
            let question = format!(
                "Learner answered question {}. Answer was {}. Hesitation: {:.1}s. \
                 Should we provide additional help or intervention?",
                submission.question_id,
                if evaluation.is_correct { "correct" } else { "incorrect" },
                submission.hesitation_seconds,
            );
            if let Some(answer) = self.personalization.query(learner_id, &question).await {
                let lower = answer.to_lowercase();
                if lower.contains("yes") || lower.contains("help") {
                    is_confused = true;
                }
                intervention = Some(answer);
            }
        }

        let previous_difficulty = record.difficulty_level;
        let already_answered = record.has_answered(&submission.question_id);

        if !already_answered {
            record.push_attempt(
                &submission.question_id,
                evaluation.is_correct,
                submission.hesitation_seconds,
            );
            self.personalization
                .ingest_event(
                    learner_id,
                    "quiz_attempt",
                    &json!({
                        "question_id": &submission.question_id,
                        "correct": evaluation.is_correct,
                        "hesitation_seconds": submission.hesitation_seconds,
                        "difficulty_level": record.difficulty_level.as_index(),
                        "current_module": record.current_module.as_str(),
                    }),
                    &timestamp_metadata(),
                )
                .await;
            self.adapt_difficulty(&mut record).await;
        }

        if is_confused {
            adaptation::apply_confusion(&mut record);
        }

        self.persist(&mut record)?;

        let recommendation = if self.personalization.is_available() {
            self.personalization
                .query(
                    learner_id,
                    &format!(
                        "Based on this {} answer with {:.1}s hesitation, what should be the \
                         next learning action?",
                        if evaluation.is_correct { "correct" } else { "incorrect" },
                        submission.hesitation_seconds,
                    ),
                )
                .await
        } else {
            None
        };

        let new_difficulty = record.difficulty_level;
        let change_direction = match new_difficulty.cmp(&previous_difficulty) {
            std::cmp::Ordering::Greater => Some("increased"),
            std::cmp::Ordering::Less => Some("decreased"),
            std::cmp::Ordering::Equal => None,
        };

        Ok(QuizFeedback {
            correct: evaluation.is_correct,
            is_confused,
            confidence: evaluation.confidence,
            reasoning: evaluation.reasoning,
            previous_difficulty,
            new_difficulty,
            difficulty_changed: change_direction.is_some(),
            change_direction,
            should_switch_to_examples: adaptation::should_switch_to_examples(&record) || is_confused,
            should_simplify: adaptation::should_simplify(&record) || is_confused,
            suggested_action: evaluation.suggested_action,
            clarification_id,
            already_answered,
            intervention,
            recommendation,
        })
    }

    /// Advances within the current module, falling through to module
    /// advancement on the last page. Refused advances persist nothing.
    pub async fn advance_page(&self, learner_id: &str) -> Result<AdvanceOutcome, EngineError> {
        let mut record = self.load_or_init(learner_id).await?;
        let departed = record.current_module;
        let page_count = self.content.page_count(departed);

        let outcome = progression::advance_page(&mut record, page_count);
        self.finish_advance(&mut record, departed, &outcome).await?;
        Ok(outcome)
    }

    /// Advances directly to the next module in the sequence.
    pub async fn advance_module(&self, learner_id: &str) -> Result<AdvanceOutcome, EngineError> {
        let mut record = self.load_or_init(learner_id).await?;
        let departed = record.current_module;

        let outcome = progression::advance_module(&mut record);
        self.finish_advance(&mut record, departed, &outcome).await?;
        Ok(outcome)
    }

    /// Retires a pending clarification. Unknown ids return false and leave
    /// everything untouched.
    pub async fn complete_clarification(
        &self,
        learner_id: &str,
        clarification_id: &str,
    ) -> Result<bool, EngineError> {
        let mut record = self.load_or_init(learner_id).await?;
        let removed = ClarificationQueue::complete(&mut record, clarification_id);
        if removed {
            self.persist(&mut record)?;
        }
        Ok(removed)
    }

    pub async fn pending_clarifications(
        &self,
        learner_id: &str,
    ) -> Result<Vec<ClarificationUnit>, EngineError> {
        let record = self.load_or_init(learner_id).await?;
        Ok(record.pending_clarifications)
    }

    /// Generates the capstone project and moves the learner into the
    /// terminal `capstone_completed` state.
    pub async fn run_capstone(
        &self,
        learner_id: &str,
        task_description: &str,
    ) -> Result<CapstonePayload, EngineError> {
        let mut record = self.load_or_init(learner_id).await?;

        let mut insights = None;
        if self.personalization.is_available() {
            let memories = self
                .personalization
                .retrieve(
                    learner_id,
                    "What are this learner's learning preferences and strengths?",
                    3,
                )
                .await;
            let texts: Vec<_> = memories
                .iter()
                .map(|m| m.content.trim())
                .filter(|c| !c.is_empty())
                .take(2)
                .collect();
            if !texts.is_empty() {
                insights = Some(format!("Learner profile: {}", texts.join(", ")));
            }
        }

        self.personalization
            .ingest_event(
                learner_id,
                "capstone_request",
                &json!({
                    "task_description": task_description,
                    "completed_modules": &record.completed_modules,
                }),
                &timestamp_metadata(),
            )
            .await;

        let mut context = json!({
            "learner_id": learner_id,
            "task_description": task_description,
        });
        if let Some(ref text) = insights {
            context["insights"] = Value::String(text.clone());
        }
        let schema = json!({
            "agent_code": "string",
            "agent_description": "string",
            "next_steps": "list",
        });

        let payload = match self.reasoning.invoke("capstone", &context, &schema).await {
            Some(value) => serde_json::from_value(value)
                .unwrap_or_else(|_| fallback_capstone(task_description)),
            None => fallback_capstone(task_description),
        };

        progression::enter_module(&mut record, ModuleId::CapstoneCompleted);
        self.persist(&mut record)?;
        info!(learner_id, "capstone completed");

        Ok(payload)
    }

    /// Read-only progress overview.
    pub async fn progress_summary(&self, learner_id: &str) -> Result<ProgressSummary, EngineError> {
        let record = self.load_or_init(learner_id).await?;

        let total_questions = record.quiz_performance.len();
        let correct_answers = record.quiz_performance.iter().filter(|a| a.correct).count();
        let accuracy = if total_questions > 0 {
            correct_answers as f64 / total_questions as f64
        } else {
            0.0
        };

        let recent_trend = (total_questions >= 3).then(|| {
            let recent = record.recent_attempts(3);
            RecentTrend {
                accuracy: recent.iter().filter(|a| a.correct).count() as f64 / recent.len() as f64,
                avg_hesitation: recent.iter().map(|a| a.hesitation_seconds).sum::<f64>()
                    / recent.len() as f64,
            }
        });

        Ok(ProgressSummary {
            learner_id: record.learner_id.clone(),
            current_module: record.current_module,
            completed_modules: record.completed_modules.clone(),
            difficulty_level: record.difficulty_level,
            total_questions,
            correct_answers,
            accuracy,
            preferred_style: record.preferred_learning_style,
            pending_clarifications: record.pending_clarifications.len(),
            adaptations: Adaptations {
                current_difficulty: record.difficulty_level,
                recommended_style: adaptation::recommended_style(&record),
                should_use_examples: adaptation::should_switch_to_examples(&record),
                should_simplify: adaptation::should_simplify(&record),
            },
            recent_trend,
        })
    }

    /// Reinitializes the learner's record.
    pub async fn reset(&self, learner_id: &str) -> Result<(), EngineError> {
        let mut record = LearnerRecord::new(learner_id);
        self.persist(&mut record)?;
        Ok(())
    }

    async fn load_or_init(&self, learner_id: &str) -> Result<LearnerRecord, EngineError> {
        if let Some(record) = self.store.load(learner_id)? {
            return Ok(record);
        }
        let record = LearnerRecord::new(learner_id);
        self.personalization
            .register(
                learner_id,
                &json!({
                    "platform": "learnai",
                    "created_at": record.created_at.to_rfc3339(),
                }),
            )
            .await;
        Ok(record)
    }

    /// Single save path; refreshes `last_active` on every persist.
    fn persist(&self, record: &mut LearnerRecord) -> Result<(), EngineError> {
        record.touch();
        self.store.save(record)?;
        Ok(())
    }

    async fn finish_advance(
        &self,
        record: &mut LearnerRecord,
        departed: ModuleId,
        outcome: &AdvanceOutcome,
    ) -> Result<(), EngineError> {
        if !outcome.advanced {
            return Ok(());
        }
        if record.current_module != departed {
            let learner_id = record.learner_id.clone();
            self.personalization
                .ingest_event(
                    &learner_id,
                    "module_completed",
                    &json!({
                        "module": departed.as_str(),
                        "difficulty_level": record.difficulty_level.as_index(),
                        "total_questions": record.quiz_performance.len(),
                    }),
                    &timestamp_metadata(),
                )
                .await;
        }
        self.persist(record)
    }

    /// Advisory difficulty adjustment: a personalization prediction that
    /// differs from the current level wins (clamped); otherwise the local
    /// windowed rule decides.
    async fn adapt_difficulty(&self, record: &mut LearnerRecord) {
        if record.quiz_performance.len() < adaptation::WINDOW {
            return;
        }

        if self.personalization.is_available() {
            let hesitations = &record.hesitation_history
                [record.hesitation_history.len().saturating_sub(RECENT_PERFORMANCE_WINDOW)..];
            let context = json!({
                "decision_type": "difficulty_adjustment",
                "recent_performance": recent_performance_value(record),
                "current_difficulty": record.difficulty_level.as_index(),
                "hesitation_history": hesitations,
                "module": record.current_module.as_str(),
                "total_questions": record.quiz_performance.len(),
            });
            if let Some(recommended) =
                self.personalization.predict(&record.learner_id, &context).await
            {
                let clamped = DifficultyLevel::from_index(recommended);
                if clamped != record.difficulty_level {
                    info!(
                        learner_id = %record.learner_id,
                        from = record.difficulty_level.as_index(),
                        to = clamped.as_index(),
                        "personalization recommended difficulty change"
                    );
                    record.difficulty_level = clamped;
                    return;
                }
            }
        }

        adaptation::adjust_difficulty(record);
    }

    async fn gather_insights(&self, record: &LearnerRecord, module: ModuleId) -> Option<String> {
        if !self.personalization.is_available() {
            return None;
        }

        let mut parts = Vec::new();

        let struggles = self
            .personalization
            .retrieve(
                &record.learner_id,
                &format!(
                    "What topics or concepts has this learner struggled with in {}?",
                    module.as_str()
                ),
                3,
            )
            .await;
        let struggle_texts: Vec<_> = struggles
            .iter()
            .map(|m| m.content.trim())
            .filter(|c| !c.is_empty())
            .take(2)
            .collect();
        if !struggle_texts.is_empty() {
            parts.push(format!("Past struggles: {}", struggle_texts.join(", ")));
        }

        let strengths = self
            .personalization
            .retrieve(
                &record.learner_id,
                "What topics or concepts has this learner excelled at?",
                2,
            )
            .await;
        if let Some(text) = strengths
            .iter()
            .map(|m| m.content.trim())
            .find(|c| !c.is_empty())
        {
            parts.push(format!("Strengths: {text}"));
        }

        if let Some(patterns) = self
            .personalization
            .query(
                &record.learner_id,
                &format!(
                    "What are this learner's learning patterns and preferences for {}?",
                    module.as_str()
                ),
            )
            .await
        {
            let mut trimmed = patterns;
            trimmed.truncate(200);
            parts.push(format!("Learning patterns: {trimmed}"));
        }

        (!parts.is_empty()).then(|| parts.join("\n"))
    }

    /// Lesson plan from the reasoning service, or the deterministic local
    /// fallback (built-in question bank, heuristic style, sequence order).
    async fn lesson_plan(
        &self,
        record: &LearnerRecord,
        module: ModuleId,
        insights: Option<&str>,
    ) -> LessonPlan {
        if self.reasoning.is_available() {
            let mut context = json!({
                "learner_id": &record.learner_id,
                "difficulty_level": record.difficulty_level.as_index(),
                "current_module": module.as_str(),
                "learning_style": adaptation::recommended_style(record).as_str(),
                "recent_performance": recent_performance_value(record),
                "generate_questions": true,
            });
            if let Some(text) = insights {
                context["insights"] = Value::String(text.to_string());
            }
            let schema = json!({
                "check_questions": "list",
                "suggested_style": "string",
                "next_module": "string",
            });

            if let Some(value) = self.reasoning.invoke("lesson", &context, &schema).await {
                if let Ok(remote) = serde_json::from_value::<RemoteLessonPlan>(value) {
                    if !remote.check_questions.is_empty() {
                        return LessonPlan {
                            questions: remote
                                .check_questions
                                .into_iter()
                                .map(|q| QuestionSeed {
                                    question: q.question,
                                    options: q.options,
                                    correct_option: q.correct_option,
                                })
                                .collect(),
                            style: remote
                                .suggested_style
                                .as_deref()
                                .and_then(LearningStyle::parse)
                                .unwrap_or_else(|| adaptation::recommended_style(record)),
                            next_module: remote.next_module.as_deref().and_then(ModuleId::parse),
                        };
                    }
                }
            }
        }

        fallback_lesson_plan(record, module)
    }
}

fn fallback_lesson_plan(record: &LearnerRecord, module: ModuleId) -> LessonPlan {
    let questions = content::fallback_check_questions(module)
        .iter()
        .map(|seed| QuestionSeed {
            question: seed.question.to_string(),
            options: seed
                .options
                .map(|opts| opts.iter().map(|o| o.to_string()).collect()),
            correct_option: seed.correct_option,
        })
        .collect();

    let next_module = progression::sequence_index(module)
        .and_then(|idx| progression::MODULE_SEQUENCE.get(idx + 1).copied());

    LessonPlan {
        questions,
        style: adaptation::recommended_style(record),
        next_module,
    }
}

/// At most one unanswered check question per page. Fundamentals maps
/// questions onto its early pages; other modules surface the first
/// unanswered question.
fn select_check_questions(
    record: &LearnerRecord,
    module: ModuleId,
    page: u32,
    seeds: &[QuestionSeed],
) -> Vec<CheckQuestion> {
    let build = |index: usize| -> CheckQuestion {
        let seed = &seeds[index];
        CheckQuestion {
            question_id: content::check_question_id(module, index),
            question: seed.question.clone(),
            options: seed.options.clone(),
            correct_option: seed.correct_option,
            global_index: index,
        }
    };

    if module == ModuleId::Fundamentals {
        return match content::fundamentals_question_for_page(page, seeds.len()) {
            Some(index) if !record.has_answered(&content::check_question_id(module, index)) => {
                vec![build(index)]
            }
            _ => Vec::new(),
        };
    }

    (0..seeds.len())
        .find(|&i| !record.has_answered(&content::check_question_id(module, i)))
        .map(|i| vec![build(i)])
        .unwrap_or_default()
}

fn clarification_payload(unit: &ClarificationUnit, difficulty: DifficultyLevel) -> LessonPayload {
    LessonPayload {
        module: ModuleId::Clarification,
        content: unit.content.clone(),
        // Clarifications are pitched one level easier than the current lesson.
        difficulty: difficulty.step_down(),
        learning_style: LearningStyle::Examples,
        check_questions: Vec::new(),
        current_page: 0,
        total_pages: 1,
        is_paginated: false,
        is_clarification: true,
        clarification_id: Some(unit.id.clone()),
        source_question_id: Some(unit.question_id.clone()),
        next_module: None,
        insights: None,
    }
}

const CAPSTONE_TEMPLATE: &str = r#"// Simple to-do agent
// Task: {task}

struct TodoAgent {
    tasks: Vec<String>,
    completed: Vec<String>,
}

impl TodoAgent {
    fn new() -> Self {
        Self { tasks: Vec::new(), completed: Vec::new() }
    }

    fn add_task(&mut self, task: &str) {
        self.tasks.push(task.to_string());
    }

    fn complete_task(&mut self, index: usize) {
        if index < self.tasks.len() {
            let done = self.tasks.remove(index);
            self.completed.push(done);
        }
    }

    fn list_tasks(&self) {
        for (i, task) in self.tasks.iter().enumerate() {
            println!("{i}. {task}");
        }
    }
}

fn main() {
    let mut agent = TodoAgent::new();
    agent.add_task("Learn about AI fundamentals");
    agent.add_task("Build my first agent");
    agent.list_tasks();
}
"#;

fn fallback_capstone(task_description: &str) -> CapstonePayload {
    let agent_code = CAPSTONE_TEMPLATE.replace("{task}", task_description);

    CapstonePayload {
        agent_code,
        agent_description: format!("A simple todo agent for: {task_description}"),
        next_steps: vec![
            "Review the generated code".to_string(),
            "Run it to see how it works".to_string(),
            "Customize it for your specific needs".to_string(),
            "Add more features as you learn".to_string(),
        ],
    }
}

fn recent_performance_value(record: &LearnerRecord) -> Value {
    serde_json::to_value(record.recent_attempts(RECENT_PERFORMANCE_WINDOW))
        .unwrap_or(Value::Null)
}

fn timestamp_metadata() -> Value {
    json!({ "timestamp": Utc::now().to_rfc3339() })
}
