use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::engine::types::DifficultyLevel;

pub const QUESTION_COUNT: usize = 5;

/// The "I'm not sure" option is always presented last, at this index.
pub const UNSURE_OPTION: usize = 4;
pub const UNSURE_LABEL: &str = "I'm not sure";

/// Per-question scoring weights, indexed by question position.
const QUESTION_WEIGHTS: [u32; QUESTION_COUNT] = [1, 1, 2, 2, 3];

const LEVEL_EXPERT_THRESHOLD: f64 = 0.8;
const LEVEL_ADVANCED_THRESHOLD: f64 = 0.6;
const LEVEL_INTERMEDIATE_THRESHOLD: f64 = 0.4;

/// Static calibration question. `correct_option` indexes into `options`
/// before the per-presentation shuffle.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticQuestion {
    pub question: &'static str,
    pub options: [&'static str; 4],
    pub correct_option: usize,
    pub difficulty_weight: u32,
}

const QUESTION_BANK: [DiagnosticQuestion; QUESTION_COUNT] = [
    DiagnosticQuestion {
        question: "What is a Large Language Model (LLM)?",
        options: [
            "A tool that predicts the next piece of text based on patterns it has learned",
            "A physical robot that can move and talk",
            "A spreadsheet full of formulas",
            "A type of computer hardware component",
        ],
        correct_option: 0,
        difficulty_weight: 1,
    },
    DiagnosticQuestion {
        question: "What does 'tokenization' mean in the context of LLMs?",
        options: [
            "Breaking text into smaller pieces (words or subwords) that the model can process",
            "Creating security tokens for API access",
            "Converting text to binary code",
            "Encrypting data for secure transmission",
        ],
        correct_option: 0,
        difficulty_weight: 1,
    },
    DiagnosticQuestion {
        question: "What is the Transformer architecture?",
        options: [
            "A neural network design that uses self-attention to process sequences",
            "A type of database for storing AI models",
            "A programming language for AI development",
            "A hardware device for processing graphics",
        ],
        correct_option: 0,
        difficulty_weight: 2,
    },
    DiagnosticQuestion {
        question: "What is 'self-attention' in Transformers?",
        options: [
            "A mechanism where each word can attend to all other words in the sequence",
            "A way to make models pay attention to themselves",
            "A debugging technique for neural networks",
            "A method for training models faster",
        ],
        correct_option: 0,
        difficulty_weight: 2,
    },
    DiagnosticQuestion {
        question: "What are the main components of an AI agent system?",
        options: [
            "Reasoning engine, tools/APIs, and memory/context",
            "Only a large language model",
            "Just code and data files",
            "Hardware components like GPUs and CPUs",
        ],
        correct_option: 0,
        difficulty_weight: 3,
    },
];

pub fn question_bank() -> &'static [DiagnosticQuestion; QUESTION_COUNT] {
    &QUESTION_BANK
}

/// One answer of a calibration batch. `correct_option` is the index the
/// correct answer held in that particular presentation (option order is
/// shuffled per presentation, so it must be echoed back by the caller).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticAnswer {
    pub question_index: usize,
    pub selected_option: usize,
    pub correct_option: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticOutcome {
    pub level: DifficultyLevel,
    pub all_correct: bool,
    pub all_unsure: bool,
}

/// A question ready to show: real options shuffled, "I'm not sure" pinned
/// last, `correct_option` pointing at the correct answer's shuffled slot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticPrompt {
    pub question_index: usize,
    pub total_questions: usize,
    pub question: String,
    pub options: Vec<String>,
    pub correct_option: usize,
    pub difficulty_weight: u32,
}

/// Shuffles the four real options of question `question_index` for one
/// presentation. Returns `None` past the end of the bank.
pub fn present(question_index: usize) -> Option<DiagnosticPrompt> {
    let entry = QUESTION_BANK.get(question_index)?;

    let mut order: Vec<usize> = (0..entry.options.len()).collect();
    order.shuffle(&mut rand::rng());

    let mut options: Vec<String> = order
        .iter()
        .map(|&original| entry.options[original].to_string())
        .collect();
    let correct_option = order
        .iter()
        .position(|&original| original == entry.correct_option)
        .unwrap_or(0);
    options.push(UNSURE_LABEL.to_string());

    Some(DiagnosticPrompt {
        question_index,
        total_questions: QUESTION_COUNT,
        question: entry.question.to_string(),
        options,
        correct_option,
        difficulty_weight: entry.difficulty_weight,
    })
}

/// Pure scoring of a calibration batch.
///
/// Unsure answers contribute to neither side of the weighted average; wrong
/// answers add their weight to the denominator only. An empty batch scores
/// as intermediate rather than dividing by zero.
pub fn score_batch(answers: &[DiagnosticAnswer]) -> DiagnosticOutcome {
    if answers.is_empty() {
        return DiagnosticOutcome {
            level: DifficultyLevel::Intermediate,
            all_correct: false,
            all_unsure: false,
        };
    }

    let total = answers.len();
    let mut numerator = 0u32;
    let mut denominator = 0u32;
    let mut unsure_count = 0usize;
    let mut correct_count = 0usize;

    for answer in answers {
        let weight = QUESTION_WEIGHTS
            .get(answer.question_index)
            .copied()
            .unwrap_or(1);

        if answer.selected_option == UNSURE_OPTION {
            unsure_count += 1;
        } else if answer.selected_option == answer.correct_option {
            correct_count += 1;
            numerator += weight;
            denominator += weight;
        } else {
            denominator += weight;
        }
    }

    if unsure_count == total {
        return DiagnosticOutcome {
            level: DifficultyLevel::Beginner,
            all_correct: false,
            all_unsure: true,
        };
    }
    if correct_count == total {
        return DiagnosticOutcome {
            level: DifficultyLevel::Expert,
            all_correct: true,
            all_unsure: false,
        };
    }
    if correct_count == 0 || unsure_count >= 3 {
        return DiagnosticOutcome {
            level: DifficultyLevel::Beginner,
            all_correct: false,
            all_unsure: false,
        };
    }

    // correct_count > 0 here, so the denominator is non-zero.
    let average = f64::from(numerator) / f64::from(denominator);
    let level = if average >= LEVEL_EXPERT_THRESHOLD {
        DifficultyLevel::Expert
    } else if average >= LEVEL_ADVANCED_THRESHOLD {
        DifficultyLevel::Advanced
    } else if average >= LEVEL_INTERMEDIATE_THRESHOLD {
        DifficultyLevel::Intermediate
    } else {
        DifficultyLevel::Beginner
    };

    DiagnosticOutcome {
        level,
        all_correct: false,
        all_unsure: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(question_index: usize, selected_option: usize, correct_option: usize) -> DiagnosticAnswer {
        DiagnosticAnswer {
            question_index,
            selected_option,
            correct_option,
        }
    }

    fn all_correct_batch() -> Vec<DiagnosticAnswer> {
        (0..QUESTION_COUNT).map(|i| answer(i, 0, 0)).collect()
    }

    #[test]
    fn test_all_correct_scores_expert() {
        let outcome = score_batch(&all_correct_batch());
        assert_eq!(outcome.level, DifficultyLevel::Expert);
        assert!(outcome.all_correct);
        assert!(!outcome.all_unsure);
    }

    #[test]
    fn test_all_unsure_scores_beginner() {
        let batch: Vec<_> = (0..QUESTION_COUNT)
            .map(|i| answer(i, UNSURE_OPTION, 0))
            .collect();
        let outcome = score_batch(&batch);
        assert_eq!(outcome.level, DifficultyLevel::Beginner);
        assert!(outcome.all_unsure);
        assert!(!outcome.all_correct);
    }

    #[test]
    fn test_zero_correct_scores_beginner() {
        let batch: Vec<_> = (0..QUESTION_COUNT).map(|i| answer(i, 1, 0)).collect();
        let outcome = score_batch(&batch);
        assert_eq!(outcome.level, DifficultyLevel::Beginner);
        assert!(!outcome.all_correct);
        assert!(!outcome.all_unsure);
    }

    #[test]
    fn test_unsure_majority_scores_beginner() {
        // Three unsure, two correct: the unsure-majority rule wins before
        // the weighted average is consulted.
        let batch = vec![
            answer(0, 0, 0),
            answer(1, 0, 0),
            answer(2, UNSURE_OPTION, 0),
            answer(3, UNSURE_OPTION, 0),
            answer(4, UNSURE_OPTION, 0),
        ];
        assert_eq!(score_batch(&batch).level, DifficultyLevel::Beginner);
    }

    #[test]
    fn test_weighted_average_maps_to_levels() {
        // Correct on weights 1,1,2,2 and wrong on 3: 6/9 ≈ 0.67 → advanced.
        let batch = vec![
            answer(0, 0, 0),
            answer(1, 0, 0),
            answer(2, 0, 0),
            answer(3, 0, 0),
            answer(4, 2, 0),
        ];
        assert_eq!(score_batch(&batch).level, DifficultyLevel::Advanced);

        // Correct on 1,1 and wrong on 2,2,3: 2/9 ≈ 0.22 → beginner.
        let batch = vec![
            answer(0, 0, 0),
            answer(1, 0, 0),
            answer(2, 1, 0),
            answer(3, 1, 0),
            answer(4, 1, 0),
        ];
        assert_eq!(score_batch(&batch).level, DifficultyLevel::Beginner);

        // Correct on weights 1 and 3, wrong on 1, unsure on 2,2: 4/5 = 0.8 → expert.
        let batch = vec![
            answer(0, 0, 0),
            answer(1, 1, 0),
            answer(2, UNSURE_OPTION, 0),
            answer(3, UNSURE_OPTION, 0),
            answer(4, 0, 0),
        ];
        assert_eq!(score_batch(&batch).level, DifficultyLevel::Expert);
    }

    #[test]
    fn test_out_of_range_question_index_defaults_to_weight_one() {
        // One correct at an unknown index, four wrong on weights 1,2,2,3:
        // 1/9 ≈ 0.11 → beginner (no panic on the lookup).
        let batch = vec![
            answer(99, 0, 0),
            answer(1, 1, 0),
            answer(2, 1, 0),
            answer(3, 1, 0),
            answer(4, 1, 0),
        ];
        assert_eq!(score_batch(&batch).level, DifficultyLevel::Beginner);
    }

    #[test]
    fn test_empty_batch_defaults_to_intermediate() {
        let outcome = score_batch(&[]);
        assert_eq!(outcome.level, DifficultyLevel::Intermediate);
        assert!(!outcome.all_correct);
        assert!(!outcome.all_unsure);
    }

    #[test]
    fn test_presentation_pins_unsure_last_and_tracks_correct_index() {
        for index in 0..QUESTION_COUNT {
            let prompt = present(index).unwrap();
            assert_eq!(prompt.options.len(), 5);
            assert_eq!(prompt.options[UNSURE_OPTION], UNSURE_LABEL);
            assert!(prompt.correct_option < 4);

            let bank = question_bank();
            let expected = bank[index].options[bank[index].correct_option];
            assert_eq!(prompt.options[prompt.correct_option], expected);
        }
        assert!(present(QUESTION_COUNT).is_none());
    }
}
