use std::path::{Path, PathBuf};

use crate::engine::types::ModuleId;

/// Upper bound on the contiguous page scan.
const MAX_PAGES: u32 = 20;

/// Built-in fundamentals pages, used when no content directory is
/// configured or a page file is missing.
const FUNDAMENTALS_PAGES: [&str; 3] = [
    "# AI Fundamentals\n\nArtificial intelligence systems learn statistical patterns from data \
     instead of following hand-written rules. A language model is one such system: it reads \
     enormous amounts of text and learns which pieces of text tend to follow which.\n",
    "# How Language Models Work\n\nA Large Language Model predicts the next token, a small piece \
     of text, given everything that came before. Tokenization breaks your words into these \
     pieces; the model then scores every possible next token and samples from the best ones.\n",
    "# What Models Can and Cannot Do\n\nBecause a model generates from learned patterns, it can \
     draft, summarize and explain, but it can also produce confident mistakes. Checking outputs \
     against a trusted source stays your job.\n",
];

const TRANSFORMERS_PAGE: &str = "# Transformers and LLMs\n\nThe Transformer architecture \
     processes a whole sequence at once using self-attention: every token can weigh every other \
     token when building its representation. Stacking these layers is what makes modern LLMs \
     possible.\n";

const AGENTS_PAGE: &str = "# AI Agents\n\nAn agent couples a reasoning engine with tools and \
     memory: it decides what to do, calls a tool, observes the result and repeats until the task \
     is done.\n";

const BUILD_TODO_AGENT_PAGE: &str = "# Build a To-Do Agent\n\nTime to apply everything: design a \
     small agent that manages tasks. It needs a way to store tasks, a set of actions it can take \
     and a loop that picks the next action.\n";

/// Lesson content metadata and text. Backed by an optional directory of
/// markdown files (`fundamentals_page{N}.md`, `{module}.md`) with built-in
/// fallbacks, so the engine works without any files on disk.
#[derive(Debug, Clone)]
pub struct ContentLibrary {
    root: Option<PathBuf>,
}

impl ContentLibrary {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    pub fn from_env() -> Self {
        Self::new(
            std::env::var("CONTENT_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        )
    }

    /// Page count for a module. Fundamentals is the only paginated module:
    /// its count is the number of contiguous `fundamentals_page{N}.md`
    /// files starting at 1, stopping at the first gap.
    pub fn page_count(&self, module: ModuleId) -> u32 {
        if module != ModuleId::Fundamentals {
            return 1;
        }

        if let Some(root) = &self.root {
            let mut count = 0;
            for page in 1..=MAX_PAGES {
                if root.join(format!("fundamentals_page{page}.md")).exists() {
                    count += 1;
                } else {
                    break;
                }
            }
            if count > 0 {
                return count;
            }
        }

        FUNDAMENTALS_PAGES.len() as u32
    }

    /// Lesson text for a module page (0-based). Falls back from the page
    /// file to the module file to the built-in pages.
    pub fn lesson_content(&self, module: ModuleId, page: u32) -> String {
        if let Some(root) = &self.root {
            if module == ModuleId::Fundamentals {
                if let Some(text) = read_file(&root.join(format!("fundamentals_page{}.md", page + 1))) {
                    return text;
                }
            }
            if let Some(text) = read_file(&root.join(format!("{}.md", module.as_str()))) {
                return text;
            }
        }

        builtin_content(module, page)
    }
}

fn read_file(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok()
}

fn builtin_content(module: ModuleId, page: u32) -> String {
    match module {
        ModuleId::Fundamentals => FUNDAMENTALS_PAGES
            .get(page as usize)
            .copied()
            .unwrap_or(FUNDAMENTALS_PAGES[FUNDAMENTALS_PAGES.len() - 1])
            .to_string(),
        ModuleId::TransformersLlms => TRANSFORMERS_PAGE.to_string(),
        ModuleId::Agents => AGENTS_PAGE.to_string(),
        ModuleId::BuildTodoAgent => BUILD_TODO_AGENT_PAGE.to_string(),
        _ => format!("No lesson content for module '{}'.", module.as_str()),
    }
}

/// A check-question template from the per-module fallback bank. MCQs carry
/// options and a correct index; open-ended questions carry neither.
#[derive(Debug, Clone, Copy)]
pub struct CheckQuestionSeed {
    pub question: &'static str,
    pub options: Option<[&'static str; 4]>,
    pub correct_option: Option<usize>,
}

const FUNDAMENTALS_QUESTIONS: [CheckQuestionSeed; 2] = [
    CheckQuestionSeed {
        question: "What is the primary difference between AI and a simple database lookup?",
        options: Some([
            "AI generates responses based on learned patterns, while databases retrieve stored information",
            "AI is faster than databases",
            "AI uses more storage space",
            "Databases are more accurate than AI",
        ]),
        correct_option: Some(0),
    },
    CheckQuestionSeed {
        question: "How do Large Language Models (LLMs) actually work? Describe the process in simple terms.",
        options: None,
        correct_option: None,
    },
];

const TRANSFORMERS_QUESTIONS: [CheckQuestionSeed; 2] = [
    CheckQuestionSeed {
        question: "What is the key innovation of the Transformer architecture?",
        options: Some([
            "Self-attention mechanism that processes all words simultaneously",
            "Using more layers than previous models",
            "Training on larger datasets",
            "Using GPUs for computation",
        ]),
        correct_option: Some(0),
    },
    CheckQuestionSeed {
        question: "Explain how self-attention allows a Transformer model to understand context better than previous architectures.",
        options: None,
        correct_option: None,
    },
];

const AGENTS_QUESTIONS: [CheckQuestionSeed; 2] = [
    CheckQuestionSeed {
        question: "What are the main components of an AI agent?",
        options: Some([
            "Reasoning, tools, and memory",
            "Only neural networks",
            "Just code and data",
            "Only APIs",
        ]),
        correct_option: Some(0),
    },
    CheckQuestionSeed {
        question: "Describe how an AI agent uses reasoning, tools, and memory together to complete a task. Give an example.",
        options: None,
        correct_option: None,
    },
];

const BUILD_TODO_AGENT_QUESTIONS: [CheckQuestionSeed; 2] = [
    CheckQuestionSeed {
        question: "What type of tasks would a todo agent typically handle?",
        options: Some([
            "Managing tasks, reminders, and schedules",
            "Playing video games",
            "Cooking recipes",
            "Driving cars",
        ]),
        correct_option: Some(0),
    },
    CheckQuestionSeed {
        question: "Explain what tools and capabilities a todo agent would need to effectively help someone manage their tasks and schedule.",
        options: None,
        correct_option: None,
    },
];

pub fn fallback_check_questions(module: ModuleId) -> &'static [CheckQuestionSeed] {
    match module {
        ModuleId::Fundamentals => &FUNDAMENTALS_QUESTIONS,
        ModuleId::TransformersLlms => &TRANSFORMERS_QUESTIONS,
        ModuleId::Agents => &AGENTS_QUESTIONS,
        ModuleId::BuildTodoAgent => &BUILD_TODO_AGENT_QUESTIONS,
        _ => &[],
    }
}

/// Stable id for the check question at `global_index` of a module; quiz
/// dedup keys off this format.
pub fn check_question_id(module: ModuleId, global_index: usize) -> String {
    format!("{}_q{}", module.as_str(), global_index)
}

/// Which question (by global index) belongs on a fundamentals page. Page 0
/// is the intro and the trailing pages are summaries; the early pages each
/// carry one question, clamped to the available bank.
pub fn fundamentals_question_for_page(page: u32, question_count: usize) -> Option<usize> {
    if question_count == 0 {
        return None;
    }
    let preferred = match page {
        1 => 0,
        2 => 1,
        3 => 2,
        _ => return None,
    };
    Some(preferred.min(question_count - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_builtin_page_counts() {
        let library = ContentLibrary::new(None);
        assert_eq!(library.page_count(ModuleId::Fundamentals), 3);
        assert_eq!(library.page_count(ModuleId::TransformersLlms), 1);
        assert_eq!(library.page_count(ModuleId::Agents), 1);
    }

    #[test]
    fn test_page_scan_stops_at_first_gap() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("fundamentals_page1.md"), "one").unwrap();
        fs::write(dir.path().join("fundamentals_page2.md"), "two").unwrap();
        // Page 4 exists but page 3 does not: the gap ends the count.
        fs::write(dir.path().join("fundamentals_page4.md"), "four").unwrap();

        let library = ContentLibrary::new(Some(dir.path().to_path_buf()));
        assert_eq!(library.page_count(ModuleId::Fundamentals), 2);
        assert_eq!(library.lesson_content(ModuleId::Fundamentals, 1), "two");
    }

    #[test]
    fn test_lesson_content_falls_back_to_builtin() {
        let library = ContentLibrary::new(None);
        let text = library.lesson_content(ModuleId::TransformersLlms, 0);
        assert!(text.contains("Transformer"));
    }

    #[test]
    fn test_module_file_fallback_when_page_missing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("fundamentals.md"), "whole module").unwrap();

        let library = ContentLibrary::new(Some(dir.path().to_path_buf()));
        assert_eq!(
            library.lesson_content(ModuleId::Fundamentals, 5),
            "whole module"
        );
    }

    #[test]
    fn test_question_page_mapping_clamps_to_bank() {
        assert_eq!(fundamentals_question_for_page(0, 2), None);
        assert_eq!(fundamentals_question_for_page(1, 2), Some(0));
        assert_eq!(fundamentals_question_for_page(2, 2), Some(1));
        assert_eq!(fundamentals_question_for_page(3, 2), Some(1));
        assert_eq!(fundamentals_question_for_page(4, 2), None);
        assert_eq!(fundamentals_question_for_page(1, 0), None);
    }

    #[test]
    fn test_check_question_id_format() {
        assert_eq!(check_question_id(ModuleId::Fundamentals, 0), "fundamentals_q0");
        assert_eq!(
            check_question_id(ModuleId::TransformersLlms, 1),
            "transformers_llms_q1"
        );
    }
}
