use serde::Serialize;

use crate::engine::types::{LearnerRecord, ModuleId};

/// The fixed lesson sequence. `diagnostic` precedes it and
/// `capstone_completed` follows it; neither is reachable by sequence
/// advancement.
pub const MODULE_SEQUENCE: [ModuleId; 4] = [
    ModuleId::Fundamentals,
    ModuleId::TransformersLlms,
    ModuleId::Agents,
    ModuleId::BuildTodoAgent,
];

/// Modules present in the sequence but not yet open for entry.
pub const GATED_MODULES: [ModuleId; 2] = [ModuleId::Agents, ModuleId::BuildTodoAgent];

pub const COMING_SOON_MESSAGE: &str =
    "AI Agents and Capstone modules are coming soon! Stay tuned for updates.";

pub fn sequence_index(module: ModuleId) -> Option<usize> {
    MODULE_SEQUENCE.iter().position(|&m| m == module)
}

pub fn is_gated(module: ModuleId) -> bool {
    GATED_MODULES.contains(&module)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceOutcome {
    pub advanced: bool,
    pub coming_soon: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AdvanceOutcome {
    fn advanced() -> Self {
        Self {
            advanced: true,
            coming_soon: false,
            message: None,
        }
    }

    fn refused() -> Self {
        Self {
            advanced: false,
            coming_soon: false,
            message: None,
        }
    }

    fn coming_soon() -> Self {
        Self {
            advanced: false,
            coming_soon: true,
            message: Some(COMING_SOON_MESSAGE.to_string()),
        }
    }
}

/// Moves the record into `module`, crediting the departed module exactly
/// once. Used by sequence advancement and by the diagnostic/capstone entry
/// transitions.
pub fn enter_module(record: &mut LearnerRecord, module: ModuleId) {
    record.mark_completed(record.current_module);
    record.current_module = module;
    record.current_page = 0;
}

/// Advances within the current module if it has pages left, otherwise
/// falls through to module advancement. A page advance never changes the
/// module.
pub fn advance_page(record: &mut LearnerRecord, page_count: u32) -> AdvanceOutcome {
    if record.current_page + 1 < page_count {
        record.current_page += 1;
        return AdvanceOutcome::advanced();
    }
    advance_module(record)
}

/// Moves to the next sequence module. The gate is checked before any
/// mutation, so a refused advance leaves the record untouched; the same
/// holds for the end of the sequence and for modules outside it.
pub fn advance_module(record: &mut LearnerRecord) -> AdvanceOutcome {
    let Some(index) = sequence_index(record.current_module) else {
        return AdvanceOutcome::refused();
    };
    let Some(&next) = MODULE_SEQUENCE.get(index + 1) else {
        return AdvanceOutcome::refused();
    };
    if is_gated(next) {
        return AdvanceOutcome::coming_soon();
    }

    enter_module(record, next);
    AdvanceOutcome::advanced()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_advance_keeps_module() {
        let mut record = LearnerRecord::new("learner-1");
        record.current_module = ModuleId::Fundamentals;

        let outcome = advance_page(&mut record, 3);
        assert!(outcome.advanced);
        assert_eq!(record.current_module, ModuleId::Fundamentals);
        assert_eq!(record.current_page, 1);
    }

    #[test]
    fn test_last_page_falls_through_to_module_advance() {
        let mut record = LearnerRecord::new("learner-1");
        record.current_module = ModuleId::Fundamentals;
        record.current_page = 2;

        let outcome = advance_page(&mut record, 3);
        assert!(outcome.advanced);
        assert_eq!(record.current_module, ModuleId::TransformersLlms);
        assert_eq!(record.current_page, 0);
        assert_eq!(record.completed_modules, vec![ModuleId::Fundamentals]);
    }

    #[test]
    fn test_gated_module_refuses_without_mutation() {
        let mut record = LearnerRecord::new("learner-1");
        record.current_module = ModuleId::TransformersLlms;
        record.current_page = 0;

        let outcome = advance_page(&mut record, 1);
        assert!(!outcome.advanced);
        assert!(outcome.coming_soon);
        assert_eq!(outcome.message.as_deref(), Some(COMING_SOON_MESSAGE));
        assert_eq!(record.current_module, ModuleId::TransformersLlms);
        assert_eq!(record.current_page, 0);
        assert!(record.completed_modules.is_empty());

        // Refusals are idempotent.
        let again = advance_page(&mut record, 1);
        assert_eq!(again, outcome);
    }

    #[test]
    fn test_advance_past_last_module_is_refused() {
        let mut record = LearnerRecord::new("learner-1");
        record.current_module = ModuleId::BuildTodoAgent;

        let outcome = advance_module(&mut record);
        assert!(!outcome.advanced);
        assert!(!outcome.coming_soon);
        assert_eq!(record.current_module, ModuleId::BuildTodoAgent);
    }

    #[test]
    fn test_advance_from_non_sequence_module_is_refused() {
        for module in [
            ModuleId::Diagnostic,
            ModuleId::Clarification,
            ModuleId::CapstoneCompleted,
        ] {
            let mut record = LearnerRecord::new("learner-1");
            record.current_module = module;
            let outcome = advance_module(&mut record);
            assert!(!outcome.advanced);
            assert!(!outcome.coming_soon);
            assert_eq!(record.current_module, module);
        }
    }

    #[test]
    fn test_enter_module_credits_departed_module_once() {
        let mut record = LearnerRecord::new("learner-1");
        enter_module(&mut record, ModuleId::Fundamentals);
        assert_eq!(record.completed_modules, vec![ModuleId::Diagnostic]);

        record.current_page = 4;
        enter_module(&mut record, ModuleId::TransformersLlms);
        assert_eq!(
            record.completed_modules,
            vec![ModuleId::Diagnostic, ModuleId::Fundamentals]
        );
        assert_eq!(record.current_page, 0);
    }
}
