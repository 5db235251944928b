use crate::engine::types::{LearnerRecord, LearningStyle};

/// Number of trailing attempts the adaptation rule inspects.
pub const WINDOW: usize = 2;

/// Hesitation above this many seconds counts as struggling; below it as
/// confident. Exactly at the threshold counts as neither.
pub const HESITATION_THRESHOLD_SECONDS: f64 = 10.0;

/// Adjusts `difficulty_level` from the trailing attempt window.
///
/// The increase check must stay ahead of the decrease check: the two
/// predicates are mutually exclusive at WINDOW == 2, but the order is part
/// of the documented behavior if the window ever grows.
pub fn adjust_difficulty(record: &mut LearnerRecord) {
    if record.quiz_performance.len() < WINDOW {
        return;
    }

    let recent = record.recent_attempts(WINDOW);

    let all_confident = recent
        .iter()
        .all(|a| a.correct && a.hesitation_seconds < HESITATION_THRESHOLD_SECONDS);
    if all_confident {
        record.difficulty_level = record.difficulty_level.step_up();
        return;
    }

    let incorrect = recent.iter().filter(|a| !a.correct).count();
    let hesitant = recent
        .iter()
        .filter(|a| a.hesitation_seconds > HESITATION_THRESHOLD_SECONDS)
        .count();
    if incorrect >= 2 || hesitant >= 2 {
        record.difficulty_level = record.difficulty_level.step_down();
    }
}

/// Immediate reaction to a detected confusion signal, independent of the
/// windowed rule: ease off one level and switch to examples-first content.
pub fn apply_confusion(record: &mut LearnerRecord) {
    record.difficulty_level = record.difficulty_level.step_down();
    record.preferred_learning_style = Some(LearningStyle::Examples);
}

pub fn should_switch_to_examples(record: &LearnerRecord) -> bool {
    if record.quiz_performance.len() < WINDOW {
        return false;
    }
    record
        .recent_attempts(WINDOW)
        .iter()
        .filter(|a| !a.correct)
        .count()
        >= 2
}

pub fn should_simplify(record: &LearnerRecord) -> bool {
    if record.hesitation_history.len() < WINDOW {
        return false;
    }
    let start = record.hesitation_history.len() - WINDOW;
    record.hesitation_history[start..]
        .iter()
        .all(|&h| h > HESITATION_THRESHOLD_SECONDS)
}

/// Content style resolution: an explicit preference wins, then the struggle
/// heuristics, then plain text.
pub fn recommended_style(record: &LearnerRecord) -> LearningStyle {
    if let Some(style) = record.preferred_learning_style {
        return style;
    }
    if should_switch_to_examples(record) {
        LearningStyle::Examples
    } else if should_simplify(record) {
        LearningStyle::Visual
    } else {
        LearningStyle::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::DifficultyLevel;

    fn record_with_attempts(attempts: &[(bool, f64)]) -> LearnerRecord {
        let mut record = LearnerRecord::new("learner-1");
        for (i, &(correct, hesitation)) in attempts.iter().enumerate() {
            record.push_attempt(format!("q{i}"), correct, hesitation);
        }
        record
    }

    #[test]
    fn test_two_quick_correct_attempts_increase_difficulty() {
        let mut record = record_with_attempts(&[(true, 3.0), (true, 4.0)]);
        adjust_difficulty(&mut record);
        assert_eq!(record.difficulty_level, DifficultyLevel::Advanced);
    }

    #[test]
    fn test_two_incorrect_attempts_decrease_difficulty() {
        let mut record = record_with_attempts(&[(false, 3.0), (false, 4.0)]);
        record.difficulty_level = DifficultyLevel::Advanced;
        adjust_difficulty(&mut record);
        assert_eq!(record.difficulty_level, DifficultyLevel::Intermediate);
    }

    #[test]
    fn test_two_hesitant_attempts_decrease_difficulty() {
        let mut record = record_with_attempts(&[(true, 12.0), (true, 15.0)]);
        adjust_difficulty(&mut record);
        assert_eq!(record.difficulty_level, DifficultyLevel::Beginner);
    }

    #[test]
    fn test_mixed_window_leaves_difficulty_unchanged() {
        let mut record = record_with_attempts(&[(true, 3.0), (false, 4.0)]);
        adjust_difficulty(&mut record);
        assert_eq!(record.difficulty_level, DifficultyLevel::Intermediate);
    }

    #[test]
    fn test_threshold_hesitation_counts_as_neither() {
        // Exactly 10s is not "low" for the increase rule and not "high" for
        // the decrease rule.
        let mut record = record_with_attempts(&[(true, 10.0), (true, 10.0)]);
        adjust_difficulty(&mut record);
        assert_eq!(record.difficulty_level, DifficultyLevel::Intermediate);
    }

    #[test]
    fn test_single_attempt_is_ignored() {
        let mut record = record_with_attempts(&[(true, 1.0)]);
        adjust_difficulty(&mut record);
        assert_eq!(record.difficulty_level, DifficultyLevel::Intermediate);
    }

    #[test]
    fn test_difficulty_saturates_at_bounds() {
        let mut record = record_with_attempts(&[(true, 1.0), (true, 1.0)]);
        record.difficulty_level = DifficultyLevel::Expert;
        adjust_difficulty(&mut record);
        assert_eq!(record.difficulty_level, DifficultyLevel::Expert);

        let mut record = record_with_attempts(&[(false, 1.0), (false, 1.0)]);
        record.difficulty_level = DifficultyLevel::Beginner;
        adjust_difficulty(&mut record);
        assert_eq!(record.difficulty_level, DifficultyLevel::Beginner);
    }

    #[test]
    fn test_confusion_eases_off_and_switches_style() {
        let mut record = LearnerRecord::new("learner-1");
        record.difficulty_level = DifficultyLevel::Advanced;
        apply_confusion(&mut record);
        assert_eq!(record.difficulty_level, DifficultyLevel::Intermediate);
        assert_eq!(record.preferred_learning_style, Some(LearningStyle::Examples));

        record.difficulty_level = DifficultyLevel::Beginner;
        apply_confusion(&mut record);
        assert_eq!(record.difficulty_level, DifficultyLevel::Beginner);
    }

    #[test]
    fn test_recommended_style_resolution() {
        let record = record_with_attempts(&[(true, 2.0), (true, 3.0)]);
        assert_eq!(recommended_style(&record), LearningStyle::Text);

        let record = record_with_attempts(&[(false, 2.0), (false, 3.0)]);
        assert_eq!(recommended_style(&record), LearningStyle::Examples);

        let record = record_with_attempts(&[(true, 12.0), (true, 14.0)]);
        assert_eq!(recommended_style(&record), LearningStyle::Visual);

        let mut record = record_with_attempts(&[(false, 12.0), (false, 14.0)]);
        record.preferred_learning_style = Some(LearningStyle::Text);
        assert_eq!(recommended_style(&record), LearningStyle::Text);
    }
}
