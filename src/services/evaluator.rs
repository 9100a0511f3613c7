use std::collections::HashSet;

use crate::models::domain::Question;

/// Judge a learner's selection against a question's correct-answer set.
///
/// Correct iff the selected ids equal the set of `is_correct` answer ids
/// exactly, order-independent. For single-select questions this reduces to
/// "selected exactly the one correct id"; for multi-select the sets must
/// match with no omissions and no extras.
pub fn check_answer_correctness(question: &Question, selected_answer_ids: &[String]) -> bool {
    let correct: HashSet<&str> = question
        .answers
        .iter()
        .filter(|a| a.is_correct)
        .map(|a| a.id.as_str())
        .collect();
    let selected: HashSet<&str> = selected_answer_ids.iter().map(|id| id.as_str()).collect();

    selected == correct
}
