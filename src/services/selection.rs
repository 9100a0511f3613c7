use std::collections::HashSet;

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::models::domain::{AnswerRecord, ProgressSettings, Question};

/// Aggregated correct/incorrect totals over a session's answer history.
/// Display-only; never used for control flow.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AnswerCounts {
    pub correct: usize,
    pub incorrect: usize,
}

/// How many more correct answers a question needs before it is mastered.
///
/// Derived from history, never stored: starts at `initial_reoccurrences`,
/// each correct answer subtracts one, each wrong answer adds
/// `wrong_answer_reoccurrences` back. Floored at zero.
pub fn reoccurrence_count(
    question_id: &str,
    history: &[AnswerRecord],
    settings: &ProgressSettings,
) -> u32 {
    let mut count = settings.initial_reoccurrences as i64;
    for record in history.iter().filter(|r| r.question_id == question_id) {
        if record.was_correct {
            count -= 1;
        } else {
            count += settings.wrong_answer_reoccurrences as i64;
        }
    }
    count.max(0) as u32
}

/// True iff every question in the quiz is mastered.
pub fn is_quiz_complete(
    questions: &[Question],
    history: &[AnswerRecord],
    settings: &ProgressSettings,
) -> bool {
    questions
        .iter()
        .all(|q| reoccurrence_count(&q.id, history, settings) == 0)
}

pub fn mastered_count(
    questions: &[Question],
    history: &[AnswerRecord],
    settings: &ProgressSettings,
) -> usize {
    questions
        .iter()
        .filter(|q| reoccurrence_count(&q.id, history, settings) == 0)
        .count()
}

pub fn answer_counts(history: &[AnswerRecord]) -> AnswerCounts {
    let correct = history.iter().filter(|r| r.was_correct).count();
    AnswerCounts {
        correct,
        incorrect: history.len() - correct,
    }
}

/// Pick the question to show next, or `None` when the quiz is complete.
///
/// Questions still needing repetitions are drawn with probability
/// proportional to their outstanding reoccurrence count, so a question that
/// needs more repetitions is never less likely than one needing fewer. The
/// just-answered question (`exclude_question_id`) is skipped whenever any
/// other question is still eligible, to avoid immediate repeats.
///
/// The chosen question comes back with its answers shuffled by `rng`.
pub fn pick_next_question<R: Rng>(
    questions: &[Question],
    history: &[AnswerRecord],
    settings: &ProgressSettings,
    exclude_question_id: Option<&str>,
    rng: &mut R,
) -> Option<Question> {
    let mut eligible: Vec<(&Question, u32)> = questions
        .iter()
        .map(|q| (q, reoccurrence_count(&q.id, history, settings)))
        .filter(|(_, count)| *count > 0)
        .collect();

    if let Some(exclude) = exclude_question_id {
        if eligible.iter().any(|(q, _)| q.id != exclude) {
            eligible.retain(|(q, _)| q.id != exclude);
        }
    }

    if eligible.is_empty() {
        return None;
    }

    let weights: Vec<u32> = eligible.iter().map(|(_, count)| *count).collect();
    // Weights are all > 0, so WeightedIndex cannot fail here.
    let dist = WeightedIndex::new(&weights).ok()?;
    let chosen = eligible[dist.sample(rng)].0;

    Some(shuffle_answers(chosen, rng))
}

/// Clone `question` with its answers in a freshly randomized order.
pub fn shuffle_answers<R: Rng>(question: &Question, rng: &mut R) -> Question {
    let mut shuffled = question.clone();
    shuffled.answers.shuffle(rng);
    shuffled
}

/// Stable per-restore shuffle seed: the same session id and restored study
/// time always yield the same seed, so a page reload reproduces the answer
/// order it showed before the reload.
pub fn shuffle_seed(session_id: &str, study_time_secs: u64) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(session_id.as_bytes());
    hasher.update(study_time_secs.to_le_bytes());
    let digest = hasher.finalize();

    u64::from_le_bytes(digest[..8].try_into().unwrap_or_default())
}

/// Ids of every question that still needs repetitions.
pub fn eligible_question_ids(
    questions: &[Question],
    history: &[AnswerRecord],
    settings: &ProgressSettings,
) -> HashSet<String> {
    questions
        .iter()
        .filter(|q| reoccurrence_count(&q.id, history, settings) > 0)
        .map(|q| q.id.clone())
        .collect()
}
