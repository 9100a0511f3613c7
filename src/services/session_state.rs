use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::models::domain::{AnswerRecord, ProgressSettings, Question};
use crate::services::selection;

/// Where a session currently stands. Derived from the state fields; the
/// reducer never stores it directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    NoQuestion,
    Unchecked,
    Checked,
    Finished,
}

/// The single source of truth for one quiz-taking session. Mutated only by
/// `SessionState::apply`, which performs no I/O: persistence writes and peer
/// broadcasts happen caller-side after a transition.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionState {
    pub questions: Vec<Question>,
    pub settings: ProgressSettings,
    pub records: Vec<AnswerRecord>,
    /// The question on screen, answers already in display order.
    pub current_question: Option<Question>,
    /// In-progress selection, not yet submitted.
    pub selected_answer_ids: Vec<String>,
    /// Whether the current question has been scored.
    pub checked: bool,
    /// The policy's pre-computed follow-up, consumed on advance.
    pub next_question: Option<Question>,
    pub finished: bool,
    /// Stable seed for deterministic reshuffles, derived from the session
    /// id and restored study time.
    shuffle_seed: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionAction {
    InitSession {
        questions: Vec<Question>,
        settings: ProgressSettings,
        records: Vec<AnswerRecord>,
        restored_question_id: Option<String>,
        shuffle_seed: u64,
    },
    SetSelectedAnswers {
        answer_ids: Vec<String>,
    },
    RecordAnswer {
        record: AnswerRecord,
        next_question: Option<Question>,
    },
    AdvanceQuestion,
    ResetProgress,
    /// A peer's `question_update` applied locally. Last writer wins.
    ApplyPeerQuestion {
        question_id: String,
        selected_answer_ids: Vec<String>,
    },
}

impl SessionState {
    pub fn empty() -> Self {
        SessionState {
            questions: Vec::new(),
            settings: ProgressSettings::default(),
            records: Vec::new(),
            current_question: None,
            selected_answer_ids: Vec::new(),
            checked: false,
            next_question: None,
            finished: false,
            shuffle_seed: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.finished {
            SessionPhase::Finished
        } else if self.current_question.is_none() {
            SessionPhase::NoQuestion
        } else if self.checked {
            SessionPhase::Checked
        } else {
            SessionPhase::Unchecked
        }
    }

    /// Apply one transition. Invalid transitions (scoring an already-checked
    /// question, advancing before checking) are silent no-ops: UI
    /// double-fires are expected and must never crash a session.
    pub fn apply(mut self, action: SessionAction) -> SessionState {
        match action {
            SessionAction::InitSession {
                questions,
                settings,
                records,
                restored_question_id,
                shuffle_seed,
            } => {
                let mut rng = StdRng::seed_from_u64(shuffle_seed);

                let restored = restored_question_id
                    .as_deref()
                    .and_then(|id| questions.iter().find(|q| q.id == id))
                    .map(|q| selection::shuffle_answers(q, &mut rng));

                // An unknown restored id falls back to a fresh pick.
                let current = restored.or_else(|| {
                    selection::pick_next_question(&questions, &records, &settings, None, &mut rng)
                });

                SessionState {
                    finished: current.is_none(),
                    current_question: current,
                    questions,
                    settings,
                    records,
                    selected_answer_ids: Vec::new(),
                    checked: false,
                    next_question: None,
                    shuffle_seed,
                }
            }

            SessionAction::SetSelectedAnswers { answer_ids } => {
                if self.checked || self.finished || self.current_question.is_none() {
                    return self;
                }
                self.selected_answer_ids = answer_ids;
                self
            }

            SessionAction::RecordAnswer {
                record,
                next_question,
            } => {
                // At-most-once scoring per question presentation.
                if self.checked || self.finished || self.current_question.is_none() {
                    return self;
                }
                self.records.push(record);
                self.checked = true;
                self.next_question = next_question;
                self
            }

            SessionAction::AdvanceQuestion => {
                if !self.checked || self.finished {
                    return self;
                }
                self.current_question = self.next_question.take();
                self.selected_answer_ids.clear();
                self.checked = false;
                if self.current_question.is_none() {
                    self.finished = true;
                }
                self
            }

            SessionAction::ResetProgress => {
                self.records.clear();
                let mut rng = StdRng::seed_from_u64(self.shuffle_seed);
                self.current_question = selection::pick_next_question(
                    &self.questions,
                    &self.records,
                    &self.settings,
                    None,
                    &mut rng,
                );
                self.selected_answer_ids.clear();
                self.checked = false;
                self.next_question = None;
                self.finished = self.current_question.is_none();
                self
            }

            SessionAction::ApplyPeerQuestion {
                question_id,
                selected_answer_ids,
            } => {
                let Some(question) = self.questions.iter().find(|q| q.id == question_id).cloned()
                else {
                    return self;
                };
                let mut rng =
                    StdRng::seed_from_u64(self.shuffle_seed ^ self.records.len() as u64);
                self.current_question = Some(selection::shuffle_answers(&question, &mut rng));
                self.selected_answer_ids = selected_answer_ids;
                self.checked = false;
                self.finished = false;
                self.next_question = None;
                self
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{record_for, single_question};

    fn settings() -> ProgressSettings {
        ProgressSettings {
            initial_reoccurrences: 1,
            wrong_answer_reoccurrences: 1,
        }
    }

    fn init_state() -> SessionState {
        SessionState::empty().apply(SessionAction::InitSession {
            questions: vec![single_question("q-1"), single_question("q-2")],
            settings: settings(),
            records: Vec::new(),
            restored_question_id: None,
            shuffle_seed: 11,
        })
    }

    #[test]
    fn init_picks_a_first_question() {
        let state = init_state();

        assert_eq!(state.phase(), SessionPhase::Unchecked);
        assert!(state.current_question.is_some());
        assert!(state.records.is_empty());
    }

    #[test]
    fn init_with_restored_question_uses_it() {
        let state = SessionState::empty().apply(SessionAction::InitSession {
            questions: vec![single_question("q-1"), single_question("q-2")],
            settings: settings(),
            records: vec![record_for("q-1", false)],
            restored_question_id: Some("q-2".to_string()),
            shuffle_seed: 11,
        });

        assert_eq!(state.current_question.as_ref().unwrap().id, "q-2");
    }

    #[test]
    fn init_with_unknown_restored_question_falls_back_to_policy() {
        let state = SessionState::empty().apply(SessionAction::InitSession {
            questions: vec![single_question("q-1")],
            settings: settings(),
            records: Vec::new(),
            restored_question_id: Some("q-gone".to_string()),
            shuffle_seed: 11,
        });

        assert_eq!(state.current_question.as_ref().unwrap().id, "q-1");
    }

    #[test]
    fn init_restored_question_order_is_reload_stable() {
        let init = || {
            SessionState::empty().apply(SessionAction::InitSession {
                questions: vec![single_question("q-1")],
                settings: settings(),
                records: Vec::new(),
                restored_question_id: Some("q-1".to_string()),
                shuffle_seed: 99,
            })
        };

        let first: Vec<_> = init()
            .current_question
            .unwrap()
            .answers
            .into_iter()
            .map(|a| a.id)
            .collect();
        let second: Vec<_> = init()
            .current_question
            .unwrap()
            .answers
            .into_iter()
            .map(|a| a.id)
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn init_of_already_complete_quiz_finishes_immediately() {
        let state = SessionState::empty().apply(SessionAction::InitSession {
            questions: vec![single_question("q-1")],
            settings: settings(),
            records: vec![record_for("q-1", true)],
            restored_question_id: None,
            shuffle_seed: 11,
        });

        assert_eq!(state.phase(), SessionPhase::Finished);
    }

    #[test]
    fn selection_only_changes_while_unchecked() {
        let state = init_state().apply(SessionAction::SetSelectedAnswers {
            answer_ids: vec!["a-1".to_string()],
        });
        assert_eq!(state.selected_answer_ids, vec!["a-1".to_string()]);

        let current_id = state.current_question.as_ref().unwrap().id.clone();
        let state = state.apply(SessionAction::RecordAnswer {
            record: record_for(&current_id, true),
            next_question: None,
        });

        let state = state.apply(SessionAction::SetSelectedAnswers {
            answer_ids: vec!["a-2".to_string()],
        });
        assert_eq!(state.selected_answer_ids, vec!["a-1".to_string()]);
    }

    #[test]
    fn record_answer_scores_at_most_once() {
        let state = init_state();
        let current_id = state.current_question.as_ref().unwrap().id.clone();

        let state = state.apply(SessionAction::RecordAnswer {
            record: record_for(&current_id, true),
            next_question: Some(single_question("q-2")),
        });
        assert_eq!(state.records.len(), 1);
        assert_eq!(state.phase(), SessionPhase::Checked);

        // Double-fire: second record for the same presentation is dropped.
        let state = state.apply(SessionAction::RecordAnswer {
            record: record_for(&current_id, true),
            next_question: Some(single_question("q-2")),
        });
        assert_eq!(state.records.len(), 1);
    }

    #[test]
    fn advance_requires_checked() {
        let state = init_state();
        let before = state.clone();

        let state = state.apply(SessionAction::AdvanceQuestion);
        assert_eq!(state, before);
    }

    #[test]
    fn advance_moves_to_precomputed_next_and_clears_selection() {
        let state = init_state();
        let current_id = state.current_question.as_ref().unwrap().id.clone();

        let state = state
            .apply(SessionAction::SetSelectedAnswers {
                answer_ids: vec!["a-1".to_string()],
            })
            .apply(SessionAction::RecordAnswer {
                record: record_for(&current_id, true),
                next_question: Some(single_question("q-2")),
            })
            .apply(SessionAction::AdvanceQuestion);

        assert_eq!(state.current_question.as_ref().unwrap().id, "q-2");
        assert!(state.selected_answer_ids.is_empty());
        assert_eq!(state.phase(), SessionPhase::Unchecked);
    }

    #[test]
    fn advance_without_next_finishes_the_quiz() {
        let state = SessionState::empty().apply(SessionAction::InitSession {
            questions: vec![single_question("q-1")],
            settings: settings(),
            records: Vec::new(),
            restored_question_id: None,
            shuffle_seed: 11,
        });

        let state = state
            .apply(SessionAction::RecordAnswer {
                record: record_for("q-1", true),
                next_question: None,
            })
            .apply(SessionAction::AdvanceQuestion);

        assert_eq!(state.phase(), SessionPhase::Finished);
    }

    #[test]
    fn reset_clears_history_and_reopens_the_quiz() {
        let state = SessionState::empty().apply(SessionAction::InitSession {
            questions: vec![single_question("q-1")],
            settings: settings(),
            records: vec![record_for("q-1", true)],
            restored_question_id: None,
            shuffle_seed: 11,
        });
        assert_eq!(state.phase(), SessionPhase::Finished);

        let state = state.apply(SessionAction::ResetProgress);

        assert!(state.records.is_empty());
        assert!(!state.finished);
        assert_eq!(state.phase(), SessionPhase::Unchecked);
    }

    #[test]
    fn peer_question_update_overwrites_current_position() {
        let state = init_state().apply(SessionAction::ApplyPeerQuestion {
            question_id: "q-2".to_string(),
            selected_answer_ids: vec!["a-3".to_string()],
        });

        assert_eq!(state.current_question.as_ref().unwrap().id, "q-2");
        assert_eq!(state.selected_answer_ids, vec!["a-3".to_string()]);
        assert_eq!(state.phase(), SessionPhase::Unchecked);
    }

    #[test]
    fn peer_question_update_with_unknown_id_is_ignored() {
        let state = init_state();
        let before = state.clone();

        let state = state.apply(SessionAction::ApplyPeerQuestion {
            question_id: "q-gone".to_string(),
            selected_answer_ids: vec![],
        });

        assert_eq!(state, before);
    }
}
