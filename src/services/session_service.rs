use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;

use crate::config::Config;
use crate::continuity::{
    establish, rendezvous_id, ContinuityHandle, ContinuityMessage, ContinuitySettings,
    PeerTransport, SyncSnapshot,
};
use crate::errors::SessionResult;
use crate::models::domain::{AnswerRecord, ProgressSettings, Question, Quiz, StoredSession};
use crate::repositories::SessionRepository;
use crate::services::selection::{self, AnswerCounts};
use crate::services::session_state::{SessionAction, SessionPhase, SessionState};
use crate::services::study_timer::StudyTimer;
use crate::services::evaluator;

/// Orchestration shell around the pure session state machine. Owns the
/// state, runs the selection policy, and performs the caller-side effects
/// the reducer deliberately does not: persistence writes and continuity
/// broadcasts. All collaborators arrive through the constructor.
pub struct QuizSessionService {
    quiz_id: String,
    repository: Arc<dyn SessionRepository>,
    state: SessionState,
    rng: StdRng,
    timer: StudyTimer,
    started_at: DateTime<Utc>,
    restore_failed: bool,
    continuity: Option<ContinuityHandle>,
    snapshot_tx: watch::Sender<SyncSnapshot>,
    persistence_timeout: Duration,
}

impl QuizSessionService {
    /// Load the quiz (with any prior progress) and initialize the session.
    ///
    /// A restore failure never blocks the user: the session falls back to
    /// an empty one and `restore_failed` is set so the UI can show a
    /// recoverable notice.
    pub async fn start(
        repository: Arc<dyn SessionRepository>,
        quiz_id: &str,
        session_id: &str,
        settings: ProgressSettings,
        config: &Config,
    ) -> Self {
        let (stored, restore_failed) = match repository.get_quiz(quiz_id).await {
            Ok(stored) => (stored, false),
            Err(err) => {
                log::warn!(
                    "restoring session for quiz {} failed ({}), starting from scratch",
                    quiz_id,
                    err
                );
                let mut quiz = Quiz::new("", Vec::new());
                quiz.id = quiz_id.to_string();
                (StoredSession::empty(quiz), true)
            }
        };

        let seed = selection::shuffle_seed(session_id, stored.study_time_secs);
        let state = SessionState::empty().apply(SessionAction::InitSession {
            questions: stored.quiz.questions,
            settings,
            records: stored.records,
            restored_question_id: stored.current_question_id,
            shuffle_seed: seed,
        });

        let started_at = Utc::now();
        let timer = StudyTimer::start(stored.study_time_secs);
        let (snapshot_tx, _) = watch::channel(SyncSnapshot {
            started_at,
            records: state.records.clone(),
            study_time_secs: stored.study_time_secs,
        });

        Self {
            quiz_id: quiz_id.to_string(),
            repository,
            state,
            rng: StdRng::seed_from_u64(seed),
            timer,
            started_at,
            restore_failed,
            continuity: None,
            snapshot_tx,
            persistence_timeout: Duration::from_secs(config.persistence_timeout_secs),
        }
    }

    /// Join the peer mirroring channel for this user and quiz. Best effort:
    /// when setup fails the session simply runs without continuity.
    pub async fn enable_continuity(
        &mut self,
        transport: Arc<dyn PeerTransport>,
        user_id: &str,
        settings: ContinuitySettings,
    ) {
        let rendezvous = rendezvous_id(user_id, &self.quiz_id);
        self.continuity = establish(
            transport,
            &rendezvous,
            self.snapshot_tx.subscribe(),
            settings,
        )
        .await;
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.state.current_question.as_ref()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    pub fn is_finished(&self) -> bool {
        self.state.finished
    }

    pub fn restore_failed(&self) -> bool {
        self.restore_failed
    }

    pub fn records(&self) -> &[AnswerRecord] {
        &self.state.records
    }

    pub fn selected_answer_ids(&self) -> &[String] {
        &self.state.selected_answer_ids
    }

    pub fn study_time_secs(&self) -> u64 {
        self.timer.elapsed_secs()
    }

    pub fn subscribe_study_time(&self) -> watch::Receiver<u64> {
        self.timer.subscribe()
    }

    pub fn mastered_count(&self) -> usize {
        selection::mastered_count(&self.state.questions, &self.state.records, &self.state.settings)
    }

    pub fn answer_counts(&self) -> AnswerCounts {
        selection::answer_counts(&self.state.records)
    }

    /// Replace the in-progress selection and mirror it to the peers.
    pub async fn set_selected_answers(&mut self, answer_ids: Vec<String>) {
        self.state = std::mem::replace(&mut self.state, SessionState::empty())
            .apply(SessionAction::SetSelectedAnswers { answer_ids });
        self.broadcast_position().await;
    }

    /// Score the current question: evaluate the selection, append the
    /// record, pre-compute the next question, then persist and broadcast.
    /// Returns whether the answer was correct, or `None` when there is
    /// nothing to score (no current question, or already checked).
    pub async fn check_answer(&mut self) -> Option<bool> {
        if self.state.phase() != SessionPhase::Unchecked {
            return None;
        }
        let current = self.state.current_question.as_ref()?;
        let current_id = current.id.clone();

        let was_correct =
            evaluator::check_answer_correctness(current, &self.state.selected_answer_ids);
        let record = AnswerRecord::new(
            &current_id,
            self.state.selected_answer_ids.clone(),
            was_correct,
        );

        let mut history = self.state.records.clone();
        history.push(record.clone());
        let next_question = selection::pick_next_question(
            &self.state.questions,
            &history,
            &self.state.settings,
            Some(&current_id),
            &mut self.rng,
        );
        let next_question_id = next_question.as_ref().map(|q| q.id.clone());

        self.state = std::mem::replace(&mut self.state, SessionState::empty()).apply(
            SessionAction::RecordAnswer {
                record: record.clone(),
                next_question,
            },
        );

        self.persist_record(record.clone(), next_question_id.clone());
        self.publish_snapshot();
        self.broadcast(ContinuityMessage::AnswerChecked {
            record,
            next_question_id,
        })
        .await;

        Some(was_correct)
    }

    /// Move on to the pre-computed next question, or finish the quiz.
    pub async fn advance(&mut self) {
        self.state =
            std::mem::replace(&mut self.state, SessionState::empty()).apply(SessionAction::AdvanceQuestion);
        if self.state.finished {
            self.timer.pause();
        }
        self.broadcast_position().await;
    }

    /// Wipe all progress, remotely and locally.
    pub async fn reset_progress(&mut self) -> SessionResult<()> {
        self.repository.delete_progress(&self.quiz_id).await?;
        self.state =
            std::mem::replace(&mut self.state, SessionState::empty()).apply(SessionAction::ResetProgress);
        self.timer.sync_to(0);
        self.timer.resume();
        self.publish_snapshot();
        self.broadcast_position().await;
        Ok(())
    }

    /// Apply one message from the mirroring channel to the local session.
    pub fn apply_remote(&mut self, message: ContinuityMessage) {
        match message {
            ContinuityMessage::InitialSync {
                records,
                study_time_secs,
                ..
            } => {
                // Keep our current position, adopt the host's history.
                let current_id = self.state.current_question.as_ref().map(|q| q.id.clone());
                let questions = self.state.questions.clone();
                let settings = self.state.settings;
                let seed = selection::shuffle_seed(&self.quiz_id, study_time_secs);
                self.state = std::mem::replace(&mut self.state, SessionState::empty()).apply(
                    SessionAction::InitSession {
                        questions,
                        settings,
                        records,
                        restored_question_id: current_id,
                        shuffle_seed: seed,
                    },
                );
                self.timer.sync_to(study_time_secs);
                self.publish_snapshot();
            }
            ContinuityMessage::QuestionUpdate {
                question_id,
                selected_answer_ids,
            } => {
                self.state = std::mem::replace(&mut self.state, SessionState::empty()).apply(
                    SessionAction::ApplyPeerQuestion {
                        question_id,
                        selected_answer_ids,
                    },
                );
            }
            ContinuityMessage::AnswerChecked {
                record,
                next_question_id,
            } => {
                // Idempotent: a record we already hold is not appended twice.
                if self.state.records.iter().any(|r| r.id == record.id) {
                    return;
                }
                let mut records = self.state.records.clone();
                records.push(record);
                let questions = self.state.questions.clone();
                let settings = self.state.settings;
                let seed = selection::shuffle_seed(&self.quiz_id, self.timer.elapsed_secs());
                self.state = std::mem::replace(&mut self.state, SessionState::empty()).apply(
                    SessionAction::InitSession {
                        questions,
                        settings,
                        records,
                        restored_question_id: next_question_id,
                        shuffle_seed: seed,
                    },
                );
                self.publish_snapshot();
            }
            // Liveness traffic stays inside the channel layer.
            ContinuityMessage::Ping | ContinuityMessage::Pong => {}
        }
    }

    /// Drain and apply everything the peers have sent since the last call.
    pub fn pump_remote(&mut self) {
        let mut pending = Vec::new();
        if let Some(handle) = self.continuity.as_mut() {
            while let Some(message) = handle.try_recv() {
                pending.push(message);
            }
        }
        for message in pending {
            self.apply_remote(message);
        }
    }

    /// Fire-and-forget write with a bounded timeout; failures are logged
    /// and never surface to the session.
    fn persist_record(&self, record: AnswerRecord, next_question_id: Option<String>) {
        let repository = Arc::clone(&self.repository);
        let quiz_id = self.quiz_id.clone();
        let study_time_secs = self.timer.elapsed_secs();
        let timeout = self.persistence_timeout;

        tokio::spawn(async move {
            let write =
                repository.record_answer(&quiz_id, record, study_time_secs, next_question_id);
            match tokio::time::timeout(timeout, write).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    log::warn!("persisting answer for quiz {} failed: {}", quiz_id, err)
                }
                Err(_) => log::warn!("persisting answer for quiz {} timed out", quiz_id),
            }
        });
    }

    fn publish_snapshot(&self) {
        self.snapshot_tx.send_replace(SyncSnapshot {
            started_at: self.started_at,
            records: self.state.records.clone(),
            study_time_secs: self.timer.elapsed_secs(),
        });
    }

    async fn broadcast(&self, message: ContinuityMessage) {
        if let Some(handle) = &self.continuity {
            handle.send(message).await;
        }
    }

    async fn broadcast_position(&self) {
        let Some(current) = self.state.current_question.as_ref() else {
            return;
        };
        self.broadcast(ContinuityMessage::QuestionUpdate {
            question_id: current.id.clone(),
            selected_answer_ids: self.state.selected_answer_ids.clone(),
        })
        .await;
    }
}
