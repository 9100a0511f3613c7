use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::errors::{SessionError, SessionResult};
use crate::models::domain::{AnswerRecord, Quiz, StoredSession};
use crate::repositories::SessionRepository;

/// Guest-mode persistence: one JSON file per quiz under a local directory,
/// no remote account involved. Exposes the same surface as the remote
/// adapter so the runtime cannot tell the two apart.
pub struct GuestSessionRepository {
    store_dir: PathBuf,
}

impl GuestSessionRepository {
    pub fn new(store_dir: impl AsRef<Path>) -> Self {
        Self {
            store_dir: store_dir.as_ref().to_path_buf(),
        }
    }

    fn session_path(&self, quiz_id: &str) -> PathBuf {
        self.store_dir.join(format!("{}.json", quiz_id))
    }

    /// Store a quiz locally so a guest can take it. Existing progress for
    /// the same quiz id is preserved.
    pub async fn put_quiz(&self, quiz: Quiz) -> SessionResult<()> {
        let session = match self.load(&quiz.id).await {
            Ok(mut existing) => {
                existing.quiz = quiz;
                existing
            }
            Err(_) => StoredSession::empty(quiz),
        };
        self.save(&session).await
    }

    async fn load(&self, quiz_id: &str) -> SessionResult<StoredSession> {
        let path = self.session_path(quiz_id);
        let bytes = fs::read(&path).await.map_err(|_| {
            SessionError::NotFound(format!("Quiz with id '{}' not found", quiz_id))
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save(&self, session: &StoredSession) -> SessionResult<()> {
        fs::create_dir_all(&self.store_dir).await?;
        let bytes = serde_json::to_vec_pretty(session)?;
        fs::write(self.session_path(&session.quiz.id), bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for GuestSessionRepository {
    async fn get_quiz(&self, quiz_id: &str) -> SessionResult<StoredSession> {
        self.load(quiz_id).await
    }

    async fn record_answer(
        &self,
        quiz_id: &str,
        record: AnswerRecord,
        study_time_secs: u64,
        next_question_id: Option<String>,
    ) -> SessionResult<()> {
        let mut session = self.load(quiz_id).await?;
        session.records.push(record);
        session.current_question_id = next_question_id;
        session.study_time_secs = study_time_secs;
        self.save(&session).await
    }

    async fn delete_progress(&self, quiz_id: &str) -> SessionResult<()> {
        match self.load(quiz_id).await {
            Ok(mut session) => {
                session.records.clear();
                session.current_question_id = None;
                session.study_time_secs = 0;
                self.save(&session).await?;
                log::info!("cleared guest progress for quiz {}", quiz_id);
                Ok(())
            }
            // Nothing stored means nothing to delete.
            Err(SessionError::NotFound(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }
}
