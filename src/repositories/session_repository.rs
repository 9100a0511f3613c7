use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::errors::SessionResult;
use crate::models::domain::{AnswerRecord, StoredSession};

/// Where session progress lives. Authenticated users route to the remote
/// API, guests to on-device storage; both expose this exact surface, which
/// is what keeps the runtime persistence-agnostic.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Fetch a quiz together with any prior session progress.
    async fn get_quiz(&self, quiz_id: &str) -> SessionResult<StoredSession>;

    /// Append one scored answer and move the stored position to
    /// `next_question_id`.
    async fn record_answer(
        &self,
        quiz_id: &str,
        record: AnswerRecord,
        study_time_secs: u64,
        next_question_id: Option<String>,
    ) -> SessionResult<()>;

    /// Wipe all progress for the quiz, keeping the quiz itself.
    async fn delete_progress(&self, quiz_id: &str) -> SessionResult<()>;
}
