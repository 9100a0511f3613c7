use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::config::Config;
use crate::errors::{SessionError, SessionResult};
use crate::models::domain::{AnswerRecord, StoredSession};
use crate::repositories::SessionRepository;

/// Remote persistence for authenticated users, backed by the quiz API.
pub struct RemoteSessionRepository {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<SecretString>,
}

#[derive(Debug, Serialize)]
struct RecordAnswerRequest {
    record: AnswerRecord,
    study_time_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_question_id: Option<String>,
}

impl RemoteSessionRepository {
    pub fn new(config: &Config) -> SessionResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.persistence_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }
}

#[async_trait]
impl SessionRepository for RemoteSessionRepository {
    async fn get_quiz(&self, quiz_id: &str) -> SessionResult<StoredSession> {
        let url = format!("{}/quizzes/{}/session", self.base_url, quiz_id);
        let response = self.authorize(self.client.get(&url)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SessionError::NotFound(format!(
                "Quiz with id '{}' not found",
                quiz_id
            )));
        }

        let session = response.error_for_status()?.json::<StoredSession>().await?;
        log::debug!(
            "restored session for quiz {} with {} prior records",
            quiz_id,
            session.records.len()
        );
        Ok(session)
    }

    async fn record_answer(
        &self,
        quiz_id: &str,
        record: AnswerRecord,
        study_time_secs: u64,
        next_question_id: Option<String>,
    ) -> SessionResult<()> {
        let url = format!("{}/quizzes/{}/answers", self.base_url, quiz_id);
        let body = RecordAnswerRequest {
            record,
            study_time_secs,
            next_question_id,
        };

        self.authorize(self.client.post(&url))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn delete_progress(&self, quiz_id: &str) -> SessionResult<()> {
        let url = format!("{}/quizzes/{}/progress", self.base_url, quiz_id);

        self.authorize(self.client.delete(&url))
            .send()
            .await?
            .error_for_status()?;
        log::info!("deleted remote progress for quiz {}", quiz_id);
        Ok(())
    }
}
