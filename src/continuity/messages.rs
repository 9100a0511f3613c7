use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::AnswerRecord;

/// Everything exchanged between same-user sessions of one quiz. Delivered
/// over point-to-point reliable ordered connections; no global ordering
/// across participants beyond that, so concurrent `QuestionUpdate`s resolve
/// as last writer wins.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ContinuityMessage {
    /// Host to a newly connected client: full current state.
    InitialSync {
        started_at: DateTime<Utc>,
        correct_count: usize,
        incorrect_count: usize,
        records: Vec<AnswerRecord>,
        study_time_secs: u64,
    },
    /// "This is the question and in-progress selection I am looking at."
    QuestionUpdate {
        question_id: String,
        selected_answer_ids: Vec<String>,
    },
    /// "I just scored the current question; this one comes next."
    AnswerChecked {
        record: AnswerRecord,
        next_question_id: Option<String>,
    },
    Ping,
    Pong,
}

/// The host's view of local session state, published so a fresh
/// `InitialSync` can be built for every late-joining client.
#[derive(Clone, Debug, PartialEq)]
pub struct SyncSnapshot {
    pub started_at: DateTime<Utc>,
    pub records: Vec<AnswerRecord>,
    pub study_time_secs: u64,
}

impl SyncSnapshot {
    pub fn to_initial_sync(&self) -> ContinuityMessage {
        let correct_count = self.records.iter().filter(|r| r.was_correct).count();
        ContinuityMessage::InitialSync {
            started_at: self.started_at,
            correct_count,
            incorrect_count: self.records.len() - correct_count,
            records: self.records.clone(),
            study_time_secs: self.study_time_secs,
        }
    }
}
