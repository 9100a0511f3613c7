use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One scored answer submission. Records are append-only: sessions create
/// new ones and never edit old ones.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnswerRecord {
    pub id: String,
    pub question_id: String,
    pub answered_at: DateTime<Utc>,
    pub selected_answer_ids: Vec<String>,
    pub was_correct: bool,
}

impl AnswerRecord {
    pub fn new(question_id: &str, selected_answer_ids: Vec<String>, was_correct: bool) -> Self {
        AnswerRecord {
            id: Uuid::new_v4().to_string(),
            question_id: question_id.to_string(),
            answered_at: Utc::now(),
            selected_answer_ids,
            was_correct,
        }
    }
}
