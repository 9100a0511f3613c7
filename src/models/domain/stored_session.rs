use serde::{Deserialize, Serialize};

use crate::models::domain::{AnswerRecord, Quiz};

/// The persistence adapter's restore payload: a quiz together with any prior
/// progress. `current_question_id` may reference a question that no longer
/// exists in the quiz; the runtime treats that as "pick a fresh question".
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoredSession {
    pub quiz: Quiz,
    pub records: Vec<AnswerRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question_id: Option<String>,
    pub study_time_secs: u64,
}

impl StoredSession {
    /// A fresh session with no prior progress.
    pub fn empty(quiz: Quiz) -> Self {
        StoredSession {
            quiz,
            records: Vec::new(),
            current_question_id: None,
            study_time_secs: 0,
        }
    }
}
