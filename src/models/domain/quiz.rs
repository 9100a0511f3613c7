use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::question::Question;

/// A quiz as handed to the runtime by the persistence adapter. Sessions
/// reference it and never mutate it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub visibility: QuizVisibility,
    pub questions: Vec<Question>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
pub enum QuizVisibility {
    Private,
    Public,
    Shared,
}

impl Quiz {
    pub fn new(title: &str, questions: Vec<Question>) -> Self {
        Quiz {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: None,
            visibility: QuizVisibility::Private,
            questions,
        }
    }

    pub fn question_by_id(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}
