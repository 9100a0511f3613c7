use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Question {
    pub id: String,
    pub order: i16,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// False means single-select: exactly one answer has `is_correct = true`.
    pub multiple: bool,
    pub answers: Vec<Answer>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Answer {
    pub id: String,
    pub order: i16,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub is_correct: bool,
}

impl Question {
    pub fn correct_answer_ids(&self) -> Vec<&str> {
        self.answers
            .iter()
            .filter(|a| a.is_correct)
            .map(|a| a.id.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_question() -> Question {
        Question {
            id: "q-1".to_string(),
            order: 1,
            text: "Pick the even numbers".to_string(),
            image: None,
            explanation: Some("2 and 4 are even".to_string()),
            multiple: true,
            answers: vec![
                Answer {
                    id: "a-1".to_string(),
                    order: 1,
                    text: "2".to_string(),
                    image: None,
                    is_correct: true,
                },
                Answer {
                    id: "a-2".to_string(),
                    order: 2,
                    text: "3".to_string(),
                    image: None,
                    is_correct: false,
                },
                Answer {
                    id: "a-3".to_string(),
                    order: 3,
                    text: "4".to_string(),
                    image: None,
                    is_correct: true,
                },
            ],
        }
    }

    #[test]
    fn correct_answer_ids_filters_by_flag() {
        let question = make_question();
        assert_eq!(question.correct_answer_ids(), vec!["a-1", "a-3"]);
    }

    #[test]
    fn question_round_trip_serialization_preserves_answers() {
        let question = make_question();

        let json = serde_json::to_string(&question).expect("question should serialize");
        let parsed: Question = serde_json::from_str(&json).expect("question should deserialize");

        assert_eq!(parsed, question);
        assert_eq!(parsed.answers.len(), 3);
        assert!(parsed.multiple);
    }
}
