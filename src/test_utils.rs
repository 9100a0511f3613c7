pub mod fixtures {
    use crate::models::domain::{Answer, AnswerRecord, Question, Quiz};

    fn answer(id: &str, order: i16, is_correct: bool) -> Answer {
        Answer {
            id: id.to_string(),
            order,
            text: format!("answer {}", id),
            image: None,
            is_correct,
        }
    }

    /// Single-select question with three answers; `a-1` is correct.
    pub fn single_question(id: &str) -> Question {
        Question {
            id: id.to_string(),
            order: 1,
            text: format!("question {}", id),
            image: None,
            explanation: None,
            multiple: false,
            answers: vec![
                answer("a-1", 1, true),
                answer("a-2", 2, false),
                answer("a-3", 3, false),
            ],
        }
    }

    /// Multi-select question with three answers; `a-1` and `a-3` are correct.
    pub fn multi_question(id: &str) -> Question {
        Question {
            id: id.to_string(),
            order: 1,
            text: format!("question {}", id),
            image: None,
            explanation: None,
            multiple: true,
            answers: vec![
                answer("a-1", 1, true),
                answer("a-2", 2, false),
                answer("a-3", 3, true),
            ],
        }
    }

    /// A scored record for `question_id` with a dummy selection.
    pub fn record_for(question_id: &str, was_correct: bool) -> AnswerRecord {
        AnswerRecord::new(question_id, vec!["a-1".to_string()], was_correct)
    }

    /// Two single-select questions, ids `q-1` and `q-2`.
    pub fn two_question_quiz() -> Quiz {
        Quiz::new(
            "Test quiz",
            vec![single_question("q-1"), single_question("q-2")],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_fixtures_single_question() {
        let question = single_question("q-1");
        assert!(!question.multiple);
        assert_eq!(question.correct_answer_ids(), vec!["a-1"]);
    }

    #[test]
    fn test_fixtures_multi_question() {
        let question = multi_question("q-1");
        assert!(question.multiple);
        assert_eq!(question.correct_answer_ids().len(), 2);
    }

    #[test]
    fn test_fixtures_two_question_quiz() {
        let quiz = two_question_quiz();
        assert_eq!(quiz.questions.len(), 2);
        assert_eq!(quiz.questions[0].id, "q-1");
    }
}
