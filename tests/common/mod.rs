use quiz_session_runtime::models::domain::{Answer, ProgressSettings, Question, Quiz};
use quiz_session_runtime::repositories::GuestSessionRepository;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn answer(id: &str, order: i16, is_correct: bool) -> Answer {
    Answer {
        id: id.to_string(),
        order,
        text: format!("answer {}", id),
        image: None,
        is_correct,
    }
}

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

pub fn two_question_quiz() -> Quiz {
    Quiz::new(
        "Integration quiz",
        vec![single_question("q-1"), single_question("q-2")],
    )
}

pub fn default_settings() -> ProgressSettings {
    ProgressSettings {
        initial_reoccurrences: 1,
        wrong_answer_reoccurrences: 1,
    }
}

pub fn temp_guest_store() -> GuestSessionRepository {
    let dir = std::env::temp_dir()
        .join("quiz-session-runtime-integration")
        .join(uuid::Uuid::new_v4().to_string());
    GuestSessionRepository::new(dir)
}
