pub mod evaluator;
pub mod selection;
pub mod session_service;
pub mod session_state;
pub mod study_timer;

pub use session_service::QuizSessionService;
pub use session_state::{SessionAction, SessionPhase, SessionState};
pub use study_timer::StudyTimer;
