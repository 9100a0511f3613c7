pub mod answer_record;
pub mod progress;
pub mod question;
pub mod quiz;
pub mod stored_session;

pub use answer_record::AnswerRecord;
pub use progress::ProgressSettings;
pub use question::{Answer, Question};
pub use quiz::{Quiz, QuizVisibility};
pub use stored_session::StoredSession;
