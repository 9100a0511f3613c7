pub mod guest_session_repository;
pub mod remote_session_repository;
pub mod session_repository;

pub use guest_session_repository::GuestSessionRepository;
pub use remote_session_repository::RemoteSessionRepository;
pub use session_repository::SessionRepository;

#[cfg(test)]
pub use session_repository::MockSessionRepository;
