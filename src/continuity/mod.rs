pub mod channel;
pub mod messages;
pub mod transport;

pub use channel::{establish, rendezvous_id, ContinuityHandle, ContinuityRole, ContinuitySettings};
pub use messages::{ContinuityMessage, SyncSnapshot};
pub use transport::{InMemoryTransport, PeerConnection, PeerListener, PeerTransport};
