use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::continuity::messages::ContinuityMessage;
use crate::errors::{SessionError, SessionResult};

/// A live point-to-point channel to one peer. Reliable and ordered within
/// the connection; dropping either end closes it.
#[derive(Debug)]
pub struct PeerConnection {
    pub peer_id: String,
    pub tx: mpsc::Sender<ContinuityMessage>,
    pub rx: mpsc::Receiver<ContinuityMessage>,
}

/// The host's end of a claimed rendezvous id. Dropping it releases the
/// claim so another participant can become host.
#[async_trait]
pub trait PeerListener: Send + std::fmt::Debug {
    /// Next inbound connection, or `None` once the rendezvous is gone.
    async fn accept(&mut self) -> Option<PeerConnection>;
}

/// Collaborator contract for the rendezvous/signaling infrastructure:
/// claim-or-fail registration of a well-known id plus connect-to-id. The
/// real NAT-traversal stack lives behind an implementation of this trait.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Claim `rendezvous_id`, becoming the participant others connect to.
    /// Fails with `SessionError::RendezvousTaken` when another session
    /// already holds it.
    async fn claim(&self, rendezvous_id: &str) -> SessionResult<Box<dyn PeerListener>>;

    /// Connect to whichever peer currently holds `rendezvous_id`.
    async fn connect(&self, rendezvous_id: &str) -> SessionResult<PeerConnection>;
}

const CONNECTION_BUFFER: usize = 64;

type Registry = Arc<Mutex<HashMap<String, mpsc::Sender<PeerConnection>>>>;

/// In-process transport: rendezvous ids live in a shared registry and
/// connections are paired mpsc channels. Stands in for the external
/// signaling/relay infrastructure; enough for every multi-task scenario the
/// channel layer needs.
#[derive(Clone, Default)]
pub struct InMemoryTransport {
    registry: Registry,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug)]
struct InMemoryListener {
    rendezvous_id: String,
    incoming: mpsc::Receiver<PeerConnection>,
    accept_tx: mpsc::Sender<PeerConnection>,
    registry: Registry,
}

#[async_trait]
impl PeerListener for InMemoryListener {
    async fn accept(&mut self) -> Option<PeerConnection> {
        self.incoming.recv().await
    }
}

impl Drop for InMemoryListener {
    fn drop(&mut self) {
        if let Ok(mut registry) = self.registry.lock() {
            // Only release our own claim; the id may have been re-claimed
            // by a successor in the meantime.
            if let Some(current) = registry.get(&self.rendezvous_id) {
                if current.same_channel(&self.accept_tx) {
                    registry.remove(&self.rendezvous_id);
                }
            }
        }
    }
}

#[async_trait]
impl PeerTransport for InMemoryTransport {
    async fn claim(&self, rendezvous_id: &str) -> SessionResult<Box<dyn PeerListener>> {
        let (accept_tx, accept_rx) = mpsc::channel(CONNECTION_BUFFER);
        {
            let mut registry = self
                .registry
                .lock()
                .map_err(|_| SessionError::Transport("registry lock poisoned".into()))?;

            if let Some(existing) = registry.get(rendezvous_id) {
                if !existing.is_closed() {
                    return Err(SessionError::RendezvousTaken(rendezvous_id.to_string()));
                }
            }
            registry.insert(rendezvous_id.to_string(), accept_tx.clone());
        }

        log::debug!("claimed rendezvous id {}", rendezvous_id);
        Ok(Box::new(InMemoryListener {
            rendezvous_id: rendezvous_id.to_string(),
            incoming: accept_rx,
            accept_tx,
            registry: Arc::clone(&self.registry),
        }))
    }

    async fn connect(&self, rendezvous_id: &str) -> SessionResult<PeerConnection> {
        let accept_tx = {
            let registry = self
                .registry
                .lock()
                .map_err(|_| SessionError::Transport("registry lock poisoned".into()))?;
            registry
                .get(rendezvous_id)
                .cloned()
                .ok_or_else(|| {
                    SessionError::Transport(format!("no host at rendezvous id {}", rendezvous_id))
                })?
        };

        let (to_host_tx, to_host_rx) = mpsc::channel(CONNECTION_BUFFER);
        let (to_client_tx, to_client_rx) = mpsc::channel(CONNECTION_BUFFER);
        let connection_id = Uuid::new_v4().to_string();

        let host_side = PeerConnection {
            peer_id: connection_id.clone(),
            tx: to_client_tx,
            rx: to_host_rx,
        };
        accept_tx.send(host_side).await.map_err(|_| {
            SessionError::PeerDisconnected(format!("host at {} is gone", rendezvous_id))
        })?;

        Ok(PeerConnection {
            peer_id: connection_id,
            tx: to_host_tx,
            rx: to_client_rx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_claim_of_same_id_fails() {
        let transport = InMemoryTransport::new();

        let _listener = transport.claim("user-1:quiz-1").await.unwrap();
        let err = transport.claim("user-1:quiz-1").await.unwrap_err();

        assert!(matches!(err, SessionError::RendezvousTaken(_)));
    }

    #[tokio::test]
    async fn dropping_the_listener_releases_the_claim() {
        let transport = InMemoryTransport::new();

        let listener = transport.claim("user-1:quiz-1").await.unwrap();
        drop(listener);

        assert!(transport.claim("user-1:quiz-1").await.is_ok());
    }

    #[tokio::test]
    async fn connect_without_a_host_fails() {
        let transport = InMemoryTransport::new();

        let err = transport.connect("user-1:quiz-1").await.unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
    }

    #[tokio::test]
    async fn connected_peers_exchange_messages_in_order() {
        let transport = InMemoryTransport::new();
        let mut listener = transport.claim("user-1:quiz-1").await.unwrap();

        let mut client = transport.connect("user-1:quiz-1").await.unwrap();
        let mut host_side = listener.accept().await.unwrap();

        client.tx.send(ContinuityMessage::Ping).await.unwrap();
        client
            .tx
            .send(ContinuityMessage::QuestionUpdate {
                question_id: "q-1".to_string(),
                selected_answer_ids: vec![],
            })
            .await
            .unwrap();

        assert_eq!(host_side.rx.recv().await, Some(ContinuityMessage::Ping));
        assert!(matches!(
            host_side.rx.recv().await,
            Some(ContinuityMessage::QuestionUpdate { .. })
        ));

        host_side.tx.send(ContinuityMessage::Pong).await.unwrap();
        assert_eq!(client.rx.recv().await, Some(ContinuityMessage::Pong));
    }

    #[tokio::test]
    async fn dropping_one_end_closes_the_other() {
        let transport = InMemoryTransport::new();
        let mut listener = transport.claim("user-1:quiz-1").await.unwrap();

        let client = transport.connect("user-1:quiz-1").await.unwrap();
        let mut host_side = listener.accept().await.unwrap();

        drop(client);
        assert_eq!(host_side.rx.recv().await, None);
    }
}
