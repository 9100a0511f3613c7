use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::config::Config;
use crate::continuity::messages::{ContinuityMessage, SyncSnapshot};
use crate::continuity::transport::{PeerConnection, PeerListener, PeerTransport};
use crate::errors::SessionError;

const CHANNEL_BUFFER: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContinuityRole {
    Host,
    Client,
}

#[derive(Clone, Debug)]
pub struct ContinuitySettings {
    pub ping_interval: Duration,
    pub pong_timeout: Duration,
}

impl ContinuitySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ping_interval: Duration::from_secs(config.ping_interval_secs),
            pong_timeout: Duration::from_secs(config.pong_timeout_secs),
        }
    }
}

/// The shared rendezvous identifier for one user's sessions of one quiz.
pub fn rendezvous_id(user_id: &str, quiz_id: &str) -> String {
    format!("{}:{}", user_id, quiz_id)
}

/// The session's handle onto a live mirroring channel. `send` broadcasts a
/// local update to the peers; `recv` yields updates the peers sent us.
/// Dropping the handle tears the channel down.
pub struct ContinuityHandle {
    initial_role: ContinuityRole,
    outgoing_tx: mpsc::Sender<ContinuityMessage>,
    inbound_rx: mpsc::Receiver<ContinuityMessage>,
    task: JoinHandle<()>,
}

impl ContinuityHandle {
    pub fn initial_role(&self) -> ContinuityRole {
        self.initial_role
    }

    /// Best effort: a full or closed channel drops the message.
    pub async fn send(&self, message: ContinuityMessage) {
        if self.outgoing_tx.send(message).await.is_err() {
            log::debug!("continuity channel closed, dropping outgoing message");
        }
    }

    pub async fn recv(&mut self) -> Option<ContinuityMessage> {
        self.inbound_rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ContinuityMessage> {
        self.inbound_rx.try_recv().ok()
    }
}

impl Drop for ContinuityHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Join the mirroring channel for `rendezvous_id`: claim the id to become
/// host, or fall back to connecting as a client when another session holds
/// it. Any setup failure returns `None` — the session then simply runs
/// without continuity, which is never fatal.
pub async fn establish(
    transport: Arc<dyn PeerTransport>,
    rendezvous_id: &str,
    snapshot_rx: watch::Receiver<SyncSnapshot>,
    settings: ContinuitySettings,
) -> Option<ContinuityHandle> {
    let endpoint = claim_or_connect(transport.as_ref(), rendezvous_id).await?;
    let initial_role = match endpoint {
        Endpoint::Host(_) => ContinuityRole::Host,
        Endpoint::Client(_) => ContinuityRole::Client,
    };
    log::debug!(
        "continuity established for {} as {:?}",
        rendezvous_id,
        initial_role
    );

    let (outgoing_tx, outgoing_rx) = mpsc::channel(CHANNEL_BUFFER);
    let (inbound_tx, inbound_rx) = mpsc::channel(CHANNEL_BUFFER);
    let task = tokio::spawn(run(
        transport,
        rendezvous_id.to_string(),
        endpoint,
        snapshot_rx,
        outgoing_rx,
        inbound_tx,
        settings,
    ));

    Some(ContinuityHandle {
        initial_role,
        outgoing_tx,
        inbound_rx,
        task,
    })
}

enum Endpoint {
    Host(Box<dyn PeerListener>),
    Client(PeerConnection),
}

enum LoopExit {
    AppClosed,
    ChannelDied,
}

async fn claim_or_connect(transport: &dyn PeerTransport, rendezvous_id: &str) -> Option<Endpoint> {
    match transport.claim(rendezvous_id).await {
        Ok(listener) => Some(Endpoint::Host(listener)),
        Err(SessionError::RendezvousTaken(_)) => {
            match transport.connect(rendezvous_id).await {
                Ok(connection) => Some(Endpoint::Client(connection)),
                Err(err) => {
                    log::debug!("continuity disabled, connect failed: {}", err);
                    None
                }
            }
        }
        Err(err) => {
            log::debug!("continuity disabled, claim failed: {}", err);
            None
        }
    }
}

/// Runs until the app drops its handle. A dead channel triggers the
/// claim-or-connect procedure again: a former client reconnects to the same
/// rendezvous id, a former host re-elects.
async fn run(
    transport: Arc<dyn PeerTransport>,
    rendezvous_id: String,
    mut endpoint: Endpoint,
    snapshot_rx: watch::Receiver<SyncSnapshot>,
    mut outgoing_rx: mpsc::Receiver<ContinuityMessage>,
    inbound_tx: mpsc::Sender<ContinuityMessage>,
    settings: ContinuitySettings,
) {
    loop {
        let exit = match endpoint {
            Endpoint::Host(listener) => {
                host_loop(listener, &snapshot_rx, &mut outgoing_rx, &inbound_tx, &settings).await
            }
            Endpoint::Client(connection) => {
                client_loop(connection, &mut outgoing_rx, &inbound_tx, &settings).await
            }
        };

        match exit {
            LoopExit::AppClosed => return,
            LoopExit::ChannelDied => {
                log::debug!("continuity channel for {} died, rejoining", rendezvous_id);
                match claim_or_connect(transport.as_ref(), &rendezvous_id).await {
                    Some(next) => endpoint = next,
                    None => return,
                }
            }
        }
    }
}

struct ClientSlot {
    tx: mpsc::Sender<ContinuityMessage>,
    last_pong: Instant,
}

/// Star topology with the host as relay: a state update arriving from one
/// client is applied locally and forwarded to every other client, never
/// back to its sender. Clients never relay.
async fn host_loop(
    mut listener: Box<dyn PeerListener>,
    snapshot_rx: &watch::Receiver<SyncSnapshot>,
    outgoing_rx: &mut mpsc::Receiver<ContinuityMessage>,
    inbound_tx: &mpsc::Sender<ContinuityMessage>,
    settings: &ContinuitySettings,
) -> LoopExit {
    let mut clients: HashMap<String, ClientSlot> = HashMap::new();
    let (events_tx, mut events_rx) =
        mpsc::channel::<(String, Option<ContinuityMessage>)>(CHANNEL_BUFFER);
    let mut ping = interval(settings.ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let Some(connection) = accepted else {
                    return LoopExit::ChannelDied;
                };
                let PeerConnection { peer_id, tx, mut rx } = connection;

                let sync = snapshot_rx.borrow().to_initial_sync();
                if tx.send(sync).await.is_err() {
                    continue;
                }

                let reader_events = events_tx.clone();
                let reader_id = peer_id.clone();
                tokio::spawn(async move {
                    while let Some(message) = rx.recv().await {
                        if reader_events.send((reader_id.clone(), Some(message))).await.is_err() {
                            return;
                        }
                    }
                    let _ = reader_events.send((reader_id, None)).await;
                });

                log::debug!("continuity host: client {} joined", peer_id);
                clients.insert(peer_id, ClientSlot { tx, last_pong: Instant::now() });
            }

            Some((peer_id, event)) = events_rx.recv() => {
                match event {
                    None => {
                        log::debug!("continuity host: client {} left", peer_id);
                        clients.remove(&peer_id);
                    }
                    Some(ContinuityMessage::Ping) => {
                        if let Some(slot) = clients.get(&peer_id) {
                            let _ = slot.tx.send(ContinuityMessage::Pong).await;
                        }
                    }
                    Some(ContinuityMessage::Pong) => {
                        if let Some(slot) = clients.get_mut(&peer_id) {
                            slot.last_pong = Instant::now();
                        }
                    }
                    Some(message) => {
                        if inbound_tx.send(message.clone()).await.is_err() {
                            return LoopExit::AppClosed;
                        }
                        for (other_id, slot) in &clients {
                            if *other_id != peer_id {
                                let _ = slot.tx.send(message.clone()).await;
                            }
                        }
                    }
                }
            }

            outgoing = outgoing_rx.recv() => {
                let Some(message) = outgoing else {
                    return LoopExit::AppClosed;
                };
                for slot in clients.values() {
                    let _ = slot.tx.send(message.clone()).await;
                }
            }

            _ = ping.tick() => {
                clients.retain(|peer_id, slot| {
                    let alive = slot.last_pong.elapsed() <= settings.pong_timeout;
                    if !alive {
                        log::debug!("continuity host: client {} timed out", peer_id);
                    }
                    alive
                });
                for slot in clients.values() {
                    let _ = slot.tx.send(ContinuityMessage::Ping).await;
                }
            }
        }
    }
}

async fn client_loop(
    mut connection: PeerConnection,
    outgoing_rx: &mut mpsc::Receiver<ContinuityMessage>,
    inbound_tx: &mpsc::Sender<ContinuityMessage>,
    settings: &ContinuitySettings,
) -> LoopExit {
    let mut ping = interval(settings.ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_pong = Instant::now();

    loop {
        tokio::select! {
            inbound = connection.rx.recv() => {
                match inbound {
                    None => return LoopExit::ChannelDied,
                    Some(ContinuityMessage::Ping) => {
                        if connection.tx.send(ContinuityMessage::Pong).await.is_err() {
                            return LoopExit::ChannelDied;
                        }
                    }
                    Some(ContinuityMessage::Pong) => {
                        last_pong = Instant::now();
                    }
                    Some(message) => {
                        if inbound_tx.send(message).await.is_err() {
                            return LoopExit::AppClosed;
                        }
                    }
                }
            }

            outgoing = outgoing_rx.recv() => {
                let Some(message) = outgoing else {
                    return LoopExit::AppClosed;
                };
                if connection.tx.send(message).await.is_err() {
                    return LoopExit::ChannelDied;
                }
            }

            _ = ping.tick() => {
                if last_pong.elapsed() > settings.pong_timeout {
                    log::debug!("continuity client: host stopped answering pings");
                    return LoopExit::ChannelDied;
                }
                if connection.tx.send(ContinuityMessage::Ping).await.is_err() {
                    return LoopExit::ChannelDied;
                }
            }
        }
    }
}
