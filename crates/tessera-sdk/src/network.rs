//! Network transport abstractions for replicating edits between sites.

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tessera_core::SiteId;
use tokio::sync::mpsc;
use tracing::warn;

/// Unique identifier for a peer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(pub String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Peer connection state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PeerState {
    Disconnected,
    Connected,
}

/// Information about a connected peer.
#[derive(Clone, Debug)]
pub struct Peer {
    pub id: PeerId,
    pub name: String,
    pub state: PeerState,
}

/// Messages exchanged between peers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Message {
    /// Handshake announcing a site and its user.
    Hello { site_id: SiteId, user_name: String },
    /// One encoded [`Operation`](crate::operation::Operation) for a document.
    Operation {
        document_id: String,
        payload: Vec<u8>,
    },
}

/// Network error type.
#[derive(Clone, Debug)]
pub enum NetworkError {
    ConnectionFailed(String),
    PeerNotFound(String),
    SendFailed(String),
    AlreadySubscribed,
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkError::ConnectionFailed(e) => write!(f, "Connection failed: {}", e),
            NetworkError::PeerNotFound(id) => write!(f, "Peer not found: {}", id),
            NetworkError::SendFailed(e) => write!(f, "Send failed: {}", e),
            NetworkError::AlreadySubscribed => write!(f, "Incoming stream already taken"),
        }
    }
}

impl std::error::Error for NetworkError {}

/// Abstract network transport trait.
#[async_trait]
pub trait NetworkTransport: Send + Sync + 'static {
    /// Connect to a peer.
    async fn connect(&self, peer_id: &PeerId) -> Result<(), NetworkError>;

    /// Disconnect from a peer.
    async fn disconnect(&self, peer_id: &PeerId) -> Result<(), NetworkError>;

    /// Send a message to a specific peer.
    async fn send(&self, peer_id: &PeerId, message: Message) -> Result<(), NetworkError>;

    /// Broadcast a message to all connected peers. An error means the
    /// message was not sent and may be retried.
    async fn broadcast(&self, message: Message) -> Result<(), NetworkError>;

    /// Get list of connected peers.
    async fn connected_peers(&self) -> Vec<Peer>;

    /// Take the stream of incoming messages. Only one subscriber is allowed.
    fn subscribe(&self) -> Result<mpsc::Receiver<(PeerId, Message)>, NetworkError>;
}

/// Type alias for the message receiver shared across threads.
type SharedMessageReceiver = Arc<RwLock<Option<mpsc::Receiver<(PeerId, Message)>>>>;
/// Type alias for the outgoing message senders shared across threads.
type SharedOutgoing = Arc<RwLock<HashMap<PeerId, mpsc::Sender<(PeerId, Message)>>>>;

/// In-memory transport for testing and simulation.
///
/// Each link is a FIFO channel, so operations from one peer arrive in the
/// order they were sent.
pub struct MemoryTransport {
    local_id: PeerId,
    peers: Arc<RwLock<HashMap<PeerId, Peer>>>,
    message_tx: mpsc::Sender<(PeerId, Message)>,
    message_rx: SharedMessageReceiver,
    outgoing: SharedOutgoing,
}

impl MemoryTransport {
    pub fn new(local_id: PeerId) -> Self {
        Self::with_capacity(local_id, 1024)
    }

    /// Create a transport whose inbox holds up to `capacity` messages.
    pub fn with_capacity(local_id: PeerId, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            local_id,
            peers: Arc::new(RwLock::new(HashMap::new())),
            message_tx: tx,
            message_rx: Arc::new(RwLock::new(Some(rx))),
            outgoing: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn local_id(&self) -> &PeerId {
        &self.local_id
    }

    /// Link two memory transports in both directions.
    pub fn connect_to(&self, other: &MemoryTransport) {
        self.link(other);
        other.link(self);
    }

    fn link(&self, other: &MemoryTransport) {
        self.peers.write().insert(
            other.local_id.clone(),
            Peer {
                id: other.local_id.clone(),
                name: other.local_id.0.clone(),
                state: PeerState::Connected,
            },
        );
        self.outgoing
            .write()
            .insert(other.local_id.clone(), other.message_tx.clone());
    }
}

#[async_trait]
impl NetworkTransport for MemoryTransport {
    async fn connect(&self, peer_id: &PeerId) -> Result<(), NetworkError> {
        // Only peers linked with `connect_to` have a channel.
        if !self.outgoing.read().contains_key(peer_id) {
            return Err(NetworkError::ConnectionFailed(format!(
                "no link to {}",
                peer_id
            )));
        }
        if let Some(peer) = self.peers.write().get_mut(peer_id) {
            peer.state = PeerState::Connected;
        }
        Ok(())
    }

    async fn disconnect(&self, peer_id: &PeerId) -> Result<(), NetworkError> {
        match self.peers.write().get_mut(peer_id) {
            Some(peer) => peer.state = PeerState::Disconnected,
            None => return Err(NetworkError::PeerNotFound(peer_id.to_string())),
        }
        Ok(())
    }

    async fn send(&self, peer_id: &PeerId, message: Message) -> Result<(), NetworkError> {
        let tx = {
            let connected = self
                .peers
                .read()
                .get(peer_id)
                .is_some_and(|peer| peer.state == PeerState::Connected);
            connected
                .then(|| self.outgoing.read().get(peer_id).cloned())
                .flatten()
        };

        if let Some(tx) = tx {
            tx.send((self.local_id.clone(), message))
                .await
                .map_err(|e| NetworkError::SendFailed(e.to_string()))?;
            Ok(())
        } else {
            Err(NetworkError::PeerNotFound(peer_id.to_string()))
        }
    }

    async fn broadcast(&self, message: Message) -> Result<(), NetworkError> {
        let senders: Vec<_> = {
            let peers = self.peers.read();
            let outgoing = self.outgoing.read();
            outgoing
                .iter()
                .filter(|(id, _)| {
                    peers
                        .get(*id)
                        .is_some_and(|peer| peer.state == PeerState::Connected)
                })
                .map(|(id, tx)| (id.clone(), tx.clone()))
                .collect()
        };

        let sends = senders.iter().map(|(_, tx)| {
            let message = message.clone();
            async move { tx.send((self.local_id.clone(), message)).await }
        });
        for ((peer_id, _), result) in senders.iter().zip(join_all(sends).await) {
            if result.is_err() {
                warn!(%peer_id, "dropped message for closed peer");
            }
        }
        Ok(())
    }

    async fn connected_peers(&self) -> Vec<Peer> {
        self.peers
            .read()
            .values()
            .filter(|peer| peer.state == PeerState::Connected)
            .cloned()
            .collect()
    }

    fn subscribe(&self) -> Result<mpsc::Receiver<(PeerId, Message)>, NetworkError> {
        self.message_rx
            .write()
            .take()
            .ok_or(NetworkError::AlreadySubscribed)
    }
}

/// Create a network of connected memory transports for testing.
pub fn create_network(count: usize) -> Vec<MemoryTransport> {
    let transports: Vec<_> = (0..count)
        .map(|i| MemoryTransport::new(PeerId::new(format!("peer-{}", i))))
        .collect();

    // Connect all peers to each other
    for i in 0..count {
        for j in (i + 1)..count {
            transports[i].connect_to(&transports[j]);
        }
    }

    transports
}
