//! High-level client for the Tessera SDK.

use crate::error::Result;
use crate::network::{MemoryTransport, NetworkTransport, Peer, PeerId};
use crate::session::Session;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tessera_core::SiteId;
use tessera_doc::{CrdtConfig, DEFAULT_BOUNDARY, DEFAULT_ROOT_LOG2_BASE};
use ulid::Ulid;

/// Configuration for the Tessera client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// User name announced to peers.
    pub user_name: String,
    /// This client's site. Must be unique among collaborators.
    pub site_id: SiteId,
    /// Branching exponent at depth 0 of the identifier tree.
    pub root_log2_base: u32,
    /// Cap on the random jump when allocating identifiers.
    pub boundary: u64,
}

impl ClientConfig {
    /// Document store settings derived from this client's settings.
    pub fn crdt_config(&self) -> CrdtConfig {
        CrdtConfig::builder(self.site_id)
            .root_log2_base(self.root_log2_base)
            .boundary(self.boundary)
            .build()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_name: "Anonymous".to_string(),
            site_id: SiteId::generate(),
            root_log2_base: DEFAULT_ROOT_LOG2_BASE,
            boundary: DEFAULT_BOUNDARY,
        }
    }
}

/// Builder for client configuration.
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    pub fn user_name(mut self, name: impl Into<String>) -> Self {
        self.config.user_name = name.into();
        self
    }

    pub fn site_id(mut self, site_id: impl Into<SiteId>) -> Self {
        self.config.site_id = site_id.into();
        self
    }

    pub fn root_log2_base(mut self, log2_base: u32) -> Self {
        self.config.root_log2_base = log2_base;
        self
    }

    pub fn boundary(mut self, boundary: u64) -> Self {
        self.config.boundary = boundary;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The main Tessera client for collaborative editing.
///
/// The client manages sessions and network connections.
///
/// # Example
///
/// ```rust
/// use tessera_sdk::{Client, ClientConfigBuilder, Position};
///
/// let config = ClientConfigBuilder::new().user_name("Alice").site_id(1).build();
/// let client = Client::new_with_memory_transport(config);
///
/// let session = client.create_session("my-session");
/// let doc = session.open_doc("shared-doc");
/// doc.insert_str(Position::new(0, 0), "Hello, world!").unwrap();
/// assert_eq!(doc.text(), "Hello, world!");
/// ```
pub struct Client<T: NetworkTransport> {
    peer_id: PeerId,
    config: ClientConfig,
    transport: Arc<T>,
    sessions: RwLock<HashMap<String, Arc<Session<T>>>>,
}

impl Client<MemoryTransport> {
    /// Create a new client with an in-memory transport (for testing).
    pub fn new_with_memory_transport(config: ClientConfig) -> Self {
        let peer_id = PeerId::new(format!("peer-{}", Ulid::new()));
        let transport = Arc::new(MemoryTransport::new(peer_id.clone()));

        Self::new(peer_id, transport, config)
    }
}

impl<T: NetworkTransport> Client<T> {
    /// Create a new client with a custom transport.
    pub fn new(peer_id: PeerId, transport: Arc<T>, config: ClientConfig) -> Self {
        Self {
            peer_id,
            config,
            transport,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Get the local peer ID.
    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    /// Get the user name.
    pub fn user_name(&self) -> &str {
        &self.config.user_name
    }

    pub fn site_id(&self) -> SiteId {
        self.config.site_id
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Open the session named `session_id`, creating it on first use.
    ///
    /// Every session edits with this client's site id. They share the
    /// client's transport, so only one of them can take the incoming
    /// message stream.
    pub fn create_session(&self, session_id: impl Into<String>) -> Arc<Session<T>> {
        let session_id = session_id.into();
        self.sessions
            .write()
            .entry(session_id.clone())
            .or_insert_with(|| {
                Arc::new(Session::new(
                    session_id,
                    self.peer_id.clone(),
                    self.config.user_name.clone(),
                    self.config.crdt_config(),
                    self.transport.clone(),
                ))
            })
            .clone()
    }

    pub fn get_session(&self, session_id: &str) -> Option<Arc<Session<T>>> {
        self.sessions.read().get(session_id).cloned()
    }

    /// Resume delivery to and from `peer_id`.
    pub async fn connect_peer(&self, peer_id: &PeerId) -> Result<()> {
        Ok(self.transport.connect(peer_id).await?)
    }

    /// Stop delivery to `peer_id`. Edits made meanwhile are not resent.
    pub async fn disconnect_peer(&self, peer_id: &PeerId) -> Result<()> {
        Ok(self.transport.disconnect(peer_id).await?)
    }

    pub async fn connected_peers(&self) -> Vec<Peer> {
        self.transport.connected_peers().await
    }
}

/// Convenience functions for quickly creating collaborative sessions.
pub mod quick {
    use super::*;
    use crate::network::create_network;

    /// Create a simple collaborative setup with multiple clients.
    ///
    /// Clients get site ids `1..=n` in the order of `user_names` and are
    /// linked to each other by memory transports.
    pub fn create_collaborative_clients(user_names: &[&str]) -> Vec<Client<MemoryTransport>> {
        let network = create_network(user_names.len());

        user_names
            .iter()
            .zip(network)
            .enumerate()
            .map(|(i, (name, transport))| {
                let peer_id = transport.local_id().clone();
                let config = ClientConfigBuilder::new()
                    .user_name(*name)
                    .site_id(i as u64 + 1)
                    .build();
                Client::new(peer_id, Arc::new(transport), config)
            })
            .collect()
    }
}
