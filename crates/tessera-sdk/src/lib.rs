//! Tessera SDK - High-level SDK for building collaborative text editors
//!
//! This SDK wraps the Tessera sequence CRDT in documents, sessions and
//! transports so that an editor only deals with positions and text.
//!
//! # Quick Start
//!
//! ```rust
//! use tessera_sdk::{quick, Position};
//!
//! #[tokio::main]
//! async fn main() -> tessera_sdk::Result<()> {
//!     let clients = quick::create_collaborative_clients(&["Alice", "Bob"]);
//!     let alice = clients[0].create_session("meeting");
//!     let bob = clients[1].create_session("meeting");
//!
//!     alice.open_doc("notes");
//!     bob.open_doc("notes");
//!
//!     // Edits are broadcast as they are made
//!     alice.insert_str("notes", Position::new(0, 0), "# Notes\n").await?;
//!     bob.process_incoming().await?;
//!
//!     assert_eq!(bob.get_doc("notes").unwrap().text(), "# Notes\n");
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`client`] - Main entry point for creating and managing collaborative sessions
//! - [`document`] - Collaborative text document over the CRDT store
//! - [`operation`] - Wire form of replicated edits
//! - [`network`] - Network transport abstractions
//! - [`session`] - Session management for collaborative editing
//! - [`error`] - Error types

pub mod client;
pub mod document;
pub mod error;
pub mod network;
pub mod operation;
pub mod session;

// Re-exports for convenience
pub use client::{quick, Client, ClientConfig, ClientConfigBuilder};
pub use document::{DocEvent, TextDoc};
pub use error::{Result, SdkError};
pub use network::{
    create_network, MemoryTransport, Message, NetworkError, NetworkTransport, Peer, PeerId,
    PeerState,
};
pub use operation::Operation;
pub use session::{Session, SessionEvent};

// Re-export commonly used types from the document store
pub use tessera_doc::{Char, CrdtConfig, DocError, Identifier, Position, SiteId};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::client::{Client, ClientConfig};
    pub use crate::document::TextDoc;
    pub use crate::error::SdkError;
    pub use crate::network::{NetworkTransport, Peer, PeerId};
    pub use crate::session::Session;
    pub use tessera_doc::Position;
}
