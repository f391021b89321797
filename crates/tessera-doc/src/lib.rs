//! # tessera-doc
//!
//! Line-structured document store for the Tessera sequence CRDT.
//!
//! This crate provides:
//! - [`Crdt`]: the 2-D line array with local/remote insert and delete
//! - [`Allocator`]: identifier-path generation between two neighbours
//! - Positional binary search for remote operations
//! - Line splitting on newline insert, line merging and phantom-line cleanup
//!
//! ## Example
//!
//! ```rust
//! use tessera_doc::{Crdt, Position};
//!
//! let mut alice = Crdt::new(1);
//! let mut bob = Crdt::new(2);
//!
//! for ch in alice.handle_local_insert_str("hi\nthere", Position::new(0, 0)).unwrap() {
//!     bob.handle_remote_insert(ch).unwrap();
//! }
//!
//! assert_eq!(bob.text(), "hi\nthere");
//! assert_eq!(bob.line_count(), 2);
//! ```

pub mod allocator;
pub mod config;
pub mod crdt;
pub mod error;
pub mod position;
pub mod search;

pub use allocator::Allocator;
pub use config::{CrdtConfig, CrdtConfigBuilder, DEFAULT_BOUNDARY, DEFAULT_ROOT_LOG2_BASE};
pub use crdt::Crdt;
pub use error::{DocError, Result};
pub use position::Position;
pub use search::Line;

pub use tessera_core::{Char, CharPayload, Identifier, SiteId};
