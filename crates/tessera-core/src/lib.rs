//! # tessera-core
//!
//! Position identifiers and characters for the Tessera sequence CRDT.
//!
//! - [`Identifier`]: an ordered `(value, site)` pair, one tree level
//! - [`Char`]: a character plus its identifier path; paths define the
//!   document's total order
//! - [`SiteId`]: replica identity used to break ties

pub mod character;
pub mod error;
pub mod identifier;
pub mod site;

pub use character::{Char, CharPayload, NEWLINE};
pub use error::PathError;
pub use identifier::Identifier;
pub use site::SiteId;
