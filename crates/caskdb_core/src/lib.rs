//! # CaskDB Core
//!
//! An embeddable, append-only key-value store organized as a
//! log-structured sequence of immutable segment files plus one active
//! writable segment, with a full in-memory index mapping every live
//! key to the byte offset of its most-recent record.
//!
//! ## Architecture Overview
//!
//! ```text
//!   put ──▶ writer queue ──▶ ┌──────────────┐      ┌─────────────┐
//!                            │ Writer loop  │─────▶│   Active    │
//!                            │ (sole        │ roll │   segment   │
//!                            │  mutator)    │──┐   └─────────────┘
//!                            └──────┬───────┘  │ merge
//!                                   │          ▼
//!                            ┌──────▼───────┐ ┌─────────────┐
//!   get ──▶ index lookup ──▶ │    Index     │ │   Sealed    │
//!           open + decode    │ key → (seg,  │ │  segments   │
//!                            │      offset) │ └─────────────┘
//!                            └──────────────┘
//! ```
//!
//! - Mutations are serialized through a rendezvous queue consumed by a
//!   single writer thread; readers run in parallel on caller threads.
//! - The active segment rolls at a size threshold; at three segments
//!   the writer merges every sealed segment into one, preserving
//!   last-write-wins per key.
//! - On open, the index is rebuilt by scanning every segment file in
//!   modification-time order.
//!
//! See [`Store`] for the entry point.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod record;
pub mod store;

mod compact;
mod dir;
mod keydir;
mod recovery;
mod segment;
mod writer;

pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use record::Record;
pub use store::Store;

/// Current version of CaskDB.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
