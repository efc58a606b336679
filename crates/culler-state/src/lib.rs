//! culler-state — embedded state store for Culler.
//!
//! Backed by [redb](https://docs.rs/redb), holds the termination gate's
//! per-group fire records and the schedules published by each scheduling
//! run.
//!
//! # Architecture
//!
//! Values are JSON-serialized into redb's `&[u8]` value columns. Gate
//! records are keyed by `SelectionGroup::table_key()` and carry a version
//! counter; `StateStore::commit_gate` only writes when the stored version
//! still matches the one the caller read. redb serializes write
//! transactions, so the compare and the write are atomic across threads.
//! Across processes the database file is locked by whoever opened it
//! first.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`).

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
