//! In-memory document store.
//!
//! A complete implementation of the store client boundary backed by
//! process memory. Suitable for tests and for running without a database
//! server; nothing is persisted.

mod collection;
mod store;

pub use collection::*;
pub use store::*;
