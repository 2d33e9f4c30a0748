//! Store client boundary.
//!
//! A repository never talks to a driver directly. It goes through four
//! handles, each a thin `Arc` wrapper over a provider trait:
//!
//! - [`StoreConnector`] opens a [`StoreClient`] from a connection string
//! - [`StoreClient`] opens a [`Database`] by name
//! - [`Database`] opens a [`Collection`] by name
//! - [`Collection`] executes inserts, replaces, deletes, finds and index
//!   management
//!
//! Driver integrations implement the provider traits; [`memory`] ships an
//! in-process implementation.

mod client;
pub mod memory;

pub use client::*;
