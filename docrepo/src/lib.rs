//! # docrepo - Typed Repositories over Document Stores
//!
//! `docrepo` maps Rust types onto collections of a document store. Every
//! entity type gets exactly one [`TypedRepository`](repository::TypedRepository)
//! per [`RepositoryRegistry`](registry::RepositoryRegistry), bound to a
//! collection named after the type or after its declared collection marker.
//!
//! ## Quick Start
//!
//! ```rust
//! use docrepo::filter::field;
//! use docrepo::registry::RepositoryRegistry;
//! use docrepo::repository::{CollectionName, Entity};
//! use docrepo::errors::RepoResult;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Widget {
//!     id: String,
//!     name: String,
//! }
//!
//! impl Entity for Widget {
//!     type Id = String;
//!
//!     fn id(&self) -> &String {
//!         &self.id
//!     }
//!
//!     fn collection_name() -> RepoResult<Option<CollectionName>> {
//!         Ok(Some(CollectionName::new("widgets")?))
//!     }
//! }
//!
//! # fn main() -> RepoResult<()> {
//! let registry = RepositoryRegistry::builder()
//!     .connection_string("memory://quickstart")
//!     .build()?;
//! let widgets = registry.instance_for::<Widget>()?;
//!
//! widgets.add(Widget { id: "42".into(), name: "foo".into() })?;
//! assert_eq!(widgets.find(field("name").eq("foo"))?.len(), 1);
//!
//! widgets.delete_by_id(&"42".to_string())?;
//! assert!(widgets.get_all()?.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ## Blocking API
//!
//! Every operation is a synchronous call into the store. Drivers with an
//! asynchronous client block inside their provider.
//!
//! ## Module Organization
//!
//! - [`config`] - Connection settings and the error handling strategy
//! - [`document`] - Document representation and value comparison
//! - [`errors`] - Error types and result definitions
//! - [`filter`] - Store-native query filters
//! - [`find_options`] - Sorting and paging
//! - [`index`] - Index keys, options and descriptors
//! - [`registry`] - Per-type repository singletons
//! - [`repository`] - Entities, typed repositories and queries
//! - [`repository_builder`] - Registry builder
//! - [`store`] - Store client boundary and the in-memory store

pub mod config;
pub mod document;
pub mod errors;
pub mod filter;
pub mod find_options;
pub mod index;
pub mod registry;
pub mod repository;
pub mod repository_builder;
pub mod store;
