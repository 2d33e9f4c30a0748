//! Typed repositories over store collections.
//!
//! Each entity type lives in its own collection. A [`TypedRepository`]
//! converts values to documents and back and offers CRUD, filtered reads,
//! lazy [`Query`] composition and idempotent index creation.
//!
//! # Declaring entities
//!
//! ```rust,ignore
//! use docrepo_derive::Entity;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Entity)]
//! #[entity(collection = "widgets", id(field = "code"))]
//! pub struct Widget {
//!     code: String,
//!     name: String,
//! }
//!
//! let widgets = registry.instance_for::<Widget>()?;
//! assert_eq!(widgets.collection_name(), "widgets");
//! ```
//!
//! Without a collection marker the type's simple name is used.

mod entity;
mod query;
mod repository;

pub use entity::*;
pub use query::*;
pub use repository::*;
