//! Integration tests for `docrepo` and `docrepo_derive`.
//!
//! The derive rejects an empty collection marker at compile time:
//!
//! ```compile_fail
//! use docrepo_derive::Entity;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Entity)]
//! #[entity(collection = "  ")]
//! struct Blank {
//!     id: String,
//! }
//! ```
//!
//! and a missing id field:
//!
//! ```compile_fail
//! use docrepo_derive::Entity;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Entity)]
//! struct NoId {
//!     code: String,
//! }
//! ```

pub mod test_util;
