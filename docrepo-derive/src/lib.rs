//! # docrepo Derive Macros
//!
//! ### `Entity`
//!
//! Derives `docrepo::repository::Entity` for structs with named fields.
//!
//! - **Container attribute**: `#[entity(collection = "...")]` (alias
//!   `name`) sets the collection; without it the type name is used
//! - **Container attribute**: `#[entity(id(field = "..."))]` names the id
//!   field; without it a field called `id` is required
//!
//! The document key of the id honours `#[serde(rename = "...")]` on the id
//! field and `#[serde(rename_all = "...")]` on the struct.
//!
//! # Examples
//!
//! ```rust,ignore
//! use docrepo_derive::Entity;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Entity)]
//! #[entity(collection = "widgets", id(field = "code"))]
//! pub struct Widget {
//!     #[serde(rename = "_code")]
//!     pub code: String,
//!     pub name: String,
//! }
//! ```

extern crate proc_macro;
mod entity;

use crate::entity::generate_entity_for_struct;
use proc_macro::TokenStream;
use syn::{Data, DeriveInput};

/// Derives the `Entity` trait.
///
/// # Errors
///
/// Returns a compile error if:
/// - Applied to an enum, a union or a struct without named fields
/// - The collection marker is empty or whitespace
/// - The id field does not exist
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    match ast.data {
        Data::Struct(ref data) => match generate_entity_for_struct(&ast, data) {
            Ok(token_stream) => token_stream,
            Err(e) => e.to_compile_error().into(),
        },
        Data::Enum(_) => syn::Error::new_spanned(
            &ast,
            "Cannot derive Entity for enums. Only structs are supported.",
        )
        .to_compile_error()
        .into(),
        Data::Union(_) => syn::Error::new_spanned(
            &ast,
            "Cannot derive Entity for unions. Only structs are supported.",
        )
        .to_compile_error()
        .into(),
    }
}
