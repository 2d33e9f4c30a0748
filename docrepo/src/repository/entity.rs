use crate::errors::{ErrorKind, RepoError, RepoResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{Debug, Display, Formatter};

/// A record type stored in its own collection.
///
/// # Purpose
/// Supplies, at compile time, everything a repository needs to know about a
/// type: how to reach its identifier and which collection it lives in.
/// Implemented by `#[derive(Entity)]` from `docrepo_derive`, or by hand.
///
/// # Characteristics
/// - Values travel to the store as documents through `serde`
/// - `id_field()` names the document key holding the identifier
/// - `collection_name()` is the collection-name marker; `Ok(None)` means the
///   type name is used
///
/// # Usage
/// ```ignore
/// #[derive(Serialize, Deserialize, Entity)]
/// #[entity(collection = "widgets")]
/// pub struct Widget {
///     id: String,
///     name: String,
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Identifier type.
    type Id: Serialize + Clone + PartialEq + Debug + Send + Sync + 'static;

    /// Returns the identifier of this value.
    fn id(&self) -> &Self::Id;

    /// Document key holding the identifier.
    fn id_field() -> &'static str {
        "id"
    }

    /// The type's own simple name, without module path or generic arguments.
    fn entity_name() -> &'static str {
        simple_type_name(std::any::type_name::<Self>())
    }

    /// Explicitly declared collection name, if any.
    ///
    /// Errors are not fatal: [`resolve_collection_name`] logs them and falls
    /// back to [`Entity::entity_name`].
    fn collection_name() -> RepoResult<Option<CollectionName>> {
        Ok(None)
    }
}

/// A validated, non-blank collection name.
///
/// ```rust
/// use docrepo::repository::CollectionName;
///
/// let name = CollectionName::new("widgets").unwrap();
/// assert_eq!(name.as_str(), "widgets");
/// assert!(CollectionName::new("  ").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CollectionName(String);

impl CollectionName {
    /// Fails with `InvalidConfiguration` when `name` is empty or whitespace only.
    pub fn new(name: &str) -> RepoResult<Self> {
        if name.trim().is_empty() {
            log::error!("Empty collection name is not allowed");
            return Err(RepoError::new(
                "Empty collection name is not allowed",
                ErrorKind::InvalidConfiguration,
            ));
        }
        Ok(CollectionName(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CollectionName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CollectionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolves the physical collection name of `T`.
///
/// Prefers the declared marker; otherwise, or when the marker lookup fails,
/// returns the type's own name. Never fails.
pub fn resolve_collection_name<T: Entity>() -> String {
    match T::collection_name() {
        Ok(Some(name)) => name.0,
        Ok(None) => T::entity_name().to_string(),
        Err(err) => {
            log::warn!(
                "Failed to read collection name of {}, using the type name: {}",
                T::entity_name(),
                err
            );
            T::entity_name().to_string()
        }
    }
}

/// Strips module path and generic arguments from a type name:
/// `app::model::Widget<u8>` becomes `Widget`.
pub(crate) fn simple_type_name(full_name: &str) -> &str {
    let base = match full_name.find('<') {
        Some(position) => &full_name[..position],
        None => full_name,
    };
    match base.rfind("::") {
        Some(position) => &base[position + 2..],
        None => base,
    }
}
