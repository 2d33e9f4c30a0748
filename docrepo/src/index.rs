//! Index key specifications, options and descriptors.
//!
//! An index is identified by its logical name. Descriptors travel across the
//! store boundary as documents shaped like
//! `{"v": 2, "key": {"name": 1}, "name": "name_1", "unique": false}`.

use crate::document::Document;
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::find_options::SortOrder;
use serde_json::{json, Value};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Version tag written into index documents.
pub const INDEX_VERSION: i64 = 2;

/// Name of the index every collection carries on its id.
pub const DEFAULT_ID_INDEX: &str = "_id_";

/// Ordered list of indexed fields and their directions.
///
/// ```rust
/// use docrepo::index::IndexKeys;
///
/// let keys = IndexKeys::new().ascending("last_name").descending("age");
/// assert_eq!(keys.default_name(), "last_name_1_age_-1");
///
/// let parsed: IndexKeys = r#"{"last_name": 1, "age": -1}"#.parse().unwrap();
/// assert_eq!(parsed, keys);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexKeys {
    keys: Vec<(String, SortOrder)>,
}

impl IndexKeys {
    pub fn new() -> Self {
        IndexKeys::default()
    }

    pub fn ascending(mut self, field_name: &str) -> Self {
        self.keys.push((field_name.to_string(), SortOrder::Ascending));
        self
    }

    pub fn descending(mut self, field_name: &str) -> Self {
        self.keys.push((field_name.to_string(), SortOrder::Descending));
        self
    }

    pub fn fields(&self) -> &[(String, SortOrder)] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn is_compound(&self) -> bool {
        self.keys.len() > 1
    }

    /// Store-generated name for an unnamed index: `field_1_other_-1`.
    pub fn default_name(&self) -> String {
        self.keys
            .iter()
            .map(|(field, order)| format!("{}_{}", field, direction(*order)))
            .collect::<Vec<_>>()
            .join("_")
    }

    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        for (field, order) in &self.keys {
            document.insert(field.clone(), Value::from(direction(*order)));
        }
        document
    }

    /// Reads a key document. Directions must be `1` or `-1`.
    pub fn from_document(document: &Document) -> RepoResult<Self> {
        let mut keys = Vec::with_capacity(document.len());
        for (field, value) in document {
            let order = match value.as_i64() {
                Some(1) => SortOrder::Ascending,
                Some(-1) => SortOrder::Descending,
                _ => {
                    log::error!("Invalid direction {} for index field {}", value, field);
                    return Err(RepoError::new(
                        &format!("Invalid direction {} for index field {}", value, field),
                        ErrorKind::InvalidConfiguration,
                    ));
                }
            };
            keys.push((field.clone(), order));
        }

        if keys.is_empty() {
            log::error!("Index key specification cannot be empty");
            return Err(RepoError::new(
                "Index key specification cannot be empty",
                ErrorKind::InvalidConfiguration,
            ));
        }
        Ok(IndexKeys { keys })
    }
}

impl FromStr for IndexKeys {
    type Err = RepoError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        match serde_json::from_str::<Value>(spec) {
            Ok(Value::Object(document)) => IndexKeys::from_document(&document),
            _ => {
                log::error!("Invalid index key specification {}", spec);
                Err(RepoError::new(
                    &format!("Invalid index key specification {}", spec),
                    ErrorKind::InvalidConfiguration,
                ))
            }
        }
    }
}

impl Display for IndexKeys {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::Object(self.to_document()))
    }
}

fn direction(order: SortOrder) -> i64 {
    match order {
        SortOrder::Ascending => 1,
        SortOrder::Descending => -1,
    }
}

/// Options passed along with a key specification when creating an index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexOptions {
    name: Option<String>,
    unique: bool,
}

pub fn unique_index() -> IndexOptions {
    IndexOptions::new().unique(true)
}

pub fn non_unique_index() -> IndexOptions {
    IndexOptions::new()
}

impl IndexOptions {
    pub fn new() -> Self {
        IndexOptions::default()
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn index_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }
}

/// A named index on one collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexDescriptor {
    keys: IndexKeys,
    name: String,
    unique: bool,
}

impl IndexDescriptor {
    /// Builds the descriptor a store creates for `keys` and `options`; the
    /// name falls back to [`IndexKeys::default_name`].
    pub fn new(keys: IndexKeys, options: &IndexOptions) -> Self {
        let name = options
            .index_name()
            .map(str::to_string)
            .unwrap_or_else(|| keys.default_name());
        IndexDescriptor {
            keys,
            name,
            unique: options.is_unique(),
        }
    }

    pub fn keys(&self) -> &IndexKeys {
        &self.keys
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn to_value(&self) -> Value {
        json!({
            "v": INDEX_VERSION,
            "key": Value::Object(self.keys.to_document()),
            "name": self.name,
            "unique": self.unique,
        })
    }

    /// Parses a listed index. Returns `None` for anything that is not a
    /// well-formed descriptor document.
    pub fn from_value(value: &Value) -> Option<Self> {
        let document = value.as_object()?;
        let name = document.get("name")?.as_str()?.to_string();
        let keys = IndexKeys::from_document(document.get("key")?.as_object()?).ok()?;
        let unique = document
            .get("unique")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Some(IndexDescriptor { keys, name, unique })
    }
}

/// Returns `true` when a document-valued entry of `listed` has a `name`
/// field equal to `name`. Entries that are not documents are skipped.
pub fn contains_index_named(listed: &[Value], name: &str) -> bool {
    listed.iter().any(|entry| match entry {
        Value::Object(document) => document
            .get("name")
            .and_then(Value::as_str)
            .is_some_and(|existing| existing == name),
        _ => false,
    })
}
