use super::InMemoryCollection;
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::store::{
    Collection, Database, DatabaseProvider, StoreClient, StoreClientProvider, StoreConnector,
};
use dashmap::DashMap;
use std::sync::Arc;

/// Scheme accepted by [`InMemoryConnector`].
pub const MEMORY_SCHEME: &str = "memory://";

/// Connector for in-memory stores.
///
/// # Purpose
/// Resolves `memory://<name>` connection strings to in-memory stores. The
/// same connection string always reaches the same store for the lifetime of
/// the connector, so separate registries can share data in tests.
///
/// # Usage
/// ```rust
/// use docrepo::store::StoreConnector;
/// use docrepo::store::memory::InMemoryConnector;
///
/// let connector = InMemoryConnector::new();
/// let client = connector.connect("memory://test").unwrap();
/// let database = client.database("adspace").unwrap();
/// assert_eq!(database.name(), "adspace");
/// ```
#[derive(Clone, Default)]
pub struct InMemoryConnector {
    stores: Arc<DashMap<String, InMemoryStore>>,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        InMemoryConnector::default()
    }

    /// Forgets the store behind `connection_string`. Clients already
    /// connected keep their data; the next connect starts empty.
    ///
    /// Returns `true` when a store was dropped.
    pub fn drop_store(&self, connection_string: &str) -> bool {
        let name = connection_string
            .strip_prefix(MEMORY_SCHEME)
            .unwrap_or(connection_string);
        let dropped = self.stores.remove(name).is_some();
        if dropped {
            log::debug!("Dropped in-memory store {}", name);
        }
        dropped
    }

    /// Number of stores connected so far.
    pub fn store_count(&self) -> usize {
        self.stores.len()
    }
}

impl StoreConnector for InMemoryConnector {
    fn connect(&self, connection_string: &str) -> RepoResult<StoreClient> {
        let name = match connection_string.strip_prefix(MEMORY_SCHEME) {
            Some(name) => name,
            None => {
                log::error!("Unsupported connection string {}", connection_string);
                return Err(RepoError::new(
                    &format!(
                        "Unsupported connection string '{}', expected {}<name>",
                        connection_string, MEMORY_SCHEME
                    ),
                    ErrorKind::ConnectionError,
                ));
            }
        };

        let store = self
            .stores
            .entry(name.to_string())
            .or_insert_with(InMemoryStore::new)
            .clone();
        log::debug!("Connected to in-memory store {}", name);
        Ok(StoreClient::new(store))
    }
}

/// In-memory store client holding any number of databases.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    databases: Arc<DashMap<String, InMemoryDatabase>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore::default()
    }
}

impl StoreClientProvider for InMemoryStore {
    fn database(&self, name: &str) -> RepoResult<Database> {
        let database = self
            .databases
            .entry(name.to_string())
            .or_insert_with(|| InMemoryDatabase::new(name))
            .clone();
        Ok(Database::new(database))
    }
}

#[derive(Clone)]
pub struct InMemoryDatabase {
    inner: Arc<InMemoryDatabaseInner>,
}

struct InMemoryDatabaseInner {
    name: String,
    collections: DashMap<String, InMemoryCollection>,
}

impl InMemoryDatabase {
    fn new(name: &str) -> Self {
        InMemoryDatabase {
            inner: Arc::new(InMemoryDatabaseInner {
                name: name.to_string(),
                collections: DashMap::new(),
            }),
        }
    }

    /// Names of the collections opened so far.
    pub fn collection_names(&self) -> Vec<String> {
        self.inner
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }
}

impl DatabaseProvider for InMemoryDatabase {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn collection(&self, name: &str) -> RepoResult<Collection> {
        let collection = self
            .inner
            .collections
            .entry(name.to_string())
            .or_insert_with(|| InMemoryCollection::new(name))
            .clone();
        Ok(Collection::new(collection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::to_document;
    use crate::filter::all;
    use crate::find_options::FindOptions;
    use serde_json::json;

    #[test]
    fn test_rejects_foreign_scheme() {
        let connector = InMemoryConnector::new();
        let err = connector.connect("mongodb://localhost:27017").err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::ConnectionError);
    }

    #[test]
    fn test_same_connection_string_shares_data() {
        let connector = InMemoryConnector::new();
        let first = connector.connect("memory://shared").unwrap();
        let second = connector.connect("memory://shared").unwrap();
        let other = connector.connect("memory://other").unwrap();

        first
            .database("db")
            .unwrap()
            .collection("items")
            .unwrap()
            .insert_one("id", to_document(&json!({"id": "1"})).unwrap())
            .unwrap();

        let count = |client: &StoreClient| {
            client
                .database("db")
                .unwrap()
                .collection("items")
                .unwrap()
                .find(&all(), &FindOptions::new())
                .unwrap()
                .len()
        };
        assert_eq!(count(&second), 1);
        assert_eq!(count(&other), 0);
    }

    #[test]
    fn test_drop_store_starts_fresh() {
        let connector = InMemoryConnector::new();
        let client = connector.connect("memory://temp").unwrap();
        client
            .database("db")
            .unwrap()
            .collection("items")
            .unwrap()
            .insert_one("id", to_document(&json!({"id": "1"})).unwrap())
            .unwrap();
        assert_eq!(connector.store_count(), 1);

        assert!(connector.drop_store("memory://temp"));
        assert!(!connector.drop_store("memory://temp"));
        assert_eq!(connector.store_count(), 0);

        let fresh = connector.connect("memory://temp").unwrap();
        let items = fresh.database("db").unwrap().collection("items").unwrap();
        assert_eq!(items.count(&all()).unwrap(), 0);
    }

    #[test]
    fn test_collection_names() {
        let database = InMemoryDatabase::new("db");
        database.collection("a").unwrap();
        database.collection("b").unwrap();
        database.collection("a").unwrap();
        let mut names = database.collection_names();
        names.sort();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }
}
