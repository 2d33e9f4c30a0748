use crate::document::Document;
use crate::errors::RepoResult;
use crate::filter::Filter;
use crate::find_options::FindOptions;
use crate::index::{IndexKeys, IndexOptions};
use serde_json::Value;
use std::ops::Deref;
use std::sync::Arc;

/// Opens client connections from a connection string.
///
/// The composition root supplies a connector; the registry calls it at most
/// once and shares the resulting client between all repositories.
pub trait StoreConnector: Send + Sync {
    /// Connects to the store addressed by `connection_string`.
    ///
    /// # Returns
    /// * `Ok(StoreClient)` when the connection is established
    /// * `Err(RepoError)` with `ConnectionError` otherwise
    fn connect(&self, connection_string: &str) -> RepoResult<StoreClient>;
}

/// A connected store client.
///
/// Implementations must be safe for concurrent use once connected.
pub trait StoreClientProvider: Send + Sync {
    /// Opens (or lazily creates) the database `name`.
    fn database(&self, name: &str) -> RepoResult<Database>;
}

/// One database within a store.
pub trait DatabaseProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Returns a handle to the collection `name`. Collections spring into
    /// existence on first write; opening one has no side effect on the store.
    fn collection(&self, name: &str) -> RepoResult<Collection>;
}

/// One physical collection in one database.
///
/// # Purpose
/// The full set of primitives a typed repository is built on. Every method
/// is a blocking call; asynchronous drivers block inside their provider.
///
/// # Thread Safety
/// Implementers must be `Send + Sync`; handles are shared between threads.
pub trait CollectionProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Inserts one document keyed by its `id_field`.
    ///
    /// Fails with `DuplicateKey` when a stored document has the same id.
    fn insert_one(&self, id_field: &str, document: Document) -> RepoResult<()>;

    /// Inserts a batch keyed by `id_field`. Either every document is written
    /// or an error is returned and none is.
    fn insert_many(&self, id_field: &str, documents: Vec<Document>) -> RepoResult<()>;

    /// Replaces the first document whose `id_field` equals `id`.
    ///
    /// # Returns
    /// The number of matched documents (0 or 1). Zero matches is not an error.
    fn replace_one(&self, id_field: &str, id: &Value, document: Document) -> RepoResult<u64>;

    /// Deletes the first document whose `id_field` equals `id`.
    ///
    /// # Returns
    /// The number of deleted documents (0 or 1).
    fn delete_one(&self, id_field: &str, id: &Value) -> RepoResult<u64>;

    /// Returns the documents matching `filter`, sorted and paged per `options`.
    fn find(&self, filter: &Filter, options: &FindOptions) -> RepoResult<Vec<Document>>;

    /// Counts the documents matching `filter`.
    fn count(&self, filter: &Filter) -> RepoResult<u64> {
        Ok(self.find(filter, &FindOptions::default())?.len() as u64)
    }

    /// Lists index descriptors as the store reports them. Entries are
    /// usually documents (see [`crate::index::IndexDescriptor::to_value`]).
    fn list_indexes(&self) -> RepoResult<Vec<Value>>;

    /// Creates an index and returns its name.
    fn create_index(&self, keys: &IndexKeys, options: &IndexOptions) -> RepoResult<String>;
}

/// Shared handle over a [`StoreClientProvider`].
#[derive(Clone)]
pub struct StoreClient {
    inner: Arc<dyn StoreClientProvider>,
}

impl StoreClient {
    pub fn new<T: StoreClientProvider + 'static>(inner: T) -> Self {
        StoreClient { inner: Arc::new(inner) }
    }
}

impl Deref for StoreClient {
    type Target = Arc<dyn StoreClientProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Shared handle over a [`DatabaseProvider`].
#[derive(Clone)]
pub struct Database {
    inner: Arc<dyn DatabaseProvider>,
}

impl Database {
    pub fn new<T: DatabaseProvider + 'static>(inner: T) -> Self {
        Database { inner: Arc::new(inner) }
    }
}

impl Deref for Database {
    type Target = Arc<dyn DatabaseProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Shared handle over a [`CollectionProvider`].
#[derive(Clone)]
pub struct Collection {
    inner: Arc<dyn CollectionProvider>,
}

impl Collection {
    pub fn new<T: CollectionProvider + 'static>(inner: T) -> Self {
        Collection { inner: Arc::new(inner) }
    }
}

impl Deref for Collection {
    type Target = Arc<dyn CollectionProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
