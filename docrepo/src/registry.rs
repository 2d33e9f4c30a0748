use crate::config::{ErrorHandler, Operation, RepositoryConfig};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::repository::{resolve_collection_name, Entity, TypedRepository};
use crate::repository_builder::RepositoryBuilder;
use crate::store::{Database, StoreConnector};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::any::{Any, TypeId};
use std::sync::Arc;

type RepositoryCell = Arc<OnceCell<Box<dyn Any + Send + Sync>>>;

/// Hands out one [`TypedRepository`] per entity type.
///
/// # Purpose
/// The composition root builds one registry (see [`RepositoryRegistry::builder`])
/// and passes it, or clones of it, to whoever needs repositories. The store
/// client is connected on first use and shared by every repository of the
/// registry.
///
/// # Characteristics
/// - At most one repository per type; every call for `T` returns the same instance
/// - Concurrent first calls for the same `T` block until one of them has opened
///   the collection, then all observe its result
/// - A failed open is not cached; the next call retries
/// - Cheap to clone; clones share state
///
/// # Usage
/// ```rust
/// use docrepo::registry::RepositoryRegistry;
/// use docrepo::repository::Entity;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Note {
///     id: String,
///     text: String,
/// }
///
/// impl Entity for Note {
///     type Id = String;
///     fn id(&self) -> &String {
///         &self.id
///     }
/// }
///
/// let registry = RepositoryRegistry::builder()
///     .connection_string("memory://notes")
///     .build()
///     .unwrap();
/// let notes = registry.instance_for::<Note>().unwrap();
/// assert!(notes.ptr_eq(&registry.instance_for::<Note>().unwrap()));
/// assert_eq!(notes.collection_name(), "Note");
/// ```
#[derive(Clone)]
pub struct RepositoryRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    config: RepositoryConfig,
    connector: Arc<dyn StoreConnector>,
    error_handler: ErrorHandler,
    database: OnceCell<Database>,
    repositories: DashMap<TypeId, RepositoryCell>,
}

impl RepositoryRegistry {
    /// Creates a new [`RepositoryBuilder`].
    pub fn builder() -> RepositoryBuilder {
        RepositoryBuilder::new()
    }

    pub(crate) fn new(
        config: RepositoryConfig,
        connector: Arc<dyn StoreConnector>,
        error_handler: ErrorHandler,
    ) -> Self {
        RepositoryRegistry {
            inner: Arc::new(RegistryInner {
                config,
                connector,
                error_handler,
                database: OnceCell::new(),
                repositories: DashMap::new(),
            }),
        }
    }

    /// Returns the repository of `T`, opening it on first use.
    ///
    /// Opening connects the store client if needed, opens the collection
    /// named by [`resolve_collection_name`] and checks it with a one-document
    /// read. Failures are reported as [`Operation::Open`].
    pub fn instance_for<T: Entity>(&self) -> RepoResult<TypedRepository<T>> {
        let cell = self
            .inner
            .repositories
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let instance = cell.get_or_try_init(|| {
            let repository = self.open_repository::<T>()?;
            Ok::<_, RepoError>(Box::new(repository) as Box<dyn Any + Send + Sync>)
        })?;

        match instance.downcast_ref::<TypedRepository<T>>() {
            Some(repository) => Ok(repository.clone()),
            None => {
                log::error!("Registry holds a foreign repository for {}", T::entity_name());
                Err(RepoError::new(
                    &format!("Registry holds a foreign repository for {}", T::entity_name()),
                    ErrorKind::InternalError,
                ))
            }
        }
    }

    /// Returns `true` when the repository of `T` has been opened.
    pub fn contains<T: Entity>(&self) -> bool {
        self.inner
            .repositories
            .get(&TypeId::of::<T>())
            .is_some_and(|cell| cell.get().is_some())
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.inner.config
    }

    pub fn error_handler(&self) -> &ErrorHandler {
        &self.inner.error_handler
    }

    /// The configured database, connecting the client on first use.
    pub fn database(&self) -> RepoResult<Database> {
        self.inner
            .database
            .get_or_try_init(|| {
                let config = &self.inner.config;
                log::debug!("Connecting to {}", config.connection_string);
                let client = self.inner.connector.connect(&config.connection_string)?;
                client.database(&config.database_name)
            })
            .cloned()
            .map_err(|err| self.report_open_failure(err))
    }

    fn open_repository<T: Entity>(&self) -> RepoResult<TypedRepository<T>> {
        let database = self.database()?;
        let collection_name = resolve_collection_name::<T>();
        log::debug!(
            "Opening collection {} of {} for {}",
            collection_name,
            database.name(),
            T::entity_name()
        );
        let collection = database
            .collection(&collection_name)
            .map_err(|err| self.report_open_failure(err))?;
        TypedRepository::open(collection, self.inner.error_handler.clone())
    }

    fn report_open_failure(&self, err: RepoError) -> RepoError {
        log::error!("Failed to open repository store: {}", err);
        self.inner.error_handler.handle(Operation::Open, err)
    }
}
