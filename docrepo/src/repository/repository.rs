use crate::config::{ErrorHandler, Operation};
use crate::document::{from_document, to_document, Document};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::filter::{all, Filter};
use crate::find_options::{limit_to, FindOptions};
use crate::index::{contains_index_named, IndexDescriptor, IndexKeys, IndexOptions};
use crate::repository::{Entity, Query};
use crate::store::Collection;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// Typed access to the collection of one entity type.
///
/// # Purpose
/// Converts entities to documents and back, and routes every store failure
/// through the configured [`ErrorHandler`]. Obtain one from
/// [`crate::registry::RepositoryRegistry::instance_for`], which keeps a
/// single instance per type, or open one directly with
/// [`TypedRepository::open`].
///
/// # Characteristics
/// - Cheap to clone; clones share the same collection handle
/// - `Send + Sync`; safe to use from many threads
/// - Every method is a blocking call into the store
///
/// # Usage
/// ```ignore
/// let widgets: TypedRepository<Widget> = registry.instance_for()?;
/// widgets.add(Widget::new("42", "foo"))?;
/// let found = widgets.find(field("name").eq("foo"))?;
/// widgets.delete_by_id(&"42".to_string())?;
/// ```
pub struct TypedRepository<T: Entity> {
    inner: Arc<TypedRepositoryInner<T>>,
}

struct TypedRepositoryInner<T> {
    collection: Collection,
    error_handler: ErrorHandler,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for TypedRepository<T> {
    fn clone(&self) -> Self {
        TypedRepository {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Entity> TypedRepository<T> {
    /// Wraps an opened collection and checks it with a one-document read.
    ///
    /// A failing check is reported as [`Operation::Open`].
    pub fn open(collection: Collection, error_handler: ErrorHandler) -> RepoResult<Self> {
        let repository = TypedRepository {
            inner: Arc::new(TypedRepositoryInner {
                collection,
                error_handler,
                _entity: PhantomData,
            }),
        };

        let check = repository.inner.collection.find(&all(), &limit_to(1));
        repository.guard(Operation::Open, check)?;
        log::debug!(
            "Opened repository for {} on collection {}",
            T::entity_name(),
            repository.collection_name()
        );
        Ok(repository)
    }

    pub fn collection_name(&self) -> &str {
        self.inner.collection.name()
    }

    /// The underlying collection handle.
    pub fn collection(&self) -> &Collection {
        &self.inner.collection
    }

    /// Returns `true` when both handles are the same instance.
    pub fn ptr_eq(&self, other: &TypedRepository<T>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Inserts one entity and hands it back.
    ///
    /// Fails with `DuplicateKey` when an entity with the same id is stored.
    pub fn add(&self, value: T) -> RepoResult<T> {
        let result =
            to_document(&value).and_then(|document| self.inner.collection.insert_one(T::id_field(), document));
        self.guard(Operation::Add, result)?;
        Ok(value)
    }

    /// Inserts all entities in one batch and hands them back.
    ///
    /// The store writes either the whole batch or nothing.
    pub fn add_many(&self, values: Vec<T>) -> RepoResult<Vec<T>> {
        let result = values
            .iter()
            .map(to_document)
            .collect::<RepoResult<Vec<_>>>()
            .and_then(|documents| self.inner.collection.insert_many(T::id_field(), documents));
        self.guard(Operation::AddMany, result)?;
        Ok(values)
    }

    /// Replaces the stored document with the same id.
    ///
    /// Does nothing when no document has that id. Fails with `InvalidId`
    /// when the id is null or blank.
    pub fn update(&self, value: T) -> RepoResult<T> {
        let result = id_value::<T>(value.id()).and_then(|id| {
            let document = to_document(&value)?;
            self.inner.collection.replace_one(T::id_field(), &id, document)
        });
        let matched = self.guard(Operation::Update, result)?;
        if matched == 0 {
            log::debug!(
                "No document with id {:?} in {}, nothing updated",
                value.id(),
                self.collection_name()
            );
        }
        Ok(value)
    }

    /// Deletes the stored document with the id of `value`.
    pub fn delete(&self, value: &T) -> RepoResult<()> {
        self.delete_by_id(value.id())
    }

    /// Deletes at most one document with the given id. Deleting an unknown
    /// id is not an error.
    pub fn delete_by_id(&self, id: &T::Id) -> RepoResult<()> {
        let result = id_value::<T>(id).and_then(|id| self.inner.collection.delete_one(T::id_field(), &id));
        self.guard(Operation::Delete, result)?;
        Ok(())
    }

    /// Reads the whole collection. Callers are responsible for its size.
    pub fn get_all(&self) -> RepoResult<Vec<T>> {
        let result = self
            .inner
            .collection
            .find(&all(), &FindOptions::default())
            .and_then(decode);
        self.guard(Operation::GetAll, result)
    }

    /// Returns the entities matching a store-native filter.
    pub fn find(&self, filter: Filter) -> RepoResult<Vec<T>> {
        let result = self
            .inner
            .collection
            .find(&filter, &FindOptions::default())
            .and_then(decode);
        self.guard(Operation::Find, result)
    }

    /// Returns the entities for which `predicate` holds.
    ///
    /// The predicate runs in process over every decoded entity; prefer
    /// [`TypedRepository::find`] for large collections.
    pub fn find_by<P>(&self, predicate: P) -> RepoResult<Vec<T>>
    where
        P: Fn(&T) -> bool,
    {
        let entities = self.find(all())?;
        Ok(entities.into_iter().filter(|entity| predicate(entity)).collect())
    }

    /// Looks up one entity by id.
    pub fn find_by_id(&self, id: &T::Id) -> RepoResult<Option<T>> {
        let result = id_value::<T>(id).and_then(|id| {
            let filter = Filter::Eq(T::id_field().to_string(), id);
            self.inner.collection.find(&filter, &limit_to(1))
        });
        let mut documents = self.guard(Operation::Find, result)?;
        match documents.pop() {
            Some(document) => self.guard(Operation::Find, from_document(document)).map(Some),
            None => Ok(None),
        }
    }

    /// Starts a lazy query over the collection. Nothing is read until the
    /// query is materialized.
    pub fn queryable(&self) -> Query<T> {
        Query::new(self.clone())
    }

    /// Creates an index unless one with the same name already exists.
    ///
    /// Without `name` the store-generated name of `keys` is used for the
    /// existence check.
    pub fn create_index(&self, keys: IndexKeys, name: Option<&str>) -> RepoResult<()> {
        let options = match name {
            Some(name) => IndexOptions::new().name(name),
            None => IndexOptions::new(),
        };
        self.create_index_with_options(keys, options)
    }

    /// Same as [`TypedRepository::create_index`] with full index options.
    pub fn create_index_with_options(&self, keys: IndexKeys, options: IndexOptions) -> RepoResult<()> {
        let name = options
            .index_name()
            .map(str::to_string)
            .unwrap_or_else(|| keys.default_name());

        let result = self.inner.collection.list_indexes().and_then(|listed| {
            if contains_index_named(&listed, &name) {
                log::debug!("Index {} already exists on {}", name, self.collection_name());
                return Ok(());
            }
            let options = options.name(&name);
            let created = self.inner.collection.create_index(&keys, &options)?;
            log::debug!("Created index {} on {}", created, self.collection_name());
            Ok(())
        });
        self.guard(Operation::CreateIndex, result)
    }

    /// Lists the well-formed index descriptors of the collection.
    pub fn list_indexes(&self) -> RepoResult<Vec<IndexDescriptor>> {
        let result = self.inner.collection.list_indexes();
        let listed = self.guard(Operation::ListIndexes, result)?;
        Ok(listed.iter().filter_map(IndexDescriptor::from_value).collect())
    }

    pub(crate) fn fetch(&self, filter: &Filter, options: &FindOptions) -> RepoResult<Vec<T>> {
        let result = self.inner.collection.find(filter, options).and_then(decode);
        self.guard(Operation::Query, result)
    }

    pub(crate) fn count_matching(&self, filter: &Filter) -> RepoResult<u64> {
        let result = self.inner.collection.count(filter);
        self.guard(Operation::Query, result)
    }

    fn guard<R>(&self, operation: Operation, result: RepoResult<R>) -> RepoResult<R> {
        result.map_err(|err| {
            log::error!(
                "Operation {} on {} failed: {}",
                operation,
                self.collection_name(),
                err
            );
            self.inner.error_handler.handle(operation, err)
        })
    }
}

fn decode<T: Entity>(documents: Vec<Document>) -> RepoResult<Vec<T>> {
    documents.into_iter().map(from_document).collect()
}

/// Serializes an id, rejecting null and blank strings.
fn id_value<T: Entity>(id: &T::Id) -> RepoResult<Value> {
    let value = serde_json::to_value(id)?;
    let blank = match &value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    };
    if blank {
        return Err(RepoError::new(
            &format!("{} requires a non-empty {}", T::entity_name(), T::id_field()),
            ErrorKind::InvalidId,
        ));
    }
    Ok(value)
}
