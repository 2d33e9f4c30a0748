use crate::document::{get_path, values_equal, Document};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::filter::Filter;
use crate::find_options::FindOptions;
use crate::index::{IndexDescriptor, IndexKeys, IndexOptions, DEFAULT_ID_INDEX};
use crate::store::CollectionProvider;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;

/// In-memory collection.
///
/// # Characteristics
/// - Documents keep insertion order
/// - Filters and find options are evaluated in process
/// - Every collection starts with the `_id_` index, the primary key on the
///   id field named by the caller
/// - Ids and unique indexes are enforced on insert and replace
#[derive(Clone)]
pub struct InMemoryCollection {
    inner: Arc<InMemoryCollectionInner>,
}

impl InMemoryCollection {
    pub(crate) fn new(name: &str) -> Self {
        InMemoryCollection {
            inner: Arc::new(InMemoryCollectionInner::new(name)),
        }
    }
}

impl CollectionProvider for InMemoryCollection {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn insert_one(&self, id_field: &str, document: Document) -> RepoResult<()> {
        self.inner.insert_many(id_field, vec![document])
    }

    fn insert_many(&self, id_field: &str, documents: Vec<Document>) -> RepoResult<()> {
        self.inner.insert_many(id_field, documents)
    }

    fn replace_one(&self, id_field: &str, id: &Value, document: Document) -> RepoResult<u64> {
        self.inner.replace_one(id_field, id, document)
    }

    fn delete_one(&self, id_field: &str, id: &Value) -> RepoResult<u64> {
        self.inner.delete_one(id_field, id)
    }

    fn find(&self, filter: &Filter, options: &FindOptions) -> RepoResult<Vec<Document>> {
        self.inner.find(filter, options)
    }

    fn list_indexes(&self) -> RepoResult<Vec<Value>> {
        Ok(self
            .inner
            .indexes
            .read()
            .iter()
            .map(IndexDescriptor::to_value)
            .collect())
    }

    fn create_index(&self, keys: &IndexKeys, options: &IndexOptions) -> RepoResult<String> {
        self.inner.create_index(keys, options)
    }
}

struct InMemoryCollectionInner {
    name: String,
    documents: RwLock<Vec<Document>>,
    indexes: RwLock<Vec<IndexDescriptor>>,
}

impl InMemoryCollectionInner {
    fn new(name: &str) -> Self {
        let id_index = IndexDescriptor::new(
            IndexKeys::new().ascending("_id"),
            &IndexOptions::new().name(DEFAULT_ID_INDEX),
        );
        InMemoryCollectionInner {
            name: name.to_string(),
            documents: RwLock::new(Vec::new()),
            indexes: RwLock::new(vec![id_index]),
        }
    }

    fn insert_many(&self, id_field: &str, documents: Vec<Document>) -> RepoResult<()> {
        let indexes = self.indexes.read();
        let mut stored = self.documents.write();

        // validate the whole batch before writing anything
        for (position, document) in documents.iter().enumerate() {
            if let Some(id) = primary_key(document, id_field) {
                let mut existing = stored.iter().chain(&documents[..position]);
                if existing.any(|other| matches_id(other, id_field, id)) {
                    return Err(duplicate_id(&self.name, id_field, id));
                }
            }
            for index in indexes.iter().filter(|index| index.is_unique()) {
                let mut existing = stored.iter().chain(&documents[..position]);
                if existing.any(|other| same_key(index, other, document)) {
                    return Err(duplicate_key(&self.name, index));
                }
            }
        }

        let count = documents.len();
        stored.extend(documents);
        log::debug!("Inserted {} document(s) into {}", count, self.name);
        Ok(())
    }

    fn replace_one(&self, id_field: &str, id: &Value, document: Document) -> RepoResult<u64> {
        let indexes = self.indexes.read();
        let mut stored = self.documents.write();

        let position = match stored.iter().position(|doc| matches_id(doc, id_field, id)) {
            Some(position) => position,
            None => return Ok(0),
        };

        for index in indexes.iter().filter(|index| index.is_unique()) {
            let clash = stored
                .iter()
                .enumerate()
                .any(|(other, existing)| other != position && same_key(index, existing, &document));
            if clash {
                return Err(duplicate_key(&self.name, index));
            }
        }

        stored[position] = document;
        Ok(1)
    }

    fn delete_one(&self, id_field: &str, id: &Value) -> RepoResult<u64> {
        let mut stored = self.documents.write();
        match stored.iter().position(|doc| matches_id(doc, id_field, id)) {
            Some(position) => {
                stored.remove(position);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn find(&self, filter: &Filter, options: &FindOptions) -> RepoResult<Vec<Document>> {
        let stored = self.documents.read();
        let mut result = Vec::new();
        for document in stored.iter() {
            if filter.apply(document)? {
                result.push(document.clone());
            }
        }
        drop(stored);

        options.apply(&mut result);
        Ok(result)
    }

    fn create_index(&self, keys: &IndexKeys, options: &IndexOptions) -> RepoResult<String> {
        if keys.is_empty() {
            log::error!("Cannot create an index without keys on {}", self.name);
            return Err(RepoError::new(
                "Index key specification cannot be empty",
                ErrorKind::IndexingError,
            ));
        }

        let descriptor = IndexDescriptor::new(keys.clone(), options);
        let mut indexes = self.indexes.write();

        if let Some(existing) = indexes.iter().find(|index| index.name() == descriptor.name()) {
            if *existing == descriptor {
                return Ok(descriptor.name().to_string());
            }
            log::error!(
                "Index {} already exists on {} with different options",
                descriptor.name(),
                self.name
            );
            return Err(RepoError::new(
                &format!("Index {} already exists with different options", descriptor.name()),
                ErrorKind::IndexingError,
            ));
        }

        if descriptor.is_unique() {
            let stored = self.documents.read();
            for (position, document) in stored.iter().enumerate() {
                if stored[..position].iter().any(|other| same_key(&descriptor, other, document)) {
                    return Err(duplicate_key(&self.name, &descriptor));
                }
            }
        }

        let name = descriptor.name().to_string();
        indexes.push(descriptor);
        log::debug!("Created index {} on {}", name, self.name);
        Ok(name)
    }
}

/// Id of `document`; documents without one are not keyed.
fn primary_key<'a>(document: &'a Document, id_field: &str) -> Option<&'a Value> {
    get_path(document, id_field).filter(|id| !id.is_null())
}

fn matches_id(document: &Document, id_field: &str, id: &Value) -> bool {
    get_path(document, id_field).is_some_and(|value| values_equal(value, id))
}

fn same_key(index: &IndexDescriptor, left: &Document, right: &Document) -> bool {
    index.keys().fields().iter().all(|(field, _)| {
        match (get_path(left, field), get_path(right, field)) {
            (Some(left), Some(right)) => values_equal(left, right),
            (None, None) => true,
            (Some(value), None) | (None, Some(value)) => value.is_null(),
        }
    })
}

fn duplicate_id(collection: &str, id_field: &str, id: &Value) -> RepoError {
    log::error!("Duplicate {} {} in {}", id_field, id, collection);
    RepoError::new(
        &format!("A document with {} {} already exists in {}", id_field, id, collection),
        ErrorKind::DuplicateKey,
    )
}

fn duplicate_key(collection: &str, index: &IndexDescriptor) -> RepoError {
    log::error!("Duplicate key on index {} of {}", index.name(), collection);
    RepoError::new(
        &format!("Duplicate key violates unique index {} of {}", index.name(), collection),
        ErrorKind::DuplicateKey,
    )
}
