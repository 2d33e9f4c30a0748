use crate::errors::RepoResult;
use crate::filter::{all, Filter};
use crate::find_options::{FindOptions, SortOrder};
use crate::repository::{Entity, TypedRepository};

/// A lazy, composable query over one repository.
///
/// Building a query never touches the store; [`Query::fetch`],
/// [`Query::first`] and [`Query::count`] each run it once against the
/// current contents of the collection.
///
/// ```ignore
/// let cheapest = widgets
///     .queryable()
///     .filter(field("qty").gt(0))
///     .sort_by("price", SortOrder::Ascending)
///     .limit(10)
///     .fetch()?;
/// ```
pub struct Query<T: Entity> {
    repository: TypedRepository<T>,
    filter: Filter,
    find_options: FindOptions,
}

impl<T: Entity> Clone for Query<T> {
    fn clone(&self) -> Self {
        Query {
            repository: self.repository.clone(),
            filter: self.filter.clone(),
            find_options: self.find_options.clone(),
        }
    }
}

impl<T: Entity> Query<T> {
    pub(crate) fn new(repository: TypedRepository<T>) -> Self {
        Query {
            repository,
            filter: all(),
            find_options: FindOptions::new(),
        }
    }

    /// Narrows the query; successive filters are combined with AND.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = self.filter.and(filter);
        self
    }

    /// Same as [`Query::filter`].
    pub fn and(self, filter: Filter) -> Self {
        self.filter(filter)
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.find_options = self.find_options.skip(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.find_options = self.find_options.limit(limit);
        self
    }

    /// Adds a sort key. Earlier keys take precedence.
    pub fn sort_by(mut self, field_name: &str, sort_order: SortOrder) -> Self {
        self.find_options = self.find_options.sort_by(field_name, sort_order);
        self
    }

    pub fn current_filter(&self) -> &Filter {
        &self.filter
    }

    pub fn find_options(&self) -> &FindOptions {
        &self.find_options
    }

    /// Runs the query and decodes every matching document.
    pub fn fetch(&self) -> RepoResult<Vec<T>> {
        self.repository.fetch(&self.filter, &self.find_options)
    }

    /// Runs the query and returns its first result.
    pub fn first(&self) -> RepoResult<Option<T>> {
        let options = self.find_options.clone().limit(1);
        let mut found = self.repository.fetch(&self.filter, &options)?;
        Ok(if found.is_empty() { None } else { Some(found.swap_remove(0)) })
    }

    /// Number of results `fetch` would return.
    pub fn count(&self) -> RepoResult<u64> {
        let matching = self.repository.count_matching(&self.filter)?;
        let skipped = matching.saturating_sub(self.find_options.skip_count().unwrap_or(0));
        Ok(match self.find_options.limit_count() {
            Some(limit) => skipped.min(limit),
            None => skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ErrorHandler;
    use crate::filter::field;
    use crate::store::memory::InMemoryStore;
    use crate::store::StoreClientProvider;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    struct Reading {
        id: u32,
        sensor: String,
        value: f64,
    }

    impl Entity for Reading {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.id
        }
    }

    fn seeded() -> TypedRepository<Reading> {
        let collection = InMemoryStore::new()
            .database("test")
            .unwrap()
            .collection("Reading")
            .unwrap();
        let repository = TypedRepository::open(collection, ErrorHandler::default()).unwrap();
        let readings = (1..=6)
            .map(|id| Reading {
                id,
                sensor: if id % 2 == 0 { "even".into() } else { "odd".into() },
                value: id as f64 * 1.5,
            })
            .collect();
        repository.add_many(readings).unwrap();
        repository
    }

    #[test]
    fn test_filters_are_combined() {
        let query = seeded()
            .queryable()
            .filter(field("sensor").eq("even"))
            .and(field("value").gt(4.0));
        let ids: Vec<_> = query.fetch().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4, 6]);
        assert_eq!(
            query.current_filter(),
            &field("sensor").eq("even").and(field("value").gt(4.0))
        );
    }

    #[test]
    fn test_skip_and_limit_apply_after_sort() {
        let query = seeded()
            .queryable()
            .sort_by("value", SortOrder::Descending)
            .skip(1)
            .limit(2);
        let ids: Vec<_> = query.fetch().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5, 4]);
        assert_eq!(query.count().unwrap(), 2);
    }

    #[test]
    fn test_count_respects_skip_past_end() {
        let query = seeded().queryable().skip(10);
        assert_eq!(query.count().unwrap(), 0);
        assert!(query.fetch().unwrap().is_empty());
        assert_eq!(query.first().unwrap(), None);
    }

    #[test]
    fn test_query_sees_later_writes() {
        let repository = seeded();
        let query = repository.queryable().filter(field("sensor").eq("new"));
        assert_eq!(query.count().unwrap(), 0);
        repository
            .add(Reading {
                id: 7,
                sensor: "new".into(),
                value: 0.5,
            })
            .unwrap();
        assert_eq!(query.first().unwrap().map(|r| r.id), Some(7));
    }
}
