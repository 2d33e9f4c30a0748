use docrepo::errors::{ErrorKind, RepoError, RepoResult};
use docrepo::registry::RepositoryRegistry;
use docrepo::repository::TypedRepository;
use docrepo::store::memory::InMemoryConnector;
use docrepo::store::{
    Collection, Database, DatabaseProvider, StoreClient, StoreClientProvider, StoreConnector,
};
use docrepo_derive::Entity;
use docrepo_int_test::test_util::{cleanup, create_test_context, random_connection_string, run_test};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[ctor::ctor]
fn init() {
    colog::init();
}

#[derive(Serialize, Deserialize, Entity, Debug, Clone, PartialEq)]
#[entity(collection = "accounts")]
pub struct Account {
    id: String,
    owner: String,
}

#[derive(Serialize, Deserialize, Entity, Debug, Clone, PartialEq)]
pub struct Invoice {
    id: u64,
    total: f64,
}

#[derive(Default)]
struct Counters {
    connects: AtomicUsize,
    collection_opens: AtomicUsize,
}

/// Counts connects and collection opens, delaying each open so concurrent
/// first calls overlap.
struct CountingConnector {
    delegate: InMemoryConnector,
    counters: Arc<Counters>,
}

struct CountingClient {
    delegate: StoreClient,
    counters: Arc<Counters>,
}

struct CountingDatabase {
    delegate: Database,
    counters: Arc<Counters>,
}

impl StoreConnector for CountingConnector {
    fn connect(&self, connection_string: &str) -> RepoResult<StoreClient> {
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        Ok(StoreClient::new(CountingClient {
            delegate: self.delegate.connect(connection_string)?,
            counters: Arc::clone(&self.counters),
        }))
    }
}

impl StoreClientProvider for CountingClient {
    fn database(&self, name: &str) -> RepoResult<Database> {
        Ok(Database::new(CountingDatabase {
            delegate: self.delegate.database(name)?,
            counters: Arc::clone(&self.counters),
        }))
    }
}

impl DatabaseProvider for CountingDatabase {
    fn name(&self) -> &str {
        self.delegate.name()
    }

    fn collection(&self, name: &str) -> RepoResult<Collection> {
        self.counters.collection_opens.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        self.delegate.collection(name)
    }
}

fn counting_registry() -> RepoResult<(RepositoryRegistry, Arc<Counters>)> {
    let counters = Arc::new(Counters::default());
    let registry = RepositoryRegistry::builder()
        .connection_string(&random_connection_string())
        .connector(CountingConnector {
            delegate: InMemoryConnector::new(),
            counters: Arc::clone(&counters),
        })
        .build()?;
    Ok((registry, counters))
}

#[test]
fn test_concurrent_first_access_opens_once() -> RepoResult<()> {
    let (registry, counters) = counting_registry()?;
    let num_threads = 16;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let registry = registry.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.instance_for::<Account>()
            })
        })
        .collect();

    let mut repositories: Vec<TypedRepository<Account>> = Vec::new();
    for handle in handles {
        let result = handle
            .join()
            .map_err(|_| RepoError::new("worker panicked", ErrorKind::InternalError))?;
        repositories.push(result?);
    }

    assert_eq!(repositories.len(), num_threads);
    assert!(repositories.iter().all(|repo| repo.ptr_eq(&repositories[0])));
    assert_eq!(counters.connects.load(Ordering::SeqCst), 1);
    assert_eq!(counters.collection_opens.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn test_concurrent_access_to_different_types() -> RepoResult<()> {
    let (registry, counters) = counting_registry()?;
    let num_threads = 8;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|i| {
            let registry = registry.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || -> RepoResult<()> {
                barrier.wait();
                if i % 2 == 0 {
                    registry.instance_for::<Account>()?;
                } else {
                    registry.instance_for::<Invoice>()?;
                }
                Ok(())
            })
        })
        .collect();

    for handle in handles {
        handle
            .join()
            .map_err(|_| RepoError::new("worker panicked", ErrorKind::InternalError))??;
    }

    assert!(registry.contains::<Account>());
    assert!(registry.contains::<Invoice>());
    assert_eq!(counters.connects.load(Ordering::SeqCst), 1);
    assert_eq!(counters.collection_opens.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn test_concurrent_writes_through_singleton() {
    run_test(
        create_test_context,
        |ctx| {
            let num_threads = 5;
            let inserts_per_thread = 10;
            let barrier = Arc::new(Barrier::new(num_threads));

            let handles: Vec<_> = (0..num_threads)
                .map(|thread_id| {
                    let registry = ctx.registry();
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || -> RepoResult<()> {
                        barrier.wait();
                        let invoices = registry.instance_for::<Invoice>()?;
                        for i in 0..inserts_per_thread {
                            invoices.add(Invoice {
                                id: (thread_id * inserts_per_thread + i) as u64,
                                total: i as f64,
                            })?;
                        }
                        Ok(())
                    })
                })
                .collect();

            for handle in handles {
                handle
                    .join()
                    .map_err(|_| RepoError::new("worker panicked", ErrorKind::InternalError))??;
            }

            let invoices = ctx.registry().instance_for::<Invoice>()?;
            assert_eq!(invoices.get_all()?.len(), num_threads * inserts_per_thread);
            assert_eq!(invoices.collection_name(), "Invoice");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_blank_configuration_is_rejected() {
    let result = RepositoryRegistry::builder().connection_string("   ").build();
    let err = result.err().map(|e| e.kind().clone());
    assert_eq!(err, Some(ErrorKind::InvalidConfiguration));
}

#[test]
fn test_unsupported_connection_string_fails_on_first_use() -> RepoResult<()> {
    let registry = RepositoryRegistry::builder()
        .connection_string("mongodb://localhost:27017")
        .build()?;
    let err = registry.instance_for::<Account>().err().map(|e| e.kind().clone());
    assert_eq!(err, Some(ErrorKind::ConnectionError));
    assert!(!registry.contains::<Account>());
    Ok(())
}
