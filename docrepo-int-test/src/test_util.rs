use docrepo::config::ErrorHandler;
use docrepo::errors::RepoResult;
use docrepo::registry::RepositoryRegistry;
use docrepo::store::memory::InMemoryConnector;
use std::backtrace::Backtrace;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

/// Runs `test` between `before` and `after`.
///
/// `after` also runs when the test fails or panics. Any failure ends in a
/// panic carrying the error and, when enabled, a backtrace.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> RepoResult<()>,
    B: Fn() -> RepoResult<TestContext>,
    A: Fn(TestContext) -> RepoResult<()>,
{
    let start_time = Instant::now();
    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let test_ctx = ctx.clone();
    let result = std::panic::catch_unwind(AssertUnwindSafe(move || test(test_ctx)));
    let after_result = after(ctx);
    let elapsed = start_time.elapsed();

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            let backtrace = Backtrace::capture().to_string();
            eprintln!("\n==================== TEST FAILED ({:?}) ====================", elapsed);
            if !backtrace.contains("disabled") {
                eprintln!("Backtrace:\n{}", backtrace);
            }
            panic!("Test failed: {:?}", e);
        }
        Err(panic_err) => {
            let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            panic!("Test panicked after {:?}: {}", elapsed, err_msg);
        }
    }

    if let Err(e) = after_result {
        panic!("After run failed: {:?}", e);
    }
}

/// A registry over a private in-memory store.
#[derive(Clone)]
pub struct TestContext {
    connection_string: String,
    connector: InMemoryConnector,
    registry: RepositoryRegistry,
}

impl TestContext {
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    pub fn connector(&self) -> InMemoryConnector {
        self.connector.clone()
    }

    pub fn registry(&self) -> RepositoryRegistry {
        self.registry.clone()
    }
}

/// Unique `memory://` connection string.
pub fn random_connection_string() -> String {
    format!("memory://{}", uuid::Uuid::new_v4())
}

pub fn create_test_context() -> RepoResult<TestContext> {
    create_test_context_with(ErrorHandler::default())
}

pub fn create_test_context_with(error_handler: ErrorHandler) -> RepoResult<TestContext> {
    let connection_string = random_connection_string();
    let connector = InMemoryConnector::new();
    let registry = RepositoryRegistry::builder()
        .connection_string(&connection_string)
        .database_name(&format!("test_{}", uuid::Uuid::new_v4().simple()))
        .connector(connector.clone())
        .error_handler(error_handler)
        .build()?;

    Ok(TestContext {
        connection_string,
        connector,
        registry,
    })
}

pub fn cleanup(ctx: TestContext) -> RepoResult<()> {
    ctx.connector.drop_store(&ctx.connection_string);
    Ok(())
}
