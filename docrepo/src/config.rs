//! Connection settings and the error handling strategy.

use crate::errors::{ErrorKind, RepoError, RepoResult};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use std::path::Path;
use std::sync::Arc;

/// Database used when none is configured.
pub const DEFAULT_DATABASE_NAME: &str = "adspace";

/// Connection string used when none is configured.
pub const DEFAULT_CONNECTION_STRING: &str = "memory://default";

/// Prefix of environment variables read by [`RepositoryConfig::load`].
pub const ENV_PREFIX: &str = "DOCREPO_";

/// Where repositories connect to.
///
/// Read once by the composition root, either built in code or loaded with
/// [`RepositoryConfig::load`] from defaults, an optional TOML file and
/// `DOCREPO_`-prefixed environment variables (later sources win):
///
/// ```toml
/// connection_string = "memory://catalog"
/// database_name = "catalog"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub connection_string: String,
    pub database_name: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        RepositoryConfig {
            connection_string: DEFAULT_CONNECTION_STRING.to_string(),
            database_name: DEFAULT_DATABASE_NAME.to_string(),
        }
    }
}

impl RepositoryConfig {
    pub fn new(connection_string: &str, database_name: &str) -> Self {
        RepositoryConfig {
            connection_string: connection_string.to_string(),
            database_name: database_name.to_string(),
        }
    }

    /// Loads the configuration from defaults, `config_file` (skipped when
    /// absent) and the environment.
    pub fn load(config_file: Option<&Path>) -> RepoResult<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(RepositoryConfig::default()));
        if let Some(path) = config_file {
            if path.exists() {
                log::debug!("Loading repository configuration from {}", path.display());
                figment = figment.merge(Toml::file(path));
            } else {
                log::warn!("Configuration file {} not found, skipping", path.display());
            }
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX));
        RepositoryConfig::from_figment(&figment)
    }

    /// Extracts and validates a configuration from a prepared figment.
    pub fn from_figment(figment: &Figment) -> RepoResult<Self> {
        let config: RepositoryConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Fails with `InvalidConfiguration` when a value is blank.
    pub fn validate(&self) -> RepoResult<()> {
        if self.connection_string.trim().is_empty() {
            log::error!("Connection string cannot be empty");
            return Err(RepoError::new(
                "Connection string cannot be empty",
                ErrorKind::InvalidConfiguration,
            ));
        }
        if self.database_name.trim().is_empty() {
            log::error!("Database name cannot be empty");
            return Err(RepoError::new(
                "Database name cannot be empty",
                ErrorKind::InvalidConfiguration,
            ));
        }
        Ok(())
    }
}

/// Repository operation reported to an [`ErrorHandler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Open,
    Add,
    AddMany,
    Update,
    Delete,
    GetAll,
    Find,
    Query,
    CreateIndex,
    ListIndexes,
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::Open => "open",
            Operation::Add => "add",
            Operation::AddMany => "add_many",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::GetAll => "get_all",
            Operation::Find => "find",
            Operation::Query => "query",
            Operation::CreateIndex => "create_index",
            Operation::ListIndexes => "list_indexes",
        };
        write!(f, "{}", name)
    }
}

/// Strategy applied to every failed repository operation.
///
/// Receives the operation and the error and returns the error handed to the
/// caller. The default propagates the error unchanged. Handlers can
/// translate, enrich or record failures; they cannot turn them into
/// successes, so callers always see a typed result.
///
/// ```rust
/// use docrepo::config::{ErrorHandler, Operation};
/// use docrepo::errors::{ErrorKind, RepoError};
///
/// let handler = ErrorHandler::new(|operation, err| {
///     RepoError::new_with_cause(&format!("{} failed", operation), ErrorKind::StoreError, err)
/// });
/// let err = handler.handle(Operation::Add, RepoError::new("boom", ErrorKind::InternalError));
/// assert_eq!(err.message(), "add failed");
/// ```
#[derive(Clone)]
pub struct ErrorHandler {
    inner: Arc<dyn Fn(Operation, RepoError) -> RepoError + Send + Sync>,
}

impl ErrorHandler {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(Operation, RepoError) -> RepoError + Send + Sync + 'static,
    {
        ErrorHandler {
            inner: Arc::new(handler),
        }
    }

    /// Hands errors back unchanged.
    pub fn propagate() -> Self {
        ErrorHandler::new(|_, err| err)
    }

    pub fn handle(&self, operation: Operation, error: RepoError) -> RepoError {
        (self.inner)(operation, error)
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        ErrorHandler::propagate()
    }
}

impl Debug for ErrorHandler {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ErrorHandler")
    }
}
