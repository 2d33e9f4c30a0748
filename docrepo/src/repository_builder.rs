use crate::config::{ErrorHandler, RepositoryConfig};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::registry::RepositoryRegistry;
use crate::store::memory::InMemoryConnector;
use crate::store::StoreConnector;
use std::path::Path;
use std::sync::Arc;

/// Builder for a [`RepositoryRegistry`].
///
/// Setters validate eagerly but never fail; the first error is kept and
/// returned from [`RepositoryBuilder::build`]. Without an explicit
/// [`RepositoryBuilder::connector`] an [`InMemoryConnector`] is used.
///
/// ```rust
/// use docrepo::registry::RepositoryRegistry;
///
/// let registry = RepositoryRegistry::builder()
///     .connection_string("memory://catalog")
///     .database_name("catalog")
///     .build()
///     .unwrap();
/// assert_eq!(registry.config().database_name, "catalog");
///
/// let result = RepositoryRegistry::builder().database_name("  ").build();
/// assert!(result.is_err());
/// ```
#[derive(Default)]
pub struct RepositoryBuilder {
    error: Option<RepoError>,
    config: RepositoryConfig,
    connector: Option<Arc<dyn StoreConnector>>,
    error_handler: ErrorHandler,
}

impl RepositoryBuilder {
    pub fn new() -> Self {
        RepositoryBuilder::default()
    }

    pub fn connection_string(mut self, connection_string: &str) -> Self {
        if self.error.is_none() {
            if connection_string.trim().is_empty() {
                self.error = Some(invalid("Connection string cannot be empty"));
            } else {
                self.config.connection_string = connection_string.to_string();
            }
        }
        self
    }

    /// Overrides the database name, `adspace` by default.
    pub fn database_name(mut self, database_name: &str) -> Self {
        if self.error.is_none() {
            if database_name.trim().is_empty() {
                self.error = Some(invalid("Database name cannot be empty"));
            } else {
                self.config.database_name = database_name.to_string();
            }
        }
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: RepositoryConfig) -> Self {
        if self.error.is_none() {
            match config.validate() {
                Ok(()) => self.config = config,
                Err(err) => self.error = Some(err),
            }
        }
        self
    }

    /// Loads the configuration with [`RepositoryConfig::load`].
    pub fn load_config(mut self, config_file: Option<&Path>) -> Self {
        if self.error.is_none() {
            match RepositoryConfig::load(config_file) {
                Ok(config) => self.config = config,
                Err(err) => self.error = Some(err),
            }
        }
        self
    }

    pub fn connector<C: StoreConnector + 'static>(mut self, connector: C) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Strategy applied to every failed operation of every repository.
    pub fn error_handler(mut self, error_handler: ErrorHandler) -> Self {
        self.error_handler = error_handler;
        self
    }

    /// Builds the registry. Nothing is connected until the first repository
    /// is requested.
    pub fn build(self) -> RepoResult<RepositoryRegistry> {
        if let Some(err) = self.error {
            log::error!("Invalid repository configuration: {}", err);
            return Err(err);
        }

        let connector = match self.connector {
            Some(connector) => connector,
            None => Arc::new(InMemoryConnector::new()),
        };
        log::debug!(
            "Built repository registry for {} / {}",
            self.config.connection_string,
            self.config.database_name
        );
        Ok(RepositoryRegistry::new(self.config, connector, self.error_handler))
    }
}

fn invalid(message: &str) -> RepoError {
    RepoError::new(message, ErrorKind::InvalidConfiguration)
}
