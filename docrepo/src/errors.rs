use backtrace::Backtrace;
use serde::{de, ser};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

/// Error kinds for repository operations.
///
/// `InvalidConfiguration` and `InvalidId` are raised by this crate before the
/// store is touched; every other kind describes a failure reported by, or on
/// the way to, the underlying document store.
///
/// # Examples
///
/// ```rust
/// use docrepo::errors::{ErrorKind, RepoError, RepoResult};
///
/// fn example() -> RepoResult<()> {
///     Err(RepoError::new("collection name cannot be empty", ErrorKind::InvalidConfiguration))
/// }
///
/// assert!(example().is_err());
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// A declaration or configuration value is invalid (e.g. an empty collection name)
    InvalidConfiguration,
    /// The id of an entity is missing or empty
    InvalidId,
    /// Generic failure of the underlying store
    StoreError,
    /// Connecting to the store or opening a database/collection failed
    ConnectionError,
    /// Listing or creating an index failed
    IndexingError,
    /// A unique index rejected a write
    DuplicateKey,
    /// An entity could not be converted to or from a document
    ObjectMappingError,
    /// A filter could not be evaluated
    FilterError,
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl ErrorKind {
    /// Returns `true` for every kind that originates in the document store.
    pub fn is_store_error(&self) -> bool {
        !matches!(self, ErrorKind::InvalidConfiguration | ErrorKind::InvalidId)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidConfiguration => write!(f, "Invalid configuration"),
            ErrorKind::InvalidId => write!(f, "Invalid ID"),
            ErrorKind::StoreError => write!(f, "Store error"),
            ErrorKind::ConnectionError => write!(f, "Connection error"),
            ErrorKind::IndexingError => write!(f, "Indexing error"),
            ErrorKind::DuplicateKey => write!(f, "Duplicate key"),
            ErrorKind::ObjectMappingError => write!(f, "Object mapping error"),
            ErrorKind::FilterError => write!(f, "Filter error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Error type of every fallible operation in this crate.
///
/// Carries a message, a kind, an optional cause and the backtrace captured at
/// construction.
///
/// # Examples
///
/// ```rust
/// use docrepo::errors::{ErrorKind, RepoError};
///
/// let cause = RepoError::new("connection reset", ErrorKind::ConnectionError);
/// let err = RepoError::new_with_cause("insert failed", ErrorKind::StoreError, cause);
/// assert_eq!(err.kind(), &ErrorKind::StoreError);
/// assert!(err.cause().is_some());
/// ```
#[derive(Clone)]
pub struct RepoError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<RepoError>>,
    backtrace: Backtrace,
}

impl RepoError {
    /// Creates a new error with the specified message and kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        RepoError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Backtrace::new(),
        }
    }

    /// Creates a new error wrapping `cause`.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: RepoError) -> Self {
        RepoError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Backtrace::new(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&RepoError> {
        self.cause.as_deref()
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}: {}\nCaused by: {:?}", self.error_kind, self.message, cause),
            None => write!(f, "{}: {}\n{:?}", self.error_kind, self.message, self.backtrace),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// `Result<T, RepoError>`.
pub type RepoResult<T> = Result<T, RepoError>;

impl de::Error for RepoError {
    fn custom<T: Display>(msg: T) -> Self {
        RepoError::new(&msg.to_string(), ErrorKind::ObjectMappingError)
    }
}

impl ser::Error for RepoError {
    fn custom<T: Display>(msg: T) -> Self {
        RepoError::new(&msg.to_string(), ErrorKind::ObjectMappingError)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(err: serde_json::Error) -> Self {
        RepoError::new(
            &format!("Document conversion error: {}", err),
            ErrorKind::ObjectMappingError,
        )
    }
}

impl From<regex::Error> for RepoError {
    fn from(err: regex::Error) -> Self {
        RepoError::new(&format!("Invalid regex: {}", err), ErrorKind::FilterError)
    }
}

impl From<figment::Error> for RepoError {
    fn from(err: figment::Error) -> Self {
        RepoError::new(
            &format!("Failed to load configuration: {}", err),
            ErrorKind::InvalidConfiguration,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_error_new_creates_error() {
        let error = RepoError::new("An error occurred", ErrorKind::StoreError);
        assert_eq!(error.message(), "An error occurred");
        assert_eq!(error.kind(), &ErrorKind::StoreError);
        assert!(error.cause().is_none());
        assert!(error.source().is_none());
    }

    #[test]
    fn repo_error_with_cause_exposes_source() {
        let cause = RepoError::new("socket closed", ErrorKind::ConnectionError);
        let error = RepoError::new_with_cause("insert failed", ErrorKind::StoreError, cause);
        assert_eq!(error.cause().map(|c| c.kind()), Some(&ErrorKind::ConnectionError));
        assert_eq!(error.source().map(|s| s.to_string()), Some("socket closed".to_string()));
    }

    #[test]
    fn debug_output_includes_cause_chain() {
        let cause = RepoError::new("socket closed", ErrorKind::ConnectionError);
        let error = RepoError::new_with_cause("insert failed", ErrorKind::StoreError, cause);
        let debug = format!("{:?}", error);
        assert!(debug.contains("insert failed"));
        assert!(debug.contains("Caused by"));
        assert!(debug.contains("socket closed"));
    }

    #[test]
    fn store_error_classification() {
        assert!(!ErrorKind::InvalidConfiguration.is_store_error());
        assert!(!ErrorKind::InvalidId.is_store_error());
        assert!(ErrorKind::StoreError.is_store_error());
        assert!(ErrorKind::DuplicateKey.is_store_error());
        assert!(ErrorKind::IndexingError.is_store_error());
    }

    #[test]
    fn serde_json_error_maps_to_object_mapping() {
        let err = serde_json::from_str::<u32>("\"not a number\"").unwrap_err();
        let error: RepoError = err.into();
        assert_eq!(error.kind(), &ErrorKind::ObjectMappingError);
    }

    #[test]
    fn regex_error_maps_to_filter_error() {
        let err = regex::Regex::new("(unclosed").unwrap_err();
        let error: RepoError = err.into();
        assert_eq!(error.kind(), &ErrorKind::FilterError);
    }
}
