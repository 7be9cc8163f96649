use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::{atomic, Atomic};

/// Error kinds for migratory operations
///
/// This enum represents all possible error types that can occur while resolving
/// and executing migrations. Each error kind describes a specific category of
/// failure, enabling precise error handling.
///
/// # Examples
///
/// ```rust,ignore
/// use migratory::errors::{MigratoryError, ErrorKind, MigratoryResult};
///
/// fn example() -> MigratoryResult<()> {
///     Err(MigratoryError::new("Unable to find migration: 001-init", ErrorKind::MigrationNotFound))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Resolution Errors - raised while turning a request into an execution plan
    /// The migration lacks the configured up/down method
    MethodNotFound,
    /// An explicitly requested migration does not exist in the set
    MigrationNotFound,
    /// A `to` target does not appear among resolvable candidates
    TargetNotFound,

    // Execution Errors - raised while running a plan
    /// The migration's own up/down action failed
    ActionFailure,

    // Storage Errors - raised by the persisted applied-set backend
    /// The backing store cannot be read or written
    StorageError,

    // IO Errors - actively used in file-backed storage
    /// Generic IO error
    IOError,
    /// The file was not found
    FileNotFound,
    /// Permission denied for file operation
    PermissionDenied,
    /// File data is corrupted
    FileCorrupted,

    // Data Encoding Errors - serialization of the applied-set record
    /// Error encoding or decoding data
    EncodingError,

    // Validation Errors - bad options, duplicate names, direction mismatches
    /// Generic validation error
    ValidationError,

    // Event Errors - actively used in event bus operations
    /// Error in event processing
    EventError,

    // Generic/Internal Errors - used as fallback
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::MethodNotFound => write!(f, "Migration method not found"),
            ErrorKind::MigrationNotFound => write!(f, "Migration not found"),
            ErrorKind::TargetNotFound => write!(f, "Target not found"),
            ErrorKind::ActionFailure => write!(f, "Action failure"),
            ErrorKind::StorageError => write!(f, "Storage error"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::FileNotFound => write!(f, "File not found"),
            ErrorKind::PermissionDenied => write!(f, "Permission denied"),
            ErrorKind::FileCorrupted => write!(f, "File corrupted"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::EventError => write!(f, "Event error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom migratory error type.
///
/// `MigratoryError` encapsulates error information including the error message,
/// kind, and optional cause. It supports error chaining and backtraces for
/// debugging.
///
/// # Examples
///
/// ```rust,ignore
/// use migratory::errors::{MigratoryError, ErrorKind};
///
/// // Create a simple error
/// let err = MigratoryError::new("Could not find migration method: up", ErrorKind::MethodNotFound);
///
/// // Create an error with a cause
/// let cause = MigratoryError::new("IO failed", ErrorKind::IOError);
/// let err = MigratoryError::new_with_cause("Failed to rewrite applied set", ErrorKind::StorageError, cause);
/// ```
///
/// # Type alias
///
/// The `MigratoryResult<T>` type alias is equivalent to `Result<T, MigratoryError>`
/// and is used throughout the codebase for operations that can fail.
#[derive(Clone)]
pub struct MigratoryError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<MigratoryError>>,
    backtrace: Atomic<Backtrace>,
}

impl MigratoryError {
    /// Creates a new `MigratoryError` with the specified message and error kind.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the error
    /// * `error_kind` - The category of error
    ///
    /// # Returns
    ///
    /// A new `MigratoryError` instance.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        MigratoryError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `MigratoryError` with a cause error.
    ///
    /// This creates an error chain where the cause error is preserved for debugging.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the error
    /// * `error_type` - The category of error
    /// * `cause` - The underlying error that caused this error
    ///
    /// # Returns
    ///
    /// A new `MigratoryError` instance with the cause error attached.
    pub fn new_with_cause(message: &str, error_type: ErrorKind, cause: MigratoryError) -> Self {
        MigratoryError {
            message: message.to_string(),
            error_kind: error_type,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&Box<MigratoryError>> {
        self.cause.as_ref()
    }
}

impl Display for MigratoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for MigratoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for MigratoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for migratory operations.
///
/// `MigratoryResult<T>` is shorthand for `Result<T, MigratoryError>`.
/// All fallible migratory operations return this type.
pub type MigratoryResult<T> = Result<T, MigratoryError>;

// From trait implementations for automatic error conversion
impl From<std::io::Error> for MigratoryError {
    fn from(err: std::io::Error) -> Self {
        let error_kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            std::io::ErrorKind::AlreadyExists => ErrorKind::FileCorrupted,
            _ => ErrorKind::IOError,
        };
        MigratoryError::new(&format!("IO error: {}", err), error_kind)
    }
}

#[cfg(feature = "json-storage")]
impl From<serde_json::Error> for MigratoryError {
    fn from(err: serde_json::Error) -> Self {
        MigratoryError::new(
            &format!("JSON encoding error: {}", err),
            ErrorKind::EncodingError,
        )
    }
}

impl From<regex::Error> for MigratoryError {
    fn from(err: regex::Error) -> Self {
        MigratoryError::new(
            &format!("Invalid migration pattern: {}", err),
            ErrorKind::ValidationError,
        )
    }
}

// Lets user-written actions bubble arbitrary errors with `?`
impl From<anyhow::Error> for MigratoryError {
    fn from(err: anyhow::Error) -> Self {
        MigratoryError::new(&format!("{}", err), ErrorKind::ActionFailure)
    }
}

impl From<String> for MigratoryError {
    fn from(msg: String) -> Self {
        MigratoryError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for MigratoryError {
    fn from(msg: &str) -> Self {
        MigratoryError::new(msg, ErrorKind::InternalError)
    }
}
