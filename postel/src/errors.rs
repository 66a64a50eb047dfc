use backtrace::Backtrace;
use postel_spatial::SpatialError;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for Postel operations
///
/// Each kind names one category of failure so callers (typically a console
/// dispatching user commands) can match on it and print a one-line rejection.
///
/// # Examples
///
/// ```rust
/// use postel::errors::{ErrorKind, PostelError, PostelResult};
///
/// fn example() -> PostelResult<()> {
///     Err(PostelError::new("Node 7 not found", ErrorKind::NotFound))
/// }
/// assert_eq!(example().unwrap_err().kind(), &ErrorKind::NotFound);
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Request Errors - returned for bad caller input
    /// The coordinate lies outside the configured plane
    OutOfBounds,
    /// The requested node does not exist
    NotFound,
    /// A proximity query was issued against an empty topology
    Empty,

    // Identity Errors - allocator and registry consistency
    /// An id was inserted twice; indicates a bug in id allocation
    DuplicateId,
    /// The id counter has been used up; no further nodes can be added
    IdentitySpaceExhausted,

    // Lifecycle Errors
    /// The engine has begun shutting down
    EngineShuttingDown,

    // Configuration Errors
    /// A configuration value was rejected or changed after initialization
    InvalidConfiguration,

    // Event Errors
    /// Error in event processing
    EventError,

    // Generic/Internal Errors - used as fallback
    /// Internal error (usually indicates a bug, such as registry and index disagreeing)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::OutOfBounds => write!(f, "Out of bounds"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::Empty => write!(f, "Empty"),
            ErrorKind::DuplicateId => write!(f, "Duplicate id"),
            ErrorKind::IdentitySpaceExhausted => write!(f, "Identity space exhausted"),
            ErrorKind::EngineShuttingDown => write!(f, "Engine shutting down"),
            ErrorKind::InvalidConfiguration => write!(f, "Invalid configuration"),
            ErrorKind::EventError => write!(f, "Event error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom Postel error type.
///
/// `PostelError` carries a message, a kind and an optional cause. It captures
/// a backtrace on creation for debugging.
///
/// # Examples
///
/// ```rust
/// use postel::errors::{ErrorKind, PostelError};
///
/// let cause = PostelError::new("Key 3 is not indexed", ErrorKind::NotFound);
/// let err = PostelError::new_with_cause(
///     "Registry and index disagree on node 3",
///     ErrorKind::InternalError,
///     cause,
/// );
/// assert!(err.cause().is_some());
/// ```
#[derive(Clone)]
pub struct PostelError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<PostelError>>,
    backtrace: Atomic<Backtrace>,
}

impl PostelError {
    /// Creates a new `PostelError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        PostelError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `PostelError` with a cause error.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: PostelError) -> Self {
        PostelError {
            message: message.to_string(),
            error_kind,
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

    pub fn cause(&self) -> Option<&PostelError> {
        self.cause.as_deref()
    }
}

impl Display for PostelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for PostelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for PostelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for Postel operations.
pub type PostelResult<T> = Result<T, PostelError>;

impl From<SpatialError> for PostelError {
    fn from(err: SpatialError) -> Self {
        match err {
            SpatialError::DuplicateKey(key) => PostelError::new(
                &format!("Spatial index already holds node {}", key),
                ErrorKind::DuplicateId,
            ),
            SpatialError::KeyNotFound(key) => PostelError::new(
                &format!("Spatial index does not hold node {}", key),
                ErrorKind::NotFound,
            ),
        }
    }
}
