//! Error type shared by the cleaner, the upload store and the request handler.
//!
//! Every failure the library can produce is one variant of [`PrepError`]. The
//! request handler turns a variant into a transport status with
//! [`PrepError::status_code`], so callers never have to parse messages:
//!
//! ```
//! use chargeprep::error::PrepError;
//!
//! let err = PrepError::InputNotFound("upload 42".to_owned());
//! assert_eq!(err.status_code(), 404);
//! assert_eq!(err.to_string(), "Input not found: upload 42");
//! ```
//!
//! The `ResultExt` trait adds `.context()` to any result whose error converts
//! into [`PrepError`]. Unlike `anyhow`, the variant survives the extra context:
//!
//! ```
//! use chargeprep::error::{PrepError, Result, ResultExt as _};
//!
//! fn read_upload() -> Result<String> {
//!     let err: std::result::Result<String, PrepError> =
//!         Err(PrepError::MissingColumn("created".to_owned()));
//!     err.context("Failed to filter rows")
//! }
//!
//! assert!(matches!(read_upload(), Err(PrepError::MissingColumn(_))));
//! ```

use std::fmt;

/// Main error type for chargeprep operations.
#[derive(Debug)]
pub enum PrepError {
    /// Upload identifier or stored object does not resolve
    InputNotFound(String),

    /// Byte stream is not delimited tabular data, or a request argument is invalid
    MalformedInput(String),

    /// A column the pipeline depends on is absent
    MissingColumn(String),

    /// Any other failure while classifying or encoding
    ProcessingFailure(String),

    /// Filesystem errors from the local store
    Io(std::io::Error),

    /// Configuration file could not be read or parsed
    Config(String),
}

impl PrepError {
    /// HTTP status a caller should answer with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InputNotFound(_) => 404,
            Self::MalformedInput(_) => 400,
            Self::MissingColumn(_) => 422,
            Self::ProcessingFailure(_) | Self::Io(_) | Self::Config(_) => 500,
        }
    }

    /// Copy of this error with `prefix` prepended to its message.
    fn with_prefix(self, prefix: &str) -> Self {
        match self {
            Self::InputNotFound(msg) => Self::InputNotFound(format!("{prefix}: {msg}")),
            Self::MalformedInput(msg) => Self::MalformedInput(format!("{prefix}: {msg}")),
            Self::ProcessingFailure(msg) => Self::ProcessingFailure(format!("{prefix}: {msg}")),
            Self::Config(msg) => Self::Config(format!("{prefix}: {msg}")),
            // The column name is the payload callers match on; keep it bare.
            Self::MissingColumn(name) => Self::MissingColumn(name),
            Self::Io(e) => Self::Io(std::io::Error::new(e.kind(), format!("{prefix}: {e}"))),
        }
    }
}

impl fmt::Display for PrepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputNotFound(msg) => write!(f, "Input not found: {msg}"),
            Self::MalformedInput(msg) => write!(f, "Malformed input: {msg}"),
            Self::MissingColumn(name) => write!(f, "Missing expected column '{name}'"),
            Self::ProcessingFailure(msg) => write!(f, "Processing failure: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for PrepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PrepError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for PrepError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for PrepError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::ProcessingFailure(err.to_string())
    }
}

/// Result type alias for chargeprep operations.
pub type Result<T> = std::result::Result<T, PrepError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<PrepError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_prefix(&msg.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_prefix(&f()))
    }
}
