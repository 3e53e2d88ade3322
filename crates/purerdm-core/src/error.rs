//! Error types for the purerdm crates.
//!
//! This module provides a unified error type with explicit variants for
//! transport, remote API, persisted state, configuration, and input
//! validation errors.

use std::fmt;
use thiserror::Error;

/// The unified error type for purerdm operations.
///
/// Missing source fields are deliberately *not* an error anywhere in the
/// pipeline; they surface as `Option::None` from the field extractor.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A non-success response from the Pure or RDM REST API.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Errors reading or writing the persisted synchronization state.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Malformed or missing reference data; fatal at startup.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input validation errors (invalid uuid, recid, URL format).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// A non-success HTTP response from a remote API.
///
/// Status 429 is carried through this type as well; the HTTP layer has
/// already served the cooldown by the time the caller sees it.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// Response body, when one was readable.
    pub body: Option<String>,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(status: u16, body: Option<String>) -> Self {
        Self { status, body }
    }

    /// True for the backpressure status (HTTP 429).
    pub fn is_backpressure(&self) -> bool {
        self.status == 429
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref body) = self.body {
            write!(f, ": {}", body)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Errors from the persisted local state files.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying filesystem failure.
    #[error("io error: {message}")]
    Io { message: String },

    /// A line in a state file does not have the expected shape.
    #[error("malformed entry in {file}: {line}")]
    MalformedEntry { file: String, line: String },
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io {
            message: err.to_string(),
        }
    }
}

/// Configuration and reference-data errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required reference file is missing.
    #[error("missing reference file: {path}")]
    MissingFile { path: String },

    /// A reference file could not be parsed.
    #[error("malformed reference file {path}: {reason}")]
    Malformed { path: String, reason: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid source record identity.
    #[error("invalid record uuid '{value}': {reason}")]
    RecordUuid { value: String, reason: String },

    /// Invalid target record identifier.
    #[error("invalid recid '{value}': {reason}")]
    Recid { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
