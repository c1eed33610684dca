//! Unified application error types for ClassHub.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. Reservation rejections (capacity,
//! duplicate holder, ownership, temporal validity) are ordinary error
//! kinds so that callers can branch on [`ErrorKind`] without unwrapping
//! nested enums.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found, is inactive, or is no
    /// longer bookable.
    NotFound,
    /// The caller does not own the resource it is trying to mutate.
    Forbidden,
    /// Input validation failed.
    Validation,
    /// The session has no remaining spots.
    CapacityExceeded,
    /// The member already holds a confirmed booking for this session.
    AlreadyReserved,
    /// The booking is already cancelled (or otherwise finalized).
    AlreadyCancelled,
    /// The session has already taken place; its bookings are immutable.
    PastSession,
    /// The session lock could not be acquired within the deadline.
    /// The only kind a caller may safely retry.
    Busy,
    /// A conflicting state transition was attempted.
    Conflict,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Whether a caller may retry the failed operation as-is.
    ///
    /// Only lock contention is transient; every other kind reports a
    /// violated precondition or a genuine fault.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Forbidden => write!(f, "FORBIDDEN"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::CapacityExceeded => write!(f, "CAPACITY_EXCEEDED"),
            Self::AlreadyReserved => write!(f, "ALREADY_RESERVED"),
            Self::AlreadyCancelled => write!(f, "ALREADY_CANCELLED"),
            Self::PastSession => write!(f, "PAST_SESSION"),
            Self::Busy => write!(f, "BUSY"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout ClassHub.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire application boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an ownership-violation error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a capacity-exceeded error.
    pub fn capacity_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CapacityExceeded, message)
    }

    /// Create an already-reserved error.
    pub fn already_reserved(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyReserved, message)
    }

    /// Create an already-cancelled error.
    pub fn already_cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyCancelled, message)
    }

    /// Create a past-session error.
    pub fn past_session(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PastSession, message)
    }

    /// Create a busy (lock contention) error.
    pub fn busy(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Busy, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether a caller may retry the failed operation as-is.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
