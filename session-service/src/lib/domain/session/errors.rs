use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Email is required")]
    Missing,

    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for DisplayName validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DisplayNameError {
    #[error("Name is required")]
    Missing,

    #[error("Name too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },
}

/// Error for Password policy failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password is required")]
    Missing,

    #[error("Password too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },
}

/// Field-level validation failures, keyed by request field name.
///
/// Every failing field is collected so callers can report them all at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed rule for a field.
    pub fn add(&mut self, field: &str, key: &str) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(key.to_string());
    }

    /// Unwrap a validation result, recording the failure under `field`.
    ///
    /// # Returns
    /// The validated value, or `None` when the rule failed
    pub fn check<T, E>(&mut self, field: &str, result: Result<T, E>) -> Option<T>
    where
        E: ValidationFailure,
    {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.add(field, e.key());
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// A value-object error that can be reported as a validation key.
pub trait ValidationFailure {
    fn key(&self) -> &'static str;
}

impl ValidationFailure for EmailError {
    fn key(&self) -> &'static str {
        match self {
            EmailError::Missing => "validation.email.required",
            EmailError::InvalidFormat(_) => "validation.email.email",
        }
    }
}

impl ValidationFailure for DisplayNameError {
    fn key(&self) -> &'static str {
        match self {
            DisplayNameError::Missing => "validation.name.required",
            DisplayNameError::TooLong { .. } => "validation.name.max",
        }
    }
}

impl ValidationFailure for PasswordPolicyError {
    fn key(&self) -> &'static str {
        match self {
            PasswordPolicyError::Missing => "validation.password.required",
            PasswordPolicyError::TooShort { .. } => "validation.password.min",
        }
    }
}

/// Error surfaced by persistence adapters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("Referenced owner does not exist")]
    MissingOwner,

    #[error("Database error: {0}")]
    Database(String),
}

/// Error for refresh token issuance and rotation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshTokenError {
    #[error("Refresh token is invalid, expired or revoked")]
    InvalidToken,

    #[error("Refresh token owner does not exist")]
    UnknownUser,

    #[error("Refresh token generation failed: {0}")]
    Generation(String),

    #[error("Refresh token collided {attempts} times in a row")]
    CollisionsExhausted { attempts: usize },

    #[error("Refresh token persistence failed: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Error for event publishing operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EventPublisherError {
    #[error("Event queue is full")]
    QueueFull,

    #[error("Event consumer has shut down")]
    Closed,
}

/// Severity class of a session error, mapped to a transport status by the
/// inbound adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    BadRequest,
    Unauthorized,
    NotFound,
    Conflict,
    Internal,
}

/// Top-level error for all session operations.
///
/// Each variant carries a stable key and a public message; `Internal`
/// keeps its detail for logs only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SessionError {
    pub const INTERNAL_MESSAGE: &'static str = "Something went wrong";

    pub fn key(&self) -> &'static str {
        match self {
            SessionError::Validation(_) => "validation.failed",
            SessionError::UserAlreadyExists => "auth.user_exists",
            SessionError::InvalidCredentials => "auth.invalid_credentials",
            SessionError::InvalidToken => "auth.invalid_token",
            SessionError::UserNotFound => "auth.user_not_found",
            SessionError::Internal(_) => "internal_error",
        }
    }

    /// Message safe to show to callers.
    pub fn public_message(&self) -> String {
        match self {
            SessionError::Validation(_) => "Validation failed".to_string(),
            SessionError::Internal(_) => Self::INTERNAL_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            SessionError::Validation(_) => Severity::BadRequest,
            SessionError::UserAlreadyExists => Severity::Conflict,
            SessionError::InvalidCredentials | SessionError::InvalidToken => {
                Severity::Unauthorized
            }
            SessionError::UserNotFound => Severity::NotFound,
            SessionError::Internal(_) => Severity::Internal,
        }
    }

    /// Wrap an infrastructure failure, logging its detail server-side.
    pub fn internal(context: &str, err: impl fmt::Display) -> Self {
        tracing::error!(error = %err, "{}", context);
        SessionError::Internal(format!("{}: {}", context, err))
    }
}

impl From<RefreshTokenError> for SessionError {
    fn from(err: RefreshTokenError) -> Self {
        match err {
            RefreshTokenError::InvalidToken => SessionError::InvalidToken,
            RefreshTokenError::UnknownUser => SessionError::UserNotFound,
            other => SessionError::internal("Refresh token store failed", other),
        }
    }
}

impl From<PersistenceError> for SessionError {
    fn from(err: PersistenceError) -> Self {
        SessionError::internal("Persistence failed", err)
    }
}
