use thiserror::Error;

/// Error type for opaque token generation.
#[derive(Debug, Clone, Error)]
pub enum OpaqueTokenError {
    #[error("Secure random source unavailable: {0}")]
    RandomnessUnavailable(String),
}
