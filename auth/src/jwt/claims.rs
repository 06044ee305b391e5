use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Time-bounded JWT claims envelope.
///
/// Wraps a service-defined identity payload (flattened into the token body)
/// with the registered `iat`, `exp` and `jti` claims. Every issuance gets a
/// fresh `jti`, so two tokens minted in the same second never collide.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims<T> {
    /// Service-specific identity fields
    #[serde(flatten)]
    pub identity: T,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique token identifier)
    pub jti: String,
}

impl<T> Claims<T> {
    /// Build claims for `identity` valid for `ttl` starting at `issued_at`.
    pub fn issue(identity: T, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            identity,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }
}
