use std::sync::Arc;

use chrono::Duration;
use chrono::Utc;

use crate::domain::session::errors::PersistenceError;
use crate::domain::session::errors::RefreshTokenError;
use crate::domain::session::models::IssuedRefreshToken;
use crate::domain::session::models::NewRefreshToken;
use crate::domain::session::models::UserId;
use crate::domain::session::ports::RefreshTokenRepository;

/// Attempts made before a run of token collisions is reported as a failure.
const MAX_ISSUE_ATTEMPTS: usize = 3;

/// Issues, rotates and revokes opaque refresh tokens.
///
/// Single use is enforced by the repository's conditional revoke, never by
/// an in-process lock: of two concurrent rotations of the same token only
/// the one that flips it to revoked proceeds.
pub struct RefreshTokenStore<RR>
where
    RR: RefreshTokenRepository,
{
    repository: Arc<RR>,
    ttl: Duration,
}

impl<RR> RefreshTokenStore<RR>
where
    RR: RefreshTokenRepository,
{
    /// Create a store persisting tokens valid for `ttl`.
    pub fn new(repository: Arc<RR>, ttl: Duration) -> Self {
        Self { repository, ttl }
    }

    /// Generate and persist a fresh refresh token for `user_id`.
    ///
    /// # Errors
    /// * `UnknownUser` - Owner does not exist
    /// * `Generation` - OS randomness unavailable
    /// * `CollisionsExhausted` - Every attempt hit an existing token
    /// * `Persistence` - Database operation failed
    pub async fn issue(&self, user_id: UserId) -> Result<IssuedRefreshToken, RefreshTokenError> {
        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            let token = auth::generate_opaque_token()
                .map_err(|e| RefreshTokenError::Generation(e.to_string()))?;

            let new_token = NewRefreshToken {
                user_id,
                token,
                expires_at: Utc::now() + self.ttl,
            };

            match self.repository.create(new_token).await {
                Ok(row) => {
                    return Ok(IssuedRefreshToken {
                        token: row.token,
                        expires_at: row.expires_at,
                    })
                }
                Err(PersistenceError::UniqueViolation { constraint }) => {
                    tracing::warn!(
                        user_id = %user_id,
                        attempt,
                        constraint = %constraint,
                        "Refresh token collision, regenerating"
                    );
                }
                Err(PersistenceError::MissingOwner) => return Err(RefreshTokenError::UnknownUser),
                Err(e) => return Err(e.into()),
            }
        }

        Err(RefreshTokenError::CollisionsExhausted {
            attempts: MAX_ISSUE_ATTEMPTS,
        })
    }

    /// Consume `old` and issue its replacement for the same user.
    ///
    /// # Returns
    /// Owner of the consumed token and the new token
    ///
    /// # Errors
    /// * `InvalidToken` - Token unknown, expired, revoked, or lost a concurrent rotation
    /// * `UnknownUser` - Owner vanished before the replacement was persisted
    /// * `Persistence` - Database operation failed; nothing is issued
    pub async fn rotate(
        &self,
        old: &str,
    ) -> Result<(UserId, IssuedRefreshToken), RefreshTokenError> {
        let current = self
            .repository
            .find_active(old, Utc::now())
            .await?
            .ok_or(RefreshTokenError::InvalidToken)?;

        if !self.repository.revoke(old).await? {
            tracing::warn!(
                user_id = %current.user_id,
                "Refresh token was consumed concurrently"
            );
            return Err(RefreshTokenError::InvalidToken);
        }

        let issued = self.issue(current.user_id).await?;

        Ok((current.user_id, issued))
    }

    /// Revoke every refresh token of a user.
    ///
    /// # Returns
    /// Number of tokens that were still unrevoked
    pub async fn revoke_all(&self, user_id: UserId) -> Result<u64, RefreshTokenError> {
        Ok(self.repository.revoke_all_for_user(user_id).await?)
    }
}
