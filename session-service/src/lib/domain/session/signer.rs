use auth::Claims;
use auth::JwtError;
use auth::JwtHandler;
use auth::TokenVerifier;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::domain::session::models::AccessClaims;
use crate::domain::session::models::SessionIdentity;

/// Issues and verifies the service's access tokens.
///
/// Thin layer over [`JwtHandler`] that fixes the payload to
/// [`SessionIdentity`] and the lifetime to the configured TTL.
pub struct TokenSigner {
    handler: JwtHandler,
    ttl: Duration,
}

impl TokenSigner {
    /// Create a signer from the shared secret and access-token lifetime.
    ///
    /// # Errors
    /// * `WeakSecret` - Secret is shorter than 32 bytes
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, JwtError> {
        Ok(Self {
            handler: JwtHandler::new(secret)?,
            ttl,
        })
    }

    /// Sign a fresh access token for `identity`, valid from now.
    pub fn issue(&self, identity: &SessionIdentity) -> Result<String, JwtError> {
        self.issue_at(identity, Utc::now())
    }

    /// Sign an access token as if it had been issued at `issued_at`.
    pub fn issue_at(
        &self,
        identity: &SessionIdentity,
        issued_at: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let claims = Claims::issue(identity.clone(), issued_at, self.ttl);
        self.handler.encode(&claims)
    }

    /// Verify signature, algorithm and expiry of an access token.
    ///
    /// # Errors
    /// * `InvalidSignature` - Signature or algorithm mismatch
    /// * `TokenExpired` - Token is past its expiry
    /// * `Malformed` - Token cannot be decoded
    pub fn verify(&self, token: &str) -> Result<AccessClaims, JwtError> {
        self.handler.decode(token)
    }
}

impl TokenVerifier for TokenSigner {
    type Claims = AccessClaims;

    fn verify(&self, token: &str) -> Result<Self::Claims, JwtError> {
        TokenSigner::verify(self, token)
    }
}
