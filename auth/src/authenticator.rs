use std::sync::Arc;

use crate::jwt::JwtError;

/// Anything able to turn a bearer token into verified claims.
pub trait TokenVerifier: Send + Sync {
    type Claims;

    fn verify(&self, token: &str) -> Result<Self::Claims, JwtError>;
}

impl<V: TokenVerifier + ?Sized> TokenVerifier for Arc<V> {
    type Claims = V::Claims;

    fn verify(&self, token: &str) -> Result<Self::Claims, JwtError> {
        (**self).verify(token)
    }
}

/// Outcome of authenticating a request.
///
/// `Anonymous` means no credential was presented at all and is not an error:
/// optional-auth endpoints continue, mandatory-auth endpoints reject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication<C> {
    Anonymous,
    Authenticated(C),
    Rejected,
}

/// Pure request gate: verifies a bearer credential, never mutates state.
///
/// Every verification failure (bad signature, expiry, malformed input)
/// collapses into `Rejected` so callers cannot tell them apart.
pub struct Authenticator<V> {
    verifier: V,
}

impl<V: TokenVerifier> Authenticator<V> {
    pub fn new(verifier: V) -> Self {
        Self { verifier }
    }

    /// Authenticate an already extracted credential.
    ///
    /// # Arguments
    /// * `credential` - Token found by [`extract_credential`], if any
    ///
    /// # Returns
    /// Anonymous, Authenticated with the verified claims, or Rejected
    pub fn authenticate(&self, credential: Option<&str>) -> Authentication<V::Claims> {
        match credential {
            None => Authentication::Anonymous,
            Some(token) => match self.verifier.verify(token) {
                Ok(claims) => Authentication::Authenticated(claims),
                Err(_) => Authentication::Rejected,
            },
        }
    }
}

/// Pick the bearer credential of a request.
///
/// The `Authorization` header wins whenever it is present; the `token` query
/// parameter (for clients such as WebSocket upgrades that cannot set headers)
/// is only consulted without one. The header accepts `Bearer <token>` or a
/// raw token.
pub fn extract_credential<'a>(
    authorization: Option<&'a str>,
    query_token: Option<&'a str>,
) -> Option<&'a str> {
    match authorization.filter(|value| !value.trim().is_empty()) {
        Some(header) => {
            let header = header.trim_start();
            Some(header.strip_prefix("Bearer ").unwrap_or(header).trim())
        }
        None => query_token.filter(|token| !token.is_empty()),
    }
}
