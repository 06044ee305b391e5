//! Authentication utilities library
//!
//! Provides reusable credential infrastructure for services:
//! - Password hashing (Argon2id)
//! - JWT signing and verification (HS256, algorithm pinned)
//! - Opaque bearer token generation
//! - Request authentication gate
//!
//! Services own their claim payloads and persistence; this crate only knows
//! how to hash, sign, verify and generate.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## JWT Tokens
//! ```
//! use auth::{Claims, JwtHandler};
//! use chrono::{Duration, Utc};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Identity {
//!     user_id: i64,
//! }
//!
//! let handler = JwtHandler::new(b"secret_key_at_least_32_bytes_long!").unwrap();
//! let claims = Claims::issue(Identity { user_id: 1 }, Utc::now(), Duration::hours(1));
//! let token = handler.encode(&claims).unwrap();
//! let decoded: Claims<Identity> = handler.decode(&token).unwrap();
//! assert_eq!(decoded.identity.user_id, 1);
//! ```
//!
//! ## Opaque Tokens
//! ```
//! let token = auth::generate_opaque_token().unwrap();
//! assert_eq!(token.len(), 64);
//! ```

pub mod authenticator;
pub mod jwt;
pub mod opaque;
pub mod password;

// Re-export commonly used items
pub use authenticator::extract_credential;
pub use authenticator::Authentication;
pub use authenticator::Authenticator;
pub use authenticator::TokenVerifier;
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use opaque::generate_opaque_token;
pub use opaque::OpaqueTokenError;
pub use password::PasswordError;
pub use password::PasswordHasher;
