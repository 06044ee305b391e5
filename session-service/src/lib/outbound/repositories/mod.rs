pub mod memory;
pub mod refresh_token;
pub mod user;

pub use memory::InMemoryRefreshTokenRepository;
pub use memory::InMemoryUserRepository;
pub use refresh_token::PostgresRefreshTokenRepository;
pub use user::PostgresUserRepository;

use crate::domain::session::errors::PersistenceError;

/// Translate a driver error into the persistence port's error.
fn persistence_error(e: sqlx::Error) -> PersistenceError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return PersistenceError::UniqueViolation {
                constraint: db_err.constraint().unwrap_or_default().to_string(),
            };
        }
        if db_err.is_foreign_key_violation() {
            return PersistenceError::MissingOwner;
        }
    }
    PersistenceError::Database(e.to_string())
}
