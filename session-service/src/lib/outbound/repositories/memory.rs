use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::session::errors::PersistenceError;
use crate::domain::session::models::EmailAddress;
use crate::domain::session::models::NewRefreshToken;
use crate::domain::session::models::NewUser;
use crate::domain::session::models::RefreshToken;
use crate::domain::session::models::User;
use crate::domain::session::models::UserId;
use crate::domain::session::ports::RefreshTokenRepository;
use crate::domain::session::ports::UserRepository;

const USERS_EMAIL_KEY: &str = "users_email_key";
const REFRESH_TOKENS_TOKEN_KEY: &str = "refresh_tokens_token_key";

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, PersistenceError> {
    mutex
        .lock()
        .map_err(|_| PersistenceError::Database("In-memory store lock poisoned".to_string()))
}

#[derive(Default)]
struct UserTable {
    last_id: i64,
    rows: BTreeMap<UserId, User>,
}

/// Process-local user store with the same uniqueness rules as the
/// `users` table. Every check-and-insert happens under one lock.
#[derive(Default)]
pub struct InMemoryUserRepository {
    table: Mutex<UserTable>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete a user; its refresh tokens can no longer be reissued.
    ///
    /// # Returns
    /// `true` when the user existed
    pub fn remove(&self, id: UserId) -> Result<bool, PersistenceError> {
        Ok(lock(&self.table)?.rows.remove(&id).is_some())
    }

    fn contains(&self, id: UserId) -> Result<bool, PersistenceError> {
        Ok(lock(&self.table)?.rows.contains_key(&id))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, PersistenceError> {
        let mut table = lock(&self.table)?;

        if table.rows.values().any(|row| row.email == user.email) {
            return Err(PersistenceError::UniqueViolation {
                constraint: USERS_EMAIL_KEY.to_string(),
            });
        }

        table.last_id += 1;
        let now = Utc::now();
        let created = User {
            id: UserId(table.last_id),
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(created.id, created.clone());

        Ok(created)
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, PersistenceError> {
        Ok(lock(&self.table)?
            .rows
            .values()
            .find(|row| &row.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, PersistenceError> {
        Ok(lock(&self.table)?.rows.get(&id).cloned())
    }
}

#[derive(Default)]
struct RefreshTokenTable {
    last_id: i64,
    rows: HashMap<String, RefreshToken>,
}

/// Process-local refresh token store.
///
/// Checks owners against the user store the way the foreign key does, and
/// revokes conditionally under the table lock.
pub struct InMemoryRefreshTokenRepository {
    users: Arc<InMemoryUserRepository>,
    table: Mutex<RefreshTokenTable>,
}

impl InMemoryRefreshTokenRepository {
    pub fn new(users: Arc<InMemoryUserRepository>) -> Self {
        Self {
            users,
            table: Mutex::new(RefreshTokenTable::default()),
        }
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn create(&self, token: NewRefreshToken) -> Result<RefreshToken, PersistenceError> {
        if !self.users.contains(token.user_id)? {
            return Err(PersistenceError::MissingOwner);
        }

        let mut table = lock(&self.table)?;

        if table.rows.contains_key(&token.token) {
            return Err(PersistenceError::UniqueViolation {
                constraint: REFRESH_TOKENS_TOKEN_KEY.to_string(),
            });
        }

        table.last_id += 1;
        let created = RefreshToken {
            id: table.last_id,
            user_id: token.user_id,
            token: token.token,
            expires_at: token.expires_at,
            revoked: false,
            created_at: Utc::now(),
        };
        table.rows.insert(created.token.clone(), created.clone());

        Ok(created)
    }

    async fn find_active(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, PersistenceError> {
        Ok(lock(&self.table)?
            .rows
            .get(token)
            .filter(|row| row.is_active(now))
            .cloned())
    }

    async fn revoke(&self, token: &str) -> Result<bool, PersistenceError> {
        let mut table = lock(&self.table)?;

        match table.rows.get_mut(token) {
            Some(row) if !row.revoked => {
                row.revoked = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, PersistenceError> {
        let mut table = lock(&self.table)?;

        let mut revoked = 0;
        for row in table.rows.values_mut() {
            if row.user_id == user_id && !row.revoked {
                row.revoked = true;
                revoked += 1;
            }
        }

        Ok(revoked)
    }
}
