use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::session::errors::EventPublisherError;
use crate::domain::session::errors::PersistenceError;
use crate::domain::session::errors::SessionError;
use crate::domain::session::events::UserRegisteredEvent;
use crate::domain::session::models::EmailAddress;
use crate::domain::session::models::LoginCommand;
use crate::domain::session::models::NewRefreshToken;
use crate::domain::session::models::NewUser;
use crate::domain::session::models::RefreshToken;
use crate::domain::session::models::RegisterCommand;
use crate::domain::session::models::Session;
use crate::domain::session::models::TokenPair;
use crate::domain::session::models::User;
use crate::domain::session::models::UserId;

/// Port for session domain service operations.
#[async_trait]
pub trait SessionServicePort: Send + Sync + 'static {
    /// Register a new user and log them in.
    ///
    /// # Arguments
    /// * `command` - Validated email, display name and password
    ///
    /// # Returns
    /// Created user with a fresh token pair
    ///
    /// # Errors
    /// * `UserAlreadyExists` - Email is already registered
    /// * `Internal` - Hashing, signing or persistence failed
    async fn register(&self, command: RegisterCommand) -> Result<Session, SessionError>;

    /// Verify credentials and issue a token pair.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password, indistinguishably
    /// * `Internal` - Hashing, signing or persistence failed
    async fn login(&self, command: LoginCommand) -> Result<Session, SessionError>;

    /// Exchange a refresh token for a new pair, revoking the old token.
    ///
    /// # Arguments
    /// * `refresh_token` - Opaque refresh token presented by the client
    ///
    /// # Errors
    /// * `InvalidToken` - Token unknown, expired, revoked or already rotated
    /// * `UserNotFound` - Owner no longer exists
    /// * `Internal` - Signing or persistence failed
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, SessionError>;

    /// Resolve an access token to the user it was issued for.
    ///
    /// # Errors
    /// * `InvalidToken` - Any verification failure
    fn introspect(&self, access_token: &str) -> Result<UserId, SessionError>;

    /// Fetch the user behind an authenticated request.
    ///
    /// # Errors
    /// * `UserNotFound` - User no longer exists
    /// * `Internal` - Persistence failed
    async fn current_user(&self, user_id: UserId) -> Result<User, SessionError>;

    /// Revoke every refresh token of a user.
    ///
    /// # Returns
    /// Number of tokens that were still active
    ///
    /// # Errors
    /// * `Internal` - Persistence failed
    async fn logout(&self, user_id: UserId) -> Result<u64, SessionError>;
}

/// Persistence operations for the user aggregate.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist a new user.
    ///
    /// # Returns
    /// Created user with its assigned id
    ///
    /// # Errors
    /// * `UniqueViolation` - Email is already registered
    /// * `Database` - Database operation failed
    async fn create(&self, user: NewUser) -> Result<User, PersistenceError>;

    /// Retrieve user by email address (case-insensitive).
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    async fn find_by_email(&self, email: &EmailAddress)
        -> Result<Option<User>, PersistenceError>;

    /// Retrieve user by identifier.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, PersistenceError>;
}

/// Persistence operations for refresh tokens.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync + 'static {
    /// Persist a new, active refresh token.
    ///
    /// # Errors
    /// * `UniqueViolation` - Token value already exists
    /// * `MissingOwner` - Owning user does not exist
    /// * `Database` - Database operation failed
    async fn create(&self, token: NewRefreshToken) -> Result<RefreshToken, PersistenceError>;

    /// Retrieve a token only if it is unrevoked and unexpired at `now`.
    async fn find_active(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, PersistenceError>;

    /// Revoke a token only if it is currently unrevoked.
    ///
    /// # Returns
    /// `true` when this call flipped the token, `false` when it was already
    /// revoked or does not exist
    async fn revoke(&self, token: &str) -> Result<bool, PersistenceError>;

    /// Revoke every unrevoked token of a user.
    ///
    /// # Returns
    /// Number of tokens flipped
    async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, PersistenceError>;
}

/// Event publishing for domain events.
#[async_trait]
pub trait EventPublisher: Send + Sync + 'static {
    /// Publish user registration event.
    ///
    /// # Errors
    /// * `QueueFull` - Consumer is lagging behind
    /// * `Closed` - Consumer has shut down
    async fn publish_user_registered(
        &self,
        event: &UserRegisteredEvent,
    ) -> Result<(), EventPublisherError>;
}
