use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordHasher;
use chrono::Duration;

use crate::domain::session::errors::PersistenceError;
use crate::domain::session::errors::SessionError;
use crate::domain::session::events::UserRegisteredEvent;
use crate::domain::session::models::LoginCommand;
use crate::domain::session::models::NewUser;
use crate::domain::session::models::RegisterCommand;
use crate::domain::session::models::Session;
use crate::domain::session::models::SessionIdentity;
use crate::domain::session::models::TokenPair;
use crate::domain::session::models::User;
use crate::domain::session::models::UserId;
use crate::domain::session::ports::EventPublisher;
use crate::domain::session::ports::RefreshTokenRepository;
use crate::domain::session::ports::SessionServicePort;
use crate::domain::session::ports::UserRepository;
use crate::domain::session::refresh::RefreshTokenStore;
use crate::domain::session::signer::TokenSigner;

/// Domain service implementation for session operations.
///
/// Sequences user creation and token issuance; uniqueness and single-use
/// rotation are left to the repositories' constraints.
pub struct SessionService<UR, RR, EP>
where
    UR: UserRepository,
    RR: RefreshTokenRepository,
    EP: EventPublisher,
{
    users: Arc<UR>,
    refresh_tokens: RefreshTokenStore<RR>,
    signer: Arc<TokenSigner>,
    event_publisher: Arc<EP>,
    password_hasher: PasswordHasher,
}

impl<UR, RR, EP> SessionService<UR, RR, EP>
where
    UR: UserRepository,
    RR: RefreshTokenRepository,
    EP: EventPublisher,
{
    /// Create a new session service with injected dependencies.
    ///
    /// # Arguments
    /// * `users` - User persistence implementation
    /// * `refresh_tokens` - Refresh token persistence implementation
    /// * `signer` - Access token signer, shared with the authentication gate
    /// * `event_publisher` - Domain event publishing implementation
    /// * `refresh_token_ttl` - Lifetime of every issued refresh token
    pub fn new(
        users: Arc<UR>,
        refresh_tokens: Arc<RR>,
        signer: Arc<TokenSigner>,
        event_publisher: Arc<EP>,
        refresh_token_ttl: Duration,
    ) -> Self {
        Self {
            users,
            refresh_tokens: RefreshTokenStore::new(refresh_tokens, refresh_token_ttl),
            signer,
            event_publisher,
            password_hasher: PasswordHasher::new(),
        }
    }

    async fn hash_password(&self, password: String) -> Result<String, SessionError> {
        let hasher = self.password_hasher;

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| SessionError::internal("Password hashing task failed", e))?
            .map_err(|e| SessionError::internal("Password hashing failed", e))
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, SessionError> {
        let hasher = self.password_hasher;

        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| SessionError::internal("Password verification task failed", e))?
            .map_err(|e| SessionError::internal("Password verification failed", e))
    }

    async fn equalize_timing(&self, password: String) {
        let hasher = self.password_hasher;

        if let Err(e) =
            tokio::task::spawn_blocking(move || hasher.equalize_timing(&password)).await
        {
            tracing::warn!(error = %e, "Timing equalization task failed");
        }
    }

    fn issue_access_token(&self, user: &User) -> Result<String, SessionError> {
        self.signer
            .issue(&SessionIdentity::from(user))
            .map_err(|e| SessionError::internal("Access token signing failed", e))
    }

    async fn issue_pair(&self, user: &User) -> Result<TokenPair, SessionError> {
        let access_token = self.issue_access_token(user)?;
        let refresh_token = self.refresh_tokens.issue(user.id).await?;

        Ok(TokenPair {
            access_token,
            refresh_token: refresh_token.token,
        })
    }
}

#[async_trait]
impl<UR, RR, EP> SessionServicePort for SessionService<UR, RR, EP>
where
    UR: UserRepository,
    RR: RefreshTokenRepository,
    EP: EventPublisher,
{
    async fn register(&self, command: RegisterCommand) -> Result<Session, SessionError> {
        let password_hash = self
            .hash_password(command.password.as_str().to_string())
            .await?;

        let new_user = NewUser {
            email: command.email,
            name: command.name,
            password_hash,
        };

        let user = self.users.create(new_user).await.map_err(|e| match e {
            PersistenceError::UniqueViolation { .. } => SessionError::UserAlreadyExists,
            other => SessionError::from(other),
        })?;

        let tokens = self.issue_pair(&user).await?;

        tracing::info!(user_id = %user.id, "User registered");

        let event = UserRegisteredEvent::new(&user);
        if let Err(e) = self.event_publisher.publish_user_registered(&event).await {
            tracing::error!(
                user_id = %user.id,
                event_id = %event.event_id,
                error = %e,
                "Failed to publish UserRegistered event"
            );
        }

        Ok(Session { tokens, user })
    }

    async fn login(&self, command: LoginCommand) -> Result<Session, SessionError> {
        let Some(user) = self.users.find_by_email(&command.email).await? else {
            self.equalize_timing(command.password).await;
            tracing::debug!("Login attempt for unknown email");
            return Err(SessionError::InvalidCredentials);
        };

        let valid = self
            .verify_password(command.password, user.password_hash.clone())
            .await?;
        if !valid {
            tracing::debug!(user_id = %user.id, "Login attempt with wrong password");
            return Err(SessionError::InvalidCredentials);
        }

        let tokens = self.issue_pair(&user).await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(Session { tokens, user })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, SessionError> {
        let (user_id, issued) = self.refresh_tokens.rotate(refresh_token).await?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(SessionError::UserNotFound)?;

        let access_token = self.issue_access_token(&user)?;

        tracing::debug!(user_id = %user.id, "Refresh token rotated");

        Ok(TokenPair {
            access_token,
            refresh_token: issued.token,
        })
    }

    fn introspect(&self, access_token: &str) -> Result<UserId, SessionError> {
        self.signer
            .verify(access_token)
            .map(|claims| claims.identity.user_id)
            .map_err(|e| {
                tracing::debug!(error = %e, "Access token rejected");
                SessionError::InvalidToken
            })
    }

    async fn current_user(&self, user_id: UserId) -> Result<User, SessionError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(SessionError::UserNotFound)
    }

    async fn logout(&self, user_id: UserId) -> Result<u64, SessionError> {
        let revoked = self.refresh_tokens.revoke_all(user_id).await?;

        tracing::info!(user_id = %user_id, revoked, "User logged out");

        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use chrono::Utc;
    use mockall::mock;
    use mockall::predicate::*;

    use super::*;
    use crate::domain::session::errors::EventPublisherError;
    use crate::domain::session::models::DisplayName;
    use crate::domain::session::models::EmailAddress;
    use crate::domain::session::models::NewRefreshToken;
    use crate::domain::session::models::Password;
    use crate::domain::session::models::RefreshToken;

    const SECRET: &[u8] = b"service_test_secret_at_least_32_bytes";

    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn create(&self, user: NewUser) -> Result<User, PersistenceError>;
            async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, PersistenceError>;
            async fn find_by_id(&self, id: UserId) -> Result<Option<User>, PersistenceError>;
        }
    }

    mock! {
        pub TestRefreshTokenRepository {}

        #[async_trait]
        impl RefreshTokenRepository for TestRefreshTokenRepository {
            async fn create(&self, token: NewRefreshToken) -> Result<RefreshToken, PersistenceError>;
            async fn find_active(&self, token: &str, now: DateTime<Utc>) -> Result<Option<RefreshToken>, PersistenceError>;
            async fn revoke(&self, token: &str) -> Result<bool, PersistenceError>;
            async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, PersistenceError>;
        }
    }

    mock! {
        pub TestEventPublisher {}

        #[async_trait]
        impl EventPublisher for TestEventPublisher {
            async fn publish_user_registered(&self, event: &UserRegisteredEvent) -> Result<(), EventPublisherError>;
        }
    }

    type TestService = SessionService<
        MockTestUserRepository,
        MockTestRefreshTokenRepository,
        MockTestEventPublisher,
    >;

    fn service(
        users: MockTestUserRepository,
        refresh_tokens: MockTestRefreshTokenRepository,
        event_publisher: MockTestEventPublisher,
    ) -> TestService {
        SessionService::new(
            Arc::new(users),
            Arc::new(refresh_tokens),
            Arc::new(TokenSigner::new(SECRET, Duration::hours(1)).unwrap()),
            Arc::new(event_publisher),
            Duration::days(30),
        )
    }

    fn user_with_password(password: &str) -> User {
        User {
            id: UserId(7),
            email: EmailAddress::new("alice@example.com".to_string()).unwrap(),
            name: DisplayName::new("Alice".to_string()).unwrap(),
            password_hash: PasswordHasher::new().hash(password).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn persisted_user(new_user: NewUser) -> User {
        User {
            id: UserId(7),
            email: new_user.email,
            name: new_user.name,
            password_hash: new_user.password_hash,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn persisted_token(new_token: NewRefreshToken) -> RefreshToken {
        RefreshToken {
            id: 1,
            user_id: new_token.user_id,
            token: new_token.token,
            expires_at: new_token.expires_at,
            revoked: false,
            created_at: Utc::now(),
        }
    }

    fn register_command() -> RegisterCommand {
        RegisterCommand::new(
            EmailAddress::new("Alice@Example.com".to_string()).unwrap(),
            DisplayName::new("Alice".to_string()).unwrap(),
            Password::new("secret1".to_string()).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_register_success() {
        let mut users = MockTestUserRepository::new();
        let mut refresh_tokens = MockTestRefreshTokenRepository::new();
        let mut event_publisher = MockTestEventPublisher::new();

        users
            .expect_create()
            .withf(|user| {
                user.email.as_str() == "alice@example.com"
                    && user.name.as_str() == "Alice"
                    && user.password_hash.starts_with("$argon2id$")
            })
            .times(1)
            .returning(|user| Ok(persisted_user(user)));

        refresh_tokens
            .expect_create()
            .withf(|token| token.user_id == UserId(7))
            .times(1)
            .returning(|token| Ok(persisted_token(token)));

        event_publisher
            .expect_publish_user_registered()
            .withf(|event| event.user_id == UserId(7) && event.email == "alice@example.com")
            .times(1)
            .returning(|_| Ok(()));

        let service = service(users, refresh_tokens, event_publisher);

        let session = service.register(register_command()).await.unwrap();
        assert_eq!(session.user.id, UserId(7));
        assert_eq!(session.tokens.refresh_token.len(), 64);
        assert_eq!(service.introspect(&session.tokens.access_token), Ok(UserId(7)));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let mut users = MockTestUserRepository::new();
        let mut refresh_tokens = MockTestRefreshTokenRepository::new();
        let mut event_publisher = MockTestEventPublisher::new();

        users.expect_create().times(1).returning(|_| {
            Err(PersistenceError::UniqueViolation {
                constraint: "users_email_key".to_string(),
            })
        });
        refresh_tokens.expect_create().times(0);
        event_publisher.expect_publish_user_registered().times(0);

        let service = service(users, refresh_tokens, event_publisher);

        assert!(matches!(
            service.register(register_command()).await,
            Err(SessionError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_register_survives_publish_failure() {
        let mut users = MockTestUserRepository::new();
        let mut refresh_tokens = MockTestRefreshTokenRepository::new();
        let mut event_publisher = MockTestEventPublisher::new();

        users
            .expect_create()
            .times(1)
            .returning(|user| Ok(persisted_user(user)));
        refresh_tokens
            .expect_create()
            .times(1)
            .returning(|token| Ok(persisted_token(token)));
        event_publisher
            .expect_publish_user_registered()
            .times(1)
            .returning(|_| Err(EventPublisherError::QueueFull));

        let service = service(users, refresh_tokens, event_publisher);

        assert!(service.register(register_command()).await.is_ok());
    }

    #[tokio::test]
    async fn test_register_database_failure_is_internal() {
        let mut users = MockTestUserRepository::new();

        users
            .expect_create()
            .times(1)
            .returning(|_| Err(PersistenceError::Database("connection reset".to_string())));

        let service = service(
            users,
            MockTestRefreshTokenRepository::new(),
            MockTestEventPublisher::new(),
        );

        let err = service.register(register_command()).await.unwrap_err();
        assert_eq!(err.key(), "internal_error");
        assert_eq!(err.public_message(), "Something went wrong");
    }

    #[tokio::test]
    async fn test_login_success() {
        let mut users = MockTestUserRepository::new();
        let mut refresh_tokens = MockTestRefreshTokenRepository::new();

        let user = user_with_password("secret1");
        users
            .expect_find_by_email()
            .withf(|email| email.as_str() == "alice@example.com")
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        refresh_tokens
            .expect_create()
            .times(1)
            .returning(|token| Ok(persisted_token(token)));

        let service = service(users, refresh_tokens, MockTestEventPublisher::new());

        let command = LoginCommand::new(
            EmailAddress::new("ALICE@example.com".to_string()).unwrap(),
            "secret1".to_string(),
        );
        let session = service.login(command).await.unwrap();
        assert_eq!(session.user.id, UserId(7));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let mut users = MockTestUserRepository::new();
        let mut refresh_tokens = MockTestRefreshTokenRepository::new();

        let user = user_with_password("secret1");
        users
            .expect_find_by_email()
            .withf(|email| email.as_str() == "alice@example.com")
            .returning(move |_| Ok(Some(user.clone())));
        users
            .expect_find_by_email()
            .withf(|email| email.as_str() == "nobody@example.com")
            .returning(|_| Ok(None));
        refresh_tokens.expect_create().times(0);

        let service = service(users, refresh_tokens, MockTestEventPublisher::new());

        let wrong_password = service
            .login(LoginCommand::new(
                EmailAddress::new("alice@example.com".to_string()).unwrap(),
                "wrong-password".to_string(),
            ))
            .await
            .unwrap_err();
        let unknown_email = service
            .login(LoginCommand::new(
                EmailAddress::new("nobody@example.com".to_string()).unwrap(),
                "secret1".to_string(),
            ))
            .await
            .unwrap_err();

        assert_eq!(wrong_password, SessionError::InvalidCredentials);
        assert_eq!(wrong_password, unknown_email);
        assert_eq!(wrong_password.public_message(), unknown_email.public_message());
    }

    #[tokio::test]
    async fn test_refresh_success() {
        let mut users = MockTestUserRepository::new();
        let mut refresh_tokens = MockTestRefreshTokenRepository::new();

        refresh_tokens
            .expect_find_active()
            .with(eq("old-token"), always())
            .times(1)
            .returning(|token, _| {
                Ok(Some(RefreshToken {
                    id: 1,
                    user_id: UserId(7),
                    token: token.to_string(),
                    expires_at: Utc::now() + Duration::days(1),
                    revoked: false,
                    created_at: Utc::now(),
                }))
            });
        refresh_tokens
            .expect_revoke()
            .with(eq("old-token"))
            .times(1)
            .returning(|_| Ok(true));
        refresh_tokens
            .expect_create()
            .times(1)
            .returning(|token| Ok(persisted_token(token)));

        let user = user_with_password("secret1");
        users
            .expect_find_by_id()
            .with(eq(UserId(7)))
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = service(users, refresh_tokens, MockTestEventPublisher::new());

        let tokens = service.refresh("old-token").await.unwrap();
        assert_ne!(tokens.refresh_token, "old-token");
        assert_eq!(service.introspect(&tokens.access_token), Ok(UserId(7)));
    }

    #[tokio::test]
    async fn test_refresh_with_unknown_token() {
        let mut refresh_tokens = MockTestRefreshTokenRepository::new();

        refresh_tokens
            .expect_find_active()
            .times(1)
            .returning(|_, _| Ok(None));

        let service = service(
            MockTestUserRepository::new(),
            refresh_tokens,
            MockTestEventPublisher::new(),
        );

        assert_eq!(
            service.refresh("unknown").await,
            Err(SessionError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn test_refresh_for_deleted_user() {
        let mut users = MockTestUserRepository::new();
        let mut refresh_tokens = MockTestRefreshTokenRepository::new();

        refresh_tokens
            .expect_find_active()
            .times(1)
            .returning(|token, _| {
                Ok(Some(RefreshToken {
                    id: 1,
                    user_id: UserId(7),
                    token: token.to_string(),
                    expires_at: Utc::now() + Duration::days(1),
                    revoked: false,
                    created_at: Utc::now(),
                }))
            });
        refresh_tokens.expect_revoke().times(1).returning(|_| Ok(true));
        refresh_tokens
            .expect_create()
            .times(1)
            .returning(|_| Err(PersistenceError::MissingOwner));
        users.expect_find_by_id().times(0);

        let service = service(users, refresh_tokens, MockTestEventPublisher::new());

        assert_eq!(
            service.refresh("old-token").await,
            Err(SessionError::UserNotFound)
        );
    }

    #[tokio::test]
    async fn test_introspect_rejects_garbage() {
        let service = service(
            MockTestUserRepository::new(),
            MockTestRefreshTokenRepository::new(),
            MockTestEventPublisher::new(),
        );

        assert_eq!(service.introspect("garbage"), Err(SessionError::InvalidToken));
    }

    #[tokio::test]
    async fn test_current_user_not_found() {
        let mut users = MockTestUserRepository::new();

        users.expect_find_by_id().times(1).returning(|_| Ok(None));

        let service = service(
            users,
            MockTestRefreshTokenRepository::new(),
            MockTestEventPublisher::new(),
        );

        assert!(matches!(
            service.current_user(UserId(99)).await,
            Err(SessionError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_logout_revokes_all_tokens() {
        let mut refresh_tokens = MockTestRefreshTokenRepository::new();

        refresh_tokens
            .expect_revoke_all_for_user()
            .with(eq(UserId(7)))
            .times(1)
            .returning(|_| Ok(3));

        let service = service(
            MockTestUserRepository::new(),
            refresh_tokens,
            MockTestEventPublisher::new(),
        );

        assert_eq!(service.logout(UserId(7)).await, Ok(3));
    }
}
