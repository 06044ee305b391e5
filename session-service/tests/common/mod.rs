#![allow(dead_code)]

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use session_service::inbound::http::create_router;
use session_service::outbound::events::welcome_channel;
use session_service::outbound::events::ChannelEventPublisher;
use session_service::outbound::events::WelcomeNotifier;
use session_service::outbound::repositories::InMemoryRefreshTokenRepository;
use session_service::outbound::repositories::InMemoryUserRepository;
use session_service::session::errors::PersistenceError;
use session_service::session::ports::RefreshTokenRepository;
use session_service::NewRefreshToken;
use session_service::RefreshToken;
use session_service::SessionService;
use session_service::TokenSigner;
use session_service::UserId;

pub const TEST_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

pub type TestSessionService =
    SessionService<InMemoryUserRepository, InMemoryRefreshTokenRepository, ChannelEventPublisher>;

/// Service wired to in-memory storage, with handles on its collaborators
pub struct TestContext {
    pub service: Arc<TestSessionService>,
    pub users: Arc<InMemoryUserRepository>,
    pub signer: Arc<TokenSigner>,
    pub notifier: WelcomeNotifier,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_access_ttl(Duration::hours(1))
    }

    pub fn with_access_ttl(access_ttl: Duration) -> Self {
        let users = Arc::new(InMemoryUserRepository::new());
        let refresh_tokens = Arc::new(InMemoryRefreshTokenRepository::new(Arc::clone(&users)));
        let signer = Arc::new(
            TokenSigner::new(TEST_SECRET, access_ttl).expect("Failed to create token signer"),
        );
        let (event_publisher, notifier) = welcome_channel(16);

        let service = Arc::new(SessionService::new(
            Arc::clone(&users),
            refresh_tokens,
            Arc::clone(&signer),
            Arc::new(event_publisher),
            Duration::days(30),
        ));

        Self {
            service,
            users,
            signer,
            notifier,
        }
    }
}

/// In-memory refresh token store that yields to the scheduler before every
/// call, so rotations driven by `tokio::join!` all pass the lookup before any
/// of them reaches the conditional revoke.
pub struct InterleavingRefreshTokenRepository {
    inner: InMemoryRefreshTokenRepository,
    lost_revokes: AtomicUsize,
}

impl InterleavingRefreshTokenRepository {
    pub fn new(users: Arc<InMemoryUserRepository>) -> Self {
        Self {
            inner: InMemoryRefreshTokenRepository::new(users),
            lost_revokes: AtomicUsize::new(0),
        }
    }

    /// Number of revokes that found the token already revoked
    pub fn lost_revokes(&self) -> usize {
        self.lost_revokes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RefreshTokenRepository for InterleavingRefreshTokenRepository {
    async fn create(&self, token: NewRefreshToken) -> Result<RefreshToken, PersistenceError> {
        tokio::task::yield_now().await;
        self.inner.create(token).await
    }

    async fn find_active(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, PersistenceError> {
        tokio::task::yield_now().await;
        self.inner.find_active(token, now).await
    }

    async fn revoke(&self, token: &str) -> Result<bool, PersistenceError> {
        tokio::task::yield_now().await;
        let revoked = self.inner.revoke(token).await?;
        if !revoked {
            self.lost_revokes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(revoked)
    }

    async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, PersistenceError> {
        tokio::task::yield_now().await;
        self.inner.revoke_all_for_user(user_id).await
    }
}

pub type InterleavingSessionService =
    SessionService<InMemoryUserRepository, InterleavingRefreshTokenRepository, ChannelEventPublisher>;

/// Service whose refresh token calls interleave, with a handle on its store
pub fn interleaving_service() -> (
    Arc<InterleavingSessionService>,
    Arc<InterleavingRefreshTokenRepository>,
) {
    let users = Arc::new(InMemoryUserRepository::new());
    let refresh_tokens = Arc::new(InterleavingRefreshTokenRepository::new(Arc::clone(&users)));
    let signer = Arc::new(
        TokenSigner::new(TEST_SECRET, Duration::hours(1)).expect("Failed to create token signer"),
    );
    let (event_publisher, _notifier) = welcome_channel(16);

    let service = Arc::new(SessionService::new(
        users,
        Arc::clone(&refresh_tokens),
        signer,
        Arc::new(event_publisher),
        Duration::days(30),
    ));

    (service, refresh_tokens)
}

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub users: Arc<InMemoryUserRepository>,
    pub api_client: reqwest::Client,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        let context = TestContext::new();

        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let router = create_router(context.service, context.signer);

        // Spawn server and notifier in background
        tokio::spawn(context.notifier.start_consuming());
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            users: context.users,
            api_client: reqwest::Client::new(),
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make POST request with Bearer token
    pub fn post_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.post(path).bearer_auth(token)
    }

    /// Register a user and return the response body
    pub async fn register(&self, email: &str, name: &str, password: &str) -> serde_json::Value {
        let response = self
            .post("/api/v1/auth/register")
            .json(&serde_json::json!({
                "email": email,
                "name": name,
                "password": password,
            }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.expect("Failed to parse response")
    }
}
