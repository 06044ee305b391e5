use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::login::login;
use super::handlers::logout::logout;
use super::handlers::me::me;
use super::handlers::refresh::refresh;
use super::handlers::register::register;
use super::middleware::require_authentication;
use crate::domain::session::ports::SessionServicePort;
use crate::domain::session::signer::TokenSigner;

pub struct AppState<S: SessionServicePort> {
    pub session_service: Arc<S>,
    pub authenticator: Arc<Authenticator<Arc<TokenSigner>>>,
}

impl<S: SessionServicePort> AppState<S> {
    pub fn new(session_service: Arc<S>, signer: Arc<TokenSigner>) -> Self {
        Self {
            session_service,
            authenticator: Arc::new(Authenticator::new(signer)),
        }
    }
}

impl<S: SessionServicePort> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            session_service: Arc::clone(&self.session_service),
            authenticator: Arc::clone(&self.authenticator),
        }
    }
}

pub fn create_router<S: SessionServicePort>(
    session_service: Arc<S>,
    signer: Arc<TokenSigner>,
) -> Router {
    let state = AppState::new(session_service, signer);

    let public_routes = Router::new()
        .route("/api/v1/auth/register", post(register::<S>))
        .route("/api/v1/auth/login", post(login::<S>))
        .route("/api/v1/auth/refresh", post(refresh::<S>));

    let protected_routes = Router::new()
        .route("/api/v1/auth/me", get(me::<S>))
        .route("/api/v1/auth/logout", post(logout::<S>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_authentication::<S>,
        ));

    // Headers are left out of the span: they carry bearer tokens.
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                path = %request.uri().path(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
