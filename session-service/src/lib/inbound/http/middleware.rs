use auth::Authentication;
use axum::extract::Query;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use serde::Deserialize;

use super::handlers::ApiError;
use crate::domain::session::errors::SessionError;
use crate::domain::session::models::AccessClaims;
use crate::domain::session::models::UserId;
use crate::domain::session::ports::SessionServicePort;
use crate::inbound::http::router::AppState;

/// Extension type to store the authenticated identity in request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub email: String,
}

impl From<AccessClaims> for AuthenticatedUser {
    fn from(claims: AccessClaims) -> Self {
        Self {
            user_id: claims.identity.user_id,
            email: claims.identity.email,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Middleware for routes that need a caller: no token or a bad one ends the
/// request with 401.
pub async fn require_authentication<S: SessionServicePort>(
    State(state): State<AppState<S>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match authenticate_request(&state, &req) {
        Authentication::Authenticated(claims) => {
            req.extensions_mut().insert(AuthenticatedUser::from(claims));
            Ok(next.run(req).await)
        }
        Authentication::Anonymous => Err(ApiError::token_required()),
        Authentication::Rejected => {
            tracing::warn!(uri = %req.uri(), "Rejected access token");
            Err(ApiError::from(SessionError::InvalidToken))
        }
    }
}

/// Middleware for routes that serve anonymous callers too: a verified caller
/// is attached to the request, anything else proceeds anonymously.
pub async fn optional_authentication<S: SessionServicePort>(
    State(state): State<AppState<S>>,
    mut req: Request,
    next: Next,
) -> Response {
    match authenticate_request(&state, &req) {
        Authentication::Authenticated(claims) => {
            req.extensions_mut().insert(AuthenticatedUser::from(claims));
        }
        Authentication::Rejected => {
            tracing::debug!(uri = %req.uri(), "Ignoring rejected access token");
        }
        Authentication::Anonymous => {}
    }

    next.run(req).await
}

fn authenticate_request<S: SessionServicePort>(
    state: &AppState<S>,
    req: &Request,
) -> Authentication<AccessClaims> {
    let authorization = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => match value.to_str() {
            Ok(value) => Some(value),
            Err(_) => return Authentication::Rejected,
        },
        None => None,
    };

    // An unreadable query still counts as a presented credential unless the
    // header already supplies one.
    let query_token = match Query::<TokenQuery>::try_from_uri(req.uri()) {
        Ok(Query(query)) => query.token,
        Err(_) if authorization.is_some() => None,
        Err(e) => {
            tracing::debug!(error = %e, "Unreadable token query");
            return Authentication::Rejected;
        }
    };

    let credential = auth::extract_credential(authorization, query_token.as_deref());

    state.authenticator.authenticate(credential)
}
