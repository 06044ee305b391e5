use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::domain::session::errors::SessionError;
use crate::domain::session::errors::Severity;
use crate::domain::session::models::User;

pub mod login;
pub mod logout;
pub mod me;
pub mod refresh;
pub mod register;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Structured error response: a stable key for clients, a human message and
/// optional field-level details.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    status: StatusCode,
    error_key: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error_key: &str, message: &str) -> Self {
        Self {
            status,
            error_key: error_key.to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    /// Mandatory-auth route reached without any credential.
    pub fn token_required() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "auth.token_required",
            "Authentication token is required",
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn error_key(&self) -> &str {
        &self.error_key
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error_key: self.error_key,
            message: self.message,
            status: self.status.as_u16(),
            timestamp: Utc::now(),
            details: self.details,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        let status = match err.severity() {
            Severity::BadRequest => StatusCode::BAD_REQUEST,
            Severity::Unauthorized => StatusCode::UNAUTHORIZED,
            Severity::NotFound => StatusCode::NOT_FOUND,
            Severity::Conflict => StatusCode::CONFLICT,
            Severity::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let details = match &err {
            SessionError::Validation(errors) => Some(json!({ "errors": errors.fields() })),
            _ => None,
        };

        Self {
            status,
            error_key: err.key().to_string(),
            message: err.public_message(),
            details,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected request body");
        Self::new(
            StatusCode::BAD_REQUEST,
            "request.invalid_body",
            "Request body is not valid JSON",
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiErrorBody {
    pub error_key: String,
    pub message: String,
    pub status: u16,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserData {
    pub id: i64,
    pub email: String,
    pub name: String,
}

impl From<&User> for UserData {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.0,
            email: user.email.as_str().to_string(),
            name: user.name.as_str().to_string(),
        }
    }
}
