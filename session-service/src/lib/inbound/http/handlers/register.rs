use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::domain::session::errors::SessionError;
use crate::domain::session::errors::ValidationErrors;
use crate::domain::session::models::DisplayName;
use crate::domain::session::models::EmailAddress;
use crate::domain::session::models::Password;
use crate::domain::session::models::RegisterCommand;
use crate::domain::session::models::Session;
use crate::domain::session::ports::SessionServicePort;
use crate::inbound::http::router::AppState;

pub async fn register<S: SessionServicePort>(
    State(state): State<AppState<S>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<ApiSuccess<SessionResponseData>, ApiError> {
    let Json(body) = body?;

    state
        .session_service
        .register(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref session| ApiSuccess::new(StatusCode::OK, session.into()))
}

/// HTTP request body for registration (raw JSON)
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    password: String,
}

impl RegisterRequest {
    fn try_into_command(self) -> Result<RegisterCommand, SessionError> {
        let mut errors = ValidationErrors::new();

        let email = errors.check("email", EmailAddress::new(self.email));
        let name = errors.check("name", DisplayName::new(self.name));
        let password = errors.check("password", Password::new(self.password));

        match (email, name, password) {
            (Some(email), Some(name), Some(password)) => {
                Ok(RegisterCommand::new(email, name, password))
            }
            _ => Err(SessionError::Validation(errors)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionResponseData {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserData,
}

impl From<&Session> for SessionResponseData {
    fn from(session: &Session) -> Self {
        Self {
            access_token: session.tokens.access_token.clone(),
            refresh_token: session.tokens.refresh_token.clone(),
            user: (&session.user).into(),
        }
    }
}
