use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::domain::session::events::UserRegisteredEvent;

/// Payload handed to the welcome notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelcomeMessage {
    pub event_id: String,
    pub event_type: String,
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub registered_at: DateTime<Utc>,
}

impl From<&UserRegisteredEvent> for WelcomeMessage {
    fn from(event: &UserRegisteredEvent) -> Self {
        Self {
            event_id: event.event_id.clone(),
            event_type: event.event_type().to_string(),
            user_id: event.user_id.0,
            email: event.email.clone(),
            name: event.name.clone(),
            registered_at: event.registered_at,
        }
    }
}
