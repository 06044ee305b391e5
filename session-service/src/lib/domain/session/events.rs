use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::session::models::User;
use crate::domain::session::models::UserId;

/// Domain event published once a registration has been committed.
///
/// Carries a snapshot of the new user for the welcome notification; it never
/// contains credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRegisteredEvent {
    pub event_id: String,
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    pub registered_at: DateTime<Utc>,
}

impl UserRegisteredEvent {
    /// Create a new UserRegistered event from a user entity.
    ///
    /// # Arguments
    /// * `user` - User entity that was registered
    ///
    /// # Returns
    /// UserRegisteredEvent with unique event ID and user snapshot
    pub fn new(user: &User) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            user_id: user.id,
            email: user.email.as_str().to_string(),
            name: user.name.as_str().to_string(),
            registered_at: user.created_at,
        }
    }

    pub fn event_type(&self) -> &'static str {
        "user_registered"
    }
}
