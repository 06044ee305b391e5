use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::domain::session::errors::EventPublisherError;
use crate::domain::session::events::UserRegisteredEvent;
use crate::domain::session::ports::EventPublisher;
use crate::outbound::events::messages::WelcomeMessage;

/// Create a bounded welcome-notification channel.
///
/// # Arguments
/// * `capacity` - Events buffered before publishing reports `QueueFull`
///
/// # Returns
/// Publisher half for the session service and the consumer to spawn
pub fn welcome_channel(capacity: usize) -> (ChannelEventPublisher, WelcomeNotifier) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (
        ChannelEventPublisher { sender },
        WelcomeNotifier { receiver },
    )
}

/// Event publisher handing registrations to the notifier task.
///
/// Never waits: a full or closed queue is reported to the caller, which
/// logs it without failing the request.
#[derive(Clone)]
pub struct ChannelEventPublisher {
    sender: mpsc::Sender<WelcomeMessage>,
}

#[async_trait]
impl EventPublisher for ChannelEventPublisher {
    async fn publish_user_registered(
        &self,
        event: &UserRegisteredEvent,
    ) -> Result<(), EventPublisherError> {
        self.sender
            .try_send(WelcomeMessage::from(event))
            .map(|_| {
                tracing::debug!(
                    event_id = %event.event_id,
                    user_id = %event.user_id,
                    "UserRegistered event queued"
                );
            })
            .map_err(|e| match e {
                TrySendError::Full(_) => EventPublisherError::QueueFull,
                TrySendError::Closed(_) => EventPublisherError::Closed,
            })
    }
}

/// Consumer side of the welcome channel.
pub struct WelcomeNotifier {
    receiver: mpsc::Receiver<WelcomeMessage>,
}

impl WelcomeNotifier {
    /// Wait for the next queued message.
    ///
    /// # Returns
    /// `None` once every publisher has been dropped
    pub async fn recv(&mut self) -> Option<WelcomeMessage> {
        self.receiver.recv().await
    }

    /// Start consuming welcome messages
    ///
    /// This is a long-running task that should be spawned in a separate tokio task
    pub async fn start_consuming(mut self) {
        tracing::info!("Starting welcome notifier loop");

        while let Some(message) = self.recv().await {
            match serde_json::to_string(&message) {
                Ok(payload) => tracing::info!(
                    event_id = %message.event_id,
                    user_id = message.user_id,
                    payload = %payload,
                    "Welcome notification dispatched"
                ),
                Err(e) => tracing::error!(
                    event_id = %message.event_id,
                    error = %e,
                    "Failed to serialize welcome notification"
                ),
            }
        }

        tracing::warn!("Welcome notifier loop ended");
    }
}
