pub mod messages;
pub mod notifier;

pub use notifier::welcome_channel;
pub use notifier::ChannelEventPublisher;
pub use notifier::WelcomeNotifier;
