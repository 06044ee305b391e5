pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;

// Re-export commonly used types
pub use domain::session;
pub use domain::session::models::*;
pub use domain::session::service::SessionService;
pub use domain::session::signer::TokenSigner;
pub use outbound::repositories;
