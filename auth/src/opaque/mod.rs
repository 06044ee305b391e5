pub mod errors;
pub mod generator;

pub use errors::OpaqueTokenError;
pub use generator::generate_opaque_token;
pub use generator::OPAQUE_TOKEN_BYTES;
