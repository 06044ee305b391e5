use rand::rngs::OsRng;
use rand::RngCore;

use super::errors::OpaqueTokenError;

/// Entropy carried by every opaque token.
pub const OPAQUE_TOKEN_BYTES: usize = 32;

/// Generate an opaque bearer token.
///
/// Draws 32 bytes from the operating system CSPRNG and hex-encodes them.
/// The result has no internal structure: holders must look it up, never decode it.
///
/// # Errors
/// * `RandomnessUnavailable` - The OS random source failed
pub fn generate_opaque_token() -> Result<String, OpaqueTokenError> {
    let mut bytes = [0u8; OPAQUE_TOKEN_BYTES];

    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| OpaqueTokenError::RandomnessUnavailable(e.to_string()))?;

    Ok(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_token_is_hex_of_32_bytes() {
        let token = generate_opaque_token().expect("Failed to generate token");

        assert_eq!(token.len(), OPAQUE_TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hex::decode(&token).unwrap().len(), OPAQUE_TOKEN_BYTES);
    }

    #[test]
    fn test_tokens_do_not_repeat() {
        let tokens: HashSet<String> = (0..256)
            .map(|_| generate_opaque_token().unwrap())
            .collect();

        assert_eq!(tokens.len(), 256);
    }
}
