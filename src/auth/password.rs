//! Password hashing and reset-token generation.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;

/// Hash a string using Argon2id (used for passwords and reset tokens).
pub fn hash_string(input: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(input.as_bytes(), &salt)
        .map_err(|e| anyhow!("hash string: {e}"))?;

    Ok(hash.to_string())
}

/// Verify a string against a hash.
///
/// Note: Verification uses the parameters embedded in the hash itself.
pub fn verify_string(input: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| anyhow!("parse hash: {e}"))?;

    Ok(Argon2::default()
        .verify_password(input.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Generate a secure random token for password reset
pub fn generate_reset_token() -> String {
    // 32 bytes (256 bits) of cryptographically secure random data
    let mut token_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut token_bytes);

    // Encode as base64url without padding
    general_purpose::URL_SAFE_NO_PAD.encode(token_bytes)
}

/// Encode an account id for use in a reset link
pub fn encode_account_id(id: i32) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(id.to_string())
}

/// Decode an account id from a reset link; None for anything malformed
pub fn decode_account_id(uid: &str) -> Option<i32> {
    let bytes = general_purpose::URL_SAFE_NO_PAD.decode(uid).ok()?;
    String::from_utf8(bytes).ok()?.parse().ok()
}
