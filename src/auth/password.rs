use std::sync::LazyLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const LEGACY_DIGEST_LEN: usize = 64;

static DUMMY_DIGEST: LazyLock<Option<String>> =
    LazyLock::new(|| hash("storefront-placeholder-password").ok());

/// Hash a password using Argon2id (19MB memory, 2 iterations, parallelism 1).
pub fn hash(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let params = Params::new(19 * 1024, 2, 1, None).map_err(|e| format!("Invalid params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| format!("Hashing failed: {e}"))
}

/// Verify a password against a stored digest.
///
/// Accepts Argon2 PHC strings and the unsalted SHA-256 hex digests written by
/// earlier deployments. Anything unparseable simply fails to verify.
pub fn verify(password: &str, digest: &str) -> bool {
    if digest.starts_with("$argon2") {
        return match PasswordHash::new(digest) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!("Unparseable password hash: {e}");
                false
            }
        };
    }

    if digest.len() == LEGACY_DIGEST_LEN {
        let computed = legacy_digest(password);
        return computed
            .as_bytes()
            .ct_eq(digest.to_ascii_lowercase().as_bytes())
            .into();
    }

    tracing::warn!("Unrecognized password digest format");
    false
}

/// Spend the cost of an Argon2 verification for a login whose account does
/// not exist, so it takes as long as a wrong password. Always false.
pub fn verify_missing(password: &str) -> bool {
    match DUMMY_DIGEST.as_deref() {
        Some(digest) => {
            let _ = verify(password, digest);
        }
        None => tracing::warn!("Placeholder password hash unavailable"),
    }
    false
}

fn legacy_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}
