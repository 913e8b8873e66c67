use crate::errors::ApiError;

/// Bcrypt cost factor. Ten rounds matches the tuning the platform has always
/// used; raising it is a config change, not a code change elsewhere.
pub const BCRYPT_COST: u32 = 10;

/// hash_password
///
/// One-way, salted hash of a plaintext password. The salt is randomized by
/// bcrypt itself, so hashing the same plaintext twice yields different
/// strings. Runs on the blocking thread pool — bcrypt is CPU-bound by design
/// and must not stall the async runtime.
pub async fn hash_password(password: &str) -> Result<String, ApiError> {
    let password = password.to_string();

    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| {
            tracing::error!("password hash task join error: {e}");
            ApiError::Internal
        })?
        .map_err(|e| {
            tracing::error!("bcrypt hash error: {e}");
            ApiError::Internal
        })
}

/// verify_password
///
/// Returns true iff `password` was the input to `hash`. bcrypt's comparison
/// is constant-time. A corrupt or non-bcrypt hash fails closed: it verifies
/// as `false` (with a server-side warning), never as authenticated.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    let password = password.to_string();
    let hash = hash.to_string();

    let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| {
            tracing::error!("password verify task join error: {e}");
            ApiError::Internal
        })?;

    match outcome {
        Ok(matched) => Ok(matched),
        Err(e) => {
            tracing::warn!("stored password hash rejected by bcrypt: {e}");
            Ok(false)
        }
    }
}
