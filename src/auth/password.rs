use bcrypt::{hash, verify, BcryptError};
use thiserror::Error;

/// Work factor used when none is configured
pub use bcrypt::DEFAULT_COST;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Bcrypt(#[from] BcryptError),

    #[error("password hashing task failed: {0}")]
    Task(String),
}

/// Hash a password with bcrypt at the given cost. Runs on the blocking pool.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    let password = password.to_string();

    tokio::task::spawn_blocking(move || hash(password, cost).map_err(PasswordError::from))
        .await
        .map_err(|e| PasswordError::Task(e.to_string()))?
}

/// Check a password against a stored bcrypt hash. A stored value that is not
/// a bcrypt hash is an error, not a mismatch.
pub async fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordError> {
    let password = password.to_string();
    let stored = stored.to_string();

    tokio::task::spawn_blocking(move || verify(password, &stored).map_err(PasswordError::from))
        .await
        .map_err(|e| PasswordError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    // bcrypt's minimum cost keeps the tests fast
    const TEST_COST: u32 = 4;

    #[tokio::test]
    async fn verifies_matching_password() {
        let stored = hash_password("merry", TEST_COST).await.unwrap();
        assert!(stored.starts_with("$2"), "not a bcrypt hash: {}", stored);
        assert!(verify_password("merry", &stored).await.unwrap());
        assert!(!verify_password("Merry", &stored).await.unwrap());
    }

    #[tokio::test]
    async fn salts_differ_per_hash() {
        let first = hash_password("merry", TEST_COST).await.unwrap();
        let second = hash_password("merry", TEST_COST).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn cost_is_encoded_in_the_hash() {
        let stored = hash_password("merry", TEST_COST).await.unwrap();
        assert!(stored.contains("$04$"), "{}", stored);

        let stored = hash_password("merry", 6).await.unwrap();
        assert!(stored.contains("$06$"), "{}", stored);
    }

    #[tokio::test]
    async fn malformed_hash_is_an_error() {
        assert!(verify_password("merry", "merry").await.is_err());
        assert!(verify_password("", "").await.is_err());
    }

    #[tokio::test]
    async fn cost_below_minimum_is_an_error() {
        assert!(matches!(
            hash_password("merry", 3).await,
            Err(PasswordError::Bcrypt(_))
        ));
    }
}
