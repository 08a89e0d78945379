use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to gather salt entropy: {0}")]
    Entropy(String),
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("password hashing task failed: {0}")]
    Task(String),
}

/// Argon2id password hashing / verification.
///
/// `verify` never errors: a mismatch and a malformed stored hash both yield `false`.
/// Request paths use the `*_blocking_pool` variants so Argon2 runs off the async workers.
#[derive(Clone)]
pub struct CredentialVerifier {
    argon2: Argon2<'static>,
    // Verified against when the account does not exist, so that an unknown
    // email costs the same as a wrong password.
    dummy_hash: String,
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("params", self.argon2.params())
            .finish()
    }
}

impl CredentialVerifier {
    pub fn new() -> Result<Self, CredentialError> {
        Self::with_params(Params::default())
    }

    pub fn with_params(params: Params) -> Result<Self, CredentialError> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_with(&argon2, "orders-api-dummy-password")?;
        Ok(Self { argon2, dummy_hash })
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        hash_with(&self.argon2, plaintext)
    }

    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// Burn one verification against the internal dummy hash. Always false.
    pub fn verify_dummy(&self, plaintext: &str) -> bool {
        let _ = self.verify(plaintext, &self.dummy_hash);
        false
    }

    pub async fn hash_on_blocking_pool(&self, plaintext: &str) -> Result<String, CredentialError> {
        let plaintext = plaintext.to_owned();
        self.run_blocking(move |v| v.hash(&plaintext)).await?
    }

    pub async fn verify_on_blocking_pool(
        &self,
        plaintext: &str,
        hash: &str,
    ) -> Result<bool, CredentialError> {
        let (plaintext, hash) = (plaintext.to_owned(), hash.to_owned());
        self.run_blocking(move |v| v.verify(&plaintext, &hash)).await
    }

    pub async fn verify_dummy_on_blocking_pool(
        &self,
        plaintext: &str,
    ) -> Result<bool, CredentialError> {
        let plaintext = plaintext.to_owned();
        self.run_blocking(move |v| v.verify_dummy(&plaintext)).await
    }

    async fn run_blocking<T, F>(&self, f: F) -> Result<T, CredentialError>
    where
        T: Send + 'static,
        F: FnOnce(&CredentialVerifier) -> T + Send + 'static,
    {
        let verifier = self.clone();
        tokio::task::spawn_blocking(move || f(&verifier))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "password hashing task failed");
                CredentialError::Task(e.to_string())
            })
    }
}

fn hash_with(argon2: &Argon2<'_>, plaintext: &str) -> Result<String, CredentialError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| CredentialError::Entropy(e.to_string()))?;
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| CredentialError::Hash(e.to_string()))?;

    let phc = argon2
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| CredentialError::Hash(e.to_string()))?
        .to_string();
    Ok(phc)
}
