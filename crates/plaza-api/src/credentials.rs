//! Media credential issuance.

use async_trait::async_trait;
use plaza_core::credential::{Credential, CredentialProvider};
use plaza_core::error::TownError;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::AppError;

/// Derives each credential as the hex SHA-256 digest of a server secret, the
/// town id and the participant id.
pub struct HashedCredentialProvider {
    secret: String,
}

impl std::fmt::Debug for HashedCredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashedCredentialProvider")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl HashedCredentialProvider {
    /// Creates a provider keyed by `secret`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `secret` is empty.
    pub fn new(secret: impl Into<String>) -> Result<Self, AppError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(AppError::Config("credential secret must not be empty".to_string()));
        }
        Ok(Self { secret })
    }
}

#[async_trait]
impl CredentialProvider for HashedCredentialProvider {
    async fn request_credential(
        &self,
        town_id: &str,
        participant_id: Uuid,
    ) -> Result<Credential, TownError> {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(town_id.as_bytes());
        hasher.update(participant_id.as_bytes());
        Ok(Credential::new(hex::encode(hasher.finalize())))
    }
}
