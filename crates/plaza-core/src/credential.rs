//! Credential provisioning abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TownError;

/// Opaque access credential for a participant's media stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Wraps a provider-issued token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// External service that issues credentials for participants joining a town.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Requests a credential for `participant_id` in `town_id`.
    ///
    /// Failures must be reported as `TownError::CredentialProvisioning` so the
    /// caller can tell them apart from rejected requests.
    async fn request_credential(
        &self,
        town_id: &str,
        participant_id: Uuid,
    ) -> Result<Credential, TownError>;
}
