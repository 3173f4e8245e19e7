//! Test credential providers.

use async_trait::async_trait;
use plaza_core::credential::{Credential, CredentialProvider};
use plaza_core::error::TownError;
use tokio::sync::Notify;
use uuid::Uuid;

/// Issues the same credential for every request.
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    token: String,
}

impl StaticCredentialProvider {
    /// Creates a provider that always returns `token`.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn request_credential(
        &self,
        _town_id: &str,
        _participant_id: Uuid,
    ) -> Result<Credential, TownError> {
        Ok(Credential::new(self.token.clone()))
    }
}

/// A provider whose every request fails.
#[derive(Debug, Clone, Copy)]
pub struct FailingCredentialProvider;

#[async_trait]
impl CredentialProvider for FailingCredentialProvider {
    async fn request_credential(
        &self,
        _town_id: &str,
        _participant_id: Uuid,
    ) -> Result<Credential, TownError> {
        Err(TownError::CredentialProvisioning(
            "simulated provider failure".to_owned(),
        ))
    }
}

/// A provider that holds each request until the test releases it.
///
/// Lets a test act on the town while an admission is suspended on its
/// credential.
#[derive(Debug)]
pub struct GatedCredentialProvider {
    token: String,
    requested: Notify,
    released: Notify,
}

impl GatedCredentialProvider {
    /// Creates a gated provider that issues `token` once released.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            requested: Notify::new(),
            released: Notify::new(),
        }
    }

    /// Waits until a request has reached the provider.
    pub async fn wait_for_request(&self) {
        self.requested.notified().await;
    }

    /// Lets one pending (or the next) request complete.
    pub fn release(&self) {
        self.released.notify_one();
    }
}

#[async_trait]
impl CredentialProvider for GatedCredentialProvider {
    async fn request_credential(
        &self,
        _town_id: &str,
        _participant_id: Uuid,
    ) -> Result<Credential, TownError> {
        self.requested.notify_one();
        self.released.notified().await;
        Ok(Credential::new(self.token.clone()))
    }
}
