//! Sessions issued to admitted participants.

use chrono::{DateTime, Utc};
use plaza_core::credential::Credential;
use serde::Serialize;
use uuid::Uuid;

/// Binds a connection's session token to a participant on the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    token: String,
    participant_id: Uuid,
    credential: Option<Credential>,
    admitted_at: DateTime<Utc>,
}

impl Session {
    pub(crate) fn new(participant_id: Uuid, admitted_at: DateTime<Utc>) -> Self {
        Self {
            token: Uuid::new_v4().simple().to_string(),
            participant_id,
            credential: None,
            admitted_at,
        }
    }

    /// Token the transport presents to identify this session.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Participant this session belongs to.
    #[must_use]
    pub fn participant_id(&self) -> Uuid {
        self.participant_id
    }

    /// Media credential, once provisioning has completed.
    #[must_use]
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// When the participant was put on the roster.
    #[must_use]
    pub fn admitted_at(&self) -> DateTime<Utc> {
        self.admitted_at
    }

    pub(crate) fn set_credential(&mut self, credential: Credential) {
        self.credential = Some(credential);
    }
}
