//! Shared, lockable access to a running town.

use std::sync::{Arc, Mutex, MutexGuard};

use plaza_core::clock::Clock;
use plaza_core::credential::CredentialProvider;
use plaza_core::error::TownError;
use tracing::{info, warn};

use super::controller::TownController;
use crate::domain::participant::Participant;
use crate::domain::session::Session;

/// Cloneable handle to one town's controller.
///
/// The lock is only ever held around synchronous controller calls.
#[derive(Debug, Clone)]
pub struct TownHandle {
    inner: Arc<Mutex<TownController>>,
}

/// Outcome of a completed admission.
#[derive(Debug, Clone)]
pub struct Admission {
    /// The admitted participant as it stands on the roster.
    pub participant: Participant,
    /// The session, with its credential attached.
    pub session: Session,
}

impl TownHandle {
    /// Wraps a controller for shared use.
    #[must_use]
    pub fn new(controller: TownController) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, TownController>, TownError> {
        self.inner
            .lock()
            .map_err(|e| TownError::Infrastructure(format!("town lock poisoned: {e}")))
    }

    /// Runs `f` with shared access to the controller.
    ///
    /// # Errors
    ///
    /// Returns `TownError::Infrastructure` if the lock is poisoned.
    pub fn read<R>(&self, f: impl FnOnce(&TownController) -> R) -> Result<R, TownError> {
        let guard = self.lock()?;
        Ok(f(&guard))
    }

    /// Runs `f` with exclusive access to the controller.
    ///
    /// # Errors
    ///
    /// Returns `TownError::Infrastructure` if the lock is poisoned.
    pub fn write<R>(&self, f: impl FnOnce(&mut TownController) -> R) -> Result<R, TownError> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }

    /// Admits a new participant.
    ///
    /// The participant is put on the roster before the credential request is
    /// awaited, so other operations on the town proceed in the meantime.
    ///
    /// # Errors
    ///
    /// Returns `TownError::CredentialProvisioning` if the provider fails, in
    /// which case the participant stays on the roster with an open session,
    /// and `TownError::SessionNotFound` if the session was released before
    /// the credential arrived.
    pub async fn admit_participant(
        &self,
        display_name: &str,
        provider: &dyn CredentialProvider,
        clock: &dyn Clock,
    ) -> Result<Admission, TownError> {
        let participant = Participant::new(display_name);
        let participant_id = participant.id();
        let (town_id, pending) = self.write(|town| {
            let town_id = town.town_id().to_owned();
            (town_id, town.begin_admission(participant, clock.now()))
        })?;

        let credential = match provider.request_credential(&town_id, participant_id).await {
            Ok(credential) => credential,
            Err(e) => {
                warn!(
                    town_id = %town_id,
                    participant_id = %participant_id,
                    error = %e,
                    "credential provisioning failed"
                );
                return Err(e);
            }
        };

        self.write(|town| -> Result<Admission, TownError> {
            let session = town.complete_admission(pending.token(), credential)?;
            let participant = town
                .participant(participant_id)
                .cloned()
                .ok_or(TownError::ParticipantNotFound(participant_id))?;
            info!(town_id = %town_id, participant_id = %participant_id, "participant admitted");
            Ok(Admission {
                participant,
                session,
            })
        })?
    }
}
