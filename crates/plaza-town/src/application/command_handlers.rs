//! Command handlers for the town context.
//!
//! Each handler resolves the target town through the registry, checks the
//! caller's session or password, and applies the command to the controller.

use plaza_core::clock::Clock;
use plaza_core::command::Command;
use plaza_core::credential::{Credential, CredentialProvider};
use plaza_core::error::TownError;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::controller::TownController;
use super::query_handlers::TownView;
use super::registry::TownsStore;
use crate::domain::commands::{CreateTown, CreateZone, DeleteTown, JoinTown, SendMessage, UpdateTown};
use crate::domain::group::Message;
use crate::domain::session::Session;
use crate::domain::zone::DesignatedZone;

/// Result of creating a town.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedTown {
    /// Identifier of the new town.
    pub town_id: String,
    /// Password required for later updates; shown only once.
    pub update_password: String,
}

/// Result of joining a town.
#[derive(Debug, Clone, Serialize)]
pub struct JoinedTown {
    /// Token identifying the new session.
    pub session_token: String,
    /// Identifier of the new participant.
    pub participant_id: Uuid,
    /// Media credential for the participant.
    pub credential: Credential,
    /// The town as it stood once admission completed.
    pub town: TownView,
}

fn participant_for_session(town: &TownController, token: &str) -> Result<Uuid, TownError> {
    town.session_by_token(token)
        .map(Session::participant_id)
        .ok_or(TownError::SessionNotFound)
}

/// Handles the `CreateTown` command.
///
/// # Errors
///
/// Returns `TownError::Validation` for a blank friendly name.
pub fn handle_create_town(
    command: &CreateTown,
    store: &TownsStore,
) -> Result<CreatedTown, TownError> {
    let town = store.create_town(&command.friendly_name, command.is_publicly_listed)?;
    let created = town.read(|t| CreatedTown {
        town_id: t.town_id().to_owned(),
        update_password: t.update_password().to_owned(),
    })?;
    info!(
        correlation_id = %command.correlation_id(),
        command = command.command_type(),
        town_id = %created.town_id,
        "handled"
    );
    Ok(created)
}

/// Handles the `UpdateTown` command.
///
/// # Errors
///
/// Returns `TownNotFound`, `InvalidUpdatePassword` or `Validation`.
pub fn handle_update_town(command: &UpdateTown, store: &TownsStore) -> Result<(), TownError> {
    store.update_town(
        &command.town_id,
        &command.update_password,
        command.friendly_name.as_deref(),
        command.is_publicly_listed,
    )
}

/// Handles the `DeleteTown` command.
///
/// # Errors
///
/// Returns `TownNotFound` or `InvalidUpdatePassword`.
pub fn handle_delete_town(command: &DeleteTown, store: &TownsStore) -> Result<(), TownError> {
    store.delete_town(&command.town_id, &command.update_password)
}

/// Handles the `JoinTown` command: admits a participant and returns its
/// session together with a snapshot of the town.
///
/// # Errors
///
/// Returns `Validation` for a blank display name, `TownNotFound` for an
/// unknown town and `CredentialProvisioning` if the provider fails.
pub async fn handle_join_town(
    command: &JoinTown,
    store: &TownsStore,
    provider: &dyn CredentialProvider,
    clock: &dyn Clock,
) -> Result<JoinedTown, TownError> {
    if command.display_name.trim().is_empty() {
        return Err(TownError::Validation(
            "display name must not be empty".to_owned(),
        ));
    }
    let town = store.get(&command.town_id)?;
    let admission = town
        .admit_participant(&command.display_name, provider, clock)
        .await?;
    let credential = admission
        .session
        .credential()
        .cloned()
        .ok_or_else(|| TownError::CredentialProvisioning("no credential issued".to_owned()))?;
    let view = town.read(TownView::of)?;

    Ok(JoinedTown {
        session_token: admission.session.token().to_owned(),
        participant_id: admission.participant.id(),
        credential,
        town: view,
    })
}

/// Handles the `CreateZone` command.
///
/// # Errors
///
/// Returns `TownNotFound`, `SessionNotFound` for an unrecognized session, or
/// the zone rejection raised by the controller.
pub fn handle_create_zone(command: &CreateZone, store: &TownsStore) -> Result<(), TownError> {
    let town = store.get(&command.town_id)?;
    town.write(|t| {
        participant_for_session(t, &command.session_token)?;
        t.create_designated_zone(DesignatedZone::new(
            command.label.clone(),
            command.topic.clone(),
            command.bounding_box,
        ))
    })?
}

/// Handles the `SendMessage` command. The message is timestamped with
/// `clock` and attributed to the session's participant.
///
/// # Errors
///
/// Returns `TownNotFound`, `SessionNotFound`, or `GroupNotFound` if the
/// target group does not exist.
pub fn handle_send_message(
    command: &SendMessage,
    store: &TownsStore,
    clock: &dyn Clock,
) -> Result<Message, TownError> {
    let town = store.get(&command.town_id)?;
    town.write(|t| {
        let author_id = participant_for_session(t, &command.session_token)?;
        let message = Message {
            author_id,
            group_id: command.group_id,
            body: command.body.clone(),
            created_at: clock.now(),
            is_private: command.private_recipient_id.is_some(),
            private_recipient_id: command.private_recipient_id,
        };
        t.record_message(message.clone())?;
        Ok(message)
    })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::participant::Position;
    use chrono::{DateTime, TimeZone, Utc};
    use plaza_core::geometry::BoundingBox;
    use plaza_test_support::{FailingCredentialProvider, FixedClock, MockRng, StaticCredentialProvider};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn store_with_town() -> (TownsStore, CreatedTown) {
        let store = TownsStore::new(Box::new(MockRng), None);
        let created = handle_create_town(
            &CreateTown {
                correlation_id: Uuid::new_v4(),
                friendly_name: "Plaza".to_owned(),
                is_publicly_listed: true,
            },
            &store,
        )
        .unwrap();
        (store, created)
    }

    async fn join(store: &TownsStore, town_id: &str, name: &str) -> JoinedTown {
        handle_join_town(
            &JoinTown {
                correlation_id: Uuid::new_v4(),
                town_id: town_id.to_owned(),
                display_name: name.to_owned(),
            },
            store,
            &StaticCredentialProvider::new("media-token"),
            &FixedClock(fixed_now()),
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_handle_create_town_returns_id_and_password() {
        let (store, created) = store_with_town();

        assert_eq!(created.town_id, "11111111");
        assert_eq!(created.update_password.len(), 24);
        assert!(store.get(&created.town_id).is_ok());
    }

    #[tokio::test]
    async fn test_handle_join_town_returns_session_and_snapshot() {
        // Arrange
        let (store, created) = store_with_town();

        // Act
        let joined = join(&store, &created.town_id, "ada").await;

        // Assert
        assert_eq!(joined.credential, Credential::new("media-token"));
        assert_eq!(joined.town.participants.len(), 1);
        assert_eq!(joined.town.participants[0].id(), joined.participant_id);
        let town = store.get(&created.town_id).unwrap();
        let resolved = town
            .read(|t| t.session_by_token(&joined.session_token).map(Session::participant_id))
            .unwrap();
        assert_eq!(resolved, Some(joined.participant_id));
    }

    #[tokio::test]
    async fn test_handle_join_town_rejects_blank_name() {
        let (store, created) = store_with_town();

        let result = handle_join_town(
            &JoinTown {
                correlation_id: Uuid::new_v4(),
                town_id: created.town_id.clone(),
                display_name: " ".to_owned(),
            },
            &store,
            &StaticCredentialProvider::new("media-token"),
            &FixedClock(fixed_now()),
        )
        .await;

        assert!(matches!(result, Err(TownError::Validation(_))));
    }

    #[tokio::test]
    async fn test_handle_join_town_propagates_provider_failure() {
        let (store, created) = store_with_town();

        let result = handle_join_town(
            &JoinTown {
                correlation_id: Uuid::new_v4(),
                town_id: created.town_id.clone(),
                display_name: "ada".to_owned(),
            },
            &store,
            &FailingCredentialProvider,
            &FixedClock(fixed_now()),
        )
        .await;

        match result {
            Err(TownError::CredentialProvisioning(_)) => {}
            other => panic!("expected CredentialProvisioning, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handle_create_zone_requires_known_session() {
        // Arrange
        let (store, created) = store_with_town();
        let joined = join(&store, &created.town_id, "ada").await;
        let command = |token: &str| CreateZone {
            correlation_id: Uuid::new_v4(),
            town_id: created.town_id.clone(),
            session_token: token.to_owned(),
            label: "nook".to_owned(),
            topic: "rust".to_owned(),
            bounding_box: BoundingBox::new(200.0, 200.0, 20.0, 20.0),
        };

        // Act
        let rejected = handle_create_zone(&command("forged"), &store);
        let accepted = handle_create_zone(&command(&joined.session_token), &store);

        // Assert
        assert_eq!(rejected.unwrap_err(), TownError::SessionNotFound);
        assert!(accepted.is_ok());
        let zones = store
            .get(&created.town_id)
            .unwrap()
            .read(|t| t.zones().len())
            .unwrap();
        assert_eq!(zones, 1);
    }

    #[tokio::test]
    async fn test_handle_send_message_records_timestamped_message() {
        // Arrange
        let (store, created) = store_with_town();
        let ada = join(&store, &created.town_id, "ada").await;
        let bob = join(&store, &created.town_id, "bob").await;
        let town = store.get(&created.town_id).unwrap();
        let group_id = town
            .write(|t| {
                t.update_participant_location(bob.participant_id, Position::at(300.0, 300.0))
                    .unwrap();
                t.update_participant_location(ada.participant_id, Position::at(310.0, 310.0))
                    .unwrap();
                t.participant(ada.participant_id).unwrap().active_group().unwrap()
            })
            .unwrap();

        // Act
        let message = handle_send_message(
            &SendMessage {
                correlation_id: Uuid::new_v4(),
                town_id: created.town_id.clone(),
                session_token: ada.session_token.clone(),
                group_id,
                body: "hello".to_owned(),
                private_recipient_id: Some(bob.participant_id),
            },
            &store,
            &FixedClock(fixed_now()),
        )
        .unwrap();

        // Assert
        assert_eq!(message.author_id, ada.participant_id);
        assert_eq!(message.created_at, fixed_now());
        assert!(message.is_private);
        let log = town
            .read(|t| t.group(group_id).unwrap().messages().to_vec())
            .unwrap();
        assert_eq!(log, vec![message]);
    }

    #[tokio::test]
    async fn test_handle_send_message_to_unknown_group_fails() {
        let (store, created) = store_with_town();
        let ada = join(&store, &created.town_id, "ada").await;
        let missing = Uuid::new_v4();

        let result = handle_send_message(
            &SendMessage {
                correlation_id: Uuid::new_v4(),
                town_id: created.town_id.clone(),
                session_token: ada.session_token.clone(),
                group_id: missing,
                body: "hello".to_owned(),
                private_recipient_id: None,
            },
            &store,
            &FixedClock(fixed_now()),
        );

        assert_eq!(result.unwrap_err(), TownError::GroupNotFound(missing));
    }

    #[test]
    fn test_handle_update_and_delete_town_check_password() {
        // Arrange
        let (store, created) = store_with_town();

        // Act
        let update = handle_update_town(
            &UpdateTown {
                correlation_id: Uuid::new_v4(),
                town_id: created.town_id.clone(),
                update_password: "wrong".to_owned(),
                friendly_name: Some("Agora".to_owned()),
                is_publicly_listed: None,
            },
            &store,
        );
        let delete = handle_delete_town(
            &DeleteTown {
                correlation_id: Uuid::new_v4(),
                town_id: created.town_id.clone(),
                update_password: created.update_password.clone(),
            },
            &store,
        );

        // Assert
        assert_eq!(update.unwrap_err(), TownError::InvalidUpdatePassword);
        assert!(delete.is_ok());
        assert!(store.list_public().unwrap().is_empty());
    }
}
