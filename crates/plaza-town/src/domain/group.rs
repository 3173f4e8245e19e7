//! Ad-hoc groups: proximity-triggered chats and their message logs.

use chrono::{DateTime, Utc};
use plaza_core::error::TownError;
use plaza_core::geometry::AnchorCircle;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::participant::Participant;

/// Distance under which participants form or join an ad-hoc group.
pub const TRIGGER_RADIUS: f64 = 80.0;

/// A chat message posted to an ad-hoc group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Participant who wrote the message.
    pub author_id: Uuid,
    /// Group the message belongs to.
    pub group_id: Uuid,
    /// Message text.
    pub body: String,
    /// When the message was sent.
    pub created_at: DateTime<Utc>,
    /// Whether the message is addressed to a single recipient.
    pub is_private: bool,
    /// Recipient of a private message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_recipient_id: Option<Uuid>,
}

/// A circular chat group anchored where its creator stood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdHocGroup {
    id: Uuid,
    anchor: AnchorCircle,
    occupant_ids: Vec<Uuid>,
    messages: Vec<Message>,
}

impl AdHocGroup {
    /// Creates a group anchored at `anchor`'s position with `anchor` as its
    /// first occupant.
    #[must_use]
    pub fn new(anchor: &Participant) -> Self {
        let position = anchor.position();
        Self {
            id: Uuid::new_v4(),
            anchor: AnchorCircle {
                x: position.x,
                y: position.y,
                radius: TRIGGER_RADIUS,
            },
            occupant_ids: vec![anchor.id()],
            messages: Vec::new(),
        }
    }

    /// Group identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Anchor point and radius.
    #[must_use]
    pub fn anchor(&self) -> &AnchorCircle {
        &self.anchor
    }

    /// Occupants in join order; index 0 is the creator while it remains.
    #[must_use]
    pub fn occupant_ids(&self) -> &[Uuid] {
        &self.occupant_ids
    }

    /// Messages in the order they were recorded.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Appends a message to the log.
    pub fn append_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub(crate) fn add_occupant(&mut self, participant_id: Uuid) {
        self.occupant_ids.push(participant_id);
    }

    pub(crate) fn remove_occupant(&mut self, participant_id: Uuid) -> Result<(), TownError> {
        let index = self
            .occupant_ids
            .iter()
            .position(|id| *id == participant_id)
            .ok_or_else(|| TownError::NotAnOccupant {
                participant_id,
                container: format!("group {}", self.id),
            })?;
        self.occupant_ids.remove(index);
        Ok(())
    }
}
