//! Outbound town events, as delivered to transports.

use serde::{Deserialize, Serialize};

use super::group::{AdHocGroup, Message};
use super::participant::Participant;
use super::zone::DesignatedZone;

/// A change notification carrying a snapshot of the affected entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum TownEvent {
    /// A participant finished admission.
    ParticipantJoined(Participant),
    /// A participant reported a new position.
    ParticipantMoved(Participant),
    /// A participant's session ended.
    ParticipantDisconnected(Participant),
    /// A participant joined or left an ad-hoc group.
    ParticipantGroupChanged(Participant),
    /// A group was created or its roster or log changed.
    GroupUpdated(AdHocGroup),
    /// A group dissolved.
    GroupDestroyed(AdHocGroup),
    /// A zone was created or its roster changed.
    ZoneUpdated(DesignatedZone),
    /// A zone emptied out and was removed.
    ZoneDestroyed(DesignatedZone),
    /// A message was recorded in a group.
    MessageReceived(Message),
    /// The town is shutting down; every connection should close.
    TownClosing,
}

impl TownEvent {
    /// Wire name of the event.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ParticipantJoined(_) => "participant-joined",
            Self::ParticipantMoved(_) => "participant-moved",
            Self::ParticipantDisconnected(_) => "participant-disconnected",
            Self::ParticipantGroupChanged(_) => "participant-group-changed",
            Self::GroupUpdated(_) => "group-updated",
            Self::GroupDestroyed(_) => "group-destroyed",
            Self::ZoneUpdated(_) => "zone-updated",
            Self::ZoneDestroyed(_) => "zone-destroyed",
            Self::MessageReceived(_) => "message-received",
            Self::TownClosing => "town-closing",
        }
    }
}
