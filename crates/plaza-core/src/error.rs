//! Error taxonomy for town coordination.

use thiserror::Error;
use uuid::Uuid;

/// Top-level error type for every town operation.
///
/// Rejected requests are detected before any mutation, so receiving one of
/// these never implies a partially applied change.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TownError {
    /// A zone with the same label already exists in the town.
    #[error("a zone labelled {0:?} already exists")]
    DuplicateZoneLabel(String),

    /// A zone was submitted without a topic.
    #[error("zone topic must not be empty")]
    EmptyTopic,

    /// The zone's bounding box intersects an existing zone.
    #[error("zone {label:?} overlaps existing zone {existing:?}")]
    OverlappingZone {
        /// Label of the rejected zone.
        label: String,
        /// Label of the zone it collides with.
        existing: String,
    },

    /// No ad-hoc group with this identifier exists.
    #[error("group not found: {0}")]
    GroupNotFound(Uuid),

    /// No designated zone with this label exists.
    #[error("zone not found: {0:?}")]
    ZoneNotFound(String),

    /// No participant with this identifier is on the roster.
    #[error("participant not found: {0}")]
    ParticipantNotFound(Uuid),

    /// The session token is not known to the town.
    #[error("session not found")]
    SessionNotFound,

    /// No town with this identifier is registered.
    #[error("town not found: {0}")]
    TownNotFound(String),

    /// The supplied update password does not match the town's.
    #[error("invalid town update password")]
    InvalidUpdatePassword,

    /// A request failed input validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// A participant was removed from a zone or group it does not occupy.
    #[error("participant {participant_id} does not occupy {container}")]
    NotAnOccupant {
        /// The participant that was being removed.
        participant_id: Uuid,
        /// Human-readable name of the zone or group.
        container: String,
    },

    /// The credential provisioning collaborator failed.
    #[error("credential provisioning failed: {0}")]
    CredentialProvisioning(String),

    /// Internal failure, such as a poisoned lock.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
