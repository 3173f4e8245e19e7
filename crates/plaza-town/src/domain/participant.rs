//! Participants: one connected user and their live position.

use plaza_core::geometry::{distance, point_in_circle, point_in_rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::group::{AdHocGroup, TRIGGER_RADIUS};
use super::zone::DesignatedZone;

/// Direction a participant's avatar is facing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// Facing the viewer.
    #[default]
    Front,
    /// Facing away from the viewer.
    Back,
    /// Facing left.
    Left,
    /// Facing right.
    Right,
}

/// A participant's reported location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Map x coordinate.
    pub x: f64,
    /// Map y coordinate.
    pub y: f64,
    /// Avatar direction.
    #[serde(default)]
    pub facing: Facing,
    /// Whether the avatar is mid-movement.
    #[serde(default)]
    pub is_moving: bool,
    /// Zone the client says it is standing in. Authoritative over the
    /// coordinates when resolving zone membership.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_label: Option<String>,
}

impl Position {
    /// A stationary, front-facing position with no zone label.
    #[must_use]
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    /// Returns the same position with a self-reported zone label.
    #[must_use]
    pub fn in_zone(mut self, label: impl Into<String>) -> Self {
        self.zone_label = Some(label.into());
        self
    }
}

/// One connected user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    id: Uuid,
    display_name: String,
    pub(crate) position: Position,
    pub(crate) active_zone: Option<String>,
    pub(crate) active_group: Option<Uuid>,
}

impl Participant {
    /// Creates a participant at the origin with a fresh identifier.
    #[must_use]
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
            position: Position::default(),
            active_zone: None,
            active_group: None,
        }
    }

    /// Places a not-yet-admitted participant at a spawn position.
    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Returns the participant identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the display name. Not unique within a town.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the last reported position.
    #[must_use]
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Label of the zone the participant occupies, if any.
    #[must_use]
    pub fn active_zone(&self) -> Option<&str> {
        self.active_zone.as_deref()
    }

    /// Identifier of the group the participant belongs to, if any.
    #[must_use]
    pub fn active_group(&self) -> Option<Uuid> {
        self.active_group
    }

    /// Whether the position is strictly inside the zone's bounding box.
    #[must_use]
    pub fn is_within(&self, zone: &DesignatedZone) -> bool {
        point_in_rect(self.position.x, self.position.y, zone.bounding_box())
    }

    /// Whether `other` is closer than the trigger radius.
    #[must_use]
    pub fn is_near(&self, other: &Participant) -> bool {
        distance(
            self.position.x,
            self.position.y,
            other.position.x,
            other.position.y,
        ) < TRIGGER_RADIUS
    }

    /// Whether the position is strictly inside the group's anchor circle.
    #[must_use]
    pub fn is_within_group(&self, group: &AdHocGroup) -> bool {
        point_in_circle(self.position.x, self.position.y, group.anchor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plaza_core::geometry::BoundingBox;

    fn participant_at(x: f64, y: f64) -> Participant {
        let mut participant = Participant::new("tester");
        participant.position = Position::at(x, y);
        participant
    }

    #[test]
    fn test_new_participant_starts_at_origin_without_associations() {
        let participant = Participant::new("ada");

        assert_eq!(participant.display_name(), "ada");
        assert_eq!(participant.position(), &Position::default());
        assert_eq!(participant.position().facing, Facing::Front);
        assert!(participant.active_zone().is_none());
        assert!(participant.active_group().is_none());
    }

    #[test]
    fn test_is_within_uses_open_interval() {
        let zone = DesignatedZone::new("nook", "rust", BoundingBox::new(5.0, 5.0, 5.0, 5.0));

        assert!(participant_at(5.0, 5.0).is_within(&zone));
        assert!(participant_at(7.0, 5.0).is_within(&zone));
        assert!(!participant_at(7.5, 5.0).is_within(&zone));
        assert!(!participant_at(5.0, 10.0).is_within(&zone));
        assert!(!participant_at(20.0, 5.0).is_within(&zone));
    }

    #[test]
    fn test_is_near_is_symmetric_and_strict() {
        let anchor = participant_at(0.0, 0.0);
        let close = participant_at(48.0, 63.0);
        let boundary = participant_at(48.0, 64.0);

        assert!(anchor.is_near(&close));
        assert!(close.is_near(&anchor));
        assert!(!anchor.is_near(&boundary));
    }

    #[test]
    fn test_is_near_rejects_equal_offsets_beyond_radius() {
        let anchor = participant_at(25.0, 25.0);
        let far = participant_at(25.0 + 2.0 * TRIGGER_RADIUS, 25.0 + 2.0 * TRIGGER_RADIUS);

        assert!(!anchor.is_near(&far));
    }

    #[test]
    fn test_is_within_group_uses_anchor_circle() {
        let anchor = participant_at(100.0, 100.0);
        let group = AdHocGroup::new(&anchor);

        assert!(participant_at(150.0, 150.0).is_within_group(&group));
        // Inside the square around the circle, outside the circle itself.
        assert!(!participant_at(170.0, 170.0).is_within_group(&group));
        assert!(!participant_at(180.0, 100.0).is_within_group(&group));
    }

    #[test]
    fn test_position_deserializes_with_defaults() {
        let position: Position = serde_json::from_value(serde_json::json!({
            "x": 3.0,
            "y": 4.0,
        }))
        .unwrap();

        assert_eq!(position, Position::at(3.0, 4.0));
    }

    #[test]
    fn test_position_carries_zone_label_and_facing() {
        let position: Position = serde_json::from_value(serde_json::json!({
            "x": 1.0,
            "y": 2.0,
            "facing": "left",
            "is_moving": true,
            "zone_label": "nook",
        }))
        .unwrap();

        assert_eq!(position.facing, Facing::Left);
        assert!(position.is_moving);
        assert_eq!(position.zone_label.as_deref(), Some("nook"));
    }
}
