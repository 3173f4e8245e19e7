//! Designated zones: named, non-overlapping rectangular discussion areas.

use plaza_core::error::TownError;
use plaza_core::geometry::BoundingBox;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named rectangular region with a discussion topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignatedZone {
    label: String,
    topic: String,
    bounding_box: BoundingBox,
    occupant_ids: Vec<Uuid>,
}

impl DesignatedZone {
    /// Creates an unoccupied zone.
    #[must_use]
    pub fn new(label: impl Into<String>, topic: impl Into<String>, bounding_box: BoundingBox) -> Self {
        Self {
            label: label.into(),
            topic: topic.into(),
            bounding_box,
            occupant_ids: Vec::new(),
        }
    }

    /// Unique key of the zone within its town.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Discussion topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Region covered by the zone.
    #[must_use]
    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    /// Occupants in join order.
    #[must_use]
    pub fn occupant_ids(&self) -> &[Uuid] {
        &self.occupant_ids
    }

    pub(crate) fn add_occupant(&mut self, participant_id: Uuid) {
        self.occupant_ids.push(participant_id);
    }

    pub(crate) fn set_occupants(&mut self, occupant_ids: Vec<Uuid>) {
        self.occupant_ids = occupant_ids;
    }

    /// Removes `participant_id`, preserving the order of the others.
    pub(crate) fn remove_occupant(&mut self, participant_id: Uuid) -> Result<(), TownError> {
        let index = self
            .occupant_ids
            .iter()
            .position(|id| *id == participant_id)
            .ok_or_else(|| TownError::NotAnOccupant {
                participant_id,
                container: format!("zone {:?}", self.label),
            })?;
        self.occupant_ids.remove(index);
        Ok(())
    }
}
