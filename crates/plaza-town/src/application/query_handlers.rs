//! Query handlers for the town context.
//!
//! Read-only views built from a town's current state.

use plaza_core::error::TownError;
use serde::Serialize;

use super::controller::TownController;
use super::registry::{TownListing, TownsStore};
use crate::domain::group::AdHocGroup;
use crate::domain::participant::Participant;
use crate::domain::zone::DesignatedZone;

/// Snapshot of a town as a newly connected client needs it.
///
/// The update password is deliberately absent.
#[derive(Debug, Clone, Serialize)]
pub struct TownView {
    /// Town identifier.
    pub town_id: String,
    /// Display name.
    pub friendly_name: String,
    /// Whether the town appears in the public listing.
    pub is_publicly_listed: bool,
    /// Connected subscribers.
    pub current_occupancy: usize,
    /// Advertised capacity.
    pub maximum_occupancy: usize,
    /// Roster in admission order.
    pub participants: Vec<Participant>,
    /// Zones in creation order.
    pub zones: Vec<DesignatedZone>,
    /// Groups in creation order.
    pub groups: Vec<AdHocGroup>,
}

impl TownView {
    /// Captures the controller's current state.
    #[must_use]
    pub fn of(town: &TownController) -> Self {
        Self {
            town_id: town.town_id().to_owned(),
            friendly_name: town.friendly_name().to_owned(),
            is_publicly_listed: town.is_publicly_listed(),
            current_occupancy: town.occupancy(),
            maximum_occupancy: town.capacity(),
            participants: town.participants().to_vec(),
            zones: town.zones().to_vec(),
            groups: town.groups().to_vec(),
        }
    }
}

/// Retrieves a snapshot of a town by its identifier.
///
/// # Errors
///
/// Returns `TownError::TownNotFound` if no town has this identifier.
pub fn get_town_by_id(town_id: &str, store: &TownsStore) -> Result<TownView, TownError> {
    store.get(town_id)?.read(TownView::of)
}

/// Lists the publicly visible towns.
///
/// # Errors
///
/// Returns `TownError::Infrastructure` if the registry lock is poisoned.
pub fn list_public_towns(store: &TownsStore) -> Result<Vec<TownListing>, TownError> {
    store.list_public()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::participant::Position;
    use chrono::{TimeZone, Utc};
    use plaza_core::geometry::BoundingBox;
    use plaza_test_support::MockRng;

    #[test]
    fn test_get_town_by_id_returns_snapshot_without_password() {
        // Arrange
        let store = TownsStore::new(Box::new(MockRng), None);
        let town = store.create_town("Plaza", true).unwrap();
        let fixed_now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        town.write(|t| {
            let session = t.begin_admission(Participant::new("ada"), fixed_now);
            t.update_participant_location(session.participant_id(), Position::at(5.0, 5.0))
                .unwrap();
            t.create_designated_zone(DesignatedZone::new(
                "nook",
                "rust",
                BoundingBox::new(100.0, 100.0, 10.0, 10.0),
            ))
            .unwrap();
        })
        .unwrap();

        // Act
        let view = get_town_by_id("11111111", &store).unwrap();

        // Assert
        assert_eq!(view.friendly_name, "Plaza");
        assert_eq!(view.participants.len(), 1);
        assert_eq!(view.zones.len(), 1);
        assert!(view.groups.is_empty());
        assert_eq!(view.maximum_occupancy, 50);
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("update_password").is_none());
    }

    #[test]
    fn test_get_town_by_id_returns_not_found() {
        let store = TownsStore::new(Box::new(MockRng), None);

        let result = get_town_by_id("MISSING0", &store);

        match result {
            Err(TownError::TownNotFound(id)) => assert_eq!(id, "MISSING0"),
            other => panic!("expected TownNotFound, got {other:?}"),
        }
    }
}
