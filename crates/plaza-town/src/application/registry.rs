//! Process-wide registry of live towns.

use std::sync::{Mutex, MutexGuard};

use plaza_core::error::TownError;
use plaza_core::rng::{DeterministicRng, random_string};
use serde::Serialize;
use tracing::{info, instrument};

use super::controller::TownController;
use super::handle::TownHandle;

/// Characters town identifiers are drawn from.
pub const TOWN_ID_ALPHABET: &str = "1234567890ABCDEF";
/// Length of a generated town identifier.
pub const TOWN_ID_LENGTH: usize = 8;
/// Characters update passwords are drawn from.
pub const PASSWORD_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";
/// Length of a generated update password.
pub const PASSWORD_LENGTH: usize = 24;

const MAX_ID_ATTEMPTS: usize = 16;

/// Public summary of a town.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TownListing {
    /// Town identifier.
    pub town_id: String,
    /// Display name.
    pub friendly_name: String,
    /// Connected subscribers.
    pub current_occupancy: usize,
    /// Advertised capacity.
    pub maximum_occupancy: usize,
}

/// Owns every live town in the process.
pub struct TownsStore {
    towns: Mutex<Vec<TownHandle>>,
    rng: Mutex<Box<dyn DeterministicRng>>,
    demo_town_id: Option<String>,
}

impl std::fmt::Debug for TownsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TownsStore")
            .field("demo_town_id", &self.demo_town_id)
            .finish_non_exhaustive()
    }
}

fn poisoned<T>(what: &str) -> impl FnOnce(T) -> TownError + '_ {
    move |_| TownError::Infrastructure(format!("{what} lock poisoned"))
}

impl TownsStore {
    /// Creates an empty registry.
    ///
    /// A town whose friendly name equals `demo_town_id` takes that name as
    /// its identifier instead of a generated one.
    #[must_use]
    pub fn new(rng: Box<dyn DeterministicRng>, demo_town_id: Option<String>) -> Self {
        Self {
            towns: Mutex::new(Vec::new()),
            rng: Mutex::new(rng),
            demo_town_id,
        }
    }

    fn towns(&self) -> Result<MutexGuard<'_, Vec<TownHandle>>, TownError> {
        self.towns.lock().map_err(poisoned("registry"))
    }

    /// Creates and registers a town.
    ///
    /// # Errors
    ///
    /// Returns `TownError::Validation` for a blank friendly name, and
    /// `TownError::Infrastructure` if no unused identifier could be drawn or a
    /// lock is poisoned.
    #[instrument(skip(self))]
    pub fn create_town(
        &self,
        friendly_name: &str,
        is_publicly_listed: bool,
    ) -> Result<TownHandle, TownError> {
        if friendly_name.trim().is_empty() {
            return Err(TownError::Validation(
                "friendly name must not be empty".to_owned(),
            ));
        }

        let mut towns = self.towns()?;
        let mut taken = Vec::with_capacity(towns.len());
        for town in &*towns {
            taken.push(town.read(|t| t.town_id().to_owned())?);
        }

        let (town_id, update_password) = {
            let mut rng = self.rng.lock().map_err(poisoned("rng"))?;
            let town_id = match &self.demo_town_id {
                Some(demo) if demo == friendly_name && !taken.contains(demo) => demo.clone(),
                _ => (0..MAX_ID_ATTEMPTS)
                    .map(|_| random_string(rng.as_mut(), TOWN_ID_ALPHABET, TOWN_ID_LENGTH))
                    .find(|candidate| !taken.contains(candidate))
                    .ok_or_else(|| {
                        TownError::Infrastructure("could not allocate a town id".to_owned())
                    })?,
            };
            let update_password = random_string(rng.as_mut(), PASSWORD_ALPHABET, PASSWORD_LENGTH);
            (town_id, update_password)
        };

        let handle = TownHandle::new(TownController::new(
            town_id.clone(),
            friendly_name,
            is_publicly_listed,
            update_password,
        ));
        towns.push(handle.clone());
        info!(town_id = %town_id, "town created");
        Ok(handle)
    }

    /// Looks up a town.
    ///
    /// # Errors
    ///
    /// Returns `TownError::TownNotFound` if no town has this identifier.
    pub fn get(&self, town_id: &str) -> Result<TownHandle, TownError> {
        let towns = self.towns()?;
        for town in &*towns {
            if town.read(|t| t.town_id() == town_id)? {
                return Ok(town.clone());
            }
        }
        Err(TownError::TownNotFound(town_id.to_owned()))
    }

    /// Number of live towns, listed or not.
    ///
    /// # Errors
    ///
    /// Returns `TownError::Infrastructure` if the registry lock is poisoned.
    pub fn town_count(&self) -> Result<usize, TownError> {
        Ok(self.towns()?.len())
    }

    /// Summaries of the publicly listed towns, in creation order.
    ///
    /// # Errors
    ///
    /// Returns `TownError::Infrastructure` if a lock is poisoned.
    pub fn list_public(&self) -> Result<Vec<TownListing>, TownError> {
        let towns = self.towns()?;
        let mut listings = Vec::new();
        for town in &*towns {
            let listing = town.read(|t| {
                t.is_publicly_listed().then(|| TownListing {
                    town_id: t.town_id().to_owned(),
                    friendly_name: t.friendly_name().to_owned(),
                    current_occupancy: t.occupancy(),
                    maximum_occupancy: t.capacity(),
                })
            })?;
            listings.extend(listing);
        }
        Ok(listings)
    }

    /// Renames a town and/or changes its visibility.
    ///
    /// # Errors
    ///
    /// Returns `TownNotFound`, `InvalidUpdatePassword`, or `Validation` for a
    /// blank new name. Nothing changes on error.
    #[instrument(skip(self, password))]
    pub fn update_town(
        &self,
        town_id: &str,
        password: &str,
        friendly_name: Option<&str>,
        is_publicly_listed: Option<bool>,
    ) -> Result<(), TownError> {
        if friendly_name.is_some_and(|name| name.trim().is_empty()) {
            return Err(TownError::Validation(
                "friendly name must not be empty".to_owned(),
            ));
        }
        let town = self.get(town_id)?;
        town.write(|t| {
            if !t.verify_update_password(password) {
                return Err(TownError::InvalidUpdatePassword);
            }
            if let Some(name) = friendly_name {
                t.set_friendly_name(name);
            }
            if let Some(listed) = is_publicly_listed {
                t.set_publicly_listed(listed);
            }
            Ok(())
        })??;
        info!(town_id = %town_id, "town updated");
        Ok(())
    }

    /// Closes a town: every subscriber is told the town is closing and the
    /// town is removed from the registry.
    ///
    /// # Errors
    ///
    /// Returns `TownNotFound` or `InvalidUpdatePassword`.
    #[instrument(skip(self, password))]
    pub fn delete_town(&self, town_id: &str, password: &str) -> Result<(), TownError> {
        let removed = {
            let mut towns = self.towns()?;
            let mut index = None;
            for (i, town) in towns.iter().enumerate() {
                if town.read(|t| t.town_id() == town_id)? {
                    index = Some(i);
                    break;
                }
            }
            let index = index.ok_or_else(|| TownError::TownNotFound(town_id.to_owned()))?;
            if !towns[index].read(|t| t.verify_update_password(password))? {
                return Err(TownError::InvalidUpdatePassword);
            }
            towns.remove(index)
        };

        removed.read(TownController::disconnect_all)?;
        info!(town_id = %town_id, "town deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::TownEvent;
    use crate::domain::listener::TownListener;
    use plaza_test_support::{MockRng, SequenceRng};
    use std::sync::Arc;

    fn store() -> TownsStore {
        TownsStore::new(
            Box::new(SequenceRng::new((0..16).collect())),
            Some("DEMO".to_owned()),
        )
    }

    #[derive(Default)]
    struct ClosingFlag(Mutex<bool>);

    impl TownListener for ClosingFlag {
        fn on_event(&self, event: &TownEvent) {
            if matches!(event, TownEvent::TownClosing) {
                *self.0.lock().unwrap() = true;
            }
        }
    }

    #[test]
    fn test_create_town_draws_id_and_password_from_rng() {
        // Arrange
        let store = TownsStore::new(Box::new(MockRng), None);

        // Act
        let town = store.create_town("Plaza", true).unwrap();

        // Assert
        let (town_id, password, capacity) = town
            .read(|t| (t.town_id().to_owned(), t.update_password().to_owned(), t.capacity()))
            .unwrap();
        assert_eq!(town_id, "11111111");
        assert_eq!(password, "A".repeat(PASSWORD_LENGTH));
        assert_eq!(capacity, 50);
    }

    #[test]
    fn test_create_town_uses_demo_id_for_matching_name() {
        let store = store();

        let town = store.create_town("DEMO", true).unwrap();

        assert_eq!(town.read(|t| t.town_id().to_owned()).unwrap(), "DEMO");
    }

    #[test]
    fn test_create_town_rejects_blank_name() {
        let store = store();

        let result = store.create_town("  ", true);

        assert!(matches!(result, Err(TownError::Validation(_))));
        assert!(store.list_public().unwrap().is_empty());
    }

    #[test]
    fn test_create_town_gives_up_when_ids_keep_colliding() {
        // Arrange
        let store = TownsStore::new(Box::new(MockRng), None);
        store.create_town("first", true).unwrap();

        // Act
        let result = store.create_town("second", true);

        // Assert
        match result {
            Err(TownError::Infrastructure(msg)) => assert!(msg.contains("town id")),
            other => panic!("expected Infrastructure, got {other:?}"),
        }
    }

    #[test]
    fn test_get_finds_registered_town() {
        let store = store();
        let town = store.create_town("Plaza", true).unwrap();
        let town_id = town.read(|t| t.town_id().to_owned()).unwrap();

        let found = store.get(&town_id).unwrap();

        assert_eq!(found.read(|t| t.friendly_name().to_owned()).unwrap(), "Plaza");
        assert_eq!(
            store.get("NOPE").unwrap_err(),
            TownError::TownNotFound("NOPE".into())
        );
    }

    #[test]
    fn test_list_public_hides_private_towns() {
        // Arrange
        let store = store();
        store.create_town("Open", true).unwrap();
        store.create_town("Hidden", false).unwrap();

        // Act
        let listings = store.list_public().unwrap();

        // Assert
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].friendly_name, "Open");
        assert_eq!(listings[0].current_occupancy, 0);
        assert_eq!(listings[0].maximum_occupancy, 50);
        assert_eq!(store.town_count().unwrap(), 2);
    }

    #[test]
    fn test_update_town_requires_password() {
        // Arrange
        let store = store();
        let town = store.create_town("Plaza", false).unwrap();
        let (town_id, password) = town
            .read(|t| (t.town_id().to_owned(), t.update_password().to_owned()))
            .unwrap();

        // Act
        let rejected = store.update_town(&town_id, "guess", Some("Agora"), None);
        let accepted = store.update_town(&town_id, &password, Some("Agora"), Some(true));

        // Assert
        assert_eq!(rejected.unwrap_err(), TownError::InvalidUpdatePassword);
        assert!(accepted.is_ok());
        let listings = store.list_public().unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].friendly_name, "Agora");
    }

    #[test]
    fn test_update_town_rejects_blank_name() {
        let store = store();
        let town = store.create_town("Plaza", true).unwrap();
        let (town_id, password) = town
            .read(|t| (t.town_id().to_owned(), t.update_password().to_owned()))
            .unwrap();

        let result = store.update_town(&town_id, &password, Some(""), None);

        assert!(matches!(result, Err(TownError::Validation(_))));
        assert_eq!(town.read(|t| t.friendly_name().to_owned()).unwrap(), "Plaza");
    }

    #[test]
    fn test_delete_town_broadcasts_closing_and_unregisters() {
        // Arrange
        let store = store();
        let town = store.create_town("Plaza", true).unwrap();
        let (town_id, password) = town
            .read(|t| (t.town_id().to_owned(), t.update_password().to_owned()))
            .unwrap();
        let flag = Arc::new(ClosingFlag::default());
        town.write(|t| t.subscribe(flag.clone())).unwrap();

        // Act
        let rejected = store.delete_town(&town_id, "guess");
        let deleted = store.delete_town(&town_id, &password);

        // Assert
        assert_eq!(rejected.unwrap_err(), TownError::InvalidUpdatePassword);
        assert!(deleted.is_ok());
        assert!(*flag.0.lock().unwrap());
        assert!(matches!(store.get(&town_id), Err(TownError::TownNotFound(_))));
    }
}
