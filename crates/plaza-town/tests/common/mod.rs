//! Shared helpers for town integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use plaza_core::credential::Credential;
use plaza_town::application::controller::TownController;
use plaza_town::domain::events::TownEvent;
use plaza_town::domain::listener::TownListener;
use plaza_town::domain::participant::{Participant, Position};
use uuid::Uuid;

/// Fixed timestamp used across all integration tests.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// Listener that records every event it receives.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<TownEvent>>,
}

impl RecordingListener {
    /// Wire names of the recorded events, in delivery order.
    pub fn names(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(TownEvent::event_type)
            .collect()
    }

    /// Recorded events, in delivery order.
    pub fn events(&self) -> Vec<TownEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl TownListener for RecordingListener {
    fn on_event(&self, event: &TownEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// A town with one recording subscriber.
pub fn town_with_recorder() -> (TownController, Arc<RecordingListener>) {
    let mut town = TownController::new("ABCD1234", "Plaza", true, "secret");
    let recorder = Arc::new(RecordingListener::default());
    town.subscribe(recorder.clone());
    (town, recorder)
}

/// Fully admits a participant spawned at `(x, y)` and returns its id.
pub fn admit_at(town: &mut TownController, name: &str, x: f64, y: f64) -> Uuid {
    let participant = Participant::new(name).with_position(Position::at(x, y));
    let session = town.begin_admission(participant, fixed_now());
    town.complete_admission(session.token(), Credential::new("media-token"))
        .unwrap();
    session.participant_id()
}

/// Checks the structural invariants that must hold between operations.
pub fn assert_invariants(town: &TownController) {
    for participant in town.participants() {
        assert!(
            participant.active_zone().is_none() || participant.active_group().is_none(),
            "{} is in both a zone and a group",
            participant.display_name()
        );
        if let Some(group_id) = participant.active_group() {
            let group = town.group(group_id).expect("participant points at a live group");
            assert!(group.occupant_ids().contains(&participant.id()));
        }
        if let Some(label) = participant.active_zone() {
            let zone = town.zone(label).expect("participant points at a live zone");
            assert!(zone.occupant_ids().contains(&participant.id()));
        }
    }
    for group in town.groups() {
        assert!(group.occupant_ids().len() >= 2, "group with a single occupant");
        for id in group.occupant_ids() {
            let occupant = town.participant(*id).expect("group occupant on roster");
            assert_eq!(occupant.active_group(), Some(group.id()));
        }
    }
    for zone in town.zones() {
        for id in zone.occupant_ids() {
            let occupant = town.participant(*id).expect("zone occupant on roster");
            assert_eq!(occupant.active_zone(), Some(zone.label()));
        }
    }
    for (i, a) in town.zones().iter().enumerate() {
        for b in &town.zones()[i + 1..] {
            assert!(
                !plaza_core::geometry::rects_overlap(a.bounding_box(), b.bounding_box()),
                "zones {} and {} overlap",
                a.label(),
                b.label()
            );
        }
    }
}
