//! Subscriber contract for town change notifications.
//!
//! The controller invokes these callbacks synchronously, in registration
//! order, after each mutation has been fully applied. Every callback defaults
//! to wrapping its argument in a [`TownEvent`] and passing it to
//! [`TownListener::on_event`], so an implementor can either override the
//! callbacks it cares about or handle the whole stream in one place.

use super::events::TownEvent;
use super::group::{AdHocGroup, Message};
use super::participant::Participant;
use super::zone::DesignatedZone;

/// Observer of a single town.
pub trait TownListener: Send + Sync {
    /// Receives every event whose callback was not overridden.
    fn on_event(&self, _event: &TownEvent) {}

    /// A participant finished admission.
    fn on_participant_joined(&self, participant: &Participant) {
        self.on_event(&TownEvent::ParticipantJoined(participant.clone()));
    }

    /// A participant reported a new position.
    fn on_participant_moved(&self, participant: &Participant) {
        self.on_event(&TownEvent::ParticipantMoved(participant.clone()));
    }

    /// A participant's session ended.
    fn on_participant_disconnected(&self, participant: &Participant) {
        self.on_event(&TownEvent::ParticipantDisconnected(participant.clone()));
    }

    /// A participant's group membership changed.
    fn on_participant_group_changed(&self, participant: &Participant) {
        self.on_event(&TownEvent::ParticipantGroupChanged(participant.clone()));
    }

    /// A group was created or changed.
    fn on_group_updated(&self, group: &AdHocGroup) {
        self.on_event(&TownEvent::GroupUpdated(group.clone()));
    }

    /// A group dissolved.
    fn on_group_destroyed(&self, group: &AdHocGroup) {
        self.on_event(&TownEvent::GroupDestroyed(group.clone()));
    }

    /// A zone was created or changed.
    fn on_zone_updated(&self, zone: &DesignatedZone) {
        self.on_event(&TownEvent::ZoneUpdated(zone.clone()));
    }

    /// A zone emptied and was removed.
    fn on_zone_destroyed(&self, zone: &DesignatedZone) {
        self.on_event(&TownEvent::ZoneDestroyed(zone.clone()));
    }

    /// A message was recorded.
    fn on_message_received(&self, message: &Message) {
        self.on_event(&TownEvent::MessageReceived(message.clone()));
    }

    /// The town is closing.
    fn on_town_closing(&self) {
        self.on_event(&TownEvent::TownClosing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collector(Mutex<Vec<&'static str>>);

    impl TownListener for Collector {
        fn on_event(&self, event: &TownEvent) {
            self.0.lock().unwrap().push(event.event_type());
        }
    }

    struct MovesOnly(Mutex<usize>);

    impl TownListener for MovesOnly {
        fn on_participant_moved(&self, _participant: &Participant) {
            *self.0.lock().unwrap() += 1;
        }
    }

    #[test]
    fn test_default_callbacks_forward_to_on_event() {
        let collector = Collector::default();
        let participant = Participant::new("ada");

        collector.on_participant_joined(&participant);
        collector.on_participant_moved(&participant);
        collector.on_town_closing();

        assert_eq!(
            *collector.0.lock().unwrap(),
            vec!["participant-joined", "participant-moved", "town-closing"]
        );
    }

    #[test]
    fn test_overridden_callback_bypasses_on_event() {
        let listener = MovesOnly(Mutex::new(0));
        let participant = Participant::new("ada");

        listener.on_participant_moved(&participant);
        listener.on_participant_joined(&participant);

        assert_eq!(*listener.0.lock().unwrap(), 1);
    }
}
