//! The town controller.
//!
//! Owns the roster, the designated zones, the ad-hoc groups, the sessions
//! and the subscribers of one town. Every public mutation runs to completion
//! before it returns, and subscribers are notified synchronously, in
//! registration order, once the model is consistent again.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use plaza_core::credential::Credential;
use plaza_core::error::TownError;
use plaza_core::geometry::rects_overlap;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::group::{AdHocGroup, Message};
use crate::domain::listener::TownListener;
use crate::domain::participant::{Participant, Position};
use crate::domain::session::Session;
use crate::domain::zone::DesignatedZone;

/// Maximum occupancy advertised for every town.
pub const DEFAULT_CAPACITY: usize = 50;

/// Handle returned by [`TownController::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// Registered listeners, iterated in registration order.
#[derive(Default)]
struct Subscribers {
    next_id: u64,
    listeners: BTreeMap<SubscriptionId, Arc<dyn TownListener>>,
}

impl Subscribers {
    fn insert(&mut self, listener: Arc<dyn TownListener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.insert(id, listener);
        id
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    fn len(&self) -> usize {
        self.listeners.len()
    }

    fn notify(&self, callback: impl Fn(&dyn TownListener)) {
        for listener in self.listeners.values() {
            callback(listener.as_ref());
        }
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

/// Coordinates the shared state of a single town.
#[derive(Debug)]
pub struct TownController {
    town_id: String,
    friendly_name: String,
    is_publicly_listed: bool,
    update_password: String,
    capacity: usize,
    participants: Vec<Participant>,
    sessions: Vec<Session>,
    zones: Vec<DesignatedZone>,
    groups: Vec<AdHocGroup>,
    subscribers: Subscribers,
}

impl TownController {
    /// Creates an empty town.
    #[must_use]
    pub fn new(
        town_id: impl Into<String>,
        friendly_name: impl Into<String>,
        is_publicly_listed: bool,
        update_password: impl Into<String>,
    ) -> Self {
        Self {
            town_id: town_id.into(),
            friendly_name: friendly_name.into(),
            is_publicly_listed,
            update_password: update_password.into(),
            capacity: DEFAULT_CAPACITY,
            participants: Vec::new(),
            sessions: Vec::new(),
            zones: Vec::new(),
            groups: Vec::new(),
            subscribers: Subscribers::default(),
        }
    }

    /// Town identifier.
    #[must_use]
    pub fn town_id(&self) -> &str {
        &self.town_id
    }

    /// Display name.
    #[must_use]
    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    /// Renames the town.
    pub fn set_friendly_name(&mut self, friendly_name: impl Into<String>) {
        self.friendly_name = friendly_name.into();
    }

    /// Whether the town appears in the public listing.
    #[must_use]
    pub fn is_publicly_listed(&self) -> bool {
        self.is_publicly_listed
    }

    /// Changes the town's visibility.
    pub fn set_publicly_listed(&mut self, is_publicly_listed: bool) {
        self.is_publicly_listed = is_publicly_listed;
    }

    /// Password required to update or delete the town.
    #[must_use]
    pub fn update_password(&self) -> &str {
        &self.update_password
    }

    /// Returns `true` if `candidate` matches the update password.
    #[must_use]
    pub fn verify_update_password(&self, candidate: &str) -> bool {
        self.update_password == candidate
    }

    /// Advertised maximum occupancy.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn occupancy(&self) -> usize {
        self.subscribers.len()
    }

    /// Participants in admission order.
    #[must_use]
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Looks up a participant by id.
    #[must_use]
    pub fn participant(&self, participant_id: Uuid) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id() == participant_id)
    }

    /// Zones in creation order.
    #[must_use]
    pub fn zones(&self) -> &[DesignatedZone] {
        &self.zones
    }

    /// Looks up a zone by label.
    #[must_use]
    pub fn zone(&self, label: &str) -> Option<&DesignatedZone> {
        self.zones.iter().find(|z| z.label() == label)
    }

    /// Groups in creation order.
    #[must_use]
    pub fn groups(&self) -> &[AdHocGroup] {
        &self.groups
    }

    /// Looks up a group by id.
    #[must_use]
    pub fn group(&self, group_id: Uuid) -> Option<&AdHocGroup> {
        self.groups.iter().find(|g| g.id() == group_id)
    }

    /// Active sessions.
    #[must_use]
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Resolves a session token.
    #[must_use]
    pub fn session_by_token(&self, token: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.token() == token)
    }

    /// Registers a listener. Listeners are notified in registration order.
    pub fn subscribe(&mut self, listener: Arc<dyn TownListener>) -> SubscriptionId {
        self.subscribers.insert(listener)
    }

    /// Deregisters a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        self.subscribers.remove(subscription)
    }

    /// Puts `participant` on the roster and opens a session for it.
    ///
    /// The participant is addressable immediately; subscribers learn about it
    /// only when [`complete_admission`](Self::complete_admission) runs.
    pub fn begin_admission(&mut self, participant: Participant, admitted_at: DateTime<Utc>) -> Session {
        let session = Session::new(participant.id(), admitted_at);
        info!(
            town_id = %self.town_id,
            participant_id = %participant.id(),
            "participant added to roster"
        );
        self.participants.push(participant);
        self.sessions.push(session.clone());
        session
    }

    /// Attaches the provisioned credential to a session and announces the
    /// participant.
    ///
    /// # Errors
    ///
    /// Returns `TownError::SessionNotFound` if the session was released while
    /// the credential was being provisioned.
    pub fn complete_admission(
        &mut self,
        token: &str,
        credential: Credential,
    ) -> Result<Session, TownError> {
        let session = self
            .sessions
            .iter_mut()
            .find(|s| s.token() == token)
            .ok_or(TownError::SessionNotFound)?;
        session.set_credential(credential);
        let session = session.clone();

        let participant = self.participant_ref(session.participant_id())?;
        self.subscribers
            .notify(|l| l.on_participant_joined(participant));
        Ok(session)
    }

    /// Ends a session: the participant leaves its zone or group, is removed
    /// from the roster, and subscribers are told it disconnected.
    ///
    /// # Errors
    ///
    /// Returns `TownError::SessionNotFound` for an unknown token.
    #[instrument(skip(self, token), fields(town_id = %self.town_id))]
    pub fn release_session(&mut self, token: &str) -> Result<Participant, TownError> {
        let session_index = self
            .sessions
            .iter()
            .position(|s| s.token() == token)
            .ok_or(TownError::SessionNotFound)?;
        let participant_id = self.sessions[session_index].participant_id();
        self.participant_index(participant_id)?;

        self.depart(participant_id)?;

        self.sessions.remove(session_index);
        let index = self.participant_index(participant_id)?;
        let participant = self.participants.remove(index);
        info!(participant_id = %participant_id, "participant disconnected");
        self.subscribers
            .notify(|l| l.on_participant_disconnected(&participant));
        Ok(participant)
    }

    /// Applies a position update and every membership transition it implies.
    ///
    /// The self-reported zone label decides zone membership. A participant
    /// outside every zone then keeps, switches, joins or founds an ad-hoc
    /// group depending on who is around it.
    ///
    /// # Errors
    ///
    /// Returns `TownError::ParticipantNotFound` if the participant is not on
    /// the roster. Nothing is mutated in that case.
    #[instrument(skip(self, position), fields(town_id = %self.town_id))]
    pub fn update_participant_location(
        &mut self,
        participant_id: Uuid,
        position: Position,
    ) -> Result<(), TownError> {
        let index = self.participant_index(participant_id)?;
        let target_zone = position
            .zone_label
            .as_deref()
            .and_then(|label| self.zone(label))
            .map(|zone| zone.label().to_owned());
        let previous_zone = self.participants[index].active_zone.clone();
        self.participants[index].position = position;

        if target_zone != previous_zone {
            if let Some(label) = previous_zone {
                self.remove_participant_from_zone(participant_id, &label)?;
            }
            if let Some(label) = target_zone {
                self.join_zone(participant_id, &label)?;
            }
        }

        if self.participant_ref(participant_id)?.active_zone.is_none() {
            self.resolve_group(participant_id)?;
        }

        let participant = self.participant_ref(participant_id)?;
        self.subscribers
            .notify(|l| l.on_participant_moved(participant));
        Ok(())
    }

    /// Adds a designated zone and sweeps in every zoneless participant
    /// standing inside it.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateZoneLabel`, `EmptyTopic`, `Validation` for a box
    /// without area, or `OverlappingZone` when the zone is rejected; the town
    /// is left untouched.
    #[instrument(skip(self, zone), fields(town_id = %self.town_id, label = %zone.label()))]
    pub fn create_designated_zone(&mut self, mut zone: DesignatedZone) -> Result<(), TownError> {
        if self.zone(zone.label()).is_some() {
            return Err(TownError::DuplicateZoneLabel(zone.label().to_owned()));
        }
        if zone.topic().trim().is_empty() {
            return Err(TownError::EmptyTopic);
        }
        if !zone.bounding_box().has_area() {
            return Err(TownError::Validation(format!(
                "zone {:?} must have a positive width and height",
                zone.label()
            )));
        }
        if let Some(existing) = self
            .zones
            .iter()
            .find(|z| rects_overlap(z.bounding_box(), zone.bounding_box()))
        {
            return Err(TownError::OverlappingZone {
                label: zone.label().to_owned(),
                existing: existing.label().to_owned(),
            });
        }

        let occupants: Vec<Uuid> = self
            .participants
            .iter()
            .filter(|p| p.active_zone.is_none() && p.is_within(&zone))
            .map(Participant::id)
            .collect();

        for participant_id in &occupants {
            if let Some(group_id) = self.participant_ref(*participant_id)?.active_group {
                self.remove_participant_from_group(*participant_id, group_id)?;
            }
        }

        let label = zone.label().to_owned();
        for participant in self
            .participants
            .iter_mut()
            .filter(|p| occupants.contains(&p.id()))
        {
            participant.active_zone = Some(label.clone());
        }
        zone.set_occupants(occupants);
        info!(occupants = zone.occupant_ids().len(), "zone created");
        self.zones.push(zone);

        let zone = &self.zones[self.zones.len() - 1];
        self.subscribers.notify(|l| l.on_zone_updated(zone));
        Ok(())
    }

    /// Founds a group around `anchor_id` with every free participant nearby.
    ///
    /// Returns the new group's id, or `None` when the anchor is already in a
    /// zone or group or nobody eligible is close enough.
    ///
    /// # Errors
    ///
    /// Returns `TownError::ParticipantNotFound` if the anchor is unknown.
    pub fn create_ad_hoc_group(&mut self, anchor_id: Uuid) -> Result<Option<Uuid>, TownError> {
        let anchor = self.participant_ref(anchor_id)?;
        if anchor.active_zone.is_some() || anchor.active_group.is_some() {
            return Ok(None);
        }

        let nearby: Vec<Uuid> = self
            .participants
            .iter()
            .filter(|p| {
                p.id() != anchor_id
                    && p.active_group.is_none()
                    && p.active_zone.is_none()
                    && p.is_near(anchor)
            })
            .map(Participant::id)
            .collect();
        if nearby.is_empty() {
            debug!(town_id = %self.town_id, anchor_id = %anchor_id, "nobody nearby to group with");
            return Ok(None);
        }

        let mut group = AdHocGroup::new(anchor);
        for participant_id in &nearby {
            group.add_occupant(*participant_id);
        }
        let group_id = group.id();
        for participant in self
            .participants
            .iter_mut()
            .filter(|p| p.id() == anchor_id || nearby.contains(&p.id()))
        {
            participant.active_group = Some(group_id);
        }
        self.groups.push(group);
        info!(
            town_id = %self.town_id,
            group_id = %group_id,
            occupants = nearby.len() + 1,
            "ad-hoc group formed"
        );

        for participant in self.participants.iter().filter(|p| nearby.contains(&p.id())) {
            self.subscribers
                .notify(|l| l.on_participant_group_changed(participant));
        }
        let anchor = self.participant_ref(anchor_id)?;
        self.subscribers
            .notify(|l| l.on_participant_group_changed(anchor));
        let group = &self.groups[self.groups.len() - 1];
        self.subscribers.notify(|l| l.on_group_updated(group));
        Ok(Some(group_id))
    }

    /// Removes a participant from a zone, destroying the zone once empty.
    ///
    /// # Errors
    ///
    /// Returns `ZoneNotFound` for an unknown label and `NotAnOccupant` if the
    /// participant is not in the zone.
    pub fn remove_participant_from_zone(
        &mut self,
        participant_id: Uuid,
        label: &str,
    ) -> Result<(), TownError> {
        let zone_index = self
            .zones
            .iter()
            .position(|z| z.label() == label)
            .ok_or_else(|| TownError::ZoneNotFound(label.to_owned()))?;
        self.zones[zone_index].remove_occupant(participant_id)?;

        if let Some(participant) = self.participant_mut(participant_id) {
            if participant.active_zone.as_deref() == Some(label) {
                participant.active_zone = None;
            }
        }

        if self.zones[zone_index].occupant_ids().is_empty() {
            let zone = self.zones.remove(zone_index);
            info!(town_id = %self.town_id, label = %label, "zone emptied and destroyed");
            self.subscribers.notify(|l| l.on_zone_destroyed(&zone));
        } else {
            let zone = &self.zones[zone_index];
            self.subscribers.notify(|l| l.on_zone_updated(zone));
        }
        Ok(())
    }

    /// Removes a participant from a group. A group left with a single
    /// occupant is dissolved and that occupant released.
    ///
    /// # Errors
    ///
    /// Returns `GroupNotFound` for an unknown group and `NotAnOccupant` if the
    /// participant is not in the group.
    pub fn remove_participant_from_group(
        &mut self,
        participant_id: Uuid,
        group_id: Uuid,
    ) -> Result<(), TownError> {
        let group_index = self.group_index(group_id)?;
        self.groups[group_index].remove_occupant(participant_id)?;

        if let Some(participant) = self.participant_mut(participant_id) {
            if participant.active_group == Some(group_id) {
                participant.active_group = None;
            }
        }

        if self.groups[group_index].occupant_ids().len() < 2 {
            let group = self.groups.remove(group_index);
            for participant in self
                .participants
                .iter_mut()
                .filter(|p| group.occupant_ids().contains(&p.id()))
            {
                participant.active_group = None;
            }
            info!(town_id = %self.town_id, group_id = %group_id, "ad-hoc group dissolved");
            for participant in self
                .participants
                .iter()
                .filter(|p| group.occupant_ids().contains(&p.id()))
            {
                self.subscribers
                    .notify(|l| l.on_participant_group_changed(participant));
            }
            self.subscribers.notify(|l| l.on_group_destroyed(&group));
        } else {
            let group = &self.groups[group_index];
            self.subscribers.notify(|l| l.on_group_updated(group));
        }

        if let Some(participant) = self.participant(participant_id) {
            self.subscribers
                .notify(|l| l.on_participant_group_changed(participant));
        }
        Ok(())
    }

    /// Appends a message to its group's log.
    ///
    /// # Errors
    ///
    /// Returns `TownError::GroupNotFound` if `message.group_id` names no
    /// group; nothing is recorded or broadcast in that case.
    pub fn record_message(&mut self, message: Message) -> Result<(), TownError> {
        let group_index = self.group_index(message.group_id)?;
        self.groups[group_index].append_message(message);

        let group = &self.groups[group_index];
        if let Some(message) = group.messages().last() {
            self.subscribers.notify(|l| l.on_message_received(message));
        }
        self.subscribers.notify(|l| l.on_group_updated(group));
        Ok(())
    }

    /// Tells every subscriber the town is closing.
    pub fn disconnect_all(&self) {
        info!(town_id = %self.town_id, subscribers = self.subscribers.len(), "closing town");
        self.subscribers.notify(|l| l.on_town_closing());
    }

    fn depart(&mut self, participant_id: Uuid) -> Result<(), TownError> {
        let participant = self.participant_ref(participant_id)?;
        let zone = participant.active_zone.clone();
        let group = participant.active_group;
        if let Some(label) = zone {
            self.remove_participant_from_zone(participant_id, &label)?;
        }
        if let Some(group_id) = group {
            self.remove_participant_from_group(participant_id, group_id)?;
        }
        Ok(())
    }

    fn join_zone(&mut self, participant_id: Uuid, label: &str) -> Result<(), TownError> {
        let zone_index = self
            .zones
            .iter()
            .position(|z| z.label() == label)
            .ok_or_else(|| TownError::ZoneNotFound(label.to_owned()))?;
        // Zones take priority over groups.
        if let Some(group_id) = self.participant_ref(participant_id)?.active_group {
            self.remove_participant_from_group(participant_id, group_id)?;
        }

        self.zones[zone_index].add_occupant(participant_id);
        if let Some(participant) = self.participant_mut(participant_id) {
            participant.active_zone = Some(label.to_owned());
        }
        debug!(town_id = %self.town_id, participant_id = %participant_id, label = %label, "joined zone");

        let zone = &self.zones[zone_index];
        self.subscribers.notify(|l| l.on_zone_updated(zone));
        Ok(())
    }

    fn join_group(&mut self, participant_id: Uuid, group_id: Uuid) -> Result<(), TownError> {
        let group_index = self.group_index(group_id)?;
        let index = self.participant_index(participant_id)?;
        self.groups[group_index].add_occupant(participant_id);
        self.participants[index].active_group = Some(group_id);
        debug!(town_id = %self.town_id, participant_id = %participant_id, group_id = %group_id, "joined group");

        let participant = &self.participants[index];
        let group = &self.groups[group_index];
        self.subscribers
            .notify(|l| l.on_participant_group_changed(participant));
        self.subscribers.notify(|l| l.on_group_updated(group));
        Ok(())
    }

    /// Group half of the location transition, for a participant in no zone.
    fn resolve_group(&mut self, participant_id: Uuid) -> Result<(), TownError> {
        let participant = self.participant_ref(participant_id)?;
        if let Some(group_id) = participant.active_group {
            let still_inside = self
                .group(group_id)
                .map(|group| participant.is_within_group(group));
            match still_inside {
                Some(true) => {}
                Some(false) => self.remove_participant_from_group(participant_id, group_id)?,
                None => {
                    if let Some(participant) = self.participant_mut(participant_id) {
                        participant.active_group = None;
                    }
                }
            }
        }

        let participant = self.participant_ref(participant_id)?;
        let current = participant.active_group;
        let target = self
            .groups
            .iter()
            .find(|g| participant.is_within_group(g))
            .map(AdHocGroup::id);
        if let Some(target) = target {
            if Some(target) != current {
                if let Some(group_id) = current {
                    self.remove_participant_from_group(participant_id, group_id)?;
                }
                self.join_group(participant_id, target)?;
            }
        }

        if self.participant_ref(participant_id)?.active_group.is_none() {
            self.create_ad_hoc_group(participant_id)?;
        }
        Ok(())
    }

    fn participant_index(&self, participant_id: Uuid) -> Result<usize, TownError> {
        self.participants
            .iter()
            .position(|p| p.id() == participant_id)
            .ok_or(TownError::ParticipantNotFound(participant_id))
    }

    fn participant_ref(&self, participant_id: Uuid) -> Result<&Participant, TownError> {
        self.participant(participant_id)
            .ok_or(TownError::ParticipantNotFound(participant_id))
    }

    fn participant_mut(&mut self, participant_id: Uuid) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id() == participant_id)
    }

    fn group_index(&self, group_id: Uuid) -> Result<usize, TownError> {
        self.groups
            .iter()
            .position(|g| g.id() == group_id)
            .ok_or(TownError::GroupNotFound(group_id))
    }
}
