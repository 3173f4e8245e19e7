//! Domain layer for the town context: entities, events and the subscriber
//! contract.

pub mod commands;
pub mod events;
pub mod group;
pub mod listener;
pub mod participant;
pub mod session;
pub mod zone;
