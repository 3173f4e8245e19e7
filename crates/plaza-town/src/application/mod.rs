//! Application layer for the town context: the controller, its shared
//! handle, the registry of towns and the request-level handlers.

pub mod command_handlers;
pub mod controller;
pub mod handle;
pub mod query_handlers;
pub mod registry;
