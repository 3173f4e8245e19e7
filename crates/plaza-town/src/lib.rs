//! Plaza town coordination bounded context.
//!
//! Responsible for a town's participants, designated zones, proximity-based
//! ad-hoc groups, sessions and change notification.

pub mod application;
pub mod domain;
