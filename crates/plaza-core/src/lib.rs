//! Plaza Core: shared abstractions.
//!
//! This crate defines the traits, value types and error taxonomy that the
//! town context and the server depend on. It contains no infrastructure code.

pub mod clock;
pub mod command;
pub mod credential;
pub mod error;
pub mod geometry;
pub mod rng;
