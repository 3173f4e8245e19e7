//! Shared test mocks and utilities for the Plaza town coordination engine.

mod clock;
mod credential;
mod rng;

pub use clock::FixedClock;
pub use credential::{FailingCredentialProvider, GatedCredentialProvider, StaticCredentialProvider};
pub use rng::{MockRng, SequenceRng};
