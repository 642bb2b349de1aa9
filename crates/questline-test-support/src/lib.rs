//! Shared test clocks and fixtures for Questline.

mod clock;
mod fixtures;

pub use clock::{FixedClock, StepClock};
pub use fixtures::{fixed_now, moscow, point};
