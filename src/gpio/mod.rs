//! Output line control
//!
//! This module drives the physical output line the remote commands act on.
//! Hardware access goes through the [`PinDriver`] trait so the real character
//! device backend can be swapped for a mock in tests.

mod controller;
mod driver;

pub use controller::{PinController, PinState};
pub use driver::{GpiodDriver, MockPinDriver, PinDriver, PinWrite};
