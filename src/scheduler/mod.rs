//! Alert scheduling.
//!
//! Computes the next alert instant from the user's alert hours and keeps
//! exactly one alarm armed for it.

pub mod alarm;
pub mod next_alert;
pub mod timer;

pub use alarm::{AlarmFire, AlarmRecord, AlarmScheduler, AlarmState, TimerFacility};
pub use next_alert::next_alert;
pub use timer::TokioTimerFacility;
