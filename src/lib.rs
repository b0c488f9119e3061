//! Alfred: background agent that alerts a signed-in user at their chosen hours.
//!
//! # Architecture
//!
//! - **Session oracle** ([`session`]): is there a signed-in session right now?
//! - **Profile fetcher** ([`profile`]): who is the user and which hours do they want alerts at?
//! - **Next-alert calculator** ([`scheduler::next_alert`]): the next top-of-hour in that set.
//! - **Alarm scheduler** ([`scheduler::alarm`]): exactly one armed alarm, duplicate fires dropped.
//! - **Notification orchestrator** ([`notify`]): login and alert prompts and their clicks.
//! - **Service driver** ([`driver`]): the state machine tying it all into a perpetual cycle.
//!
//! The [`host`] bridge connects the driver to a host process over stdio.

pub mod alfred_dirs;
pub mod config;
pub mod driver;
pub mod error;
pub mod host;
pub mod logging;
pub mod notify;
pub mod profile;
pub mod scheduler;
pub mod session;
pub mod triggers;

#[cfg(test)]
mod test_utils;

pub use config::AlfredConfig;
pub use driver::{DriverHandle, ServiceDriver};
pub use error::{AlfredError, Result};
pub use triggers::Trigger;
