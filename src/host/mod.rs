//! Host integration.
//!
//! The agent runs headless next to a host that renders notifications, opens
//! surfaces, and reports install/startup/response/click signals.

pub mod contract;
pub mod stdio;

pub use contract::{HostRequest, HostSignal, PROTOCOL_VERSION};
pub use stdio::run_stdio_bridge;
