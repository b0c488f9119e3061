//! Versioned host signal/request envelopes.
//!
//! The host (browser shell, tray app, ...) sends [`HostSignal`]s and renders
//! the [`HostRequest`]s the agent emits. One envelope per line.

use serde::{Deserialize, Serialize};

/// Contract version for host envelopes.
pub const PROTOCOL_VERSION: u32 = 1;

/// Signals from host -> agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum HostSignal {
    /// The agent was installed or updated.
    Installed,
    /// The host started.
    Startup,
    /// The host saw an HTTP response complete.
    ResponseObserved { url: String, status: u16 },
    /// The user clicked the body of notification `id`.
    NotificationClicked { id: String },
    /// Shut the bridge down.
    Stop,
}

/// Requests from agent -> host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "request")]
pub enum HostRequest {
    #[serde(rename = "notification.display")]
    NotificationDisplay {
        id: String,
        title: String,
        message: String,
        icon: String,
    },
    #[serde(rename = "notification.dismiss")]
    NotificationDismiss { id: String },
    #[serde(rename = "surface.open")]
    SurfaceOpen { url: String },
}

/// Error validating an inbound envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u32),
    #[error("malformed envelope: {0}")]
    Malformed(String),
}

/// A versioned inbound signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalEnvelope {
    pub v: u32,
    #[serde(flatten)]
    pub signal: HostSignal,
}

impl SignalEnvelope {
    #[must_use]
    pub fn new(signal: HostSignal) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            signal,
        }
    }

    /// Parse and version-check one line of host input.
    pub fn parse(line: &str) -> Result<Self, ContractError> {
        let envelope: Self =
            serde_json::from_str(line).map_err(|e| ContractError::Malformed(e.to_string()))?;
        if envelope.v != PROTOCOL_VERSION {
            return Err(ContractError::UnsupportedVersion(envelope.v));
        }
        Ok(envelope)
    }
}

/// A versioned outbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub v: u32,
    #[serde(flatten)]
    pub request: HostRequest,
}

impl RequestEnvelope {
    #[must_use]
    pub fn new(request: HostRequest) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            request,
        }
    }
}
