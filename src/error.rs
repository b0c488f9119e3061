//! Error types for the alert agent.

/// Top-level error type for the alert agent.
///
/// None of these are ever shown to the user. The driver logs them and either
/// drops the offending event or abandons the current cycle.
#[derive(Debug, thiserror::Error)]
pub enum AlfredError {
    /// The user's alert configuration cannot produce a schedule
    /// (for example an empty set of alert hours).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A session or profile request failed. Never retried internally.
    #[error("fetch failed: {0}")]
    TransientFetch(String),

    /// A fired alarm does not carry this agent's alarm name prefix.
    #[error("stale alarm: {0}")]
    StaleAlarm(String),

    /// A fired alarm repeats the most recently accepted scheduled instant.
    #[error("duplicate alarm fire for {0}")]
    DuplicateFire(String),

    /// Agent config file could not be read, parsed or validated.
    #[error("config error: {0}")]
    Config(String),

    /// Timer facility error (creating or clearing alarms).
    #[error("timer error: {0}")]
    Timer(String),

    /// Notification facility error.
    #[error("notification error: {0}")]
    Notification(String),

    /// Navigation facility error.
    #[error("navigation error: {0}")]
    Navigation(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AlfredError>;
