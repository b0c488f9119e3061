//! Alarm scheduler: owns the single outstanding alert alarm.
//!
//! Arming always clears every alarm the timer facility knows about before
//! creating the new one, so restarts and overlapping entry points cannot
//! accumulate timers. Fires are filtered through a watermark of the last
//! accepted scheduled instant plus an alarm-name prefix check.

use crate::error::{AlfredError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One-shot timer facility the scheduler arms alarms with.
#[async_trait]
pub trait TimerFacility: Send + Sync {
    /// Cancel every pending alarm. Returns `true` when at least one was cleared.
    async fn clear_all(&self) -> Result<bool>;

    /// Register an alarm that fires once at or after `when`.
    async fn create(&self, name: &str, when: DateTime<Utc>) -> Result<()>;
}

/// Fire notification delivered by a [`TimerFacility`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmFire {
    pub name: String,
    pub scheduled_time: DateTime<Utc>,
}

/// An alarm armed by this scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmRecord {
    /// `base_name` followed by `sequence_id`.
    pub logical_name: String,
    pub sequence_id: u64,
    pub scheduled_instant: DateTime<Utc>,
}

/// Scheduler lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmState {
    Idle,
    Armed(AlarmRecord),
    Fired(AlarmRecord),
}

/// Owns the alarm sequence counter and the duplicate-fire watermark.
#[derive(Debug)]
pub struct AlarmScheduler {
    base_name: String,
    sequence: u64,
    last_fired: Option<DateTime<Utc>>,
    state: AlarmState,
}

impl AlarmScheduler {
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            sequence: 0,
            last_fired: None,
            state: AlarmState::Idle,
        }
    }

    #[must_use]
    pub fn state(&self) -> &AlarmState {
        &self.state
    }

    /// Scheduled instant of the most recently accepted fire.
    #[must_use]
    pub fn last_fired(&self) -> Option<DateTime<Utc>> {
        self.last_fired
    }

    /// Number of alarms armed so far.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Clear all alarms, then arm exactly one at `instant`.
    ///
    /// A failed clear is logged and does not stop the new alarm from being
    /// created.
    ///
    /// # Errors
    ///
    /// Returns the timer facility's error if the alarm cannot be created; the
    /// scheduler is then idle.
    pub async fn arm(
        &mut self,
        timer: &dyn TimerFacility,
        instant: DateTime<Utc>,
    ) -> Result<AlarmRecord> {
        self.clear_stale(timer).await;

        self.sequence += 1;
        let record = AlarmRecord {
            logical_name: format!("{}{}", self.base_name, self.sequence),
            sequence_id: self.sequence,
            scheduled_instant: instant,
        };

        if let Err(e) = timer.create(&record.logical_name, instant).await {
            self.state = AlarmState::Idle;
            return Err(e);
        }

        debug!(alarm = %record.logical_name, scheduled_for = %instant, "alarm armed");
        self.state = AlarmState::Armed(record.clone());
        Ok(record)
    }

    /// Cancel every alarm without arming a new one.
    pub async fn disarm(&mut self, timer: &dyn TimerFacility) {
        self.clear_stale(timer).await;
        self.state = AlarmState::Idle;
    }

    async fn clear_stale(&self, timer: &dyn TimerFacility) {
        match timer.clear_all().await {
            Ok(true) => debug!("cleared previously armed alarms"),
            Ok(false) => debug!("no alarms to clear"),
            Err(e) => warn!("failed to clear alarms, continuing: {e}"),
        }
    }

    /// Decide whether a fire should run the alert continuation.
    ///
    /// The watermark is checked first and advanced on acceptance; only then
    /// is the name prefix checked. A duplicate never touches the watermark.
    ///
    /// # Errors
    ///
    /// [`AlfredError::DuplicateFire`] when `fire` repeats the watermark,
    /// [`AlfredError::StaleAlarm`] when its name is not the base prefix
    /// followed by a sequence number.
    pub fn accept_fire(&mut self, fire: &AlarmFire) -> Result<AlarmRecord> {
        if self.last_fired == Some(fire.scheduled_time) {
            if matches!(self.state, AlarmState::Fired(_)) {
                self.state = AlarmState::Idle;
            }
            return Err(AlfredError::DuplicateFire(format!(
                "{} at {}",
                fire.name, fire.scheduled_time
            )));
        }
        self.last_fired = Some(fire.scheduled_time);

        let Some(sequence_id) = fire
            .name
            .strip_prefix(self.base_name.as_str())
            .and_then(|suffix| suffix.parse::<u64>().ok())
        else {
            self.state = AlarmState::Idle;
            return Err(AlfredError::StaleAlarm(fire.name.clone()));
        };

        let record = AlarmRecord {
            logical_name: fire.name.clone(),
            sequence_id,
            scheduled_instant: fire.scheduled_time,
        };
        self.state = AlarmState::Fired(record.clone());
        Ok(record)
    }
}
