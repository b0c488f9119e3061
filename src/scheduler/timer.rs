//! In-process timer facility on top of `tokio::time`.
//!
//! Each alarm is a spawned task sleeping until its instant. Alarms whose
//! instant has already passed fire immediately.

use crate::error::Result;
use crate::scheduler::alarm::{AlarmFire, TimerFacility};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

/// Callback invoked when an alarm fires.
pub type FireSink = Arc<dyn Fn(AlarmFire) + Send + Sync>;

struct PendingAlarm {
    token: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Pending {
    next_token: u64,
    alarms: HashMap<String, PendingAlarm>,
}

/// [`TimerFacility`] backed by tokio sleep tasks.
pub struct TokioTimerFacility {
    pending: Arc<Mutex<Pending>>,
    sink: FireSink,
}

impl TokioTimerFacility {
    /// Create a facility that reports fires to `sink`.
    pub fn new(sink: FireSink) -> Self {
        Self {
            pending: Arc::new(Mutex::new(Pending::default())),
            sink,
        }
    }

    /// Number of alarms that have not fired or been cleared.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).alarms.len()
    }
}

fn lock(pending: &Mutex<Pending>) -> MutexGuard<'_, Pending> {
    // A panic while holding the lock cannot leave the map half-updated.
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl TimerFacility for TokioTimerFacility {
    async fn clear_all(&self) -> Result<bool> {
        let mut pending = lock(&self.pending);
        let cleared = !pending.alarms.is_empty();
        for (name, alarm) in pending.alarms.drain() {
            alarm.handle.abort();
            tracing::trace!(alarm = %name, "alarm cleared");
        }
        Ok(cleared)
    }

    async fn create(&self, name: &str, when: DateTime<Utc>) -> Result<()> {
        let delay = (when - Utc::now()).to_std().unwrap_or_default();

        let mut pending = lock(&self.pending);
        pending.next_token += 1;
        let token = pending.next_token;

        let registry = Arc::clone(&self.pending);
        let sink = Arc::clone(&self.sink);
        let alarm_name = name.to_owned();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut pending = lock(&registry);
                if pending
                    .alarms
                    .get(&alarm_name)
                    .is_some_and(|alarm| alarm.token == token)
                {
                    pending.alarms.remove(&alarm_name);
                }
            }
            sink(AlarmFire {
                name: alarm_name,
                scheduled_time: when,
            });
        });

        if let Some(previous) = pending
            .alarms
            .insert(name.to_owned(), PendingAlarm { token, handle })
        {
            previous.handle.abort();
        }
        Ok(())
    }
}
