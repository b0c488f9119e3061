//! Service driver: the top-level alert cycle.
//!
//! ```text
//! STOPPED -> CHECKING_SESSION -> PROMPTING_LOGIN -> STOPPED
//!                             -> FETCHING_PROFILE -> SCHEDULING -> WAITING_FOR_ALARM
//! WAITING_FOR_ALARM --fire--> CHECKING_SESSION -> NOTIFYING --ack--> CHECKING_SESSION ...
//! ```
//!
//! All state lives in [`ServiceDriver`] and is mutated only from its event
//! loop. Session and profile requests run as spawned tasks that report back
//! through the driver's own channel, tagged with the cycle generation that
//! issued them. Every entry point starts a new generation, so replies from a
//! superseded cycle are dropped. Nothing is retried: a failed step stops the
//! driver until the next external trigger.

use crate::config::AlfredConfig;
use crate::error::{AlfredError, Result};
use crate::notify::{NavigationFacility, NotificationFacility, NotificationOrchestrator, PromptKind};
use crate::profile::{ProfileService, UserProfile};
use crate::scheduler::{AlarmFire, AlarmScheduler, TimerFacility, next_alert};
use crate::session::SessionOracle;
use crate::triggers::Trigger;
use chrono::{DateTime, Local, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Why the session is being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCheck {
    /// Start of a cycle: decides between login prompt and scheduling.
    Cycle,
    /// An alarm fired: decides whether to notify.
    AlarmFired,
}

/// Driver lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Stopped,
    CheckingSession(SessionCheck),
    PromptingLogin,
    FetchingProfile,
    Scheduling,
    WaitingForAlarm,
    Notifying,
}

/// Everything the driver reacts to.
#[derive(Debug)]
pub enum DriverEvent {
    Trigger(Trigger),
    SessionChecked {
        generation: u64,
        result: Result<bool>,
    },
    ProfileFetched {
        generation: u64,
        result: Result<UserProfile>,
    },
    AlarmFired(AlarmFire),
    NotificationClicked(String),
    Shutdown,
}

/// Cloneable sender into a driver's event loop.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    tx: mpsc::UnboundedSender<DriverEvent>,
}

impl DriverHandle {
    /// Queue an event.
    ///
    /// # Errors
    ///
    /// [`AlfredError::Channel`] once the driver has stopped.
    pub fn send(&self, event: DriverEvent) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|_| AlfredError::Channel("service driver has stopped".to_owned()))
    }

    pub fn trigger(&self, trigger: Trigger) -> Result<()> {
        self.send(DriverEvent::Trigger(trigger))
    }

    pub fn alarm_fired(&self, fire: AlarmFire) -> Result<()> {
        self.send(DriverEvent::AlarmFired(fire))
    }

    pub fn notification_clicked(&self, id: impl Into<String>) -> Result<()> {
        self.send(DriverEvent::NotificationClicked(id.into()))
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(DriverEvent::Shutdown)
    }
}

/// Receiving half paired with a [`DriverHandle`].
pub struct DriverEvents {
    rx: mpsc::UnboundedReceiver<DriverEvent>,
}

impl DriverEvents {
    /// Next queued event, or `None` once every handle is dropped.
    pub async fn recv(&mut self) -> Option<DriverEvent> {
        self.rx.recv().await
    }
}

/// Create the driver's event channel.
///
/// The handle can be cloned into collaborators (such as the timer facility)
/// before the driver itself is built.
#[must_use]
pub fn channel() -> (DriverHandle, DriverEvents) {
    let (tx, rx) = mpsc::unbounded_channel();
    (DriverHandle { tx }, DriverEvents { rx })
}

/// External collaborators the driver talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub session: Arc<dyn SessionOracle>,
    pub profiles: Arc<dyn ProfileService>,
    pub timer: Arc<dyn TimerFacility>,
    pub notifier: Arc<dyn NotificationFacility>,
    pub navigator: Arc<dyn NavigationFacility>,
}

/// Source of the current local time.
pub type Clock = Arc<dyn Fn() -> DateTime<Local> + Send + Sync>;

/// The alert cycle state machine.
pub struct ServiceDriver {
    state: DriverState,
    generation: u64,
    profile: Option<UserProfile>,
    alarms: AlarmScheduler,
    prompts: NotificationOrchestrator,
    session: Arc<dyn SessionOracle>,
    profiles: Arc<dyn ProfileService>,
    timer: Arc<dyn TimerFacility>,
    clock: Clock,
    handle: DriverHandle,
    events: DriverEvents,
}

impl ServiceDriver {
    pub fn new(
        collaborators: Collaborators,
        config: &AlfredConfig,
        handle: DriverHandle,
        events: DriverEvents,
    ) -> Self {
        let prompts = NotificationOrchestrator::new(
            collaborators.notifier,
            collaborators.navigator,
            config.notifications.clone(),
            &config.service,
        );
        Self {
            state: DriverState::Stopped,
            generation: 0,
            profile: None,
            alarms: AlarmScheduler::new(config.alarm.base_name.clone()),
            prompts,
            session: collaborators.session,
            profiles: collaborators.profiles,
            timer: collaborators.timer,
            clock: Arc::new(Local::now),
            handle,
            events,
        }
    }

    /// Replace the wall clock used to compute the next alert.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn state(&self) -> DriverState {
        self.state
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn alarms(&self) -> &AlarmScheduler {
        &self.alarms
    }

    #[must_use]
    pub fn login_prompt_shown(&self) -> bool {
        self.prompts.login_prompt_shown()
    }

    /// A sender into this driver's event loop.
    #[must_use]
    pub fn handle(&self) -> DriverHandle {
        self.handle.clone()
    }

    /// Process events until [`DriverEvent::Shutdown`].
    pub async fn run(mut self) {
        info!("service driver started");
        while self.step().await {}
        info!("service driver stopped");
    }

    /// Receive and handle one event. Returns `false` on shutdown.
    pub async fn step(&mut self) -> bool {
        match self.events.recv().await {
            Some(DriverEvent::Shutdown) | None => {
                self.state = DriverState::Stopped;
                false
            }
            Some(event) => {
                self.handle_event(event).await;
                true
            }
        }
    }

    /// Apply one event to the state machine.
    pub async fn handle_event(&mut self, event: DriverEvent) {
        match event {
            DriverEvent::Trigger(trigger) => self.start_cycle(trigger).await,
            DriverEvent::SessionChecked { generation, result } => {
                if self.is_current(generation, "session check") {
                    self.on_session_checked(result).await;
                }
            }
            DriverEvent::ProfileFetched { generation, result } => {
                if self.is_current(generation, "profile fetch") {
                    self.on_profile_fetched(result).await;
                }
            }
            DriverEvent::AlarmFired(fire) => self.on_alarm_fired(fire),
            DriverEvent::NotificationClicked(id) => self.on_notification_clicked(&id).await,
            DriverEvent::Shutdown => self.state = DriverState::Stopped,
        }
    }

    fn is_current(&self, generation: u64, what: &str) -> bool {
        if generation == self.generation {
            return true;
        }
        debug!(
            generation,
            current = self.generation,
            "dropping {what} reply from superseded cycle"
        );
        false
    }

    async fn start_cycle(&mut self, trigger: Trigger) {
        self.generation += 1;
        info!(?trigger, generation = self.generation, "starting alert cycle");

        if trigger == Trigger::Startup {
            self.alarms.disarm(self.timer.as_ref()).await;
        }

        self.state = DriverState::CheckingSession(SessionCheck::Cycle);
        self.request_session_check();
    }

    fn request_session_check(&self) {
        let oracle = Arc::clone(&self.session);
        let handle = self.handle.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let result = oracle.has_active_session().await;
            let _ = handle.send(DriverEvent::SessionChecked { generation, result });
        });
    }

    fn request_profile(&self) {
        let profiles = Arc::clone(&self.profiles);
        let handle = self.handle.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let result = profiles.fetch_profile().await;
            let _ = handle.send(DriverEvent::ProfileFetched { generation, result });
        });
    }

    async fn on_session_checked(&mut self, result: Result<bool>) {
        let DriverState::CheckingSession(purpose) = self.state else {
            debug!(state = ?self.state, "unexpected session reply ignored");
            return;
        };

        let has_session = match result {
            Ok(has_session) => has_session,
            Err(e) => {
                warn!("session check failed, waiting for next trigger: {e}");
                self.state = DriverState::Stopped;
                return;
            }
        };

        match (purpose, has_session) {
            (SessionCheck::Cycle, false) => {
                self.state = DriverState::PromptingLogin;
                match self.prompts.show_login_prompt().await {
                    Ok(true) => info!("no session, login prompt shown"),
                    Ok(false) => debug!("no session, login prompt suppressed"),
                    Err(e) => warn!("failed to show login prompt: {e}"),
                }
                self.state = DriverState::Stopped;
            }
            (SessionCheck::Cycle, true) => {
                self.state = DriverState::FetchingProfile;
                self.request_profile();
            }
            (SessionCheck::AlarmFired, false) => {
                info!("session ended before alert fired, abandoning cycle");
                self.state = DriverState::Stopped;
            }
            (SessionCheck::AlarmFired, true) => self.notify_alert().await,
        }
    }

    async fn on_profile_fetched(&mut self, result: Result<UserProfile>) {
        if self.state != DriverState::FetchingProfile {
            debug!(state = ?self.state, "unexpected profile reply ignored");
            return;
        }

        match result {
            Ok(profile) => {
                self.state = DriverState::Scheduling;
                if self.schedule(&profile).await {
                    self.profile = Some(profile);
                } else {
                    self.abandon_schedule().await;
                }
            }
            Err(e @ AlfredError::Configuration(_)) => {
                error!("profile has unusable alert hours: {e}");
                self.abandon_schedule().await;
            }
            // The last armed alarm still reflects the last known hours.
            Err(e) => {
                warn!("profile fetch failed, waiting for next trigger: {e}");
                self.state = DriverState::Stopped;
            }
        }
    }

    /// Arm the next alert for `profile`. Returns `false` if nothing was armed.
    async fn schedule(&mut self, profile: &UserProfile) -> bool {
        let now = (self.clock)();
        let at = match next_alert(&now, profile.alert_hours.iter().copied()) {
            Ok(at) => at,
            Err(e) => {
                error!(email = %profile.email, "cannot schedule alerts: {e}");
                return false;
            }
        };

        match self
            .alarms
            .arm(self.timer.as_ref(), at.with_timezone(&Utc))
            .await
        {
            Ok(record) => {
                info!(alarm = %record.logical_name, scheduled_for = %at, "next alert armed");
                self.state = DriverState::WaitingForAlarm;
                true
            }
            Err(e) => {
                warn!("failed to arm alert alarm: {e}");
                false
            }
        }
    }

    /// Stop with no alarm armed and no profile to notify with.
    async fn abandon_schedule(&mut self) {
        self.alarms.disarm(self.timer.as_ref()).await;
        self.profile = None;
        self.state = DriverState::Stopped;
    }

    fn on_alarm_fired(&mut self, fire: AlarmFire) {
        match self.alarms.accept_fire(&fire) {
            Ok(record) => {
                self.generation += 1;
                info!(
                    alarm = %record.logical_name,
                    generation = self.generation,
                    "alert alarm fired"
                );
                self.state = DriverState::CheckingSession(SessionCheck::AlarmFired);
                self.request_session_check();
            }
            Err(e) => debug!("ignoring alarm fire: {e}"),
        }
    }

    async fn notify_alert(&mut self) {
        let Some(profile) = self.profile.as_ref() else {
            debug!("alarm fired before any profile was fetched, abandoning cycle");
            self.state = DriverState::Stopped;
            return;
        };

        self.state = DriverState::Notifying;
        if let Err(e) = self.prompts.show_alert_prompt(profile).await {
            warn!("failed to show alert prompt: {e}");
            self.state = DriverState::Stopped;
        }
    }

    async fn on_notification_clicked(&mut self, id: &str) {
        match self.prompts.acknowledge(id).await {
            Some(PromptKind::Alert) => self.start_cycle(Trigger::AlertAcknowledged).await,
            Some(PromptKind::Login) => debug!("login prompt acknowledged"),
            None => {}
        }
    }
}
