//! Recording and scripted collaborators shared by unit tests.

#![allow(clippy::unwrap_used)]

use crate::error::{AlfredError, Result};
use crate::notify::{NavigationFacility, Notification, NotificationFacility};
use crate::profile::{ProfileService, UserProfile};
use crate::scheduler::TimerFacility;
use crate::session::SessionOracle;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub fn sample_profile(hours: &[u8]) -> UserProfile {
    UserProfile {
        email: "ada@example.com".to_owned(),
        first_name: "Ada".to_owned(),
        last_name: "Lovelace".to_owned(),
        alert_hours: hours.iter().copied().collect(),
    }
}

/// Timer facility that only records the alarms it holds.
#[derive(Default)]
pub struct RecordingTimer {
    active: Mutex<BTreeMap<String, DateTime<Utc>>>,
    clear_calls: AtomicUsize,
    create_calls: AtomicUsize,
    fail_clear: bool,
    fail_create: AtomicBool,
}

impl RecordingTimer {
    pub fn failing_clear() -> Self {
        Self {
            fail_clear: true,
            ..Self::default()
        }
    }

    pub fn failing_create() -> Self {
        Self {
            fail_create: AtomicBool::new(true),
            ..Self::default()
        }
    }

    pub fn set_failing_create(&self, failing: bool) {
        self.fail_create.store(failing, Ordering::SeqCst);
    }

    pub fn active(&self) -> BTreeMap<String, DateTime<Utc>> {
        self.active.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TimerFacility for RecordingTimer {
    async fn clear_all(&self) -> Result<bool> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_clear {
            return Err(AlfredError::Timer("clear refused".to_owned()));
        }
        let mut active = self.active.lock().unwrap();
        let cleared = !active.is_empty();
        active.clear();
        Ok(cleared)
    }

    async fn create(&self, name: &str, when: DateTime<Utc>) -> Result<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(AlfredError::Timer("create refused".to_owned()));
        }
        self.active.lock().unwrap().insert(name.to_owned(), when);
        Ok(())
    }
}

/// Notification facility that assigns `<id>-<count>` ids and records calls.
#[derive(Default)]
pub struct RecordingNotifier {
    displayed: Mutex<Vec<(String, Notification)>>,
    dismissed: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    /// `(assigned id, notification)` pairs in display order.
    pub fn displayed(&self) -> Vec<(String, Notification)> {
        self.displayed.lock().unwrap().clone()
    }

    pub fn dismissed(&self) -> Vec<String> {
        self.dismissed.lock().unwrap().clone()
    }

    pub fn last_assigned_id(&self) -> Option<String> {
        self.displayed.lock().unwrap().last().map(|(id, _)| id.clone())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl NotificationFacility for RecordingNotifier {
    async fn display(&self, id: &str, notification: &Notification) -> Result<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AlfredError::Notification("display refused".to_owned()));
        }
        let mut displayed = self.displayed.lock().unwrap();
        let assigned = format!("{id}-{}", displayed.len() + 1);
        displayed.push((assigned.clone(), notification.clone()));
        Ok(assigned)
    }

    async fn dismiss(&self, id: &str) -> Result<()> {
        self.dismissed.lock().unwrap().push(id.to_owned());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    opened: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl NavigationFacility for RecordingNavigator {
    async fn open_surface(&self, url: &str) -> Result<()> {
        self.opened.lock().unwrap().push(url.to_owned());
        Ok(())
    }
}

pub struct ScriptedSession {
    present: AtomicBool,
}

impl ScriptedSession {
    pub fn new(present: bool) -> Self {
        Self {
            present: AtomicBool::new(present),
        }
    }

    pub fn set(&self, present: bool) {
        self.present.store(present, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionOracle for ScriptedSession {
    async fn has_active_session(&self) -> Result<bool> {
        Ok(self.present.load(Ordering::SeqCst))
    }
}

pub struct ScriptedProfiles {
    profile: Mutex<UserProfile>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedProfiles {
    pub fn new(profile: UserProfile) -> Self {
        Self {
            profile: Mutex::new(profile),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Serve `profile` from the next fetch on.
    pub fn set_profile(&self, profile: UserProfile) {
        *self.profile.lock().unwrap() = profile;
    }
}

#[async_trait]
impl ProfileService for ScriptedProfiles {
    async fn fetch_profile(&self) -> Result<UserProfile> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AlfredError::TransientFetch("scripted failure".to_owned()));
        }
        Ok(self.profile.lock().unwrap().clone())
    }
}
