//! User-facing prompts.
//!
//! Two prompt kinds exist: the login prompt and the alert prompt. Both are
//! displayed through a [`NotificationFacility`]; a click on the most recently
//! displayed prompt opens the matching surface through a
//! [`NavigationFacility`]. Displaying a prompt invalidates the previous one's
//! click target, so one click is consumed at most once.

use crate::config::{NotificationConfig, ServiceConfig};
use crate::error::Result;
use crate::profile::UserProfile;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Logical id requested for the login prompt.
pub const LOGIN_NOTIFICATION_ID: &str = "alfred-login";

/// Logical id requested for the alert prompt.
pub const ALERT_NOTIFICATION_ID: &str = "alfred-alert";

/// Notification content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub icon: String,
}

/// Displays and dismisses notifications.
#[async_trait]
pub trait NotificationFacility: Send + Sync {
    /// Show `notification` and return the id click events will carry.
    async fn display(&self, id: &str, notification: &Notification) -> Result<String>;

    async fn dismiss(&self, id: &str) -> Result<()>;
}

/// Opens web surfaces (login page, alert page) in a new view.
#[async_trait]
pub trait NavigationFacility: Send + Sync {
    async fn open_surface(&self, url: &str) -> Result<()>;
}

/// Which prompt a click acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Login,
    Alert,
}

#[derive(Debug, Clone)]
struct ActivePrompt {
    assigned_id: String,
    kind: PromptKind,
}

/// Drives the login and alert prompts and routes their clicks.
pub struct NotificationOrchestrator {
    notifier: Arc<dyn NotificationFacility>,
    navigator: Arc<dyn NavigationFacility>,
    content: NotificationConfig,
    login_url: String,
    alert_url: String,
    active: Option<ActivePrompt>,
    login_prompt_shown: bool,
}

impl NotificationOrchestrator {
    pub fn new(
        notifier: Arc<dyn NotificationFacility>,
        navigator: Arc<dyn NavigationFacility>,
        content: NotificationConfig,
        service: &ServiceConfig,
    ) -> Self {
        Self {
            notifier,
            navigator,
            content,
            login_url: service.login_url.clone(),
            alert_url: service.alert_url.clone(),
            active: None,
            login_prompt_shown: false,
        }
    }

    /// Whether the login prompt has been shown during this process.
    #[must_use]
    pub fn login_prompt_shown(&self) -> bool {
        self.login_prompt_shown
    }

    /// Show the login prompt unless it was already shown in this process.
    ///
    /// Returns `true` when the prompt was displayed.
    ///
    /// # Errors
    ///
    /// Propagates the notification facility's display error; the once-only
    /// flag stays unset in that case.
    pub async fn show_login_prompt(&mut self) -> Result<bool> {
        if self.login_prompt_shown {
            debug!("login prompt already shown in this process");
            return Ok(false);
        }

        let notification = Notification {
            title: self.content.login_title.clone(),
            message: self.content.login_message.clone(),
            icon: self.content.icon.clone(),
        };
        self.display(LOGIN_NOTIFICATION_ID, &notification, PromptKind::Login)
            .await?;
        self.login_prompt_shown = true;
        Ok(true)
    }

    /// Show the alert prompt for `profile`.
    ///
    /// # Errors
    ///
    /// Propagates the notification facility's display error.
    pub async fn show_alert_prompt(&mut self, profile: &UserProfile) -> Result<()> {
        let notification = Notification {
            title: self.content.alert_title.clone(),
            message: self
                .content
                .alert_message
                .replace("{first_name}", &profile.first_name),
            icon: self.content.icon.clone(),
        };
        self.display(ALERT_NOTIFICATION_ID, &notification, PromptKind::Alert)
            .await
    }

    async fn display(
        &mut self,
        id: &str,
        notification: &Notification,
        kind: PromptKind,
    ) -> Result<()> {
        if let Some(previous) = self.active.take() {
            if let Err(e) = self.notifier.dismiss(&previous.assigned_id).await {
                debug!("failed to dismiss superseded notification: {e}");
            }
        }

        let assigned_id = self.notifier.display(id, notification).await?;
        info!(id = %assigned_id, ?kind, "notification displayed");
        self.active = Some(ActivePrompt { assigned_id, kind });
        Ok(())
    }

    /// Handle a click on notification `assigned_id`.
    ///
    /// Clicks on anything but the active prompt are ignored and return `None`.
    /// Otherwise the prompt is consumed and dismissed, its surface is opened,
    /// and its kind is returned. Dismiss and navigation failures are logged.
    pub async fn acknowledge(&mut self, assigned_id: &str) -> Option<PromptKind> {
        let is_active = self
            .active
            .as_ref()
            .is_some_and(|active| active.assigned_id == assigned_id);
        if !is_active {
            debug!(id = %assigned_id, "click on inactive notification ignored");
            return None;
        }
        let active = self.active.take()?;

        if let Err(e) = self.notifier.dismiss(&active.assigned_id).await {
            debug!("failed to dismiss acknowledged notification: {e}");
        }

        let url = match active.kind {
            PromptKind::Login => &self.login_url,
            PromptKind::Alert => &self.alert_url,
        };
        if let Err(e) = self.navigator.open_surface(url).await {
            warn!("failed to open {url}: {e}");
        }
        Some(active.kind)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::config::AlfredConfig;
    use crate::test_utils::{RecordingNavigator, RecordingNotifier, sample_profile};

    fn orchestrator() -> (
        NotificationOrchestrator,
        Arc<RecordingNotifier>,
        Arc<RecordingNavigator>,
    ) {
        let config = AlfredConfig::default();
        let notifier = Arc::new(RecordingNotifier::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let orchestrator = NotificationOrchestrator::new(
            notifier.clone(),
            navigator.clone(),
            config.notifications,
            &config.service,
        );
        (orchestrator, notifier, navigator)
    }

    #[tokio::test]
    async fn login_prompt_shows_once() {
        let (mut orchestrator, notifier, _) = orchestrator();

        assert!(orchestrator.show_login_prompt().await.unwrap());
        assert!(!orchestrator.show_login_prompt().await.unwrap());
        assert!(!orchestrator.show_login_prompt().await.unwrap());

        assert_eq!(notifier.displayed().len(), 1);
        assert!(orchestrator.login_prompt_shown());
    }

    #[tokio::test]
    async fn failed_display_leaves_login_flag_unset() {
        let (mut orchestrator, notifier, _) = orchestrator();
        notifier.set_failing(true);
        assert!(orchestrator.show_login_prompt().await.is_err());
        assert!(!orchestrator.login_prompt_shown());

        notifier.set_failing(false);
        assert!(orchestrator.show_login_prompt().await.unwrap());
    }

    #[tokio::test]
    async fn alert_message_includes_first_name() {
        let (mut orchestrator, notifier, _) = orchestrator();
        orchestrator.show_alert_prompt(&sample_profile(&[9])).await.unwrap();

        let shown = notifier.displayed();
        assert_eq!(shown[0].1.message, "Hi Ada! You have new alerts.");
        assert_eq!(shown[0].1.icon, "images/alfred_w_128.png");
    }

    #[tokio::test]
    async fn click_opens_matching_surface_once() {
        let (mut orchestrator, notifier, navigator) = orchestrator();
        orchestrator.show_alert_prompt(&sample_profile(&[9])).await.unwrap();
        let id = notifier.last_assigned_id().unwrap();

        assert_eq!(orchestrator.acknowledge(&id).await, Some(PromptKind::Alert));
        assert_eq!(orchestrator.acknowledge(&id).await, None);
        assert_eq!(navigator.opened(), vec!["http://localhost:4200/alerts".to_owned()]);
        assert_eq!(notifier.dismissed(), vec![id]);
    }

    #[tokio::test]
    async fn login_click_opens_login_surface() {
        let (mut orchestrator, notifier, navigator) = orchestrator();
        orchestrator.show_login_prompt().await.unwrap();
        let id = notifier.last_assigned_id().unwrap();

        assert_eq!(orchestrator.acknowledge(&id).await, Some(PromptKind::Login));
        assert_eq!(navigator.opened(), vec!["http://localhost:4200".to_owned()]);
    }

    #[tokio::test]
    async fn new_prompt_invalidates_previous_click_target() {
        let (mut orchestrator, notifier, navigator) = orchestrator();
        orchestrator.show_login_prompt().await.unwrap();
        let login_id = notifier.last_assigned_id().unwrap();
        orchestrator.show_alert_prompt(&sample_profile(&[9])).await.unwrap();

        assert_eq!(orchestrator.acknowledge(&login_id).await, None);
        assert!(navigator.opened().is_empty());
        assert!(notifier.dismissed().contains(&login_id));
    }

    #[tokio::test]
    async fn unknown_click_is_ignored() {
        let (mut orchestrator, _, navigator) = orchestrator();
        assert_eq!(orchestrator.acknowledge("nope").await, None);
        assert!(navigator.opened().is_empty());
    }
}
