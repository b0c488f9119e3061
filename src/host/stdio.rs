//! Stdin/stdout JSON bridge between the host and the service driver.
//!
//! Reads newline-delimited [`SignalEnvelope`]s from stdin and turns them into
//! driver events. Notification and navigation requests are written to stdout
//! as newline-delimited [`RequestEnvelope`]s.
//!
//! Stdout is exclusively reserved for the JSON protocol; all diagnostic
//! output must be routed to stderr.

use crate::config::AlfredConfig;
use crate::driver::{self, Collaborators, DriverHandle, ServiceDriver};
use crate::error::{AlfredError, Result};
use crate::host::contract::{HostRequest, HostSignal, RequestEnvelope, SignalEnvelope};
use crate::notify::{NavigationFacility, Notification, NotificationFacility};
use crate::profile::HttpProfileService;
use crate::scheduler::timer::{FireSink, TokioTimerFacility};
use crate::session::{CookieJar, CookieSessionOracle};
use crate::triggers::{AuthResponseFilter, Trigger};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::Mutex;

/// Shared line writer for outbound requests.
pub struct RequestWriter<W> {
    inner: Arc<Mutex<W>>,
}

impl<W> Clone for RequestWriter<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: AsyncWrite + Unpin + Send> RequestWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    /// Serialize `request` as one JSON line and flush.
    pub async fn send(&self, request: HostRequest) -> Result<()> {
        let json = serde_json::to_string(&RequestEnvelope::new(request))
            .map_err(|e| AlfredError::Channel(format!("failed to serialize request: {e}")))?;

        let mut writer = self.inner.lock().await;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }
}

/// [`NotificationFacility`] that asks the host to render notifications.
///
/// Ids are assigned here (UUID v4) and echoed back by the host on click.
pub struct StdioNotifier<W> {
    writer: RequestWriter<W>,
}

impl<W> StdioNotifier<W> {
    pub fn new(writer: RequestWriter<W>) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send + 'static> NotificationFacility for StdioNotifier<W> {
    async fn display(&self, id: &str, notification: &Notification) -> Result<String> {
        let assigned = format!("{id}-{}", uuid::Uuid::new_v4());
        self.writer
            .send(HostRequest::NotificationDisplay {
                id: assigned.clone(),
                title: notification.title.clone(),
                message: notification.message.clone(),
                icon: notification.icon.clone(),
            })
            .await
            .map_err(|e| AlfredError::Notification(e.to_string()))?;
        Ok(assigned)
    }

    async fn dismiss(&self, id: &str) -> Result<()> {
        self.writer
            .send(HostRequest::NotificationDismiss { id: id.to_owned() })
            .await
            .map_err(|e| AlfredError::Notification(e.to_string()))
    }
}

/// [`NavigationFacility`] that asks the host to open a surface.
pub struct StdioNavigator<W> {
    writer: RequestWriter<W>,
}

impl<W> StdioNavigator<W> {
    pub fn new(writer: RequestWriter<W>) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send + 'static> NavigationFacility for StdioNavigator<W> {
    async fn open_surface(&self, url: &str) -> Result<()> {
        self.writer
            .send(HostRequest::SurfaceOpen {
                url: url.to_owned(),
            })
            .await
            .map_err(|e| AlfredError::Navigation(e.to_string()))
    }
}

/// Forward host signals from `reader` to the driver until EOF or `stop`.
///
/// Malformed lines are logged and skipped.
pub async fn run_signal_reader<R: AsyncBufRead + Unpin>(
    mut reader: R,
    filter: &AuthResponseFilter,
    handle: &DriverHandle,
) -> Result<()> {
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader
            .read_line(&mut line)
            .await
            .map_err(|e| AlfredError::Channel(format!("failed to read host input: {e}")))?;

        // EOF
        if bytes_read == 0 {
            tracing::info!("host input closed (EOF); shutting down bridge");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let envelope = match SignalEnvelope::parse(trimmed) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, raw_line = %trimmed, "ignoring host signal");
                continue;
            }
        };

        match envelope.signal {
            HostSignal::Installed => handle.trigger(Trigger::Installed)?,
            HostSignal::Startup => handle.trigger(Trigger::Startup)?,
            HostSignal::ResponseObserved { url, status } => {
                match filter.classify(&url, status) {
                    Some(trigger) => handle.trigger(trigger)?,
                    None => tracing::trace!(%url, status, "response does not restart agent"),
                }
            }
            HostSignal::NotificationClicked { id } => handle.notification_clicked(id)?,
            HostSignal::Stop => {
                tracing::info!("stop received; shutting down bridge");
                break;
            }
        }
    }

    Ok(())
}

/// Wire the production collaborators together and run the bridge on
/// stdin/stdout until the host closes stdin or sends `stop`.
pub async fn run_stdio_bridge(config: AlfredConfig) -> Result<()> {
    let writer = RequestWriter::new(BufWriter::new(tokio::io::stdout()));
    let jar = CookieJar::new(config.service.cookie_jar_path());
    let (handle, events) = driver::channel();

    let fire_handle = handle.clone();
    let sink: FireSink = Arc::new(move |fire| {
        if let Err(e) = fire_handle.alarm_fired(fire) {
            tracing::debug!("alarm fired after driver stopped: {e}");
        }
    });

    let collaborators = Collaborators {
        session: Arc::new(CookieSessionOracle::new(
            jar.clone(),
            config.service.session_cookie.clone(),
        )),
        profiles: Arc::new(
            HttpProfileService::new(config.service.profile_url.clone())
                .with_session_cookie(jar, config.service.session_cookie.clone()),
        ),
        timer: Arc::new(TokioTimerFacility::new(sink)),
        notifier: Arc::new(StdioNotifier::new(writer.clone())),
        navigator: Arc::new(StdioNavigator::new(writer)),
    };

    let filter = AuthResponseFilter::new(config.triggers.auth_response_patterns.clone());
    let driver = ServiceDriver::new(collaborators, &config, handle.clone(), events);
    let driver_task = tokio::spawn(driver.run());

    let reader_result =
        run_signal_reader(BufReader::new(tokio::io::stdin()), &filter, &handle).await;

    let _ = handle.shutdown();
    if let Err(e) = driver_task.await {
        tracing::error!(error = %e, "service driver task failed");
    }
    reader_result
}
