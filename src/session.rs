//! Session oracle backed by a cookie jar.
//!
//! A session exists when the jar holds at least one cookie with the
//! configured name. Nothing about the cookie beyond its presence is inspected,
//! and no answer is cached between checks.

use crate::error::{AlfredError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Answers whether an authenticated session currently exists.
#[async_trait]
pub trait SessionOracle: Send + Sync {
    /// Returns `true` when a session is present right now.
    async fn has_active_session(&self) -> Result<bool>;
}

/// One cookie as stored in the JSON cookie jar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// JSON cookie jar file (an array of [`Cookie`]s) maintained by the host.
#[derive(Debug, Clone)]
pub struct CookieJar {
    path: PathBuf,
}

impl CookieJar {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read every cookie in the jar. A missing file is an empty jar.
    ///
    /// # Errors
    ///
    /// Returns [`AlfredError::TransientFetch`] if the file exists but cannot
    /// be read or parsed.
    pub async fn load(&self) -> Result<Vec<Cookie>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AlfredError::TransientFetch(format!(
                    "failed to read cookie jar {}: {e}",
                    self.path.display()
                )));
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            AlfredError::TransientFetch(format!(
                "malformed cookie jar {}: {e}",
                self.path.display()
            ))
        })
    }

    /// Value of the first cookie called `name`, if any.
    ///
    /// # Errors
    ///
    /// See [`CookieJar::load`].
    pub async fn find(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .load()
            .await?
            .into_iter()
            .find(|cookie| cookie.name == name)
            .map(|cookie| cookie.value))
    }
}

/// [`SessionOracle`] that looks for a named cookie in a [`CookieJar`].
pub struct CookieSessionOracle {
    jar: CookieJar,
    cookie_name: String,
}

impl CookieSessionOracle {
    #[must_use]
    pub fn new(jar: CookieJar, cookie_name: impl Into<String>) -> Self {
        Self {
            jar,
            cookie_name: cookie_name.into(),
        }
    }
}

#[async_trait]
impl SessionOracle for CookieSessionOracle {
    async fn has_active_session(&self) -> Result<bool> {
        let found = self.jar.find(&self.cookie_name).await?.is_some();
        tracing::debug!(cookie = %self.cookie_name, found, "session check");
        Ok(found)
    }
}
