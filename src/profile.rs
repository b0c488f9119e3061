//! User profile fetching.
//!
//! The profile is re-fetched on every cycle and never cached.

use crate::error::{AlfredError, Result};
use crate::session::CookieJar;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeSet;

/// The signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Hours of day (0-23) at which the user wants to be alerted, ascending.
    pub alert_hours: BTreeSet<u8>,
}

impl UserProfile {
    /// Decode a profile service body of the form `{"user": {...}}`.
    ///
    /// # Errors
    ///
    /// [`AlfredError::TransientFetch`] for malformed JSON,
    /// [`AlfredError::Configuration`] for alert hours outside `0..=23`.
    pub fn from_response_body(body: &[u8]) -> Result<Self> {
        let envelope: UserEnvelope = serde_json::from_slice(body)
            .map_err(|e| AlfredError::TransientFetch(format!("malformed profile body: {e}")))?;
        envelope.user.try_into()
    }
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: WireUser,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    #[serde(default)]
    email: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    alert_hours: Vec<i64>,
}

impl TryFrom<WireUser> for UserProfile {
    type Error = AlfredError;

    fn try_from(user: WireUser) -> Result<Self> {
        let alert_hours = user
            .alert_hours
            .iter()
            .map(|&hour| {
                u8::try_from(hour)
                    .ok()
                    .filter(|h| *h <= 23)
                    .ok_or_else(|| {
                        AlfredError::Configuration(format!("alert hour {hour} is outside 0-23"))
                    })
            })
            .collect::<Result<BTreeSet<u8>>>()?;

        Ok(Self {
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            alert_hours,
        })
    }
}

/// Retrieves the signed-in user's profile.
#[async_trait]
pub trait ProfileService: Send + Sync {
    async fn fetch_profile(&self) -> Result<UserProfile>;
}

/// [`ProfileService`] that GETs a JSON profile from the account service,
/// forwarding the session cookie.
pub struct HttpProfileService {
    client: reqwest::Client,
    url: String,
    jar: Option<CookieJar>,
    cookie_name: String,
}

impl HttpProfileService {
    /// Create a service for `url` that sends no cookies.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            jar: None,
            cookie_name: String::new(),
        }
    }

    /// Forward the named cookie from `jar` with every request.
    pub fn with_session_cookie(mut self, jar: CookieJar, cookie_name: impl Into<String>) -> Self {
        self.jar = Some(jar);
        self.cookie_name = cookie_name.into();
        self
    }
}

#[async_trait]
impl ProfileService for HttpProfileService {
    async fn fetch_profile(&self) -> Result<UserProfile> {
        let mut request = self.client.get(&self.url);
        if let Some(jar) = &self.jar {
            if let Some(value) = jar.find(&self.cookie_name).await? {
                request = request.header(
                    reqwest::header::COOKIE,
                    format!("{}={value}", self.cookie_name),
                );
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| AlfredError::TransientFetch(format!("profile request failed: {e}")))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(AlfredError::TransientFetch(format!(
                "profile service returned {status}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AlfredError::TransientFetch(format!("profile body read failed: {e}")))?;
        let profile = UserProfile::from_response_body(&body)?;
        tracing::debug!(email = %profile.email, hours = ?profile.alert_hours, "profile fetched");
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn decodes_user_envelope() {
        let body = br#"{"user":{"email":"a@b.c","first_name":"Ada","last_name":"L","alert_hours":[18,9,18]}}"#;
        let profile = UserProfile::from_response_body(body).unwrap();
        assert_eq!(profile.first_name, "Ada");
        assert_eq!(profile.alert_hours.iter().copied().collect::<Vec<_>>(), vec![9, 18]);
    }

    #[test]
    fn empty_hours_decode_to_empty_set() {
        let body = br#"{"user":{"email":"a@b.c","first_name":"Ada","last_name":"L","alert_hours":[]}}"#;
        let profile = UserProfile::from_response_body(body).unwrap();
        assert!(profile.alert_hours.is_empty());
    }

    #[test]
    fn out_of_range_hour_is_configuration_error() {
        for bad in ["24", "-1"] {
            let body = format!(
                r#"{{"user":{{"email":"","first_name":"","last_name":"","alert_hours":[{bad}]}}}}"#
            );
            assert!(matches!(
                UserProfile::from_response_body(body.as_bytes()),
                Err(AlfredError::Configuration(_))
            ));
        }
    }

    #[test]
    fn missing_user_key_is_transient_error() {
        assert!(matches!(
            UserProfile::from_response_body(br#"{"email":"a@b.c"}"#),
            Err(AlfredError::TransientFetch(_))
        ));
    }
}
