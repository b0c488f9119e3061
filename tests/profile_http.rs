//! HTTP profile service tests against a mock account service.

use alfred::AlfredError;
use alfred::profile::{HttpProfileService, ProfileService};
use alfred::session::CookieJar;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_PATH: &str = "/common/accounts/user";

fn jar_with_session(dir: &tempfile::TempDir) -> CookieJar {
    let path = dir.path().join("cookies.json");
    std::fs::write(
        &path,
        r#"[{"name":"sessionid","value":"abc123","domain":"localhost"}]"#,
    )
    .unwrap();
    CookieJar::new(path)
}

#[tokio::test]
async fn fetches_profile_and_forwards_session_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(USER_PATH))
        .and(header("cookie", "sessionid=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {
                "email": "ada@example.com",
                "first_name": "Ada",
                "last_name": "Lovelace",
                "alert_hours": [18, 9]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let service = HttpProfileService::new(format!("{}{USER_PATH}", server.uri()))
        .with_session_cookie(jar_with_session(&dir), "sessionid");

    let profile = service.fetch_profile().await.unwrap();
    assert_eq!(profile.email, "ada@example.com");
    assert_eq!(profile.first_name, "Ada");
    assert_eq!(profile.last_name, "Lovelace");
    assert_eq!(profile.alert_hours.iter().copied().collect::<Vec<_>>(), vec![9, 18]);
}

#[tokio::test]
async fn no_cookie_header_without_jar() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(USER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"email": "", "first_name": "", "last_name": "", "alert_hours": [1]}
        })))
        .mount(&server)
        .await;

    let service = HttpProfileService::new(format!("{}{USER_PATH}", server.uri()));
    service.fetch_profile().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("cookie"));
}

#[tokio::test]
async fn non_200_is_transient_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(USER_PATH))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let service = HttpProfileService::new(format!("{}{USER_PATH}", server.uri()));
    assert!(matches!(
        service.fetch_profile().await,
        Err(AlfredError::TransientFetch(_))
    ));
}

#[tokio::test]
async fn malformed_body_is_transient_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(USER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let service = HttpProfileService::new(format!("{}{USER_PATH}", server.uri()));
    assert!(matches!(
        service.fetch_profile().await,
        Err(AlfredError::TransientFetch(_))
    ));
}

#[tokio::test]
async fn empty_alert_hours_are_returned_as_is() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(USER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"email": "a@b.c", "first_name": "A", "last_name": "B", "alert_hours": []}
        })))
        .mount(&server)
        .await;

    let service = HttpProfileService::new(format!("{}{USER_PATH}", server.uri()));
    let profile = service.fetch_profile().await.unwrap();
    assert!(profile.alert_hours.is_empty());
}

#[tokio::test]
async fn unreachable_service_is_transient_error() {
    // Port 9 (discard) on localhost is not expected to serve HTTP.
    let service = HttpProfileService::new("http://127.0.0.1:9/common/accounts/user");
    assert!(matches!(
        service.fetch_profile().await,
        Err(AlfredError::TransientFetch(_))
    ));
}
