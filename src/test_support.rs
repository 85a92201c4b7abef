use std::time::Duration;

use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Map, Value};

use crate::connection::Connection;

pub async fn mock_token(server: &mut ServerGuard, hits: usize) -> Mock {
    server
        .mock("POST", "/auth/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"tok","expires_in":3600}"#)
        .expect(hits)
        .create_async()
        .await
}

/// Connection against the mock server with the given `default_*` overrides
/// and millisecond backoff.
pub fn connection(server: &ServerGuard, defaults: Value) -> Connection {
    let mut params = json!({
        "client_id": "client-1234",
        "client_secret": {"secretKey": "secret"},
        "authorization_server": format!("{}/auth", server.url()),
        "resource_server": format!("{}/api", server.url()),
        "tenant": "acme"
    });
    if let (Some(target), Some(extra)) = (params.as_object_mut(), defaults.as_object()) {
        target.extend(extra.clone());
    }
    Connection::connect(&params)
        .expect("test connection parameters are valid")
        .with_retry(3, Duration::from_millis(1))
}

pub fn input(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

/// Matches any request; used to assert that nothing reached the server.
pub async fn forbid_all(server: &mut ServerGuard, method: &str, path: &str) -> Mock {
    server
        .mock(method, path)
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await
}
