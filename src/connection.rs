//! Validated connection to one HaloITSM tenant.
//!
//! The API client is not created until an action first needs it, so a
//! connection can be parsed and validated without touching the network.

use std::time::Duration;

use haloitsm_api::{ClientCredentials, HaloClient, HaloConfig};
use log::{info, warn};
use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_json::Value;

use crate::config::{ConnectionParams, TicketDefaults};
use crate::error::{PluginError, PluginResult};
use crate::secrets::{mask_identifier, SecretString};

const PROBE_TIMEOUT_SECS: u64 = 15;
const PROBE_RETRY_COUNT: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectionTestResult {
    pub success: bool,
}

#[derive(Debug)]
pub struct Connection {
    defaults: TicketDefaults,
    api_config: HaloConfig,
    client: OnceCell<HaloClient>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|text| !text.is_empty())
}

fn present_secret(value: &Option<SecretString>) -> Option<&str> {
    value
        .as_ref()
        .filter(|secret| !secret.is_blank())
        .map(SecretString::expose)
}

impl Connection {
    /// Parses and validates the host's connection block.
    pub fn connect(params: &Value) -> PluginResult<Self> {
        if !params.as_object().is_some_and(|map| !map.is_empty()) {
            return Err(PluginError::validation(
                "No connection parameters provided",
                "Connection parameters are required",
            ));
        }
        let params: ConnectionParams = serde_json::from_value(params.clone()).map_err(|err| {
            PluginError::validation("Invalid connection parameters", err.to_string())
        })?;
        Self::from_params(params)
    }

    pub fn from_params(params: ConnectionParams) -> PluginResult<Self> {
        let client_id = present_secret(&params.client_id);
        let client_secret = present_secret(&params.client_secret);
        let auth_server = present(&params.authorization_server);
        let resource_server = present(&params.resource_server);
        let tenant = present(&params.tenant);

        let missing: Vec<&str> = [
            ("client_id", client_id.is_none()),
            ("client_secret", client_secret.is_none()),
            ("authorization_server", auth_server.is_none()),
            ("resource_server", resource_server.is_none()),
            ("tenant", tenant.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (Some(client_id), Some(client_secret), Some(auth_server), Some(resource_server), Some(tenant)) =
            (client_id, client_secret, auth_server, resource_server, tenant)
        else {
            return Err(PluginError::validation(
                "Missing required connection parameters",
                format!(
                    "Please provide all required connection parameters: {}",
                    missing.join(", ")
                ),
            ));
        };

        let api_config = HaloConfig::new(
            auth_server,
            resource_server,
            ClientCredentials::new(client_id, client_secret),
        )
        .with_tenant(tenant)
        .with_ssl_verify(params.ssl_verify);

        info!(
            "Connecting to HaloITSM tenant {} at {} (client {}, ssl verify {})",
            tenant,
            api_config.resource_server,
            mask_identifier(client_id),
            params.ssl_verify
        );

        Ok(Self {
            defaults: params.defaults(),
            api_config,
            client: OnceCell::new(),
        })
    }

    /// Overrides the retry budget and backoff step of the not-yet-built client.
    pub fn with_retry(mut self, retry_count: u32, backoff_step: Duration) -> Self {
        self.api_config = self
            .api_config
            .with_retry_count(retry_count)
            .with_backoff_step(backoff_step);
        self.client = OnceCell::new();
        self
    }

    pub fn defaults(&self) -> &TicketDefaults {
        &self.defaults
    }

    pub fn api_config(&self) -> &HaloConfig {
        &self.api_config
    }

    pub fn portal_url(&self) -> String {
        self.api_config.portal_url()
    }

    /// Returns the API client, building it on first use.
    pub fn ensure_client(&self) -> PluginResult<&HaloClient> {
        self.client.get_or_try_init(|| {
            HaloClient::new(self.api_config.clone())
                .map_err(|err| PluginError::from_api("Connection initialization failed", err))
        })
    }

    /// Authenticates, then probes a cheap endpoint. Only the token request
    /// decides the outcome; a failing probe is logged.
    pub async fn test(&self) -> PluginResult<ConnectionTestResult> {
        let client = self
            .ensure_client()
            .map_err(PluginError::into_connection_test)?;

        info!("Connection test: requesting OAuth2 token");
        let token = client.access_token().await.map_err(|err| {
            PluginError::from_api("Connection test failed", err).into_connection_test()
        })?;
        info!("Connection test: token obtained (length {})", token.len());

        let options = client
            .default_options()
            .with_retry_count(PROBE_RETRY_COUNT)
            .with_timeout(Duration::from_secs(PROBE_TIMEOUT_SECS));
        match client.list_ticket_types(options).await {
            Ok(_) => info!("Connection test: API probe succeeded"),
            Err(err) => warn!("Connection test: API probe failed after authentication: {}", err),
        }

        Ok(ConnectionTestResult { success: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn params(server: &str) -> Value {
        json!({
            "client_id": "client-1234",
            "client_secret": {"secretKey": "secret"},
            "authorization_server": format!("{server}/auth"),
            "resource_server": format!("{server}/api"),
            "tenant": "acme",
            "default_priority_id": 3
        })
    }

    #[test]
    fn missing_parameters_are_listed() {
        let err = Connection::connect(&json!({
            "client_id": "abc",
            "resource_server": "https://halo.example.com/api"
        }))
        .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.cause, "Missing required connection parameters");
        assert!(err.assistance.contains("client_secret"));
        assert!(err.assistance.contains("authorization_server"));
        assert!(err.assistance.contains("tenant"));
        assert!(!err.assistance.contains("resource_server"));
    }

    #[test]
    fn empty_payload_is_rejected() {
        let err = Connection::connect(&Value::Null).unwrap_err();
        assert_eq!(err.cause, "No connection parameters provided");
    }

    #[test]
    fn client_is_built_lazily_and_once() {
        let connection = Connection::connect(&params("https://halo.example.com")).unwrap();
        assert!(connection.client.get().is_none());

        let first = connection.ensure_client().unwrap() as *const HaloClient;
        let second = connection.ensure_client().unwrap() as *const HaloClient;
        assert_eq!(first, second);
        assert_eq!(connection.portal_url(), "https://halo.example.com");
        assert_eq!(connection.defaults().priority_id, Some(3));
    }

    #[test]
    fn ssl_verify_flag_reaches_client_config() {
        let connection = Connection::connect(&params("https://halo.example.com")).unwrap();
        assert!(connection.api_config().ssl_verify);

        let mut insecure = params("https://halo.example.com");
        insecure["ssl_verify"] = json!(false);
        let connection = Connection::connect(&insecure).unwrap();
        assert!(!connection.api_config().ssl_verify);
        assert!(!connection.ensure_client().unwrap().config().ssl_verify);
    }

    #[tokio::test]
    async fn test_succeeds_even_when_probe_fails() {
        let mut server = mockito::Server::new_async().await;
        let token = server
            .mock("POST", "/auth/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"tok","expires_in":3600}"#)
            .expect(1)
            .create_async()
            .await;
        let probe = server
            .mock("GET", "/api/tickettypes")
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let connection = Connection::connect(&params(&server.url())).unwrap();
        let result = connection.test().await.unwrap();

        assert!(result.success);
        token.assert_async().await;
        probe.assert_async().await;
    }

    #[tokio::test]
    async fn test_fails_when_token_is_refused() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/token")
            .with_status(401)
            .with_body(r#"{"error":"invalid_client"}"#)
            .create_async()
            .await;
        let probe = server
            .mock("GET", "/api/tickettypes")
            .match_query(mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let connection = Connection::connect(&params(&server.url())).unwrap();
        let err = connection.test().await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::ConnectionTest);
        assert_eq!(err.cause, "Failed to obtain OAuth2 token");
        probe.assert_async().await;
    }
}
