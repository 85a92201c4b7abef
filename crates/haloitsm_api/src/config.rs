use std::fmt;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "haloitsm-plugin";
pub const DEFAULT_SCOPE: &str = "all";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RETRY_COUNT: u32 = 3;
pub const DEFAULT_BACKOFF_STEP_MS: u64 = 1_000;
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3_600;
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;
/// Upper bound applied to the lifetime a token endpoint reports.
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 10 * 365 * 86_400;

#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct HaloConfig {
    pub auth_server: String,
    pub resource_server: String,
    pub credentials: ClientCredentials,
    pub tenant: Option<String>,
    pub scope: String,
    pub ssl_verify: bool,
    pub user_agent: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub retry_count: u32,
    pub backoff_step: Duration,
}

impl HaloConfig {
    pub fn new(
        auth_server: impl Into<String>,
        resource_server: impl Into<String>,
        credentials: ClientCredentials,
    ) -> Self {
        Self {
            auth_server: auth_server.into().trim().trim_end_matches('/').to_string(),
            resource_server: resource_server.into().trim().trim_end_matches('/').to_string(),
            credentials,
            tenant: None,
            scope: DEFAULT_SCOPE.to_string(),
            ssl_verify: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            retry_count: DEFAULT_RETRY_COUNT,
            backoff_step: Duration::from_millis(DEFAULT_BACKOFF_STEP_MS),
        }
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_ssl_verify(mut self, verify: bool) -> Self {
        self.ssl_verify = verify;
        self
    }

    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    pub fn with_timeout(mut self, duration: Duration) -> Self {
        self.timeout = duration;
        self
    }

    pub fn with_connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = duration;
        self
    }

    pub fn with_retry_count(mut self, count: u32) -> Self {
        self.retry_count = count;
        self
    }

    pub fn with_backoff_step(mut self, step: Duration) -> Self {
        self.backoff_step = step;
        self
    }

    pub fn token_url(&self) -> String {
        format!("{}/token", self.auth_server)
    }

    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.resource_server,
            endpoint.trim_start_matches('/')
        )
    }

    /// Browser-facing base URL: the resource server without its `/api` segment.
    pub fn portal_url(&self) -> String {
        self.resource_server
            .strip_suffix("/api")
            .unwrap_or(&self.resource_server)
            .to_string()
    }
}
