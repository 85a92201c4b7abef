use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client as HttpClient, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::auth::TokenManager;
use crate::config::HaloConfig;
use crate::error::{HaloError, Result};
use crate::models::{NoteCreate, TicketCreate, TicketSearch, TicketUpdate};
use crate::retry::RetryPolicy;

/// Per-call knobs for the request executor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestOptions {
    pub retry_count: u32,
    pub timeout: Duration,
}

impl RequestOptions {
    pub fn from_config(config: &HaloConfig) -> Self {
        Self {
            retry_count: config.retry_count,
            timeout: config.timeout,
        }
    }

    pub fn with_retry_count(mut self, count: u32) -> Self {
        self.retry_count = count;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

enum Attempt {
    Done(Value),
    Unauthorized(String),
    Failed(HaloError),
}

#[derive(Clone, Debug)]
pub struct HaloClient {
    http: HttpClient,
    config: HaloConfig,
    tokens: TokenManager,
}

impl HaloClient {
    pub fn new(config: HaloConfig) -> Result<Self> {
        validate_config(&config)?;
        let http = build_http_client(&config)?;
        let tokens = TokenManager::new(http.clone(), &config);
        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    pub fn config(&self) -> &HaloConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub fn default_options(&self) -> RequestOptions {
        RequestOptions::from_config(&self.config)
    }

    pub async fn access_token(&self) -> Result<String> {
        self.tokens.access_token().await
    }

    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query: Option<&[(&str, String)]>,
        body: Option<&Value>,
    ) -> Result<Value> {
        self.request_with(method, endpoint, query, body, self.default_options())
            .await
    }

    /// Sends an authenticated request, refreshing the token on 401 and
    /// retrying other failures with linear backoff. A 401 refresh consumes
    /// one attempt of the same budget, and so does a failed refresh.
    pub async fn request_with(
        &self,
        method: Method,
        endpoint: &str,
        query: Option<&[(&str, String)]>,
        body: Option<&Value>,
        options: RequestOptions,
    ) -> Result<Value> {
        let url = self.config.endpoint_url(endpoint);
        let policy = RetryPolicy::new(options.retry_count, self.config.backoff_step);
        let mut token = Some(self.tokens.access_token().await?);
        info!("Making {} request to {}", method, url);

        let mut attempt = 0;
        loop {
            debug!("Request attempt {}/{}", attempt + 1, policy.attempts());
            let current = match token.take() {
                Some(value) => value,
                None => match self.tokens.access_token().await {
                    Ok(value) => value,
                    Err(err) => {
                        warn!(
                            "Token refresh failed on attempt {}/{}: {}",
                            attempt + 1,
                            policy.attempts(),
                            err
                        );
                        if policy.is_last(attempt) {
                            return Err(err);
                        }
                        policy.pause(attempt).await;
                        attempt += 1;
                        continue;
                    }
                },
            };

            let outcome = self
                .attempt(&method, &url, &current, query, body, options.timeout)
                .await;

            let error = match outcome {
                Attempt::Done(value) => return Ok(value),
                Attempt::Unauthorized(_) if !policy.is_last(attempt) => {
                    info!("Access token rejected, refreshing");
                    self.tokens.invalidate().await;
                    attempt += 1;
                    continue;
                }
                Attempt::Unauthorized(body) => HaloError::http(StatusCode::UNAUTHORIZED, &body),
                Attempt::Failed(err) => err,
            };

            warn!(
                "Request to {} failed on attempt {}/{}: {}",
                url,
                attempt + 1,
                policy.attempts(),
                error
            );
            if policy.is_last(attempt) || !error.is_retryable() {
                return Err(error);
            }
            token = Some(current);
            policy.pause(attempt).await;
            attempt += 1;
        }
    }

    async fn attempt(
        &self,
        method: &Method,
        url: &str,
        token: &str,
        query: Option<&[(&str, String)]>,
        body: Option<&Value>,
        timeout: Duration,
    ) -> Attempt {
        let mut request = self
            .http
            .request(method.clone(), url)
            .bearer_auth(token)
            .timeout(timeout);
        if let Some(params) = query {
            request = request.query(params);
        }
        if let Some(payload) = body {
            request = request.json(payload);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => return Attempt::Failed(err.into()),
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Attempt::Unauthorized(body);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Attempt::Failed(HaloError::http(status, &body));
        }

        match response.text().await {
            Ok(text) => Attempt::Done(parse_body(text)),
            Err(err) => Attempt::Failed(err.into()),
        }
    }

    pub async fn get_ticket(&self, ticket_id: i64) -> Result<Value> {
        let path = format!("tickets/{}", ticket_id);
        self.request(Method::GET, &path, None, None).await
    }

    pub async fn create_ticket(&self, ticket: &TicketCreate) -> Result<Value> {
        let body = single_element_body(ticket)?;
        let response = self.request(Method::POST, "tickets", None, Some(&body)).await?;
        Ok(first_entity(response))
    }

    pub async fn update_ticket(&self, ticket: &TicketUpdate) -> Result<Value> {
        if ticket.id <= 0 {
            return Err(HaloError::InvalidRequest(
                "ticket update must include a positive id".into(),
            ));
        }
        let body = single_element_body(ticket)?;
        let response = self.request(Method::POST, "tickets", None, Some(&body)).await?;
        Ok(first_entity(response))
    }

    pub async fn search_tickets(&self, search: &TicketSearch) -> Result<Vec<Value>> {
        let query = search.to_query();
        let response = self
            .request(Method::GET, "tickets", Some(query.as_slice()), None)
            .await?;
        Ok(extract_ticket_list(response))
    }

    pub async fn add_note(&self, note: &NoteCreate) -> Result<Value> {
        let body = single_element_body(note)?;
        let response = self
            .request(Method::POST, "ticketnotes", None, Some(&body))
            .await?;
        Ok(first_entity(response))
    }

    pub async fn get_agent(&self, agent_id: i64) -> Result<Value> {
        let path = format!("agent/{}", agent_id);
        self.request(Method::GET, &path, None, None).await
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Value> {
        let path = format!("users/{}", user_id);
        self.request(Method::GET, &path, None, None).await
    }

    /// Lightweight probe used by connection tests.
    pub async fn list_ticket_types(&self, options: RequestOptions) -> Result<Value> {
        let query = [("pageinate", "false".to_string()), ("count", "1".to_string())];
        self.request_with(Method::GET, "tickettypes", Some(query.as_slice()), None, options)
            .await
    }
}

fn validate_config(config: &HaloConfig) -> Result<()> {
    if config.auth_server.is_empty() {
        return Err(HaloError::Configuration(
            "authorization server URL cannot be empty".into(),
        ));
    }
    if config.resource_server.is_empty() {
        return Err(HaloError::Configuration(
            "resource server URL cannot be empty".into(),
        ));
    }
    Ok(())
}

fn build_http_client(config: &HaloConfig) -> Result<HttpClient> {
    let mut headers = HeaderMap::new();
    let agent = HeaderValue::from_str(&config.user_agent)
        .map_err(|err| HaloError::Configuration(err.to_string()))?;
    headers.insert(USER_AGENT, agent);

    HttpClient::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .danger_accept_invalid_certs(!config.ssl_verify)
        .build()
        .map_err(|err| HaloError::Configuration(err.to_string()))
}

fn single_element_body<T: Serialize>(item: &T) -> Result<Value> {
    Ok(Value::Array(vec![serde_json::to_value(item)?]))
}

fn parse_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

fn first_entity(value: Value) -> Value {
    match value {
        Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
        other => other,
    }
}

fn extract_ticket_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("tickets") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
