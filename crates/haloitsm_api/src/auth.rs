//! OAuth2 client-credentials token acquisition and caching.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::{
    ClientCredentials, HaloConfig, DEFAULT_TOKEN_LIFETIME_SECS, MAX_TOKEN_LIFETIME_SECS,
    TOKEN_REFRESH_MARGIN_SECS,
};
use crate::error::{truncate_text, HaloError, Result, MAX_ERROR_BODY_CHARS};

#[derive(Debug, Deserialize, Clone)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Bearer token together with the instant it stops being accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// A token is reused only while `now < expires_at - 60s`.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - Duration::seconds(TOKEN_REFRESH_MARGIN_SECS)
    }
}

/// Fetches client-credentials tokens and caches the latest one.
///
/// Clones share the cache. The lock is never held across the token request, so
/// concurrent refreshes can at worst fetch one redundant token.
#[derive(Clone, Debug)]
pub struct TokenManager {
    http: HttpClient,
    token_url: String,
    credentials: ClientCredentials,
    scope: String,
    cache: Arc<Mutex<Option<AccessToken>>>,
}

impl TokenManager {
    pub fn new(http: HttpClient, config: &HaloConfig) -> Self {
        Self {
            http,
            token_url: config.token_url(),
            credentials: config.credentials.clone(),
            scope: config.scope.clone(),
            cache: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the cached token while fresh, otherwise requests a new one.
    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.cached().await {
            if token.is_fresh_at(Utc::now()) {
                return Ok(token.value);
            }
        }

        let token = self.request_token().await?;
        let value = token.value.clone();
        *self.cache.lock().await = Some(token);
        Ok(value)
    }

    /// Drops the cached token so the next call goes to the token endpoint.
    pub async fn invalidate(&self) {
        debug!("Invalidating cached access token");
        *self.cache.lock().await = None;
    }

    pub async fn cached(&self) -> Option<AccessToken> {
        self.cache.lock().await.clone()
    }

    /// Performs the client-credentials grant without touching the cache.
    pub async fn request_token(&self) -> Result<AccessToken> {
        let requested_at = Utc::now();
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await
            .map_err(|err| HaloError::Authentication(format!("token request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HaloError::Authentication(format!(
                "token endpoint returned {status}: {}",
                truncate_text(&body, MAX_ERROR_BODY_CHARS)
            )));
        }

        let payload = response
            .json::<TokenResponse>()
            .await
            .map_err(|err| HaloError::Authentication(format!("unreadable token response: {err}")))?;

        let value = payload
            .access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                HaloError::Authentication("token response did not include an access_token".into())
            })?;
        let expires_in = payload
            .expires_in
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
            .clamp(0, MAX_TOKEN_LIFETIME_SECS);
        info!("OAuth2 token obtained, expires in {} seconds", expires_in);

        Ok(AccessToken {
            value,
            expires_at: expiry_after(requested_at, expires_in),
        })
    }
}

fn expiry_after(requested_at: DateTime<Utc>, expires_in: i64) -> DateTime<Utc> {
    Duration::try_seconds(expires_in)
        .and_then(|lifetime| requested_at.checked_add_signed(lifetime))
        .or_else(|| requested_at.checked_add_signed(Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS)))
        .unwrap_or(requested_at)
}
