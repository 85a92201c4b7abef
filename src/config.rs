//! Connection parameters supplied by the host and the optional on-disk
//! connection profile used when a message carries no connection block.

use std::fs;
use std::path::PathBuf;

use log::{debug, warn};
use serde::de::Deserializer;
use serde::Deserialize;
use serde_json::Value;

use crate::secrets::{deserialize_secret, SecretString};

const PROFILE_FILE_NAME: &str = "connection.json";

fn default_ssl_verify() -> bool {
    true
}

/// Raw connection block as sent by the host runtime.
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ConnectionParams {
    #[serde(deserialize_with = "deserialize_secret")]
    pub client_id: Option<SecretString>,
    #[serde(deserialize_with = "deserialize_secret")]
    pub client_secret: Option<SecretString>,
    pub authorization_server: Option<String>,
    pub resource_server: Option<String>,
    pub tenant: Option<String>,
    #[serde(default = "default_ssl_verify")]
    pub ssl_verify: bool,
    #[serde(deserialize_with = "deserialize_optional_id")]
    pub default_ticket_type_id: Option<i64>,
    #[serde(deserialize_with = "deserialize_optional_id")]
    pub default_priority_id: Option<i64>,
    #[serde(deserialize_with = "deserialize_optional_id")]
    pub default_team_id: Option<i64>,
    #[serde(deserialize_with = "deserialize_optional_id")]
    pub default_agent_id: Option<i64>,
    #[serde(deserialize_with = "deserialize_optional_id")]
    pub default_category_id: Option<i64>,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            authorization_server: None,
            resource_server: None,
            tenant: None,
            ssl_verify: default_ssl_verify(),
            default_ticket_type_id: None,
            default_priority_id: None,
            default_team_id: None,
            default_agent_id: None,
            default_category_id: None,
        }
    }
}

impl ConnectionParams {
    pub fn defaults(&self) -> TicketDefaults {
        TicketDefaults {
            ticket_type_id: self.default_ticket_type_id,
            priority_id: self.default_priority_id,
            team_id: self.default_team_id,
            agent_id: self.default_agent_id,
            category_id: self.default_category_id,
        }
    }
}

/// Connection-level fallbacks applied by `create_ticket` when an input is absent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TicketDefaults {
    pub ticket_type_id: Option<i64>,
    pub priority_id: Option<i64>,
    pub team_id: Option<i64>,
    pub agent_id: Option<i64>,
    pub category_id: Option<i64>,
}

/// Accepts integers or numeric strings; zero, blanks and other shapes mean "no default".
fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|val| match val {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse::<i64>().ok(),
            _ => None,
        })
        .filter(|id| *id > 0))
}

/// Loads the connection profile from the platform-specific config directory.
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Binds to `<config dir>/connection.json`; `None` when the platform has no
    /// home directory to derive it from.
    pub fn new() -> Option<Self> {
        let dirs = directories::ProjectDirs::from("com", "haloitsm", "haloitsm-plugin")?;
        Some(Self {
            path: dirs.config_dir().join(PROFILE_FILE_NAME),
        })
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the profile, returning `None` when it is missing or unreadable.
    pub fn load(&self) -> Option<ConnectionParams> {
        if !self.path.exists() {
            debug!("No connection profile at {}", self.path.display());
            return None;
        }
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) => {
                warn!("Failed to read connection profile {}: {}", self.path.display(), err);
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(params) => Some(params),
            Err(err) => {
                warn!("Ignoring malformed connection profile {}: {}", self.path.display(), err);
                None
            }
        }
    }
}
