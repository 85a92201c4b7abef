//! Typed accessors over the loosely-typed `input` object of a host message.

use serde_json::{Map, Value};

use crate::error::{PluginError, PluginResult};

pub struct ActionInput<'a> {
    params: &'a Map<String, Value>,
}

impl<'a> ActionInput<'a> {
    pub fn new(params: &'a Map<String, Value>) -> Self {
        Self { params }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.params.get(key).filter(|value| !value.is_null())
    }

    /// A positive JSON integer. Absent or zero is "missing", anything else
    /// that is not a positive integer is "invalid".
    pub fn required_id(&self, key: &str, label: &str) -> PluginResult<i64> {
        match self.optional_id_inner(key, label)? {
            Some(id) => Ok(id),
            None => Err(PluginError::validation(
                format!("Missing {label}"),
                format!("Please provide a valid {label}"),
            )),
        }
    }

    /// Like [`required_id`](Self::required_id) but absent or zero yields `None`.
    pub fn optional_id(&self, key: &str) -> PluginResult<Option<i64>> {
        self.optional_id_inner(key, key)
    }

    fn optional_id_inner(&self, key: &str, label: &str) -> PluginResult<Option<i64>> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        match value.as_i64() {
            Some(0) => Ok(None),
            Some(id) if id > 0 => Ok(Some(id)),
            _ => Err(PluginError::validation(
                format!("Invalid {label}"),
                format!("{label} must be a positive integer"),
            )),
        }
    }

    pub fn optional_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Non-blank string; blanks are treated like absent values.
    pub fn required_string(&self, key: &str, label: &str) -> PluginResult<String> {
        self.optional_string(key)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                PluginError::validation(
                    format!("Missing {label}"),
                    format!("Please provide {label}"),
                )
            })
    }

    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Positive integer with a fallback when absent.
    pub fn count(&self, key: &str, default: u32) -> PluginResult<u32> {
        let Some(value) = self.get(key) else {
            return Ok(default);
        };
        value
            .as_u64()
            .filter(|count| *count > 0)
            .and_then(|count| u32::try_from(count).ok())
            .ok_or_else(|| {
                PluginError::validation(
                    format!("Invalid {key}"),
                    format!("{key} must be a positive integer"),
                )
            })
    }

    /// Non-empty JSON array.
    pub fn list(&self, key: &str) -> Option<Vec<Value>> {
        match self.get(key)? {
            Value::Array(items) if !items.is_empty() => Some(items.clone()),
            _ => None,
        }
    }
}
