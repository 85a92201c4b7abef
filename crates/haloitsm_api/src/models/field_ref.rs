//! Relation fields embedded in HaloITSM ticket payloads.

use serde_json::Value;

/// A ticket relation (status, agent, team, ...) as it appears on the wire.
///
/// HaloITSM sends either an object carrying `name` or a bare string; anything
/// else is treated as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRef<'a> {
    Named(Option<&'a str>),
    Text(&'a str),
    Missing,
}

impl<'a> FieldRef<'a> {
    pub fn from_value(value: Option<&'a Value>) -> Self {
        match value {
            Some(Value::Object(map)) => FieldRef::Named(map.get("name").and_then(Value::as_str)),
            Some(Value::String(text)) => FieldRef::Text(text),
            _ => FieldRef::Missing,
        }
    }

    /// Flat display string, empty when the relation has no usable name.
    pub fn display(&self) -> &'a str {
        match self {
            FieldRef::Named(Some(name)) => name,
            FieldRef::Text(text) => text,
            FieldRef::Named(None) | FieldRef::Missing => "",
        }
    }
}
