use log::info;
use serde_json::{Map, Value};

use super::{event_id, normalized, output, ticket_id_field, TriggerEvent};
use crate::error::PluginResult;
use crate::input::ActionInput;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketUpdatedFilter {
    pub ticket_id: Option<i64>,
    /// Only forward updates whose status differs from `previous_status_id`.
    pub status_changed: bool,
}

impl TicketUpdatedFilter {
    pub fn from_input(input: &ActionInput<'_>) -> PluginResult<Self> {
        Ok(Self {
            ticket_id: input.optional_id("ticket_id")?,
            status_changed: input.flag("status_changed"),
        })
    }

    pub(super) fn evaluate(
        &self,
        ticket: &Map<String, Value>,
        event: &Map<String, Value>,
        portal_url: &str,
    ) -> Option<TriggerEvent> {
        let id = event_id(ticket.get("id"));
        if self.ticket_id.is_some() && id != self.ticket_id {
            return None;
        }

        let previous_status_id = event_id(event.get("previous_status_id"));
        if self.status_changed {
            let current = ticket_id_field(ticket, "status_id", "status_id");
            if previous_status_id == current {
                return None;
            }
        }

        info!("TicketUpdated: ticket {:?} updated", id);
        let mut result = output(normalized(ticket, portal_url));
        if let Some(previous) = previous_status_id {
            result.insert("previous_status_id".into(), Value::from(previous));
        }
        Some(result)
    }
}
