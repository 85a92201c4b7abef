use log::info;
use serde_json::{Map, Value};

use super::{event_id, normalized, output, ticket_id_field, TriggerEvent};
use crate::error::PluginResult;
use crate::input::ActionInput;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketStatusChangedFilter {
    pub ticket_id: Option<i64>,
    pub new_status_id: Option<i64>,
}

impl TicketStatusChangedFilter {
    pub fn from_input(input: &ActionInput<'_>) -> PluginResult<Self> {
        Ok(Self {
            ticket_id: input.optional_id("ticket_id")?,
            new_status_id: input.optional_id("new_status_id")?,
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

        let new_status_id = ticket_id_field(ticket, "status_id", "status_id");
        if self.new_status_id.is_some() && new_status_id != self.new_status_id {
            return None;
        }

        let old_status_id = event_id(event.get("old_status_id"))
            .or_else(|| event_id(event.get("previous_status_id")));
        if old_status_id.is_some() && old_status_id == new_status_id {
            return None;
        }

        info!(
            "TicketStatusChanged: ticket {:?} status changed from {:?} to {:?}",
            id, old_status_id, new_status_id
        );
        let mut result = output(normalized(ticket, portal_url));
        result.insert("old_status_id".into(), Value::from(old_status_id.unwrap_or(0)));
        result.insert("new_status_id".into(), Value::from(new_status_id.unwrap_or(0)));
        Some(result)
    }
}
