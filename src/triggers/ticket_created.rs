use log::info;
use serde_json::{Map, Value};

use super::{normalized, output, ticket_id_field, TriggerEvent};
use crate::error::PluginResult;
use crate::input::ActionInput;

/// Optional ticket type and priority filters for new tickets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketCreatedFilter {
    pub tickettype_id: Option<i64>,
    pub priority_id: Option<i64>,
}

impl TicketCreatedFilter {
    pub fn from_input(input: &ActionInput<'_>) -> PluginResult<Self> {
        Ok(Self {
            tickettype_id: input.optional_id("tickettype_id")?,
            priority_id: input.optional_id("priority_id")?,
        })
    }

    pub fn matches(&self, ticket: &Map<String, Value>) -> bool {
        if let Some(wanted) = self.tickettype_id {
            if ticket_id_field(ticket, "tickettype_id", "ticket_type_id") != Some(wanted) {
                return false;
            }
        }
        if let Some(wanted) = self.priority_id {
            if ticket_id_field(ticket, "priority_id", "priority_id") != Some(wanted) {
                return false;
            }
        }
        true
    }

    pub(super) fn evaluate(
        &self,
        ticket: &Map<String, Value>,
        _event: &Map<String, Value>,
        portal_url: &str,
    ) -> Option<TriggerEvent> {
        if !self.matches(ticket) {
            return None;
        }
        info!(
            "TicketCreated: processing new ticket {}",
            ticket.get("id").cloned().unwrap_or(Value::Null)
        );
        Some(output(normalized(ticket, portal_url)))
    }
}
