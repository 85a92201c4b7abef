use haloitsm_api::TicketCreate;
use log::info;
use serde_json::Value;

use super::ticket_output;
use crate::connection::Connection;
use crate::error::{with_context, PluginError, PluginResult};
use crate::input::ActionInput;
use crate::normalize::normalize_ticket;

const CONTEXT: &str = "Failed to create ticket";

/// Builds the create payload. Connection defaults only fill fields the
/// caller left out.
pub fn build_payload(connection: &Connection, input: &ActionInput<'_>) -> PluginResult<TicketCreate> {
    let defaults = connection.defaults();
    let summary = input.required_string("summary", "summary")?;
    let details = input.required_string("details", "details")?;
    let tickettype_id = input
        .optional_id("tickettype_id")?
        .or(defaults.ticket_type_id)
        .ok_or_else(|| {
            PluginError::validation(
                "Missing ticket type ID",
                "Please provide tickettype_id in action parameters or set default_ticket_type_id in connection configuration",
            )
        })?;

    let mut ticket = TicketCreate::new(summary, details, tickettype_id);
    ticket.priority_id = input.optional_id("priority_id")?.or(defaults.priority_id);
    ticket.status_id = input.optional_id("status_id")?;
    ticket.category_id = input.optional_id("category_id")?.or(defaults.category_id);
    ticket.agent_id = input.optional_id("agent_id")?.or(defaults.agent_id);
    ticket.team_id = input.optional_id("team_id")?.or(defaults.team_id);
    ticket.site_id = input.optional_id("site_id")?;
    ticket.user_id = input.optional_id("user_id")?;
    ticket.customfields = input.list("customfields");
    Ok(ticket)
}

pub async fn run(connection: &Connection, input: &ActionInput<'_>) -> PluginResult<Value> {
    let ticket = build_payload(connection, input)?;
    let client = connection.ensure_client()?;

    let created = with_context(CONTEXT, client.create_ticket(&ticket)).await?;
    info!(
        "Ticket created successfully with ID {}",
        created.get("id").cloned().unwrap_or(Value::Null)
    );

    Ok(ticket_output(normalize_ticket(&created, &connection.portal_url())))
}
