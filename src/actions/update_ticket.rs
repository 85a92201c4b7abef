use haloitsm_api::models::ACTION_CODE_UPDATE;
use haloitsm_api::TicketUpdate;
use log::info;
use serde_json::Value;

use super::ticket_output;
use crate::connection::Connection;
use crate::error::{with_context, PluginResult};
use crate::input::ActionInput;
use crate::normalize::normalize_ticket;

const CONTEXT: &str = "Failed to update ticket";

/// Only fields present in the input are sent.
pub fn build_payload(input: &ActionInput<'_>) -> PluginResult<TicketUpdate> {
    let mut update = TicketUpdate::new(input.required_id("ticket_id", "ticket ID")?);
    update.actioncode = Some(ACTION_CODE_UPDATE);
    update.summary = input.optional_string("summary");
    update.details = input.optional_string("details");
    update.status_id = input.optional_id("status_id")?;
    update.priority_id = input.optional_id("priority_id")?;
    update.agent_id = input.optional_id("agent_id")?;
    update.team_id = input.optional_id("team_id")?;
    update.customfields = input.list("customfields");
    Ok(update)
}

pub async fn run(connection: &Connection, input: &ActionInput<'_>) -> PluginResult<Value> {
    let update = build_payload(input)?;
    let client = connection.ensure_client()?;

    info!("Updating ticket {}", update.id);
    let updated = with_context(CONTEXT, client.update_ticket(&update)).await?;
    info!("Ticket {} updated successfully", update.id);

    Ok(ticket_output(normalize_ticket(&updated, &connection.portal_url())))
}
