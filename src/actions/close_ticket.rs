use haloitsm_api::TicketUpdate;
use log::info;
use serde_json::Value;

use super::{read_back, require_result, ticket_output};
use crate::connection::Connection;
use crate::error::{with_context, PluginResult};
use crate::input::ActionInput;

/// HaloITSM's stock "Resolved" status.
pub const DEFAULT_CLOSED_STATUS_ID: i64 = 4;

pub fn build_payload(input: &ActionInput<'_>) -> PluginResult<TicketUpdate> {
    let mut update = TicketUpdate::new(input.required_id("ticket_id", "ticket ID")?);
    update.status_id = Some(
        input
            .optional_id("status_id")?
            .unwrap_or(DEFAULT_CLOSED_STATUS_ID),
    );
    if let Some(resolution) = input
        .optional_string("resolution")
        .filter(|text| !text.trim().is_empty())
    {
        update.details = Some(format!("Ticket closed with resolution: {resolution}"));
        update.resolution = Some(resolution);
    }
    Ok(update)
}

pub async fn run(connection: &Connection, input: &ActionInput<'_>) -> PluginResult<Value> {
    let update = build_payload(input)?;
    let ticket_id = update.id;
    let status_id = update.status_id.unwrap_or(DEFAULT_CLOSED_STATUS_ID);
    let client = connection.ensure_client()?;

    info!("Closing ticket {} with status {}", ticket_id, status_id);
    let context = format!("Failed to close ticket {ticket_id}");
    let result = with_context(&context, client.update_ticket(&update)).await?;
    require_result(&result, context, "ticket update")?;

    let ticket = read_back(
        connection,
        client,
        ticket_id,
        "Ticket closed successfully",
        &[("status_id", Value::from(status_id))],
    )
    .await;
    info!("Successfully closed ticket {}", ticket_id);

    Ok(ticket_output(ticket))
}
