use haloitsm_api::TicketUpdate;
use log::info;
use serde_json::Value;

use super::{read_back, require_result, ticket_output};
use crate::connection::Connection;
use crate::error::{with_context, PluginError, PluginResult};
use crate::input::ActionInput;

pub fn build_payload(input: &ActionInput<'_>) -> PluginResult<TicketUpdate> {
    let mut update = TicketUpdate::new(input.required_id("ticket_id", "ticket ID")?);
    update.agent_id = input.optional_id("agent_id")?;
    update.team_id = input.optional_id("team_id")?;
    if update.agent_id.is_none() && update.team_id.is_none() {
        return Err(PluginError::validation(
            "Missing assignment target",
            "Please provide either agent_id or team_id for assignment",
        ));
    }
    Ok(update)
}

fn describe_target(update: &TicketUpdate) -> String {
    let mut targets = Vec::new();
    if let Some(agent) = update.agent_id {
        targets.push(format!("agent {agent}"));
    }
    if let Some(team) = update.team_id {
        targets.push(format!("team {team}"));
    }
    targets.join(", ")
}

pub async fn run(connection: &Connection, input: &ActionInput<'_>) -> PluginResult<Value> {
    let update = build_payload(input)?;
    let ticket_id = update.id;
    let client = connection.ensure_client()?;

    let context = format!("Failed to assign ticket {ticket_id}");
    let result = with_context(&context, client.update_ticket(&update)).await?;
    require_result(&result, context, "ticket assignment")?;

    let ticket = read_back(connection, client, ticket_id, "Ticket assigned successfully", &[]).await;
    info!(
        "Successfully assigned ticket {} to {}",
        ticket_id,
        describe_target(&update)
    );

    Ok(ticket_output(ticket))
}
