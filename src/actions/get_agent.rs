use log::info;
use serde_json::{json, Value};

use super::single_entity;
use crate::connection::Connection;
use crate::error::{with_context, ErrorKind, PluginError, PluginResult};
use crate::input::ActionInput;

pub async fn run(connection: &Connection, input: &ActionInput<'_>) -> PluginResult<Value> {
    let agent_id = input.required_id("agent_id", "agent ID")?;
    let client = connection.ensure_client()?;

    info!("Retrieving agent {}", agent_id);
    let context = format!("Failed to get agent {agent_id}");
    let response = with_context(&context, client.get_agent(agent_id)).await?;
    let agent = single_entity(
        response,
        PluginError::new(
            ErrorKind::Upstream,
            format!("Agent {agent_id} not found"),
            "Verify the agent ID exists in HaloITSM",
        ),
    )?;

    Ok(json!({"agent": agent, "success": true}))
}
