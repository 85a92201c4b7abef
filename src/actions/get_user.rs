use log::info;
use serde_json::{json, Value};

use super::single_entity;
use crate::connection::Connection;
use crate::error::{with_context, ErrorKind, PluginError, PluginResult};
use crate::input::ActionInput;

pub async fn run(connection: &Connection, input: &ActionInput<'_>) -> PluginResult<Value> {
    let user_id = input.required_id("user_id", "user ID")?;
    let client = connection.ensure_client()?;

    info!("Retrieving user {}", user_id);
    let context = format!("Failed to get user {user_id}");
    let response = with_context(&context, client.get_user(user_id)).await?;
    let user = single_entity(
        response,
        PluginError::new(
            ErrorKind::Upstream,
            format!("User {user_id} not found"),
            "Verify the user ID exists in HaloITSM",
        ),
    )?;

    Ok(json!({"user": user, "success": true}))
}
