//! Action handlers. Each one validates its input before any network call,
//! performs a single HaloITSM operation and returns a JSON output object.

use std::fmt;
use std::str::FromStr;

use haloitsm_api::HaloClient;
use log::warn;
use serde_json::{Map, Value};

use crate::connection::Connection;
use crate::error::{ErrorKind, PluginError, PluginResult};
use crate::input::ActionInput;
use crate::normalize::{minimal_ticket, normalize_ticket, Ticket};
use crate::secrets::redact_log_details;

pub mod add_comment;
pub mod assign_ticket;
pub mod close_ticket;
pub mod create_ticket;
pub mod get_agent;
pub mod get_ticket;
pub mod get_user;
pub mod search_tickets;
pub mod update_ticket;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    CreateTicket,
    UpdateTicket,
    GetTicket,
    SearchTickets,
    CloseTicket,
    AssignTicket,
    AddComment,
    GetAgent,
    GetUser,
}

impl ActionKind {
    pub const ALL: [ActionKind; 9] = [
        ActionKind::CreateTicket,
        ActionKind::UpdateTicket,
        ActionKind::GetTicket,
        ActionKind::SearchTickets,
        ActionKind::CloseTicket,
        ActionKind::AssignTicket,
        ActionKind::AddComment,
        ActionKind::GetAgent,
        ActionKind::GetUser,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::CreateTicket => "create_ticket",
            ActionKind::UpdateTicket => "update_ticket",
            ActionKind::GetTicket => "get_ticket",
            ActionKind::SearchTickets => "search_tickets",
            ActionKind::CloseTicket => "close_ticket",
            ActionKind::AssignTicket => "assign_ticket",
            ActionKind::AddComment => "add_comment",
            ActionKind::GetAgent => "get_agent",
            ActionKind::GetUser => "get_user",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ActionKind::CreateTicket => "Create a new ticket in HaloITSM",
            ActionKind::UpdateTicket => "Update an existing ticket in HaloITSM",
            ActionKind::GetTicket => "Get a specific ticket by ID",
            ActionKind::SearchTickets => "Search for tickets in HaloITSM",
            ActionKind::CloseTicket => "Close a HaloITSM ticket with resolution details",
            ActionKind::AssignTicket => "Assign a HaloITSM ticket to an agent or team",
            ActionKind::AddComment => "Add a comment/note to a HaloITSM ticket",
            ActionKind::GetAgent => "Get agent information by ID",
            ActionKind::GetUser => "Get user information by ID",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActionKind {
    type Err = PluginError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.name() == value)
            .ok_or_else(|| {
                let known: Vec<String> = ActionKind::ALL
                    .iter()
                    .map(|kind| format!("{} ({})", kind.name(), kind.description()))
                    .collect();
                PluginError::validation(
                    format!("Unknown action: {value}"),
                    format!("Supported actions: {}", known.join("; ")),
                )
            })
    }
}

pub async fn run_action(
    kind: ActionKind,
    connection: &Connection,
    params: &Map<String, Value>,
) -> PluginResult<Value> {
    let input = ActionInput::new(params);
    match kind {
        ActionKind::CreateTicket => create_ticket::run(connection, &input).await,
        ActionKind::UpdateTicket => update_ticket::run(connection, &input).await,
        ActionKind::GetTicket => get_ticket::run(connection, &input).await,
        ActionKind::SearchTickets => search_tickets::run(connection, &input).await,
        ActionKind::CloseTicket => close_ticket::run(connection, &input).await,
        ActionKind::AssignTicket => assign_ticket::run(connection, &input).await,
        ActionKind::AddComment => add_comment::run(connection, &input).await,
        ActionKind::GetAgent => get_agent::run(connection, &input).await,
        ActionKind::GetUser => get_user::run(connection, &input).await,
    }
}

/// `{"ticket": ..., "success": true}`.
fn ticket_output(ticket: Ticket) -> Value {
    let mut output = Map::new();
    output.insert("ticket".into(), Value::Object(ticket));
    output.insert("success".into(), Value::Bool(true));
    Value::Object(output)
}

/// Fetches the current state of a ticket after a successful change. A failed
/// read does not undo the change, so it degrades to a minimal ticket.
async fn read_back(
    connection: &Connection,
    client: &HaloClient,
    ticket_id: i64,
    fallback_summary: &str,
    extra: &[(&str, Value)],
) -> Ticket {
    match client.get_ticket(ticket_id).await {
        Ok(raw) if raw.as_object().is_some_and(|map| !map.is_empty()) => {
            normalize_ticket(&raw, &connection.portal_url())
        }
        Ok(_) => {
            warn!("Ticket {} read back empty, returning minimal ticket", ticket_id);
            minimal_ticket(ticket_id, fallback_summary, extra)
        }
        Err(err) => {
            warn!(
                "Could not fetch ticket {} after update: {}",
                ticket_id,
                redact_log_details(&err.to_string())
            );
            minimal_ticket(ticket_id, fallback_summary, extra)
        }
    }
}

/// Mutations answered with an empty body are treated as failures.
fn require_result(value: &Value, cause: String, operation: &str) -> PluginResult<()> {
    let empty = match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(text) => text.is_empty(),
        _ => false,
    };
    if empty {
        return Err(PluginError::new(
            ErrorKind::Upstream,
            cause,
            format!("The {operation} operation returned no result"),
        ));
    }
    Ok(())
}

/// Unwraps a lookup response: arrays yield their first element, and empty
/// responses become a not-found error.
fn single_entity(response: Value, not_found: PluginError) -> PluginResult<Value> {
    let entity = match response {
        Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
        other => other,
    };
    let empty = match &entity {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::String(text) => text.is_empty(),
        _ => false,
    };
    if empty {
        return Err(not_found);
    }
    Ok(entity)
}
