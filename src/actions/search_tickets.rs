use haloitsm_api::models::{DEFAULT_SEARCH_COUNT, DEFAULT_SEARCH_PAGE};
use haloitsm_api::TicketSearch;
use log::info;
use serde_json::{json, Value};

use crate::connection::Connection;
use crate::error::{with_context, PluginResult};
use crate::input::ActionInput;
use crate::normalize::normalize_ticket;

const CONTEXT: &str = "Failed to search tickets";

pub fn build_query(input: &ActionInput<'_>) -> PluginResult<TicketSearch> {
    let mut search = TicketSearch {
        count: input.count("count", DEFAULT_SEARCH_COUNT)?,
        page_no: input.count("page_no", DEFAULT_SEARCH_PAGE)?,
        search: None,
    };
    if let Some(text) = input.optional_string("search") {
        search = search.with_search(&text);
    }
    Ok(search)
}

pub async fn run(connection: &Connection, input: &ActionInput<'_>) -> PluginResult<Value> {
    let query = build_query(input)?;
    let client = connection.ensure_client()?;

    let found = with_context(CONTEXT, client.search_tickets(&query)).await?;
    let portal = connection.portal_url();
    let tickets: Vec<Value> = found
        .iter()
        .map(|raw| Value::Object(normalize_ticket(raw, &portal)))
        .collect();
    info!("Found {} tickets matching search criteria", tickets.len());

    Ok(json!({
        "count": tickets.len(),
        "tickets": tickets,
        "success": true,
    }))
}
