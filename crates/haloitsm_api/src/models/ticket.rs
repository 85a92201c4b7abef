//! Ticket request payloads for the HaloITSM `/tickets` endpoint.

use serde::Serialize;
use serde_json::Value;

pub const ACTION_CODE_NEW: i32 = 0;
pub const ACTION_CODE_UPDATE: i32 = 1;

pub const DEFAULT_SEARCH_COUNT: u32 = 50;
pub const DEFAULT_SEARCH_PAGE: u32 = 1;

/// Request body for creating a ticket (POST, wrapped in a one-element array).
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TicketCreate {
    pub summary: String,
    pub details: String,
    pub actioncode: i32,
    pub tickettype_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customfields: Option<Vec<Value>>,
}

impl TicketCreate {
    pub fn new(summary: impl Into<String>, details: impl Into<String>, tickettype_id: i64) -> Self {
        Self {
            summary: summary.into(),
            details: details.into(),
            actioncode: ACTION_CODE_NEW,
            tickettype_id,
            priority_id: None,
            status_id: None,
            category_id: None,
            agent_id: None,
            team_id: None,
            site_id: None,
            user_id: None,
            customfields: None,
        }
    }
}

/// Partial update body; only populated fields are sent.
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct TicketUpdate {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actioncode: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customfields: Option<Vec<Value>>,
}

impl TicketUpdate {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

/// Query parameters for `GET /tickets`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketSearch {
    pub count: u32,
    pub page_no: u32,
    pub search: Option<String>,
}

impl Default for TicketSearch {
    fn default() -> Self {
        Self {
            count: DEFAULT_SEARCH_COUNT,
            page_no: DEFAULT_SEARCH_PAGE,
            search: None,
        }
    }
}

impl TicketSearch {
    /// Sets the free-text filter; blank text leaves it unset.
    pub fn with_search(mut self, search: &str) -> Self {
        let trimmed = search.trim();
        self.search = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("count", self.count.to_string()),
            ("page_no", self.page_no.to_string()),
        ];
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_serializes_only_populated_fields() {
        let mut update = TicketUpdate::new(12345);
        update.status_id = Some(4);
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"id": 12345, "status_id": 4})
        );
    }

    #[test]
    fn create_always_carries_action_code_and_type() {
        let create = TicketCreate::new("Disk full", "Server 12 is out of space", 3);
        assert_eq!(
            serde_json::to_value(&create).unwrap(),
            json!({
                "summary": "Disk full",
                "details": "Server 12 is out of space",
                "actioncode": 0,
                "tickettype_id": 3
            })
        );
    }

    #[test]
    fn default_search_has_no_search_term() {
        let query = TicketSearch::default().with_search("   ").to_query();
        assert_eq!(
            query,
            vec![("count", "50".to_string()), ("page_no", "1".to_string())]
        );
    }
}
