//! Flattens raw HaloITSM ticket payloads into the shape exposed to workflows.

use haloitsm_api::FieldRef;
use serde_json::{Map, Value};

pub type Ticket = Map<String, Value>;

/// Relation fields: output key, raw key, flat key.
const RELATIONS: [(&str, &str, &str); 8] = [
    ("status", "status", "status"),
    ("priority", "priority", "priority"),
    ("ticket_type", "tickettype", "ticket_type"),
    ("agent", "agent", "agent"),
    ("team", "team", "team"),
    ("client", "client", "client"),
    ("site", "site", "site"),
    ("user", "user", "user"),
];

const IDS: [(&str, &str, &str); 8] = [
    ("status_id", "status_id", "status_id"),
    ("priority_id", "priority_id", "priority_id"),
    ("ticket_type_id", "tickettype_id", "ticket_type_id"),
    ("agent_id", "agent_id", "agent_id"),
    ("team_id", "team_id", "team_id"),
    ("client_id", "client_id", "client_id"),
    ("site_id", "site_id", "site_id"),
    ("user_id", "user_id", "user_id"),
];

const TEXTS: [(&str, &str, &str); 9] = [
    ("summary", "summary", "summary"),
    ("details", "details", "details"),
    ("created_date", "dateoccurred", "created_date"),
    ("last_updated", "dateupdated", "last_updated"),
    ("category_1", "category_1", "category_1"),
    ("category_2", "category_2", "category_2"),
    ("category_3", "category_3", "category_3"),
    ("category_4", "category_4", "category_4"),
    ("resolution", "resolution", "resolution"),
];

fn pick<'a>(ticket: &'a Map<String, Value>, raw: &str, flat: &str) -> Option<&'a Value> {
    ticket
        .get(raw)
        .filter(|value| !value.is_null())
        .or_else(|| ticket.get(flat))
}

fn id_segment(id: &Value) -> String {
    match id {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Normalizes a raw (or already normalized) ticket. Never fails: unexpected
/// shapes become empty strings and null identifiers are dropped.
pub fn normalize_ticket(raw: &Value, portal_url: &str) -> Ticket {
    let Some(ticket) = raw.as_object() else {
        return Ticket::new();
    };

    let mut out = Ticket::new();
    let id = ticket.get("id").filter(|value| !value.is_null());
    if let Some(id) = id {
        out.insert("id".into(), id.clone());
    }

    for (key, raw_key, flat_key) in TEXTS {
        let value = match pick(ticket, raw_key, flat_key) {
            Some(Value::Null) | None => Value::String(String::new()),
            Some(other) => other.clone(),
        };
        out.insert(key.into(), value);
    }

    for (key, raw_key, flat_key) in RELATIONS {
        let name = FieldRef::from_value(pick(ticket, raw_key, flat_key)).display();
        out.insert(key.into(), Value::String(name.to_string()));
    }

    for (key, raw_key, flat_key) in IDS {
        if let Some(value) = pick(ticket, raw_key, flat_key).filter(|value| !value.is_null()) {
            out.insert(key.into(), value.clone());
        }
    }

    if let Some(id) = id {
        out.insert(
            "url".into(),
            Value::String(format!("{}/tickets/{}", portal_url, id_segment(id))),
        );
    }

    out
}

/// Fallback entity returned when reading a ticket back after a successful
/// change fails.
pub fn minimal_ticket(id: i64, summary: &str, extra: &[(&str, Value)]) -> Ticket {
    let mut ticket = Ticket::new();
    ticket.insert("id".into(), Value::from(id));
    ticket.insert("summary".into(), Value::String(summary.to_string()));
    for (key, value) in extra {
        ticket.insert((*key).to_string(), value.clone());
    }
    ticket
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PORTAL: &str = "https://halo.example.com";

    fn raw_ticket() -> Value {
        json!({
            "id": 123,
            "summary": "Printer on fire",
            "details": "Third floor",
            "status": {"id": 2, "name": "In Progress"},
            "status_id": 2,
            "priority": {"name": "High"},
            "priority_id": 3,
            "tickettype": {"name": "Incident"},
            "tickettype_id": 1,
            "agent": "Jane Doe",
            "agent_id": 5,
            "team": {"id": 9},
            "team_id": null,
            "client": 42,
            "dateoccurred": "2024-03-01T10:00:00Z",
            "dateupdated": null,
            "category_1": "Hardware"
        })
    }

    #[test]
    fn raw_ticket_is_flattened() {
        let ticket = normalize_ticket(&raw_ticket(), PORTAL);

        assert_eq!(ticket["id"], 123);
        assert_eq!(ticket["status"], "In Progress");
        assert_eq!(ticket["priority"], "High");
        assert_eq!(ticket["ticket_type"], "Incident");
        assert_eq!(ticket["ticket_type_id"], 1);
        assert_eq!(ticket["agent"], "Jane Doe");
        assert_eq!(ticket["created_date"], "2024-03-01T10:00:00Z");
        assert_eq!(ticket["last_updated"], "");
        assert_eq!(ticket["category_1"], "Hardware");
        assert_eq!(ticket["category_2"], "");
        assert_eq!(ticket["url"], "https://halo.example.com/tickets/123");
        assert!(!ticket.contains_key("team_id"));
        assert!(!ticket.contains_key("tickettype"));
    }

    #[test]
    fn malformed_relations_become_empty_strings() {
        let ticket = normalize_ticket(&raw_ticket(), PORTAL);
        assert_eq!(ticket["team"], "");
        assert_eq!(ticket["client"], "");
        assert_eq!(ticket["site"], "");
        assert_eq!(ticket["user"], "");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_ticket(&raw_ticket(), PORTAL);
        let twice = normalize_ticket(&Value::Object(once.clone()), PORTAL);
        assert_eq!(once, twice);
    }

    #[test]
    fn non_objects_normalize_to_empty_map() {
        assert!(normalize_ticket(&Value::Null, PORTAL).is_empty());
        assert!(normalize_ticket(&json!([1, 2]), PORTAL).is_empty());
        assert!(normalize_ticket(&json!("ticket"), PORTAL).is_empty());
    }

    #[test]
    fn ticket_without_id_has_no_url() {
        let ticket = normalize_ticket(&json!({"summary": "orphan"}), PORTAL);
        assert!(!ticket.contains_key("id"));
        assert!(!ticket.contains_key("url"));
        assert_eq!(ticket["summary"], "orphan");
        assert!(ticket.values().all(|value| !value.is_null()));
    }

    #[test]
    fn minimal_ticket_carries_extra_fields() {
        let ticket = minimal_ticket(12345, "Ticket closed successfully", &[("status_id", json!(4))]);
        assert_eq!(
            Value::Object(ticket),
            json!({"id": 12345, "summary": "Ticket closed successfully", "status_id": 4})
        );
    }
}
