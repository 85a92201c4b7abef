use haloitsm_api::models::{NOTE_TYPE_STANDARD, WHO_CAN_VIEW_PUBLIC};
use haloitsm_api::NoteCreate;
use log::info;
use serde_json::Value;

use super::{read_back, require_result, ticket_output};
use crate::connection::Connection;
use crate::error::{with_context, PluginResult};
use crate::input::ActionInput;

pub fn build_payload(input: &ActionInput<'_>) -> PluginResult<NoteCreate> {
    let ticket_id = input.required_id("ticket_id", "ticket ID")?;
    let note_html = input.required_string("note_html", "note_html")?;

    let mut note = NoteCreate::new(ticket_id, note_html);
    note.outcome = input.optional_string("outcome").unwrap_or_default();
    note.who_can_view_id = input
        .optional_id("who_can_view_id")?
        .unwrap_or(WHO_CAN_VIEW_PUBLIC);
    note.note_type_id = input
        .optional_id("note_type_id")?
        .unwrap_or(NOTE_TYPE_STANDARD);
    Ok(note)
}

pub async fn run(connection: &Connection, input: &ActionInput<'_>) -> PluginResult<Value> {
    let note = build_payload(input)?;
    let ticket_id = note.ticket_id;
    let client = connection.ensure_client()?;

    let context = format!("Failed to add comment to ticket {ticket_id}");
    let result = with_context(&context, client.add_note(&note)).await?;
    require_result(&result, context, "comment creation")?;
    info!("Comment added to ticket {}", ticket_id);

    let ticket = read_back(connection, client, ticket_id, "Comment added successfully", &[]).await;
    Ok(ticket_output(ticket))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_support::{connection, forbid_all, input, mock_token};
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn failed_read_back_still_reports_success() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server, 1).await;
        let note = server
            .mock("POST", "/api/ticketnotes")
            .match_body(Matcher::Json(json!([{
                "ticket_id": 555,
                "note_html": "<p>Investigating</p>",
                "outcome": "",
                "who_can_view_id": 1,
                "note_type_id": 1
            }])))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":9001,"ticket_id":555}]"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/tickets/555")
            .with_status(503)
            .create_async()
            .await;

        let conn = connection(&server, json!({}));
        let params = input(json!({"ticket_id": 555, "note_html": "<p>Investigating</p>"}));
        let output = run(&conn, &ActionInput::new(&params)).await.unwrap();

        assert_eq!(output["success"], true);
        assert_eq!(output["ticket"]["id"], 555);
        assert_eq!(output["ticket"]["summary"], "Comment added successfully");
        note.assert_async().await;
    }

    #[tokio::test]
    async fn blank_note_is_rejected_before_network() {
        let mut server = mockito::Server::new_async().await;
        let token = mock_token(&mut server, 0).await;
        let notes = forbid_all(&mut server, "POST", "/api/ticketnotes").await;

        let conn = connection(&server, json!({}));
        let params = input(json!({"ticket_id": 555, "note_html": "  "}));
        let err = run(&conn, &ActionInput::new(&params)).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.cause, "Missing note_html");
        token.assert_async().await;
        notes.assert_async().await;
    }

    #[test]
    fn private_notes_keep_explicit_visibility() {
        let params = input(json!({
            "ticket_id": 1,
            "note_html": "internal",
            "outcome": "Escalated",
            "who_can_view_id": 3,
            "note_type_id": 2
        }));
        let note = build_payload(&ActionInput::new(&params)).unwrap();

        assert_eq!(note.outcome, "Escalated");
        assert_eq!(note.who_can_view_id, 3);
        assert_eq!(note.note_type_id, 2);
    }
}
