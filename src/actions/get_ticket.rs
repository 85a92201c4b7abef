use log::info;
use serde_json::Value;

use super::ticket_output;
use crate::connection::Connection;
use crate::error::{with_context, ErrorKind, PluginError, PluginResult};
use crate::input::ActionInput;
use crate::normalize::normalize_ticket;

const CONTEXT: &str = "Failed to retrieve ticket";

pub async fn run(connection: &Connection, input: &ActionInput<'_>) -> PluginResult<Value> {
    let ticket_id = input.required_id("ticket_id", "ticket ID")?;
    let client = connection.ensure_client()?;

    info!("Fetching ticket {}", ticket_id);
    let ticket = with_context(CONTEXT, client.get_ticket(ticket_id)).await?;
    if !ticket.as_object().is_some_and(|map| !map.is_empty()) {
        return Err(PluginError::new(
            ErrorKind::Upstream,
            format!("Ticket {ticket_id} not found"),
            "Please verify the ticket ID exists in HaloITSM",
        ));
    }

    Ok(ticket_output(normalize_ticket(&ticket, &connection.portal_url())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{connection, forbid_all, input, mock_token};
    use serde_json::json;

    #[tokio::test]
    async fn ticket_is_fetched_and_normalized() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server, 1).await;
        let get = server
            .mock("GET", "/api/tickets/12345")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id":12345,"summary":"VPN","status":{"name":"New"},"status_id":1,"team":null}"#,
            )
            .create_async()
            .await;

        let conn = connection(&server, json!({}));
        let params = input(json!({"ticket_id": 12345}));
        let output = run(&conn, &ActionInput::new(&params)).await.unwrap();

        assert_eq!(output["ticket"]["status"], "New");
        assert_eq!(output["ticket"]["team"], "");
        assert_eq!(output["success"], true);
        get.assert_async().await;
    }

    #[tokio::test]
    async fn non_positive_ids_are_rejected() {
        let mut server = mockito::Server::new_async().await;
        let token = mock_token(&mut server, 0).await;
        let tickets = forbid_all(&mut server, "GET", "/api/tickets/-4").await;
        let conn = connection(&server, json!({}));

        for bad in [json!(-4), json!("12"), json!(3.5)] {
            let params = input(json!({"ticket_id": bad}));
            let err = run(&conn, &ActionInput::new(&params)).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation);
            assert_eq!(err.cause, "Invalid ticket ID");
        }
        let params = input(json!({}));
        let err = run(&conn, &ActionInput::new(&params)).await.unwrap_err();
        assert_eq!(err.cause, "Missing ticket ID");

        token.assert_async().await;
        tickets.assert_async().await;
    }

    #[tokio::test]
    async fn empty_body_means_not_found() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server, 1).await;
        server
            .mock("GET", "/api/tickets/9")
            .with_status(200)
            .create_async()
            .await;

        let conn = connection(&server, json!({}));
        let params = input(json!({"ticket_id": 9}));
        let err = run(&conn, &ActionInput::new(&params)).await.unwrap_err();

        assert_eq!(err.cause, "Ticket 9 not found");
    }
}
