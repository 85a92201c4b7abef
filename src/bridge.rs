//! Message envelopes exchanged with the host runtime and the dispatcher
//! that routes a message to the connection test, an action or a trigger.
//!
//! Input is a stream of JSON values: the first one is the message, any
//! following values are events for a trigger. Every output value is written
//! as one JSON envelope per line.

use std::io::{self, Write};

use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::actions::{run_action, ActionKind};
use crate::config::ConnectionParams;
use crate::connection::Connection;
use crate::error::{PluginError, PluginResult};
use crate::secrets::redact_log_details;
use crate::triggers::{self, EventSink, Trigger, TriggerEvent, TriggerKind};

#[derive(Deserialize, Debug)]
pub struct HostMessage {
    pub body: MessageBody,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct MessageBody {
    pub action: Option<String>,
    pub trigger: Option<String>,
    pub test: bool,
    pub connection: Option<Value>,
    pub input: Map<String, Value>,
}

/// What a message asks the plugin to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Test,
    Action(ActionKind),
    Trigger(TriggerKind),
}

impl MessageBody {
    pub fn request(&self) -> PluginResult<Request> {
        if self.test {
            return Ok(Request::Test);
        }
        match (&self.action, &self.trigger) {
            (Some(action), _) => Ok(Request::Action(action.parse()?)),
            (None, Some(trigger)) => Ok(Request::Trigger(trigger.parse()?)),
            (None, None) => Err(PluginError::validation(
                "Message names no action or trigger",
                "Set body.action, body.trigger or body.test",
            )),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct HostResponse {
    pub body: ResponseBody,
}

#[derive(Serialize, Debug)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ResponseBody {
    Ok { output: Value },
    Error { error: PluginError },
}

impl HostResponse {
    pub fn ok(output: Value) -> Self {
        Self {
            body: ResponseBody::Ok { output },
        }
    }

    pub fn error(error: PluginError) -> Self {
        Self {
            body: ResponseBody::Error { error },
        }
    }

    pub fn write_line<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        serde_json::to_writer(&mut *out, self)?;
        out.write_all(b"\n")?;
        out.flush()
    }
}

/// Writes each trigger event as an `ok` envelope line.
pub struct WriterSink<'a, W: Write + ?Sized> {
    out: &'a mut W,
}

impl<'a, W: Write + ?Sized> WriterSink<'a, W> {
    pub fn new(out: &'a mut W) -> Self {
        Self { out }
    }
}

impl<W: Write + ?Sized> EventSink for WriterSink<'_, W> {
    fn send(&mut self, event: TriggerEvent) -> PluginResult<()> {
        HostResponse::ok(Value::Object(event))
            .write_line(&mut *self.out)
            .map_err(|err| PluginError::unexpected("Failed to write trigger event", err.to_string()))
    }
}

/// Splits raw input into the message and any trailing trigger events.
fn parse_input(raw: &str) -> PluginResult<(HostMessage, Vec<Value>)> {
    let mut values = serde_json::Deserializer::from_str(raw).into_iter::<Value>();
    let first = match values.next() {
        Some(Ok(value)) => value,
        Some(Err(err)) => {
            return Err(PluginError::validation("Malformed message", err.to_string()));
        }
        None => {
            return Err(PluginError::validation(
                "Empty message",
                "Send a JSON message with a body on stdin",
            ));
        }
    };
    let message: HostMessage = serde_json::from_value(first)
        .map_err(|err| PluginError::validation("Malformed message", err.to_string()))?;
    let events = values
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| PluginError::validation("Malformed trigger event", err.to_string()))?;
    Ok((message, events))
}

fn resolve_connection<F>(body: &MessageBody, profile: F) -> PluginResult<Connection>
where
    F: FnOnce() -> Option<ConnectionParams>,
{
    match body.connection.as_ref().filter(|value| !value.is_null()) {
        Some(params) => Connection::connect(params),
        None => match profile() {
            Some(params) => {
                info!("Using connection profile from disk");
                Connection::from_params(params)
            }
            None => Err(PluginError::validation(
                "No connection parameters provided",
                "Connection parameters are required",
            )),
        },
    }
}

async fn execute<W, F>(raw: &str, profile: F, out: &mut W) -> PluginResult<Option<Value>>
where
    W: Write + ?Sized,
    F: FnOnce() -> Option<ConnectionParams>,
{
    let (message, events) = parse_input(raw)?;
    let request = message.body.request()?;
    let connection = resolve_connection(&message.body, profile)?;

    match request {
        Request::Test => {
            let result = connection.test().await?;
            Ok(Some(serde_json::to_value(result).map_err(|err| {
                PluginError::unexpected("Connection test failed", err.to_string())
            })?))
        }
        Request::Action(kind) => {
            info!("Running action {}", kind);
            run_action(kind, &connection, &message.body.input)
                .await
                .map(Some)
        }
        Request::Trigger(kind) => {
            let trigger = Trigger::configure(kind, &message.body.input)?;
            let (sender, receiver) = mpsc::channel(events.len().max(1));
            for event in events {
                sender.try_send(event).map_err(|err| {
                    PluginError::unexpected("Failed to queue trigger event", err.to_string())
                })?;
            }
            drop(sender);
            let mut sink = WriterSink::new(out);
            triggers::run(&trigger, &connection.portal_url(), receiver, &mut sink).await?;
            Ok(None)
        }
    }
}

/// Handles one host invocation end to end. Returns whether it succeeded;
/// failures are reported to the host as an error envelope.
pub async fn process<W, F>(raw: &str, profile: F, out: &mut W) -> io::Result<bool>
where
    W: Write + ?Sized,
    F: FnOnce() -> Option<ConnectionParams>,
{
    match execute(raw, profile, out).await {
        Ok(Some(output)) => {
            HostResponse::ok(output).write_line(out)?;
            Ok(true)
        }
        Ok(None) => Ok(true),
        Err(err) => {
            error!("{}", redact_log_details(&err.to_string()));
            HostResponse::error(err).write_line(out)?;
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::mock_token;
    use serde_json::json;

    fn connection_block(server: &str) -> Value {
        json!({
            "client_id": "client-1234",
            "client_secret": {"secretKey": "secret"},
            "authorization_server": format!("{server}/auth"),
            "resource_server": format!("{server}/api"),
            "tenant": "acme"
        })
    }

    fn lines(out: &[u8]) -> Vec<Value> {
        String::from_utf8_lossy(out)
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn error_envelope_shape() {
        let mut out = Vec::new();
        HostResponse::error(PluginError::validation("Missing ticket ID", "Please provide a valid ticket ID"))
            .write_line(&mut out)
            .unwrap();

        assert_eq!(
            lines(&out),
            vec![json!({"body": {
                "status": "error",
                "error": {
                    "kind": "validation",
                    "cause": "Missing ticket ID",
                    "assistance": "Please provide a valid ticket ID"
                }
            }})]
        );
    }

    #[tokio::test]
    async fn action_message_produces_ok_envelope() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server, 1).await;
        server
            .mock("GET", "/api/tickets/12")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":12,"summary":"Mail bounce"}"#)
            .create_async()
            .await;

        let message = json!({"body": {
            "action": "get_ticket",
            "connection": connection_block(&server.url()),
            "input": {"ticket_id": 12}
        }});
        let mut out = Vec::new();
        let ok = process(&message.to_string(), || None, &mut out).await.unwrap();

        assert!(ok);
        let responses = lines(&out);
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["body"]["status"], "ok");
        assert_eq!(responses[0]["body"]["output"]["ticket"]["summary"], "Mail bounce");
    }

    #[tokio::test]
    async fn trigger_events_are_written_one_per_line() {
        let raw = format!(
            "{}\n{}\n{}",
            json!({"body": {
                "trigger": "ticket_status_changed",
                "connection": connection_block("https://halo.example.com"),
                "input": {}
            }}),
            json!({"ticket": {"id": 1, "status_id": 4}, "old_status_id": 2}),
            json!({"ticket": {"id": 2, "status_id": 3}, "old_status_id": 3}),
        );
        let mut out = Vec::new();
        let ok = process(&raw, || None, &mut out).await.unwrap();

        assert!(ok);
        let responses = lines(&out);
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["body"]["output"]["new_status_id"], 4);
        assert_eq!(
            responses[0]["body"]["output"]["ticket"]["url"],
            "https://halo.example.com/tickets/1"
        );
    }

    #[tokio::test]
    async fn missing_connection_falls_back_to_profile() {
        let message = json!({"body": {"action": "get_ticket", "input": {}}});
        let mut out = Vec::new();
        let ok = process(&message.to_string(), || None, &mut out).await.unwrap();

        assert!(!ok);
        assert_eq!(
            lines(&out)[0]["body"]["error"]["cause"],
            "No connection parameters provided"
        );

        let mut out = Vec::new();
        let profile = || {
            serde_json::from_value::<ConnectionParams>(connection_block("https://halo.example.com")).ok()
        };
        let ok = process(&message.to_string(), profile, &mut out).await.unwrap();

        assert!(!ok);
        assert_eq!(lines(&out)[0]["body"]["error"]["cause"], "Missing ticket ID");
    }

    #[tokio::test]
    async fn unknown_action_and_garbage_input_are_reported() {
        let mut out = Vec::new();
        let message = json!({"body": {"action": "delete_ticket", "connection": {}}});
        assert!(!process(&message.to_string(), || None, &mut out).await.unwrap());
        assert_eq!(
            lines(&out)[0]["body"]["error"]["cause"],
            "Unknown action: delete_ticket"
        );

        let mut out = Vec::new();
        assert!(!process("not json", || None, &mut out).await.unwrap());
        assert_eq!(lines(&out)[0]["body"]["error"]["cause"], "Malformed message");
    }
}
