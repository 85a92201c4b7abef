//! Trigger handlers. The host delivers ticket events; each trigger filters
//! them, normalizes the ticket and forwards the result to an [`EventSink`].
//! Triggers never call the HaloITSM API.

use std::str::FromStr;

use log::{debug, info, warn};
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::error::{PluginError, PluginResult};
use crate::input::ActionInput;
use crate::normalize::{normalize_ticket, Ticket};

pub mod ticket_created;
pub mod ticket_status_changed;
pub mod ticket_updated;

pub use ticket_created::TicketCreatedFilter;
pub use ticket_status_changed::TicketStatusChangedFilter;
pub use ticket_updated::TicketUpdatedFilter;

pub type TriggerEvent = Map<String, Value>;

/// Destination for trigger output.
pub trait EventSink {
    fn send(&mut self, event: TriggerEvent) -> PluginResult<()>;
}

/// Forwards events into an in-process channel.
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<TriggerEvent>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::UnboundedSender<TriggerEvent>) -> Self {
        Self { sender }
    }
}

impl EventSink for ChannelSink {
    fn send(&mut self, event: TriggerEvent) -> PluginResult<()> {
        self.sender.send(event).map_err(|_| {
            PluginError::unexpected("Failed to deliver trigger event", "event channel closed")
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    TicketCreated,
    TicketUpdated,
    TicketStatusChanged,
}

impl TriggerKind {
    pub const ALL: [TriggerKind; 3] = [
        TriggerKind::TicketCreated,
        TriggerKind::TicketUpdated,
        TriggerKind::TicketStatusChanged,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TriggerKind::TicketCreated => "ticket_created",
            TriggerKind::TicketUpdated => "ticket_updated",
            TriggerKind::TicketStatusChanged => "ticket_status_changed",
        }
    }
}

impl FromStr for TriggerKind {
    type Err = PluginError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        TriggerKind::ALL
            .into_iter()
            .find(|kind| kind.name() == value)
            .ok_or_else(|| {
                PluginError::validation(
                    format!("Unknown trigger: {value}"),
                    "Supported triggers: ticket_created, ticket_updated, ticket_status_changed",
                )
            })
    }
}

/// A configured trigger: its kind plus the filters from its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    TicketCreated(TicketCreatedFilter),
    TicketUpdated(TicketUpdatedFilter),
    TicketStatusChanged(TicketStatusChangedFilter),
}

impl Trigger {
    pub fn configure(kind: TriggerKind, params: &Map<String, Value>) -> PluginResult<Self> {
        let input = ActionInput::new(params);
        Ok(match kind {
            TriggerKind::TicketCreated => {
                Trigger::TicketCreated(TicketCreatedFilter::from_input(&input)?)
            }
            TriggerKind::TicketUpdated => {
                Trigger::TicketUpdated(TicketUpdatedFilter::from_input(&input)?)
            }
            TriggerKind::TicketStatusChanged => {
                Trigger::TicketStatusChanged(TicketStatusChangedFilter::from_input(&input)?)
            }
        })
    }

    pub fn kind(&self) -> TriggerKind {
        match self {
            Trigger::TicketCreated(_) => TriggerKind::TicketCreated,
            Trigger::TicketUpdated(_) => TriggerKind::TicketUpdated,
            Trigger::TicketStatusChanged(_) => TriggerKind::TicketStatusChanged,
        }
    }

    /// Output for `event`, or `None` when it has no ticket or a filter rejects it.
    pub fn evaluate(&self, event: &Value, portal_url: &str) -> Option<TriggerEvent> {
        let payload = event.as_object()?;
        let ticket = payload
            .get("ticket")
            .and_then(Value::as_object)
            .filter(|ticket| !ticket.is_empty())?;
        match self {
            Trigger::TicketCreated(filter) => filter.evaluate(ticket, payload, portal_url),
            Trigger::TicketUpdated(filter) => filter.evaluate(ticket, payload, portal_url),
            Trigger::TicketStatusChanged(filter) => filter.evaluate(ticket, payload, portal_url),
        }
    }
}

/// Evaluates one event and forwards any output. Returns whether it was sent.
pub fn handle(
    trigger: &Trigger,
    event: &Value,
    portal_url: &str,
    sink: &mut dyn EventSink,
) -> PluginResult<bool> {
    match trigger.evaluate(event, portal_url) {
        Some(output) => {
            sink.send(output)?;
            Ok(true)
        }
        None => {
            debug!("{} skipped event", trigger.kind().name());
            Ok(false)
        }
    }
}

/// Consumes events until the channel closes. Returns the number forwarded.
pub async fn run(
    trigger: &Trigger,
    portal_url: &str,
    mut events: mpsc::Receiver<Value>,
    sink: &mut dyn EventSink,
) -> PluginResult<usize> {
    info!("{}: trigger started", trigger.kind().name());
    let mut sent = 0;
    while let Some(event) = events.recv().await {
        match handle(trigger, &event, portal_url, sink) {
            Ok(true) => sent += 1,
            Ok(false) => {}
            Err(err) => {
                warn!("{}: failed to forward event: {}", trigger.kind().name(), err);
                return Err(err);
            }
        }
    }
    info!("{}: event stream closed after {} events", trigger.kind().name(), sent);
    Ok(sent)
}

/// Integer id carried by an event, if any.
fn event_id(value: Option<&Value>) -> Option<i64> {
    value.and_then(Value::as_i64)
}

/// Reads an id from a raw or already-flattened ticket.
fn ticket_id_field(ticket: &Map<String, Value>, raw: &str, flat: &str) -> Option<i64> {
    event_id(ticket.get(raw)).or_else(|| event_id(ticket.get(flat)))
}

fn normalized(ticket: &Map<String, Value>, portal_url: &str) -> Ticket {
    normalize_ticket(&Value::Object(ticket.clone()), portal_url)
}

fn output(ticket: Ticket) -> TriggerEvent {
    let mut event = TriggerEvent::new();
    event.insert("ticket".into(), Value::Object(ticket));
    event
}
