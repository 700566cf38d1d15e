//! Event model for the A2A server runtime.
//!
//! Agent executors produce a stream of events: full task snapshots,
//! status updates, artifact updates, and direct messages. The queue layer
//! wraps each event in a [`StreamEvent`] envelope that also carries the
//! terminal conditions of a subscription (done, error, closed, canceled).

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::A2AError;
use crate::types::{Message, RequestId, Task, TaskArtifactUpdateEvent, TaskStatusUpdateEvent};

/// An event produced by an agent executor.
///
/// JSON (de)serialization discriminates on the `kind` field, which each
/// concrete type injects itself.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Event {
    /// A complete task snapshot.
    Task(Task),
    /// A status update event.
    StatusUpdate(TaskStatusUpdateEvent),
    /// An artifact update event.
    ArtifactUpdate(TaskArtifactUpdateEvent),
    /// A direct message response.
    Message(Message),
}

impl Event {
    /// Returns the task ID carried by this event, if any.
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Self::Task(t) => Some(&t.id),
            Self::StatusUpdate(e) => Some(&e.task_id),
            Self::ArtifactUpdate(e) => Some(&e.task_id),
            Self::Message(m) => m.task_id.as_deref(),
        }
    }

    /// Returns the context ID carried by this event, if any.
    pub fn context_id(&self) -> Option<&str> {
        match self {
            Self::Task(t) => Some(&t.context_id),
            Self::StatusUpdate(e) => Some(&e.context_id),
            Self::ArtifactUpdate(e) => Some(&e.context_id),
            Self::Message(m) => m.context_id.as_deref(),
        }
    }

    /// Returns the `kind` discriminator for this event.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Task(_) => "task",
            Self::StatusUpdate(_) => "status_update",
            Self::ArtifactUpdate(_) => "artifact_update",
            Self::Message(_) => "message",
        }
    }

    /// Returns true if this event terminates the stream it travels on.
    ///
    /// A task snapshot is terminal when its state has settled, a status
    /// update when flagged final, and a message always (a message
    /// response ends the interaction). Artifact updates never are.
    pub fn done(&self) -> bool {
        match self {
            Self::Task(t) => t.done(),
            Self::StatusUpdate(e) => e.r#final,
            Self::ArtifactUpdate(_) => false,
            Self::Message(_) => true,
        }
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let kind = value
            .get("kind")
            .and_then(|k| k.as_str())
            .ok_or_else(|| D::Error::missing_field("kind"))?;

        match kind {
            "task" => serde_json::from_value(value)
                .map(Event::Task)
                .map_err(D::Error::custom),
            "status_update" => serde_json::from_value(value)
                .map(Event::StatusUpdate)
                .map_err(D::Error::custom),
            "artifact_update" => serde_json::from_value(value)
                .map(Event::ArtifactUpdate)
                .map_err(D::Error::custom),
            "message" => serde_json::from_value(value)
                .map(Event::Message)
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(format!("unknown event kind: {other}"))),
        }
    }
}

impl From<Task> for Event {
    fn from(task: Task) -> Self {
        Self::Task(task)
    }
}

impl From<TaskStatusUpdateEvent> for Event {
    fn from(event: TaskStatusUpdateEvent) -> Self {
        Self::StatusUpdate(event)
    }
}

impl From<TaskArtifactUpdateEvent> for Event {
    fn from(event: TaskArtifactUpdateEvent) -> Self {
        Self::ArtifactUpdate(event)
    }
}

impl From<Message> for Event {
    fn from(message: Message) -> Self {
        Self::Message(message)
    }
}

/// The envelope a queue subscription yields.
///
/// At most one of the event/error payloads is populated. `Done`, `Error`,
/// `Closed`, and `Canceled` all terminate the subscription that observes
/// them.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// An intermediate event.
    Data(Event),
    /// The final event of the task.
    Done(Event),
    /// The producer failed; no further data is expected.
    Error(A2AError),
    /// The queue was closed.
    Closed,
    /// The subscription was canceled, carrying the cause.
    Canceled(A2AError),
}

impl StreamEvent {
    /// Returns the event payload, if this envelope carries one.
    pub fn event(&self) -> Option<&Event> {
        match self {
            Self::Data(e) | Self::Done(e) => Some(e),
            _ => None,
        }
    }

    /// Returns true if this envelope terminates a subscription.
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Data(_))
    }

    /// Encodes this envelope as a JSON-RPC frame for SSE delivery.
    ///
    /// `Closed` has no frame: the stream simply ends.
    pub fn to_jsonrpc_frame(&self, id: &RequestId) -> Option<serde_json::Value> {
        match self {
            Self::Data(event) | Self::Done(event) => Some(serde_json::json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": event,
            })),
            Self::Error(err) | Self::Canceled(err) => {
                let rpc = err.to_jsonrpc_error();
                Some(serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": { "code": rpc.code, "message": rpc.message },
                }))
            }
            Self::Closed => None,
        }
    }
}
