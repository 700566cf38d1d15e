//! Producer-side helper for emitting well-formed events.
//!
//! Agent executors hold a [`TaskUpdater`] bound to the task and context
//! of the request; every event it produces carries those IDs.

use std::collections::HashMap;
use std::sync::Arc;

use crate::server::EventQueue;
use crate::types::{
    Artifact, Event, Message, Part, Role, TaskArtifactUpdateEvent, TaskState, TaskStatus,
    TaskStatusUpdateEvent,
};

/// Options for a status update event.
///
/// Omitted fields get the updater's defaults: a current RFC-3339 UTC
/// timestamp, and `final = false` (`true` for the terminal wrappers).
#[derive(Debug, Clone, Default)]
pub struct StatusOptions {
    /// A message describing the status.
    pub message: Option<Message>,
    /// Metadata attached to the event.
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    /// Overrides whether this is the final event of the stream.
    pub r#final: Option<bool>,
    /// Overrides the status timestamp.
    pub timestamp: Option<String>,
}

/// Options for an artifact update event.
///
/// An omitted `artifact_id` gets a freshly minted v4 UUID.
#[derive(Debug, Clone, Default)]
pub struct ArtifactOptions {
    /// Overrides the artifact ID.
    pub artifact_id: Option<String>,
    /// A name for the artifact.
    pub name: Option<String>,
    /// Whether the parts extend a previously sent artifact.
    pub append: bool,
    /// Whether this is the final chunk of the artifact.
    pub last_chunk: bool,
    /// Metadata attached to the artifact.
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

/// Emits well-formed events for one task into its queue.
pub struct TaskUpdater {
    queue: Arc<EventQueue>,
    task_id: String,
    context_id: String,
}

impl TaskUpdater {
    /// Creates a new updater bound to a task and context.
    pub fn new(
        queue: Arc<EventQueue>,
        task_id: impl Into<String>,
        context_id: impl Into<String>,
    ) -> Self {
        Self {
            queue,
            task_id: task_id.into(),
            context_id: context_id.into(),
        }
    }

    /// Returns the task ID this updater is bound to.
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Returns the context ID this updater is bound to.
    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    /// Emits a status update event for the given state.
    ///
    /// Returns false if the queue refused the event.
    pub fn update_status(&self, state: TaskState, opts: StatusOptions) -> bool {
        let timestamp = opts
            .timestamp
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
        let status = TaskStatus {
            state,
            message: opts.message,
            timestamp: Some(timestamp),
        };
        let mut event = TaskStatusUpdateEvent::new(
            &self.task_id,
            &self.context_id,
            status,
            opts.r#final.unwrap_or(false),
        );
        event.metadata = opts.metadata;
        self.queue.enqueue(Event::StatusUpdate(event))
    }

    /// Emits an artifact update event carrying the given parts.
    pub fn add_artifact(&self, parts: Vec<Part>, opts: ArtifactOptions) -> bool {
        let artifact_id = opts
            .artifact_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let mut artifact = Artifact::new(artifact_id, parts);
        artifact.name = opts.name;
        artifact.metadata = opts.metadata;

        let mut event = TaskArtifactUpdateEvent::new(&self.task_id, &self.context_id, artifact);
        event.append = opts.append;
        event.last_chunk = opts.last_chunk;
        self.queue.enqueue(Event::ArtifactUpdate(event))
    }

    /// Marks the task completed. Final unless overridden.
    pub fn complete(&self, opts: StatusOptions) -> bool {
        self.update_status(TaskState::Completed, finalized(opts))
    }

    /// Marks the task failed. Final unless overridden.
    pub fn failed(&self, opts: StatusOptions) -> bool {
        self.update_status(TaskState::Failed, finalized(opts))
    }

    /// Marks the task rejected. Final unless overridden.
    pub fn reject(&self, opts: StatusOptions) -> bool {
        self.update_status(TaskState::Rejected, finalized(opts))
    }

    /// Marks the task submitted.
    pub fn submit(&self, opts: StatusOptions) -> bool {
        self.update_status(TaskState::Submitted, opts)
    }

    /// Marks the task as actively being worked on.
    pub fn start_work(&self, opts: StatusOptions) -> bool {
        self.update_status(TaskState::Working, opts)
    }

    /// Constructs an agent message bound to this task and context with a
    /// fresh message ID. The message is not enqueued.
    pub fn new_agent_message(
        &self,
        parts: Vec<Part>,
        metadata: Option<HashMap<String, serde_json::Value>>,
    ) -> Message {
        let mut message = Message::new(uuid::Uuid::new_v4().to_string(), Role::Agent, parts);
        message.task_id = Some(self.task_id.clone());
        message.context_id = Some(self.context_id.clone());
        message.metadata = metadata;
        message
    }
}

fn finalized(mut opts: StatusOptions) -> StatusOptions {
    opts.r#final = Some(opts.r#final.unwrap_or(true));
    opts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StreamEvent;
    use futures::StreamExt;
    use tokio_util::sync::CancellationToken;

    fn updater() -> (Arc<EventQueue>, TaskUpdater) {
        let queue = Arc::new(EventQueue::new(10));
        let updater = TaskUpdater::new(Arc::clone(&queue), "t1", "c1");
        (queue, updater)
    }

    async fn next_event(queue: &Arc<EventQueue>) -> StreamEvent {
        let mut sub = queue.subscribe(CancellationToken::new());
        sub.next().await.expect("expected an envelope")
    }

    #[tokio::test]
    async fn test_update_status_carries_ids_and_timestamp() {
        let (queue, updater) = updater();
        assert!(updater.update_status(TaskState::Working, StatusOptions::default()));

        match next_event(&queue).await {
            StreamEvent::Data(Event::StatusUpdate(e)) => {
                assert_eq!(e.task_id, "t1");
                assert_eq!(e.context_id, "c1");
                assert!(!e.r#final);
                assert!(e.status.timestamp.is_some());
            }
            other => panic!("unexpected envelope: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_defaults_to_final_done() {
        let (queue, updater) = updater();
        assert!(updater.complete(StatusOptions::default()));

        match next_event(&queue).await {
            StreamEvent::Done(Event::StatusUpdate(e)) => {
                assert!(e.r#final);
                assert_eq!(e.status.state, TaskState::Completed);
            }
            other => panic!("unexpected envelope: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_and_reject_are_final() {
        let (queue, updater) = updater();
        assert!(updater.failed(StatusOptions::default()));
        assert!(matches!(next_event(&queue).await, StreamEvent::Done(_)));

        let (queue, updater) = self::updater();
        assert!(updater.reject(StatusOptions::default()));
        assert!(matches!(next_event(&queue).await, StreamEvent::Done(_)));
    }

    #[tokio::test]
    async fn test_add_artifact_mints_id() {
        let (queue, updater) = updater();
        assert!(updater.add_artifact(
            vec![Part::text("result")],
            ArtifactOptions {
                name: Some("out.txt".into()),
                ..Default::default()
            }
        ));

        match next_event(&queue).await {
            StreamEvent::Data(Event::ArtifactUpdate(e)) => {
                assert_eq!(e.task_id, "t1");
                assert!(!e.artifact.artifact_id.is_empty());
                assert_eq!(e.artifact.name.as_deref(), Some("out.txt"));
            }
            other => panic!("unexpected envelope: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_new_agent_message_binds_ids() {
        let (_queue, updater) = updater();
        let message = updater.new_agent_message(vec![Part::text("hi")], None);
        assert_eq!(message.task_id.as_deref(), Some("t1"));
        assert_eq!(message.context_id.as_deref(), Some("c1"));
        assert_eq!(message.role, Role::Agent);
        assert!(!message.message_id.is_empty());
    }
}
