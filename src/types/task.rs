//! Task types for the A2A protocol.
//!
//! Tasks represent stateful operations or conversations between clients
//! and agents. A task aggregates an ordered message history, the current
//! status, metadata, and the artifacts produced during execution.

use std::collections::HashMap;

use serde::{Deserialize, Serialize, Serializer};

use super::{Message, Part};

/// Helper for serde: skip serializing boolean fields when false.
pub(crate) fn is_false(v: &bool) -> bool {
    !v
}

/// Defines the lifecycle states of a Task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Task has been submitted but not yet started.
    #[default]
    Submitted,
    /// Task is currently being processed.
    Working,
    /// Task requires additional input from the user.
    InputRequired,
    /// Task has completed successfully.
    Completed,
    /// Task was canceled by the user.
    Canceled,
    /// Task failed due to an error.
    Failed,
    /// Task was rejected by the agent.
    Rejected,
    /// Task requires authentication before it can proceed.
    AuthRequired,
    /// Task state is unknown.
    Unknown,
}

impl TaskState {
    /// Returns true if this state indicates the task is still active.
    pub const fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Submitted | Self::Working | Self::InputRequired | Self::AuthRequired
        )
    }

    /// Returns true if this state indicates the task has terminated and
    /// accepts no further messages.
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Canceled | Self::Failed | Self::Rejected
        )
    }
}

/// Represents the status of a task at a specific point in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskStatus {
    /// The current state of the task's lifecycle.
    pub state: TaskState,
    /// An optional message providing more details about the current status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    /// An RFC-3339 datetime string indicating when this status was recorded.
    #[serde(rename = "time_stamp", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl TaskStatus {
    /// Creates a new task status with the given state and a current timestamp.
    pub fn new(state: TaskState) -> Self {
        Self {
            state,
            message: None,
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// Creates a new task status with a message.
    pub fn with_message(state: TaskState, message: Message) -> Self {
        Self {
            state,
            message: Some(message),
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// Creates a submitted status.
    pub fn submitted() -> Self {
        Self::new(TaskState::Submitted)
    }

    /// Creates a working status.
    pub fn working() -> Self {
        Self::new(TaskState::Working)
    }

    /// Creates a completed status.
    pub fn completed() -> Self {
        Self::new(TaskState::Completed)
    }

    /// Creates a failed status with an error message.
    pub fn failed(error: impl Into<String>) -> Self {
        Self::with_message(TaskState::Failed, Message::agent(vec![Part::text(error)]))
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::submitted()
    }
}

/// Represents a single, stateful operation or conversation between a
/// client and an agent.
///
/// The `kind` field is injected during JSON serialization as `"task"`.
/// It is not stored on the struct.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Task {
    /// A unique identifier for the task.
    pub id: String,
    /// A unique identifier for maintaining context across related tasks.
    #[serde(default)]
    pub context_id: String,
    /// The current status of the task.
    #[serde(rename = "task_status", default)]
    pub status: TaskStatus,
    /// An array of messages exchanged during the task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<Message>>,
    /// A collection of artifacts generated during the task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Vec<Artifact>>,
    /// Optional metadata for extensions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,

    /// Ignored during deserialization; injected as `"task"` on serialization.
    #[serde(default, skip_serializing)]
    #[allow(dead_code)]
    kind: Option<String>,
}

impl Serialize for Task {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        struct Helper<'a> {
            kind: &'static str,
            id: &'a str,
            context_id: &'a str,
            #[serde(rename = "task_status")]
            status: &'a TaskStatus,
            #[serde(skip_serializing_if = "Option::is_none")]
            history: &'a Option<Vec<Message>>,
            #[serde(skip_serializing_if = "Option::is_none")]
            artifacts: &'a Option<Vec<Artifact>>,
            #[serde(skip_serializing_if = "Option::is_none")]
            metadata: &'a Option<HashMap<String, serde_json::Value>>,
        }
        Helper {
            kind: "task",
            id: &self.id,
            context_id: &self.context_id,
            status: &self.status,
            history: &self.history,
            artifacts: &self.artifacts,
            metadata: &self.metadata,
        }
        .serialize(serializer)
    }
}

impl Task {
    /// Creates a new task in the submitted state.
    pub fn new(id: impl Into<String>, context_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            context_id: context_id.into(),
            status: TaskStatus::submitted(),
            history: None,
            artifacts: None,
            metadata: None,
            kind: None,
        }
    }

    /// Creates a new task with auto-generated IDs.
    pub fn create() -> Self {
        Self::new(
            uuid::Uuid::new_v4().to_string(),
            uuid::Uuid::new_v4().to_string(),
        )
    }

    /// Sets the status of this task.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the history for this task.
    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = Some(history);
        self
    }

    /// Adds a message to the task's history.
    pub fn add_message(&mut self, message: Message) {
        self.history.get_or_insert_with(Vec::new).push(message);
    }

    /// Adds an artifact to the task.
    pub fn add_artifact(&mut self, artifact: Artifact) {
        self.artifacts.get_or_insert_with(Vec::new).push(artifact);
    }

    /// Returns the current state of the task.
    pub const fn state(&self) -> TaskState {
        self.status.state
    }

    /// Returns true if the task is in a terminal state.
    pub const fn is_terminal(&self) -> bool {
        self.status.state.is_terminal()
    }

    /// Returns true if this task snapshot ends the event stream when
    /// observed as an event.
    ///
    /// Broader than [`TaskState::is_terminal`]: a snapshot in
    /// `input_required` or `unknown` also stops a non-streaming drain.
    pub const fn done(&self) -> bool {
        matches!(
            self.status.state,
            TaskState::Completed
                | TaskState::Canceled
                | TaskState::Failed
                | TaskState::Rejected
                | TaskState::Unknown
                | TaskState::InputRequired
        )
    }

    /// Returns the number of messages in the task's history.
    pub fn message_count(&self) -> usize {
        self.history.as_ref().map_or(0, Vec::len)
    }

    /// Returns the last message in the task's history.
    pub fn last_message(&self) -> Option<&Message> {
        self.history.as_ref().and_then(|h| h.last())
    }

    /// Truncates history to the most recent `len` messages.
    ///
    /// A `len` of zero drops the history entirely; `None` is a no-op.
    pub fn truncate_history(&mut self, len: Option<usize>) {
        match (len, self.history.as_mut()) {
            (Some(0), _) => self.history = None,
            (Some(max), Some(history)) if history.len() > max => {
                let start = history.len() - max;
                *history = history.split_off(start);
            }
            _ => {}
        }
    }

    /// Applies an artifact update event to this task.
    ///
    /// When `append` is set, parts extend the existing artifact with the
    /// same ID. Otherwise the artifact replaces an existing one or is
    /// pushed in arrival order.
    pub fn apply_artifact_update(&mut self, event: &TaskArtifactUpdateEvent) {
        let artifacts = self.artifacts.get_or_insert_with(Vec::new);
        let artifact_id = &event.artifact.artifact_id;

        let existing = artifacts.iter().position(|a| &a.artifact_id == artifact_id);
        if event.append {
            if let Some(idx) = existing {
                artifacts[idx].parts.extend(event.artifact.parts.clone());
            }
        } else if let Some(idx) = existing {
            artifacts[idx] = event.artifact.clone();
        } else {
            artifacts.push(event.artifact.clone());
        }
    }

    /// Merges metadata key-value pairs into the task, right side winning.
    pub fn merge_metadata(&mut self, other: &HashMap<String, serde_json::Value>) {
        let metadata = self.metadata.get_or_insert_with(HashMap::new);
        for (k, v) in other {
            metadata.insert(k.clone(), v.clone());
        }
    }

    /// Creates a [`TaskStatusUpdateEvent`] from the current task state.
    pub fn status_update_event(&self, is_final: bool) -> TaskStatusUpdateEvent {
        TaskStatusUpdateEvent::new(&self.id, &self.context_id, self.status.clone(), is_final)
    }
}

impl Default for Task {
    fn default() -> Self {
        Self::create()
    }
}

/// Represents a file, data structure, or other resource generated by an
/// agent during task execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    /// A unique identifier for the artifact within the task.
    pub artifact_id: String,
    /// An array of content parts that make up the artifact.
    #[serde(default)]
    pub parts: Vec<Part>,
    /// An optional name for the artifact.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// An optional description of the artifact.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The URIs of extensions relevant to this artifact.
    #[serde(rename = "extension", skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,
    /// Optional metadata for extensions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl Artifact {
    /// Creates a new artifact with the given ID and parts.
    pub fn new(artifact_id: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            artifact_id: artifact_id.into(),
            parts,
            name: None,
            description: None,
            extensions: None,
            metadata: None,
        }
    }

    /// Creates a new artifact with an auto-generated ID.
    pub fn create(parts: Vec<Part>) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), parts)
    }

    /// Sets the name for this artifact.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Creates a text artifact with the given content.
    pub fn text(artifact_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(artifact_id, vec![Part::text(text)])
    }
}

/// An event sent by the agent to notify the client of a status change.
///
/// The `kind` field is injected as `"status_update"` during serialization.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TaskStatusUpdateEvent {
    /// The ID of the task that was updated.
    pub task_id: String,
    /// The context ID associated with the task.
    #[serde(default)]
    pub context_id: String,
    /// The new status of the task.
    pub status: TaskStatus,
    /// If true, this is the final event in the stream for this task.
    #[serde(default)]
    pub r#final: bool,
    /// Optional metadata for extensions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,

    /// Ignored during deserialization; injected on serialization.
    #[serde(default, skip_serializing)]
    #[allow(dead_code)]
    kind: Option<String>,
}

impl Serialize for TaskStatusUpdateEvent {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        struct Helper<'a> {
            kind: &'static str,
            task_id: &'a str,
            context_id: &'a str,
            status: &'a TaskStatus,
            #[serde(skip_serializing_if = "is_false")]
            r#final: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            metadata: &'a Option<HashMap<String, serde_json::Value>>,
        }
        Helper {
            kind: "status_update",
            task_id: &self.task_id,
            context_id: &self.context_id,
            status: &self.status,
            r#final: self.r#final,
            metadata: &self.metadata,
        }
        .serialize(serializer)
    }
}

impl TaskStatusUpdateEvent {
    /// Creates a new status update event.
    pub fn new(
        task_id: impl Into<String>,
        context_id: impl Into<String>,
        status: TaskStatus,
        r#final: bool,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            context_id: context_id.into(),
            status,
            r#final,
            metadata: None,
            kind: None,
        }
    }
}

/// An event sent by the agent to notify the client of a new or updated
/// artifact.
///
/// The `kind` field is injected as `"artifact_update"` during serialization.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TaskArtifactUpdateEvent {
    /// The ID of the task this artifact belongs to.
    pub task_id: String,
    /// The context ID associated with the task.
    #[serde(default)]
    pub context_id: String,
    /// The artifact that was generated or updated.
    pub artifact: Artifact,
    /// If true, the parts extend a previously sent artifact.
    #[serde(default)]
    pub append: bool,
    /// If true, this is the final chunk of the artifact.
    #[serde(default)]
    pub last_chunk: bool,
    /// Optional metadata for extensions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,

    /// Ignored during deserialization; injected on serialization.
    #[serde(default, skip_serializing)]
    #[allow(dead_code)]
    kind: Option<String>,
}

impl Serialize for TaskArtifactUpdateEvent {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        struct Helper<'a> {
            kind: &'static str,
            task_id: &'a str,
            context_id: &'a str,
            artifact: &'a Artifact,
            #[serde(skip_serializing_if = "is_false")]
            append: bool,
            #[serde(skip_serializing_if = "is_false")]
            last_chunk: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            metadata: &'a Option<HashMap<String, serde_json::Value>>,
        }
        Helper {
            kind: "artifact_update",
            task_id: &self.task_id,
            context_id: &self.context_id,
            artifact: &self.artifact,
            append: self.append,
            last_chunk: self.last_chunk,
            metadata: &self.metadata,
        }
        .serialize(serializer)
    }
}

impl TaskArtifactUpdateEvent {
    /// Creates a new artifact update event.
    pub fn new(
        task_id: impl Into<String>,
        context_id: impl Into<String>,
        artifact: Artifact,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            context_id: context_id.into(),
            artifact,
            append: false,
            last_chunk: false,
            metadata: None,
            kind: None,
        }
    }

    /// Marks this event as appending to an existing artifact.
    pub fn appending(mut self) -> Self {
        self.append = true;
        self
    }

    /// Marks this event as the last chunk of the artifact.
    pub fn with_last_chunk(mut self) -> Self {
        self.last_chunk = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_state_is_active() {
        assert!(TaskState::Submitted.is_active());
        assert!(TaskState::Working.is_active());
        assert!(TaskState::AuthRequired.is_active());
        assert!(!TaskState::Completed.is_active());
    }

    #[test]
    fn test_task_state_is_terminal() {
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Rejected.is_terminal());
        assert!(!TaskState::InputRequired.is_terminal());
        assert!(!TaskState::AuthRequired.is_terminal());
    }

    #[test]
    fn test_task_done_is_broader_than_terminal() {
        let mut task = Task::new("t1", "c1");
        task.status = TaskStatus::new(TaskState::InputRequired);
        assert!(task.done());
        assert!(!task.is_terminal());
    }

    #[test]
    fn test_task_serialization_injects_kind() {
        let task = Task::new("task-123", "ctx-456");
        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"kind\":\"task\""));
        assert!(json.contains("\"id\":\"task-123\""));
        assert!(json.contains("\"task_status\""));
    }

    #[test]
    fn test_task_json_roundtrip_is_stable() {
        let mut task = Task::new("t1", "c1");
        task.add_message(Message::user_text("hello"));
        task.add_artifact(Artifact::text("a1", "result"));

        let first = serde_json::to_string(&task).unwrap();
        let parsed: Task = serde_json::from_str(&first).unwrap();
        let second = serde_json::to_string(&parsed).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_state_serialization_uses_snake_case() {
        let status = TaskStatus::new(TaskState::InputRequired);
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"input_required\""));

        let status = TaskStatus::new(TaskState::AuthRequired);
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"auth_required\""));
    }

    #[test]
    fn test_truncate_history() {
        let mut task = Task::new("t1", "c1");
        for i in 0..5 {
            task.add_message(Message::user_text(format!("m{i}")));
        }

        task.truncate_history(None);
        assert_eq!(task.message_count(), 5);

        task.truncate_history(Some(2));
        assert_eq!(task.message_count(), 2);
        assert_eq!(
            task.last_message().unwrap().text_content(),
            Some("m4".to_string())
        );

        task.truncate_history(Some(0));
        assert!(task.history.is_none());
    }

    #[test]
    fn test_apply_artifact_update_append() {
        let mut task = Task::new("t1", "c1");
        let event = TaskArtifactUpdateEvent::new("t1", "c1", Artifact::text("a1", "first"));
        task.apply_artifact_update(&event);
        assert_eq!(task.artifacts.as_ref().unwrap().len(), 1);

        let event =
            TaskArtifactUpdateEvent::new("t1", "c1", Artifact::text("a1", "second")).appending();
        task.apply_artifact_update(&event);
        let artifacts = task.artifacts.as_ref().unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].parts.len(), 2);
    }

    #[test]
    fn test_apply_artifact_update_preserves_order() {
        let mut task = Task::new("t1", "c1");
        for id in ["a1", "a2", "a3"] {
            let event = TaskArtifactUpdateEvent::new("t1", "c1", Artifact::text(id, id));
            task.apply_artifact_update(&event);
        }
        let ids: Vec<_> = task
            .artifacts
            .as_ref()
            .unwrap()
            .iter()
            .map(|a| a.artifact_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a1", "a2", "a3"]);
    }

    #[test]
    fn test_merge_metadata_right_wins() {
        let mut task = Task::new("t1", "c1");
        task.merge_metadata(&HashMap::from([(
            "key".to_string(),
            serde_json::json!("old"),
        )]));
        task.merge_metadata(&HashMap::from([(
            "key".to_string(),
            serde_json::json!("new"),
        )]));
        assert_eq!(
            task.metadata.as_ref().unwrap().get("key"),
            Some(&serde_json::json!("new"))
        );
    }

    #[test]
    fn test_status_update_event_kind() {
        let event = TaskStatusUpdateEvent::new("t1", "c1", TaskStatus::working(), false);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"kind\":\"status_update\""));

        let parsed: TaskStatusUpdateEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.task_id, "t1");
        assert!(!parsed.r#final);
    }

    #[test]
    fn test_artifact_update_event_kind() {
        let event = TaskArtifactUpdateEvent::new("t1", "c1", Artifact::text("a1", "hello"));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"kind\":\"artifact_update\""));

        let parsed: TaskArtifactUpdateEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.artifact.artifact_id, "a1");
        assert!(!parsed.last_chunk);
    }
}
