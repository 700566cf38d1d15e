//! Per-request task state materialization.
//!
//! A [`TaskManager`] applies the events of a single request to a task,
//! persisting each transition to the store and enforcing the identity
//! invariants between event and task. One instance exists per request;
//! it is never shared across requests.

use std::sync::Arc;

use tracing::debug;

use super::TaskStore;
use crate::error::{A2AError, Result};
use crate::types::{Event, Message, Task, TaskStatus};

/// Materializes a task from an event stream and persists it.
pub struct TaskManager {
    store: Arc<dyn TaskStore>,
    task_id: Option<String>,
    context_id: Option<String>,
    init_message: Option<Message>,
    current: Option<Task>,
}

impl TaskManager {
    /// Creates a new task manager backed by the given store.
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self {
            store,
            task_id: None,
            context_id: None,
            init_message: None,
            current: None,
        }
    }

    /// Sets the task ID this manager is scoped to.
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        let task_id = task_id.into();
        if !task_id.is_empty() {
            self.task_id = Some(task_id);
        }
        self
    }

    /// Sets the context ID this manager is scoped to.
    pub fn with_context_id(mut self, context_id: impl Into<String>) -> Self {
        let context_id = context_id.into();
        if !context_id.is_empty() {
            self.context_id = Some(context_id);
        }
        self
    }

    /// Sets the initial message appended to a synthesized task's history.
    pub fn with_init_message(mut self, message: Message) -> Self {
        self.init_message = Some(message);
        self
    }

    /// Returns the task ID, if one has been configured or adopted.
    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    /// Returns the cached task, loading it from the store if necessary.
    ///
    /// Fails with [`A2AError::TaskIdNotSet`] when no task ID was ever
    /// configured or adopted.
    pub async fn get_task(&mut self) -> Result<Option<Task>> {
        if let Some(ref task) = self.current {
            return Ok(Some(task.clone()));
        }
        let task_id = self.task_id.clone().ok_or(A2AError::TaskIdNotSet)?;
        let task = self.store.get(&task_id).await?;
        self.current = task.clone();
        Ok(task)
    }

    /// Applies the event to the task, persists the result, and returns
    /// the same event for chaining.
    pub async fn process(&mut self, event: Event) -> Result<Event> {
        self.validate_identity(&event)?;

        match &event {
            Event::Task(task) => {
                self.save_task(task.clone()).await?;
            }
            Event::StatusUpdate(update) => {
                let mut task = self.ensure_task(&event).await?;
                // Demote the previous status message into history before
                // it is replaced. Replaying an identical status is a no-op.
                if task.status != update.status {
                    if let Some(message) = task.status.message.take() {
                        task.add_message(message);
                    }
                    if let Some(ref metadata) = update.metadata {
                        task.merge_metadata(metadata);
                    }
                    task.status = update.status.clone();
                }
                self.save_task(task).await?;
            }
            Event::ArtifactUpdate(update) => {
                let mut task = self.ensure_task(&event).await?;
                task.apply_artifact_update(update);
                self.save_task(task).await?;
            }
            Event::Message(_) => {
                return Err(A2AError::UnknownEventKind(event.kind().to_string()));
            }
        }
        Ok(event)
    }

    /// Demotes the task's status message into history (if present),
    /// appends the new message, and clears the status message.
    pub fn update_with_message(&mut self, message: Message, task: &mut Task) {
        if let Some(previous) = task.status.message.take() {
            task.add_message(previous);
        }
        task.add_message(message);
        self.current = Some(task.clone());
    }

    fn validate_identity(&mut self, event: &Event) -> Result<()> {
        let event_task_id = event.task_id().unwrap_or_default();
        if let Some(ref expected) = self.task_id {
            if expected != event_task_id {
                return Err(A2AError::TaskIdMismatch {
                    expected: expected.clone(),
                    actual: event_task_id.to_string(),
                });
            }
        } else if !event_task_id.is_empty() {
            self.task_id = Some(event_task_id.to_string());
        }

        let event_context_id = event.context_id().unwrap_or_default();
        if let Some(ref expected) = self.context_id {
            if !event_context_id.is_empty() && expected != event_context_id {
                return Err(A2AError::ContextIdMismatch {
                    expected: expected.clone(),
                    actual: event_context_id.to_string(),
                });
            }
        } else if !event_context_id.is_empty() {
            self.context_id = Some(event_context_id.to_string());
        }
        Ok(())
    }

    /// Returns the task the event applies to, loading it from the store
    /// or synthesizing a fresh submitted task when none exists yet.
    async fn ensure_task(&mut self, event: &Event) -> Result<Task> {
        if let Some(ref task) = self.current {
            return Ok(task.clone());
        }
        if let Some(ref task_id) = self.task_id {
            if let Some(task) = self.store.get(task_id).await? {
                self.current = Some(task.clone());
                return Ok(task);
            }
        }

        let task_id = event.task_id().unwrap_or_default();
        let context_id = event.context_id().unwrap_or_default();
        debug!(task_id, context_id, "synthesizing task for event");

        let mut task = Task::new(task_id, context_id);
        task.status = TaskStatus::submitted();
        if let Some(ref message) = self.init_message {
            task.add_message(message.clone());
        }
        self.save_task(task.clone()).await?;
        Ok(task)
    }

    async fn save_task(&mut self, task: Task) -> Result<()> {
        self.store.save(&task).await?;
        if self.task_id.is_none() {
            self.task_id = Some(task.id.clone());
            self.context_id = Some(task.context_id.clone());
        }
        self.current = Some(task);
        Ok(())
    }
}
