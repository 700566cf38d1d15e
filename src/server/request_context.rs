//! Request context handed to the agent executor.
//!
//! Resolves the task and context identifiers for a request, stamping
//! them onto the message and validating them against any stored task.

use std::sync::Arc;

use super::CallContext;
use crate::error::{A2AError, Result};
use crate::types::{Message, MessageSendParams, Task};

/// The resolved execution context for one request.
///
/// Carries the task identity, the triggering parameters, the loaded task
/// (if any), and the per-request call context.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// The task ID being processed (resolved or newly generated).
    pub task_id: String,
    /// The context ID grouping related tasks.
    pub context_id: String,
    /// The parameters of the triggering request, if any.
    pub params: Option<MessageSendParams>,
    /// The stored task the request refers to, if one exists.
    pub task: Option<Task>,
    /// The per-request call context.
    pub call_context: Option<Arc<CallContext>>,
}

impl RequestContext {
    /// Returns a builder for assembling a request context.
    pub fn builder() -> RequestContextBuilder {
        RequestContextBuilder::default()
    }

    /// Returns the triggering message, if the request carried one.
    pub fn message(&self) -> Option<&Message> {
        self.params.as_ref().map(|p| &p.message)
    }
}

/// Builder for [`RequestContext`].
///
/// `build` resolves missing identifiers from the message, falling back
/// to freshly generated UUIDs, and verifies that a supplied task agrees
/// with the resolved identity.
#[derive(Debug, Default)]
pub struct RequestContextBuilder {
    task_id: Option<String>,
    context_id: Option<String>,
    params: Option<MessageSendParams>,
    task: Option<Task>,
    call_context: Option<Arc<CallContext>>,
}

impl RequestContextBuilder {
    /// Sets the task ID.
    pub fn task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// Sets the context ID.
    pub fn context_id(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }

    /// Sets the request parameters.
    pub fn params(mut self, params: MessageSendParams) -> Self {
        self.params = Some(params);
        self
    }

    /// Sets the previously stored task.
    pub fn task(mut self, task: Task) -> Self {
        self.task = Some(task);
        self
    }

    /// Sets the call context.
    pub fn call_context(mut self, call_context: Arc<CallContext>) -> Self {
        self.call_context = Some(call_context);
        self
    }

    /// Resolves identifiers and builds the context.
    pub fn build(self) -> Result<RequestContext> {
        let message = self.params.as_ref().map(|p| &p.message);

        let task_id = self
            .task_id
            .filter(|id| !id.is_empty())
            .or_else(|| message.and_then(|m| m.task_id.clone()).filter(|id| !id.is_empty()))
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let context_id = self
            .context_id
            .filter(|id| !id.is_empty())
            .or_else(|| {
                message
                    .and_then(|m| m.context_id.clone())
                    .filter(|id| !id.is_empty())
            })
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        if let Some(ref task) = self.task {
            if !task.id.is_empty() && task.id != task_id {
                return Err(A2AError::TaskIdMismatch {
                    expected: task_id,
                    actual: task.id.clone(),
                });
            }
            if !task.context_id.is_empty() && task.context_id != context_id {
                return Err(A2AError::ContextIdMismatch {
                    expected: context_id,
                    actual: task.context_id.clone(),
                });
            }
        }

        // stamp the resolved identity onto the message
        let params = self.params.map(|mut p| {
            p.message.task_id = Some(task_id.clone());
            p.message.context_id = Some(context_id.clone());
            p
        });

        Ok(RequestContext {
            task_id,
            context_id,
            params,
            task: self.task,
            call_context: self.call_context,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_resolved_from_message() {
        let message = Message::user_text("hi")
            .with_task_id("t1")
            .with_context_id("c1");
        let ctx = RequestContext::builder()
            .params(MessageSendParams::new(message))
            .build()
            .unwrap();
        assert_eq!(ctx.task_id, "t1");
        assert_eq!(ctx.context_id, "c1");
    }

    #[test]
    fn test_missing_ids_are_generated_and_stamped() {
        let ctx = RequestContext::builder()
            .params(MessageSendParams::new(Message::user_text("hi")))
            .build()
            .unwrap();
        assert!(!ctx.task_id.is_empty());
        assert!(!ctx.context_id.is_empty());

        let message = ctx.message().unwrap();
        assert_eq!(message.task_id.as_deref(), Some(ctx.task_id.as_str()));
        assert_eq!(message.context_id.as_deref(), Some(ctx.context_id.as_str()));
    }

    #[test]
    fn test_explicit_ids_win_over_message() {
        let message = Message::user_text("hi").with_task_id("from-msg");
        let ctx = RequestContext::builder()
            .task_id("explicit")
            .params(MessageSendParams::new(message))
            .build()
            .unwrap();
        assert_eq!(ctx.task_id, "explicit");
    }

    #[test]
    fn test_mismatched_task_is_rejected() {
        let result = RequestContext::builder()
            .task_id("t1")
            .task(Task::new("other", "c1"))
            .build();
        assert!(matches!(result, Err(A2AError::TaskIdMismatch { .. })));
    }

    #[test]
    fn test_matching_task_is_accepted() {
        let ctx = RequestContext::builder()
            .task_id("t1")
            .context_id("c1")
            .task(Task::new("t1", "c1"))
            .build()
            .unwrap();
        assert!(ctx.task.is_some());
    }
}
