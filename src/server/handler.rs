//! Request handler trait for A2A JSON-RPC methods.

use async_trait::async_trait;

use super::{CallContext, EventStream};
use crate::error::Result;
use crate::types::{
    Event, MessageSendParams, Task, TaskIdParams, TaskPushNotificationConfig, TaskQueryParams,
};

/// Interface for handling all A2A JSON-RPC methods.
///
/// Implement this trait to customize request handling; the
/// [`DefaultRequestHandler`](super::DefaultRequestHandler) coordinates
/// the agent executor, task store, and queue manager in the standard
/// composition.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Handles `message/send`: runs the executor and waits for the
    /// final result, returning either a task or a direct message.
    async fn on_message_send(
        &self,
        params: MessageSendParams,
        context: &CallContext,
    ) -> Result<Event>;

    /// Handles `message/stream`: runs the executor and yields envelopes.
    async fn on_message_stream(
        &self,
        params: MessageSendParams,
        context: &CallContext,
    ) -> Result<EventStream>;

    /// Handles `tasks/get`: a pure read of the task store.
    async fn on_get_task(&self, params: TaskQueryParams, context: &CallContext) -> Result<Task>;

    /// Handles `tasks/cancel`: issues the executor's cancel and drains
    /// the resulting stream.
    async fn on_cancel_task(&self, params: TaskIdParams, context: &CallContext) -> Result<Task>;

    /// Handles `tasks/resubscribe`: attaches a new observer to an
    /// in-flight task's event stream.
    async fn on_resubscribe(
        &self,
        params: TaskIdParams,
        context: &CallContext,
    ) -> Result<EventStream>;

    /// Handles `tasks/pushNotificationConfig/set`.
    async fn on_set_push_notification_config(
        &self,
        params: TaskPushNotificationConfig,
        context: &CallContext,
    ) -> Result<TaskPushNotificationConfig>;

    /// Handles `tasks/pushNotificationConfig/get`.
    async fn on_get_push_notification_config(
        &self,
        params: TaskIdParams,
        context: &CallContext,
    ) -> Result<TaskPushNotificationConfig>;
}
