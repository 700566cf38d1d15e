//! Default implementation of the [`RequestHandler`] trait.
//!
//! Coordinates the agent executor, task store, queue manager, and the
//! optional push notifier. Per request it spawns at most two concurrent
//! tasks: the producer running the executor, and (for interruptible
//! drains that hit `auth_required`) one background drainer owned by the
//! aggregator.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::{
    AgentExecutor, CallContext, EventQueue, EventStream, PushNotifier, QueueManager,
    RequestContext, RequestHandler, ResultAggregator, TaskManager, TaskStore,
    DEFAULT_QUEUE_CAPACITY,
};
use crate::error::{A2AError, JsonRpcError, Result};
use crate::types::{
    Event, MessageSendParams, StreamEvent, Task, TaskIdParams, TaskPushNotificationConfig,
    TaskQueryParams,
};

/// Standard request handler wiring request parameters to the executor,
/// queue, and consumer strategy of each JSON-RPC method.
pub struct DefaultRequestHandler<E: AgentExecutor + 'static> {
    executor: Arc<E>,
    store: Arc<dyn TaskStore>,
    queue_manager: Arc<QueueManager>,
    push_notifier: Option<Arc<dyn PushNotifier>>,
}

impl<E: AgentExecutor + 'static> DefaultRequestHandler<E> {
    /// Creates a handler over an executor and task store.
    pub fn new(executor: E, store: Arc<dyn TaskStore>) -> Self {
        Self {
            executor: Arc::new(executor),
            store,
            queue_manager: Arc::new(QueueManager::new()),
            push_notifier: None,
        }
    }

    /// Uses a shared queue manager instead of a private one.
    pub fn with_queue_manager(mut self, queue_manager: Arc<QueueManager>) -> Self {
        self.queue_manager = queue_manager;
        self
    }

    /// Attaches a push notification collaborator.
    pub fn with_push_notifier(mut self, push_notifier: Arc<dyn PushNotifier>) -> Self {
        self.push_notifier = Some(push_notifier);
        self
    }

    /// Validates the incoming message and resolves the request context,
    /// the per-request task manager, and the queue.
    async fn prepare_send(
        &self,
        params: MessageSendParams,
        context: &CallContext,
    ) -> Result<(RequestContext, TaskManager, Arc<EventQueue>)> {
        let message = &params.message;
        if message.message_id.is_empty() {
            return Err(JsonRpcError::invalid_params("message ID is required").into());
        }
        if message.parts.is_empty() {
            return Err(JsonRpcError::invalid_params("message parts are required").into());
        }

        // load the stored task when the message names one
        let stored_task = match message.task_id.as_deref() {
            Some(task_id) if !task_id.is_empty() => self.store.get(task_id).await?,
            _ => None,
        };
        if let Some(ref task) = stored_task {
            if task.is_terminal() {
                return Err(A2AError::TaskTerminalState {
                    task_id: task.id.clone(),
                    state: task.status.state,
                });
            }
        }

        let mut builder = RequestContext::builder()
            .params(params)
            .call_context(Arc::new(context.clone()));
        if let Some(ref task) = stored_task {
            builder = builder.task(task.clone());
        }
        let ctx = builder.build()?;
        let stamped_message = ctx
            .message()
            .cloned()
            .ok_or_else(|| A2AError::Internal("request context lost its message".into()))?;

        let mut task_manager = TaskManager::new(Arc::clone(&self.store))
            .with_task_id(&ctx.task_id)
            .with_context_id(&ctx.context_id)
            .with_init_message(stamped_message.clone());

        // append the incoming message to an existing task's history
        if let Some(mut task) = stored_task {
            task_manager.update_with_message(stamped_message, &mut task);
            self.store.save(&task).await?;

            if let (Some(notifier), Some(config)) = (
                self.push_notifier.as_ref(),
                ctx.params
                    .as_ref()
                    .and_then(|p| p.configuration.as_ref())
                    .and_then(|c| c.push_notification_config.as_ref()),
            ) {
                notifier.set_info(&task.id, config).await?;
            }
        }

        let queue = self.queue_manager.create_or_tap(&ctx.task_id).await;
        debug!(task_id = %ctx.task_id, context_id = %ctx.context_id, "prepared send");
        Ok((ctx, task_manager, queue))
    }

    /// Launches the executor in a concurrent producer task. Termination
    /// closes the queue; an error return enqueues an Error envelope
    /// first.
    fn spawn_execute(&self, ctx: RequestContext, queue: Arc<EventQueue>) -> JoinHandle<()> {
        let executor = Arc::clone(&self.executor);
        tokio::spawn(async move {
            if let Err(err) = executor.execute(&ctx, Arc::clone(&queue)).await {
                error!(task_id = %ctx.task_id, error = %err, "agent execution failed");
                queue.enqueue_error(err);
            }
            queue.close();
        })
    }

    /// Launches the executor's cancel operation in a producer task.
    fn spawn_cancel(&self, ctx: RequestContext, queue: Arc<EventQueue>) -> JoinHandle<()> {
        let executor = Arc::clone(&self.executor);
        tokio::spawn(async move {
            if let Err(err) = executor.cancel(&ctx, Arc::clone(&queue)).await {
                error!(task_id = %ctx.task_id, error = %err, "cancel execution failed");
                queue.enqueue_error(err);
            }
            queue.close();
        })
    }
}

#[async_trait]
impl<E: AgentExecutor + 'static> RequestHandler for DefaultRequestHandler<E> {
    async fn on_message_send(
        &self,
        params: MessageSendParams,
        context: &CallContext,
    ) -> Result<Event> {
        let history_length = params
            .configuration
            .as_ref()
            .and_then(|c| c.history_length);
        let (ctx, task_manager, queue) = self.prepare_send(params, context).await?;
        let task_id = ctx.task_id.clone();

        let handle = self.spawn_execute(ctx, Arc::clone(&queue));
        let aggregator = ResultAggregator::new(task_manager);
        let result = aggregator
            .consume_and_break_on_interrupt(&queue, context.cancellation_token())
            .await;

        let event = match result {
            Err(A2AError::AuthRequired) => {
                // the background drainer keeps settling the task; the
                // caller gets the 401-style short-circuit now
                return Err(A2AError::AuthRequired);
            }
            Err(err) => {
                let _ = handle.await;
                return Err(err);
            }
            Ok(event) => {
                let _ = handle.await;
                event
            }
        };

        match event {
            Some(Event::Task(mut task)) => {
                task.truncate_history(history_length);
                info!(task_id = %task_id, state = ?task.state(), "message send completed");
                Ok(Event::Task(task))
            }
            Some(event) => Ok(event),
            None => Err(A2AError::InvalidAgentResponse(
                "agent produced no result".into(),
            )),
        }
    }

    async fn on_message_stream(
        &self,
        params: MessageSendParams,
        context: &CallContext,
    ) -> Result<EventStream> {
        let (ctx, task_manager, queue) = self.prepare_send(params, context).await?;
        let task_id = ctx.task_id.clone();

        self.spawn_execute(ctx, Arc::clone(&queue));
        let aggregator = ResultAggregator::new(task_manager);
        let stream = aggregator.consume_and_emit(&queue, context.cancellation_token());

        info!(task_id = %task_id, "started streaming message");
        Ok(Box::pin(stream))
    }

    async fn on_get_task(&self, params: TaskQueryParams, _context: &CallContext) -> Result<Task> {
        let mut task = self
            .store
            .get(&params.id)
            .await?
            .ok_or_else(|| A2AError::TaskNotFound(params.id.clone()))?;
        task.truncate_history(params.history_length);
        Ok(task)
    }

    async fn on_cancel_task(&self, params: TaskIdParams, context: &CallContext) -> Result<Task> {
        let task = self
            .store
            .get(&params.id)
            .await?
            .ok_or_else(|| A2AError::TaskNotFound(params.id.clone()))?;
        if task.is_terminal() {
            return Err(A2AError::TaskNotCancelable(params.id.clone()));
        }

        let task_manager = TaskManager::new(Arc::clone(&self.store))
            .with_task_id(&task.id)
            .with_context_id(&task.context_id);

        // tap the live queue if one exists, else synthesize an ephemeral
        // queue scoped to this call
        let queue = match self.queue_manager.tap(&params.id).await {
            Ok(queue) => queue,
            Err(_) => Arc::new(EventQueue::new(DEFAULT_QUEUE_CAPACITY)),
        };

        let ctx = RequestContext::builder()
            .task_id(&task.id)
            .context_id(&task.context_id)
            .task(task)
            .call_context(Arc::new(context.clone()))
            .build()?;

        let handle = self.spawn_cancel(ctx, Arc::clone(&queue));
        let aggregator = ResultAggregator::new(task_manager);
        let result = aggregator
            .consume_all(&queue, context.cancellation_token())
            .await;
        let _ = handle.await;

        match result? {
            Some(Event::Task(task)) => {
                info!(task_id = %params.id, "task canceled");
                Ok(task)
            }
            _ => Err(A2AError::InvalidAgentResponse(
                "cancel did not produce a task".into(),
            )),
        }
    }

    async fn on_resubscribe(
        &self,
        params: TaskIdParams,
        context: &CallContext,
    ) -> Result<EventStream> {
        let task = match self.store.get(&params.id).await? {
            Some(task) => task,
            None => return Ok(error_stream(A2AError::TaskNotFound(params.id))),
        };

        // a resubscription must never create a queue
        let queue = match self.queue_manager.tap(&params.id).await {
            Ok(queue) => queue,
            Err(_) => return Ok(error_stream(A2AError::TaskNotFound(params.id))),
        };

        let task_manager = TaskManager::new(Arc::clone(&self.store))
            .with_task_id(&task.id)
            .with_context_id(&task.context_id);
        let aggregator = ResultAggregator::new(task_manager);
        let stream = aggregator.consume_and_emit(&queue, context.cancellation_token());

        info!(task_id = %params.id, "resubscribed to task");
        Ok(Box::pin(stream))
    }

    async fn on_set_push_notification_config(
        &self,
        params: TaskPushNotificationConfig,
        _context: &CallContext,
    ) -> Result<TaskPushNotificationConfig> {
        let notifier = self
            .push_notifier
            .as_ref()
            .ok_or_else(|| A2AError::PushNotificationNotSupported)?;
        self.store
            .get(&params.task_id)
            .await?
            .ok_or_else(|| A2AError::TaskNotFound(params.task_id.clone()))?;

        notifier
            .set_info(&params.task_id, &params.push_notification_config)
            .await?;
        Ok(params)
    }

    async fn on_get_push_notification_config(
        &self,
        params: TaskIdParams,
        _context: &CallContext,
    ) -> Result<TaskPushNotificationConfig> {
        let notifier = self
            .push_notifier
            .as_ref()
            .ok_or_else(|| A2AError::PushNotificationNotSupported)?;
        self.store
            .get(&params.id)
            .await?
            .ok_or_else(|| A2AError::TaskNotFound(params.id.clone()))?;

        let config = notifier.get_info(&params.id).await?;
        Ok(TaskPushNotificationConfig {
            task_id: params.id,
            push_notification_config: config,
        })
    }
}

/// Builds a stream that yields a single terminal Error envelope.
fn error_stream(err: A2AError) -> EventStream {
    Box::pin(futures::stream::once(async move {
        StreamEvent::Error(err)
    }))
}

#[cfg(test)]
mod tests {
    use super::super::{InMemoryPushNotifier, InMemoryTaskStore, StatusOptions, TaskUpdater};
    use super::*;
    use crate::types::{Message, PushNotificationConfig, TaskState, TaskStatus};
    use futures::StreamExt;

    /// Executor that completes every task with a final status update.
    struct CompletingAgent;

    #[async_trait]
    impl AgentExecutor for CompletingAgent {
        async fn execute(&self, ctx: &RequestContext, queue: Arc<EventQueue>) -> Result<()> {
            let updater = TaskUpdater::new(queue, &ctx.task_id, &ctx.context_id);
            updater.complete(StatusOptions::default());
            Ok(())
        }

        async fn cancel(&self, ctx: &RequestContext, queue: Arc<EventQueue>) -> Result<()> {
            let updater = TaskUpdater::new(queue, &ctx.task_id, &ctx.context_id);
            updater.update_status(
                TaskState::Completed,
                StatusOptions {
                    r#final: Some(true),
                    ..Default::default()
                },
            );
            Ok(())
        }
    }

    /// Executor whose execute fails outright.
    struct FailingAgent;

    #[async_trait]
    impl AgentExecutor for FailingAgent {
        async fn execute(&self, _ctx: &RequestContext, _queue: Arc<EventQueue>) -> Result<()> {
            Err(A2AError::Internal("agent exploded".into()))
        }

        async fn cancel(&self, _ctx: &RequestContext, _queue: Arc<EventQueue>) -> Result<()> {
            Err(A2AError::Internal("cancel exploded".into()))
        }
    }

    fn handler_with_store<E: AgentExecutor + 'static>(
        executor: E,
    ) -> (DefaultRequestHandler<E>, Arc<InMemoryTaskStore>) {
        let store = Arc::new(InMemoryTaskStore::new());
        let handler =
            DefaultRequestHandler::new(executor, Arc::clone(&store) as Arc<dyn TaskStore>);
        (handler, store)
    }

    fn send_params(task_id: &str, context_id: &str) -> MessageSendParams {
        MessageSendParams::new(
            Message::user_text("do the thing")
                .with_task_id(task_id)
                .with_context_id(context_id),
        )
    }

    #[tokio::test]
    async fn test_message_send_happy_path() {
        let (handler, store) = handler_with_store(CompletingAgent);
        store.save(&Task::new("1", "2")).await.unwrap();

        let result = handler
            .on_message_send(send_params("1", "2"), &CallContext::new())
            .await
            .unwrap();

        match result {
            Event::Task(task) => {
                assert_eq!(task.id, "1");
                assert_eq!(task.context_id, "2");
                assert_eq!(task.state(), TaskState::Completed);
                // incoming user message is in the history
                assert!(task
                    .history
                    .as_ref()
                    .unwrap()
                    .iter()
                    .any(|m| m.is_user()));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_message_send_new_task_generates_ids() {
        let (handler, store) = handler_with_store(CompletingAgent);

        let params = MessageSendParams::new(Message::user_text("hello"));
        let result = handler
            .on_message_send(params, &CallContext::new())
            .await
            .unwrap();

        match result {
            Event::Task(task) => {
                assert!(!task.id.is_empty());
                assert!(store.get(&task.id).await.unwrap().is_some());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_message_send_rejects_terminal_task() {
        let (handler, store) = handler_with_store(CompletingAgent);
        let task = Task::new("1", "2").with_status(TaskStatus::completed());
        store.save(&task).await.unwrap();

        let result = handler
            .on_message_send(send_params("1", "2"), &CallContext::new())
            .await;
        assert!(matches!(result, Err(A2AError::TaskTerminalState { .. })));
        // no queue was created for the rejected request
        assert!(handler.queue_manager.is_empty().await);
    }

    #[tokio::test]
    async fn test_message_send_rejects_invalid_message() {
        let (handler, _store) = handler_with_store(CompletingAgent);

        let mut message = Message::user_text("x");
        message.message_id = String::new();
        let result = handler
            .on_message_send(MessageSendParams::new(message), &CallContext::new())
            .await;
        assert!(matches!(result, Err(A2AError::JsonRpc(_))));

        let message = Message::user(vec![]);
        let result = handler
            .on_message_send(MessageSendParams::new(message), &CallContext::new())
            .await;
        assert!(matches!(result, Err(A2AError::JsonRpc(_))));
    }

    #[tokio::test]
    async fn test_message_send_executor_failure_surfaces() {
        let (handler, _store) = handler_with_store(FailingAgent);

        let result = handler
            .on_message_send(send_params("1", "2"), &CallContext::new())
            .await;
        assert!(matches!(result, Err(A2AError::Internal(_))));
    }

    #[tokio::test]
    async fn test_message_stream_emits_final_status() {
        let (handler, store) = handler_with_store(CompletingAgent);
        store.save(&Task::new("1", "2")).await.unwrap();

        let mut stream = handler
            .on_message_stream(send_params("1", "2"), &CallContext::new())
            .await
            .unwrap();

        match stream.next().await {
            Some(StreamEvent::Done(Event::StatusUpdate(update))) => {
                assert_eq!(update.task_id, "1");
                assert_eq!(update.context_id, "2");
                assert!(update.r#final);
                assert_eq!(update.status.state, TaskState::Completed);
            }
            other => panic!("unexpected envelope: {other:?}"),
        }
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_get_task() {
        let (handler, store) = handler_with_store(CompletingAgent);
        let mut task = Task::new("1", "2");
        for i in 0..4 {
            task.add_message(Message::user_text(format!("m{i}")));
        }
        store.save(&task).await.unwrap();

        let fetched = handler
            .on_get_task(TaskQueryParams::new("1"), &CallContext::new())
            .await
            .unwrap();
        assert_eq!(fetched.id, "1");
        assert_eq!(fetched.message_count(), 4);

        let mut params = TaskQueryParams::new("1");
        params.history_length = Some(2);
        let fetched = handler
            .on_get_task(params, &CallContext::new())
            .await
            .unwrap();
        assert_eq!(fetched.message_count(), 2);
    }

    #[tokio::test]
    async fn test_get_task_not_found() {
        let (handler, _store) = handler_with_store(CompletingAgent);
        let result = handler
            .on_get_task(TaskQueryParams::new("missing"), &CallContext::new())
            .await;
        assert!(matches!(result, Err(A2AError::TaskNotFound(_))));
    }

    #[tokio::test]
    async fn test_cancel_task() {
        let (handler, store) = handler_with_store(CompletingAgent);
        store.save(&Task::new("1", "2")).await.unwrap();

        let task = handler
            .on_cancel_task(TaskIdParams::new("1"), &CallContext::new())
            .await
            .unwrap();
        assert_eq!(task.id, "1");
        assert_eq!(task.context_id, "2");
    }

    #[tokio::test]
    async fn test_cancel_missing_task() {
        let (handler, _store) = handler_with_store(CompletingAgent);
        let result = handler
            .on_cancel_task(TaskIdParams::new("missing"), &CallContext::new())
            .await;
        assert!(matches!(result, Err(A2AError::TaskNotFound(_))));
    }

    #[tokio::test]
    async fn test_cancel_terminal_task_not_cancelable() {
        let (handler, store) = handler_with_store(CompletingAgent);
        let task = Task::new("1", "2").with_status(TaskStatus::completed());
        store.save(&task).await.unwrap();

        let result = handler
            .on_cancel_task(TaskIdParams::new("1"), &CallContext::new())
            .await;
        assert!(matches!(result, Err(A2AError::TaskNotCancelable(_))));
    }

    #[tokio::test]
    async fn test_resubscribe_unknown_task_yields_error_envelope() {
        let (handler, _store) = handler_with_store(CompletingAgent);

        let mut stream = handler
            .on_resubscribe(TaskIdParams::new("missing"), &CallContext::new())
            .await
            .unwrap();
        match stream.next().await {
            Some(StreamEvent::Error(A2AError::TaskNotFound(id))) => assert_eq!(id, "missing"),
            other => panic!("unexpected envelope: {other:?}"),
        }
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_resubscribe_observes_in_flight_events() {
        let (handler, store) = handler_with_store(CompletingAgent);
        store.save(&Task::new("1", "2")).await.unwrap();

        // simulate an in-flight task with a live queue
        let parent = handler.queue_manager.create_or_tap("1").await;

        let mut stream = handler
            .on_resubscribe(TaskIdParams::new("1"), &CallContext::new())
            .await
            .unwrap();

        let event = Task::new("1", "2").with_status(TaskStatus::completed());
        parent.enqueue_done(Event::Task(event));

        match stream.next().await {
            Some(StreamEvent::Done(Event::Task(task))) => assert_eq!(task.id, "1"),
            other => panic!("unexpected envelope: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_push_config_without_notifier_is_unsupported() {
        let (handler, store) = handler_with_store(CompletingAgent);
        store.save(&Task::new("1", "2")).await.unwrap();

        let params = TaskPushNotificationConfig {
            task_id: "1".into(),
            push_notification_config: PushNotificationConfig::new("https://client.example/hook"),
        };
        let result = handler
            .on_set_push_notification_config(params, &CallContext::new())
            .await;
        assert!(matches!(
            result,
            Err(A2AError::PushNotificationNotSupported)
        ));
    }

    #[tokio::test]
    async fn test_push_config_set_and_get() {
        let store = Arc::new(InMemoryTaskStore::new());
        let handler =
            DefaultRequestHandler::new(CompletingAgent, Arc::clone(&store) as Arc<dyn TaskStore>)
                .with_push_notifier(Arc::new(InMemoryPushNotifier::new()));
        store.save(&Task::new("1", "2")).await.unwrap();

        let params = TaskPushNotificationConfig {
            task_id: "1".into(),
            push_notification_config: PushNotificationConfig::new("https://client.example/hook"),
        };
        handler
            .on_set_push_notification_config(params, &CallContext::new())
            .await
            .unwrap();

        let fetched = handler
            .on_get_push_notification_config(TaskIdParams::new("1"), &CallContext::new())
            .await
            .unwrap();
        assert_eq!(
            fetched.push_notification_config.url,
            "https://client.example/hook"
        );
    }

    #[tokio::test]
    async fn test_push_config_for_missing_task() {
        let store = Arc::new(InMemoryTaskStore::new());
        let handler =
            DefaultRequestHandler::new(CompletingAgent, Arc::clone(&store) as Arc<dyn TaskStore>)
                .with_push_notifier(Arc::new(InMemoryPushNotifier::new()));

        let result = handler
            .on_get_push_notification_config(TaskIdParams::new("missing"), &CallContext::new())
            .await;
        assert!(matches!(result, Err(A2AError::TaskNotFound(_))));
    }
}
