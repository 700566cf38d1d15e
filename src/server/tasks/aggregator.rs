//! Consumer strategies over a queue subscription.
//!
//! Three strategies share the same input (a subscription to an
//! [`EventQueue`]) and mutation surface (the per-request [`TaskManager`])
//! but expose different outputs:
//!
//! - [`consume_all`](ResultAggregator::consume_all): drain the entire
//!   stream and return a single final event (synchronous send, cancel).
//! - [`consume_and_emit`](ResultAggregator::consume_and_emit): persist
//!   each event and pass the envelope through downstream (SSE).
//! - [`consume_and_break_on_interrupt`](ResultAggregator::consume_and_break_on_interrupt):
//!   drain until an `auth_required` state, then hand the remainder to a
//!   background drainer and return early.

use std::sync::{Arc, Mutex as StdMutex};

use futures::StreamExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use super::TaskManager;
use crate::error::{A2AError, Result};
use crate::server::EventQueue;
use crate::types::{Event, StreamEvent, TaskState};

const DEFAULT_BATCH_SIZE: usize = 10;

/// Translates the raw event stream of one request into its external
/// contract, feeding every event through the task manager on the way.
pub struct ResultAggregator {
    manager: Arc<Mutex<TaskManager>>,
    batch_size: usize,
    background: StdMutex<Option<JoinHandle<()>>>,
}

impl ResultAggregator {
    /// Creates an aggregator around a per-request task manager.
    pub fn new(manager: TaskManager) -> Self {
        Self {
            manager: Arc::new(Mutex::new(manager)),
            batch_size: DEFAULT_BATCH_SIZE,
            background: StdMutex::new(None),
        }
    }

    /// Sets the buffer size of the downstream channel used by
    /// [`consume_and_emit`](Self::consume_and_emit).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Consumes the entire stream and returns the final event.
    ///
    /// A direct agent message short-circuits immediately. A Done
    /// envelope is processed and answered with the materialized task.
    /// Closed yields the current task, which may be absent.
    pub async fn consume_all(
        &self,
        queue: &Arc<EventQueue>,
        cancel: CancellationToken,
    ) -> Result<Option<Event>> {
        let mut subscription = queue.subscribe(cancel);
        while let Some(envelope) = subscription.next().await {
            match envelope {
                StreamEvent::Canceled(cause) => return Err(cause),
                StreamEvent::Error(err) => return Err(err),
                StreamEvent::Data(Event::Message(message))
                | StreamEvent::Done(Event::Message(message)) => {
                    return Ok(Some(Event::Message(message)));
                }
                StreamEvent::Done(event) => {
                    let mut manager = self.manager.lock().await;
                    manager.process(event).await?;
                    return Ok(manager.get_task().await?.map(Event::Task));
                }
                StreamEvent::Data(event) => {
                    self.manager.lock().await.process(event).await?;
                }
                StreamEvent::Closed => return self.current_task().await,
            }
        }
        Ok(None)
    }

    /// Consumes the stream, persisting each event and re-emitting the
    /// envelope downstream unchanged.
    ///
    /// A processing failure is converted into a terminal Error envelope.
    /// The downstream channel is bounded; emission suspends when it is
    /// full and stops once the consumer disconnects.
    pub fn consume_and_emit(
        &self,
        queue: &Arc<EventQueue>,
        cancel: CancellationToken,
    ) -> ReceiverStream<StreamEvent> {
        let (out_tx, out_rx) = mpsc::channel(self.batch_size);
        let mut subscription = queue.subscribe(cancel.clone());
        let manager = Arc::clone(&self.manager);

        tokio::spawn(async move {
            while let Some(envelope) = subscription.next().await {
                let (outgoing, terminal) = match envelope {
                    StreamEvent::Closed => return,
                    // a message response ends the interaction untouched
                    StreamEvent::Done(Event::Message(message)) => {
                        (StreamEvent::Done(Event::Message(message)), true)
                    }
                    StreamEvent::Data(event) => {
                        match manager.lock().await.process(event).await {
                            Ok(event) => (StreamEvent::Data(event), false),
                            Err(err) => (StreamEvent::Error(err), true),
                        }
                    }
                    StreamEvent::Done(event) => {
                        match manager.lock().await.process(event).await {
                            Ok(event) => (StreamEvent::Done(event), true),
                            Err(err) => (StreamEvent::Error(err), true),
                        }
                    }
                    terminal_envelope @ (StreamEvent::Error(_) | StreamEvent::Canceled(_)) => {
                        (terminal_envelope, true)
                    }
                };

                tokio::select! {
                    _ = cancel.cancelled() => return,
                    sent = out_tx.send(outgoing) => {
                        if sent.is_err() {
                            return;
                        }
                    }
                }
                if terminal {
                    return;
                }
            }
        });

        ReceiverStream::new(out_rx)
    }

    /// Consumes the stream like [`consume_all`](Self::consume_all) until
    /// an event reports the `auth_required` state.
    ///
    /// On auth-required, the event is not processed on the foreground
    /// path; a background drainer keeps consuming the remaining stream
    /// into the task manager, and the caller receives
    /// [`A2AError::AuthRequired`] so the transport can answer with a
    /// 401-style response while the task settles durably.
    pub async fn consume_and_break_on_interrupt(
        &self,
        queue: &Arc<EventQueue>,
        cancel: CancellationToken,
    ) -> Result<Option<Event>> {
        let mut subscription = queue.subscribe(cancel.clone());
        while let Some(envelope) = subscription.next().await {
            match envelope {
                StreamEvent::Canceled(cause) => return Err(cause),
                StreamEvent::Error(err) => return Err(err),
                StreamEvent::Data(Event::Message(message))
                | StreamEvent::Done(Event::Message(message)) => {
                    return Ok(Some(Event::Message(message)));
                }
                StreamEvent::Done(event) => {
                    let mut manager = self.manager.lock().await;
                    manager.process(event).await?;
                    return Ok(manager.get_task().await?.map(Event::Task));
                }
                StreamEvent::Data(event) => {
                    if is_auth_required(&event) {
                        tracing::debug!(
                            task_id = ?event.task_id(),
                            "auth required: breaking synchronous flow, draining in background"
                        );
                        drop(subscription);
                        self.spawn_background_drain(queue, cancel);
                        return Err(A2AError::AuthRequired);
                    }
                    self.manager.lock().await.process(event).await?;
                }
                StreamEvent::Closed => return self.current_task().await,
            }
        }
        self.current_task().await
    }

    /// Returns the join handle of the background drainer, if one was
    /// spawned by the last interruptible drain.
    pub fn take_background_handle(&self) -> Option<JoinHandle<()>> {
        self.background.lock().ok().and_then(|mut slot| slot.take())
    }

    fn spawn_background_drain(&self, queue: &Arc<EventQueue>, cancel: CancellationToken) {
        let mut subscription = queue.subscribe(cancel);
        let manager = Arc::clone(&self.manager);
        let handle = tokio::spawn(async move {
            while let Some(envelope) = subscription.next().await {
                match envelope {
                    StreamEvent::Closed | StreamEvent::Canceled(_) | StreamEvent::Error(_) => {
                        return;
                    }
                    StreamEvent::Done(Event::Message(_)) => return,
                    StreamEvent::Data(Event::Message(_)) => {}
                    StreamEvent::Data(event) => {
                        if let Err(err) = manager.lock().await.process(event).await {
                            tracing::warn!(error = %err, "background drain stopped");
                            return;
                        }
                    }
                    StreamEvent::Done(event) => {
                        if let Err(err) = manager.lock().await.process(event).await {
                            tracing::warn!(error = %err, "background drain stopped");
                        }
                        return;
                    }
                }
            }
        });
        if let Ok(mut slot) = self.background.lock() {
            *slot = Some(handle);
        }
    }

    async fn current_task(&self) -> Result<Option<Event>> {
        let mut manager = self.manager.lock().await;
        match manager.get_task().await {
            Ok(task) => Ok(task.map(Event::Task)),
            Err(A2AError::TaskIdNotSet) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Returns true if the event reports an `auth_required` task state.
fn is_auth_required(event: &Event) -> bool {
    match event {
        Event::StatusUpdate(update) => update.status.state == TaskState::AuthRequired,
        Event::Task(task) => task.status.state == TaskState::AuthRequired,
        _ => false,
    }
}
