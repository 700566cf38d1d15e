//! Per-task event queues and the queue registry.
//!
//! An [`EventQueue`] multiplexes a single producer (the agent executor)
//! with one or more consumers. Subscribers receive [`StreamEvent`]
//! envelopes; child queues created with [`EventQueue::tap`] observe the
//! same tail of events as the parent, which is how resubscription and
//! late observers attach to an in-flight task.
//!
//! The [`QueueManager`] maps task IDs to parent queues. Lock ordering is
//! manager → queue; no queue ever acquires the manager's lock.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::Stream;
use tokio::sync::{mpsc, OwnedMutexGuard, RwLock};
use tokio_util::sync::CancellationToken;

use crate::error::{A2AError, Result};
use crate::types::{Event, StreamEvent};

/// A boxed stream of [`StreamEvent`] envelopes.
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Default buffer capacity for a queue, sized for moderate bursts.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// A bounded, closable event channel for a single task.
///
/// Enqueue never blocks: under burst, intermediate events are dropped in
/// favor of keeping the executor forward-progressing. One buffer slot is
/// held back for terminal Done/Error envelopes so a full buffer cannot
/// swallow the end of a stream.
#[derive(Debug)]
pub struct EventQueue {
    tx: Mutex<Option<mpsc::Sender<StreamEvent>>>,
    rx: Arc<tokio::sync::Mutex<mpsc::Receiver<StreamEvent>>>,
    closed: AtomicBool,
    children: Mutex<Vec<Arc<EventQueue>>>,
    capacity: usize,
}

impl EventQueue {
    /// Creates a new event queue with the specified buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        // +1 is the slot reserved for a terminal envelope
        let (tx, rx) = mpsc::channel(capacity + 1);
        Self {
            tx: Mutex::new(Some(tx)),
            rx: Arc::new(tokio::sync::Mutex::new(rx)),
            closed: AtomicBool::new(false),
            children: Mutex::new(Vec::new()),
            capacity,
        }
    }

    /// Returns the configured buffer capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true once the queue has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Enqueues an event, classifying it as Data or Done.
    ///
    /// Returns false if the queue is closed or the buffer is full; the
    /// producer treats that as a dropped intermediate update.
    pub fn enqueue(&self, event: Event) -> bool {
        if self.is_closed() {
            return false;
        }
        if event.done() {
            return self.enqueue_done(event);
        }
        let accepted = self.try_send(StreamEvent::Data(event.clone()), false);
        if accepted {
            self.forward(|child| child.enqueue(event.clone()));
        } else {
            tracing::debug!(task_id = ?event.task_id(), "dropped intermediate event: queue full");
        }
        accepted
    }

    /// Enqueues an event as an explicit terminal Done envelope.
    ///
    /// May use the reserved buffer slot so that a full buffer does not
    /// drop the terminal event.
    pub fn enqueue_done(&self, event: Event) -> bool {
        if self.is_closed() {
            return false;
        }
        let accepted = self.try_send(StreamEvent::Done(event.clone()), true);
        if accepted {
            self.forward(|child| child.enqueue_done(event.clone()));
        }
        accepted
    }

    /// Enqueues a terminal Error envelope. No further Data is expected.
    pub fn enqueue_error(&self, err: A2AError) -> bool {
        if self.is_closed() {
            return false;
        }
        let accepted = self.try_send(StreamEvent::Error(err.clone()), true);
        if accepted {
            self.forward(|child| child.enqueue_error(err.clone()));
        }
        accepted
    }

    fn try_send(&self, envelope: StreamEvent, allow_reserved: bool) -> bool {
        let sender = match self.tx.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => return false,
        };
        let Some(sender) = sender else {
            return false;
        };
        if !allow_reserved && sender.capacity() <= 1 {
            return false;
        }
        sender.try_send(envelope).is_ok()
    }

    /// Applies `f` to every live child. Enqueue failures in children are
    /// ignored; a slow child loses intermediate events.
    fn forward<F: FnMut(&Arc<EventQueue>) -> bool>(&self, mut f: F) {
        let children = match self.children.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => return,
        };
        for child in &children {
            let _ = f(child);
        }
    }

    /// Creates a child queue attached to this one.
    ///
    /// Every event subsequently enqueued into the parent is also
    /// enqueued into the child. Closing the parent closes the child.
    pub fn tap(self: &Arc<Self>) -> Arc<EventQueue> {
        let child = Arc::new(EventQueue::new(self.capacity));
        if let Ok(mut children) = self.children.lock() {
            children.push(Arc::clone(&child));
        }
        if self.is_closed() {
            child.close();
        }
        child
    }

    /// Returns a lazy stream of envelopes drained from the queue buffer.
    ///
    /// The stream pulls one envelope at a time and holds the buffer
    /// exclusively while alive; dropping it mid-stream leaves undrained
    /// envelopes for the next subscriber. It terminates after yielding a
    /// Done or Error envelope, after a Closed envelope when the queue
    /// closes, or after a Canceled envelope when `cancel` fires.
    pub fn subscribe(self: &Arc<Self>, cancel: CancellationToken) -> EventStream {
        enum State {
            Init(Arc<tokio::sync::Mutex<mpsc::Receiver<StreamEvent>>>, CancellationToken),
            Active(OwnedMutexGuard<mpsc::Receiver<StreamEvent>>, CancellationToken),
            Terminated,
        }

        fn canceled() -> StreamEvent {
            StreamEvent::Canceled(A2AError::Canceled("client disconnected".into()))
        }

        let state = State::Init(Arc::clone(&self.rx), cancel);
        Box::pin(futures::stream::unfold(state, |state| async move {
            let (mut guard, cancel) = match state {
                State::Terminated => return None,
                State::Active(guard, cancel) => (guard, cancel),
                State::Init(rx, cancel) => {
                    let guard = tokio::select! {
                        _ = cancel.cancelled() => {
                            return Some((canceled(), State::Terminated));
                        }
                        guard = rx.lock_owned() => guard,
                    };
                    (guard, cancel)
                }
            };

            let received = tokio::select! {
                _ = cancel.cancelled() => {
                    return Some((canceled(), State::Terminated));
                }
                received = guard.recv() => received,
            };
            match received {
                Some(envelope) => {
                    let terminal =
                        matches!(envelope, StreamEvent::Done(_) | StreamEvent::Error(_));
                    let next = if terminal {
                        State::Terminated
                    } else {
                        State::Active(guard, cancel)
                    };
                    Some((envelope, next))
                }
                None => Some((StreamEvent::Closed, State::Terminated)),
            }
        }))
    }

    /// Closes the queue. Idempotent and safe from any task.
    ///
    /// Buffered envelopes remain readable; once drained, subscriptions
    /// receive a Closed envelope. All children close transitively.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Ok(mut sender) = self.tx.lock() {
            sender.take();
        }
        if let Ok(children) = self.children.lock() {
            for child in children.iter() {
                child.close();
            }
        }
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

/// Registry mapping task IDs to their parent event queues.
///
/// At most one parent queue exists per task ID; additional observers
/// attach through taps.
#[derive(Debug)]
pub struct QueueManager {
    queues: RwLock<HashMap<String, Arc<EventQueue>>>,
    capacity: usize,
}

impl QueueManager {
    /// Creates a new queue manager with the default queue capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Creates a new queue manager with the specified queue capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Registers a queue for a task ID.
    pub async fn add(&self, task_id: &str, queue: Arc<EventQueue>) -> Result<()> {
        let mut queues = self.queues.write().await;
        if queues.contains_key(task_id) {
            return Err(A2AError::QueueExists(task_id.to_string()));
        }
        queues.insert(task_id.to_string(), queue);
        Ok(())
    }

    /// Retrieves the parent queue for a task ID.
    pub async fn get(&self, task_id: &str) -> Result<Arc<EventQueue>> {
        let queues = self.queues.read().await;
        queues
            .get(task_id)
            .cloned()
            .ok_or_else(|| A2AError::QueueNotFound(task_id.to_string()))
    }

    /// Creates a child queue attached to the task's parent queue.
    pub async fn tap(&self, task_id: &str) -> Result<Arc<EventQueue>> {
        let parent = self.get(task_id).await?;
        Ok(parent.tap())
    }

    /// Closes and removes the queue for a task ID. A no-op if absent.
    pub async fn close(&self, task_id: &str) {
        let removed = {
            let mut queues = self.queues.write().await;
            queues.remove(task_id)
        };
        if let Some(queue) = removed {
            queue.close();
        }
    }

    /// Returns the task's queue, creating a parent if none exists or
    /// tapping the live one if it does.
    ///
    /// A closed parent left behind by a finished run is replaced with a
    /// fresh queue rather than tapped.
    pub async fn create_or_tap(&self, task_id: &str) -> Arc<EventQueue> {
        let mut queues = self.queues.write().await;
        if let Some(existing) = queues.get(task_id) {
            if !existing.is_closed() {
                return existing.tap();
            }
        }
        let queue = Arc::new(EventQueue::new(self.capacity));
        queues.insert(task_id.to_string(), Arc::clone(&queue));
        queue
    }

    /// Returns the number of registered queues.
    pub async fn len(&self) -> usize {
        self.queues.read().await.len()
    }

    /// Returns true if no queues are registered.
    pub async fn is_empty(&self) -> bool {
        self.queues.read().await.is_empty()
    }
}

impl Default for QueueManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, Task, TaskStatus, TaskStatusUpdateEvent};
    use futures::StreamExt;

    fn working_update(task_id: &str) -> Event {
        Event::StatusUpdate(TaskStatusUpdateEvent::new(
            task_id,
            "ctx-1",
            TaskStatus::working(),
            false,
        ))
    }

    fn final_update(task_id: &str) -> Event {
        Event::StatusUpdate(TaskStatusUpdateEvent::new(
            task_id,
            "ctx-1",
            TaskStatus::completed(),
            true,
        ))
    }

    #[tokio::test]
    async fn test_enqueue_and_subscribe() {
        let queue = Arc::new(EventQueue::new(10));
        assert!(queue.enqueue(working_update("t1")));
        assert!(queue.enqueue(final_update("t1")));

        let mut sub = queue.subscribe(CancellationToken::new());
        assert!(matches!(sub.next().await, Some(StreamEvent::Data(_))));
        assert!(matches!(sub.next().await, Some(StreamEvent::Done(_))));
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn test_enqueue_after_close_returns_false() {
        let queue = EventQueue::new(10);
        queue.close();
        assert!(!queue.enqueue(working_update("t1")));
        assert!(!queue.enqueue_done(final_update("t1")));
        assert!(!queue.enqueue_error(A2AError::Internal("boom".into())));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let queue = EventQueue::new(10);
        queue.close();
        queue.close();
        assert!(queue.is_closed());
    }

    #[tokio::test]
    async fn test_close_delivers_closed_envelope() {
        let queue = Arc::new(EventQueue::new(10));
        queue.enqueue(working_update("t1"));
        queue.close();

        let mut sub = queue.subscribe(CancellationToken::new());
        assert!(matches!(sub.next().await, Some(StreamEvent::Data(_))));
        assert!(matches!(sub.next().await, Some(StreamEvent::Closed)));
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn test_cancellation_yields_canceled_envelope() {
        let queue = Arc::new(EventQueue::new(10));
        let cancel = CancellationToken::new();
        let mut sub = queue.subscribe(cancel.clone());
        cancel.cancel();
        assert!(matches!(sub.next().await, Some(StreamEvent::Canceled(_))));
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn test_error_envelope_terminates_subscription() {
        let queue = Arc::new(EventQueue::new(10));
        queue.enqueue_error(A2AError::Internal("executor failed".into()));
        queue.enqueue(working_update("t1"));

        let mut sub = queue.subscribe(CancellationToken::new());
        assert!(matches!(sub.next().await, Some(StreamEvent::Error(_))));
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn test_terminal_event_uses_reserved_slot() {
        let queue = EventQueue::new(1);
        assert!(queue.enqueue(working_update("t1")));
        // buffer full for data
        assert!(!queue.enqueue(working_update("t1")));
        // terminal still accepted
        assert!(queue.enqueue_done(final_update("t1")));
    }

    #[tokio::test]
    async fn test_child_sees_parent_events() {
        let parent = Arc::new(EventQueue::new(10));
        let child = parent.tap();

        parent.enqueue(working_update("t1"));
        parent.enqueue_done(final_update("t1"));

        let mut sub = child.subscribe(CancellationToken::new());
        assert!(matches!(sub.next().await, Some(StreamEvent::Data(_))));
        assert!(matches!(sub.next().await, Some(StreamEvent::Done(_))));
    }

    #[tokio::test]
    async fn test_parent_close_closes_children() {
        let parent = Arc::new(EventQueue::new(10));
        let child = parent.tap();
        let grandchild = child.tap();

        parent.close();
        assert!(child.is_closed());
        assert!(grandchild.is_closed());
    }

    #[tokio::test]
    async fn test_tap_of_closed_queue_is_closed() {
        let parent = Arc::new(EventQueue::new(10));
        parent.close();
        let child = parent.tap();
        assert!(child.is_closed());
    }

    #[tokio::test]
    async fn test_message_event_is_terminal() {
        let queue = Arc::new(EventQueue::new(10));
        queue.enqueue(Event::Message(Message::agent_text("hi")));

        let mut sub = queue.subscribe(CancellationToken::new());
        assert!(matches!(sub.next().await, Some(StreamEvent::Done(_))));
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn test_queue_manager_add_get_close() {
        let manager = QueueManager::new();
        let queue = Arc::new(EventQueue::new(10));

        manager.add("t1", Arc::clone(&queue)).await.unwrap();
        assert!(matches!(
            manager.add("t1", Arc::new(EventQueue::new(10))).await,
            Err(A2AError::QueueExists(_))
        ));

        let fetched = manager.get("t1").await.unwrap();
        assert!(Arc::ptr_eq(&queue, &fetched));

        manager.close("t1").await;
        assert!(queue.is_closed());
        assert!(matches!(
            manager.get("t1").await,
            Err(A2AError::QueueNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_queue_manager_tap_requires_parent() {
        let manager = QueueManager::new();
        assert!(matches!(
            manager.tap("missing").await,
            Err(A2AError::QueueNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_or_tap() {
        let manager = QueueManager::new();
        let parent = manager.create_or_tap("t1").await;
        assert_eq!(manager.len().await, 1);

        // second call taps, the registry still holds one parent
        let child = manager.create_or_tap("t1").await;
        assert!(!Arc::ptr_eq(&parent, &child));
        assert_eq!(manager.len().await, 1);

        parent.enqueue_done(Event::Task(Task::new("t1", "c1")));
        let mut sub = child.subscribe(CancellationToken::new());
        assert!(matches!(sub.next().await, Some(StreamEvent::Done(_))));
    }

    #[tokio::test]
    async fn test_create_or_tap_replaces_closed_parent() {
        let manager = QueueManager::new();
        let first = manager.create_or_tap("t1").await;
        first.close();

        let second = manager.create_or_tap("t1").await;
        assert!(!second.is_closed());
        assert!(second.enqueue(working_update("t1")));
    }
}
