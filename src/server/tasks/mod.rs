//! Task persistence and the task-side server components.

mod aggregator;
mod manager;
mod updater;

pub use aggregator::*;
pub use manager::*;
pub use updater::*;

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::types::Task;

/// Persistence contract for tasks.
///
/// Implementations must be safe for concurrent access across requests.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Saves or updates a task in the store.
    async fn save(&self, task: &Task) -> Result<()>;

    /// Retrieves a task from the store by ID, or `None` if absent.
    async fn get(&self, task_id: &str) -> Result<Option<Task>>;

    /// Deletes a task from the store by ID.
    async fn delete(&self, task_id: &str) -> Result<()>;
}

/// In-memory implementation of [`TaskStore`].
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<String, Task>>,
}

impl InMemoryTaskStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn save(&self, task: &Task) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn get(&self, task_id: &str) -> Result<Option<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(task_id).cloned())
    }

    async fn delete(&self, task_id: &str) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        tasks.remove(task_id);
        Ok(())
    }
}
