//! Push notification collaborator.
//!
//! Stores per-task push notification configurations and delivers task
//! state to the configured webhook endpoints. The server core only
//! consults the trait; delivery details live in the implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{A2AError, Result};
use crate::types::{PushNotificationConfig, Task};

/// Stores and delivers push notifications for tasks.
#[async_trait]
pub trait PushNotifier: Send + Sync {
    /// Sets or updates the push notification configuration for a task.
    async fn set_info(&self, task_id: &str, config: &PushNotificationConfig) -> Result<()>;

    /// Retrieves the push notification configuration for a task.
    async fn get_info(&self, task_id: &str) -> Result<PushNotificationConfig>;

    /// Deletes the push notification configuration for a task.
    async fn delete(&self, task_id: &str) -> Result<()>;

    /// Sends a push notification containing the latest task state.
    async fn send_notification(&self, task: &Task) -> Result<()>;
}

/// In-memory [`PushNotifier`] that stores configurations without
/// delivering anything. Useful for tests and single-process setups.
#[derive(Debug, Default)]
pub struct InMemoryPushNotifier {
    configs: RwLock<HashMap<String, PushNotificationConfig>>,
}

impl InMemoryPushNotifier {
    /// Creates a new empty notifier.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PushNotifier for InMemoryPushNotifier {
    async fn set_info(&self, task_id: &str, config: &PushNotificationConfig) -> Result<()> {
        validate_config(config)?;
        let mut configs = self.configs.write().await;
        configs.insert(task_id.to_string(), config.clone());
        Ok(())
    }

    async fn get_info(&self, task_id: &str) -> Result<PushNotificationConfig> {
        let configs = self.configs.read().await;
        configs
            .get(task_id)
            .cloned()
            .ok_or_else(|| A2AError::TaskNotFound(task_id.to_string()))
    }

    async fn delete(&self, task_id: &str) -> Result<()> {
        let mut configs = self.configs.write().await;
        configs.remove(task_id);
        Ok(())
    }

    async fn send_notification(&self, _task: &Task) -> Result<()> {
        Ok(())
    }
}

/// [`PushNotifier`] that POSTs the task snapshot as JSON to the
/// configured webhook URL.
pub struct WebhookPushNotifier {
    client: reqwest::Client,
    configs: RwLock<HashMap<String, PushNotificationConfig>>,
}

impl WebhookPushNotifier {
    /// Creates a notifier with a default HTTP client (30s timeout).
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self::with_client(client)
    }

    /// Creates a notifier with a custom HTTP client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            configs: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for WebhookPushNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PushNotifier for WebhookPushNotifier {
    async fn set_info(&self, task_id: &str, config: &PushNotificationConfig) -> Result<()> {
        validate_config(config)?;
        let mut configs = self.configs.write().await;
        configs.insert(task_id.to_string(), config.clone());
        Ok(())
    }

    async fn get_info(&self, task_id: &str) -> Result<PushNotificationConfig> {
        let configs = self.configs.read().await;
        configs
            .get(task_id)
            .cloned()
            .ok_or_else(|| A2AError::TaskNotFound(task_id.to_string()))
    }

    async fn delete(&self, task_id: &str) -> Result<()> {
        let mut configs = self.configs.write().await;
        configs.remove(task_id);
        Ok(())
    }

    async fn send_notification(&self, task: &Task) -> Result<()> {
        let config = self.get_info(&task.id).await?;

        let mut request = self.client.post(&config.url).json(task);
        if let Some(ref token) = config.token {
            request = request.header("X-A2A-Notification-Token", token);
        }
        if let Some(ref auth) = config.authentication {
            if let Some(ref credentials) = auth.credentials {
                for scheme in &auth.schemes {
                    match scheme.to_lowercase().as_str() {
                        "bearer" => {
                            request =
                                request.header("Authorization", format!("Bearer {credentials}"));
                            break;
                        }
                        "basic" => {
                            request =
                                request.header("Authorization", format!("Basic {credentials}"));
                            break;
                        }
                        _ => {}
                    }
                }
            }
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            tracing::error!(
                task_id = %task.id,
                status = %response.status(),
                "push notification endpoint returned non-success status"
            );
        }
        Ok(())
    }
}

fn validate_config(config: &PushNotificationConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(A2AError::JsonRpc(
            crate::error::JsonRpcError::invalid_params("push config URL cannot be empty"),
        ));
    }
    if !config.url.starts_with("http://") && !config.url.starts_with("https://") {
        return Err(A2AError::JsonRpc(
            crate::error::JsonRpcError::invalid_params("push config URL must be http or https"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_notifier_roundtrip() {
        let notifier = InMemoryPushNotifier::new();
        let config = PushNotificationConfig::new("https://client.example/hook");

        notifier.set_info("t1", &config).await.unwrap();
        let fetched = notifier.get_info("t1").await.unwrap();
        assert_eq!(fetched.url, "https://client.example/hook");

        notifier.delete("t1").await.unwrap();
        assert!(notifier.get_info("t1").await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let notifier = InMemoryPushNotifier::new();
        let config = PushNotificationConfig::new("ftp://nope");
        assert!(notifier.set_info("t1", &config).await.is_err());

        let config = PushNotificationConfig::new("");
        assert!(notifier.set_info("t1", &config).await.is_err());
    }
}
