use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::config::WebhookConfig;
use crate::error::WorkflowError;

use super::{WorkflowAction, WorkflowTrigger};

/// Production trigger: posts the payload as JSON to the endpoint configured
/// for the action. The response body is parsed when it is JSON and replaced
/// with an empty object otherwise, matching what the automation actually
/// returns for fire-and-forget actions.
pub struct HttpWorkflowTrigger {
    client: reqwest::Client,
    config: WebhookConfig,
}

impl HttpWorkflowTrigger {
    pub fn new(config: WebhookConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl WorkflowTrigger for HttpWorkflowTrigger {
    fn is_configured(&self, action: WorkflowAction) -> bool {
        self.config.endpoint(action).is_some()
    }

    #[instrument(skip(self, payload), fields(action = %action))]
    async fn trigger(&self, action: WorkflowAction, payload: Value) -> Result<Value, WorkflowError> {
        let Some(endpoint) = self.config.endpoint(action) else {
            error!("Endpoint not configured");
            return Err(WorkflowError::NotConfigured(action));
        };

        debug!(endpoint, "Firing webhook");
        let response = self
            .client
            .post(endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|source| WorkflowError::Transport { action, source })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = status.as_u16(), "Webhook rejected the call");
            return Err(WorkflowError::Rejected {
                action,
                status: status.as_u16(),
            });
        }

        Ok(response.json().await.unwrap_or_else(|_| Value::Object(Default::default())))
    }
}
