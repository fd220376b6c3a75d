//! # Mock Framework
//!
//! Utilities for testing the write paths in isolation.
//!
//! Use [`create_mock_workflow`] to get a [`WorkflowTrigger`] and a receiver.
//! Every `trigger` call shows up on the receiver together with a oneshot
//! responder, so a test can inspect the outbound payload and script the
//! automation's reply (success, failure, delay) deterministically.

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::error::WorkflowError;
use crate::workflow::{WorkflowAction, WorkflowTrigger};

/// One outbound call captured by the mock.
pub struct TriggeredCall {
    pub action: WorkflowAction,
    pub payload: Value,
    pub respond_to: oneshot::Sender<Result<Value, WorkflowError>>,
}

pub struct MockWorkflow {
    sender: mpsc::Sender<TriggeredCall>,
    unconfigured: HashSet<WorkflowAction>,
}

impl MockWorkflow {
    /// Marks an action as having no endpoint, for configuration-error tests.
    pub fn unconfigure(mut self, action: WorkflowAction) -> Self {
        self.unconfigured.insert(action);
        self
    }
}

pub fn create_mock_workflow(buffer_size: usize) -> (MockWorkflow, mpsc::Receiver<TriggeredCall>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (
        MockWorkflow {
            sender,
            unconfigured: HashSet::new(),
        },
        receiver,
    )
}

/// Waits for the next outbound call.
pub async fn expect_trigger(receiver: &mut mpsc::Receiver<TriggeredCall>) -> Option<TriggeredCall> {
    receiver.recv().await
}

#[async_trait]
impl WorkflowTrigger for MockWorkflow {
    fn is_configured(&self, action: WorkflowAction) -> bool {
        !self.unconfigured.contains(&action)
    }

    async fn trigger(&self, action: WorkflowAction, payload: Value) -> Result<Value, WorkflowError> {
        if !self.is_configured(action) {
            return Err(WorkflowError::NotConfigured(action));
        }
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(TriggeredCall {
                action,
                payload,
                respond_to,
            })
            .await
            .map_err(|_| WorkflowError::Rejected { action, status: 503 })?;
        response
            .await
            .map_err(|_| WorkflowError::Rejected { action, status: 503 })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_mock_workflow_scripts_a_reply() {
        let (mock, mut receiver) = create_mock_workflow(10);
        let workflow: Arc<dyn WorkflowTrigger> = Arc::new(mock);

        let call_task = {
            let workflow = workflow.clone();
            tokio::spawn(async move {
                workflow
                    .trigger(WorkflowAction::CreateOrder, json!({ "customer_name": "Test" }))
                    .await
            })
        };

        let call = expect_trigger(&mut receiver).await.expect("Expected trigger");
        assert_eq!(call.action, WorkflowAction::CreateOrder);
        assert_eq!(call.payload["customer_name"], "Test");
        call.respond_to.send(Ok(json!({ "order_id": "order_1" }))).unwrap();

        let reply = call_task.await.unwrap().unwrap();
        assert_eq!(reply["order_id"], "order_1");
    }
}
