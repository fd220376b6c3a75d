//! Workflow-trigger collaborator: the external automation graph that owns
//! all write-side business logic. One outbound call per user action, 2xx is
//! success, anything else is failure, no retries.

pub mod direct;
pub mod http;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::WorkflowError;

pub use direct::DirectWorkflow;
pub use http::HttpWorkflowTrigger;

/// The logical actions the automation exposes, one endpoint each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowAction {
    CreateOrder,
    AppendItems,
    FinalizeOrder,
    UpdateItemStatus,
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WorkflowAction::CreateOrder => "create_order",
            WorkflowAction::AppendItems => "append_items",
            WorkflowAction::FinalizeOrder => "finalize_order",
            WorkflowAction::UpdateItemStatus => "update_item_status",
        })
    }
}

#[async_trait]
pub trait WorkflowTrigger: Send + Sync {
    /// Cheap pre-flight check so callers can abort before mutating any
    /// local state.
    fn is_configured(&self, action: WorkflowAction) -> bool;

    /// Fires the action's endpoint with a JSON body. The reply is opaque
    /// except where an identifier has to be threaded back (new order id).
    async fn trigger(&self, action: WorkflowAction, payload: Value) -> Result<Value, WorkflowError>;
}
