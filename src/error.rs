use thiserror::Error;

use crate::domain::ItemStatus;
use crate::workflow::WorkflowAction;

/// Errors that can occur inside the board actor.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BoardError {
    #[error("Item not found: {0}")]
    ItemNotFound(String),
    #[error("Mutation already in flight for item {0}")]
    MutationInFlight(String),
    #[error("No mutation in flight for item {0}")]
    NoMutationInFlight(String),
    #[error("Transition {from} -> {to} is not allowed")]
    IllegalTransition { from: ItemStatus, to: ItemStatus },
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

/// Errors from the workflow-trigger collaborator. A missing endpoint is a
/// configuration error and aborts the action before any local mutation.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("No endpoint configured for action {0}")]
    NotConfigured(WorkflowAction),
    #[error("Webhook for {action} rejected the call with status {status}")]
    Rejected { action: WorkflowAction, status: u16 },
    #[error("Webhook transport failure for {action}: {source}")]
    Transport {
        action: WorkflowAction,
        #[source]
        source: reqwest::Error,
    },
    #[error("Webhook reply for {action} carried no order id")]
    MissingOrderId { action: WorkflowAction },
}

/// Errors surfaced by a user-initiated status mutation. Handled at the point
/// of the action; there is no retry queue.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

/// Errors from the counter-side order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error("Order {0} is already finalized")]
    Finalized(String),
    #[error("Order has no items")]
    EmptyDraft,
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Errors from the persistence collaborator.
#[derive(Debug, Clone, Error)]
#[allow(dead_code)]
pub enum PersistenceError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("Row decode failure: {0}")]
    Decode(String),
}
