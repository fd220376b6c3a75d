use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

use crate::board::BoardLanes;
use crate::domain::{ItemStatus, OrderItem};
use crate::error::BoardError;
use crate::messages::BoardRequest;

/// Client for the board actor. Cloneable; every call is one request down
/// the channel and one oneshot reply back.
#[derive(Clone)]
pub struct BoardClient {
    sender: mpsc::Sender<BoardRequest>,
}

impl BoardClient {
    pub fn new(sender: mpsc::Sender<BoardRequest>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, BoardError>>) -> BoardRequest,
    ) -> Result<T, BoardError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| BoardError::ActorCommunicationError("Actor closed".to_string()))?;
        response
            .await
            .map_err(|_| BoardError::ActorCommunicationError("Actor dropped".to_string()))?
    }

    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn replace_snapshot(&self, items: Vec<OrderItem>) -> Result<(), BoardError> {
        debug!("Sending request");
        self.request(|respond_to| BoardRequest::ReplaceSnapshot { items, respond_to })
            .await
    }

    #[instrument(skip(self))]
    pub async fn apply_change(
        &self,
        item_id: String,
        status: ItemStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), BoardError> {
        debug!("Sending request");
        self.request(|respond_to| BoardRequest::ApplyChange {
            item_id,
            status,
            updated_at,
            respond_to,
        })
        .await
    }

    /// Returns the previous status when the optimistic write was applied,
    /// `None` when the item was already in the target lane.
    #[instrument(skip(self))]
    pub async fn begin_mutation(
        &self,
        item_id: String,
        target: ItemStatus,
    ) -> Result<Option<ItemStatus>, BoardError> {
        debug!("Sending request");
        self.request(|respond_to| BoardRequest::BeginMutation {
            item_id,
            target,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn commit_mutation(&self, item_id: String) -> Result<(), BoardError> {
        debug!("Sending request");
        self.request(|respond_to| BoardRequest::CommitMutation { item_id, respond_to })
            .await
    }

    #[instrument(skip(self))]
    pub async fn abort_mutation(&self, item_id: String) -> Result<(), BoardError> {
        debug!("Sending request");
        self.request(|respond_to| BoardRequest::AbortMutation { item_id, respond_to })
            .await
    }

    #[instrument(skip(self))]
    pub async fn lanes(&self) -> Result<BoardLanes, BoardError> {
        debug!("Sending request");
        self.request(|respond_to| BoardRequest::Lanes { respond_to }).await
    }

    #[instrument(skip(self))]
    #[allow(dead_code)]
    pub async fn items(&self) -> Result<Vec<OrderItem>, BoardError> {
        debug!("Sending request");
        self.request(|respond_to| BoardRequest::Items { respond_to }).await
    }
}
