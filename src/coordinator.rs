use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error, info, instrument};

use crate::clients::BoardClient;
use crate::domain::ItemStatus;
use crate::error::{MutationError, WorkflowError};
use crate::workflow::{WorkflowAction, WorkflowTrigger};

/// Turns one user action (drag to a lane, status button) into one optimistic
/// local write plus exactly one outbound workflow call, rolling the write
/// back when the call fails.
///
/// A second mutation on the same item while one is in flight is rejected by
/// the board actor's guard; mutations on different items are independent.
#[derive(Clone)]
pub struct MutationCoordinator {
    board: BoardClient,
    workflow: Arc<dyn WorkflowTrigger>,
}

impl MutationCoordinator {
    pub fn new(board: BoardClient, workflow: Arc<dyn WorkflowTrigger>) -> Self {
        Self { board, workflow }
    }

    #[instrument(skip(self), fields(item_id = %item_id, target = %target))]
    pub async fn set_item_status(
        &self,
        item_id: &str,
        target: ItemStatus,
    ) -> Result<(), MutationError> {
        // Configuration failures abort before any local state is touched.
        if !self.workflow.is_configured(WorkflowAction::UpdateItemStatus) {
            error!("Status webhook not configured, action aborted");
            return Err(WorkflowError::NotConfigured(WorkflowAction::UpdateItemStatus).into());
        }

        let Some(previous) = self
            .board
            .begin_mutation(item_id.to_string(), target)
            .await?
        else {
            debug!("Item already in target lane, nothing to do");
            return Ok(());
        };

        let payload = json!({ "id": item_id, "status": target });
        match self
            .workflow
            .trigger(WorkflowAction::UpdateItemStatus, payload)
            .await
        {
            Ok(_) => {
                // The change feed confirms independently once the backing
                // store is updated.
                self.board.commit_mutation(item_id.to_string()).await?;
                info!("Status change dispatched");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, previous = %previous, "Webhook failed, rolling back");
                self.board.abort_mutation(item_id.to_string()).await?;
                Err(e.into())
            }
        }
    }
}
