use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{error, info, instrument};

use crate::domain::{ItemDraft, Order, OrderDraft, OrderStatus};
use crate::error::{OrderError, WorkflowError};
use crate::persistence::Persistence;
use crate::workflow::{WorkflowAction, WorkflowTrigger};

/// Fallback customer name for walk-up orders submitted without one.
const WALK_UP_CUSTOMER: &str = "Counter";

/// Counter-side write path. Orders and their first items are created as one
/// logical unit through the automation; this crate never writes the rows
/// itself, it fires the webhook and lets the change feed confirm.
#[derive(Clone)]
pub struct OrderDesk {
    persistence: Arc<dyn Persistence>,
    workflow: Arc<dyn WorkflowTrigger>,
}

impl OrderDesk {
    pub fn new(persistence: Arc<dyn Persistence>, workflow: Arc<dyn WorkflowTrigger>) -> Self {
        Self {
            persistence,
            workflow,
        }
    }

    /// Opens a new order. The automation assigns the id and it is threaded
    /// back from the webhook reply.
    #[instrument(skip(self, draft), fields(items = draft.items.len()))]
    pub async fn create_order(&self, draft: OrderDraft) -> Result<String, OrderError> {
        if draft.items.is_empty() {
            return Err(OrderError::EmptyDraft);
        }
        let customer_name = if draft.customer_name.trim().is_empty() {
            WALK_UP_CUSTOMER.to_string()
        } else {
            draft.customer_name.trim().to_string()
        };

        let payload = json!({
            "customer_name": customer_name,
            "table_number": draft.table_number,
            "channel": "counter",
            "items": draft.items,
        });
        let reply = self
            .workflow
            .trigger(WorkflowAction::CreateOrder, payload)
            .await?;

        let order_id = extract_order_id(&reply).ok_or(WorkflowError::MissingOrderId {
            action: WorkflowAction::CreateOrder,
        })?;
        info!(order_id = %order_id, "Order accepted by the automation");
        Ok(order_id)
    }

    /// Appends items to an open order. Finalized orders are archival and
    /// refuse new items before any webhook fires.
    #[instrument(skip(self, items), fields(order_id = %order_id, items = items.len()))]
    pub async fn append_items(
        &self,
        order_id: &str,
        items: Vec<ItemDraft>,
    ) -> Result<(), OrderError> {
        if items.is_empty() {
            return Err(OrderError::EmptyDraft);
        }
        let order = self
            .persistence
            .load_order(order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;
        if order.status == OrderStatus::Finalized {
            error!("Order already finalized, items rejected");
            return Err(OrderError::Finalized(order_id.to_string()));
        }

        let payload = json!({ "order_id": order_id, "items": items });
        self.workflow
            .trigger(WorkflowAction::AppendItems, payload)
            .await?;
        info!("Items dispatched to the automation");
        Ok(())
    }

    /// Closes the tab. A status change on the order only; item rows stay
    /// behind for history.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn finalize_order(&self, order_id: &str) -> Result<(), OrderError> {
        let order = self
            .persistence
            .load_order(order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;
        if order.status == OrderStatus::Finalized {
            return Err(OrderError::Finalized(order_id.to_string()));
        }

        let payload = json!({ "order_id": order_id });
        self.workflow
            .trigger(WorkflowAction::FinalizeOrder, payload)
            .await?;
        info!("Order finalized");
        Ok(())
    }

    /// Read-only view for the counter screen, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, OrderError> {
        Ok(self.persistence.load_orders().await?)
    }
}

fn extract_order_id(reply: &Value) -> Option<String> {
    reply
        .get("order_id")
        .or_else(|| reply.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
