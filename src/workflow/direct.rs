use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::domain::{ItemDraft, ItemStatus, Order, OrderItem, OrderStatus};
use crate::error::WorkflowError;
use crate::persistence::InMemoryPersistence;

use super::{WorkflowAction, WorkflowTrigger};

/// Stand-in for the external automation graph: applies every action
/// straight to an [`InMemoryPersistence`], whose change events then confirm
/// the write exactly like the hosted pipeline would. Used by the demo
/// binary and the end-to-end tests.
pub struct DirectWorkflow {
    persistence: Arc<InMemoryPersistence>,
    order_seq: AtomicU64,
    item_seq: AtomicU64,
}

#[derive(Deserialize)]
struct CreateOrderPayload {
    customer_name: String,
    table_number: Option<String>,
    items: Vec<ItemDraft>,
}

#[derive(Deserialize)]
struct AppendItemsPayload {
    order_id: String,
    items: Vec<ItemDraft>,
}

#[derive(Deserialize)]
struct UpdateStatusPayload {
    id: String,
    status: ItemStatus,
}

#[derive(Deserialize)]
struct FinalizePayload {
    order_id: String,
}

impl DirectWorkflow {
    pub fn new(persistence: Arc<InMemoryPersistence>) -> Self {
        Self {
            persistence,
            order_seq: AtomicU64::new(1),
            item_seq: AtomicU64::new(1),
        }
    }

    fn next_order_id(&self) -> String {
        format!("order_{}", self.order_seq.fetch_add(1, Ordering::SeqCst))
    }

    fn build_items(&self, order_id: &str, drafts: Vec<ItemDraft>) -> Vec<OrderItem> {
        let now = Utc::now();
        drafts
            .into_iter()
            .map(|draft| OrderItem {
                id: format!("item_{}", self.item_seq.fetch_add(1, Ordering::SeqCst)),
                order_id: order_id.to_string(),
                product_name: draft.product_name,
                quantity: draft.quantity,
                unit_price: draft.unit_price,
                status: ItemStatus::Todo,
                prep_area: draft.prep_area,
                created_at: now,
                updated_at: now,
            })
            .collect()
    }
}

fn decode<T: serde::de::DeserializeOwned>(action: WorkflowAction, payload: Value) -> Result<T, WorkflowError> {
    serde_json::from_value(payload).map_err(|_| WorkflowError::Rejected { action, status: 400 })
}

#[async_trait]
impl WorkflowTrigger for DirectWorkflow {
    fn is_configured(&self, _action: WorkflowAction) -> bool {
        true
    }

    #[instrument(skip(self, payload), fields(action = %action))]
    async fn trigger(&self, action: WorkflowAction, payload: Value) -> Result<Value, WorkflowError> {
        match action {
            WorkflowAction::CreateOrder => {
                let body: CreateOrderPayload = decode(action, payload)?;
                let order_id = self.next_order_id();
                let now = Utc::now();
                let order = Order {
                    id: order_id.clone(),
                    customer_name: body.customer_name,
                    table_number: body.table_number,
                    status: OrderStatus::Pending,
                    created_at: now,
                    updated_at: now,
                    items: Vec::new(),
                };
                let items = self.build_items(&order_id, body.items);
                self.persistence.insert_order(order, items);
                info!(order_id = %order_id, "Order written");
                Ok(json!({ "order_id": order_id }))
            }
            WorkflowAction::AppendItems => {
                let body: AppendItemsPayload = decode(action, payload)?;
                let items = self.build_items(&body.order_id, body.items);
                if !self.persistence.append_items(&body.order_id, items) {
                    return Err(WorkflowError::Rejected { action, status: 404 });
                }
                Ok(json!({}))
            }
            WorkflowAction::FinalizeOrder => {
                let body: FinalizePayload = decode(action, payload)?;
                self.persistence
                    .set_order_status(&body.order_id, OrderStatus::Finalized)
                    .ok_or(WorkflowError::Rejected { action, status: 404 })?;
                Ok(json!({}))
            }
            WorkflowAction::UpdateItemStatus => {
                let body: UpdateStatusPayload = decode(action, payload)?;
                self.persistence
                    .update_item_status(&body.id, body.status)
                    .ok_or(WorkflowError::Rejected { action, status: 404 })?;
                Ok(json!({}))
            }
        }
    }
}
