mod app_system;
mod board;
mod clients;
mod config;
mod coordinator;
mod domain;
mod error;
mod feed;
mod messages;
mod orders;
mod persistence;
mod workflow;

#[cfg(test)]
mod mock_framework;
#[cfg(test)]
mod integration_tests;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::app_system::{setup_tracing, KitchenSystem};
use crate::config::WebhookConfig;
use crate::domain::{ItemDraft, ItemStatus, OrderDraft, PrepArea};
use crate::persistence::InMemoryPersistence;
use crate::workflow::{DirectWorkflow, HttpWorkflowTrigger, WorkflowAction, WorkflowTrigger};

/// Demo run against the in-memory backend: open an order, walk one item
/// across the board, add a late item, close the tab.
///
/// With `KDS_WEBHOOK_*` endpoints in the environment the webhook calls go
/// out over HTTP; otherwise the in-process workflow stands in for the
/// automation so the demo is self-contained.
#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    info!("Starting kitchen display demo");

    let persistence = Arc::new(InMemoryPersistence::new());
    let config = WebhookConfig::from_env();
    let workflow: Arc<dyn WorkflowTrigger> = if config.endpoint(WorkflowAction::CreateOrder).is_some() {
        Arc::new(HttpWorkflowTrigger::new(config))
    } else {
        info!("No webhooks configured, using the in-process workflow");
        Arc::new(DirectWorkflow::new(persistence.clone()))
    };
    let system = KitchenSystem::new(persistence, workflow);

    let draft = OrderDraft {
        customer_name: "Alice".into(),
        table_number: Some("4".into()),
        items: vec![
            ItemDraft {
                product_id: "prod_burger".into(),
                product_name: "Smash Burger".into(),
                unit_price: 12.5,
                quantity: 2,
                prep_area: PrepArea::Kitchen,
            },
            ItemDraft {
                product_id: "prod_soda".into(),
                product_name: "Lemon Soda".into(),
                unit_price: 3.0,
                quantity: 1,
                prep_area: PrepArea::Counter,
            },
        ],
    };

    let order_id = system
        .desk
        .create_order(draft)
        .await
        .map_err(|e| e.to_string())?;
    info!(order_id = %order_id, "Order created");

    // Give the change feed a moment to surface the new rows.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let lanes = system.board.lanes().await.map_err(|e| e.to_string())?;
    info!(todo = lanes.todo.len(), "Board loaded");

    let first_item = lanes
        .todo
        .first()
        .map(|i| i.id.clone())
        .ok_or_else(|| "board is empty".to_string())?;

    system
        .coordinator
        .set_item_status(&first_item, ItemStatus::InProgress)
        .await
        .map_err(|e| e.to_string())?;
    system
        .coordinator
        .set_item_status(&first_item, ItemStatus::Done)
        .await
        .map_err(|e| e.to_string())?;

    system
        .desk
        .append_items(
            &order_id,
            vec![ItemDraft {
                product_id: "prod_fries".into(),
                product_name: "Fries".into(),
                unit_price: 4.0,
                quantity: 1,
                prep_area: PrepArea::Kitchen,
            }],
        )
        .await
        .map_err(|e| e.to_string())?;

    tokio::time::sleep(Duration::from_millis(100)).await;

    let lanes = system.board.lanes().await.map_err(|e| e.to_string())?;
    info!(
        todo = lanes.todo.len(),
        in_progress = lanes.in_progress.len(),
        done = lanes.done.len(),
        "Board after the shift"
    );

    system
        .desk
        .finalize_order(&order_id)
        .await
        .map_err(|e| e.to_string())?;

    let orders = system.desk.list_orders().await.map_err(|e| e.to_string())?;
    for order in &orders {
        info!(order_id = %order.id, status = %order.status, items = order.items.len(), "Order on file");
    }

    system.shutdown().await;

    info!("Demo completed");
    Ok(())
}
