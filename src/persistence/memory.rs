use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::{ItemStatus, Order, OrderItem, OrderStatus};
use crate::error::PersistenceError;

use super::{ChangeEvent, EventKind, Persistence, Table};

const CHANNEL_CAPACITY: usize = 64;

struct Rows {
    orders: Vec<Order>,
    items: Vec<OrderItem>,
}

/// In-memory stand-in for the hosted backend, used by tests and the demo
/// binary. Every write broadcasts the same change event the real backend
/// would push.
pub struct InMemoryPersistence {
    rows: Mutex<Rows>,
    order_events: Mutex<broadcast::Sender<ChangeEvent>>,
    item_events: Mutex<broadcast::Sender<ChangeEvent>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        let (order_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (item_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            rows: Mutex::new(Rows {
                orders: Vec::new(),
                items: Vec::new(),
            }),
            order_events: Mutex::new(order_tx),
            item_events: Mutex::new(item_tx),
        }
    }

    /// Severs every live subscription, as a dropped realtime connection
    /// would. Subsequent `subscribe` calls attach to fresh channels.
    #[allow(dead_code)]
    pub fn drop_subscriptions(&self) {
        let (order_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (item_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        *self.order_events.lock().unwrap() = order_tx;
        *self.item_events.lock().unwrap() = item_tx;
        debug!("All change subscriptions dropped");
    }

    pub fn insert_order(&self, order: Order, items: Vec<OrderItem>) {
        let mut rows = self.rows.lock().unwrap();
        self.emit_order(EventKind::Insert, None, Some(&order));
        rows.orders.push(order);
        for item in items {
            self.emit_item(EventKind::Insert, None, Some(&item));
            rows.items.push(item);
        }
    }

    pub fn append_items(&self, order_id: &str, items: Vec<OrderItem>) -> bool {
        let mut rows = self.rows.lock().unwrap();
        if !rows.orders.iter().any(|o| o.id == order_id) {
            return false;
        }
        for item in items {
            self.emit_item(EventKind::Insert, None, Some(&item));
            rows.items.push(item);
        }
        true
    }

    pub fn update_item_status(&self, item_id: &str, status: ItemStatus) -> Option<OrderItem> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.items.iter_mut().find(|i| i.id == item_id)?;
        let before = row.clone();
        row.status = status;
        row.updated_at = Utc::now();
        let after = row.clone();
        self.emit_item(EventKind::Update, Some(&before), Some(&after));
        Some(after)
    }

    pub fn set_order_status(&self, order_id: &str, status: OrderStatus) -> Option<Order> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.orders.iter_mut().find(|o| o.id == order_id)?;
        let before = row.clone();
        row.status = status;
        row.updated_at = Utc::now();
        let after = row.clone();
        self.emit_order(EventKind::Update, Some(&before), Some(&after));
        Some(after)
    }

    /// Pushes a raw event onto the item feed. Test hook for malformed or
    /// out-of-band notifications.
    #[allow(dead_code)]
    pub fn emit_raw_item_event(&self, kind: EventKind, new_row: Option<Value>, old_row: Option<Value>) {
        let _ = self.item_events.lock().unwrap().send(ChangeEvent {
            table: Table::OrderItems,
            kind,
            new_row,
            old_row,
        });
    }

    fn emit_item(&self, kind: EventKind, old: Option<&OrderItem>, new: Option<&OrderItem>) {
        let event = ChangeEvent {
            table: Table::OrderItems,
            kind,
            new_row: new.map(row_json),
            old_row: old.map(row_json),
        };
        // No receivers is fine; nobody is watching the board.
        let _ = self.item_events.lock().unwrap().send(event);
    }

    fn emit_order(&self, kind: EventKind, old: Option<&Order>, new: Option<&Order>) {
        let event = ChangeEvent {
            table: Table::Orders,
            kind,
            new_row: new.map(row_json),
            old_row: old.map(row_json),
        };
        let _ = self.order_events.lock().unwrap().send(event);
    }
}

fn row_json<T: serde::Serialize>(row: &T) -> Value {
    serde_json::to_value(row).unwrap_or(Value::Null)
}

impl Default for InMemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Persistence for InMemoryPersistence {
    async fn load_items(&self) -> Result<Vec<OrderItem>, PersistenceError> {
        let rows = self.rows.lock().unwrap();
        let mut items = rows.items.clone();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn load_orders(&self) -> Result<Vec<Order>, PersistenceError> {
        let rows = self.rows.lock().unwrap();
        let mut orders = rows.orders.clone();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        for order in &mut orders {
            order.items = rows
                .items
                .iter()
                .filter(|i| i.order_id == order.id)
                .cloned()
                .collect();
        }
        Ok(orders)
    }

    async fn load_order(&self, id: &str) -> Result<Option<Order>, PersistenceError> {
        let rows = self.rows.lock().unwrap();
        let Some(mut order) = rows.orders.iter().find(|o| o.id == id).cloned() else {
            return Ok(None);
        };
        order.items = rows
            .items
            .iter()
            .filter(|i| i.order_id == order.id)
            .cloned()
            .collect();
        Ok(Some(order))
    }

    fn subscribe(&self, table: Table) -> broadcast::Receiver<ChangeEvent> {
        match table {
            Table::Orders => self.order_events.lock().unwrap().subscribe(),
            Table::OrderItems => self.item_events.lock().unwrap().subscribe(),
        }
    }
}
