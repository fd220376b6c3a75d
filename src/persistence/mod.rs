//! Persistence collaborator: source of truth plus a row-change notification
//! bus. The crate never implements storage; it reads snapshots and listens.

pub mod memory;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::domain::{Order, OrderItem};
use crate::error::PersistenceError;

pub use memory::InMemoryPersistence;

/// The two tables the board cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Orders,
    OrderItems,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Table::Orders => "orders",
            Table::OrderItems => "order_items",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Insert,
    Update,
    Delete,
}

/// One row-level change notification. Rows arrive as raw JSON, exactly the
/// shape the realtime payload has; typed decoding is the listener's job.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: EventKind,
    pub new_row: Option<Value>,
    pub old_row: Option<Value>,
}

/// Handle to the hosted backend. Constructed once at process start and
/// injected everywhere; dropped at shutdown.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// All board items, creation order.
    async fn load_items(&self) -> Result<Vec<OrderItem>, PersistenceError>;

    /// All orders with their items attached, newest first.
    async fn load_orders(&self) -> Result<Vec<Order>, PersistenceError>;

    async fn load_order(&self, id: &str) -> Result<Option<Order>, PersistenceError>;

    /// Live change subscription for one table. Delivery is at-least-once
    /// and unordered relative to local writes; a closed receiver means the
    /// subscription dropped and the caller must resubscribe.
    fn subscribe(&self, table: Table) -> broadcast::Receiver<ChangeEvent>;
}
