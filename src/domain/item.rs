use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Preparation status of a single order item. One board lane per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Todo,
    InProgress,
    Done,
}

impl ItemStatus {
    /// Lanes in display order.
    pub const LANES: [ItemStatus; 3] = [ItemStatus::Todo, ItemStatus::InProgress, ItemStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Todo => "todo",
            ItemStatus::InProgress => "in_progress",
            ItemStatus::Done => "done",
        }
    }

    /// Parses a wire status string. Anything outside the lane set is `None`;
    /// callers decide whether that means "ignore the row" or "refetch".
    pub fn parse(s: &str) -> Option<ItemStatus> {
        Self::LANES.into_iter().find(|lane| lane.as_str() == s)
    }

    /// Transition-validity table.
    ///
    /// The board has always allowed any lane-to-lane move (drag targets are
    /// unconstrained), so every row is `true`. Tightening to a forward-only
    /// progression is a deliberate behavior change and happens here, nowhere
    /// else.
    pub fn can_transition_to(&self, target: ItemStatus) -> bool {
        match (self, target) {
            (ItemStatus::Todo, _) => true,
            (ItemStatus::InProgress, _) => true,
            (ItemStatus::Done, _) => true,
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an item gets prepared. Assigned on the catalog product and copied
/// onto the item at order creation; immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrepArea {
    Counter,
    Kitchen,
}

impl fmt::Display for PrepArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrepArea::Counter => "counter",
            PrepArea::Kitchen => "kitchen",
        })
    }
}

/// A line on an order as the board sees it. Only `status` (and its
/// `updated_at`) changes after creation; items are never deleted
/// individually in the kitchen flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub status: ItemStatus,
    pub prep_area: PrepArea,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An item as submitted by the ordering UI, before the automation has
/// assigned it an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDraft {
    pub product_id: String,
    pub product_name: String,
    pub unit_price: f64,
    pub quantity: u32,
    pub prep_area: PrepArea,
}
