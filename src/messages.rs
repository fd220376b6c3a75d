use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use crate::board::BoardLanes;
use crate::domain::{ItemStatus, OrderItem};
use crate::error::BoardError;

/// Generic type aliases for actor communication.
pub type ServiceResult<T, E> = std::result::Result<T, E>;
pub type ServiceResponse<T, E> = oneshot::Sender<ServiceResult<T, E>>;

/// Typed messages for the board actor. Each variant carries its parameters
/// and a oneshot channel for the response.
///
/// `ReplaceSnapshot` and `ApplyChange` are the change-feed listener's
/// entrance; `BeginMutation`/`CommitMutation`/`AbortMutation` belong to the
/// mutation coordinator; `Lanes` and `Items` are read-only.
#[derive(Debug)]
pub enum BoardRequest {
    ReplaceSnapshot {
        items: Vec<OrderItem>,
        respond_to: ServiceResponse<(), BoardError>,
    },
    ApplyChange {
        item_id: String,
        status: ItemStatus,
        updated_at: DateTime<Utc>,
        respond_to: ServiceResponse<(), BoardError>,
    },
    BeginMutation {
        item_id: String,
        target: ItemStatus,
        /// `Ok(Some(previous))` when the optimistic write was applied,
        /// `Ok(None)` when the item was already in the target lane.
        respond_to: ServiceResponse<Option<ItemStatus>, BoardError>,
    },
    CommitMutation {
        item_id: String,
        respond_to: ServiceResponse<(), BoardError>,
    },
    AbortMutation {
        item_id: String,
        respond_to: ServiceResponse<(), BoardError>,
    },
    Lanes {
        respond_to: ServiceResponse<BoardLanes, BoardError>,
    },
    Items {
        respond_to: ServiceResponse<Vec<OrderItem>, BoardError>,
    },
}
