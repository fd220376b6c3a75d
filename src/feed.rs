use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, instrument, warn};

use crate::clients::BoardClient;
use crate::domain::ItemStatus;
use crate::persistence::{ChangeEvent, EventKind, Persistence, Table};

/// Only the fields a status delta needs; the rest of the row is ignored.
#[derive(Deserialize)]
struct ItemStatusRow {
    id: String,
    status: String,
    updated_at: DateTime<Utc>,
}

/// Maintains the live subscriptions on `order_items` and `orders` and keeps
/// the board in step with the backend.
///
/// Every (re)subscription starts with a full snapshot reload, so a dropped
/// connection can make the board stale but never leaves it permanently
/// diverged. Item updates are applied as timestamp-guarded deltas; anything
/// else falls back to a snapshot refetch. Duplicate or out-of-order
/// delivery is absorbed by the store's guard.
pub struct ChangeFeedListener {
    persistence: Arc<dyn Persistence>,
    board: BoardClient,
    shutdown: watch::Receiver<bool>,
    resubscribe_delay: Duration,
}

impl ChangeFeedListener {
    pub fn new(
        persistence: Arc<dyn Persistence>,
        board: BoardClient,
        shutdown: watch::Receiver<bool>,
        resubscribe_delay: Duration,
    ) -> Self {
        Self {
            persistence,
            board,
            shutdown,
            resubscribe_delay,
        }
    }

    #[instrument(name = "change_feed", skip(self))]
    pub async fn run(self) {
        info!("ChangeFeedListener starting");
        let mut shutdown = self.shutdown.clone();
        loop {
            let mut item_events = self.persistence.subscribe(Table::OrderItems);
            let mut order_events = self.persistence.subscribe(Table::Orders);

            // Fresh subscription, fresh snapshot.
            if !self.reload().await {
                return;
            }

            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        // A dropped sender counts as shutdown.
                        if changed.is_err() || *shutdown.borrow() {
                            info!("ChangeFeedListener stopping");
                            return;
                        }
                    }
                    event = item_events.recv() => {
                        match event {
                            Ok(event) => {
                                if !self.handle_item_event(event).await {
                                    return;
                                }
                            }
                            Err(broadcast::error::RecvError::Lagged(missed)) => {
                                warn!(missed, "Item feed lagged, reloading");
                                if !self.reload().await {
                                    return;
                                }
                            }
                            Err(broadcast::error::RecvError::Closed) => {
                                warn!("Item subscription dropped, resubscribing");
                                break;
                            }
                        }
                    }
                    event = order_events.recv() => {
                        match event {
                            Ok(event) => {
                                debug!(kind = ?event.kind, "Order change, reloading");
                                if !self.reload().await {
                                    return;
                                }
                            }
                            Err(broadcast::error::RecvError::Lagged(missed)) => {
                                warn!(missed, "Order feed lagged, reloading");
                                if !self.reload().await {
                                    return;
                                }
                            }
                            Err(broadcast::error::RecvError::Closed) => {
                                warn!("Order subscription dropped, resubscribing");
                                break;
                            }
                        }
                    }
                }
            }

            tokio::time::sleep(self.resubscribe_delay).await;
            if *shutdown.borrow() {
                info!("ChangeFeedListener stopping");
                return;
            }
        }
    }

    /// Returns `false` when the board actor is gone and the task should end.
    async fn reload(&self) -> bool {
        let items = match self.persistence.load_items().await {
            Ok(items) => items,
            Err(e) => {
                // Stale but not incorrect: the board simply stops updating
                // until the next event or resubscription.
                warn!(error = %e, "Snapshot load failed");
                return true;
            }
        };
        match self.board.replace_snapshot(items).await {
            Ok(()) => true,
            Err(e) => {
                info!(error = %e, "Board gone, listener exiting");
                false
            }
        }
    }

    async fn handle_item_event(&self, event: ChangeEvent) -> bool {
        if event.kind == EventKind::Update {
            if let Some(row) = event.new_row.as_ref() {
                match serde_json::from_value::<ItemStatusRow>(row.clone()) {
                    Ok(row) => {
                        return match ItemStatus::parse(&row.status) {
                            Some(status) => {
                                match self.board.apply_change(row.id, status, row.updated_at).await {
                                    Ok(()) => true,
                                    Err(e) => {
                                        info!(error = %e, "Board gone, listener exiting");
                                        false
                                    }
                                }
                            }
                            None => {
                                // Not one of the lanes; the item is simply
                                // not shown. Never fatal.
                                debug!(status = %row.status, "Unknown status in notification, row ignored");
                                true
                            }
                        };
                    }
                    Err(e) => {
                        debug!(error = %e, "Undecodable update row, falling back to reload");
                    }
                }
            }
        }
        // Inserts, deletes and anything we could not decode: refetch.
        self.reload().await
    }
}
