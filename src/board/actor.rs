use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use crate::clients::BoardClient;
use crate::domain::{ItemStatus, OrderItem};
use crate::error::BoardError;
use crate::messages::{BoardRequest, ServiceResponse};

use super::projection::project;
use super::status_store::StatusStore;

/// Single owner of the board state: the loaded item list, the status store
/// and the per-item in-flight mutation guard.
///
/// Everything that touches the store serializes through this actor's
/// channel. The change-feed listener writes via `ReplaceSnapshot` /
/// `ApplyChange`, the mutation coordinator via the `*Mutation` requests,
/// and readers only ever get projections or copies.
pub struct BoardActor {
    receiver: mpsc::Receiver<BoardRequest>,
    items: Vec<OrderItem>,
    store: StatusStore,
    /// item id -> status captured before the optimistic write.
    in_flight: HashMap<String, ItemStatus>,
}

impl BoardActor {
    pub fn new(buffer_size: usize) -> (Self, BoardClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            items: Vec::new(),
            store: StatusStore::new(),
            in_flight: HashMap::new(),
        };
        (actor, BoardClient::new(sender))
    }

    #[instrument(name = "board_actor", skip(self))]
    pub async fn run(mut self) {
        info!("BoardActor starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                BoardRequest::ReplaceSnapshot { items, respond_to } => {
                    self.handle_replace_snapshot(items, respond_to);
                }
                BoardRequest::ApplyChange {
                    item_id,
                    status,
                    updated_at,
                    respond_to,
                } => {
                    self.handle_apply_change(item_id, status, updated_at, respond_to);
                }
                BoardRequest::BeginMutation {
                    item_id,
                    target,
                    respond_to,
                } => {
                    self.handle_begin_mutation(item_id, target, respond_to);
                }
                BoardRequest::CommitMutation {
                    item_id,
                    respond_to,
                } => {
                    self.handle_commit_mutation(item_id, respond_to);
                }
                BoardRequest::AbortMutation {
                    item_id,
                    respond_to,
                } => {
                    self.handle_abort_mutation(item_id, respond_to);
                }
                BoardRequest::Lanes { respond_to } => {
                    let _ = respond_to.send(Ok(project(&self.items, &self.store)));
                }
                BoardRequest::Items { respond_to } => {
                    let _ = respond_to.send(Ok(self.items.clone()));
                }
            }
        }
        info!("BoardActor stopped");
    }

    #[instrument(fields(count = items.len()), skip(self, items, respond_to))]
    fn handle_replace_snapshot(
        &mut self,
        mut items: Vec<OrderItem>,
        respond_to: ServiceResponse<(), BoardError>,
    ) {
        debug!("Installing fresh snapshot");
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        self.store.bulk_replace(items.iter());
        self.items = items;
        let _ = respond_to.send(Ok(()));
    }

    #[instrument(fields(item_id = %item_id, status = %status), skip(self, respond_to))]
    fn handle_apply_change(
        &mut self,
        item_id: String,
        status: ItemStatus,
        updated_at: DateTime<Utc>,
        respond_to: ServiceResponse<(), BoardError>,
    ) {
        // Stale and duplicate notifications are expected; dropping them is
        // not an error.
        if self.store.set(&item_id, status, updated_at) {
            self.sync_item_row(&item_id, status, updated_at);
            debug!("Change applied");
        } else {
            debug!("Stale notification dropped");
        }
        let _ = respond_to.send(Ok(()));
    }

    #[instrument(fields(item_id = %item_id, target = %target), skip(self, respond_to))]
    fn handle_begin_mutation(
        &mut self,
        item_id: String,
        target: ItemStatus,
        respond_to: ServiceResponse<Option<ItemStatus>, BoardError>,
    ) {
        let Some(item) = self.items.iter().find(|i| i.id == item_id) else {
            let _ = respond_to.send(Err(BoardError::ItemNotFound(item_id)));
            return;
        };
        if self.in_flight.contains_key(&item_id) {
            let _ = respond_to.send(Err(BoardError::MutationInFlight(item_id)));
            return;
        }
        let current = self.store.get(&item_id).unwrap_or(item.status);
        if current == target {
            debug!("Item already in target lane");
            let _ = respond_to.send(Ok(None));
            return;
        }
        if !current.can_transition_to(target) {
            let _ = respond_to.send(Err(BoardError::IllegalTransition {
                from: current,
                to: target,
            }));
            return;
        }

        let now = Utc::now();
        self.in_flight.insert(item_id.clone(), current);
        self.store.set(&item_id, target, now);
        self.sync_item_row(&item_id, target, now);
        info!(previous = %current, "Optimistic write applied");
        let _ = respond_to.send(Ok(Some(current)));
    }

    #[instrument(fields(item_id = %item_id), skip(self, respond_to))]
    fn handle_commit_mutation(
        &mut self,
        item_id: String,
        respond_to: ServiceResponse<(), BoardError>,
    ) {
        let result = match self.in_flight.remove(&item_id) {
            Some(_) => {
                debug!("Mutation committed, change feed will confirm");
                Ok(())
            }
            None => Err(BoardError::NoMutationInFlight(item_id)),
        };
        let _ = respond_to.send(result);
    }

    #[instrument(fields(item_id = %item_id), skip(self, respond_to))]
    fn handle_abort_mutation(
        &mut self,
        item_id: String,
        respond_to: ServiceResponse<(), BoardError>,
    ) {
        let result = match self.in_flight.remove(&item_id) {
            Some(previous) => {
                let now = Utc::now();
                self.store.set(&item_id, previous, now);
                self.sync_item_row(&item_id, previous, now);
                info!(restored = %previous, "Optimistic write rolled back");
                Ok(())
            }
            None => Err(BoardError::NoMutationInFlight(item_id)),
        };
        let _ = respond_to.send(result);
    }

    /// Keeps the row copy in step with the store so snapshots handed to
    /// readers carry the believed status.
    fn sync_item_row(&mut self, item_id: &str, status: ItemStatus, updated_at: DateTime<Utc>) {
        if let Some(row) = self.items.iter_mut().find(|i| i.id == item_id) {
            row.status = status;
            row.updated_at = updated_at;
        }
    }
}
