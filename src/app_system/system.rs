use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use crate::board::BoardActor;
use crate::clients::BoardClient;
use crate::coordinator::MutationCoordinator;
use crate::feed::ChangeFeedListener;
use crate::orders::OrderDesk;
use crate::persistence::Persistence;
use crate::workflow::WorkflowTrigger;

const BOARD_BUFFER: usize = 32;
const RESUBSCRIBE_DELAY: Duration = Duration::from_millis(500);

/// One connected client's worth of the system: the board actor, the change
/// feed listener that keeps it fresh, and the two write-path front ends.
///
/// Collaborators are injected; nothing in here is a global.
pub struct KitchenSystem {
    pub board: BoardClient,
    pub coordinator: MutationCoordinator,
    pub desk: OrderDesk,
    shutdown: watch::Sender<bool>,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl KitchenSystem {
    pub fn new(persistence: Arc<dyn Persistence>, workflow: Arc<dyn WorkflowTrigger>) -> Self {
        let (actor, board) = BoardActor::new(BOARD_BUFFER);
        let board_handle = tokio::spawn(actor.run());

        let (shutdown, shutdown_rx) = watch::channel(false);
        let listener = ChangeFeedListener::new(
            persistence.clone(),
            board.clone(),
            shutdown_rx,
            RESUBSCRIBE_DELAY,
        );
        let listener_handle = tokio::spawn(listener.run());

        let coordinator = MutationCoordinator::new(board.clone(), workflow.clone());
        let desk = OrderDesk::new(persistence, workflow);

        Self {
            board,
            coordinator,
            desk,
            shutdown,
            handles: vec![board_handle, listener_handle],
        }
    }

    /// Stops the listener, then closes the board channel by dropping every
    /// client, and waits for both tasks.
    pub async fn shutdown(self) {
        info!("Shutting down system...");
        let _ = self.shutdown.send(true);

        drop(self.coordinator);
        drop(self.desk);
        drop(self.board);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Task failed during shutdown: {:?}", e);
            }
        }
        info!("System shutdown complete.");
    }
}
