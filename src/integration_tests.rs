#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use serde_json::json;
    use tokio::sync::watch;
    use tokio::time::sleep;

    use crate::app_system::KitchenSystem;
    use crate::board::{BoardActor, BoardLanes};
    use crate::clients::BoardClient;
    use crate::domain::{
        ItemDraft, ItemStatus, Order, OrderItem, OrderDraft, OrderStatus, PrepArea,
    };
    use crate::error::{BoardError, MutationError, OrderError, WorkflowError};
    use crate::feed::ChangeFeedListener;
    use crate::mock_framework::{create_mock_workflow, expect_trigger};
    use crate::persistence::{EventKind, InMemoryPersistence};
    use crate::workflow::{DirectWorkflow, WorkflowAction};

    // --- Fixtures ---

    fn seeded_order(id: &str, status: OrderStatus) -> Order {
        let now = Utc::now();
        Order {
            id: id.into(),
            customer_name: "Alice".into(),
            table_number: Some("4".into()),
            status,
            created_at: now,
            updated_at: now,
            items: Vec::new(),
        }
    }

    fn seeded_item(id: &str, order_id: &str, status: ItemStatus) -> OrderItem {
        let now = Utc::now();
        OrderItem {
            id: id.into(),
            order_id: order_id.into(),
            product_name: "Smash Burger".into(),
            quantity: 1,
            unit_price: 12.5,
            status,
            prep_area: PrepArea::Kitchen,
            created_at: now,
            updated_at: now,
        }
    }

    fn draft(n_items: usize) -> OrderDraft {
        OrderDraft {
            customer_name: "Alice".into(),
            table_number: Some("4".into()),
            items: (0..n_items)
                .map(|n| ItemDraft {
                    product_id: format!("prod_{n}"),
                    product_name: format!("Product {n}"),
                    unit_price: 10.0,
                    quantity: 1,
                    prep_area: PrepArea::Kitchen,
                })
                .collect(),
        }
    }

    /// Polls the board until the predicate holds; panics after ~1s.
    async fn wait_for_board(
        board: &BoardClient,
        pred: impl Fn(&BoardLanes) -> bool,
    ) -> BoardLanes {
        for _ in 0..100 {
            let lanes = board.lanes().await.expect("board should be running");
            if pred(&lanes) {
                return lanes;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("board never reached the expected state");
    }

    // --- End-to-end against the in-process automation ---

    #[tokio::test]
    async fn optimistic_drag_is_confirmed_by_the_change_feed() {
        let persistence = Arc::new(InMemoryPersistence::new());
        let workflow = Arc::new(DirectWorkflow::new(persistence.clone()));
        let system = KitchenSystem::new(persistence.clone(), workflow);

        system.desk.create_order(draft(2)).await.unwrap();
        let lanes = wait_for_board(&system.board, |l| l.total() == 2).await;
        let item_id = lanes.todo[0].id.clone();

        system
            .coordinator
            .set_item_status(&item_id, ItemStatus::InProgress)
            .await
            .unwrap();

        // Visible immediately, before any feed round-trip.
        let lanes = system.board.lanes().await.unwrap();
        assert_eq!(lanes.in_progress.len(), 1);
        assert_eq!(lanes.in_progress[0].id, item_id);

        // And the backing row was actually updated.
        use crate::persistence::Persistence;
        let items = persistence.load_items().await.unwrap();
        let row = items.iter().find(|i| i.id == item_id).unwrap();
        assert_eq!(row.status, ItemStatus::InProgress);

        system.shutdown().await;
    }

    #[tokio::test]
    async fn failed_webhook_rolls_back_to_the_previous_lane() {
        let persistence = Arc::new(InMemoryPersistence::new());
        persistence.insert_order(
            seeded_order("o1", OrderStatus::Pending),
            vec![seeded_item("i1", "o1", ItemStatus::Todo)],
        );
        let (mock, mut calls) = create_mock_workflow(10);
        let system = KitchenSystem::new(persistence, Arc::new(mock));
        wait_for_board(&system.board, |l| l.total() == 1).await;

        let coordinator = system.coordinator.clone();
        let mutation = tokio::spawn(async move {
            coordinator.set_item_status("i1", ItemStatus::InProgress).await
        });

        let call = expect_trigger(&mut calls).await.expect("Expected one webhook call");
        assert_eq!(call.action, WorkflowAction::UpdateItemStatus);
        assert_eq!(call.payload["id"], "i1");
        assert_eq!(call.payload["status"], "in_progress");

        // Optimistic state is visible while the call is in flight.
        let lanes = system.board.lanes().await.unwrap();
        assert_eq!(lanes.in_progress.len(), 1);

        call.respond_to
            .send(Err(WorkflowError::Rejected {
                action: WorkflowAction::UpdateItemStatus,
                status: 500,
            }))
            .unwrap();

        let result = mutation.await.unwrap();
        assert!(matches!(
            result,
            Err(MutationError::Workflow(WorkflowError::Rejected { status: 500, .. }))
        ));

        let lanes = system.board.lanes().await.unwrap();
        assert_eq!(lanes.todo.len(), 1);
        assert!(lanes.in_progress.is_empty());

        system.shutdown().await;
    }

    #[tokio::test]
    async fn second_mutation_on_the_same_item_is_rejected_while_in_flight() {
        let persistence = Arc::new(InMemoryPersistence::new());
        persistence.insert_order(
            seeded_order("o1", OrderStatus::Pending),
            vec![seeded_item("i1", "o1", ItemStatus::Todo)],
        );
        let (mock, mut calls) = create_mock_workflow(10);
        let system = KitchenSystem::new(persistence, Arc::new(mock));
        wait_for_board(&system.board, |l| l.total() == 1).await;

        let coordinator = system.coordinator.clone();
        let first = tokio::spawn(async move {
            coordinator.set_item_status("i1", ItemStatus::InProgress).await
        });
        let call = expect_trigger(&mut calls).await.expect("Expected one webhook call");

        let second = system
            .coordinator
            .set_item_status("i1", ItemStatus::Done)
            .await;
        assert!(matches!(
            second,
            Err(MutationError::Board(BoardError::MutationInFlight(_)))
        ));

        // The first mutation's optimistic write is untouched.
        let lanes = system.board.lanes().await.unwrap();
        assert_eq!(lanes.in_progress.len(), 1);

        call.respond_to.send(Ok(json!({}))).unwrap();
        first.await.unwrap().unwrap();

        system.shutdown().await;
    }

    #[tokio::test]
    async fn unconfigured_status_webhook_aborts_without_touching_the_board() {
        let persistence = Arc::new(InMemoryPersistence::new());
        persistence.insert_order(
            seeded_order("o1", OrderStatus::Pending),
            vec![seeded_item("i1", "o1", ItemStatus::Todo)],
        );
        let (mock, mut calls) = create_mock_workflow(10);
        let mock = mock.unconfigure(WorkflowAction::UpdateItemStatus);
        let system = KitchenSystem::new(persistence, Arc::new(mock));
        wait_for_board(&system.board, |l| l.total() == 1).await;

        let result = system
            .coordinator
            .set_item_status("i1", ItemStatus::InProgress)
            .await;
        assert!(matches!(
            result,
            Err(MutationError::Workflow(WorkflowError::NotConfigured(_)))
        ));

        let lanes = system.board.lanes().await.unwrap();
        assert_eq!(lanes.todo.len(), 1);
        assert!(calls.try_recv().is_err(), "no webhook call may fire");

        system.shutdown().await;
    }

    // --- Change feed behavior ---

    #[tokio::test]
    async fn dropped_subscription_resubscribes_and_reloads() {
        let persistence = Arc::new(InMemoryPersistence::new());
        persistence.insert_order(
            seeded_order("o1", OrderStatus::Pending),
            vec![seeded_item("i1", "o1", ItemStatus::Todo)],
        );

        let (actor, board) = BoardActor::new(32);
        tokio::spawn(actor.run());
        let (shutdown, shutdown_rx) = watch::channel(false);
        let listener = ChangeFeedListener::new(
            persistence.clone(),
            board.clone(),
            shutdown_rx,
            Duration::from_millis(10),
        );
        tokio::spawn(listener.run());

        wait_for_board(&board, |l| l.total() == 1).await;

        // Sever the subscription, then change a row in the gap. The delta
        // notification is lost; only the reload-on-resubscribe can surface it.
        persistence.drop_subscriptions();
        persistence.update_item_status("i1", ItemStatus::Done).unwrap();

        let lanes = wait_for_board(&board, |l| l.done.len() == 1).await;
        assert_eq!(lanes.done[0].id, "i1");

        let _ = shutdown.send(true);
    }

    #[tokio::test]
    async fn unknown_status_notification_is_ignored_not_fatal() {
        let persistence = Arc::new(InMemoryPersistence::new());
        persistence.insert_order(
            seeded_order("o1", OrderStatus::Pending),
            vec![seeded_item("i1", "o1", ItemStatus::Todo)],
        );
        let (mock, _calls) = create_mock_workflow(10);
        let system = KitchenSystem::new(persistence.clone(), Arc::new(mock));
        wait_for_board(&system.board, |l| l.total() == 1).await;

        persistence.emit_raw_item_event(
            EventKind::Update,
            Some(json!({ "id": "i1", "status": "archived", "updated_at": Utc::now() })),
            None,
        );
        sleep(Duration::from_millis(50)).await;

        // Recognized items are all still on the board, in their lanes.
        let lanes = system.board.lanes().await.unwrap();
        assert_eq!(lanes.total(), 1);
        assert_eq!(lanes.todo[0].id, "i1");

        system.shutdown().await;
    }

    #[tokio::test]
    async fn undecodable_and_delete_events_fall_back_to_a_reload() {
        let persistence = Arc::new(InMemoryPersistence::new());
        persistence.insert_order(
            seeded_order("o1", OrderStatus::Pending),
            vec![seeded_item("i1", "o1", ItemStatus::Todo)],
        );
        let (mock, _calls) = create_mock_workflow(10);
        let system = KitchenSystem::new(persistence.clone(), Arc::new(mock));
        wait_for_board(&system.board, |l| l.total() == 1).await;

        persistence.emit_raw_item_event(EventKind::Update, Some(json!({ "garbage": true })), None);
        persistence.emit_raw_item_event(EventKind::Delete, None, Some(json!({ "id": "i1" })));
        sleep(Duration::from_millis(50)).await;

        let lanes = system.board.lanes().await.unwrap();
        assert_eq!(lanes.total(), 1);

        system.shutdown().await;
    }

    // --- Order desk ---

    #[tokio::test]
    async fn create_order_threads_back_the_automation_id() {
        let persistence = Arc::new(InMemoryPersistence::new());
        let (mock, mut calls) = create_mock_workflow(10);
        let system = KitchenSystem::new(persistence, Arc::new(mock));

        let desk = system.desk.clone();
        let create = tokio::spawn(async move {
            let mut order = draft(1);
            order.customer_name = "   ".into();
            desk.create_order(order).await
        });

        let call = expect_trigger(&mut calls).await.expect("Expected create call");
        assert_eq!(call.action, WorkflowAction::CreateOrder);
        // Blank customer names fall back to the walk-up default.
        assert_eq!(call.payload["customer_name"], "Counter");
        call.respond_to.send(Ok(json!({ "order_id": "order_9" }))).unwrap();

        assert_eq!(create.await.unwrap().unwrap(), "order_9");
        system.shutdown().await;
    }

    #[tokio::test]
    async fn create_order_without_an_id_in_the_reply_fails() {
        let persistence = Arc::new(InMemoryPersistence::new());
        let (mock, mut calls) = create_mock_workflow(10);
        let system = KitchenSystem::new(persistence, Arc::new(mock));

        let desk = system.desk.clone();
        let create = tokio::spawn(async move { desk.create_order(draft(1)).await });

        let call = expect_trigger(&mut calls).await.expect("Expected create call");
        call.respond_to.send(Ok(json!({}))).unwrap();

        assert!(matches!(
            create.await.unwrap(),
            Err(OrderError::Workflow(WorkflowError::MissingOrderId { .. }))
        ));
        system.shutdown().await;
    }

    #[tokio::test]
    async fn append_to_a_finalized_order_is_rejected_before_any_call() {
        let persistence = Arc::new(InMemoryPersistence::new());
        persistence.insert_order(
            seeded_order("o1", OrderStatus::Finalized),
            vec![seeded_item("i1", "o1", ItemStatus::Done)],
        );
        let (mock, mut calls) = create_mock_workflow(10);
        let system = KitchenSystem::new(persistence, Arc::new(mock));

        let result = system.desk.append_items("o1", draft(1).items).await;
        assert!(matches!(result, Err(OrderError::Finalized(_))));
        assert!(calls.try_recv().is_err(), "no webhook call may fire");

        system.shutdown().await;
    }

    #[tokio::test]
    async fn finalize_is_archival_and_leaves_items_behind() {
        let persistence = Arc::new(InMemoryPersistence::new());
        let workflow = Arc::new(DirectWorkflow::new(persistence.clone()));
        let system = KitchenSystem::new(persistence.clone(), workflow);

        let order_id = system.desk.create_order(draft(2)).await.unwrap();
        wait_for_board(&system.board, |l| l.total() == 2).await;

        system.desk.finalize_order(&order_id).await.unwrap();

        use crate::persistence::Persistence;
        let order = persistence.load_order(&order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Finalized);
        assert_eq!(order.items.len(), 2, "items stay for history");

        // The board keeps showing them too.
        let lanes = wait_for_board(&system.board, |l| l.total() == 2).await;
        assert_eq!(lanes.todo.len(), 2);

        system.shutdown().await;
    }

    #[tokio::test]
    async fn appended_items_reach_the_board_via_the_feed() {
        let persistence = Arc::new(InMemoryPersistence::new());
        let workflow = Arc::new(DirectWorkflow::new(persistence.clone()));
        let system = KitchenSystem::new(persistence, workflow);

        let order_id = system.desk.create_order(draft(1)).await.unwrap();
        wait_for_board(&system.board, |l| l.total() == 1).await;

        system.desk.append_items(&order_id, draft(2).items).await.unwrap();
        wait_for_board(&system.board, |l| l.total() == 3).await;

        let orders = system.desk.list_orders().await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].items.len(), 3);

        system.shutdown().await;
    }
}
