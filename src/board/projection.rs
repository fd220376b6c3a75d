use crate::domain::{ItemStatus, OrderItem};

use super::status_store::StatusStore;

/// The three fixed lanes of the kitchen display, in display order.
/// Creation order is preserved within each lane.
#[derive(Debug, Clone, Default)]
pub struct BoardLanes {
    pub todo: Vec<OrderItem>,
    pub in_progress: Vec<OrderItem>,
    pub done: Vec<OrderItem>,
}

impl BoardLanes {
    #[allow(dead_code)]
    pub fn lane(&self, status: ItemStatus) -> &[OrderItem] {
        match status {
            ItemStatus::Todo => &self.todo,
            ItemStatus::InProgress => &self.in_progress,
            ItemStatus::Done => &self.done,
        }
    }

    pub fn total(&self) -> usize {
        self.todo.len() + self.in_progress.len() + self.done.len()
    }
}

/// Pure projection from the loaded items and the status store to lane
/// assignments. No side effects; recomputed on every read.
///
/// The store is authoritative for status. An item the store has never seen
/// falls back to the status on its own row. Rows whose wire status was not
/// a recognized lane never make it past decoding, so by construction every
/// item here lands in exactly one lane.
pub fn project(items: &[OrderItem], store: &StatusStore) -> BoardLanes {
    let mut lanes = BoardLanes::default();
    for item in items {
        let status = store.get(&item.id).unwrap_or(item.status);
        let mut projected = item.clone();
        projected.status = status;
        match status {
            ItemStatus::Todo => lanes.todo.push(projected),
            ItemStatus::InProgress => lanes.in_progress.push(projected),
            ItemStatus::Done => lanes.done.push(projected),
        }
    }
    lanes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PrepArea;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn item(id: &str, status: ItemStatus, created: i64) -> OrderItem {
        OrderItem {
            id: id.into(),
            order_id: "o1".into(),
            product_name: format!("product for {id}"),
            quantity: 1,
            unit_price: 9.0,
            status,
            prep_area: PrepArea::Kitchen,
            created_at: ts(created),
            updated_at: ts(created),
        }
    }

    #[test]
    fn union_of_lanes_equals_input_set() {
        let items = vec![
            item("i1", ItemStatus::Todo, 1),
            item("i2", ItemStatus::InProgress, 2),
            item("i3", ItemStatus::Done, 3),
            item("i4", ItemStatus::Todo, 4),
        ];
        let mut store = StatusStore::new();
        store.bulk_replace(items.iter());

        let lanes = project(&items, &store);
        assert_eq!(lanes.total(), items.len());

        let mut seen: Vec<&str> = lanes
            .todo
            .iter()
            .chain(&lanes.in_progress)
            .chain(&lanes.done)
            .map(|i| i.id.as_str())
            .collect();
        seen.sort();
        assert_eq!(seen, vec!["i1", "i2", "i3", "i4"]);
    }

    #[test]
    fn creation_order_is_preserved_within_a_lane() {
        let items = vec![
            item("early", ItemStatus::Todo, 1),
            item("middle", ItemStatus::Todo, 2),
            item("late", ItemStatus::Todo, 3),
        ];
        let mut store = StatusStore::new();
        store.bulk_replace(items.iter());

        let lanes = project(&items, &store);
        let ids: Vec<&str> = lanes.todo.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "middle", "late"]);
    }

    #[test]
    fn store_overrides_row_status() {
        let items = vec![item("i1", ItemStatus::Todo, 1)];
        let mut store = StatusStore::new();
        store.bulk_replace(items.iter());
        store.set("i1", ItemStatus::InProgress, ts(10));

        let lanes = project(&items, &store);
        assert!(lanes.todo.is_empty());
        assert_eq!(lanes.in_progress[0].id, "i1");
        assert_eq!(lanes.in_progress[0].status, ItemStatus::InProgress);
    }

    #[test]
    fn item_missing_from_store_falls_back_to_row_status() {
        let items = vec![item("i1", ItemStatus::Done, 1)];
        let store = StatusStore::new();

        let lanes = project(&items, &store);
        assert_eq!(lanes.done.len(), 1);
    }
}
