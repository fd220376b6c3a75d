use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::{ItemStatus, OrderItem};

/// A status plus the wall-clock time it was written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusEntry {
    pub status: ItemStatus,
    pub updated_at: DateTime<Utc>,
}

/// The locally-believed status of every item the board has loaded.
///
/// Change-feed delivery is at-least-once and unordered relative to local
/// optimistic writes, so `set` is guarded: a write older than the stored
/// entry is dropped. Equal timestamps overwrite, which makes duplicate
/// delivery idempotent.
#[derive(Debug, Default)]
pub struct StatusStore {
    entries: HashMap<String, StatusEntry>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, item_id: &str) -> Option<ItemStatus> {
        self.entries.get(item_id).map(|e| e.status)
    }

    /// Last-write-wins by wall-clock order. Returns `false` when the write
    /// was stale and dropped.
    pub fn set(&mut self, item_id: &str, status: ItemStatus, updated_at: DateTime<Utc>) -> bool {
        if let Some(existing) = self.entries.get(item_id) {
            if updated_at < existing.updated_at {
                return false;
            }
        }
        self.entries
            .insert(item_id.to_string(), StatusEntry { status, updated_at });
        true
    }

    /// Wholesale replacement, used on every full snapshot reload.
    pub fn bulk_replace<'a>(&mut self, items: impl IntoIterator<Item = &'a OrderItem>) {
        self.entries = items
            .into_iter()
            .map(|item| {
                (
                    item.id.clone(),
                    StatusEntry {
                        status: item.status,
                        updated_at: item.updated_at,
                    },
                )
            })
            .collect();
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
