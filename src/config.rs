use std::env;

use tracing::warn;

use crate::workflow::WorkflowAction;

/// Webhook endpoints, one per workflow action. Loaded from the environment;
/// an absent variable leaves the action unconfigured, which surfaces as a
/// fail-fast error when that action is first used, never as a panic.
#[derive(Debug, Clone, Default)]
pub struct WebhookConfig {
    pub create_order: Option<String>,
    pub append_items: Option<String>,
    pub finalize_order: Option<String>,
    pub item_status: Option<String>,
}

impl WebhookConfig {
    pub fn from_env() -> Self {
        Self {
            create_order: load("KDS_WEBHOOK_CREATE_ORDER"),
            append_items: load("KDS_WEBHOOK_APPEND_ITEMS"),
            finalize_order: load("KDS_WEBHOOK_FINALIZE_ORDER"),
            item_status: load("KDS_WEBHOOK_ITEM_STATUS"),
        }
    }

    pub fn endpoint(&self, action: WorkflowAction) -> Option<&str> {
        match action {
            WorkflowAction::CreateOrder => self.create_order.as_deref(),
            WorkflowAction::AppendItems => self.append_items.as_deref(),
            WorkflowAction::FinalizeOrder => self.finalize_order.as_deref(),
            WorkflowAction::UpdateItemStatus => self.item_status.as_deref(),
        }
    }
}

fn load(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => {
            warn!("{key} not set, the matching action stays unconfigured");
            None
        }
    }
}
