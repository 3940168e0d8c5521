//! Redirect-surviving checkout staging.
//!
//! Paying through the gateway means a full page navigation away from the
//! app and back. Everything the finalize step needs afterwards is parked in
//! two single-slot mirror keys: `pendingOrder` holds the assembled draft
//! while the shopper is on the gateway page, `completedOrder` carries the
//! result to the thank-you page. Both slots are overwritten wholesale, one
//! checkout attempt at a time.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::{keys, MirrorStore};
use crate::entities::{OrderDraft, PaymentMethod};
use crate::errors::StoreError;

/// The staged order, written before redirecting to the gateway.
///
/// `temp_order_id` is a client-side placeholder only; it is never sent to
/// order creation. `created_order_id` is set exactly once, after the real
/// order exists server side, and is the durable half of the idempotence
/// guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOrder {
    pub temp_order_id: String,
    /// Owner of the cart to clear once the order exists.
    pub customer_id: String,
    pub draft: OrderDraft,
    pub amount: i64,
    pub order_info: String,
    pub staged_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_order_id: Option<String>,
}

impl PendingOrder {
    pub fn new(
        temp_order_id: String,
        customer_id: String,
        draft: OrderDraft,
        order_info: String,
    ) -> Self {
        Self {
            temp_order_id,
            customer_id,
            amount: draft.total_amount,
            order_info,
            draft,
            staged_at: Utc::now(),
            transaction_id: None,
            bank_code: None,
            created_order_id: None,
        }
    }
}

/// Finalize result handed to the thank-you page across the page boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedOrder {
    pub order_id: String,
    pub amount: i64,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_code: Option<String>,
    pub completed_at: DateTime<Utc>,
}

/// Accessor over the two staging slots.
#[derive(Clone)]
pub struct StagingStore {
    mirror: Arc<dyn MirrorStore>,
}

impl StagingStore {
    pub fn new(mirror: Arc<dyn MirrorStore>) -> Self {
        Self { mirror }
    }

    /// Writes the pending order, replacing whatever was staged before.
    pub async fn stage(&self, pending: &PendingOrder) -> Result<(), StoreError> {
        let raw = serde_json::to_string(pending)?;
        self.mirror.save(keys::PENDING_ORDER, &raw).await?;
        Ok(())
    }

    /// Loads the staged order. A corrupt slot is treated as absent, the
    /// shopper can only restart checkout at that point anyway.
    pub async fn pending(&self) -> Result<Option<PendingOrder>, StoreError> {
        let Some(raw) = self.mirror.load(keys::PENDING_ORDER).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(pending) => Ok(Some(pending)),
            Err(err) => {
                warn!(%err, "discarding unreadable pending order slot");
                Ok(None)
            }
        }
    }

    pub async fn clear_pending(&self) -> Result<(), StoreError> {
        self.mirror.remove(keys::PENDING_ORDER).await?;
        Ok(())
    }

    pub async fn store_completed(&self, completed: &CompletedOrder) -> Result<(), StoreError> {
        let raw = serde_json::to_string(completed)?;
        self.mirror.save(keys::COMPLETED_ORDER, &raw).await?;
        Ok(())
    }

    /// Takes the completed-order slot, clearing it. The thank-you page reads
    /// it once; a reload after that falls back to the order list.
    pub async fn take_completed(&self) -> Result<Option<CompletedOrder>, StoreError> {
        let Some(raw) = self.mirror.load(keys::COMPLETED_ORDER).await? else {
            return Ok(None);
        };
        self.mirror.remove(keys::COMPLETED_ORDER).await?;
        match serde_json::from_str(&raw) {
            Ok(completed) => Ok(Some(completed)),
            Err(err) => {
                warn!(%err, "discarding unreadable completed order slot");
                Ok(None)
            }
        }
    }
}
