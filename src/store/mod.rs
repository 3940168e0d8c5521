// Cache-reconciling list store over a remote collection.
//
// One store instance manages one entity list for the lifetime of the
// process: it fetches through the entity's API service, keeps the list
// mirrored durably, pins recently-touched records to the top, and
// applies optimistic create/update/delete mutations locally so the UI
// never waits for a refetch.

use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::cache::MirrorStore;
use crate::config::StoreTuning;
use crate::errors::StoreError;
use crate::events::{Notice, NoticeSender};

pub mod filter;
pub mod recency;
pub mod sort;

pub use filter::ListFilter;
pub use recency::RecencyTracker;
pub use sort::{SortDirection, SortKey};

use sort::sort_records;

/// A record type managed by an [`EntityStore`].
pub trait EntityRecord:
    Clone + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Mirror key, which is also the remote collection name.
    const COLLECTION: &'static str;
    /// Vietnamese label used in user-facing notices.
    const LABEL: &'static str;

    fn id(&self) -> &str;
    fn updated_at(&self) -> Option<DateTime<Utc>>;
    /// Stamps the record as modified now.
    fn touch(&mut self, at: DateTime<Utc>);
    /// Lifts a named field into a comparable value for sorting.
    fn sort_value(&self, field: &str) -> sort::FieldValue;
    /// Client-side filter predicate.
    fn matches(&self, filter: &ListFilter) -> bool;
}

/// Remote CRUD surface an entity store drives. List responses stay as
/// raw JSON so the store can merge them field-by-field with the mirror
/// before committing to typed records.
#[async_trait]
pub trait EntityApi<R: EntityRecord>: Send + Sync {
    async fn list(&self) -> Result<Vec<Value>, StoreError>;
    async fn create(&self, payload: &Value) -> Result<R, StoreError>;
    async fn update(&self, id: &str, payload: &Value) -> Result<(), StoreError>;
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page index
    pub page: u64,
    pub page_size: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
        }
    }
}

impl Pagination {
    pub fn new(page: u64, page_size: u64) -> Self {
        Self { page, page_size }
    }

    fn offset(&self) -> usize {
        (self.page.saturating_sub(1) * self.page_size) as usize
    }
}

/// Point-in-time view of a list store.
#[derive(Debug, Clone)]
pub struct ListSnapshot<R> {
    pub items: Vec<R>,
    pub total: u64,
    pub pagination: Pagination,
    pub sort: SortKey,
}

impl<R> ListSnapshot<R> {
    /// The slice of items visible on the current page.
    pub fn page(&self) -> &[R] {
        let start = self.pagination.offset().min(self.items.len());
        let end = (start + self.pagination.page_size as usize).min(self.items.len());
        &self.items[start..end]
    }
}

#[derive(Debug)]
struct ListState<R> {
    items: Vec<R>,
    total: u64,
    pagination: Pagination,
    sort: SortKey,
}

#[derive(Clone)]
pub struct EntityStore<R: EntityRecord> {
    api: Arc<dyn EntityApi<R>>,
    mirror: Arc<dyn MirrorStore>,
    recency: Arc<RecencyTracker>,
    notices: NoticeSender,
    state: Arc<RwLock<ListState<R>>>,
}

impl<R: EntityRecord> EntityStore<R> {
    /// Builds a store and starts its recency sweeper. Must be called
    /// from within a Tokio runtime.
    pub fn new(
        api: Arc<dyn EntityApi<R>>,
        mirror: Arc<dyn MirrorStore>,
        notices: NoticeSender,
        tuning: &StoreTuning,
    ) -> Self {
        let recency = RecencyTracker::start(Duration::from_secs(tuning.touched_ttl_secs));
        Self {
            api,
            mirror,
            recency,
            notices,
            state: Arc::new(RwLock::new(ListState {
                items: Vec::new(),
                total: 0,
                pagination: Pagination::new(1, tuning.page_size),
                sort: SortKey::default(),
            })),
        }
    }

    pub fn recency(&self) -> &RecencyTracker {
        &self.recency
    }

    pub fn snapshot(&self) -> ListSnapshot<R> {
        let state = self.state.read().unwrap();
        Self::snapshot_of(&state)
    }

    /// Loads the list. An unforced, unfiltered call with no live pins
    /// is served straight from the durable mirror when one exists;
    /// everything else goes to the network and reconciles the response
    /// with the mirror by ID, fresh fields winning.
    #[instrument(skip(self, filter), fields(collection = R::COLLECTION))]
    pub async fn fetch_all(
        &self,
        filter: &ListFilter,
        force: bool,
    ) -> Result<ListSnapshot<R>, StoreError> {
        let unfiltered = filter.is_empty();
        if unfiltered && !force && self.recency.is_empty() {
            if let Some(cached) = self.mirror_records().await {
                debug!(count = cached.len(), "serving mirror");
                return Ok(self.install(cached));
            }
        }

        let fresh = match self.api.list().await {
            Ok(values) => values,
            Err(e) => {
                warn!(error = %e, "list fetch failed");
                self.notify_failure(&e).await;
                return Err(e);
            }
        };

        let mirrored = self.mirror_records().await.unwrap_or_default();
        let mut records = reconcile::<R>(fresh, &mirrored);
        if unfiltered {
            self.persist(&records).await;
        } else {
            records.retain(|r| r.matches(filter));
        }
        info!(count = records.len(), "list loaded");
        Ok(self.install(records))
    }

    /// Creates a record remotely, then splices the normalized response
    /// into the cached list as an upsert pinned to the top.
    #[instrument(skip(self, payload), fields(collection = R::COLLECTION))]
    pub async fn create(&self, payload: Value) -> Result<R, StoreError> {
        let created = match self.api.create(&payload).await {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "create failed");
                self.notify_failure(&e).await;
                return Err(e);
            }
        };

        self.recency.mark(created.id());
        let items = {
            let recency = self.recency.clone();
            let mut state = self.state.write().unwrap();
            state.items.retain(|r| r.id() != created.id());
            state.items.insert(0, created.clone());
            let sort = state.sort.clone();
            sort_records(&mut state.items, &sort, |id| recency.contains(id));
            state.total = state.items.len() as u64;
            state.items.clone()
        };
        self.persist(&items).await;
        self.notices
            .send_or_log(Notice::success("Thêm mới thành công"))
            .await;
        info!(id = created.id(), "created");
        Ok(created)
    }

    /// Updates a record remotely, then merges the payload over the
    /// cached record, stamps it, and moves it to the front of the list.
    /// The payload must use the record's own wire field names.
    #[instrument(skip(self, payload), fields(collection = R::COLLECTION))]
    pub async fn update(&self, id: &str, payload: Value) -> Result<R, StoreError> {
        if let Err(e) = self.api.update(id, &payload).await {
            warn!(id, error = %e, "update failed");
            self.notify_failure(&e).await;
            return Err(e);
        }

        let now = Utc::now();
        let (updated, items) = {
            let mut state = self.state.write().unwrap();
            let Some(pos) = state.items.iter().position(|r| r.id() == id) else {
                return Err(StoreError::NotFound(R::LABEL.to_string()));
            };
            let current = state.items.remove(pos);
            let mut base = serde_json::to_value(&current)?;
            merge_value(&mut base, &payload);
            let mut merged: R = match serde_json::from_value(base) {
                Ok(record) => record,
                Err(e) => {
                    state.items.insert(pos, current);
                    return Err(e.into());
                }
            };
            merged.touch(now);
            state.items.insert(0, merged.clone());
            state.total = state.items.len() as u64;
            (merged, state.items.clone())
        };

        self.recency.mark(id);
        self.persist(&items).await;
        self.notices
            .send_or_log(Notice::success("Cập nhật thành công"))
            .await;
        info!(id, "updated");
        Ok(updated)
    }

    /// Deletes a record remotely, then drops it from the cached list
    /// and its pin.
    #[instrument(skip(self), fields(collection = R::COLLECTION))]
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        if let Err(e) = self.api.delete(id).await {
            warn!(id, error = %e, "delete failed");
            self.notify_failure(&e).await;
            return Err(e);
        }

        let items = {
            let mut state = self.state.write().unwrap();
            state.items.retain(|r| r.id() != id);
            state.total = state.items.len() as u64;
            state.items.clone()
        };
        self.recency.unmark(id);
        self.persist(&items).await;
        self.notices
            .send_or_log(Notice::success("Xóa thành công"))
            .await;
        info!(id, "deleted");
        Ok(())
    }

    /// Applies a table interaction: new pagination, optionally a new
    /// sort. Purely local, never refetches.
    pub fn handle_table_change(
        &self,
        pagination: Pagination,
        sorter: Option<SortKey>,
    ) -> ListSnapshot<R> {
        let recency = self.recency.clone();
        let mut state = self.state.write().unwrap();
        state.pagination = pagination;
        if let Some(sort) = sorter {
            state.sort = sort;
            let key = state.sort.clone();
            sort_records(&mut state.items, &key, |id| recency.contains(id));
        }
        Self::snapshot_of(&state)
    }

    fn install(&self, mut items: Vec<R>) -> ListSnapshot<R> {
        let recency = self.recency.clone();
        let mut state = self.state.write().unwrap();
        let sort = state.sort.clone();
        sort_records(&mut items, &sort, |id| recency.contains(id));
        state.items = items;
        state.total = state.items.len() as u64;
        Self::snapshot_of(&state)
    }

    fn snapshot_of(state: &ListState<R>) -> ListSnapshot<R> {
        ListSnapshot {
            items: state.items.clone(),
            total: state.total,
            pagination: state.pagination,
            sort: state.sort.clone(),
        }
    }

    async fn mirror_records(&self) -> Option<Vec<R>> {
        let raw = match self.mirror.load(R::COLLECTION).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(collection = R::COLLECTION, error = %e, "mirror read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(records) => Some(records),
            Err(e) => {
                warn!(collection = R::COLLECTION, error = %e, "corrupt mirror entry ignored");
                None
            }
        }
    }

    async fn notify_failure(&self, e: &StoreError) {
        if !e.reported_at_transport() {
            self.notices.send_or_log(Notice::from_error(e)).await;
        }
    }

    /// Mirror writes are best-effort: the in-memory list is the source
    /// of truth and the mirror catches up on the next successful write.
    async fn persist(&self, items: &[R]) {
        match serde_json::to_string(items) {
            Ok(json) => {
                if let Err(e) = self.mirror.save(R::COLLECTION, &json).await {
                    warn!(collection = R::COLLECTION, error = %e, "mirror write failed");
                }
            }
            Err(e) => {
                warn!(collection = R::COLLECTION, error = %e, "mirror serialize failed");
            }
        }
    }
}

/// Merges a fresh list response with mirrored records by ID. Fresh
/// fields win; mirrored values survive only where the response omitted
/// the field. Membership follows the response: records absent from it
/// are dropped. Unparseable response entries are skipped, not fatal.
fn reconcile<R: EntityRecord>(fresh: Vec<Value>, mirrored: &[R]) -> Vec<R> {
    let mut by_id: std::collections::HashMap<&str, &R> =
        mirrored.iter().map(|r| (r.id(), r)).collect();
    let mut out = Vec::with_capacity(fresh.len());
    for value in fresh {
        let parsed: R = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(e) => {
                warn!(collection = R::COLLECTION, error = %e, "skipping malformed record");
                continue;
            }
        };
        let record = match by_id.remove(parsed.id()) {
            Some(existing) => {
                match merge_records(existing, &parsed) {
                    Ok(merged) => merged,
                    // Fall back to the fresh copy if the merge round-trip fails.
                    Err(_) => parsed,
                }
            }
            None => parsed,
        };
        out.push(record);
    }
    out
}

fn merge_records<R: EntityRecord>(existing: &R, fresh: &R) -> Result<R, StoreError> {
    let mut base = serde_json::to_value(existing)?;
    let overlay = serde_json::to_value(fresh)?;
    merge_value(&mut base, &overlay);
    Ok(serde_json::from_value(base)?)
}

/// Shallow object merge: overlay keys replace base keys wholesale,
/// matching how partial edits are applied over cached records.
fn merge_value(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                base_map.insert(key.clone(), value.clone());
            }
        }
        (base_slot, overlay) => {
            *base_slot = overlay.clone();
        }
    }
}
