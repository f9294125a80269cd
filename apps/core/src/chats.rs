//! Chat request log.
//!
//! Widgets submit the details a visitor left in the chat (a booking, a call
//! back). Website owners list them, move them through their status and read
//! per-status counts.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{ChatRequestRecord, ChatRequestStatus, NewChatRequest};
use crate::store::{chat_request_not_found, ChatRequestStore};

/// Page size when a listing names no limit.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Page size of the per-website and per-key listings.
pub const SCOPED_LIST_LIMIT: usize = 50;

/// Records scanned when computing statistics.
const STATS_SAMPLE: usize = 1000;

/// Records shown in the `recent` slice of the statistics.
const RECENT_COUNT: usize = 10;

/// Listing query. Only the first of backend key, website and status that is
/// set narrows the result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestFilter {
    #[serde(default)]
    pub backend_api_key: Option<String>,
    #[serde(default)]
    pub website_id: Option<String>,
    #[serde(default)]
    pub status: Option<ChatRequestStatus>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl ChatRequestFilter {
    fn selects(&self, record: &ChatRequestRecord) -> bool {
        if let Some(key) = non_blank(&self.backend_api_key) {
            record.backend_api_key == key
        } else if let Some(website_id) = non_blank(&self.website_id) {
            record.website_id == website_id
        } else if let Some(status) = self.status {
            record.status == status
        } else {
            true
        }
    }
}

/// Counts per status plus the newest records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatStats {
    pub total: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub cancelled: usize,
    pub completed: usize,
    pub recent: Vec<ChatRequestRecord>,
}

impl ChatStats {
    fn from_records(records: Vec<ChatRequestRecord>) -> Self {
        let count =
            |status: ChatRequestStatus| records.iter().filter(|r| r.status == status).count();
        Self {
            total: records.len(),
            pending: count(ChatRequestStatus::Pending),
            confirmed: count(ChatRequestStatus::Confirmed),
            cancelled: count(ChatRequestStatus::Cancelled),
            completed: count(ChatRequestStatus::Completed),
            recent: records.iter().take(RECENT_COUNT).cloned().collect(),
        }
    }
}

pub struct ChatRequestService<S: ChatRequestStore> {
    store: Arc<S>,
}

impl<S: ChatRequestStore> Clone for ChatRequestService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ChatRequestStore> ChatRequestService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, request), fields(website_id = %request.website_id, backend_key = %masked(&request.backend_api_key)))]
    pub async fn create(&self, request: NewChatRequest) -> Result<ChatRequestRecord, AppError> {
        let record = self.store.insert(request.into_record()?).await?;
        info!("Logged chat request {} ({})", record.id, record.status);
        Ok(record)
    }

    /// Newest first, narrowed by the filter and cut to its limit.
    pub async fn list(&self, filter: &ChatRequestFilter) -> Result<Vec<ChatRequestRecord>, AppError> {
        let limit = filter.limit.unwrap_or(DEFAULT_LIST_LIMIT);
        Ok(self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|record| filter.selects(record))
            .take(limit)
            .collect())
    }

    pub async fn list_by_website(
        &self,
        website_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ChatRequestRecord>, AppError> {
        self.list(&ChatRequestFilter {
            website_id: Some(website_id.to_string()),
            limit: Some(limit.unwrap_or(SCOPED_LIST_LIMIT)),
            ..Default::default()
        })
        .await
    }

    pub async fn list_by_backend_api_key(
        &self,
        backend_api_key: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ChatRequestRecord>, AppError> {
        self.list(&ChatRequestFilter {
            backend_api_key: Some(backend_api_key.to_string()),
            limit: Some(limit.unwrap_or(SCOPED_LIST_LIMIT)),
            ..Default::default()
        })
        .await
    }

    pub async fn get(&self, id: Uuid) -> Result<ChatRequestRecord, AppError> {
        self.store.get(id).await?.ok_or_else(chat_request_not_found)
    }

    /// Sets the status from its wire name. The name is checked before the
    /// record is looked up.
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: Uuid, status: &str) -> Result<ChatRequestRecord, AppError> {
        let status: ChatRequestStatus = status.parse()?;
        let mut record = self.get(id).await?;
        record.status = status;
        record.updated_at = Utc::now();
        let record = self.store.update(record).await?;
        info!("Chat request {} is now {}", record.id, record.status);
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<ChatRequestRecord, AppError> {
        self.store.delete(id).await
    }

    /// Statistics over the newest records. Website and backend key both
    /// narrow the sample when given.
    pub async fn stats(
        &self,
        website_id: Option<&str>,
        backend_api_key: Option<&str>,
    ) -> Result<ChatStats, AppError> {
        let website_id = website_id.map(str::trim).filter(|w| !w.is_empty());
        let backend_api_key = backend_api_key.map(str::trim).filter(|k| !k.is_empty());

        let records: Vec<ChatRequestRecord> = self
            .store
            .list()
            .await?
            .into_iter()
            .take(STATS_SAMPLE)
            .filter(|r| backend_api_key.map_or(true, |key| r.backend_api_key == key))
            .filter(|r| website_id.map_or(true, |id| r.website_id == id))
            .collect();

        Ok(ChatStats::from_records(records))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Last four characters of a key, for logs.
fn masked(key: &str) -> String {
    let tail: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("***{}", tail)
}
