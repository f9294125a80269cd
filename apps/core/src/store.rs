//! Website and chat request persistence.
//!
//! The responder and the services only talk to [`WebsiteStore`] and
//! [`ChatRequestStore`], so database-backed stores can replace the in-memory
//! ones without touching the matching code.

use async_trait::async_trait;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{ChatRequestRecord, WebsiteProfile};

/// Storage interface for website records.
#[async_trait]
pub trait WebsiteStore: Send + Sync + 'static {
    /// Adds a record. Fails when the id or API key is already taken.
    async fn insert(&self, profile: WebsiteProfile) -> Result<WebsiteProfile, AppError>;

    /// Fetches a record by id.
    async fn get(&self, id: Uuid) -> Result<Option<WebsiteProfile>, AppError>;

    /// Fetches the first record carrying the given API key.
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<WebsiteProfile>, AppError>;

    /// All records, newest first.
    async fn list(&self) -> Result<Vec<WebsiteProfile>, AppError>;

    /// Replaces the record with the same id.
    async fn update(&self, profile: WebsiteProfile) -> Result<WebsiteProfile, AppError>;

    /// Removes a record, returning it.
    async fn delete(&self, id: Uuid) -> Result<WebsiteProfile, AppError>;
}

/// Keeps records in insertion order behind an async lock.
#[derive(Debug, Default)]
pub struct InMemoryWebsiteStore {
    websites: RwLock<Vec<WebsiteProfile>>,
}

impl InMemoryWebsiteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_websites(websites: Vec<WebsiteProfile>) -> Self {
        Self {
            websites: RwLock::new(websites),
        }
    }

    /// Loads a JSON array of website records.
    pub async fn load_from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let websites: Vec<WebsiteProfile> = serde_json::from_str(&raw)?;

        info!("Loaded {} website(s) from {}", websites.len(), path.display());
        Ok(Self::with_websites(websites))
    }

    /// Writes every record back as a JSON array.
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), AppError> {
        let websites = self.websites.read().await;
        let json = serde_json::to_string_pretty(&*websites)?;
        tokio::fs::write(path.as_ref(), json).await?;
        Ok(())
    }
}

#[async_trait]
impl WebsiteStore for InMemoryWebsiteStore {
    async fn insert(&self, profile: WebsiteProfile) -> Result<WebsiteProfile, AppError> {
        let mut websites = self.websites.write().await;
        if websites
            .iter()
            .any(|w| w.id == profile.id || w.api_key == profile.api_key)
        {
            return Err(AppError::Validation(
                "A website with this id or API key already exists".to_string(),
            ));
        }
        websites.push(profile.clone());
        Ok(profile)
    }

    async fn get(&self, id: Uuid) -> Result<Option<WebsiteProfile>, AppError> {
        let websites = self.websites.read().await;
        Ok(websites.iter().find(|w| w.id == id).cloned())
    }

    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<WebsiteProfile>, AppError> {
        let websites = self.websites.read().await;
        Ok(websites.iter().find(|w| w.api_key == api_key).cloned())
    }

    async fn list(&self) -> Result<Vec<WebsiteProfile>, AppError> {
        let websites = self.websites.read().await;
        let mut all = websites.clone();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn update(&self, profile: WebsiteProfile) -> Result<WebsiteProfile, AppError> {
        let mut websites = self.websites.write().await;
        let slot = websites
            .iter_mut()
            .find(|w| w.id == profile.id)
            .ok_or_else(website_not_found)?;
        *slot = profile.clone();
        Ok(profile)
    }

    async fn delete(&self, id: Uuid) -> Result<WebsiteProfile, AppError> {
        let mut websites = self.websites.write().await;
        let index = websites
            .iter()
            .position(|w| w.id == id)
            .ok_or_else(website_not_found)?;
        Ok(websites.remove(index))
    }
}

pub(crate) fn website_not_found() -> AppError {
    AppError::NotFound("Website not found".to_string())
}

/// Storage interface for logged chat requests.
#[async_trait]
pub trait ChatRequestStore: Send + Sync + 'static {
    async fn insert(&self, record: ChatRequestRecord) -> Result<ChatRequestRecord, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<ChatRequestRecord>, AppError>;

    /// All records, newest first.
    async fn list(&self) -> Result<Vec<ChatRequestRecord>, AppError>;

    async fn update(&self, record: ChatRequestRecord) -> Result<ChatRequestRecord, AppError>;

    async fn delete(&self, id: Uuid) -> Result<ChatRequestRecord, AppError>;
}

#[derive(Debug, Default)]
pub struct InMemoryChatRequestStore {
    requests: RwLock<Vec<ChatRequestRecord>>,
}

impl InMemoryChatRequestStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatRequestStore for InMemoryChatRequestStore {
    async fn insert(&self, record: ChatRequestRecord) -> Result<ChatRequestRecord, AppError> {
        let mut requests = self.requests.write().await;
        if requests.iter().any(|r| r.id == record.id) {
            return Err(AppError::Validation(
                "A chat request with this id already exists".to_string(),
            ));
        }
        requests.push(record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ChatRequestRecord>, AppError> {
        let requests = self.requests.read().await;
        Ok(requests.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<ChatRequestRecord>, AppError> {
        let requests = self.requests.read().await;
        let mut all = requests.clone();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn update(&self, record: ChatRequestRecord) -> Result<ChatRequestRecord, AppError> {
        let mut requests = self.requests.write().await;
        let slot = requests
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(chat_request_not_found)?;
        *slot = record.clone();
        Ok(record)
    }

    async fn delete(&self, id: Uuid) -> Result<ChatRequestRecord, AppError> {
        let mut requests = self.requests.write().await;
        let index = requests
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(chat_request_not_found)?;
        Ok(requests.remove(index))
    }
}

pub(crate) fn chat_request_not_found() -> AppError {
    AppError::NotFound("Chat request not found".to_string())
}
