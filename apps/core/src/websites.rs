//! Website management and knowledge editing.
//!
//! Every mutation loads the record, edits it, bumps `updated_at` and writes it
//! back through the [`WebsiteStore`].

use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::AppError;
use crate::knowledge::{EntryUpdate, KnowledgeBase, KnowledgeEntry};
use crate::models::{CustomDataUpdate, NewWebsite, WebsiteProfile, WebsiteStatus, WebsiteUpdate};
use crate::store::{website_not_found, WebsiteStore};

pub struct WebsiteService<S: WebsiteStore> {
    store: Arc<S>,
}

impl<S: WebsiteStore> Clone for WebsiteService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: WebsiteStore> WebsiteService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    #[instrument(skip(self, new_website), fields(name = %new_website.website_name))]
    pub async fn create_website(&self, new_website: NewWebsite) -> Result<WebsiteProfile, AppError> {
        let profile = new_website.into_profile()?;
        let profile = self.store.insert(profile).await?;
        info!(
            "Created website {} with {} knowledge entries",
            profile.id,
            profile.knowledge.len()
        );
        Ok(profile)
    }

    pub async fn list_websites(&self) -> Result<Vec<WebsiteProfile>, AppError> {
        self.store.list().await
    }

    pub async fn get_website(&self, id: Uuid) -> Result<WebsiteProfile, AppError> {
        self.store.get(id).await?.ok_or_else(website_not_found)
    }

    /// Looks a website up by the key its widget presents.
    pub async fn website_by_api_key(&self, api_key: &str) -> Result<WebsiteProfile, AppError> {
        self.store
            .find_by_api_key(api_key.trim())
            .await?
            .ok_or_else(website_not_found)
    }

    /// Replaces every editable field; see [`WebsiteUpdate`].
    #[instrument(skip(self, update))]
    pub async fn update_website(
        &self,
        id: Uuid,
        update: WebsiteUpdate,
    ) -> Result<WebsiteProfile, AppError> {
        self.modify(id, |profile| update.apply_to(profile)).await
    }

    /// Replaces the custom prompts, URLs and library, leaving the rest alone.
    #[instrument(skip(self, update))]
    pub async fn update_custom_data(
        &self,
        id: Uuid,
        update: CustomDataUpdate,
    ) -> Result<WebsiteProfile, AppError> {
        self.modify(id, |profile| {
            update.apply_to(profile);
            Ok(())
        })
        .await
    }

    /// Sets the status from its wire name (`active` or `inactive`).
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: Uuid, status: &str) -> Result<WebsiteProfile, AppError> {
        let status: WebsiteStatus = status.parse()?;
        self.modify(id, |profile| {
            profile.status = status;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete_website(&self, id: Uuid) -> Result<WebsiteProfile, AppError> {
        let removed = self.store.delete(id).await?;
        info!("Deleted website {}", removed.id);
        Ok(removed)
    }

    pub async fn knowledge(&self, id: Uuid) -> Result<KnowledgeBase, AppError> {
        Ok(self.get_website(id).await?.knowledge)
    }

    /// Replaces the whole knowledge base with a normalized payload.
    #[instrument(skip(self, raw))]
    pub async fn replace_knowledge(&self, id: Uuid, raw: &Value) -> Result<KnowledgeBase, AppError> {
        let profile = self
            .modify(id, |profile| {
                profile.knowledge.replace_all(raw);
                Ok(())
            })
            .await?;
        Ok(profile.knowledge)
    }

    /// Write-merges a payload into the existing knowledge.
    #[instrument(skip(self, raw))]
    pub async fn add_knowledge(&self, id: Uuid, raw: &Value) -> Result<KnowledgeBase, AppError> {
        let profile = self
            .modify(id, |profile| {
                if profile.knowledge.merge_raw(raw) == 0 {
                    return Err(AppError::Validation(
                        "No valid knowledge entries found in payload".to_string(),
                    ));
                }
                Ok(())
            })
            .await?;
        Ok(profile.knowledge)
    }

    pub async fn clear_knowledge(&self, id: Uuid) -> Result<(), AppError> {
        self.modify(id, |profile| {
            profile.knowledge.clear();
            Ok(())
        })
        .await?;
        Ok(())
    }

    pub async fn knowledge_titles(&self, id: Uuid) -> Result<Vec<String>, AppError> {
        let knowledge = self.knowledge(id).await?;
        Ok(knowledge.titles().into_iter().map(str::to_string).collect())
    }

    pub async fn knowledge_entry(&self, id: Uuid, title: &str) -> Result<KnowledgeEntry, AppError> {
        self.knowledge(id)
            .await?
            .entry(title)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Knowledge entry '{}' not found", title.trim())))
    }

    pub async fn update_knowledge_entry(
        &self,
        id: Uuid,
        title: &str,
        update: EntryUpdate,
    ) -> Result<KnowledgeEntry, AppError> {
        let mut updated = None;
        self.modify(id, |profile| {
            updated = Some(profile.knowledge.update_entry(title, update)?.clone());
            Ok(())
        })
        .await?;
        updated.ok_or_else(|| AppError::Internal("Entry update produced no result".to_string()))
    }

    pub async fn delete_knowledge_entry(&self, id: Uuid, title: &str) -> Result<KnowledgeEntry, AppError> {
        let mut removed = None;
        self.modify(id, |profile| {
            removed = Some(profile.knowledge.delete_entry(title)?);
            Ok(())
        })
        .await?;
        removed.ok_or_else(|| AppError::Internal("Entry delete produced no result".to_string()))
    }

    /// Removes a single value; `None` when the entry went away with it.
    pub async fn delete_knowledge_value(
        &self,
        id: Uuid,
        title: &str,
        value: &str,
    ) -> Result<Option<KnowledgeEntry>, AppError> {
        let mut remaining = None;
        self.modify(id, |profile| {
            remaining = profile.knowledge.delete_value(title, value)?.cloned();
            Ok(())
        })
        .await?;
        Ok(remaining)
    }

    async fn modify<F>(&self, id: Uuid, edit: F) -> Result<WebsiteProfile, AppError>
    where
        F: FnOnce(&mut WebsiteProfile) -> Result<(), AppError>,
    {
        let mut profile = self.get_website(id).await?;
        edit(&mut profile)?;
        profile.touch();
        self.store.update(profile).await
    }
}
