//! Ordered knowledge base for one website.
//!
//! Entries are kept in insertion order so that "first entry wins" tie-breaks
//! in the matcher are well defined. Titles are unique under [`title_key`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entry::{title_key, KnowledgeEntry};
use super::normalize::normalize_knowledge_base;
use crate::error::AppError;

/// Replacement payload for a single entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryUpdate {
    /// New title; `None` or blank keeps the current one.
    #[serde(default)]
    pub title: Option<String>,
    /// Values replacing the current ones.
    #[serde(default, alias = "value")]
    pub values: Vec<String>,
}

/// Canonical, ordered list of knowledge entries.
///
/// Deserializing goes through [`normalize_knowledge_base`] and the
/// write-merge rule, so stored data in any accepted shape loads cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Vec<KnowledgeEntry>")]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
}

impl From<Value> for KnowledgeBase {
    fn from(raw: Value) -> Self {
        Self::from_raw(&raw)
    }
}

impl From<KnowledgeBase> for Vec<KnowledgeEntry> {
    fn from(kb: KnowledgeBase) -> Self {
        kb.entries
    }
}

impl FromIterator<KnowledgeEntry> for KnowledgeBase {
    fn from_iter<I: IntoIterator<Item = KnowledgeEntry>>(iter: I) -> Self {
        let mut kb = Self::default();
        kb.merge_entries(iter);
        kb
    }
}

impl KnowledgeBase {
    /// Create an empty knowledge base
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a raw payload and write-merge it into a fresh knowledge base.
    pub fn from_raw(raw: &Value) -> Self {
        normalize_knowledge_base(raw).into_iter().collect()
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry titles in knowledge base order.
    pub fn titles(&self) -> Vec<&str> {
        self.entries.iter().map(KnowledgeEntry::title).collect()
    }

    /// Case-insensitive lookup by title.
    pub fn entry(&self, title: &str) -> Option<&KnowledgeEntry> {
        self.position(title).map(|idx| &self.entries[idx])
    }

    /// Write-merge rule: a colliding title unions its values into the
    /// existing entry, which keeps its spelling and position.
    pub fn merge_entry(&mut self, entry: KnowledgeEntry) {
        match self.position(entry.title()) {
            Some(idx) => self.entries[idx].extend_values(entry.values()),
            None => self.entries.push(entry),
        }
    }

    pub fn merge_entries<I: IntoIterator<Item = KnowledgeEntry>>(&mut self, entries: I) {
        for entry in entries {
            self.merge_entry(entry);
        }
    }

    /// Normalize a raw payload and write-merge it; returns how many entries
    /// the payload contributed.
    pub fn merge_raw(&mut self, raw: &Value) -> usize {
        let entries = normalize_knowledge_base(raw);
        let count = entries.len();
        self.merge_entries(entries);
        count
    }

    /// Replace everything with the normalized payload.
    pub fn replace_all(&mut self, raw: &Value) {
        *self = Self::from_raw(raw);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Add values under a title, creating the entry when it does not exist.
    pub fn add_values<I, V>(&mut self, title: &str, values: I) -> Result<&KnowledgeEntry, AppError>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        let entry = KnowledgeEntry::new(title, values).ok_or_else(|| {
            AppError::Validation("At least one non-empty value is required".to_string())
        })?;
        let key = entry.title().to_string();
        self.merge_entry(entry);
        self.entry(&key)
            .ok_or_else(|| AppError::Internal(format!("Entry '{}' vanished after merge", key)))
    }

    /// Replace the values of an entry, optionally renaming it.
    pub fn update_entry(&mut self, title: &str, update: EntryUpdate) -> Result<&KnowledgeEntry, AppError> {
        let idx = self.position(title).ok_or_else(|| entry_not_found(title))?;

        let new_title = update
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(self.entries[idx].title())
            .to_string();

        if matches!(self.position(&new_title), Some(other) if other != idx) {
            return Err(AppError::Validation(format!(
                "Knowledge entry '{}' already exists",
                new_title
            )));
        }

        let entry = KnowledgeEntry::new(&new_title, update.values).ok_or_else(|| {
            AppError::Validation("At least one non-empty value is required".to_string())
        })?;
        self.entries[idx] = entry;
        Ok(&self.entries[idx])
    }

    /// Remove an entry and return it.
    pub fn delete_entry(&mut self, title: &str) -> Result<KnowledgeEntry, AppError> {
        let idx = self.position(title).ok_or_else(|| entry_not_found(title))?;
        Ok(self.entries.remove(idx))
    }

    /// Remove one value; an entry left without values is removed as well.
    ///
    /// Returns the remaining entry, or `None` when it was removed.
    pub fn delete_value(&mut self, title: &str, value: &str) -> Result<Option<&KnowledgeEntry>, AppError> {
        let idx = self.position(title).ok_or_else(|| entry_not_found(title))?;

        if !self.entries[idx].remove_value(value) {
            return Err(AppError::NotFound(format!(
                "Value '{}' not found in '{}'",
                value.trim(),
                self.entries[idx].title()
            )));
        }

        if self.entries[idx].values().is_empty() {
            self.entries.remove(idx);
            Ok(None)
        } else {
            Ok(Some(&self.entries[idx]))
        }
    }

    fn position(&self, title: &str) -> Option<usize> {
        let key = title_key(title);
        self.entries.iter().position(|e| title_key(e.title()) == key)
    }
}

fn entry_not_found(title: &str) -> AppError {
    AppError::NotFound(format!("Knowledge entry '{}' not found", title.trim()))
}
