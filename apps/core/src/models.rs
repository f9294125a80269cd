use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::knowledge::KnowledgeBase;

/// Category assigned to websites created without one.
pub const DEFAULT_CATEGORY: &str = "General";

/// Whether a website's chat widget is enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebsiteStatus {
    #[default]
    Active,
    Inactive,
}

impl fmt::Display for WebsiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebsiteStatus::Active => write!(f, "active"),
            WebsiteStatus::Inactive => write!(f, "inactive"),
        }
    }
}

impl FromStr for WebsiteStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "active" => Ok(WebsiteStatus::Active),
            "inactive" => Ok(WebsiteStatus::Inactive),
            _ => Err(AppError::Validation("Invalid status".to_string())),
        }
    }
}

/// Represents a website registered for the chat widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteProfile {
    /// The unique identifier for the website (UUID).
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Display name of the website.
    #[serde(default)]
    pub website_name: String,
    /// Public URL of the website.
    #[serde(default)]
    pub website_url: String,
    /// Business categories the chat answers questions about.
    #[serde(default = "default_categories")]
    pub category: Vec<String>,
    /// Key presented by the chat widget.
    #[serde(default = "generate_api_key")]
    pub api_key: String,
    /// Whether the widget is enabled.
    #[serde(default)]
    pub status: WebsiteStatus,
    /// Knowledge base the answers come from.
    #[serde(default, rename = "aifuture")]
    pub knowledge: KnowledgeBase,
    /// Prompts for the generative backend, stored as sent.
    #[serde(default, deserialize_with = "array_or_empty")]
    pub system_prompt: Vec<Value>,
    #[serde(default, deserialize_with = "array_or_empty")]
    pub custom_prompt: Vec<Value>,
    /// Extra pages registered by the website owner.
    #[serde(default, deserialize_with = "array_or_empty")]
    pub urls: Vec<Value>,
    /// Media and document references.
    #[serde(default, deserialize_with = "array_or_empty")]
    pub library: Vec<Value>,
    /// Creation time.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl WebsiteProfile {
    /// Mark the record as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Payload for registering a website.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewWebsite {
    #[validate(length(min = 1, max = 200))]
    pub website_name: String,
    #[serde(default)]
    #[validate(url)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub category: Vec<String>,
    /// Caller-chosen key; generated when absent.
    #[serde(default)]
    #[validate(length(min = 8))]
    pub api_key: Option<String>,
    #[serde(default)]
    pub status: Option<WebsiteStatus>,
    /// Initial knowledge payload in any accepted shape.
    #[serde(default)]
    pub aifuture: Value,
    #[serde(default, deserialize_with = "array_or_empty")]
    pub system_prompt: Vec<Value>,
    #[serde(default, deserialize_with = "array_or_empty")]
    pub custom_prompt: Vec<Value>,
    #[serde(default, deserialize_with = "array_or_empty")]
    pub urls: Vec<Value>,
    #[serde(default, deserialize_with = "array_or_empty")]
    pub library: Vec<Value>,
}

impl NewWebsite {
    /// Validate and turn into a stored record.
    pub fn into_profile(self) -> Result<WebsiteProfile, AppError> {
        self.validate()?;
        let website_name = required_name(&self.website_name)?;

        let now = Utc::now();
        Ok(WebsiteProfile {
            id: Uuid::new_v4(),
            website_name,
            website_url: self.website_url.unwrap_or_default(),
            category: clean_categories(self.category),
            api_key: self.api_key.unwrap_or_else(generate_api_key),
            status: self.status.unwrap_or_default(),
            knowledge: KnowledgeBase::from_raw(&self.aifuture),
            system_prompt: self.system_prompt,
            custom_prompt: self.custom_prompt,
            urls: self.urls,
            library: self.library,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Full replacement of a website's editable fields.
///
/// Absent fields reset to their defaults. The id, API key, knowledge base and
/// creation time are kept.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteUpdate {
    #[serde(default)]
    #[validate(length(max = 200))]
    pub website_name: String,
    #[serde(default)]
    #[validate(url)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub status: Option<WebsiteStatus>,
    #[serde(default, deserialize_with = "array_or_empty")]
    pub system_prompt: Vec<Value>,
    #[serde(default, deserialize_with = "array_or_empty")]
    pub custom_prompt: Vec<Value>,
    #[serde(default, deserialize_with = "array_or_empty")]
    pub urls: Vec<Value>,
    #[serde(default, deserialize_with = "array_or_empty")]
    pub library: Vec<Value>,
}

impl WebsiteUpdate {
    pub fn apply_to(self, profile: &mut WebsiteProfile) -> Result<(), AppError> {
        self.validate()?;
        profile.website_name = required_name(&self.website_name)?;
        profile.website_url = self.website_url.unwrap_or_default();
        profile.category = clean_categories(self.category);
        profile.status = self.status.unwrap_or_default();
        profile.system_prompt = self.system_prompt;
        profile.custom_prompt = self.custom_prompt;
        profile.urls = self.urls;
        profile.library = self.library;
        Ok(())
    }
}

/// Replacement of the owner-managed extras only; non-array values clear them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomDataUpdate {
    #[serde(default, deserialize_with = "array_or_empty")]
    pub custom_prompt: Vec<Value>,
    #[serde(default, deserialize_with = "array_or_empty")]
    pub urls: Vec<Value>,
    #[serde(default, deserialize_with = "array_or_empty")]
    pub library: Vec<Value>,
}

impl CustomDataUpdate {
    pub fn apply_to(self, profile: &mut WebsiteProfile) {
        profile.custom_prompt = self.custom_prompt;
        profile.urls = self.urls;
        profile.library = self.library;
    }
}

fn required_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Website name is required".to_string()));
    }
    Ok(name.to_string())
}

/// Trimmed non-blank categories, or the default one.
fn clean_categories(category: Vec<String>) -> Vec<String> {
    let category: Vec<String> = category
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if category.is_empty() {
        default_categories()
    } else {
        category
    }
}

/// Any JSON value; only arrays are kept.
fn array_or_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => Vec::new(),
    })
}

fn default_categories() -> Vec<String> {
    vec![DEFAULT_CATEGORY.to_string()]
}

/// Follow-up state of a chat request collected by the widget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRequestStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl ChatRequestStatus {
    pub const ALL: [ChatRequestStatus; 4] = [
        ChatRequestStatus::Pending,
        ChatRequestStatus::Confirmed,
        ChatRequestStatus::Cancelled,
        ChatRequestStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRequestStatus::Pending => "pending",
            ChatRequestStatus::Confirmed => "confirmed",
            ChatRequestStatus::Cancelled => "cancelled",
            ChatRequestStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for ChatRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatRequestStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                AppError::Validation(
                    "Invalid status. Must be: pending, confirmed, cancelled, or completed"
                        .to_string(),
                )
            })
    }
}

/// Visitor details a chat widget collected for one website, e.g. a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestRecord {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub website_id: String,
    /// Key of the backend that submitted the request.
    pub backend_api_key: String,
    /// Free-form form data, stored as sent.
    pub collected_data: Value,
    #[serde(default)]
    pub status: ChatRequestStatus,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// Payload for logging a chat request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChatRequest {
    #[serde(default)]
    pub website_id: String,
    #[serde(default)]
    pub collected_data: Value,
    #[serde(default)]
    pub backend_api_key: String,
    #[serde(default)]
    pub status: Option<ChatRequestStatus>,
}

impl NewChatRequest {
    /// Validate in field order and turn into a stored record.
    pub fn into_record(self) -> Result<ChatRequestRecord, AppError> {
        let website_id = self.website_id.trim();
        if website_id.is_empty() {
            return Err(AppError::Validation("Website ID is required".to_string()));
        }
        let backend_api_key = self.backend_api_key.trim();
        if backend_api_key.is_empty() {
            return Err(AppError::Validation("Backend API Key is required".to_string()));
        }
        if is_blank_data(&self.collected_data) {
            return Err(AppError::Validation("Collected data is required".to_string()));
        }

        let now = Utc::now();
        Ok(ChatRequestRecord {
            id: Uuid::new_v4(),
            website_id: website_id.to_string(),
            backend_api_key: backend_api_key.to_string(),
            collected_data: self.collected_data,
            status: self.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
    }
}

fn is_blank_data(data: &Value) -> bool {
    match data {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

fn generate_api_key() -> String {
    Uuid::new_v4().to_string()
}
