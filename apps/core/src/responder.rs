//! Request orchestration for the chat widget.
//!
//! [`ChatResponder`] is the entry point a transport layer calls: it validates
//! the request, resolves the website from its API key, runs the matcher and the
//! composer, and optionally applies the personality pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};

use crate::brain::{
    apply_personality, compose_direct_response, compose_response, render_match, FallbackContext,
    MatchKind, MatchPlan, MatchResult, Matcher, PersonalityConfig, PersonalityOverrides,
    PhrasePicker, QueryIntent, RngPicker,
};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::WebsiteProfile;
use crate::rate_limiter::RateLimiter;
use crate::store::WebsiteStore;

/// A question sent by the chat widget.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub api_key: String,
    /// Per-request personality options; presence turns the personality pass on.
    #[serde(default)]
    pub personality: Option<PersonalityOverrides>,
}

impl ChatRequest {
    pub fn new(question: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            api_key: api_key.into(),
            personality: None,
        }
    }

    pub fn with_personality(mut self, overrides: PersonalityOverrides) -> Self {
        self.personality = Some(overrides);
        self
    }
}

/// Reply of the main chat operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub success: bool,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_kind: Option<MatchKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_title: Option<String>,
}

/// Entry data behind a direct reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedData {
    pub title: String,
    /// Set for value matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Set for title matches.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

impl From<&MatchResult> for MatchedData {
    fn from(outcome: &MatchResult) -> Self {
        if outcome.kind.is_title() {
            Self {
                title: outcome.entry_title.clone(),
                value: None,
                values: outcome.matched_values.clone(),
            }
        } else {
            Self {
                title: outcome.entry_title.clone(),
                value: outcome.matched_values.first().cloned(),
                values: Vec::new(),
            }
        }
    }
}

/// Question type reported by the direct operation, taken from the intent
/// rather than from the strategy that matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    TitleMatch,
    ValueMatch,
}

impl From<QueryIntent> for MatchType {
    fn from(intent: QueryIntent) -> Self {
        match intent {
            QueryIntent::ListRequest => MatchType::TitleMatch,
            QueryIntent::Specific => MatchType::ValueMatch,
        }
    }
}

/// Reply of the direct operation, which exposes the match itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectReply {
    pub success: bool,
    pub response: String,
    pub has_match: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_data: Option<MatchedData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_kind: Option<MatchKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_type: Option<MatchType>,
    /// Only on misses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_titles: Option<Vec<String>>,
    /// Only on misses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_categories: Option<Vec<String>>,
}

/// Public summary of the website behind an API key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteSummary {
    pub name: String,
    pub url: String,
    pub categories: Vec<String>,
    #[serde(rename = "hasAifutureData")]
    pub has_knowledge: bool,
    pub available_titles: Vec<String>,
}

/// Outcome of an API key check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyValidation {
    pub success: bool,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<WebsiteSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Liveness report.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub websites: usize,
}

/// Answers widget questions from a website store.
pub struct ChatResponder<S: WebsiteStore> {
    store: Arc<S>,
    config: AppConfig,
    matcher: Matcher,
    picker: Mutex<Box<dyn PhrasePicker + Send>>,
    limiter: Mutex<RateLimiter>,
}

impl<S: WebsiteStore> ChatResponder<S> {
    /// Creates a responder whose personality phrases are picked at random.
    pub fn new(store: Arc<S>, config: AppConfig) -> Self {
        let limiter = RateLimiter::new(config.rate_limit, config.rate_window);
        Self {
            store,
            config,
            matcher: Matcher::new(),
            picker: Mutex::new(Box::new(RngPicker::from_entropy())),
            limiter: Mutex::new(limiter),
        }
    }

    /// Replaces the phrase picker, e.g. with a seeded one for reproducible output.
    pub fn with_picker(mut self, picker: impl PhrasePicker + Send + 'static) -> Self {
        self.picker = Mutex::new(Box::new(picker));
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Answers a visitor question.
    ///
    /// 1. Validates the question and the API key.
    /// 2. Resolves the website and applies the per-key rate limit.
    /// 3. Matches the question against the knowledge base and composes the reply.
    ///    A value that renders to nothing does not count as a match.
    /// 4. Runs the personality pass when the request carries overrides or
    ///    the configuration enables it.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank question or key, `NotFound` for an unknown key,
    /// `RateLimited` when the key exceeded its budget.
    #[instrument(skip(self, request), fields(question_len = request.question.len()))]
    pub async fn generate_response(&self, request: &ChatRequest) -> Result<ChatReply, AppError> {
        let question = request.question.trim();
        if question.is_empty() {
            return Err(AppError::Validation("Please provide a question".to_string()));
        }

        let profile = self
            .resolve_website(&request.api_key, "Invalid API key or website not found")
            .await?;
        self.check_rate(&profile.api_key)?;

        let categories = self.categories_for(&profile);
        let intent = self.matcher.intent(question);
        let rendered = self.matcher.find_match_with(
            question,
            &profile.knowledge,
            intent,
            MatchPlan::Chat,
            render_match,
        );
        let (outcome, mut response) = match rendered {
            Some((found, text)) => (Some(found), text),
            None => {
                let ctx = FallbackContext::new(question, &categories, &profile.knowledge);
                (None, compose_response(None, &ctx))
            }
        };

        if request.personality.is_some() || self.config.personality_enabled {
            let overrides = request.personality.clone().unwrap_or_default();
            let personality = PersonalityConfig::resolve(&overrides);
            let mut picker = self
                .picker
                .lock()
                .map_err(|_| AppError::Internal("Phrase picker lock poisoned".to_string()))?;
            response = apply_personality(&response, &personality, &mut **picker);
        }

        match &outcome {
            Some(m) => info!("Answered from '{}' ({:?})", m.entry_title, m.kind),
            None => info!("No knowledge match, sent fallback reply"),
        }

        Ok(ChatReply {
            success: true,
            response,
            match_kind: outcome.as_ref().map(|m| m.kind),
            matched_title: outcome.map(|m| m.entry_title),
        })
    }

    /// Answers a question without the personality pass, exposing the matched
    /// entry or, on a miss, the titles and categories the visitor can ask about.
    ///
    /// List requests are answered from titles only. A match only counts when
    /// it renders to text.
    #[instrument(skip(self, request))]
    pub async fn direct_response(&self, request: &ChatRequest) -> Result<DirectReply, AppError> {
        let question = request.question.trim();
        if question.is_empty() {
            return Err(AppError::Validation("Question is required".to_string()));
        }

        let profile = self.resolve_website(&request.api_key, "Invalid API key").await?;
        self.check_rate(&profile.api_key)?;

        let categories = self.categories_for(&profile);
        let intent = self.matcher.intent(question);
        let rendered = self.matcher.find_match_with(
            question,
            &profile.knowledge,
            intent,
            MatchPlan::Direct,
            render_match,
        );

        let reply = match rendered {
            Some((found, response)) => DirectReply {
                success: true,
                response,
                has_match: true,
                matched_data: Some(MatchedData::from(&found)),
                match_kind: Some(found.kind),
                match_type: Some(MatchType::from(intent)),
                available_titles: None,
                available_categories: None,
            },
            None => {
                let ctx = FallbackContext::new(question, &categories, &profile.knowledge);
                DirectReply {
                    success: true,
                    response: compose_direct_response(None, &ctx),
                    has_match: false,
                    matched_data: None,
                    match_kind: None,
                    match_type: None,
                    available_titles: Some(owned_titles(&profile)),
                    available_categories: Some(categories),
                }
            }
        };
        debug!("Direct reply has_match={}", reply.has_match);
        Ok(reply)
    }

    /// Reports whether an API key belongs to a website and summarizes it.
    ///
    /// An unknown key is not an error: the result carries `valid: false`.
    #[instrument(skip(self, api_key))]
    pub async fn validate_api_key(&self, api_key: &str) -> Result<KeyValidation, AppError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(AppError::Validation("API key is required".to_string()));
        }

        let Some(profile) = self.store.find_by_api_key(api_key).await? else {
            return Ok(KeyValidation {
                success: true,
                valid: false,
                website: None,
                message: Some("Invalid API key".to_string()),
            });
        };

        Ok(KeyValidation {
            success: true,
            valid: true,
            website: Some(WebsiteSummary {
                name: profile.website_name.clone(),
                url: profile.website_url.clone(),
                categories: self.categories_for(&profile),
                has_knowledge: !profile.knowledge.is_empty(),
                available_titles: owned_titles(&profile),
            }),
            message: None,
        })
    }

    pub async fn health(&self) -> Result<HealthReport, AppError> {
        let websites = self.store.list().await?.len();
        Ok(HealthReport {
            success: true,
            message: "Chat response engine is running".to_string(),
            timestamp: Utc::now(),
            websites,
        })
    }

    async fn resolve_website(&self, api_key: &str, not_found: &str) -> Result<WebsiteProfile, AppError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(AppError::Validation("API key is required".to_string()));
        }

        self.store.find_by_api_key(api_key).await?.ok_or_else(|| {
            warn!("Rejected unknown API key");
            AppError::NotFound(not_found.to_string())
        })
    }

    fn check_rate(&self, api_key: &str) -> Result<(), AppError> {
        let mut limiter = self
            .limiter
            .lock()
            .map_err(|_| AppError::Internal("Rate limiter lock poisoned".to_string()))?;
        if limiter.check(api_key) {
            Ok(())
        } else {
            warn!("Rate limit exceeded for website key");
            Err(AppError::RateLimited)
        }
    }

    fn categories_for(&self, profile: &WebsiteProfile) -> Vec<String> {
        if profile.category.is_empty() {
            vec![self.config.default_category.clone()]
        } else {
            profile.category.clone()
        }
    }
}

fn owned_titles(profile: &WebsiteProfile) -> Vec<String> {
    profile
        .knowledge
        .titles()
        .into_iter()
        .map(str::to_string)
        .collect()
}
