//! # SiteChat Core
//!
//! Knowledge-base matching and response engine behind the SiteChat website
//! widget. Questions are answered from a per-website list of titled entries
//! without calling a language model.
//!
//! ## Modules
//! - `knowledge`: entry model and normalization of raw payloads
//! - `brain`: intent classification, matching, composition, personality pass
//! - `responder`: request orchestration keyed by website API key
//! - `websites` / `store`: website records and knowledge editing
//! - `chats`: log of chat requests collected by the widget
//! - `config` / `telemetry`: environment configuration and logging

pub mod brain;
pub mod chats;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod models;
pub mod rate_limiter;
pub mod responder;
pub mod store;
pub mod telemetry;
pub mod websites;

pub use brain::{classify_and_match, compose_response, MatchKind, MatchResult};
pub use chats::ChatRequestService;
pub use config::AppConfig;
pub use error::AppError;
pub use knowledge::{normalize_knowledge_base, KnowledgeBase, KnowledgeEntry};
pub use responder::{ChatReply, ChatRequest, ChatResponder, DirectReply, KeyValidation};
pub use store::{ChatRequestStore, InMemoryChatRequestStore, InMemoryWebsiteStore, WebsiteStore};
pub use websites::WebsiteService;

#[cfg(test)]
mod tests;
