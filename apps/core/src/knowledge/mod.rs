//! # Knowledge Module
//!
//! Per-website knowledge base: titled fact categories with ordered values.
//!
//! ## Components
//! - `entry`: `KnowledgeEntry`, the canonical `{title, value[]}` record
//! - `normalize`: tolerant parser turning client payloads into entries
//! - `base`: ordered `KnowledgeBase` with the write-merge rule and edits

pub mod base;
pub mod entry;
pub mod normalize;

pub use base::{EntryUpdate, KnowledgeBase};
pub use entry::{title_key, KnowledgeEntry};
pub use normalize::{normalize_knowledge_base, SENTINEL_TITLE};
