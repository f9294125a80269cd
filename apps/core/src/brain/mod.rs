//! # Brain Module
//!
//! Fast, non-LLM answer engine for the SiteChat widget.
//! Answers visitor questions straight from the website's knowledge base.
//!
//! ## Components
//! - `intent`: list-request vs specific-question classification
//! - `matcher`: value and title heuristics over the knowledge base
//! - `category`: relevance of a question to the website categories
//! - `composer`: reply rendering and fallbacks
//! - `personality`: optional tone/emoji/markdown pass

pub mod category;
pub mod composer;
pub mod intent;
pub mod matcher;
pub mod personality;

pub use category::relates_to_categories;
pub use composer::{
    clean_text, compose_direct_response, compose_response, render_match, FallbackContext,
};
pub use intent::{is_list_request, IntentClassifier, IntentResult, QueryIntent};
pub use matcher::{
    classify_and_match, match_title, match_value, MatchKind, MatchPlan, MatchResult, Matcher,
    Strategy,
};
pub use personality::{
    apply_personality, DetailLevel, EmojiLevel, PersonalityConfig, PersonalityOverrides,
    PhrasePicker, RngPicker, Tone,
};
