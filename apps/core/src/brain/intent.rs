//! Intent Classification for chat widget questions.
//!
//! Decides whether a visitor asks for an overview ("what services do you
//! offer?") or about one specific thing ("do you do SEO?"). Pure phrase
//! containment on the lower-cased question.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phrases marking a list/overview request.
const LIST_PHRASES: &[&str] = &[
    "what services",
    "what products",
    "list",
    "tell me about",
    "all services",
    "all products",
    "everything",
    "overview",
    "what do you provide",
    "what do you offer",
    "what do you have",
    "types of",
    "kinds of",
    "variety of",
];

/// Detected intent type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    /// Enumerate a whole category
    ListRequest,
    /// Ask about one fact
    Specific,
}

impl fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl QueryIntent {
    /// Returns a human-readable label for the intent
    pub fn label(&self) -> &'static str {
        match self {
            QueryIntent::ListRequest => "list_request",
            QueryIntent::Specific => "specific",
        }
    }
}

/// Result of intent classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntentResult {
    /// Detected intent
    pub intent: QueryIntent,
    /// First list phrase found in the question, if any
    pub matched_phrase: Option<&'static str>,
}

/// Phrase-based list-request classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify the intent of a question
    pub fn classify(&self, question: &str) -> IntentResult {
        let lower = question.to_lowercase();
        let matched_phrase = LIST_PHRASES
            .iter()
            .copied()
            .find(|phrase| lower.contains(*phrase));

        IntentResult {
            intent: if matched_phrase.is_some() {
                QueryIntent::ListRequest
            } else {
                QueryIntent::Specific
            },
            matched_phrase,
        }
    }
}

/// Whether the question asks for an enumeration rather than one fact.
pub fn is_list_request(question: &str) -> bool {
    IntentClassifier::new().classify(question).intent == QueryIntent::ListRequest
}
