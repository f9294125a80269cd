//! Response composition.
//!
//! Turns a [`MatchResult`] (or its absence) into the text shown in the chat
//! widget. Every branch returns non-empty text.

use regex::Regex;
use std::sync::LazyLock;

use super::category::relates_to_categories;
use super::matcher::MatchResult;
use crate::knowledge::KnowledgeBase;

/// Words skipped when picking the call-to-action word of a value.
const CTA_STOPWORDS: &[&str] = &["the", "our", "your", "with", "for"];

const CTA_FALLBACK: &str = "service";

const DEFAULT_REPLY: &str =
    "I can help you with our services. What specific information are you looking for?";

static DISALLOWED_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9_\s.,!?\-]").expect("Invalid regex: disallowed characters")
});
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex: whitespace run"));

/// What the fallback branches need to know about the website.
#[derive(Debug, Clone)]
pub struct FallbackContext<'a> {
    /// Visitor question
    pub question: &'a str,
    /// Website categories
    pub categories: &'a [String],
    /// Knowledge base titles in order
    pub titles: Vec<&'a str>,
}

impl<'a> FallbackContext<'a> {
    pub fn new(question: &'a str, categories: &'a [String], kb: &'a KnowledgeBase) -> Self {
        Self {
            question,
            categories,
            titles: kb.titles(),
        }
    }
}

/// Strip emoji and symbols, keeping ASCII word chars, whitespace and `.,!?-`,
/// then collapse whitespace.
pub fn clean_text(text: &str) -> String {
    let stripped = DISALLOWED_CHARS.replace_all(text, "");
    WHITESPACE_RUN.replace_all(&stripped, " ").trim().to_string()
}

/// Compose the reply for the main chat endpoint.
pub fn compose_response(outcome: Option<&MatchResult>, ctx: &FallbackContext<'_>) -> String {
    outcome
        .and_then(render_match)
        .unwrap_or_else(|| fallback_reply(ctx))
}

/// Compose the reply for the direct endpoint, whose no-match text lists the
/// categories and the available titles.
pub fn compose_direct_response(outcome: Option<&MatchResult>, ctx: &FallbackContext<'_>) -> String {
    if let Some(text) = outcome.and_then(render_match) {
        return text;
    }

    let mut reply = format!(
        "I can help you with information about our {}. ",
        ctx.categories.join(", ")
    );
    if ctx.titles.is_empty() {
        reply.push_str("Please ask about our services or products.");
    } else {
        reply.push_str(&format!(
            "We have data about: {}. Try asking about any of these.",
            ctx.titles.join(", ")
        ));
    }
    reply
}

/// Render a match; `None` when a value cleans down to nothing.
pub fn render_match(outcome: &MatchResult) -> Option<String> {
    if outcome.kind.is_title() {
        Some(render_title_match(&outcome.entry_title, &outcome.matched_values))
    } else {
        outcome
            .matched_values
            .first()
            .and_then(|value| render_value_match(value, &outcome.entry_title))
    }
}

/// Enumerate every value of an entry, styled after the kind of title.
pub fn render_title_match(title: &str, values: &[String]) -> String {
    let lower = title.to_lowercase();

    let (heading, bullet, closing) = if lower.contains("service") {
        (
            format!("We provide the following {}:", title),
            "✅",
            format!("Which {} are you interested in?", lower),
        )
    } else if lower.contains("product") {
        (
            format!("We offer these {}:", title),
            "🎯",
            format!("Would you like more information about any specific {}?", lower),
        )
    } else {
        (
            format!("Here are our {}:", title),
            "•",
            format!(
                "Let me know if you need details about any specific item from our {}.",
                lower
            ),
        )
    };

    let mut reply = format!("{}\n\n", heading);
    for value in values {
        reply.push_str(&format!("{} {}\n", bullet, value));
    }
    reply.push('\n');
    reply.push_str(&closing);
    reply
}

/// One-sentence pitch for a single matched value.
pub fn render_value_match(value: &str, title: &str) -> Option<String> {
    let value = clean_text(value);
    if value.is_empty() {
        return None;
    }
    let title = clean_text(&title.to_lowercase());

    let reply = format!(
        "We offer {} {} to boost your online business! Would you like me to start the {} process?",
        value,
        title,
        call_to_action_word(&value)
    );
    Some(clean_text(&reply))
}

fn call_to_action_word(value: &str) -> &str {
    let mut words = value.split(' ');
    let first = words.next().filter(|w| !w.is_empty()).unwrap_or(CTA_FALLBACK);

    let weak = first.chars().count() < 3 || CTA_STOPWORDS.contains(&first.to_lowercase().as_str());
    if weak {
        words.next().unwrap_or(CTA_FALLBACK)
    } else {
        first
    }
}

fn fallback_reply(ctx: &FallbackContext<'_>) -> String {
    if ctx.categories.is_empty() && ctx.titles.is_empty() {
        return DEFAULT_REPLY.to_string();
    }

    let related = relates_to_categories(ctx.question, ctx.categories);

    if !ctx.titles.is_empty() && (related || ctx.categories.is_empty()) {
        format!(
            "I can help you with information about our {}. For example, you can ask \"What {} do you provide?\"",
            ctx.titles.join(", "),
            ctx.titles[0].to_lowercase()
        )
    } else if related {
        format!(
            "I can help you with {}. Please ask about our services or products.",
            ctx.categories.join(", ")
        )
    } else {
        format!(
            "I can only help with questions about our {}. Please ask something related to our services or products.",
            ctx.categories.join(", ")
        )
    }
}
