//! Knowledge base matching.
//!
//! Layered string heuristics over an ordered [`KnowledgeBase`]:
//!
//! 1. list requests try title matching first,
//! 2. then value matching (word overlap plus a substring bonus),
//! 3. then title matching (direct containment, then keyword scoring).
//!
//! The direct endpoint answers list requests from titles only; see
//! [`MatchPlan`].
//!
//! Every strategy keeps the first candidate on ties, so results depend only
//! on knowledge base order.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

use super::intent::{IntentClassifier, QueryIntent};
use crate::knowledge::{title_key, KnowledgeBase, KnowledgeEntry};

/// Question words hinting at a services/products question.
const SERVICE_KEYWORDS: &[&str] = &[
    "provide", "offer", "give", "have", "do", "service", "services", "work", "product",
    "products", "what", "which", "list", "tell",
];

/// Score recorded for a direct title containment match.
pub const DIRECT_TITLE_SCORE: u32 = 3;

/// Bonus when question and value contain one another.
const SUBSTRING_BONUS: u32 = 3;

/// Points per overlapping title/question word pair.
const TITLE_WORD_POINTS: u32 = 2;

/// Minimum accepted score for scored strategies.
const MIN_SCORE: u32 = 1;

// NOTE: expect() is acceptable for static patterns known to compile
static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]+").expect("Invalid regex: non-word separator"));

/// How a match was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Title contained in the question (or the reverse)
    TitleExact,
    /// Title words overlap question words
    TitleKeyword,
    /// Value and question contain one another
    ValueSubstring,
    /// Value words overlap question words
    ValueKeyword,
}

impl MatchKind {
    /// Title matches enumerate the whole entry.
    pub fn is_title(&self) -> bool {
        matches!(self, MatchKind::TitleExact | MatchKind::TitleKeyword)
    }
}

/// Best knowledge entry for one question. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    /// Title of the matched entry, as stored
    pub entry_title: String,
    /// All entry values for title matches, the single value otherwise
    pub matched_values: Vec<String>,
    /// Strategy that produced the match
    pub kind: MatchKind,
    /// Heuristic score
    pub score: u32,
}

impl MatchResult {
    fn for_title(entry: &KnowledgeEntry, kind: MatchKind, score: u32) -> Self {
        Self {
            entry_title: entry.title().to_string(),
            matched_values: entry.values().to_vec(),
            kind,
            score,
        }
    }
}

/// A single matching heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// [`match_title`]
    Title,
    /// [`match_value`]
    Value,
}

impl Strategy {
    fn run(self, question: &str, kb: &KnowledgeBase) -> Option<MatchResult> {
        match self {
            Strategy::Title => match_title(question, kb),
            Strategy::Value => match_value(question, kb),
        }
    }
}

/// Strategy order of the endpoint being answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPlan {
    /// Main chat endpoint: list requests fall through to value matching.
    #[default]
    Chat,
    /// Direct endpoint: list requests only try titles.
    Direct,
}

impl MatchPlan {
    pub fn strategies(self, intent: QueryIntent) -> &'static [Strategy] {
        match (self, intent) {
            (_, QueryIntent::Specific) => &[Strategy::Value, Strategy::Title],
            (MatchPlan::Chat, QueryIntent::ListRequest) => &[Strategy::Title, Strategy::Value],
            (MatchPlan::Direct, QueryIntent::ListRequest) => &[Strategy::Title],
        }
    }
}

/// Matcher running the strategies in priority order
#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    classifier: IntentClassifier,
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intent(&self, question: &str) -> QueryIntent {
        self.classifier.classify(question).intent
    }

    /// Find the best match for a question, or `None`.
    pub fn find_match(&self, question: &str, kb: &KnowledgeBase) -> Option<MatchResult> {
        let intent = self.intent(question);
        self.find_match_with(question, kb, intent, MatchPlan::Chat, |_| Some(()))
            .map(|(found, ())| found)
    }

    /// Run the plan's strategies in order and keep the first match that
    /// `accept` turns into a value.
    ///
    /// A rejected match does not end the search: the next strategy still
    /// runs. Callers pass a renderer here so that a value which renders to
    /// nothing lets title matching have its turn.
    pub fn find_match_with<T, F>(
        &self,
        question: &str,
        kb: &KnowledgeBase,
        intent: QueryIntent,
        plan: MatchPlan,
        mut accept: F,
    ) -> Option<(MatchResult, T)>
    where
        F: FnMut(&MatchResult) -> Option<T>,
    {
        if question.trim().is_empty() || kb.is_empty() {
            return None;
        }

        for strategy in plan.strategies(intent) {
            let Some(found) = strategy.run(question, kb) else {
                continue;
            };
            match accept(&found) {
                Some(accepted) => {
                    debug!(
                        "Matched '{}' via {:?} (score {}, intent {})",
                        found.entry_title, found.kind, found.score, intent
                    );
                    return Some((found, accepted));
                }
                None => debug!("Skipped '{}' via {:?}", found.entry_title, found.kind),
            }
        }

        debug!("No knowledge match (intent {})", intent);
        None
    }
}

/// Classify the question and match it against the knowledge base.
pub fn classify_and_match(question: &str, kb: &KnowledgeBase) -> Option<MatchResult> {
    Matcher::new().find_match(question, kb)
}

/// Best single value across all entries by word overlap and substring bonus.
pub fn match_value(question: &str, kb: &KnowledgeBase) -> Option<MatchResult> {
    let question_lower = question.trim().to_lowercase();
    if question_lower.is_empty() {
        return None;
    }
    let question_words = words_longer_than(&question_lower, 2);

    let mut best: Option<(u32, &KnowledgeEntry, &String, bool)> = None;

    for entry in kb.entries() {
        for value in entry.values() {
            let value_lower = value.to_lowercase();
            let value_words = words_longer_than(&value_lower, 2);

            let mut score = overlap_count(&question_words, &value_words);
            let substring =
                question_lower.contains(&value_lower) || value_lower.contains(&question_lower);
            if substring {
                score += SUBSTRING_BONUS;
            }

            if score > best.map_or(0, |(s, ..)| s) {
                best = Some((score, entry, value, substring));
            }
        }
    }

    best.filter(|(score, ..)| *score >= MIN_SCORE)
        .map(|(score, entry, value, substring)| MatchResult {
            entry_title: entry.title().to_string(),
            matched_values: vec![value.clone()],
            kind: if substring {
                MatchKind::ValueSubstring
            } else {
                MatchKind::ValueKeyword
            },
            score,
        })
}

/// Entry whose title matches the question, by containment then keywords.
pub fn match_title(question: &str, kb: &KnowledgeBase) -> Option<MatchResult> {
    let question_lower = question.trim().to_lowercase();
    if question_lower.is_empty() {
        return None;
    }

    for entry in kb.entries() {
        let title = title_key(entry.title());
        if question_lower.contains(&title) || title.contains(&question_lower) {
            return Some(MatchResult::for_title(
                entry,
                MatchKind::TitleExact,
                DIRECT_TITLE_SCORE,
            ));
        }
    }

    let question_words: Vec<&str> = question_lower
        .split_whitespace()
        .filter(|w| w.chars().count() > 3)
        .collect();
    let asks_for_offer = SERVICE_KEYWORDS
        .iter()
        .any(|keyword| question_lower.contains(*keyword));

    let mut best: Option<(u32, &KnowledgeEntry)> = None;

    for entry in kb.entries() {
        let title = title_key(entry.title());
        let title_words: Vec<&str> = title
            .split_whitespace()
            .filter(|w| w.chars().count() > 3)
            .collect();

        let word_score = TITLE_WORD_POINTS * overlap_count(&title_words, &question_words);
        let mut score = word_score;
        if word_score > 0
            && asks_for_offer
            && (title.contains("service") || title.contains("product"))
        {
            score += 1;
        }

        if score > best.map_or(0, |(s, _)| s) {
            best = Some((score, entry));
        }
    }

    best.filter(|(score, _)| *score >= MIN_SCORE)
        .map(|(score, entry)| MatchResult::for_title(entry, MatchKind::TitleKeyword, score))
}

fn words_longer_than(text: &str, min_chars: usize) -> Vec<&str> {
    NON_WORD
        .split(text)
        .filter(|w| w.chars().count() > min_chars)
        .collect()
}

/// Number of word pairs where one word contains the other.
fn overlap_count(left: &[&str], right: &[&str]) -> u32 {
    let mut count = 0;
    for l in left {
        for r in right {
            if l.contains(r) || r.contains(l) {
                count += 1;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::from_raw(&json!([
            {"title": "Services", "value": ["Web Design", "SEO"]}
        ]))
    }

    #[test]
    fn test_list_question_matches_title() {
        let m = classify_and_match("what services do you offer", &kb()).unwrap();
        assert_eq!(m.kind, MatchKind::TitleExact);
        assert_eq!(m.entry_title, "Services");
        assert_eq!(m.matched_values, ["Web Design", "SEO"]);
    }

    #[test]
    fn test_specific_question_matches_value() {
        let m = classify_and_match("do you offer SEO", &kb()).unwrap();
        assert_eq!(m.kind, MatchKind::ValueSubstring);
        assert_eq!(m.matched_values, ["SEO"]);
        assert_eq!(m.score, 4);
    }

    #[test]
    fn test_unrelated_question_has_no_match() {
        assert!(classify_and_match("what is the weather today", &kb()).is_none());
    }

    #[test]
    fn test_blank_question_or_empty_kb() {
        assert!(classify_and_match("   ", &kb()).is_none());
        assert!(classify_and_match("seo", &KnowledgeBase::new()).is_none());
    }

    #[test]
    fn test_value_ties_keep_first() {
        let kb = KnowledgeBase::from_raw(&json!([
            {"title": "A", "value": ["logo design"]},
            {"title": "B", "value": ["logo printing"]}
        ]));
        let m = match_value("need a logo", &kb).unwrap();
        assert_eq!(m.entry_title, "A");
        assert_eq!(m.kind, MatchKind::ValueKeyword);
        assert_eq!(m.score, 1);
    }

    #[test]
    fn test_title_keyword_scoring() {
        let kb = KnowledgeBase::from_raw(&json!([
            {"title": "Opening Hours", "value": ["9-5"]},
            {"title": "Design Services", "value": ["Logos"]}
        ]));
        let m = match_title("which designers work here", &kb).unwrap();
        assert_eq!(m.entry_title, "Design Services");
        assert_eq!(m.kind, MatchKind::TitleKeyword);
        // "design" ⊂ "designers" (+2), service keyword bonus (+1)
        assert_eq!(m.score, 3);
    }

    #[test]
    fn test_service_bonus_needs_word_overlap() {
        let kb = KnowledgeBase::from_raw(&json!([{"title": "Services", "value": ["x"]}]));
        assert!(match_title("what time is it", &kb).is_none());
    }

    #[test]
    fn test_direct_title_first_entry_wins() {
        let kb = KnowledgeBase::from_raw(&json!([
            {"title": "Team", "value": ["Ana"]},
            {"title": "Team Building", "value": ["Workshops"]}
        ]));
        let m = match_title("team building events", &kb).unwrap();
        assert_eq!(m.entry_title, "Team");
        assert_eq!(m.score, DIRECT_TITLE_SCORE);
    }

    #[test]
    fn test_rejected_value_falls_through_to_title() {
        let kb = KnowledgeBase::from_raw(&json!([{"title": "Services", "value": ["🚀🚀"]}]));
        let question = "services 🚀🚀";
        let matcher = Matcher::new();

        let first = matcher.find_match(question, &kb).unwrap();
        assert_eq!(first.kind, MatchKind::ValueSubstring);

        let (found, ()) = matcher
            .find_match_with(question, &kb, QueryIntent::Specific, MatchPlan::Chat, |m| {
                m.kind.is_title().then_some(())
            })
            .unwrap();
        assert_eq!(found.kind, MatchKind::TitleExact);
    }

    #[test]
    fn test_direct_plan_lists_from_titles_only() {
        assert_eq!(
            MatchPlan::Direct.strategies(QueryIntent::ListRequest),
            [Strategy::Title]
        );
        assert_eq!(
            MatchPlan::Chat.strategies(QueryIntent::ListRequest),
            [Strategy::Title, Strategy::Value]
        );

        let matcher = Matcher::new();
        let question = "tell me about SEO";
        let intent = matcher.intent(question);
        assert_eq!(intent, QueryIntent::ListRequest);
        assert!(matcher
            .find_match_with(question, &kb(), intent, MatchPlan::Direct, |_| Some(()))
            .is_none());
        assert!(matcher.find_match(question, &kb()).is_some());
    }

    #[test]
    fn test_words_split_on_non_word_chars() {
        assert_eq!(words_longer_than("web-design, seo!", 2), ["web", "design", "seo"]);
    }
}
