//! Knowledge payload normalization.
//!
//! Clients submit "extra facts" in many shapes: lists of `{title, value}`
//! records, `title:value` strings, nested arrays, a single record, or one
//! semicolon-separated string. The payload is first classified into a
//! [`RawPayload`] variant, then each variant is parsed into canonical
//! [`KnowledgeEntry`] values.
//!
//! Parsing never fails. Anything unusable degrades to no entry.

use serde_json::{Map, Value};
use tracing::debug;

use super::entry::KnowledgeEntry;

/// Title assigned to values submitted without one.
pub const SENTINEL_TITLE: &str = "product";

/// Top-level payload shapes.
#[derive(Debug)]
enum RawPayload<'a> {
    Empty,
    List(&'a [Value]),
    Record(&'a Map<String, Value>),
    Chunked(&'a str),
    Text(&'a str),
    Unsupported,
}

impl<'a> RawPayload<'a> {
    fn classify(raw: &'a Value) -> Self {
        match raw {
            Value::Null => RawPayload::Empty,
            Value::Array(items) => RawPayload::List(items),
            Value::Object(map) if is_record(map) => RawPayload::Record(map),
            Value::String(text) if text.contains(';') => RawPayload::Chunked(text),
            Value::String(text) => RawPayload::Text(text),
            _ => RawPayload::Unsupported,
        }
    }
}

/// Shapes accepted as list elements.
enum RawItem<'a> {
    Record(&'a Map<String, Value>),
    Text(&'a str),
    Values(&'a [Value]),
    Scalar(String),
    Skip,
}

impl<'a> RawItem<'a> {
    fn classify(item: &'a Value) -> Self {
        match item {
            Value::Object(map) => RawItem::Record(map),
            Value::String(text) => RawItem::Text(text),
            Value::Array(values) => RawItem::Values(values),
            Value::Number(_) | Value::Bool(_) => match scalar_to_string(item) {
                Some(s) => RawItem::Scalar(s),
                None => RawItem::Skip,
            },
            Value::Null => RawItem::Skip,
        }
    }
}

/// Normalize an arbitrary client payload into canonical entries.
///
/// Entries sharing a title are kept apart here; combining them is the job
/// of [`KnowledgeBase::merge_entries`](super::KnowledgeBase::merge_entries).
pub fn normalize_knowledge_base(raw: &Value) -> Vec<KnowledgeEntry> {
    let payload = RawPayload::classify(raw);

    let entries: Vec<KnowledgeEntry> = match payload {
        RawPayload::Empty => Vec::new(),
        RawPayload::List(items) => items.iter().filter_map(parse_item).collect(),
        RawPayload::Record(map) => parse_record(map).into_iter().collect(),
        RawPayload::Chunked(text) => text
            .split(';')
            .filter(|chunk| !chunk.trim().is_empty())
            .filter_map(parse_text)
            .collect(),
        RawPayload::Text(text) => parse_text(text).into_iter().collect(),
        RawPayload::Unsupported => {
            debug!("Ignoring unsupported knowledge payload: {}", raw);
            Vec::new()
        }
    };

    entries
}

fn is_record(map: &Map<String, Value>) -> bool {
    map.contains_key("title") || map.contains_key("value") || map.contains_key("values")
}

fn parse_item(item: &Value) -> Option<KnowledgeEntry> {
    match RawItem::classify(item) {
        RawItem::Record(map) => parse_record(map),
        RawItem::Text(text) => parse_text(text),
        RawItem::Values(values) => {
            KnowledgeEntry::new(SENTINEL_TITLE, values.iter().filter_map(scalar_to_string))
        }
        RawItem::Scalar(value) => KnowledgeEntry::new(SENTINEL_TITLE, [value]),
        RawItem::Skip => None,
    }
}

/// `{title?, value}`; `values` is accepted as an alias of `value`.
fn parse_record(map: &Map<String, Value>) -> Option<KnowledgeEntry> {
    let title = map
        .get("title")
        .and_then(scalar_to_string)
        .unwrap_or_default();

    let values = map
        .get("value")
        .or_else(|| map.get("values"))
        .map(coerce_values)
        .unwrap_or_default();

    KnowledgeEntry::new(title, values)
}

/// `title:v1,v2` or bare `v1,v2`. Only the first colon separates the title.
fn parse_text(text: &str) -> Option<KnowledgeEntry> {
    match text.split_once(':') {
        Some((title, rest)) => KnowledgeEntry::new(title, split_csv(rest)),
        None => KnowledgeEntry::new(SENTINEL_TITLE, split_csv(text)),
    }
}

fn coerce_values(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(scalar_to_string).collect(),
        Value::String(text) => split_csv(text),
        Value::Number(_) | Value::Bool(_) => scalar_to_string(value).into_iter().collect(),
        Value::Null | Value::Object(_) => Vec::new(),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn split_csv(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
