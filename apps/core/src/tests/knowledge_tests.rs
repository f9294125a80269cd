//! Knowledge Model Tests
//!
//! Normalization of the payload shapes clients send, and how normalized
//! entries combine inside a knowledge base.

use crate::knowledge::{normalize_knowledge_base, KnowledgeBase, KnowledgeEntry, SENTINEL_TITLE};
use serde_json::{json, Value};

fn as_pairs(entries: &[KnowledgeEntry]) -> Vec<(String, Vec<String>)> {
    entries
        .iter()
        .map(|e| (e.title().to_string(), e.values().to_vec()))
        .collect()
}

#[cfg(test)]
mod normalization_tests {
    use super::*;

    #[test]
    fn test_pricing_string_becomes_one_entry() {
        let entries = normalize_knowledge_base(&json!("Pricing: Basic,Pro,Enterprise"));
        assert_eq!(
            as_pairs(&entries),
            vec![(
                "Pricing".to_string(),
                vec!["Basic".to_string(), "Pro".to_string(), "Enterprise".to_string()]
            )]
        );
    }

    #[test]
    fn test_plain_strings_get_sentinel_title() {
        let entries = normalize_knowledge_base(&json!(["Fast shipping", "24/7 support"]));

        assert_eq!(entries.len(), 2);
        for (entry, value) in entries.iter().zip(["Fast shipping", "24/7 support"]) {
            assert_eq!(entry.title(), SENTINEL_TITLE);
            assert_eq!(entry.values(), [value]);
        }
    }

    #[test]
    fn test_semicolon_chunks() {
        let entries = normalize_knowledge_base(&json!("Services: SEO, Ads; Hours: 9-5;; Free wifi"));
        assert_eq!(
            entries.iter().map(|e| e.title()).collect::<Vec<_>>(),
            ["Services", "Hours", SENTINEL_TITLE]
        );
        assert_eq!(entries[0].values(), ["SEO", "Ads"]);
    }

    #[test]
    fn test_single_record_and_values_alias() {
        let entries = normalize_knowledge_base(&json!({"title": "Team", "values": ["Ana", "Bo"]}));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].values(), ["Ana", "Bo"]);
    }

    #[test]
    fn test_nested_arrays_and_scalars() {
        let entries = normalize_knowledge_base(&json!([["Red", "Blue"], 42, true, null]));
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].values(), ["Red", "Blue"]);
        assert_eq!(entries[1].values(), ["42"]);
        assert_eq!(entries[2].values(), ["true"]);
    }

    #[test]
    fn test_malformed_shapes_degrade_to_nothing() {
        let malformed = [
            json!(17),
            json!(false),
            json!({"name": "no title or value"}),
            json!([{"title": "Empty", "value": []}, {"title": "Blank", "value": " , ,"}]),
            json!({"title": "Nested", "value": {"deep": true}}),
            json!(""),
            json!(";;;"),
        ];

        for raw in malformed {
            assert!(
                normalize_knowledge_base(&raw).is_empty(),
                "Expected no entries for {}",
                raw
            );
        }
    }

    #[test]
    fn test_no_entry_ever_has_empty_values() {
        let raw = json!([
            {"title": "A", "value": ["", "  ", "x"]},
            {"title": "B", "value": ""},
            "C:",
            ":orphan",
            [null, {}],
            "D: ,y"
        ]);

        let entries = normalize_knowledge_base(&raw);
        assert!(!entries.is_empty());
        assert!(entries.iter().all(|e| !e.values().is_empty()));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let inputs = [
            json!("Pricing: Basic,Pro,Enterprise"),
            json!(["Fast shipping", "24/7 support", "Hours: 9-5, 10-6"]),
            json!([{"title": "Services", "value": ["SEO", "SEO", " Ads "]}, ["x", 1]]),
            json!({"value": "only values"}),
        ];

        for raw in inputs {
            let once = normalize_knowledge_base(&raw);
            let canonical: Value = serde_json::to_value(&once).unwrap();
            let twice = normalize_knowledge_base(&canonical);
            assert_eq!(once, twice, "Re-normalizing changed {}", raw);
        }
    }
}

#[cfg(test)]
mod merge_tests {
    use super::*;

    #[test]
    fn test_sequential_writes_merge_sentinel_entries() {
        let mut kb = KnowledgeBase::new();
        kb.merge_raw(&json!(["Fast shipping", "24/7 support"]));

        assert_eq!(kb.len(), 1);
        assert_eq!(kb.entries()[0].title(), SENTINEL_TITLE);
        assert_eq!(kb.entries()[0].values(), ["Fast shipping", "24/7 support"]);
    }

    #[test]
    fn test_same_title_merges_into_ordered_union() {
        let mut kb = KnowledgeBase::from_raw(&json!([{"title": "Services", "value": ["SEO", "Ads"]}]));
        kb.merge_raw(&json!({"title": "services", "value": ["Ads", "Hosting", "SEO"]}));

        assert_eq!(kb.len(), 1);
        assert_eq!(kb.entries()[0].title(), "Services");
        assert_eq!(kb.entries()[0].values(), ["SEO", "Ads", "Hosting"]);
    }

    #[test]
    fn test_titles_keep_insertion_order() {
        let kb = KnowledgeBase::from_raw(&json!(["B: 1", "A: 2", "b: 3"]));
        assert_eq!(kb.titles(), ["B", "A"]);
        assert_eq!(kb.entry("b").unwrap().values(), ["1", "3"]);
    }

    #[test]
    fn test_stored_form_round_trips() {
        let kb = KnowledgeBase::from_raw(&json!("Services: SEO, Ads; Hours: 9-5"));
        let stored = serde_json::to_value(&kb).unwrap();
        assert_eq!(
            stored,
            json!([
                {"title": "Services", "value": ["SEO", "Ads"]},
                {"title": "Hours", "value": ["9-5"]}
            ])
        );

        let reloaded: KnowledgeBase = serde_json::from_value(stored).unwrap();
        assert_eq!(reloaded, kb);
    }
}
