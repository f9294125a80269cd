//! Canonical knowledge entry.

use serde::Serialize;

use super::normalize::SENTINEL_TITLE;

/// Comparison key for titles: trimmed and lower-cased.
///
/// Every title comparison in the crate (write-merge, lookup, edits, matching)
/// goes through this key.
pub fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// One titled category of facts, e.g. `Services: [Web Design, SEO]`.
///
/// Values are trimmed, never blank and unique (first occurrence wins).
/// An entry always holds at least one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeEntry {
    title: String,
    #[serde(rename = "value")]
    values: Vec<String>,
}

impl KnowledgeEntry {
    /// Build an entry, returning `None` when no usable value remains.
    ///
    /// A blank title falls back to the sentinel title.
    pub fn new<T, I, V>(title: T, values: I) -> Option<Self>
    where
        T: AsRef<str>,
        I: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        let title = match title.as_ref().trim() {
            "" => SENTINEL_TITLE.to_string(),
            t => t.to_string(),
        };

        let mut entry = Self {
            title,
            values: Vec::new(),
        };
        entry.extend_values(values);

        if entry.values.is_empty() {
            None
        } else {
            Some(entry)
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Append values not already present, preserving first-seen order.
    pub(crate) fn extend_values<I, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        for value in values {
            let value = value.as_ref().trim();
            if !value.is_empty() && !self.values.iter().any(|v| v == value) {
                self.values.push(value.to_string());
            }
        }
    }

    /// Remove a value; returns whether it was present.
    pub(crate) fn remove_value(&mut self, value: &str) -> bool {
        let value = value.trim();
        match self.values.iter().position(|v| v == value) {
            Some(idx) => {
                self.values.remove(idx);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_dedups_and_trims() {
        let entry = KnowledgeEntry::new(" Services ", ["SEO", " SEO", "", "Web Design"]).unwrap();
        assert_eq!(entry.title(), "Services");
        assert_eq!(entry.values(), ["SEO", "Web Design"]);
    }

    #[test]
    fn test_new_rejects_empty_values() {
        assert!(KnowledgeEntry::new("Services", ["  ", ""]).is_none());
        assert!(KnowledgeEntry::new("Services", Vec::<String>::new()).is_none());
    }

    #[test]
    fn test_blank_title_uses_sentinel() {
        let entry = KnowledgeEntry::new("   ", ["Fast shipping"]).unwrap();
        assert_eq!(entry.title(), SENTINEL_TITLE);
    }

    #[test]
    fn test_serializes_under_value_key() {
        let entry = KnowledgeEntry::new("Pricing", ["Basic"]).unwrap();
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json, serde_json::json!({"title": "Pricing", "value": ["Basic"]}));
    }

    #[test]
    fn test_title_key_ignores_case_and_padding() {
        assert_eq!(title_key("  Our Services "), "our services");
    }
}
