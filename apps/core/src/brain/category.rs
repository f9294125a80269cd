//! Category relevance check.
//!
//! Used when nothing in the knowledge base matched, to decide between
//! pointing the visitor at the available topics and politely refusing.

/// Whether the question is about one of the website's categories.
///
/// True when a lower-cased category and the question contain one another,
/// or when any category word and question word longer than 3 chars do.
pub fn relates_to_categories<S: AsRef<str>>(question: &str, categories: &[S]) -> bool {
    let question_lower = question.trim().to_lowercase();
    if question_lower.is_empty() {
        return false;
    }

    let question_words: Vec<&str> = question_lower
        .split_whitespace()
        .filter(|w| w.chars().count() > 3)
        .collect();

    categories.iter().any(|category| {
        let category_lower = category.as_ref().trim().to_lowercase();
        if category_lower.is_empty() {
            return false;
        }

        if question_lower.contains(&category_lower) || category_lower.contains(&question_lower) {
            return true;
        }

        category_lower
            .split_whitespace()
            .filter(|w| w.chars().count() > 3)
            .any(|c_word| {
                question_words
                    .iter()
                    .any(|q_word| c_word.contains(q_word) || q_word.contains(c_word))
            })
    })
}
