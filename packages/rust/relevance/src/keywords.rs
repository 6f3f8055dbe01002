//! Frequency-ranked keyword extraction.
//!
//! Shared by the relevance filter (topic words), the quiz generator, and
//! tag derivation.

use std::collections::HashMap;

use crate::stopwords;

/// Minimum token length that counts as a keyword.
const MIN_TOKEN_LEN: usize = 4;

/// Extract up to `limit` keywords from free text, ranked by frequency.
///
/// Tokens are lowercased, stripped of punctuation, and filtered against the
/// language's stopword set; ties break alphabetically so the ranking is
/// stable.
pub fn extract(text: &str, language: &str, limit: usize) -> Vec<String> {
    let stop = stopwords::for_language(language);
    let mut counts: HashMap<String, usize> = HashMap::new();

    for token in tokenize(text) {
        if token.chars().count() < MIN_TOKEN_LEN || stop.contains(token.as_str()) {
            continue;
        }
        *counts.entry(token).or_default() += 1;
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(limit).map(|(w, _)| w).collect()
}

/// Topic words usable for matching: lowercased, stopwords removed, and
/// short tokens dropped. Order follows the topic itself.
pub fn topic_words(topic: &str, language: &str) -> Vec<String> {
    let stop = stopwords::for_language(language);
    let mut seen = Vec::new();

    for token in tokenize(topic) {
        if token.chars().count() <= 3 || stop.contains(token.as_str()) {
            continue;
        }
        if !seen.contains(&token) {
            seen.push(token);
        }
    }
    seen
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}
