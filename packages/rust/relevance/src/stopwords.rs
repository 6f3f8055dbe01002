//! Per-language stopword sets.
//!
//! Unknown languages fall back to English.

use std::collections::HashSet;
use std::sync::LazyLock;

static ENGLISH: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with",
        "by", "from", "up", "about", "into", "over", "after", "is", "are", "was", "were",
        "be", "been", "being", "have", "has", "had", "do", "does", "did", "will", "would",
        "could", "should", "may", "might", "must", "can", "this", "that", "these", "those",
        "what", "which", "who", "when", "where", "why", "how", "all", "each", "every",
        "both", "few", "more", "most", "other", "some", "such", "not", "only", "same",
        "than", "too", "very", "just", "your", "their", "its",
    ]
    .into_iter()
    .collect()
});

static PORTUGUESE: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "o", "a", "os", "as", "um", "uma", "uns", "umas", "de", "do", "da", "dos", "das",
        "em", "no", "na", "nos", "nas", "por", "para", "com", "sem", "sob", "sobre",
        "entre", "que", "quem", "qual", "quais", "quando", "onde", "como", "porque", "e",
        "ou", "mas", "se", "ser", "estar", "ter", "haver", "fazer", "ir", "vir", "mais",
        "menos", "muito", "pouco", "todo", "toda", "todos", "todas", "este", "esta",
        "esse", "essa", "aquele", "aquela", "isso", "isto", "aquilo", "seu", "sua",
        "seus", "suas", "meu", "minha", "ao", "aos", "pelo", "pela", "pelos", "pelas",
        "não", "sim", "já", "ainda", "também", "então",
    ]
    .into_iter()
    .collect()
});

static SPANISH: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "el", "la", "los", "las", "un", "una", "unos", "unas", "de", "del", "en", "por",
        "para", "con", "sin", "sobre", "entre", "que", "quien", "cual", "cuales",
        "cuando", "donde", "como", "porque", "y", "o", "pero", "si", "ser", "estar",
        "tener", "haber", "hacer", "ir", "venir", "mas", "menos", "mucho", "poco",
        "todo", "toda", "todos", "todas", "este", "esta", "ese", "esa", "aquel",
        "aquella", "eso", "esto", "aquello", "su", "sus", "mi", "mis", "al", "lo", "no",
        "ya", "aun", "tambien", "entonces", "es", "son",
    ]
    .into_iter()
    .collect()
});

/// Stopword set for a language tag (`en`, `pt`, `es`); English otherwise.
pub fn for_language(language: &str) -> &'static HashSet<&'static str> {
    match language {
        "pt" => &PORTUGUESE,
        "es" => &SPANISH,
        _ => &ENGLISH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_routing() {
        assert!(for_language("en").contains("the"));
        assert!(for_language("pt").contains("para"));
        assert!(for_language("es").contains("pero"));
        // Unknown falls back to English
        assert!(for_language("de").contains("the"));
    }
}
