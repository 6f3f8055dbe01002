//! Relevance scoring and filtering for acquired resources.
//!
//! Each candidate gets a heuristic score in `[0, 1]` from topic/title/
//! description matching; the filter drops everything below a threshold,
//! unless doing so would gut the candidate set (see
//! [`RelevanceFilter::filter`]).

pub mod keywords;
pub mod stopwords;

use tracing::{debug, instrument};

use pathweaver_shared::{RelevanceConfig, Resource, ResourceKind};

/// Fallback guard: skip filtering when more than this fraction would be
/// removed and fewer than [`FALLBACK_MIN_KEPT`] would remain.
const FALLBACK_REMOVAL_FRACTION: f64 = 0.75;
const FALLBACK_MIN_KEPT: usize = 5;

/// Scores and filters resources against a topic.
pub struct RelevanceFilter {
    config: RelevanceConfig,
}

impl RelevanceFilter {
    pub fn new(config: RelevanceConfig) -> Self {
        Self { config }
    }

    /// Score one resource against a topic. Deterministic and pure.
    pub fn score(&self, topic: &str, language: &str, resource: &Resource) -> f64 {
        let cfg = &self.config;
        let topic_lower = topic.to_lowercase();
        let title = resource.title.to_lowercase();
        let description = resource
            .description
            .as_deref()
            .unwrap_or("")
            .to_lowercase();

        let mut score = cfg.base_score;

        if title.contains(&topic_lower) {
            score += cfg.title_match_bonus;
        }
        if !description.is_empty() && description.contains(&topic_lower) {
            score += cfg.description_match_bonus;
        }

        for word in keywords::topic_words(&topic_lower, language) {
            if title.contains(&word) {
                score += cfg.title_word_bonus;
            }
            if description.contains(&word) {
                score += cfg.description_word_bonus;
            }
        }

        if matches!(
            resource.kind,
            ResourceKind::Tutorial | ResourceKind::Documentation | ResourceKind::Article
        ) {
            score += cfg.kind_bonus;
        }

        if title.trim() == topic_lower.trim() {
            score = score.max(cfg.exact_title_floor);
        }

        score.min(1.0)
    }

    /// Score, sort descending, and drop candidates below the threshold.
    ///
    /// Fallback invariant: when filtering would remove more than 75% of the
    /// candidates AND leave fewer than 5, the cut is skipped and the full
    /// score-sorted list returned. A thin result set is more useful than an
    /// empty one.
    #[instrument(skip_all, fields(topic = %topic, candidates = resources.len()))]
    pub fn filter(
        &self,
        topic: &str,
        language: &str,
        mut resources: Vec<Resource>,
    ) -> Vec<Resource> {
        let total = resources.len();
        if total == 0 {
            return resources;
        }

        for resource in &mut resources {
            resource.score = self.score(topic, language, resource);
        }
        resources.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let kept = resources
            .iter()
            .filter(|r| r.score >= self.config.threshold)
            .count();
        let removed_fraction = (total - kept) as f64 / total as f64;

        if removed_fraction > FALLBACK_REMOVAL_FRACTION && kept < FALLBACK_MIN_KEPT {
            debug!(total, kept, "filter would gut the candidate set, keeping all");
            return resources;
        }

        resources.truncate(kept);
        debug!(total, kept, "relevance filter applied");
        resources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> RelevanceFilter {
        RelevanceFilter::new(RelevanceConfig::default())
    }

    fn resource(title: &str, description: Option<&str>, kind: ResourceKind) -> Resource {
        let mut r = Resource::new(title, format!("https://example.com/{}", title.len()), kind);
        r.description = description.map(String::from);
        r
    }

    #[test]
    fn exact_topic_in_title_scores_high() {
        let f = filter();
        let r = resource(
            "Rust async tutorial for beginners",
            Some("Learn rust async step by step"),
            ResourceKind::Tutorial,
        );
        // base 0.1 + title 0.5 + desc 0.3 + title words (rust, async) 0.4
        // + desc words 0.2 + kind 0.2, capped at 1.0
        let score = f.score("rust async", "en", &r);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unrelated_resource_scores_low() {
        let f = filter();
        let r = resource("Sourdough bread basics", None, ResourceKind::Video);
        let score = f.score("rust async", "en", &r);
        assert!(score < 0.3);
    }

    #[test]
    fn exact_title_floors_the_score() {
        let f = filter();
        // A bare title with no description and a non-bonus kind would score
        // low, but an exact title match guarantees the floor.
        let r = resource("yoga", None, ResourceKind::Video);
        let score = f.score("yoga", "en", &r);
        assert!(score >= 0.8);
    }

    #[test]
    fn filter_sorts_and_cuts_below_threshold() {
        let f = filter();
        let candidates = vec![
            resource("Unrelated cooking show", None, ResourceKind::Video),
            resource("Python tutorial", Some("learn python"), ResourceKind::Tutorial),
            resource("Python documentation", Some("python reference"), ResourceKind::Documentation),
            resource("Python for data science", Some("python pandas"), ResourceKind::Article),
            resource("Advanced python patterns", Some("python tips"), ResourceKind::Article),
            resource("Python exercises", Some("practice python"), ResourceKind::Exercise),
        ];

        let kept = f.filter("python", "en", candidates);
        assert_eq!(kept.len(), 5);
        assert!(kept.iter().all(|r| r.score >= 0.3));
        // Sorted descending
        for pair in kept.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn fallback_keeps_everything_when_cut_would_gut() {
        let f = filter();
        // 20 candidates, none matching the topic: the cut would remove all
        // of them (>75% removed, <5 kept), so the fallback returns the full
        // sorted list.
        let candidates: Vec<Resource> = (0..20)
            .map(|i| resource(&format!("Gardening episode {i}"), None, ResourceKind::Video))
            .collect();

        let kept = f.filter("quantum computing", "en", candidates);
        assert_eq!(kept.len(), 20);
        for pair in kept.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn small_relevant_majority_is_not_fallback() {
        let f = filter();
        // 4 of 6 match: removal fraction is 1/3, well under the guard, so
        // the threshold applies normally.
        let mut candidates = vec![
            resource("Chess openings", None, ResourceKind::Video),
            resource("Knitting 101", None, ResourceKind::Video),
        ];
        for i in 0..4 {
            candidates.push(resource(
                &format!("Rust guide part {i}"),
                Some("rust systems programming"),
                ResourceKind::Tutorial,
            ));
        }

        let kept = f.filter("rust", "en", candidates);
        assert_eq!(kept.len(), 4);
    }
}
