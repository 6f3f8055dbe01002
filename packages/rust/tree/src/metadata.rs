//! Tree-level metadata derivation: estimated hours, tags, and difficulty.
//!
//! All derivations are deterministic functions of the node set.

use pathweaver_relevance::keywords;
use pathweaver_shared::{Category, Difficulty, Node, Resource, ResourceKind};

/// Minutes budgeted per quiz node.
const QUIZ_MINUTES: u32 = 15;

/// Overhead minutes added per 4 resources (context switching, note taking).
const OVERHEAD_PER_4_RESOURCES: u32 = 15;

/// Maximum number of tags on a tree.
const MAX_TAGS: usize = 10;

/// Estimated minutes to consume one resource.
fn resource_minutes(resource: &Resource) -> u32 {
    match resource.kind {
        ResourceKind::Video => resource.duration.unwrap_or(10),
        ResourceKind::Article => resource.read_time.unwrap_or(15),
        ResourceKind::Tutorial => 30,
        ResourceKind::Documentation => 20,
        ResourceKind::Exercise => 45,
        ResourceKind::Tool => 20,
    }
}

/// Estimated total hours for a tree: resource minutes plus quiz time plus
/// overhead, ceiled to hours with a floor of 1.
pub fn estimate_hours<'a>(nodes: impl Iterator<Item = &'a Node>) -> u32 {
    let mut minutes = 0u32;
    let mut resource_count = 0u32;

    for node in nodes {
        if node.quiz.is_some() {
            minutes += QUIZ_MINUTES;
        }
        for resource in &node.resources {
            minutes += resource_minutes(resource);
            resource_count += 1;
        }
    }

    minutes += OVERHEAD_PER_4_RESOURCES * (resource_count / 4);
    minutes.div_ceil(60).max(1)
}

/// Derive tags: topic, category name, the five longest extracted keywords,
/// and category extras, deduplicated and capped.
pub fn derive_tags(
    topic: &str,
    language: &str,
    category: Category,
    resources: &[Resource],
) -> Vec<String> {
    let corpus: String = resources
        .iter()
        .map(|r| {
            let mut s = r.title.clone();
            if let Some(d) = &r.description {
                s.push(' ');
                s.push_str(d);
            }
            s
        })
        .collect::<Vec<_>>()
        .join(" ");

    let mut extracted = keywords::extract(&corpus, language, 20);
    extracted.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));

    let mut tags: Vec<String> = Vec::new();
    let mut push = |tag: String| {
        let tag = tag.to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) && tags.len() < MAX_TAGS {
            tags.push(tag);
        }
    };

    push(topic.to_string());
    push(category.as_str().to_string());
    for keyword in extracted.into_iter().take(5) {
        push(keyword);
    }
    for extra in category.tag_extras() {
        push(extra.to_string());
    }
    tags
}

/// Majority difficulty among resources that report one; intermediate when
/// none do or on a tie won by intermediate-or-later order.
pub fn derive_difficulty(resources: &[Resource]) -> Difficulty {
    let mut counts = [0usize; 3];
    for resource in resources {
        match resource.difficulty {
            Some(Difficulty::Beginner) => counts[0] += 1,
            Some(Difficulty::Intermediate) => counts[1] += 1,
            Some(Difficulty::Advanced) => counts[2] += 1,
            None => {}
        }
    }

    if counts.iter().all(|&c| c == 0) {
        return Difficulty::Intermediate;
    }
    // Ties resolve to the earlier (easier) level
    let best = counts.iter().enumerate().max_by_key(|&(i, &c)| (c, std::cmp::Reverse(i)));
    match best.map(|(i, _)| i) {
        Some(0) => Difficulty::Beginner,
        Some(2) => Difficulty::Advanced,
        _ => Difficulty::Intermediate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathweaver_shared::{NodeId, NodeKind, Quiz, VisualPosition};

    fn resource(kind: ResourceKind) -> Resource {
        Resource::new("Rust ownership guide", "https://example.com/x", kind)
    }

    fn node_with(resources: Vec<Resource>, quiz: bool) -> Node {
        Node {
            id: NodeId::new("n", 0),
            title: "n".into(),
            description: String::new(),
            kind: if quiz { NodeKind::Quiz } else { NodeKind::Lesson },
            prerequisites: vec![],
            resources,
            position: VisualPosition { x: 0, y: 0, level: 0 },
            quiz: quiz.then(|| Quiz {
                questions: vec![],
                passing_score: 70,
            }),
            exercises: None,
        }
    }

    #[test]
    fn hours_have_a_floor_of_one() {
        let nodes = [node_with(vec![resource(ResourceKind::Video)], false)];
        assert_eq!(estimate_hours(nodes.iter()), 1);
    }

    #[test]
    fn hours_sum_resources_quizzes_and_overhead() {
        // 4 tutorials (120 min) + 1 quiz (15) + overhead 15 * (4/4) = 150 min
        let nodes = [
            node_with(vec![resource(ResourceKind::Tutorial); 4], false),
            node_with(vec![], true),
        ];
        assert_eq!(estimate_hours(nodes.iter()), 3);
    }

    #[test]
    fn video_duration_defaults_when_unset() {
        let mut with_duration = resource(ResourceKind::Video);
        with_duration.duration = Some(60);
        let nodes = [node_with(vec![with_duration], false)];
        assert_eq!(estimate_hours(nodes.iter()), 1);
    }

    #[test]
    fn tags_include_topic_category_and_extras() {
        let resources = vec![resource(ResourceKind::Article)];
        let tags = derive_tags("rust", "en", Category::Technology, &resources);

        assert_eq!(tags[0], "rust");
        assert_eq!(tags[1], "technology");
        assert!(tags.contains(&"ownership".to_string()));
        assert!(tags.contains(&"programming".to_string()));
        assert!(tags.len() <= MAX_TAGS);
        // No duplicates
        let unique: std::collections::HashSet<&String> = tags.iter().collect();
        assert_eq!(unique.len(), tags.len());
    }

    #[test]
    fn difficulty_majority_and_default() {
        let mut resources = vec![resource(ResourceKind::Article); 3];
        assert_eq!(derive_difficulty(&resources), Difficulty::Intermediate);

        resources[0].difficulty = Some(Difficulty::Advanced);
        resources[1].difficulty = Some(Difficulty::Advanced);
        resources[2].difficulty = Some(Difficulty::Beginner);
        assert_eq!(derive_difficulty(&resources), Difficulty::Advanced);
    }
}
