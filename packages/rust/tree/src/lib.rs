//! Learning-tree assembly.
//!
//! Turns a filtered, ordered resource list into a connected tree of lesson,
//! quiz, and project nodes. Assembly is deterministic for a given input
//! order: node ids, shapes, prerequisites, and quiz placement involve no
//! randomness, so the same filtered resources always produce the same tree
//! structure.

pub mod metadata;
pub mod quiz;

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use pathweaver_shared::{
    Category, LearningTree, Node, NodeId, NodeKind, PathweaverError, Resource, Result, TreeConfig,
    TreeId, VisualPosition,
};

/// Horizontal and vertical spacing between rendered nodes.
const GRID_STEP: i32 = 200;

/// How many resources the root introduction node takes.
const ROOT_RESOURCES: usize = 2;

/// Pedagogical buckets, in order, with the title/description keywords that
/// route a resource into them.
const BUCKETS: [(&str, &[&str]); 5] = [
    (
        "introduction",
        &["introduction", "intro", "introdução", "beginner", "iniciante", "básico", "basics", "getting started", "começar"],
    ),
    (
        "fundamentals",
        &["fundamental", "concept", "conceito", "guide", "guia", "tutorial", "curso", "explained", "explicado"],
    ),
    (
        "practice",
        &["practice", "prática", "exercise", "exercício", "example", "exemplo", "hands-on", "how to", "passo a passo"],
    ),
    (
        "advanced",
        &["advanced", "avançado", "optimization", "otimização", "architecture", "arquitetura", "pattern", "performance"],
    ),
    (
        "project",
        &["project", "projeto", "build", "case", "implementation", "implementação"],
    ),
];

/// Indices of the middle buckets that absorb unmatched resources.
const OVERFLOW_BUCKETS: [usize; 2] = [1, 2];

/// Assembles learning trees from filtered resource lists.
pub struct TreeAssembler {
    config: TreeConfig,
}

impl TreeAssembler {
    pub fn new(config: TreeConfig) -> Self {
        Self { config }
    }

    /// Assemble a tree for `topic` from score-ordered resources.
    #[instrument(skip_all, fields(topic = %topic, resources = resources.len()))]
    pub fn assemble(
        &self,
        topic: &str,
        language: &str,
        category: Category,
        resources: Vec<Resource>,
    ) -> Result<LearningTree> {
        let ordered = bucket_order(resources);

        let mut root_resources = ordered.clone();
        let lesson_resources = root_resources.split_off(ROOT_RESOURCES.min(root_resources.len()));

        let chunk = chunk_size(lesson_resources.len(), self.config.max_nodes);
        let lesson_chunks: Vec<Vec<Resource>> = lesson_resources
            .chunks(chunk.max(1))
            .map(|c| c.to_vec())
            .collect();

        let total = 1 + lesson_chunks.len();
        let width = self.level_width(language, total);
        let levels = level_layout(total, width);

        // Node structure: index 0 is the root, lessons follow in creation
        // order, filling levels top to bottom.
        let mut parents: Vec<Option<usize>> = vec![None];
        let mut node_levels: Vec<u32> = vec![0];
        let mut positions: Vec<VisualPosition> = vec![VisualPosition { x: 0, y: 0, level: 0 }];

        let mut index = 1usize;
        let mut prev_start = 0usize;
        let mut prev_len = 1usize;
        for (level, &count) in levels.iter().enumerate().skip(1) {
            for slot in 0..count {
                let parent = prev_start + (slot * prev_len) / count;
                parents.push(Some(parent));
                node_levels.push(level as u32);
                positions.push(VisualPosition {
                    x: (slot as i32 - count as i32 / 2) * GRID_STEP,
                    y: level as i32 * GRID_STEP,
                    level: level as u32,
                });
            }
            prev_start = index;
            prev_len = count;
            index += count;
        }

        // The deepest last node carries the final project.
        let project_index = (total > 1).then_some(total - 1);

        let mut excluded = vec![0];
        if let Some(p) = project_index {
            excluded.push(p);
        }
        let quiz_indices = quiz::select_quiz_nodes(
            &parents,
            &node_levels,
            self.config.quiz_fraction,
            &excluded,
        );

        let subtopics = Category::render(category.subtopic_templates(), topic);
        let mut nodes: Vec<Node> = Vec::with_capacity(total);

        for i in 0..total {
            let (title, description, resources) = if i == 0 {
                (
                    format!("Introduction to {topic}"),
                    format!("Comece sua jornada de aprendizado em {topic}."),
                    root_resources.clone(),
                )
            } else {
                let title = lesson_title(&subtopics, i - 1);
                (
                    title.clone(),
                    format!("Estude {title} com recursos selecionados."),
                    lesson_chunks[i - 1].clone(),
                )
            };

            let id = NodeId::new(&title, i);
            let prerequisites = parents[i]
                .map(|p| vec![node_id_at(&nodes, p)])
                .unwrap_or_default();

            let mut node = Node {
                id,
                title,
                description,
                kind: NodeKind::Lesson,
                prerequisites,
                resources,
                position: positions[i],
                quiz: None,
                exercises: None,
            };

            if quiz_indices.contains(&i) {
                node.kind = NodeKind::Quiz;
                node.quiz = Some(quiz::generate_quiz(topic, &node.title, &node.resources));
            } else if project_index == Some(i) {
                node.kind = NodeKind::Project;
                node.exercises = Some(quiz::generate_exercise_set(topic, &node.title));
            }

            nodes.push(node);
        }

        let concrete = nodes.iter().filter(|n| n.is_concrete()).count();
        if concrete < self.config.min_nodes {
            return Err(PathweaverError::InsufficientNodes {
                actual: concrete,
                minimum: self.config.min_nodes,
            });
        }

        let all_resources: Vec<Resource> =
            nodes.iter().flat_map(|n| n.resources.iter().cloned()).collect();
        let total_hours = metadata::estimate_hours(nodes.iter());
        let tags = metadata::derive_tags(topic, language, category, &all_resources);
        let difficulty = metadata::derive_difficulty(&all_resources);

        debug!(
            nodes = nodes.len(),
            concrete,
            quizzes = quiz_indices.len(),
            levels = levels.len(),
            "tree assembled"
        );

        let root_node_id = nodes[0].id.clone();
        let node_map: BTreeMap<NodeId, Node> =
            nodes.into_iter().map(|n| (n.id.clone(), n)).collect();

        Ok(LearningTree {
            id: TreeId::new(),
            title: format!("Learning plan: {topic}"),
            description: format!(
                "Um plano de estudos estruturado sobre {topic}, da introdução ao projeto final."
            ),
            topic: topic.to_string(),
            category: category.as_str().to_string(),
            language: language.to_string(),
            root_node_id,
            nodes: node_map,
            total_hours,
            tags,
            difficulty,
            created_at: chrono::Utc::now(),
        })
    }

    /// Effective level width: the language branching factor clamped to the
    /// configured range, then adjusted so the height lands inside bounds.
    fn level_width(&self, language: &str, total: usize) -> usize {
        let base = self
            .config
            .branching_factor
            .unwrap_or_else(|| branching_factor(language));
        let mut width = base.clamp(self.config.min_width, self.config.max_width);

        let height_for = |w: usize| 1 + (total.saturating_sub(1)).div_ceil(w.max(1));

        while height_for(width) > self.config.max_height && width < self.config.max_width {
            width += 1;
        }
        while height_for(width) < self.config.min_height && width > self.config.min_width {
            width -= 1;
        }
        width
    }
}

/// Per-language branching factor; languages with larger resource ecosystems
/// get wider trees.
fn branching_factor(language: &str) -> usize {
    match language {
        "en" | "de" => 3,
        _ => 2,
    }
}

/// Reorder resources into pedagogical bucket order. Unmatched resources
/// round-robin into the middle buckets so no bucket starves.
fn bucket_order(resources: Vec<Resource>) -> Vec<Resource> {
    let mut buckets: Vec<Vec<Resource>> = vec![Vec::new(); BUCKETS.len()];
    let mut overflow_turn = 0usize;

    for resource in resources {
        let haystack = format!(
            "{} {}",
            resource.title.to_lowercase(),
            resource.description.as_deref().unwrap_or("").to_lowercase()
        );

        let matched = BUCKETS
            .iter()
            .position(|(_, keywords)| keywords.iter().any(|kw| haystack.contains(kw)));

        match matched {
            Some(bucket) => buckets[bucket].push(resource),
            None => {
                buckets[OVERFLOW_BUCKETS[overflow_turn % OVERFLOW_BUCKETS.len()]].push(resource);
                overflow_turn += 1;
            }
        }
    }

    buckets.into_iter().flatten().collect()
}

/// Smallest chunk size in 1..=4 that keeps the node count within bounds.
fn chunk_size(resource_count: usize, max_nodes: usize) -> usize {
    for chunk in 1..=4usize {
        if 1 + resource_count.div_ceil(chunk) <= max_nodes {
            return chunk;
        }
    }
    4
}

/// Node counts per level: a lone root, then full levels of `width`, with a
/// remainder level at the bottom.
fn level_layout(total: usize, width: usize) -> Vec<usize> {
    let mut levels = vec![1usize];
    let mut remaining = total.saturating_sub(1);
    while remaining > 0 {
        let count = remaining.min(width);
        levels.push(count);
        remaining -= count;
    }
    levels
}

fn lesson_title(subtopics: &[String], lesson_index: usize) -> String {
    let base = &subtopics[lesson_index % subtopics.len()];
    let round = lesson_index / subtopics.len();
    if round == 0 {
        base.clone()
    } else {
        format!("{base} (parte {})", round + 1)
    }
}

fn node_id_at(nodes: &[Node], index: usize) -> NodeId {
    nodes[index].id.clone()
}
