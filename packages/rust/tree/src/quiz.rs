//! Quiz placement and payload generation.
//!
//! Placement works on the tree's level/parent structure: roughly a quarter
//! of the nodes become quizzes, spread along branches and depth bands, never
//! the root and never two in a row on any branch.

use pathweaver_relevance::keywords;
use pathweaver_shared::{Difficulty, Exercise, ExerciseSet, Question, Quiz, Resource};

/// Minimum score to pass a quiz or exercise set.
const PASSING_SCORE: u8 = 70;

/// Band quotas for the second placement pass, as fractions of the remaining
/// quota: beginner levels (≤1), intermediate (≤3), advanced (>3).
const BAND_QUOTAS: [(u32, f64); 3] = [(1, 0.3), (3, 0.5), (u32::MAX, 0.2)];

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// Select node indices to convert into quiz nodes.
///
/// `parents[i]` is the prerequisite parent of node `i` (`None` for the
/// root), `levels[i]` its depth. `excluded` nodes (the root, the project
/// node) are never selected.
pub fn select_quiz_nodes(
    parents: &[Option<usize>],
    levels: &[u32],
    quiz_fraction: f64,
    excluded: &[usize],
) -> Vec<usize> {
    let total = parents.len();
    let target = ((total as f64) * quiz_fraction).round() as usize;
    if target == 0 {
        return Vec::new();
    }

    let children = children_of(parents);
    let mut selected: Vec<usize> = Vec::new();

    let selectable = |i: usize, selected: &[usize]| {
        !excluded.contains(&i)
            && parents[i].is_some()
            && !selected.contains(&i)
            && !adjacent_selected(i, parents, &children, selected)
    };

    // First pass: the mid node of every branch longer than two hops.
    for branch in branches(parents, &children) {
        if selected.len() >= target {
            break;
        }
        if branch.len() > 2 {
            let mid = branch[branch.len() / 2];
            if selectable(mid, &selected) {
                selected.push(mid);
            }
        }
    }

    // Second pass: fill the remaining quota per depth band, taking every
    // other candidate for spacing.
    let remaining = target.saturating_sub(selected.len());
    if remaining > 0 {
        let mut lower = 0u32;
        for (upper, fraction) in BAND_QUOTAS {
            let quota = ((remaining as f64) * fraction).round() as usize;
            let mut taken = 0usize;
            let mut skip = false;

            for i in 0..total {
                if taken >= quota || selected.len() >= target {
                    break;
                }
                if levels[i] < lower || levels[i] > upper || !selectable(i, &selected) {
                    continue;
                }
                if skip {
                    skip = false;
                    continue;
                }
                selected.push(i);
                taken += 1;
                skip = true;
            }
            lower = upper.saturating_add(1);
        }
    }

    selected.sort_unstable();
    selected
}

fn children_of(parents: &[Option<usize>]) -> Vec<Vec<usize>> {
    let mut children = vec![Vec::new(); parents.len()];
    for (i, parent) in parents.iter().enumerate() {
        if let Some(p) = parent {
            children[*p].push(i);
        }
    }
    children
}

/// All root-to-leaf paths, in node-index order.
fn branches(parents: &[Option<usize>], children: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let Some(root) = parents.iter().position(|p| p.is_none()) else {
        return Vec::new();
    };

    let mut paths = Vec::new();
    let mut stack = vec![vec![root]];
    while let Some(path) = stack.pop() {
        let last = *path.last().expect("path never empty");
        if children[last].is_empty() {
            paths.push(path);
            continue;
        }
        // Reverse push keeps leaf discovery in index order
        for &child in children[last].iter().rev() {
            let mut next = path.clone();
            next.push(child);
            stack.push(next);
        }
    }
    paths.sort();
    paths
}

fn adjacent_selected(
    i: usize,
    parents: &[Option<usize>],
    children: &[Vec<usize>],
    selected: &[usize],
) -> bool {
    if let Some(p) = parents[i]
        && selected.contains(&p)
    {
        return true;
    }
    children[i].iter().any(|c| selected.contains(c))
}

// ---------------------------------------------------------------------------
// Quiz payload
// ---------------------------------------------------------------------------

/// Generate a quiz from a node's resources.
///
/// Three to five questions, keyword-driven where the resources yield usable
/// keywords, generic otherwise. Correct indices are fixed per question slot
/// so grading is deterministic.
pub fn generate_quiz(topic: &str, node_title: &str, resources: &[Resource]) -> Quiz {
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
    let kws = keywords::extract(&corpus, "en", 10);

    let count = kws.len().clamp(3, 5);
    let mut questions: Vec<Question> = kws
        .iter()
        .take(count)
        .enumerate()
        .map(|(i, kw)| keyword_question(topic, node_title, kw, i))
        .collect();

    let mut generic_index = 0;
    while questions.len() < 3 {
        questions.push(generic_question(node_title, generic_index, questions.len()));
        generic_index += 1;
    }

    Quiz {
        questions,
        passing_score: PASSING_SCORE,
    }
}

fn keyword_question(topic: &str, node_title: &str, keyword: &str, index: usize) -> Question {
    let (text, options, correct_index) = match index {
        0 => (
            format!("What is {keyword} in the context of {topic}?"),
            vec![
                format!("A fundamental concept in {topic}"),
                format!("An advanced technique used in {topic}"),
                format!("A tool commonly used with {topic}"),
                format!("A historical aspect of {topic}"),
            ],
            0,
        ),
        1 => (
            format!("What is the main purpose of {keyword} in {topic}?"),
            vec![
                format!("To simplify {topic} processes"),
                format!("To optimize {topic} performance"),
                format!("To enhance {topic} functionality"),
                format!("To standardize {topic} implementation"),
            ],
            2,
        ),
        2 => (
            format!("How does {keyword} relate to {node_title}?"),
            vec![
                format!("It's a prerequisite for understanding {node_title}"),
                format!("It's an advanced concept that builds on {node_title}"),
                format!("It's a key component of {node_title}"),
                format!("It's an alternative approach to {node_title}"),
            ],
            2,
        ),
        _ => (
            format!("Which of the following is NOT associated with {keyword} in {topic}?"),
            vec![
                "Understanding core principles".to_string(),
                "Implementing best practices".to_string(),
                "Avoiding common pitfalls".to_string(),
                "Replacing traditional methods".to_string(),
            ],
            3,
        ),
    };

    Question {
        id: format!("q_{index:02}"),
        text,
        options,
        correct_index,
    }
}

fn generic_question(node_title: &str, index: usize, position: usize) -> Question {
    let (text, options, correct_index) = match index {
        0 => (
            format!("What is the most important aspect of {node_title}?"),
            vec![
                "Understanding the fundamentals".to_string(),
                "Practicing with examples".to_string(),
                "Learning advanced techniques".to_string(),
                "Exploring related topics".to_string(),
            ],
            0,
        ),
        1 => (
            format!("Which approach is best for learning about {node_title}?"),
            vec![
                "Reading comprehensive guides".to_string(),
                "Watching video tutorials".to_string(),
                "Hands-on practice with examples".to_string(),
                "Discussing with experts".to_string(),
            ],
            2,
        ),
        _ => (
            format!("What skill is most valuable when working with {node_title}?"),
            vec![
                "Attention to detail".to_string(),
                "Creative problem-solving".to_string(),
                "Systematic approach".to_string(),
                "Technical knowledge".to_string(),
            ],
            1,
        ),
    };

    Question {
        id: format!("q_{position:02}"),
        text,
        options,
        correct_index,
    }
}

// ---------------------------------------------------------------------------
// Exercise payload
// ---------------------------------------------------------------------------

/// Generate the project node's exercise set: three exercises spanning the
/// difficulty range.
pub fn generate_exercise_set(topic: &str, node_title: &str) -> ExerciseSet {
    let exercises = vec![
        Exercise {
            id: "ex_00".into(),
            title: format!("Conceitos básicos de {node_title}"),
            description: format!("Teste seu conhecimento sobre os conceitos básicos de {topic}."),
            difficulty: Difficulty::Beginner,
            instructions: format!(
                "Liste os principais conceitos de {node_title} relacionados a {topic}."
            ),
        },
        Exercise {
            id: "ex_01".into(),
            title: format!("Aplicação prática de {node_title}"),
            description: format!("Demonstre como aplicar {topic} em um cenário real."),
            difficulty: Difficulty::Intermediate,
            instructions: format!(
                "Descreva um caso de uso prático para {node_title} no contexto de {topic}."
            ),
        },
        Exercise {
            id: "ex_02".into(),
            title: format!("Implementação prática de {topic}"),
            description: format!("Implemente um exemplo completo usando {topic}."),
            difficulty: Difficulty::Advanced,
            instructions: format!(
                "Construa um pequeno projeto que demonstre o uso de {topic} de ponta a ponta."
            ),
        },
    ];

    ExerciseSet {
        exercises,
        passing_score: PASSING_SCORE,
    }
}
