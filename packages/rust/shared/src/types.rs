//! Core domain types for pathweaver learning trees.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new time-sortable identifier.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id! {
    /// A UUID v7 wrapper for resource identifiers (time-sortable).
    ResourceId
}

uuid_id! {
    /// A UUID v7 wrapper for learning tree identifiers.
    TreeId
}

uuid_id! {
    /// A UUID v7 wrapper for pipeline task identifiers.
    TaskId
}

/// A readable node identifier: slugged title plus a positional suffix.
///
/// Node ids are deterministic for a given assembly input, which keeps the
/// whole tree-assembly stage reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Build an id from a human title and the node's creation index.
    pub fn new(title: &str, index: usize) -> Self {
        let slug: String = title
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        let slug = slug
            .split('_')
            .filter(|s| !s.is_empty())
            .take(4)
            .collect::<Vec<_>>()
            .join("_");
        Self(format!("{slug}_{index:02}"))
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// What kind of external content a resource is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Article,
    Video,
    Documentation,
    Tutorial,
    Exercise,
    Tool,
}

/// Difficulty rating for resources and the assembled tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        };
        f.write_str(s)
    }
}

/// A single external piece of content considered for inclusion in a tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Unique identifier.
    pub id: ResourceId,
    /// Display title.
    pub title: String,
    /// Canonical URL.
    pub url: String,
    /// Content kind.
    pub kind: ResourceKind,
    /// Short description or snippet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Video duration in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    /// Estimated read time in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_time: Option<u32>,
    /// Difficulty, when the source reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    /// Thumbnail URL (videos).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Language tag (e.g. "pt", "en"), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Relevance score assigned by the filter (0.0–1.0).
    #[serde(default)]
    pub score: f64,
}

impl Resource {
    /// Create a minimal resource with just title, url, and kind.
    pub fn new(title: impl Into<String>, url: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            id: ResourceId::new(),
            title: title.into(),
            url: url.into(),
            kind,
            description: None,
            duration: None,
            read_time: None,
            difficulty: None,
            thumbnail: None,
            language: None,
            score: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Quiz / exercise payloads
// ---------------------------------------------------------------------------

/// A multiple-choice question attached to a quiz node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Question identifier, unique within its quiz.
    pub id: String,
    /// Question text.
    pub text: String,
    /// Answer options (always ≥ 2).
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub correct_index: usize,
}

/// Quiz payload for a `quiz` node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub questions: Vec<Question>,
    /// Minimum score (percent) to pass.
    pub passing_score: u8,
}

/// A single practical exercise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub instructions: String,
}

/// Exercise-set payload for a `project` / `exercise_set` node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseSet {
    pub exercises: Vec<Exercise>,
    /// Minimum score (percent) to pass.
    pub passing_score: u8,
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// What kind of tree node this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Lesson,
    Quiz,
    Project,
    ExerciseSet,
}

/// Layout position for rendering the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualPosition {
    pub x: i32,
    pub y: i32,
    /// Depth in the tree; the root is level 0.
    pub level: u32,
}

/// A unit of the learning tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub title: String,
    pub description: String,
    pub kind: NodeKind,
    /// Ids of nodes that must be completed first. Always references nodes
    /// created earlier in the same tree; empty for the root.
    pub prerequisites: Vec<NodeId>,
    /// Resources owned by this node.
    pub resources: Vec<Resource>,
    pub position: VisualPosition,
    /// Quiz payload, present iff `kind == Quiz`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz: Option<Quiz>,
    /// Exercise payload, present for project / exercise-set nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercises: Option<ExerciseSet>,
}

impl Node {
    /// A node counts toward minimum-size validation when it carries real
    /// content: at least one resource, or a quiz/exercise payload.
    pub fn is_concrete(&self) -> bool {
        !self.resources.is_empty() || self.quiz.is_some() || self.exercises.is_some()
    }
}

// ---------------------------------------------------------------------------
// LearningTree
// ---------------------------------------------------------------------------

/// The complete assembled output for one topic/parameter combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningTree {
    pub id: TreeId,
    pub title: String,
    pub description: String,
    pub topic: String,
    /// Detected or caller-forced category name.
    pub category: String,
    pub language: String,
    pub root_node_id: NodeId,
    /// All nodes, keyed by id.
    pub nodes: std::collections::BTreeMap<NodeId, Node>,
    /// Estimated total hours to complete.
    pub total_hours: u32,
    pub tags: Vec<String>,
    pub difficulty: Difficulty,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Pipeline tasks
// ---------------------------------------------------------------------------

/// Lifecycle state of a pipeline task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Canceled,
}

impl TaskStatus {
    /// Terminal states never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Canceled)
    }
}

/// A timestamped entry in a task's message log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskMessage {
    pub time: DateTime<Utc>,
    pub message: String,
}

/// Snapshot of one background pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineTask {
    pub id: TaskId,
    pub description: String,
    pub status: TaskStatus,
    /// Integer progress 0–100.
    pub progress: u8,
    pub messages: Vec<TaskMessage>,
    /// Present once the task completed successfully.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<LearningTree>,
    /// Present once the task failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl PipelineTask {
    /// Create a fresh pending task.
    pub fn new(id: TaskId, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            description: description.into(),
            status: TaskStatus::Pending,
            progress: 0,
            messages: Vec::new(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Append a timestamped message to the log.
    pub fn add_message(&mut self, message: impl Into<String>) {
        self.messages.push(TaskMessage {
            time: Utc::now(),
            message: message.into(),
        });
        self.updated_at = Utc::now();
    }
}

/// Compact task listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: TaskId,
    pub description: String,
    pub status: TaskStatus,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
}

impl From<&PipelineTask> for TaskSummary {
    fn from(task: &PipelineTask) -> Self {
        Self {
            id: task.id.clone(),
            description: task.description.clone(),
            status: task.status,
            progress: task.progress,
            created_at: task.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_is_deterministic_and_readable() {
        let a = NodeId::new("Introduction to Rust", 0);
        let b = NodeId::new("Introduction to Rust", 0);
        assert_eq!(a, b);
        assert_eq!(a.0, "introduction_to_rust_00");

        let c = NodeId::new("Boas práticas em Python!", 7);
        assert!(c.0.ends_with("_07"));
    }

    #[test]
    fn resource_roundtrip() {
        let mut r = Resource::new("Rust Book", "https://doc.rust-lang.org/book/", ResourceKind::Documentation);
        r.read_time = Some(20);
        r.score = 0.85;

        let json = serde_json::to_string(&r).expect("serialize");
        let parsed: Resource = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.title, "Rust Book");
        assert_eq!(parsed.kind, ResourceKind::Documentation);
        assert_eq!(parsed.read_time, Some(20));
        // Unset optionals are omitted from the wire form
        assert!(!json.contains("thumbnail"));
    }

    #[test]
    fn concrete_node_classification() {
        let mut node = Node {
            id: NodeId::new("Empty", 3),
            title: "Empty".into(),
            description: String::new(),
            kind: NodeKind::Lesson,
            prerequisites: vec![],
            resources: vec![],
            position: VisualPosition { x: 0, y: 0, level: 1 },
            quiz: None,
            exercises: None,
        };
        assert!(!node.is_concrete());

        node.quiz = Some(Quiz {
            questions: vec![],
            passing_score: 70,
        });
        assert!(node.is_concrete());
    }

    #[test]
    fn task_status_terminality() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Canceled.is_terminal());
    }
}
