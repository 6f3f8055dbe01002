//! Shared types, error model, and configuration for pathweaver.
//!
//! This crate is the foundation depended on by all other pathweaver crates.
//! It provides:
//! - [`PathweaverError`] — the unified error type
//! - Domain types ([`Resource`], [`Node`], [`LearningTree`], [`PipelineTask`])
//! - Topic categorization ([`Category`])
//! - Configuration ([`AppConfig`], config loading)

pub mod category;
pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use category::Category;
pub use config::{
    AppConfig, BrowserConfig, CacheConfig, DefaultsConfig, FetchConfig, RelevanceConfig,
    SearchConfig, TasksConfig, TreeConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{FetchErrorKind, PathweaverError, Result};
pub use types::{
    Difficulty, Exercise, ExerciseSet, LearningTree, Node, NodeId, NodeKind, PipelineTask,
    Question, Quiz, Resource, ResourceId, ResourceKind, TaskId, TaskMessage, TaskStatus,
    TaskSummary, TreeId, VisualPosition,
};
