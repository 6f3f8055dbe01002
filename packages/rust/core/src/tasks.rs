//! Background task orchestration.
//!
//! [`TaskRegistry`] tracks pipeline runs: pending → running → terminal,
//! with snapshot reads safe against the writer. [`Orchestrator`] binds a
//! registry to a [`Pipeline`] and spawns one tokio task per submission.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use pathweaver_shared::{
    PathweaverError, PipelineTask, Result, TaskId, TaskStatus, TaskSummary, TasksConfig,
};

use crate::pipeline::{GenerateParams, Pipeline, ProgressSink};

struct TrackedTask {
    task: PipelineTask,
    cancel: Arc<AtomicBool>,
}

/// Bounded registry of pipeline tasks.
pub struct TaskRegistry {
    // Insertion-ordered; eviction drops from the front.
    tasks: Mutex<Vec<TrackedTask>>,
    max_tasks: usize,
}

impl TaskRegistry {
    pub fn new(config: TasksConfig) -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            max_tasks: config.max_tasks,
        }
    }

    /// Register a new pending task, evicting the oldest tenth when full.
    /// Returns the id and the task's cancellation flag.
    pub fn register(&self, description: impl Into<String>) -> (TaskId, Arc<AtomicBool>) {
        let mut tasks = self.tasks.lock().expect("registry mutex poisoned");

        if tasks.len() >= self.max_tasks {
            let evict = (tasks.len() / 10).max(1);
            // Oldest tasks go regardless of state; a consumer that cares
            // about a result must collect it before overflow.
            tasks.drain(..evict);
            warn!(evicted = evict, "task registry at capacity");
        }

        let id = TaskId::new();
        let cancel = Arc::new(AtomicBool::new(false));
        tasks.push(TrackedTask {
            task: PipelineTask::new(id.clone(), description),
            cancel: cancel.clone(),
        });
        (id, cancel)
    }

    /// Snapshot one task's state.
    pub fn status(&self, id: &TaskId) -> Result<PipelineTask> {
        let tasks = self.tasks.lock().expect("registry mutex poisoned");
        tasks
            .iter()
            .find(|t| t.task.id == *id)
            .map(|t| t.task.clone())
            .ok_or_else(|| PathweaverError::TaskNotFound { id: id.to_string() })
    }

    /// All tracked tasks, newest first.
    pub fn list(&self) -> Vec<TaskSummary> {
        let tasks = self.tasks.lock().expect("registry mutex poisoned");
        tasks.iter().rev().map(|t| TaskSummary::from(&t.task)).collect()
    }

    /// Flip a task's cooperative cancel flag. Terminal tasks are left
    /// untouched.
    pub fn cancel(&self, id: &TaskId) -> Result<()> {
        let tasks = self.tasks.lock().expect("registry mutex poisoned");
        let tracked = tasks
            .iter()
            .find(|t| t.task.id == *id)
            .ok_or_else(|| PathweaverError::TaskNotFound { id: id.to_string() })?;

        if !tracked.task.status.is_terminal() {
            tracked.cancel.store(true, Ordering::Relaxed);
        }
        Ok(())
    }

    fn with_task(&self, id: &TaskId, f: impl FnOnce(&mut PipelineTask)) {
        let mut tasks = self.tasks.lock().expect("registry mutex poisoned");
        if let Some(tracked) = tasks.iter_mut().find(|t| t.task.id == *id) {
            f(&mut tracked.task);
        }
    }

    fn finish(&self, id: &TaskId, outcome: Result<pathweaver_shared::LearningTree>) {
        self.with_task(id, |task| {
            task.completed_at = Some(chrono::Utc::now());
            task.updated_at = chrono::Utc::now();
            match outcome {
                Ok(tree) => {
                    task.status = TaskStatus::Completed;
                    task.progress = 100;
                    task.add_message("plan generation completed");
                    task.result = Some(tree);
                }
                Err(PathweaverError::Canceled) => {
                    task.status = TaskStatus::Canceled;
                    task.add_message("plan generation canceled");
                }
                Err(e) => {
                    task.status = TaskStatus::Failed;
                    task.add_message(format!("plan generation failed: {e}"));
                    task.error = Some(e.to_string());
                }
            }
        });
    }
}

/// Progress sink that writes straight into the registry.
struct RegistrySink {
    registry: Arc<TaskRegistry>,
    id: TaskId,
}

impl ProgressSink for RegistrySink {
    fn update(&self, progress: u8, message: &str) {
        self.registry.with_task(&self.id, |task| {
            task.status = TaskStatus::Running;
            task.progress = progress;
            task.add_message(message);
        });
    }
}

/// Binds a pipeline to a task registry and spawns background runs.
pub struct Orchestrator {
    pipeline: Arc<Pipeline>,
    registry: Arc<TaskRegistry>,
}

impl Orchestrator {
    pub fn new(pipeline: Pipeline, tasks: TasksConfig) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            registry: Arc::new(TaskRegistry::new(tasks)),
        }
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    /// Submit a generation request. Returns immediately with the task id;
    /// the pipeline runs on its own tokio task.
    pub fn submit(&self, params: GenerateParams) -> TaskId {
        let (id, cancel) = self
            .registry
            .register(format!("learning plan for '{}'", params.topic.trim()));
        info!(task = %id, topic = %params.topic, "task submitted");

        let pipeline = self.pipeline.clone();
        let registry = self.registry.clone();
        let task_id = id.clone();

        tokio::spawn(async move {
            let sink = RegistrySink {
                registry: registry.clone(),
                id: task_id.clone(),
            };
            let outcome = pipeline.generate(&params, &sink, &cancel).await;
            registry.finish(&task_id, outcome);
        });

        id
    }
}
