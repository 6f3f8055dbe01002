//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use pathweaver_core::{GenerateParams, Orchestrator, Pipeline};
use pathweaver_shared::{
    AppConfig, Category, LearningTree, NodeKind, TaskStatus, init_config, load_config,
    load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Pathweaver — turn any topic into a structured learning plan.
#[derive(Parser)]
#[command(
    name = "pathweaver",
    version,
    about = "Generate learning plans from web resources for any topic.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate a learning plan for a topic.
    Generate {
        /// Topic to build a plan for.
        topic: String,

        /// Request language (defaults from config, e.g. "pt").
        #[arg(short, long)]
        language: Option<String>,

        /// Force a category instead of auto-detecting.
        #[arg(short, long)]
        category: Option<String>,

        /// Maximum resources to gather (5-30).
        #[arg(short, long)]
        max_resources: Option<usize>,

        /// Minimum concrete nodes in the tree.
        #[arg(long)]
        min_nodes: Option<usize>,

        /// Maximum total nodes in the tree.
        #[arg(long)]
        max_nodes: Option<usize>,

        /// Minimum nodes per level (2-10).
        #[arg(long)]
        min_width: Option<usize>,

        /// Maximum nodes per level (3-15).
        #[arg(long)]
        max_width: Option<usize>,

        /// Minimum tree depth (2-10).
        #[arg(long)]
        min_height: Option<usize>,

        /// Maximum tree depth (3-15).
        #[arg(long)]
        max_height: Option<usize>,

        /// Write the full plan as JSON to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the full plan as JSON to stdout.
        #[arg(long)]
        json: bool,

        /// Print cache statistics after generation.
        #[arg(long)]
        cache_stats: bool,
    },

    /// Show the detected category and search queries for a topic.
    Categories {
        /// Topic to categorize.
        topic: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "pathweaver=info",
        1 => "pathweaver=debug",
        _ => "pathweaver=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    match cli.command {
        Command::Generate {
            topic,
            language,
            category,
            max_resources,
            min_nodes,
            max_nodes,
            min_width,
            max_width,
            min_height,
            max_height,
            output,
            json,
            cache_stats,
        } => {
            let category = category
                .as_deref()
                .map(|c| c.parse::<Category>().map_err(|e| eyre!(e)))
                .transpose()?;
            let params = GenerateParams {
                topic,
                language,
                category,
                max_resources,
                min_nodes,
                max_nodes,
                min_width,
                max_width,
                min_height,
                max_height,
            };
            cmd_generate(config, params, output.as_deref(), json, cache_stats).await
        }
        Command::Categories { topic } => cmd_categories(&topic),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

async fn cmd_generate(
    config: AppConfig,
    params: GenerateParams,
    output: Option<&std::path::Path>,
    json: bool,
    cache_stats: bool,
) -> Result<()> {
    let tasks_config = config.tasks.clone();

    info!(topic = %params.topic, "generating learning plan");

    let pipeline = Pipeline::new(config)?;
    let cache = pipeline.cache().clone();
    let orchestrator = Orchestrator::new(pipeline, tasks_config);
    let task_id = orchestrator.submit(params);

    let spinner = CliProgress::new();
    let task = loop {
        let snapshot = orchestrator.registry().status(&task_id)?;
        if let Some(last) = snapshot.messages.last() {
            spinner.set(snapshot.progress, &last.message);
        }
        if snapshot.status.is_terminal() {
            break snapshot;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    };
    spinner.finish();

    match task.status {
        TaskStatus::Completed => {
            let tree = task.result.ok_or_else(|| eyre!("completed task has no plan"))?;
            print_summary(&tree);

            if json {
                println!("{}", serde_json::to_string_pretty(&tree)?);
            }
            if let Some(path) = output {
                std::fs::write(path, serde_json::to_string_pretty(&tree)?)?;
                println!("  Plan written to {}", path.display());
            }
            if cache_stats {
                let stats = cache.stats();
                println!(
                    "  Cache:      {}/{} entries, {} hits / {} misses ({:.0}% hit rate)",
                    stats.size,
                    stats.max_size,
                    stats.hits,
                    stats.misses,
                    stats.hit_rate * 100.0
                );
            }
            Ok(())
        }
        TaskStatus::Canceled => Err(eyre!("generation canceled")),
        _ => Err(eyre!(
            "generation failed: {}",
            task.error.unwrap_or_else(|| "unknown error".into())
        )),
    }
}

fn print_summary(tree: &LearningTree) {
    let lessons = count_kind(tree, NodeKind::Lesson);
    let quizzes = count_kind(tree, NodeKind::Quiz);
    let projects = count_kind(tree, NodeKind::Project);
    let resources: usize = tree.nodes.values().map(|n| n.resources.len()).sum();

    println!();
    println!("  Learning plan ready!");
    println!("  Topic:      {}", tree.topic);
    println!("  Category:   {}", tree.category);
    println!("  Language:   {}", tree.language);
    println!("  Difficulty: {}", tree.difficulty);
    println!(
        "  Nodes:      {} ({lessons} lessons, {quizzes} quizzes, {projects} project)",
        tree.nodes.len()
    );
    println!("  Resources:  {resources}");
    println!("  Est. time:  {}h", tree.total_hours);
    println!("  Tags:       {}", tree.tags.join(", "));
    println!();
}

fn count_kind(tree: &LearningTree, kind: NodeKind) -> usize {
    tree.nodes.values().filter(|n| n.kind == kind).count()
}

fn cmd_categories(topic: &str) -> Result<()> {
    let category = Category::detect(topic);
    println!("Topic:    {topic}");
    println!("Category: {category}");
    println!("Queries:");
    for query in Category::render(category.resource_queries(), topic) {
        println!("  - {query}");
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress display
// ---------------------------------------------------------------------------

/// Spinner showing pipeline progress while the background task runs.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("static template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    fn set(&self, progress: u8, message: &str) {
        self.spinner.set_message(format!("[{progress:>3}%] {message}"));
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}
