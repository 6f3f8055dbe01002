//! The generation pipeline: topic in, learning tree out.
//!
//! Stages: validate, acquire, filter, assemble, cache. Progress is posted
//! through a [`ProgressSink`] at stage boundaries, and a cooperative cancel
//! flag is observed between stages — in-flight fetches finish, but no new
//! stage starts after cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, instrument};

use pathweaver_acquire::AcquisitionService;
use pathweaver_cache::Cache;
use pathweaver_fetch::FetchExecutor;
use pathweaver_relevance::RelevanceFilter;
use pathweaver_shared::{AppConfig, Category, LearningTree, PathweaverError, Result, TreeConfig};
use pathweaver_tree::TreeAssembler;

/// Bounds on the per-request resource cap.
const MIN_MAX_RESOURCES: usize = 5;
const MAX_MAX_RESOURCES: usize = 30;

/// Minimum topic length after trimming.
const MIN_TOPIC_LEN: usize = 3;

/// Allowed ranges for caller-supplied tree shape overrides.
const MIN_WIDTH_RANGE: std::ops::RangeInclusive<usize> = 2..=10;
const MAX_WIDTH_RANGE: std::ops::RangeInclusive<usize> = 3..=15;
const MIN_HEIGHT_RANGE: std::ops::RangeInclusive<usize> = 2..=10;
const MAX_HEIGHT_RANGE: std::ops::RangeInclusive<usize> = 3..=15;

/// Receives progress updates from a running pipeline.
pub trait ProgressSink: Send + Sync {
    fn update(&self, progress: u8, message: &str);
}

/// Sink that drops all updates; for tests and fire-and-forget runs.
pub struct SilentSink;

impl ProgressSink for SilentSink {
    fn update(&self, _progress: u8, _message: &str) {}
}

/// Caller-supplied generation request.
#[derive(Debug, Clone, Default)]
pub struct GenerateParams {
    /// Free-text topic to build a plan for.
    pub topic: String,
    /// Request language; defaults from config.
    pub language: Option<String>,
    /// Forced category; auto-detected when absent.
    pub category: Option<Category>,
    /// Resource cap; defaults from config.
    pub max_resources: Option<usize>,
    /// Tree shape overrides; defaults from config.
    pub min_nodes: Option<usize>,
    pub max_nodes: Option<usize>,
    pub min_width: Option<usize>,
    pub max_width: Option<usize>,
    pub min_height: Option<usize>,
    pub max_height: Option<usize>,
}

/// Params after validation and default resolution.
#[derive(Debug, Clone)]
struct ResolvedParams {
    topic: String,
    language: String,
    category: Category,
    max_resources: usize,
    tree: TreeConfig,
}

impl GenerateParams {
    fn resolve(&self, config: &AppConfig) -> Result<ResolvedParams> {
        let topic = self.topic.trim().to_string();
        if topic.chars().count() < MIN_TOPIC_LEN {
            return Err(PathweaverError::invalid_params(format!(
                "topic must be at least {MIN_TOPIC_LEN} characters"
            )));
        }

        let max_resources = self.max_resources.unwrap_or(config.defaults.max_resources);
        if !(MIN_MAX_RESOURCES..=MAX_MAX_RESOURCES).contains(&max_resources) {
            return Err(PathweaverError::invalid_params(format!(
                "max_resources must be between {MIN_MAX_RESOURCES} and {MAX_MAX_RESOURCES}, got {max_resources}"
            )));
        }

        let language = self
            .language
            .clone()
            .unwrap_or_else(|| config.defaults.language.clone());
        let category = self.category.unwrap_or_else(|| Category::detect(&topic));
        let tree = self.tree_config(config)?;

        Ok(ResolvedParams {
            topic,
            language,
            category,
            max_resources,
            tree,
        })
    }

    /// Merge caller tree-shape overrides over the configured defaults,
    /// checking each against its allowed range.
    fn tree_config(&self, config: &AppConfig) -> Result<TreeConfig> {
        fn bounded(
            name: &str,
            value: Option<usize>,
            range: std::ops::RangeInclusive<usize>,
            default: usize,
        ) -> Result<usize> {
            match value {
                Some(v) if !range.contains(&v) => Err(PathweaverError::invalid_params(format!(
                    "{name} must be between {} and {}, got {v}",
                    range.start(),
                    range.end()
                ))),
                Some(v) => Ok(v),
                None => Ok(default),
            }
        }

        let mut tree = config.tree.clone();
        tree.min_width = bounded("min_width", self.min_width, MIN_WIDTH_RANGE, tree.min_width)?;
        tree.max_width = bounded("max_width", self.max_width, MAX_WIDTH_RANGE, tree.max_width)?;
        tree.min_height = bounded("min_height", self.min_height, MIN_HEIGHT_RANGE, tree.min_height)?;
        tree.max_height = bounded("max_height", self.max_height, MAX_HEIGHT_RANGE, tree.max_height)?;
        tree.min_nodes = self.min_nodes.unwrap_or(tree.min_nodes);
        tree.max_nodes = self.max_nodes.unwrap_or(tree.max_nodes);

        if tree.min_width > tree.max_width {
            return Err(PathweaverError::invalid_params(format!(
                "min_width {} exceeds max_width {}",
                tree.min_width, tree.max_width
            )));
        }
        if tree.min_height > tree.max_height {
            return Err(PathweaverError::invalid_params(format!(
                "min_height {} exceeds max_height {}",
                tree.min_height, tree.max_height
            )));
        }
        if tree.min_nodes > tree.max_nodes {
            return Err(PathweaverError::invalid_params(format!(
                "min_nodes {} exceeds max_nodes {}",
                tree.min_nodes, tree.max_nodes
            )));
        }

        Ok(tree)
    }
}

/// The content acquisition and assembly pipeline.
pub struct Pipeline {
    config: AppConfig,
    cache: Arc<Cache>,
    acquisition: AcquisitionService,
    filter: RelevanceFilter,
}

impl Pipeline {
    /// Wire up all pipeline components from config. The cache and fetch
    /// executor are shared across concurrent runs.
    pub fn new(config: AppConfig) -> Result<Self> {
        let cache = Arc::new(Cache::new(config.cache.clone()));
        let fetcher = Arc::new(FetchExecutor::new(
            config.fetch.clone(),
            config.browser.clone(),
            cache.clone(),
        )?);
        let acquisition = AcquisitionService::new(config.search.clone(), cache.clone(), fetcher);
        let filter = RelevanceFilter::new(config.relevance.clone());

        Ok(Self {
            config,
            cache,
            acquisition,
            filter,
        })
    }

    /// The shared cache, exposed for stats reporting.
    pub fn cache(&self) -> &Arc<Cache> {
        &self.cache
    }

    /// Run the full pipeline for one request.
    #[instrument(skip_all, fields(topic = %params.topic))]
    pub async fn generate(
        &self,
        params: &GenerateParams,
        sink: &dyn ProgressSink,
        cancel: &AtomicBool,
    ) -> Result<LearningTree> {
        let resolved = params.resolve(&self.config)?;
        sink.update(10, "parameters validated");

        // Tree shape is part of the request identity: different bounds must
        // never replay each other's cached trees.
        let shape = format!(
            "n{}-{}_w{}-{}_h{}-{}",
            resolved.tree.min_nodes,
            resolved.tree.max_nodes,
            resolved.tree.min_width,
            resolved.tree.max_width,
            resolved.tree.min_height,
            resolved.tree.max_height,
        );
        let cache_key = pathweaver_cache::tree_key(&[
            &resolved.topic,
            &resolved.language,
            resolved.category.as_str(),
            &resolved.max_resources.to_string(),
            &shape,
        ]);
        if let Some(tree) = self.cache.get_typed::<LearningTree>(&cache_key) {
            info!("tree cache hit");
            sink.update(100, "plan served from cache");
            return Ok(tree);
        }

        ensure_live(cancel)?;
        sink.update(
            20,
            &format!("search started in category '{}'", resolved.category),
        );

        let candidates = self
            .acquisition
            .acquire(
                &resolved.topic,
                &resolved.language,
                resolved.category,
                resolved.max_resources,
            )
            .await?;
        sink.update(40, &format!("{} resources found", candidates.len()));

        ensure_live(cancel)?;
        let filtered = self
            .filter
            .filter(&resolved.topic, &resolved.language, candidates);
        if filtered.is_empty() {
            return Err(PathweaverError::NoResourcesFound {
                topic: resolved.topic,
            });
        }
        sink.update(50, &format!("filtering complete, {} kept", filtered.len()));

        ensure_live(cancel)?;
        let assembler = TreeAssembler::new(resolved.tree.clone());
        let tree = assembler.assemble(
            &resolved.topic,
            &resolved.language,
            resolved.category,
            filtered,
        )?;
        sink.update(80, &format!("tree assembled with {} nodes", tree.nodes.len()));

        self.cache.set_typed(&cache_key, &tree, self.cache.tree_ttl());
        sink.update(90, "plan cached");

        debug!(tree_id = %tree.id, nodes = tree.nodes.len(), "generation complete");
        sink.update(100, "plan ready");
        Ok(tree)
    }
}

/// Cooperative cancellation check between stages.
fn ensure_live(cancel: &AtomicBool) -> Result<()> {
    if cancel.load(Ordering::Relaxed) {
        return Err(PathweaverError::Canceled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_topics_are_rejected() {
        let params = GenerateParams {
            topic: "  ab ".into(),
            ..Default::default()
        };
        let err = params.resolve(&AppConfig::default()).unwrap_err();
        assert!(matches!(err, PathweaverError::InvalidParameters { .. }));
    }

    #[test]
    fn resource_cap_bounds_are_enforced() {
        for bad in [0, 4, 31, 100] {
            let params = GenerateParams {
                topic: "rust".into(),
                max_resources: Some(bad),
                ..Default::default()
            };
            assert!(params.resolve(&AppConfig::default()).is_err(), "{bad}");
        }

        let params = GenerateParams {
            topic: "rust".into(),
            max_resources: Some(30),
            ..Default::default()
        };
        assert!(params.resolve(&AppConfig::default()).is_ok());
    }

    #[test]
    fn defaults_and_detection_fill_gaps() {
        let params = GenerateParams {
            topic: "programação em python".into(),
            ..Default::default()
        };
        let resolved = params.resolve(&AppConfig::default()).unwrap();
        assert_eq!(resolved.language, "pt");
        assert_eq!(resolved.max_resources, 15);
        assert_eq!(resolved.category, Category::Technology);
    }

    #[test]
    fn tree_shape_overrides_are_range_checked() {
        let base = GenerateParams {
            topic: "rust".into(),
            ..Default::default()
        };

        let params = GenerateParams {
            min_width: Some(1),
            ..base.clone()
        };
        assert!(params.resolve(&AppConfig::default()).is_err());

        let params = GenerateParams {
            max_height: Some(16),
            ..base.clone()
        };
        assert!(params.resolve(&AppConfig::default()).is_err());

        // Overrides must stay mutually consistent after merging defaults
        let params = GenerateParams {
            min_width: Some(6),
            max_width: Some(4),
            ..base.clone()
        };
        assert!(params.resolve(&AppConfig::default()).is_err());

        let params = GenerateParams {
            min_width: Some(2),
            max_width: Some(4),
            min_height: Some(2),
            max_height: Some(5),
            ..base
        };
        let resolved = params.resolve(&AppConfig::default()).unwrap();
        assert_eq!(resolved.tree.min_width, 2);
        assert_eq!(resolved.tree.max_width, 4);
        assert_eq!(resolved.tree.max_height, 5);
        // Untouched bounds keep the configured defaults
        assert_eq!(resolved.tree.min_nodes, 12);
    }

    #[test]
    fn forced_category_wins_over_detection() {
        let params = GenerateParams {
            topic: "programação em python".into(),
            category: Some(Category::Education),
            ..Default::default()
        };
        let resolved = params.resolve(&AppConfig::default()).unwrap();
        assert_eq!(resolved.category, Category::Education);
    }

    #[tokio::test]
    async fn canceled_flag_stops_the_run() {
        let pipeline = Pipeline::new(AppConfig::default()).unwrap();
        let cancel = AtomicBool::new(true);
        let params = GenerateParams {
            topic: "rust".into(),
            ..Default::default()
        };

        let err = pipeline
            .generate(&params, &SilentSink, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, PathweaverError::Canceled));
    }
}
