//! Application configuration for pathweaver.
//!
//! User config lives at `~/.pathweaver/pathweaver.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PathweaverError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "pathweaver.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".pathweaver";

// ---------------------------------------------------------------------------
// Config structs (matching pathweaver.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Cache layer settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Fetch executor settings.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Headless browser pool settings.
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Search provider settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Relevance filter settings.
    #[serde(default)]
    pub relevance: RelevanceConfig,

    /// Tree assembly settings.
    #[serde(default)]
    pub tree: TreeConfig,

    /// Task orchestrator settings.
    #[serde(default)]
    pub tasks: TasksConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default request language for searches and stopwords.
    #[serde(default = "default_language")]
    pub language: String,

    /// Default number of resources to gather per tree.
    #[serde(default = "default_max_resources")]
    pub max_resources: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            max_resources: default_max_resources(),
        }
    }
}

fn default_language() -> String {
    "pt".into()
}
fn default_max_resources() -> usize {
    15
}

/// `[cache]` section. TTL classes differ by volatility: search results are
/// short-lived, page content medium, assembled trees long.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries before LRU eviction kicks in.
    #[serde(default = "default_cache_entries")]
    pub max_entries: usize,

    /// TTL for `search:` entries (default 1 day).
    #[serde(default = "default_search_ttl")]
    pub search_ttl_secs: u64,

    /// TTL for `page:` entries (default 1 week).
    #[serde(default = "default_page_ttl")]
    pub page_ttl_secs: u64,

    /// TTL for `tree:` entries (default 30 days).
    #[serde(default = "default_tree_ttl")]
    pub tree_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_cache_entries(),
            search_ttl_secs: default_search_ttl(),
            page_ttl_secs: default_page_ttl(),
            tree_ttl_secs: default_tree_ttl(),
        }
    }
}

fn default_cache_entries() -> usize {
    1000
}
fn default_search_ttl() -> u64 {
    86_400
}
fn default_page_ttl() -> u64 {
    604_800
}
fn default_tree_ttl() -> u64 {
    2_592_000
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-fetch timeout budget in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// Global cap on simultaneous fetches.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Cap on simultaneous fetches to one host.
    #[serde(default = "default_per_domain")]
    pub per_domain: usize,

    /// Attempts per strategy before giving up on it.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Extracted text shorter than this is treated as a JS-rendered shell.
    #[serde(default = "default_min_content_len")]
    pub min_content_len: usize,

    /// Delay between consecutive requests to the same host.
    #[serde(default = "default_politeness_ms")]
    pub politeness_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            max_concurrent: default_max_concurrent(),
            per_domain: default_per_domain(),
            max_retries: default_max_retries(),
            min_content_len: default_min_content_len(),
            politeness_delay_ms: default_politeness_ms(),
        }
    }
}

fn default_fetch_timeout() -> u64 {
    8
}
fn default_max_concurrent() -> usize {
    10
}
fn default_per_domain() -> usize {
    3
}
fn default_max_retries() -> u32 {
    3
}
fn default_min_content_len() -> usize {
    1000
}
fn default_politeness_ms() -> u64 {
    250
}

/// `[browser]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Whether the scripted-browser strategy is available at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Size of the reusable browser-instance pool.
    #[serde(default = "default_browser_instances")]
    pub max_instances: usize,

    /// Navigation timeout in seconds.
    #[serde(default = "default_nav_timeout")]
    pub nav_timeout_secs: u64,

    /// Explicit Chrome/Chromium executable path, if auto-detection fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable_path: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_instances: default_browser_instances(),
            nav_timeout_secs: default_nav_timeout(),
            executable_path: None,
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_browser_instances() -> usize {
    2
}
fn default_nav_timeout() -> u64 {
    30
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum results per provider query.
    #[serde(default = "default_search_results")]
    pub max_results: usize,

    /// Timeout per provider call in seconds.
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_secs: u64,

    /// Web-search HTML endpoint (overridable for tests).
    #[serde(default = "default_web_endpoint")]
    pub web_endpoint: String,

    /// Video-search API endpoint (overridable for tests).
    #[serde(default = "default_video_endpoint")]
    pub video_endpoint: String,

    /// Name of the env var holding the video API key (never the key itself).
    #[serde(default = "default_video_key_env")]
    pub video_api_key_env: String,

    /// Fallback web-search API endpoint (overridable for tests).
    #[serde(default = "default_fallback_web_endpoint")]
    pub fallback_web_endpoint: String,

    /// Name of the env var holding the fallback web-search API key.
    #[serde(default = "default_fallback_web_key_env")]
    pub fallback_web_api_key_env: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_search_results(),
            provider_timeout_secs: default_provider_timeout(),
            web_endpoint: default_web_endpoint(),
            video_endpoint: default_video_endpoint(),
            video_api_key_env: default_video_key_env(),
            fallback_web_endpoint: default_fallback_web_endpoint(),
            fallback_web_api_key_env: default_fallback_web_key_env(),
        }
    }
}

fn default_search_results() -> usize {
    15
}
fn default_provider_timeout() -> u64 {
    15
}
fn default_web_endpoint() -> String {
    "https://html.duckduckgo.com/html/".into()
}
fn default_video_endpoint() -> String {
    "https://www.googleapis.com/youtube/v3/search".into()
}
fn default_video_key_env() -> String {
    "YOUTUBE_API_KEY".into()
}
fn default_fallback_web_endpoint() -> String {
    "https://api.search.brave.com/res/v1/web/search".into()
}
fn default_fallback_web_key_env() -> String {
    "BRAVE_API_KEY".into()
}

/// `[relevance]` section. The bonus values are empirical tuning defaults,
/// not invariants; all are overridable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelevanceConfig {
    /// Minimum score a resource needs to survive filtering.
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Score every resource starts with.
    #[serde(default = "default_base_score")]
    pub base_score: f64,

    /// Bonus for the exact topic appearing in the title.
    #[serde(default = "default_title_bonus")]
    pub title_match_bonus: f64,

    /// Bonus for the exact topic appearing in the description.
    #[serde(default = "default_description_bonus")]
    pub description_match_bonus: f64,

    /// Per-word bonus for topic words found in the title.
    #[serde(default = "default_title_word_bonus")]
    pub title_word_bonus: f64,

    /// Per-word bonus for topic words found in the description.
    #[serde(default = "default_description_word_bonus")]
    pub description_word_bonus: f64,

    /// Flat bonus for tutorial/documentation/article resources.
    #[serde(default = "default_kind_bonus")]
    pub kind_bonus: f64,

    /// Guaranteed floor when the title equals the topic exactly.
    #[serde(default = "default_exact_floor")]
    pub exact_title_floor: f64,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            base_score: default_base_score(),
            title_match_bonus: default_title_bonus(),
            description_match_bonus: default_description_bonus(),
            title_word_bonus: default_title_word_bonus(),
            description_word_bonus: default_description_word_bonus(),
            kind_bonus: default_kind_bonus(),
            exact_title_floor: default_exact_floor(),
        }
    }
}

fn default_threshold() -> f64 {
    0.3
}
fn default_base_score() -> f64 {
    0.1
}
fn default_title_bonus() -> f64 {
    0.5
}
fn default_description_bonus() -> f64 {
    0.3
}
fn default_title_word_bonus() -> f64 {
    0.2
}
fn default_description_word_bonus() -> f64 {
    0.1
}
fn default_kind_bonus() -> f64 {
    0.2
}
fn default_exact_floor() -> f64 {
    0.8
}

/// `[tree]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Minimum concrete nodes for a valid tree.
    #[serde(default = "default_min_nodes")]
    pub min_nodes: usize,

    /// Hard cap on total nodes.
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,

    /// Minimum nodes per level.
    #[serde(default = "default_min_width")]
    pub min_width: usize,

    /// Maximum nodes per level.
    #[serde(default = "default_max_width")]
    pub max_width: usize,

    /// Minimum tree depth.
    #[serde(default = "default_min_height")]
    pub min_height: usize,

    /// Maximum tree depth.
    #[serde(default = "default_max_height")]
    pub max_height: usize,

    /// Target fraction of quiz nodes.
    #[serde(default = "default_quiz_fraction")]
    pub quiz_fraction: f64,

    /// Override for the per-language branching factor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branching_factor: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            min_nodes: default_min_nodes(),
            max_nodes: default_max_nodes(),
            min_width: default_min_width(),
            max_width: default_max_width(),
            min_height: default_min_height(),
            max_height: default_max_height(),
            quiz_fraction: default_quiz_fraction(),
            branching_factor: None,
        }
    }
}

fn default_min_nodes() -> usize {
    12
}
fn default_max_nodes() -> usize {
    28
}
fn default_min_width() -> usize {
    3
}
fn default_max_width() -> usize {
    5
}
fn default_min_height() -> usize {
    3
}
fn default_max_height() -> usize {
    7
}
fn default_quiz_fraction() -> f64 {
    0.25
}

/// `[tasks]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Maximum tracked tasks before oldest-first eviction.
    #[serde(default = "default_max_tasks")]
    pub max_tasks: usize,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            max_tasks: default_max_tasks(),
        }
    }
}

fn default_max_tasks() -> usize {
    100
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.pathweaver/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PathweaverError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.pathweaver/pathweaver.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PathweaverError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        PathweaverError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PathweaverError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PathweaverError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PathweaverError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("max_entries"));
        assert!(toml_str.contains("YOUTUBE_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.cache.max_entries, 1000);
        assert_eq!(parsed.fetch.timeout_secs, 8);
        assert_eq!(parsed.tree.min_nodes, 12);
        assert_eq!(parsed.defaults.language, "pt");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[fetch]
max_concurrent = 4

[browser]
enabled = false
"#;
        let config: AppConfig = toml_str.parse::<toml::Table>().unwrap().try_into().unwrap();
        assert_eq!(config.fetch.max_concurrent, 4);
        // Unspecified fields keep their defaults
        assert_eq!(config.fetch.per_domain, 3);
        assert!(!config.browser.enabled);
        assert_eq!(config.browser.max_instances, 2);
        assert_eq!(config.cache.search_ttl_secs, 86_400);
    }

    #[test]
    fn ttl_classes_ordered_by_volatility() {
        let cache = CacheConfig::default();
        assert!(cache.search_ttl_secs < cache.page_ttl_secs);
        assert!(cache.page_ttl_secs < cache.tree_ttl_secs);
    }
}
