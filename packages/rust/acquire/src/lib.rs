//! Resource acquisition: turn a topic into a merged, deduplicated list of
//! candidate resources from every configured provider.
//!
//! Providers run concurrently; a single provider failing (quota, network,
//! missing key) is logged and excluded. The whole stage only fails when
//! every provider comes back empty.

pub mod providers;

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, instrument, warn};

use pathweaver_cache::Cache;
use pathweaver_fetch::FetchExecutor;
use pathweaver_shared::{Category, PathweaverError, Resource, Result, SearchConfig};

use providers::brave::FallbackSearchProvider;
use providers::docs::DocsConnectors;
use providers::video::VideoProvider;
use providers::web::WebSearchProvider;

/// How many description-less candidates get a page fetch for enrichment.
const ENRICH_LIMIT: usize = 5;

/// Gathers resources for a topic from web search, video search, and
/// documentation connectors.
pub struct AcquisitionService {
    web: WebSearchProvider,
    fallback_web: FallbackSearchProvider,
    video: VideoProvider,
    cache: Arc<Cache>,
    fetcher: Arc<FetchExecutor>,
    config: SearchConfig,
}

impl AcquisitionService {
    pub fn new(config: SearchConfig, cache: Arc<Cache>, fetcher: Arc<FetchExecutor>) -> Self {
        Self {
            web: WebSearchProvider::new(config.clone()),
            fallback_web: FallbackSearchProvider::new(config.clone()),
            video: VideoProvider::new(config.clone()),
            cache,
            fetcher,
            config,
        }
    }

    /// Acquire up to `max_resources` candidates for a topic.
    ///
    /// Merge order is deterministic: documentation connectors first, then
    /// videos, then web results in query order — never arrival order.
    #[instrument(skip_all, fields(topic = %topic, language = %language, category = %category))]
    pub async fn acquire(
        &self,
        topic: &str,
        language: &str,
        category: Category,
        max_resources: usize,
    ) -> Result<Vec<Resource>> {
        let queries = Category::render(category.resource_queries(), topic);
        let per_query = self.config.max_results;
        let client = self.fetcher.client();

        let docs_fut = DocsConnectors::resolve(client, topic, category);
        let video_fut = self.cached_search("video", topic, language, per_query, || {
            self.video.search(client, topic, language, per_query)
        });
        let web_fut = join_all(queries.iter().map(|query| {
            self.cached_search("web", query, language, per_query, || {
                self.web_search_chain(query, language, per_query)
            })
        }));

        let (docs, video, web) = tokio::join!(docs_fut, video_fut, web_fut);

        let mut merged: Vec<Resource> = Vec::new();
        merged.extend(docs);
        match video {
            Ok(resources) => merged.extend(resources),
            Err(e) => warn!(error = %e, "video provider excluded"),
        }
        for (query, outcome) in queries.iter().zip(web) {
            match outcome {
                Ok(resources) => merged.extend(resources),
                Err(e) => warn!(query, error = %e, "web query excluded"),
            }
        }

        if merged.is_empty() {
            return Err(PathweaverError::NoResourcesFound {
                topic: topic.to_string(),
            });
        }

        let mut unique = dedup_by_url(merged);
        unique.truncate(max_resources);
        debug!(count = unique.len(), "candidates merged");

        self.enrich(&mut unique).await;
        Ok(unique)
    }

    /// Web search with engine failover: the primary engine first, the
    /// fallback engine when it errors or returns nothing. A fallback that
    /// also fails does not mask the primary's outcome.
    async fn web_search_chain(
        &self,
        query: &str,
        language: &str,
        max_results: usize,
    ) -> Result<Vec<Resource>> {
        let client = self.fetcher.client();

        let primary = self.web.search(client, query, language, max_results).await;
        match &primary {
            Ok(resources) if !resources.is_empty() => return primary,
            Ok(_) => debug!(query, "primary web engine empty, trying fallback"),
            Err(e) => warn!(query, error = %e, "primary web engine failed, trying fallback"),
        }

        match self
            .fallback_web
            .search(client, query, language, max_results)
            .await
        {
            Ok(resources) if !resources.is_empty() => Ok(resources),
            Ok(_) => primary,
            Err(e) => {
                debug!(query, error = %e, "fallback web engine unavailable");
                primary
            }
        }
    }

    /// Run one provider call through the search cache.
    async fn cached_search<F, Fut>(
        &self,
        provider: &str,
        query: &str,
        language: &str,
        max_results: usize,
        call: F,
    ) -> Result<Vec<Resource>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Resource>>>,
    {
        let key =
            pathweaver_cache::search_key(&format!("{provider}:{query}"), max_results, language);

        if let Some(cached) = self.cache.get_typed::<Vec<Resource>>(&key) {
            debug!(query, "search cache hit");
            return Ok(cached);
        }

        let resources = call().await?;
        self.cache
            .set_typed(&key, &resources, self.cache.search_ttl());
        Ok(resources)
    }

    /// Attach descriptions and read times to candidates lacking them, via
    /// bounded page fetches. Per-URL failures leave the candidate bare.
    async fn enrich(&self, resources: &mut [Resource]) {
        let targets: Vec<usize> = resources
            .iter()
            .enumerate()
            .filter(|(_, r)| r.description.is_none())
            .map(|(i, _)| i)
            .take(ENRICH_LIMIT)
            .collect();

        let pages = join_all(
            targets
                .iter()
                .map(|&i| self.fetcher.fetch(&resources[i].url)),
        )
        .await;

        for (&i, page) in targets.iter().zip(pages) {
            match page {
                Ok(page) => {
                    resources[i].description = page
                        .description
                        .or_else(|| Some(snippet_of(&page.text)).filter(|s| !s.is_empty()));
                    resources[i].read_time.get_or_insert(page.read_time);
                }
                Err(e) => debug!(url = %resources[i].url, error = %e, "enrichment fetch absorbed"),
            }
        }
    }
}

/// Drop duplicates by normalized URL (no fragment, no trailing slash),
/// keeping first occurrence so merge order decides the winner.
fn dedup_by_url(resources: Vec<Resource>) -> Vec<Resource> {
    let mut seen = std::collections::HashSet::new();
    resources
        .into_iter()
        .filter(|r| seen.insert(normalize_url(&r.url)))
        .collect()
}

fn normalize_url(url: &str) -> String {
    let url = url.split('#').next().unwrap_or(url);
    url.strip_suffix('/').unwrap_or(url).to_lowercase()
}

fn snippet_of(text: &str) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    flat.chars().take(200).collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathweaver_shared::{CacheConfig, FetchConfig, ResourceKind};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer, video_key_env: &str) -> AcquisitionService {
        let cache = Arc::new(Cache::new(CacheConfig::default()));
        let fetcher = Arc::new(
            FetchExecutor::new(
                FetchConfig {
                    max_retries: 1,
                    min_content_len: 10,
                    politeness_delay_ms: 0,
                    ..Default::default()
                },
                pathweaver_shared::BrowserConfig {
                    enabled: false,
                    ..Default::default()
                },
                cache.clone(),
            )
            .unwrap(),
        );
        let config = SearchConfig {
            web_endpoint: format!("{}/html/", server.uri()),
            video_endpoint: format!("{}/yt/search", server.uri()),
            video_api_key_env: video_key_env.into(),
            fallback_web_endpoint: format!("{}/brave/search", server.uri()),
            fallback_web_api_key_env: "PW_TEST_ACQ_NO_BRAVE".into(),
            ..Default::default()
        };
        AcquisitionService::new(config, cache, fetcher)
    }

    fn web_page(server: &MockServer) -> String {
        format!(
            r#"<html><body>
<a class="result__a" href="{0}/article-a">Rust tutorial one</a>
<a class="result__snippet">First rust article.</a>
<a class="result__a" href="{0}/article-a/#comments">Rust tutorial one again</a>
<a class="result__snippet">Duplicate link.</a>
<a class="result__a" href="{0}/article-b">Rust tutorial two</a>
<a class="result__snippet">Second rust article.</a>
</body></html>"#,
            server.uri()
        )
    }

    #[tokio::test]
    async fn merges_dedupes_and_orders_providers() {
        let server = MockServer::start().await;
        let page = web_page(&server);
        Mock::given(method("GET"))
            .and(path("/html/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/yt/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{
                    "id": { "videoId": "v1" },
                    "snippet": { "title": "Rust video", "description": "A rust video." }
                }]
            })))
            .mount(&server)
            .await;

        // SAFETY: test-local env var name
        unsafe { std::env::set_var("PW_TEST_ACQ_KEY", "k") };
        let service = service(&server, "PW_TEST_ACQ_KEY");

        let resources = service
            .acquire("rust", "en", Category::General, 15)
            .await
            .unwrap();

        // Videos precede web results; the fragment-variant duplicate is gone
        assert_eq!(resources[0].kind, ResourceKind::Video);
        let urls: Vec<&str> = resources.iter().map(|r| r.url.as_str()).collect();
        let unique: std::collections::HashSet<String> =
            urls.iter().map(|u| normalize_url(u)).collect();
        assert_eq!(unique.len(), urls.len());
        assert_eq!(resources.len(), 3);
    }

    #[tokio::test]
    async fn single_provider_failure_is_absorbed() {
        let server = MockServer::start().await;
        let page = web_page(&server);
        Mock::given(method("GET"))
            .and(path("/html/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;
        // No /yt/search mock and no API key: the video provider fails

        let service = service(&server, "PW_TEST_ACQ_KEY_MISSING");
        let resources = service
            .acquire("rust", "en", Category::General, 15)
            .await
            .unwrap();
        assert!(!resources.is_empty());
        assert!(resources.iter().all(|r| r.kind != ResourceKind::Video));
    }

    #[tokio::test]
    async fn failed_primary_engine_fails_over_to_fallback() {
        let server = MockServer::start().await;
        // Primary web engine is down for every query
        Mock::given(method("GET"))
            .and(path("/html/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/brave/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "web": {
                    "results": [{
                        "title": "Rust tutorial from the fallback engine",
                        "url": format!("{}/fallback-article", server.uri()),
                        "description": "A rust tutorial."
                    }]
                }
            })))
            .mount(&server)
            .await;

        // SAFETY: test-local env var name
        unsafe { std::env::set_var("PW_TEST_ACQ_BRAVE_KEY", "k") };
        let cache = Arc::new(Cache::new(CacheConfig::default()));
        let fetcher = Arc::new(
            FetchExecutor::new(
                FetchConfig {
                    max_retries: 1,
                    min_content_len: 10,
                    politeness_delay_ms: 0,
                    ..Default::default()
                },
                pathweaver_shared::BrowserConfig {
                    enabled: false,
                    ..Default::default()
                },
                cache.clone(),
            )
            .unwrap(),
        );
        let service = AcquisitionService::new(
            SearchConfig {
                web_endpoint: format!("{}/html/", server.uri()),
                video_endpoint: format!("{}/yt/search", server.uri()),
                video_api_key_env: "PW_TEST_ACQ_KEY_MISSING".into(),
                fallback_web_endpoint: format!("{}/brave/search", server.uri()),
                fallback_web_api_key_env: "PW_TEST_ACQ_BRAVE_KEY".into(),
                ..Default::default()
            },
            cache,
            fetcher,
        );

        let resources = service
            .acquire("rust", "en", Category::General, 15)
            .await
            .unwrap();
        assert!(!resources.is_empty());
        assert!(resources
            .iter()
            .any(|r| r.title.contains("fallback engine")));
    }

    #[tokio::test]
    async fn all_providers_empty_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/html/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
            .mount(&server)
            .await;

        let service = service(&server, "PW_TEST_ACQ_KEY_MISSING");
        let err = service
            .acquire("unfindable topic", "en", Category::General, 15)
            .await
            .unwrap_err();
        assert!(matches!(err, PathweaverError::NoResourcesFound { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn repeat_searches_hit_the_cache() {
        let server = MockServer::start().await;
        let page = web_page(&server);
        // Each of the 5 category queries gets exactly one upstream call;
        // the second acquire is served entirely from cache.
        Mock::given(method("GET"))
            .and(path("/html/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .expect(5)
            .mount(&server)
            .await;

        let service = service(&server, "PW_TEST_ACQ_KEY_MISSING");
        let first = service
            .acquire("rust", "en", Category::General, 15)
            .await
            .unwrap();
        let second = service
            .acquire("rust", "en", Category::General, 15)
            .await
            .unwrap();
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn url_normalization() {
        assert_eq!(
            normalize_url("https://Example.com/Path/#frag"),
            "https://example.com/path"
        );
        assert_eq!(normalize_url("https://example.com/path"), "https://example.com/path");
    }

    #[tokio::test]
    async fn enrichment_fills_missing_descriptions() {
        let server = MockServer::start().await;
        let body = "Useful article content about rust ownership. ".repeat(5);
        Mock::given(method("GET"))
            .and(path("/html/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<html><body>
<a class="result__a" href="{0}/bare">Bare result</a>
<a class="result__snippet"></a>
</body></html>"#,
                server.uri()
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bare"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "<html><head><title>Bare</title></head><body><main><p>{body}</p></main></body></html>"
            )))
            .mount(&server)
            .await;

        let service = service(&server, "PW_TEST_ACQ_KEY_MISSING");
        let resources = service
            .acquire("rust", "en", Category::General, 15)
            .await
            .unwrap();

        let bare = resources.iter().find(|r| r.title == "Bare result").unwrap();
        assert!(bare.description.is_some());
        assert!(bare.read_time.is_some());
    }
}
