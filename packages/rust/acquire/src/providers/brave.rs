//! Fallback web search via the Brave Search API.
//!
//! Tried when the primary web-search engine fails or comes back empty. The
//! API key is read from an environment variable named in config; a missing
//! key makes the provider report unavailable, which the fallback chain
//! absorbs as a non-fatal provider failure.

use serde::Deserialize;
use tracing::{debug, instrument};

use pathweaver_fetch::HttpClient;
use pathweaver_shared::{PathweaverError, Resource, Result, SearchConfig};

use super::infer_kind;

/// The API caps one request at 20 results.
const API_MAX_COUNT: usize = 20;

/// Brave Search fallback provider.
pub struct FallbackSearchProvider {
    config: SearchConfig,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    web: WebResults,
}

#[derive(Debug, Default, Deserialize)]
struct WebResults {
    #[serde(default)]
    results: Vec<WebItem>,
}

#[derive(Debug, Deserialize)]
struct WebItem {
    title: String,
    url: String,
    #[serde(default)]
    description: String,
}

impl FallbackSearchProvider {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    fn api_key(&self) -> Result<String> {
        std::env::var(&self.config.fallback_web_api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                PathweaverError::provider(
                    "fallback_search",
                    format!(
                        "{} not set, provider unavailable",
                        self.config.fallback_web_api_key_env
                    ),
                )
            })
    }

    /// Run one search query against the API.
    #[instrument(skip_all, fields(query = %query))]
    pub async fn search(
        &self,
        client: &HttpClient,
        query: &str,
        language: &str,
        max_results: usize,
    ) -> Result<Vec<Resource>> {
        let key = self.api_key()?;
        let count = max_results.min(API_MAX_COUNT);

        let response = client
            .raw()
            .get(&self.config.fallback_web_endpoint)
            .query(&[
                ("q", query),
                ("count", &count.to_string()),
                ("search_lang", language),
                ("ui_lang", language),
                ("safesearch", "moderate"),
            ])
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &key)
            .send()
            .await
            .map_err(|e| PathweaverError::provider("fallback_search", e.to_string()))?;

        if !response.status().is_success() {
            return Err(PathweaverError::provider(
                "fallback_search",
                format!("api returned {}", response.status()),
            ));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| PathweaverError::provider("fallback_search", e.to_string()))?;

        let resources: Vec<Resource> = body
            .web
            .results
            .into_iter()
            .filter(|item| !item.title.is_empty() && !item.url.is_empty())
            .take(max_results)
            .map(|item| {
                let mut resource =
                    Resource::new(&item.title, &item.url, infer_kind(&item.url, &item.title));
                resource.description =
                    (!item.description.is_empty()).then_some(item.description);
                resource.language = Some(language.to_string());
                resource
            })
            .collect();

        debug!(count = resources.len(), "fallback search parsed");
        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathweaver_shared::ResourceKind;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn response_body() -> serde_json::Value {
        serde_json::json!({
            "web": {
                "results": [
                    {
                        "title": "Rust tutorial for beginners",
                        "url": "https://example.com/rust-tutorial",
                        "description": "Step by step rust tutorial."
                    },
                    {
                        "title": "",
                        "url": "https://example.com/untitled"
                    }
                ]
            }
        })
    }

    #[tokio::test]
    async fn parses_results_and_sends_the_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("search_lang", "pt"))
            .and(header("X-Subscription-Token", "k-456"))
            .respond_with(ResponseTemplate::new(200).set_body_json(response_body()))
            .mount(&server)
            .await;

        // SAFETY: test-local env var name, not read concurrently elsewhere
        unsafe { std::env::set_var("PW_TEST_BRAVE_KEY_OK", "k-456") };
        let provider = FallbackSearchProvider::new(SearchConfig {
            fallback_web_endpoint: format!("{}/search", server.uri()),
            fallback_web_api_key_env: "PW_TEST_BRAVE_KEY_OK".into(),
            ..Default::default()
        });
        let client = HttpClient::new(Duration::from_secs(5)).unwrap();

        let resources = provider.search(&client, "rust", "pt", 10).await.unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].url, "https://example.com/rust-tutorial");
        assert_eq!(resources[0].kind, ResourceKind::Tutorial);
        assert_eq!(resources[0].language.as_deref(), Some("pt"));
    }

    #[tokio::test]
    async fn missing_key_is_a_provider_failure() {
        let provider = FallbackSearchProvider::new(SearchConfig {
            fallback_web_api_key_env: "PW_TEST_BRAVE_KEY_UNSET".into(),
            ..Default::default()
        });
        let client = HttpClient::new(Duration::from_secs(5)).unwrap();

        let err = provider.search(&client, "rust", "en", 10).await.unwrap_err();
        assert!(matches!(err, PathweaverError::Provider { .. }));
        assert!(!err.is_fatal());
    }
}
