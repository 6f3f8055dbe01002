//! Video search via the YouTube Data API v3.
//!
//! The API key is read from an environment variable named in config; a
//! missing key makes the provider report unavailable, which the acquisition
//! service absorbs as a non-fatal provider failure.

use serde::Deserialize;
use tracing::{debug, instrument};

use pathweaver_fetch::HttpClient;
use pathweaver_shared::{PathweaverError, Resource, ResourceKind, Result, SearchConfig};

/// YouTube search provider.
pub struct VideoProvider {
    config: SearchConfig,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: ItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct ItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl VideoProvider {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    fn api_key(&self) -> Result<String> {
        std::env::var(&self.config.video_api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                PathweaverError::provider(
                    "video_search",
                    format!("{} not set, provider unavailable", self.config.video_api_key_env),
                )
            })
    }

    /// Search for videos on a topic. One topic-level query per pipeline run.
    #[instrument(skip_all, fields(topic = %topic))]
    pub async fn search(
        &self,
        client: &HttpClient,
        topic: &str,
        language: &str,
        max_results: usize,
    ) -> Result<Vec<Resource>> {
        let key = self.api_key()?;

        let response = client
            .raw()
            .get(&self.config.video_endpoint)
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("q", topic),
                ("maxResults", &max_results.to_string()),
                ("relevanceLanguage", language),
                ("key", &key),
            ])
            .send()
            .await
            .map_err(|e| PathweaverError::provider("video_search", e.to_string()))?;

        if !response.status().is_success() {
            return Err(PathweaverError::provider(
                "video_search",
                format!("api returned {}", response.status()),
            ));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| PathweaverError::provider("video_search", e.to_string()))?;

        let resources: Vec<Resource> = body
            .items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id.video_id?;
                let url = format!("https://www.youtube.com/watch?v={video_id}");

                let mut resource = Resource::new(&item.snippet.title, url, ResourceKind::Video);
                resource.description = (!item.snippet.description.is_empty())
                    .then_some(item.snippet.description);
                resource.thumbnail = item
                    .snippet
                    .thumbnails
                    .medium
                    .or(item.snippet.thumbnails.default)
                    .map(|t| t.url);
                resource.language = Some(language.to_string());
                Some(resource)
            })
            .collect();

        debug!(count = resources.len(), "video search parsed");
        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn response_body() -> serde_json::Value {
        serde_json::json!({
            "items": [
                {
                    "id": { "videoId": "abc123" },
                    "snippet": {
                        "title": "Rust in 100 Seconds",
                        "description": "A quick rust overview.",
                        "thumbnails": { "medium": { "url": "https://i.ytimg.com/abc123.jpg" } }
                    }
                },
                {
                    "id": { "channelId": "chan" },
                    "snippet": { "title": "Some Channel" }
                }
            ]
        })
    }

    #[tokio::test]
    async fn parses_videos_and_skips_non_video_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("type", "video"))
            .respond_with(ResponseTemplate::new(200).set_body_json(response_body()))
            .mount(&server)
            .await;

        // SAFETY: test-local env var name, not read concurrently elsewhere
        unsafe { std::env::set_var("PW_TEST_VIDEO_KEY_OK", "k-123") };
        let provider = VideoProvider::new(SearchConfig {
            video_endpoint: format!("{}/search", server.uri()),
            video_api_key_env: "PW_TEST_VIDEO_KEY_OK".into(),
            ..Default::default()
        });
        let client = HttpClient::new(Duration::from_secs(5)).unwrap();

        let resources = provider.search(&client, "rust", "en", 10).await.unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].url, "https://www.youtube.com/watch?v=abc123");
        assert_eq!(resources[0].kind, ResourceKind::Video);
        assert_eq!(
            resources[0].thumbnail.as_deref(),
            Some("https://i.ytimg.com/abc123.jpg")
        );
        // Duration stays unset; downstream estimation defaults it
        assert!(resources[0].duration.is_none());
    }

    #[tokio::test]
    async fn missing_key_is_a_provider_failure() {
        let provider = VideoProvider::new(SearchConfig {
            video_api_key_env: "PW_TEST_VIDEO_KEY_UNSET".into(),
            ..Default::default()
        });
        let client = HttpClient::new(Duration::from_secs(5)).unwrap();

        let err = provider.search(&client, "rust", "en", 10).await.unwrap_err();
        assert!(matches!(err, PathweaverError::Provider { .. }));
        assert!(!err.is_fatal());
    }
}
