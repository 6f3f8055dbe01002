//! Web search via the DuckDuckGo HTML endpoint.
//!
//! The `/html/` endpoint serves a plain results page that parses without
//! scripting. Result links are redirect-wrapped (`uddg=` parameter); the
//! target URL is unwrapped before use.

use scraper::{Html, Selector};
use tracing::{debug, instrument};

use pathweaver_fetch::HttpClient;
use pathweaver_shared::{PathweaverError, Resource, Result, SearchConfig};

use super::infer_kind;

/// DuckDuckGo HTML search provider.
pub struct WebSearchProvider {
    config: SearchConfig,
}

impl WebSearchProvider {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    /// Region code for a language tag (DuckDuckGo `kl` parameter).
    fn region(language: &str) -> &'static str {
        match language {
            "en" => "us-en",
            "pt" => "br-pt",
            "es" => "es-es",
            "fr" => "fr-fr",
            "de" => "de-de",
            "it" => "it-it",
            _ => "wt-wt",
        }
    }

    /// Run one search query and parse the results page.
    #[instrument(skip_all, fields(query = %query))]
    pub async fn search(
        &self,
        client: &HttpClient,
        query: &str,
        language: &str,
        max_results: usize,
    ) -> Result<Vec<Resource>> {
        let url = format!(
            "{}?q={}&kl={}",
            self.config.web_endpoint,
            urlencode(query),
            Self::region(language),
        );

        let html = client
            .get_text(&url)
            .await
            .map_err(|e| PathweaverError::provider("web_search", e.to_string()))?;

        let resources = parse_results(&html, language, max_results);
        debug!(count = resources.len(), "web search parsed");
        Ok(resources)
    }
}

/// Parse a DuckDuckGo HTML results page into resources.
pub fn parse_results(html: &str, language: &str, max_results: usize) -> Vec<Resource> {
    let document = Html::parse_document(html);
    let link_sel = Selector::parse("a.result__a").expect("static selector");
    let snippet_sel = Selector::parse(".result__snippet").expect("static selector");

    let snippets: Vec<String> = document
        .select(&snippet_sel)
        .map(|e| e.text().collect::<String>().trim().to_string())
        .collect();

    let mut resources = Vec::new();
    for (i, link) in document.select(&link_sel).enumerate() {
        if resources.len() >= max_results {
            break;
        }
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(target) = unwrap_redirect(href) else {
            continue;
        };
        let title = link.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            continue;
        }

        let mut resource = Resource::new(&title, &target, infer_kind(&target, &title));
        resource.description = snippets.get(i).filter(|s| !s.is_empty()).cloned();
        resource.language = Some(language.to_string());
        resources.push(resource);
    }
    resources
}

/// Unwrap DuckDuckGo's redirect link (`//duckduckgo.com/l/?uddg=<target>`)
/// to the real target URL. Plain absolute links pass through unchanged.
fn unwrap_redirect(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };

    let parsed = url::Url::parse(&absolute).ok()?;

    if parsed.path().starts_with("/l/") {
        let target = parsed
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned())?;
        return url::Url::parse(&target).ok().map(|u| u.to_string());
    }

    matches!(parsed.scheme(), "http" | "https").then(|| parsed.to_string())
}

fn urlencode(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathweaver_shared::ResourceKind;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RESULTS_PAGE: &str = r#"<html><body>
<div class="result">
  <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fdoc.rust-lang.org%2Fbook%2F">The Rust Book documentation</a>
  <a class="result__snippet">The official book on the Rust programming language.</a>
</div>
<div class="result">
  <a class="result__a" href="https://example.com/rust-tutorial">Rust tutorial for beginners</a>
  <a class="result__snippet">Step by step rust tutorial.</a>
</div>
<div class="result">
  <a class="result__a" href="https://blog.example.com/why-rust">Why Rust</a>
  <a class="result__snippet"></a>
</div>
</body></html>"#;

    #[test]
    fn parses_results_and_unwraps_redirects() {
        let resources = parse_results(RESULTS_PAGE, "en", 10);
        assert_eq!(resources.len(), 3);

        assert_eq!(resources[0].url, "https://doc.rust-lang.org/book/");
        assert_eq!(resources[0].kind, ResourceKind::Documentation);
        assert_eq!(
            resources[0].description.as_deref(),
            Some("The official book on the Rust programming language.")
        );

        assert_eq!(resources[1].kind, ResourceKind::Tutorial);
        // Empty snippets stay None
        assert!(resources[2].description.is_none());
    }

    #[test]
    fn respects_max_results() {
        let resources = parse_results(RESULTS_PAGE, "en", 2);
        assert_eq!(resources.len(), 2);
    }

    #[test]
    fn region_mapping() {
        assert_eq!(WebSearchProvider::region("pt"), "br-pt");
        assert_eq!(WebSearchProvider::region("en"), "us-en");
        assert_eq!(WebSearchProvider::region("ja"), "wt-wt");
    }

    #[tokio::test]
    async fn search_hits_the_endpoint_with_region() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/html/"))
            .and(query_param("kl", "br-pt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
            .mount(&server)
            .await;

        let provider = WebSearchProvider::new(SearchConfig {
            web_endpoint: format!("{}/html/", server.uri()),
            ..Default::default()
        });
        let client = HttpClient::new(Duration::from_secs(5)).unwrap();

        let resources = provider
            .search(&client, "rust tutorial", "pt", 10)
            .await
            .unwrap();
        assert_eq!(resources.len(), 3);
        assert_eq!(resources[0].language.as_deref(), Some("pt"));
    }

    #[tokio::test]
    async fn transport_failure_becomes_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = WebSearchProvider::new(SearchConfig {
            web_endpoint: format!("{}/html/", server.uri()),
            ..Default::default()
        });
        let client = HttpClient::new(Duration::from_secs(5)).unwrap();

        let err = provider.search(&client, "rust", "en", 10).await.unwrap_err();
        assert!(matches!(err, PathweaverError::Provider { .. }));
        assert!(!err.is_fatal());
    }
}
