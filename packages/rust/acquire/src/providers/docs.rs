//! Official-documentation connectors.
//!
//! A small static table maps well-known technology topics to their official
//! documentation sites. A connector fires when the category is technology
//! and the topic mentions the language; candidates are liveness-checked
//! before inclusion so a dead link never enters a tree.

use tracing::{debug, instrument};

use pathweaver_fetch::HttpClient;
use pathweaver_shared::{Category, Resource, ResourceKind};

struct DocsEntry {
    topic: &'static str,
    title: &'static str,
    url: &'static str,
}

const DOCS_TABLE: &[DocsEntry] = &[
    DocsEntry {
        topic: "python",
        title: "Python Official Documentation",
        url: "https://docs.python.org/3/",
    },
    DocsEntry {
        topic: "javascript",
        title: "MDN JavaScript Reference",
        url: "https://developer.mozilla.org/en-US/docs/Web/JavaScript",
    },
    DocsEntry {
        topic: "typescript",
        title: "TypeScript Handbook",
        url: "https://www.typescriptlang.org/docs/",
    },
    DocsEntry {
        topic: "rust",
        title: "The Rust Programming Language",
        url: "https://doc.rust-lang.org/book/",
    },
    DocsEntry {
        topic: "go",
        title: "Go Documentation",
        url: "https://go.dev/doc/",
    },
    DocsEntry {
        topic: "java",
        title: "Java SE Documentation",
        url: "https://docs.oracle.com/en/java/",
    },
];

/// Static official-docs connector set.
pub struct DocsConnectors;

impl DocsConnectors {
    /// Connector entries matching a topic/category, before liveness checks.
    fn matching(topic: &str, category: Category) -> Vec<&'static DocsEntry> {
        if category != Category::Technology {
            return Vec::new();
        }
        let topic = topic.to_lowercase();
        let words: Vec<&str> = topic.split_whitespace().collect();

        DOCS_TABLE
            .iter()
            .filter(|entry| words.iter().any(|w| *w == entry.topic))
            .collect()
    }

    /// Resolve live documentation resources for a topic.
    #[instrument(skip_all, fields(topic = %topic, category = %category))]
    pub async fn resolve(client: &HttpClient, topic: &str, category: Category) -> Vec<Resource> {
        let mut resources = Vec::new();

        for entry in Self::matching(topic, category) {
            if client.is_live(entry.url).await {
                let mut resource =
                    Resource::new(entry.title, entry.url, ResourceKind::Documentation);
                resource.description =
                    Some(format!("Official documentation for {}", entry.topic));
                resources.push(resource);
            } else {
                debug!(url = entry.url, "docs connector skipped, url not live");
            }
        }
        resources
    }
}
