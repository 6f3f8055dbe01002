//! HTML content extraction.
//!
//! Takes a raw HTML document and produces clean, markdown-ish plain text
//! plus lightweight metadata (title, description, estimated read time).

use scraper::{Html, Selector};

/// Reading speed used for read-time estimation.
const WORDS_PER_MINUTE: usize = 200;

/// Tags whose subtrees carry no article content.
const SKIP_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "aside", "form", "iframe",
];

/// Extracted page content with metadata.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PageContent {
    /// Final URL the content was fetched from.
    pub url: String,
    /// Page title (`<title>`, falling back to the first `<h1>`).
    pub title: Option<String>,
    /// Meta description, when present.
    pub description: Option<String>,
    /// Cleaned markdown-ish body text.
    pub text: String,
    /// Estimated read time in minutes (words / 200, minimum 1).
    pub read_time: u32,
}

/// Extract content from a raw HTML document.
///
/// Prefers `<main>` / `<article>` containers when present; otherwise falls
/// back to `<body>`. Script, style, and chrome elements are stripped before
/// the markdown conversion.
pub fn extract(url: &str, html: &str) -> PageContent {
    let document = Html::parse_document(html);

    let title = select_text(&document, "title").or_else(|| select_text(&document, "h1"));
    let description = select_attr(&document, r#"meta[name="description"]"#, "content")
        .or_else(|| select_attr(&document, r#"meta[property="og:description"]"#, "content"));

    let container_html = content_container(&document);
    let text = to_markdown(&container_html);

    let words = text.split_whitespace().count();
    let read_time = (words / WORDS_PER_MINUTE).max(1) as u32;

    PageContent {
        url: url.to_string(),
        title,
        description,
        text,
        read_time,
    }
}

/// Pick the most content-dense container: `<main>`, then `<article>`,
/// then the whole `<body>`.
fn content_container(document: &Html) -> String {
    for css in ["main", "article", "body"] {
        if let Ok(selector) = Selector::parse(css)
            && let Some(element) = document.select(&selector).next()
        {
            return element.html();
        }
    }
    document.root_element().html()
}

/// Convert an HTML fragment to plain markdown, stripping chrome tags and
/// collapsing runs of blank lines.
fn to_markdown(html: &str) -> String {
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(SKIP_TAGS.to_vec())
        .build();

    let markdown = converter.convert(html).unwrap_or_default();
    collapse_whitespace(&markdown)
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0usize;

    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.trim().to_string()
}

fn select_text(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    let element = document.select(&selector).next()?;
    let text: String = element.text().collect::<String>().trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn select_attr(document: &Html, css: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    let element = document.select(&selector).next()?;
    let value = element.value().attr(attr)?.trim().to_string();
    (!value.is_empty()).then_some(value)
}
