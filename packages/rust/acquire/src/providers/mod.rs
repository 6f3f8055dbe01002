//! Search providers feeding the acquisition service.

pub mod brave;
pub mod docs;
pub mod video;
pub mod web;

use pathweaver_shared::ResourceKind;

/// Infer a resource kind from its URL and title.
///
/// Heuristic keyword matching; the order matters (video hosts beat the
/// generic "tutorial" keyword so a YouTube tutorial stays a video).
pub fn infer_kind(url: &str, title: &str) -> ResourceKind {
    let haystack = format!("{} {}", url.to_lowercase(), title.to_lowercase());

    if haystack.contains("youtube.com")
        || haystack.contains("youtu.be")
        || haystack.contains("vimeo.com")
        || haystack.contains("video")
    {
        ResourceKind::Video
    } else if haystack.contains("docs.")
        || haystack.contains("/docs")
        || haystack.contains("documentation")
        || haystack.contains("reference")
        || haystack.contains("manual")
    {
        ResourceKind::Documentation
    } else if haystack.contains("tutorial")
        || haystack.contains("course")
        || haystack.contains("curso")
        || haystack.contains("how to")
        || haystack.contains("guide")
        || haystack.contains("guia")
    {
        ResourceKind::Tutorial
    } else if haystack.contains("exercise")
        || haystack.contains("practice")
        || haystack.contains("exercício")
    {
        ResourceKind::Exercise
    } else {
        ResourceKind::Article
    }
}
