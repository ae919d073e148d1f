//! The HTML format handler.
//!
//! Delegates extraction to [`crate::content::html`], then assembles a
//! [`ProcessedContent`]. Non-HTML handlers convert to HTML first and
//! delegate here, so this is the one place the structured tree, asset
//! inventory, and markdown rendering come together.

use scraper::Html;

use crate::config::QualityConfig;
use crate::content::html::{self, markdown_emit};
use crate::content::link_filter::LinkFilter;
use crate::content::ProcessedContent;

use super::{Format, FormatHandler};

pub struct HtmlHandler;

impl HtmlHandler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Run the pipeline directly (used by non-HTML handlers that have
    /// already converted their input to an HTML string).
    pub fn process(&self, content: &str, base_url: &str, quality: &QualityConfig, link_filter: &LinkFilter) -> ProcessedContent {
        // Step 1: length gate.
        if content.len() > quality.max_content_length {
            return ProcessedContent::with_error(
                base_url,
                Format::Html.name(),
                format!("content length {} exceeds maximum {}", content.len(), quality.max_content_length),
            );
        }
        if content.len() < quality.min_content_length {
            return ProcessedContent::with_error(
                base_url,
                Format::Html.name(),
                format!("content length {} is below minimum {}", content.len(), quality.min_content_length),
            );
        }

        let Ok(base) = url::Url::parse(base_url) else {
            return ProcessedContent::with_error(base_url, Format::Html.name(), "invalid base URL");
        };

        // Steps 2-10: parse and delegate extraction.
        let document = Html::parse_document(content);
        let walked = html::extract(&document, &base, quality, link_filter);

        // Step 11: deterministic HTML->Markdown.
        let markdown = markdown_emit::render(&walked.structure);

        let mut errors = Vec::new();
        if !document.errors.is_empty() {
            errors.extend(document.errors.iter().map(|e| e.to_string()));
        }

        ProcessedContent {
            source_url: base_url.to_string(),
            title: walked.title,
            markdown,
            structure: walked.structure,
            headings: walked.headings,
            assets: walked.assets,
            metadata: walked.metadata,
            links: walked.links,
            errors,
            format: Format::Html.name().to_string(),
        }
    }
}

impl Default for HtmlHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatHandler for HtmlHandler {
    fn name(&self) -> &'static str {
        "html"
    }

    fn can_handle(&self, format: Format) -> bool {
        matches!(format, Format::Html)
    }

    fn process(&self, content: &str, base_url: &str, quality: &QualityConfig, link_filter: &LinkFilter) -> ProcessedContent {
        HtmlHandler::process(self, content, base_url, quality, link_filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_processed_content_from_html() {
        let handler = HtmlHandler::new();
        let quality = QualityConfig::default();
        let content = "<html><head><title>Guide</title></head><body><h1>Guide</h1><p>Hello <a href=\"a.html\">link</a></p></body></html>";
        let pc = handler.process(content, "https://example.com/docs/", &quality, &LinkFilter::allow_all());
        assert_eq!(pc.title, "Guide");
        assert_eq!(pc.links.len(), 1);
        assert!(pc.markdown.contains("Guide"));
        assert!(pc.errors.is_empty());
    }

    #[test]
    fn rejects_content_below_minimum_length() {
        let handler = HtmlHandler::new();
        let mut quality = QualityConfig::default();
        quality.min_content_length = 1000;
        let pc = handler.process("<html><body>short</body></html>", "https://example.com/", &quality, &LinkFilter::allow_all());
        assert!(!pc.errors.is_empty());
    }

    #[test]
    fn link_filter_is_threaded_through_to_extraction() {
        let handler = HtmlHandler::new();
        let quality = QualityConfig::default();
        let content = r#"<html><body><p><a href="changelog/v2.html">Changelog</a></p></body></html>"#;
        let filter = LinkFilter::new(vec![regex::Regex::new("/changelog/").unwrap()], vec![]);
        let pc = handler.process(content, "https://example.com/docs/", &quality, &filter);
        assert_eq!(pc.links[0].href, "#");
    }
}
