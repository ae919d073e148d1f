//! Format detection and the Format Handler registry, kept deliberately
//! separate from the HTML handler: HTML→Markdown conversion stays one
//! deterministic function, never mixed with DOM mutation or detection
//! logic.

mod fallback;
mod html;
mod markdown;
mod sniff;

pub use html::HtmlHandler;
pub use markdown::MarkdownHandler;

use crate::config::QualityConfig;
use crate::content::link_filter::LinkFilter;
use crate::content::ProcessedContent;

/// The detected content format, independent of which handler processes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Html,
    Markdown,
    Rst,
    AsciiDoc,
    Json,
    Xml,
    Yaml,
    PlainText,
}

impl Format {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Markdown => "markdown",
            Self::Rst => "rst",
            Self::AsciiDoc => "asciidoc",
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Yaml => "yaml",
            Self::PlainText => "plain_text",
        }
    }
}

/// A hook for an externally configured converter (e.g. Pandoc) for
/// formats whose handler would otherwise fall back to heading-pattern-only
/// extraction. Never implemented in-core.
pub trait ExternalConverter: Send + Sync {
    fn convert_to_html(&self, content: &str, format: Format) -> Option<String>;
}

/// Implements `can_handle`/`process`/name.
pub trait FormatHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn can_handle(&self, format: Format) -> bool;
    fn process(&self, content: &str, base_url: &str, quality: &QualityConfig, link_filter: &LinkFilter) -> ProcessedContent;
}

/// Detection order: explicit content-type argument, MIME from the
/// response header, filename extension, content sniffing.
pub struct FormatDetector;

impl FormatDetector {
    #[must_use]
    pub fn detect(
        explicit_content_type: Option<&str>,
        response_mime: Option<&str>,
        filename: Option<&str>,
        content: &str,
    ) -> Format {
        if let Some(ct) = explicit_content_type {
            if let Some(fmt) = Self::from_mime(ct) {
                return fmt;
            }
        }
        if let Some(mime) = response_mime {
            if let Some(fmt) = Self::from_mime(mime) {
                return fmt;
            }
        }
        if let Some(name) = filename {
            if let Some(fmt) = Self::from_extension(name) {
                return fmt;
            }
        }
        sniff::sniff(content)
    }

    fn from_mime(mime: &str) -> Option<Format> {
        let mime = mime.split(';').next().unwrap_or(mime).trim().to_ascii_lowercase();
        match mime.as_str() {
            "text/html" | "application/xhtml+xml" => Some(Format::Html),
            "text/markdown" | "text/x-markdown" => Some(Format::Markdown),
            "text/x-rst" => Some(Format::Rst),
            "text/asciidoc" | "text/x-asciidoc" => Some(Format::AsciiDoc),
            "application/json" => Some(Format::Json),
            "application/xml" | "text/xml" => Some(Format::Xml),
            "application/yaml" | "text/yaml" | "application/x-yaml" => Some(Format::Yaml),
            "text/plain" => Some(Format::PlainText),
            _ => None,
        }
    }

    fn from_extension(filename: &str) -> Option<Format> {
        let ext = filename.rsplit('.').next()?.to_ascii_lowercase();
        match ext.as_str() {
            "html" | "htm" | "xhtml" => Some(Format::Html),
            "md" | "markdown" => Some(Format::Markdown),
            "rst" => Some(Format::Rst),
            "adoc" | "asciidoc" => Some(Format::AsciiDoc),
            "json" => Some(Format::Json),
            "xml" => Some(Format::Xml),
            "yaml" | "yml" => Some(Format::Yaml),
            "txt" => Some(Format::PlainText),
            _ => None,
        }
    }
}

/// The registry of Format Handlers driving the Content Processor.
pub struct ContentProcessor {
    html: HtmlHandler,
    markdown: MarkdownHandler,
    rst: fallback::HeadingPatternHandler,
    asciidoc: fallback::HeadingPatternHandler,
}

impl ContentProcessor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            html: HtmlHandler::new(),
            markdown: MarkdownHandler::new(),
            rst: fallback::HeadingPatternHandler::rst(),
            asciidoc: fallback::HeadingPatternHandler::asciidoc(),
        }
    }

    /// Run format detection, then dispatch to the matching handler. Always
    /// returns a `ProcessedContent`; parse failures are recorded in
    /// `errors` rather than propagated.
    #[must_use]
    pub fn process(
        &self,
        content: &str,
        base_url: &str,
        explicit_content_type: Option<&str>,
        response_mime: Option<&str>,
        filename: Option<&str>,
        quality: &QualityConfig,
        link_filter: &LinkFilter,
    ) -> ProcessedContent {
        let format = FormatDetector::detect(explicit_content_type, response_mime, filename, content);
        match format {
            Format::Html => self.html.process(content, base_url, quality, link_filter),
            Format::Markdown => self.markdown.process(content, base_url, quality, link_filter),
            Format::Rst => self.rst.process(content, base_url, quality, link_filter),
            Format::AsciiDoc => self.asciidoc.process(content, base_url, quality, link_filter),
            other => {
                let mut pc = ProcessedContent::with_error(
                    base_url,
                    other.name(),
                    format!("no structured handler for format {}", other.name()),
                );
                pc.markdown = content.to_string();
                pc
            }
        }
    }
}

impl Default for ContentProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_content_type_wins_over_sniffing() {
        let fmt = FormatDetector::detect(Some("text/markdown"), None, None, "<html></html>");
        assert_eq!(fmt, Format::Markdown);
    }

    #[test]
    fn falls_back_to_extension_then_sniffing() {
        let fmt = FormatDetector::detect(None, None, Some("guide.rst"), "ignored");
        assert_eq!(fmt, Format::Rst);
    }

    #[test]
    fn sniffs_html_when_nothing_else_available() {
        let fmt = FormatDetector::detect(None, None, None, "<!DOCTYPE html><html><body>hi</body></html>");
        assert_eq!(fmt, Format::Html);
    }
}
