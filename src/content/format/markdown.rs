//! The Markdown format handler: converts to HTML, then delegates to the
//! HTML handler for structure and asset extraction.

use pulldown_cmark::{html, Options, Parser};

use crate::config::QualityConfig;
use crate::content::link_filter::LinkFilter;
use crate::content::ProcessedContent;

use super::html::HtmlHandler;
use super::{Format, FormatHandler};

pub struct MarkdownHandler {
    html: HtmlHandler,
}

impl MarkdownHandler {
    #[must_use]
    pub fn new() -> Self {
        Self { html: HtmlHandler::new() }
    }
}

impl Default for MarkdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatHandler for MarkdownHandler {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn can_handle(&self, format: Format) -> bool {
        matches!(format, Format::Markdown)
    }

    fn process(&self, content: &str, base_url: &str, quality: &QualityConfig, link_filter: &LinkFilter) -> ProcessedContent {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_FOOTNOTES);

        let parser = Parser::new_ext(content, options);
        let mut rendered_html = String::new();
        html::push_html(&mut rendered_html, parser);

        let mut pc = self.html.process(&rendered_html, base_url, quality, link_filter);
        pc.format = Format::Markdown.name().to_string();
        pc
    }
}
