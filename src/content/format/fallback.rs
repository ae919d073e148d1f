//! The reStructuredText / AsciiDoc fallback handler.
//!
//! When an [`ExternalConverter`] is configured it is tried first and, on
//! success, the result is handed to the HTML handler like any other
//! converted format. Absent that (the common case — no external tool is
//! ever implemented in-core), this module recognizes only the heading
//! syntax of each format and treats everything else as plain paragraph
//! text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::QualityConfig;
use crate::content::link_filter::LinkFilter;
use crate::content::{HeadingInfo, ProcessedContent, StructureNode};

use super::html::HtmlHandler;
use super::{ExternalConverter, Format, FormatHandler};

static ASCIIDOC_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(={1,6})\s+(\S.*)$").expect("static regex"));
static RST_UNDERLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([=\-~`:'\"^_*+#])\1{2,}\s*$").expect("static regex"));

pub struct HeadingPatternHandler {
    format: Format,
    external: Option<Box<dyn ExternalConverter>>,
}

impl HeadingPatternHandler {
    #[must_use]
    pub fn rst() -> Self {
        Self { format: Format::Rst, external: None }
    }

    #[must_use]
    pub fn asciidoc() -> Self {
        Self { format: Format::AsciiDoc, external: None }
    }

    #[must_use]
    pub fn with_external(mut self, converter: Box<dyn ExternalConverter>) -> Self {
        self.external = Some(converter);
        self
    }

    pub(super) fn process(&self, content: &str, base_url: &str, quality: &QualityConfig, link_filter: &LinkFilter) -> ProcessedContent {
        if let Some(converter) = &self.external {
            if let Some(html) = converter.convert_to_html(content, self.format) {
                let handler = HtmlHandler::new();
                let mut pc = handler.process(&html, base_url, quality, link_filter);
                pc.format = self.format.name().to_string();
                return pc;
            }
        }

        let (structure, headings) = match self.format {
            Format::Rst => extract_rst(content),
            Format::AsciiDoc => extract_asciidoc(content),
            _ => (Vec::new(), Vec::new()),
        };

        let title = headings.first().map(|h: &HeadingInfo| h.text.clone()).unwrap_or_else(|| "Untitled Document".to_string());
        let markdown = crate::content::html::markdown_emit::render(&structure);

        ProcessedContent {
            source_url: base_url.to_string(),
            title,
            markdown,
            structure,
            headings,
            format: self.format.name().to_string(),
            ..Default::default()
        }
    }
}

impl FormatHandler for HeadingPatternHandler {
    fn name(&self) -> &'static str {
        self.format.name()
    }

    fn can_handle(&self, format: Format) -> bool {
        format == self.format
    }

    fn process(&self, content: &str, base_url: &str, quality: &QualityConfig, link_filter: &LinkFilter) -> ProcessedContent {
        HeadingPatternHandler::process(self, content, base_url, quality, link_filter)
    }
}

fn extract_asciidoc(content: &str) -> (Vec<StructureNode>, Vec<HeadingInfo>) {
    let mut structure = Vec::new();
    let mut headings = Vec::new();
    let mut paragraph = String::new();

    for line in content.lines() {
        if let Some(caps) = ASCIIDOC_HEADING.captures(line) {
            flush_paragraph(&mut paragraph, &mut structure);
            let level = caps[1].len() as u8;
            let heading = HeadingInfo { level, text: caps[2].trim().to_string(), id: None };
            headings.push(heading.clone());
            structure.push(StructureNode::Heading(heading));
        } else if line.trim().is_empty() {
            flush_paragraph(&mut paragraph, &mut structure);
        } else {
            if !paragraph.is_empty() {
                paragraph.push(' ');
            }
            paragraph.push_str(line.trim());
        }
    }
    flush_paragraph(&mut paragraph, &mut structure);
    (structure, headings)
}

/// RST titles are underlined (and optionally overlined) by a repeated
/// punctuation character; the level is assigned by the order in which
/// distinct underline characters are first encountered (the common
/// docutils convention, simplified — no overline-vs-underline distinction).
fn extract_rst(content: &str) -> (Vec<StructureNode>, Vec<HeadingInfo>) {
    let lines: Vec<&str> = content.lines().collect();
    let mut structure = Vec::new();
    let mut headings = Vec::new();
    let mut paragraph = String::new();
    let mut level_order: Vec<char> = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let title = line.trim();
        let next = lines.get(i + 1).copied().unwrap_or("");
        if !title.is_empty() {
            if let Some(caps) = RST_UNDERLINE.captures(next) {
                if next.trim().len() >= title.len() {
                    flush_paragraph(&mut paragraph, &mut structure);
                    let marker = caps[1].chars().next().expect("regex guarantees one char");
                    if !level_order.contains(&marker) {
                        level_order.push(marker);
                    }
                    let level = (level_order.iter().position(|c| *c == marker).unwrap_or(0) + 1).min(6) as u8;
                    let heading = HeadingInfo { level, text: title.to_string(), id: None };
                    headings.push(heading.clone());
                    structure.push(StructureNode::Heading(heading));
                    i += 2;
                    continue;
                }
            }
        }
        if title.is_empty() {
            flush_paragraph(&mut paragraph, &mut structure);
        } else {
            if !paragraph.is_empty() {
                paragraph.push(' ');
            }
            paragraph.push_str(title);
        }
        i += 1;
    }
    flush_paragraph(&mut paragraph, &mut structure);
    (structure, headings)
}

fn flush_paragraph(paragraph: &mut String, structure: &mut Vec<StructureNode>) {
    if !paragraph.is_empty() {
        structure.push(StructureNode::Paragraph(vec![crate::content::InlineNode::Text(paragraph.clone())]));
        paragraph.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_asciidoc_headings() {
        let (_, headings) = extract_asciidoc("= Title\n\nIntro text.\n\n== Section\n\nMore text.\n");
        assert_eq!(headings.len(), 2);
        assert_eq!(headings[0].level, 1);
        assert_eq!(headings[1].level, 2);
    }

    #[test]
    fn extracts_rst_underlined_title() {
        let (_, headings) = extract_rst("Title\n=====\n\nBody text here.\n\nSub\n---\n\nMore.\n");
        assert_eq!(headings.len(), 2);
        assert_eq!(headings[0].text, "Title");
        assert_eq!(headings[0].level, 1);
        assert_eq!(headings[1].level, 2);
    }

    #[test]
    fn process_produces_markdown_with_atx_headings() {
        let handler = HeadingPatternHandler::asciidoc();
        let quality = QualityConfig::default();
        let pc = handler.process("= Title\n\nHello world.\n", "https://example.com/", &quality, &LinkFilter::allow_all());
        assert!(pc.markdown.starts_with("# Title"));
        assert_eq!(pc.title, "Title");
    }
}
