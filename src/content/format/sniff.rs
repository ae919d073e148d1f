//! Content sniffing: the last-resort format detector, used when no
//! content-type, MIME, or filename hint is available.

use once_cell::sync::Lazy;
use regex::Regex;

use super::Format;

static RST_UNDERLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[=\-~`:'\"^_*+#]{3,}\s*$").expect("static regex"));
static ASCIIDOC_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^={1,6}\s+\S").expect("static regex"));
static ATX_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s+\S").expect("static regex"));

pub(super) fn sniff(content: &str) -> Format {
    let trimmed = content.trim_start();

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
            return Format::Json;
        }
    }
    if trimmed.starts_with("<?xml") || (trimmed.starts_with('<') && !looks_like_html(trimmed)) {
        return Format::Xml;
    }
    if looks_like_html(trimmed) {
        return Format::Html;
    }
    if ASCIIDOC_HEADING.is_match(content) {
        return Format::AsciiDoc;
    }
    if RST_UNDERLINE.is_match(content) {
        return Format::Rst;
    }
    if ATX_HEADING.is_match(content) || content.contains("```") {
        return Format::Markdown;
    }
    Format::PlainText
}

fn looks_like_html(trimmed: &str) -> bool {
    let lowered = trimmed.to_ascii_lowercase();
    lowered.starts_with("<!doctype html") || lowered.starts_with("<html") || lowered.contains("<body")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_html_doctype() {
        assert_eq!(sniff("<!DOCTYPE html><html></html>"), Format::Html);
    }

    #[test]
    fn detects_markdown_fence() {
        assert_eq!(sniff("intro\n```rust\nfn main() {}\n```\n"), Format::Markdown);
    }

    #[test]
    fn detects_rst_underline() {
        assert_eq!(sniff("Title\n=====\n\nBody text."), Format::Rst);
    }

    #[test]
    fn detects_json() {
        assert_eq!(sniff(r#"{"key": "value"}"#), Format::Json);
    }

    #[test]
    fn falls_back_to_plain_text() {
        assert_eq!(sniff("just some words, nothing structured"), Format::PlainText);
    }
}
