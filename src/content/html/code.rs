//! Code-block extraction (spec.md §4.6 step 10).
//!
//! Grounded on the teacher's language-detection idiom in
//! `content_saver/markdown_converter/custom_handlers/language_inference.rs`
//! (`extract_language_from_class` matching `language-X`/`lang-X` class
//! prefixes), narrowed to the two prefixes spec.md names.

use ego_tree::NodeRef;
use scraper::Node as ScraperNode;

use crate::config::QualityConfig;
use crate::content::StructureNode;

/// Extract a `<pre><code>` pair into a `StructureNode::CodeBlock`, or
/// `None` if `node` isn't a `<pre>` wrapping a `<code>` element.
pub(super) fn code_block(node: NodeRef<'_, ScraperNode>, quality: &QualityConfig) -> Option<StructureNode> {
    let code_el = node.children().find(|c| matches!(c.value(), ScraperNode::Element(el) if el.name() == "code"))?;
    let ScraperNode::Element(el) = code_el.value() else {
        return None;
    };

    let language = el
        .attr("class")
        .and_then(extract_language_from_class)
        .filter(|lang| quality.allowed_code_languages.is_empty() || quality.allowed_code_languages.iter().any(|a| a.eq_ignore_ascii_case(lang)));

    let raw = raw_text(code_el);
    let code = dedent(&raw);

    Some(StructureNode::CodeBlock { language, code })
}

/// `class="language-rust"` or `class="lang-rust"` (first match wins).
fn extract_language_from_class(class: &str) -> Option<String> {
    class.split_whitespace().find_map(|part| {
        part.strip_prefix("language-")
            .or_else(|| part.strip_prefix("lang-"))
            .map(str::to_string)
    })
}

fn raw_text(node: NodeRef<'_, ScraperNode>) -> String {
    let mut out = String::new();
    for descendant in node.descendants() {
        if let ScraperNode::Text(t) = descendant.value() {
            out.push_str(t);
        }
    }
    out
}

/// Strip the uniform leading indentation shared by every non-blank line.
fn dedent(raw: &str) -> String {
    let trimmed = raw.trim_matches('\n');
    let min_indent = trimmed
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);

    if min_indent == 0 {
        return trimmed.to_string();
    }
    trimmed
        .lines()
        .map(|l| if l.len() >= min_indent { &l[min_indent..] } else { l.trim_start_matches(' ') })
        .collect::<Vec<_>>()
        .join("\n")
}
