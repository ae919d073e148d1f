//! Title, `<meta>`, JSON-LD, and microdata extraction (spec.md §4.6 step 5).

use std::collections::HashMap;

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

const DEFAULT_TITLE: &str = "Untitled Document";

/// `<title>` (closest to `<head>`), falling back to the first `<h1>`, then
/// [`DEFAULT_TITLE`].
pub(super) fn extract_title(document: &Html) -> String {
    let title_selector = Selector::parse("head title, title").expect("static selector");
    if let Some(el) = document.select(&title_selector).next() {
        let text = collapse(&el.text().collect::<String>());
        if !text.is_empty() {
            return text;
        }
    }
    let h1_selector = Selector::parse("h1").expect("static selector");
    if let Some(el) = document.select(&h1_selector).next() {
        let text = collapse(&el.text().collect::<String>());
        if !text.is_empty() {
            return text;
        }
    }
    DEFAULT_TITLE.to_string()
}

/// Every `<meta name|property>` with a `content` attribute, JSON-LD script
/// blocks, and microdata `itemprop` values, merged into one metadata bag.
/// On duplicate keys the first occurrence wins.
pub(super) fn extract_metadata(document: &Html) -> HashMap<String, String> {
    let mut meta = HashMap::new();
    extract_meta_tags(document, &mut meta);
    extract_json_ld(document, &mut meta);
    extract_microdata(document, &mut meta);
    meta
}

fn extract_meta_tags(document: &Html, out: &mut HashMap<String, String>) {
    let Ok(selector) = Selector::parse("meta[content]") else {
        return;
    };
    for element in document.select(&selector) {
        let Some(content) = element.value().attr("content") else {
            continue;
        };
        let key = element
            .value()
            .attr("name")
            .or_else(|| element.value().attr("property"));
        let Some(key) = key else { continue };
        let key = key.to_ascii_lowercase();
        out.entry(key).or_insert_with(|| strip_tags(content));
    }
}

/// Every `<script type="application/ld+json">` block: malformed JSON is
/// ignored silently. Top-level string/number/simple-object values are
/// flattened; when the block declares an `@type`, keys are prefixed with
/// the lowercased type (e.g. `article_headline`).
fn extract_json_ld(document: &Html, out: &mut HashMap<String, String>) {
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return;
    };
    for element in document.select(&selector) {
        let raw = element.text().collect::<String>();
        let Ok(value) = serde_json::from_str::<Value>(&raw) else {
            continue;
        };
        flatten_json_ld(&value, out);
    }
}

fn flatten_json_ld(value: &Value, out: &mut HashMap<String, String>) {
    let Value::Object(map) = value else { return };
    let prefix = map
        .get("@type")
        .and_then(Value::as_str)
        .map(|t| format!("{}_", to_snake(t)));

    for (key, v) in map {
        if key == "@type" || key == "@context" {
            continue;
        }
        let scalar = match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Object(_) => scalar_from_simple_object(v),
            _ => None,
        };
        if let Some(scalar) = scalar {
            let key = format!("{}{}", prefix.clone().unwrap_or_default(), to_snake(key));
            out.entry(key).or_insert(scalar);
        }
    }
}

/// A "simple object" (spec.md: "flatten... simple-object values") is one
/// whose own values are all scalars; render it as `key: value` pairs.
fn scalar_from_simple_object(value: &Value) -> Option<String> {
    let Value::Object(map) = value else { return None };
    if map.values().any(|v| v.is_object() || v.is_array()) {
        return None;
    }
    if let Some(name) = map.get("name").and_then(Value::as_str) {
        return Some(name.to_string());
    }
    None
}

fn to_snake(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

/// Every element with `itemtype` contributes its descendant `itemprop`
/// values, keyed by the property name (spec.md §4.6 step 5: microdata).
fn extract_microdata(document: &Html, out: &mut HashMap<String, String>) {
    let Ok(scope_selector) = Selector::parse("[itemtype]") else {
        return;
    };
    let Ok(prop_selector) = Selector::parse("[itemprop]") else {
        return;
    };
    for scope in document.select(&scope_selector) {
        for prop_el in scope.select(&prop_selector) {
            let Some(name) = prop_el.value().attr("itemprop") else {
                continue;
            };
            let value = microdata_value(prop_el);
            out.entry(name.to_ascii_lowercase()).or_insert(value);
        }
    }
}

fn microdata_value(el: ElementRef<'_>) -> String {
    el.value()
        .attr("content")
        .map(str::to_string)
        .unwrap_or_else(|| collapse(&el.text().collect::<String>()))
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    collapse(&out)
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_prefers_head_title() {
        let doc = Html::parse_document("<html><head><title>  Docs  </title></head><body><h1>Other</h1></body></html>");
        assert_eq!(extract_title(&doc), "Docs");
    }

    #[test]
    fn title_falls_back_to_h1() {
        let doc = Html::parse_document("<html><body><h1>Heading Title</h1></body></html>");
        assert_eq!(extract_title(&doc), "Heading Title");
    }

    #[test]
    fn title_falls_back_to_default() {
        let doc = Html::parse_document("<html><body><p>no title</p></body></html>");
        assert_eq!(extract_title(&doc), "Untitled Document");
    }

    #[test]
    fn meta_tags_are_lowercased_and_first_wins() {
        let doc = Html::parse_document(
            r#"<html><head><meta name="Description" content="first"><meta name="description" content="second"></head></html>"#,
        );
        let meta = extract_metadata(&doc);
        assert_eq!(meta.get("description"), Some(&"first".to_string()));
    }

    #[test]
    fn json_ld_is_flattened_with_type_prefix() {
        let doc = Html::parse_document(
            r#"<html><head><script type="application/ld+json">{"@type": "Article", "headline": "Hello"}</script></head></html>"#,
        );
        let meta = extract_metadata(&doc);
        assert_eq!(meta.get("article_headline"), Some(&"Hello".to_string()));
    }

    #[test]
    fn malformed_json_ld_is_ignored() {
        let doc = Html::parse_document(
            r#"<html><head><script type="application/ld+json">not json</script></head></html>"#,
        );
        let meta = extract_metadata(&doc);
        assert!(meta.is_empty());
    }

    #[test]
    fn microdata_itemprop_is_extracted() {
        let doc = Html::parse_document(
            r#"<html><body><div itemtype="https://schema.org/Person"><span itemprop="name">Ada</span></div></body></html>"#,
        );
        let meta = extract_metadata(&doc);
        assert_eq!(meta.get("name"), Some(&"Ada".to_string()));
    }
}
