//! Evaluates a [`ProcessedContent`] against a [`QualityConfig`] and produces
//! a list of findings plus a metrics map. Reads the flat `links` list
//! already populated on `ProcessedContent` rather than walking the
//! structure tree itself.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::QualityConfig;
use crate::content::{ProcessedContent, StructureNode};

/// The closed set of finding categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    ContentLength,
    HeadingStructure,
    LinkCount,
    CodeBlockLength,
    Metadata,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One finding from the Quality Checker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityIssue {
    pub issue_type: IssueType,
    pub severity: Severity,
    pub message: String,
    pub location: Option<String>,
    pub detail: HashMap<String, String>,
}

impl QualityIssue {
    fn new(issue_type: IssueType, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            issue_type,
            severity,
            message: message.into(),
            location: Some("body".to_string()),
            detail: HashMap::new(),
        }
    }

    /// A general-category error finding, used by the Crawl Engine to record
    /// fetch/resolution failures alongside the Quality Checker's own
    /// findings.
    #[must_use]
    pub fn general_error(message: impl Into<String>) -> Self {
        let mut issue = Self::new(IssueType::General, Severity::Error, message);
        issue.location = None;
        issue
    }
}

/// Checks `content` against `config`, returning every finding plus a
/// metrics map (content_length, heading_count, internal_link_count,
/// code_block_count).
#[must_use]
pub fn check_quality(content: &ProcessedContent, config: &QualityConfig) -> (Vec<QualityIssue>, HashMap<String, u64>) {
    let mut issues = Vec::new();
    let mut metrics = HashMap::new();

    check_content_length(content, config, &mut issues, &mut metrics);
    check_headings(content, config, &mut issues, &mut metrics);
    check_internal_links(content, config, &mut issues, &mut metrics);
    check_code_blocks(content, config, &mut issues, &mut metrics);
    check_required_metadata(content, config, &mut issues);

    (issues, metrics)
}

fn check_content_length(
    content: &ProcessedContent,
    config: &QualityConfig,
    issues: &mut Vec<QualityIssue>,
    metrics: &mut HashMap<String, u64>,
) {
    let length = content.markdown.len();
    metrics.insert("content_length".to_string(), length as u64);

    if length < config.min_content_length {
        issues.push(QualityIssue::new(
            IssueType::ContentLength,
            Severity::Error,
            format!("content length ({length}) is below minimum ({})", config.min_content_length),
        ));
    } else if length > config.max_content_length {
        issues.push(QualityIssue::new(
            IssueType::ContentLength,
            Severity::Warning,
            format!("content length ({length}) exceeds maximum ({})", config.max_content_length),
        ));
    }
}

fn check_headings(
    content: &ProcessedContent,
    config: &QualityConfig,
    issues: &mut Vec<QualityIssue>,
    metrics: &mut HashMap<String, u64>,
) {
    metrics.insert("heading_count".to_string(), content.headings.len() as u64);

    if content.headings.len() < config.min_headings {
        issues.push(QualityIssue::new(
            IssueType::HeadingStructure,
            Severity::Error,
            format!("too few headings ({}), minimum is {}", content.headings.len(), config.min_headings),
        ));
    }
    for heading in &content.headings {
        if heading.level > config.max_heading_level {
            issues.push(QualityIssue::new(
                IssueType::HeadingStructure,
                Severity::Warning,
                format!("heading level {} exceeds maximum {}", heading.level, config.max_heading_level),
            ));
        }
    }
}

fn check_internal_links(
    content: &ProcessedContent,
    config: &QualityConfig,
    issues: &mut Vec<QualityIssue>,
    metrics: &mut HashMap<String, u64>,
) {
    let internal = content
        .links
        .iter()
        .filter(|link| is_internal_link(&link.href, &content.source_url))
        .count();
    metrics.insert("internal_link_count".to_string(), internal as u64);

    if internal < config.min_internal_links {
        issues.push(QualityIssue::new(
            IssueType::LinkCount,
            Severity::Warning,
            format!("too few internal links ({internal}), minimum is {}", config.min_internal_links),
        ));
    }
}

fn is_internal_link(href: &str, source_url: &str) -> bool {
    match (url::Url::parse(href), url::Url::parse(source_url)) {
        (Ok(a), Ok(b)) => a.host_str() == b.host_str(),
        _ => false,
    }
}

fn check_code_blocks(
    content: &ProcessedContent,
    config: &QualityConfig,
    issues: &mut Vec<QualityIssue>,
    metrics: &mut HashMap<String, u64>,
) {
    let code_blocks = collect_code_blocks(&content.structure);
    metrics.insert("code_block_count".to_string(), code_blocks.len() as u64);

    for code in code_blocks {
        let len = code.len();
        if len < config.min_code_block_length {
            issues.push(QualityIssue::new(
                IssueType::CodeBlockLength,
                Severity::Warning,
                format!("code block too short ({len} chars), minimum is {}", config.min_code_block_length),
            ));
        } else if len > config.max_code_block_length {
            issues.push(QualityIssue::new(
                IssueType::CodeBlockLength,
                Severity::Warning,
                format!("code block too long ({len} chars), maximum is {}", config.max_code_block_length),
            ));
        }
    }
}

fn collect_code_blocks(structure: &[StructureNode]) -> Vec<String> {
    let mut out = Vec::new();
    for node in structure {
        match node {
            StructureNode::CodeBlock { code, .. } => out.push(code.clone()),
            StructureNode::Section { children, .. } => out.extend(collect_code_blocks(children)),
            StructureNode::Blockquote(children) => out.extend(collect_code_blocks(children)),
            StructureNode::List { items, .. } => {
                for item in items {
                    out.extend(collect_code_blocks(item));
                }
            }
            _ => {}
        }
    }
    out
}

fn check_required_metadata(content: &ProcessedContent, config: &QualityConfig, issues: &mut Vec<QualityIssue>) {
    for field in &config.required_metadata {
        if !content.metadata.contains_key(field) {
            issues.push(QualityIssue::new(
                IssueType::Metadata,
                Severity::Error,
                format!("missing required metadata field: {field}"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::HeadingInfo;

    fn content_with_markdown(markdown: &str) -> ProcessedContent {
        ProcessedContent {
            source_url: "https://example.com/docs".to_string(),
            markdown: markdown.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn short_content_is_an_error() {
        let mut config = QualityConfig::default();
        config.min_content_length = 100;
        let content = content_with_markdown(&"x".repeat(10));
        let (issues, _) = check_quality(&content, &config);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::ContentLength);
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn too_few_headings_is_an_error() {
        let mut config = QualityConfig::default();
        config.min_headings = 2;
        let content = content_with_markdown("hello world");
        let (issues, metrics) = check_quality(&content, &config);
        assert!(issues.iter().any(|i| i.issue_type == IssueType::HeadingStructure));
        assert_eq!(metrics["heading_count"], 0);
    }

    #[test]
    fn heading_deeper_than_max_is_a_warning() {
        let config = QualityConfig::default();
        let mut content = content_with_markdown("hello world");
        content.headings.push(HeadingInfo { level: 7, text: "deep".to_string(), id: None });
        let (issues, _) = check_quality(&content, &config);
        assert!(issues
            .iter()
            .any(|i| i.issue_type == IssueType::HeadingStructure && i.severity == Severity::Warning));
    }

    #[test]
    fn missing_required_metadata_is_an_error() {
        let mut config = QualityConfig::default();
        config.required_metadata = vec!["description".to_string()];
        let content = content_with_markdown("hello world");
        let (issues, _) = check_quality(&content, &config);
        assert!(issues.iter().any(|i| i.issue_type == IssueType::Metadata));
    }

    #[test]
    fn metrics_always_emitted() {
        let config = QualityConfig::default();
        let content = content_with_markdown("hello world");
        let (_, metrics) = check_quality(&content, &config);
        assert!(metrics.contains_key("content_length"));
        assert!(metrics.contains_key("heading_count"));
        assert!(metrics.contains_key("internal_link_count"));
        assert!(metrics.contains_key("code_block_count"));
    }
}
