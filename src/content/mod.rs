//! The Content Processor's data model and dispatch.

pub mod format;
pub mod html;
pub mod link_filter;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One heading in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingInfo {
    pub level: u8,
    pub text: String,
    pub id: Option<String>,
}

/// Inline content embedded in a paragraph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InlineNode {
    Text(String),
    Emphasis(String),
    Strong(String),
    Code(String),
    Link { href: String, text: String },
    Image { src: String, alt: String },
}

/// A node in the structured outline. Section-centric: sections nest their
/// child nodes rather than sitting in a flat heading-centric list, since
/// link extraction traverses this tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StructureNode {
    Heading(HeadingInfo),
    Paragraph(Vec<InlineNode>),
    List { ordered: bool, items: Vec<Vec<StructureNode>> },
    CodeBlock { language: Option<String>, code: String },
    Table { headers: Vec<String>, rows: Vec<Vec<String>> },
    Blockquote(Vec<StructureNode>),
    Section { heading: Option<HeadingInfo>, children: Vec<StructureNode> },
}

/// Every external resource referenced by a document, already resolved to
/// absolute URLs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetInventory {
    pub images: Vec<String>,
    pub stylesheets: Vec<String>,
    pub scripts: Vec<String>,
    pub media: Vec<String>,
}

/// One outbound link, already resolved to an absolute URL and populated
/// directly here rather than requiring the Quality Checker to walk the
/// structured tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLink {
    pub href: String,
    pub text: String,
}

/// The normalized output of processing one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessedContent {
    pub source_url: String,
    pub title: String,
    pub markdown: String,
    pub structure: Vec<StructureNode>,
    pub headings: Vec<HeadingInfo>,
    pub assets: AssetInventory,
    pub metadata: HashMap<String, String>,
    pub links: Vec<ResolvedLink>,
    pub errors: Vec<String>,
    pub format: String,
}

impl ProcessedContent {
    #[must_use]
    pub fn with_error(source_url: impl Into<String>, format: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            format: format.into(),
            errors: vec![error.into()],
            ..Default::default()
        }
    }
}
