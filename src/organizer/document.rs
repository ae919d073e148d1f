//! Document identity and versioning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::ProcessedContent;

/// Opaque document identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tracked facts about a document independent of any single version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub url: String,
    pub title: String,
    pub category: String,
    pub first_seen: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub tags: Vec<String>,
    pub attributes: std::collections::HashMap<String, String>,
}

impl DocumentMetadata {
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get_attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// One snapshot of a document's content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentVersion {
    pub sequence: u32,
    pub timestamp: DateTime<Utc>,
    pub content: ProcessedContent,
    pub change_summary: Option<String>,
}

/// A document is the set of all versions sharing a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub metadata: DocumentMetadata,
    pub versions: Vec<DocumentVersion>,
    pub related: std::collections::HashSet<DocumentId>,
}

impl Document {
    #[must_use]
    pub fn new(content: ProcessedContent, now: DateTime<Utc>) -> Self {
        let id = DocumentId::new();
        let metadata = DocumentMetadata {
            url: content.source_url.clone(),
            title: content.title.clone(),
            category: "uncategorized".to_string(),
            first_seen: now,
            last_updated: now,
            tags: Vec::new(),
            attributes: std::collections::HashMap::new(),
        };
        let version = DocumentVersion {
            sequence: 1,
            timestamp: now,
            content,
            change_summary: None,
        };
        Self {
            id,
            metadata,
            versions: vec![version],
            related: std::collections::HashSet::new(),
        }
    }

    /// Append a new version; the sequence number equals its 1-based
    /// position in the version list.
    pub fn add_version(&mut self, content: ProcessedContent, now: DateTime<Utc>, change_summary: Option<String>) {
        let sequence = self.versions.len() as u32 + 1;
        self.metadata.title = content.title.clone();
        self.metadata.last_updated = now;
        self.versions.push(DocumentVersion {
            sequence,
            timestamp: now,
            content,
            change_summary,
        });
    }

    #[must_use]
    pub fn latest(&self) -> &DocumentVersion {
        self.versions.last().expect("a document always has at least one version")
    }
}
