//! The Document Organizer: identity, versioning, categorization, relation
//! discovery, and search over the crawled corpus. Writes (`add_document`,
//! `create_collection`) are serialized behind a `parking_lot::Mutex`; reads
//! (`search`) proceed against a `parking_lot::RwLock` snapshot.

pub mod collection;
pub mod document;
pub mod search;
mod text;

pub use collection::{Collection, CollectionId};
pub use document::{Document, DocumentId, DocumentMetadata, DocumentVersion};
pub use search::SearchResult;

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use parking_lot::{Mutex, RwLock};

use crate::config::OrganizationConfig;
use crate::content::ProcessedContent;
use crate::error::{OrganizerError, OrganizerResult};
use crate::url_info::URLInfo;

use search::SearchIndex;

/// Serializes every write (`add_document`, `create_collection`,
/// `add_to_collection`); reads (`search`, `get_related_documents`) take a
/// read lock on the same structure and can proceed concurrently with each
/// other, briefly blocking behind an in-flight write.
pub struct DocumentOrganizer {
    config: OrganizationConfig,
    state: RwLock<State>,
    write_lock: Mutex<()>,
}

#[derive(Default)]
struct State {
    documents: HashMap<DocumentId, Document>,
    url_index: HashMap<String, DocumentId>,
    search_index: SearchIndex,
    collections: HashMap<CollectionId, Collection>,
}

impl DocumentOrganizer {
    #[must_use]
    pub fn new(config: OrganizationConfig) -> Self {
        Self {
            config,
            state: RwLock::new(State::default()),
            write_lock: Mutex::new(()),
        }
    }

    /// Add `content` to the organizer. A document is identified by its
    /// normalized URL: re-adding content for a known URL appends a
    /// version; a different URL always creates a new document.
    pub fn add_document(&self, content: ProcessedContent) -> DocumentId {
        let _guard = self.write_lock.lock();
        let normalized = URLInfo::parse_standalone(&content.source_url).normalized().to_string();
        let now = Utc::now();

        let mut state = self.state.write();
        let doc_id = if let Some(&existing) = state.url_index.get(&normalized) {
            let doc = state.documents.get_mut(&existing).expect("url_index is kept in sync with documents");
            doc.add_version(content, now, None);
            existing
        } else {
            let doc = Document::new(content, now);
            let id = doc.id;
            state.url_index.insert(normalized, id);
            state.documents.insert(id, doc);
            id
        };

        let category = self.determine_category(&state.documents[&doc_id]);
        state
            .documents
            .get_mut(&doc_id)
            .expect("just inserted or updated above")
            .metadata
            .category = category;

        let terms = self.extract_index_terms(&state.documents[&doc_id]);
        state.search_index.index_document(doc_id, &terms);

        self.update_related_documents(&mut state, doc_id);

        doc_id
    }

    fn determine_category(&self, document: &Document) -> String {
        if self.config.category_rules.is_empty() {
            return "uncategorized".to_string();
        }
        let title = document.metadata.title.to_lowercase();
        let text = document.latest().content.markdown.to_lowercase();
        let haystack = format!("{title} {text}");

        for (category, keywords) in &self.config.category_rules {
            if keywords.iter().any(|kw| haystack.contains(&kw.to_lowercase())) {
                return category.clone();
            }
        }
        "uncategorized".to_string()
    }

    fn extract_index_terms(&self, document: &Document) -> Vec<String> {
        let stop_words: HashSet<String> = self.config.stop_words.iter().cloned().collect();
        let mut terms: HashSet<String> = text::extract_terms(&document.metadata.title, &stop_words).into_iter().collect();
        terms.extend(text::extract_terms(&document.latest().content.markdown, &stop_words));
        for heading in &document.latest().content.headings {
            terms.extend(text::extract_terms(&heading.text, &stop_words));
        }
        terms.into_iter().collect()
    }

    /// O(n) per add: compare the new document's token set against every
    /// other indexed document by Jaccard similarity, linking pairs scoring
    /// at or above `min_similarity_score` symmetrically.
    fn update_related_documents(&self, state: &mut State, doc_id: DocumentId) {
        let Some(doc_terms) = state.search_index.tokens_for(&doc_id).cloned() else {
            return;
        };
        if doc_terms.is_empty() {
            return;
        }

        let mut newly_related = Vec::new();
        for (other_id, other_terms) in state.search_index.all_token_sets() {
            if *other_id == doc_id || other_terms.is_empty() {
                continue;
            }
            let score = text::jaccard_similarity(&doc_terms, other_terms);
            if score >= self.config.min_similarity_score {
                newly_related.push(*other_id);
            }
        }

        for other_id in newly_related {
            if let Some(doc) = state.documents.get_mut(&doc_id) {
                doc.related.insert(other_id);
            }
            if let Some(other) = state.documents.get_mut(&other_id) {
                other.related.insert(doc_id);
            }
        }
    }

    #[must_use]
    pub fn get_related_documents(&self, doc_id: DocumentId) -> Vec<Document> {
        let state = self.state.read();
        let Some(doc) = state.documents.get(&doc_id) else {
            return Vec::new();
        };
        doc.related.iter().filter_map(|id| state.documents.get(id).cloned()).collect()
    }

    #[must_use]
    pub fn get_document(&self, doc_id: DocumentId) -> Option<Document> {
        self.state.read().documents.get(&doc_id).cloned()
    }

    #[must_use]
    pub fn find_by_url(&self, url: &str) -> Option<Document> {
        let normalized = URLInfo::parse_standalone(url).normalized().to_string();
        let state = self.state.read();
        let id = state.url_index.get(&normalized)?;
        state.documents.get(id).cloned()
    }

    #[must_use]
    pub fn document_count(&self) -> usize {
        self.state.read().documents.len()
    }

    #[must_use]
    pub fn search(&self, query: &str, category: Option<&str>) -> Vec<SearchResult> {
        let state = self.state.read();
        let stop_words: HashSet<String> = self.config.stop_words.iter().cloned().collect();
        search::search(query, &state.documents, &state.search_index, category, &self.config.category_rules, &stop_words)
    }

    pub fn create_collection(&self, name: impl Into<String>, description: impl Into<String>, document_ids: Vec<DocumentId>) -> CollectionId {
        let _guard = self.write_lock.lock();
        let mut state = self.state.write();
        let valid_ids: Vec<DocumentId> = document_ids.into_iter().filter(|id| state.documents.contains_key(id)).collect();
        let now = Utc::now();
        let id = CollectionId::new();
        state.collections.insert(
            id,
            Collection {
                id,
                name: name.into(),
                description: description.into(),
                document_ids: valid_ids,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    pub fn add_to_collection(&self, collection_id: CollectionId, doc_id: DocumentId) -> OrganizerResult<()> {
        let _guard = self.write_lock.lock();
        let mut state = self.state.write();
        if !state.documents.contains_key(&doc_id) {
            return Err(OrganizerError::NotFound(doc_id.to_string()));
        }
        let now = Utc::now();
        let collection = state
            .collections
            .get_mut(&collection_id)
            .ok_or_else(|| OrganizerError::CollectionNotFound(collection_id.0.to_string()))?;
        if !collection.document_ids.contains(&doc_id) {
            collection.document_ids.push(doc_id);
        }
        collection.updated_at = now;
        Ok(())
    }

    #[must_use]
    pub fn collection(&self, collection_id: CollectionId) -> Option<Collection> {
        self.state.read().collections.get(&collection_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(url: &str, title: &str, markdown: &str) -> ProcessedContent {
        ProcessedContent {
            source_url: url.to_string(),
            title: title.to_string(),
            markdown: markdown.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn adding_same_url_twice_appends_a_version() {
        let organizer = DocumentOrganizer::new(OrganizationConfig::default());
        let id1 = organizer.add_document(content("https://example.com/a", "A", "first"));
        let id2 = organizer.add_document(content("https://example.com/a", "A", "second"));
        assert_eq!(id1, id2);
        let doc = organizer.get_document(id1).unwrap();
        assert_eq!(doc.versions.len(), 2);
    }

    #[test]
    fn different_url_creates_a_new_document() {
        let organizer = DocumentOrganizer::new(OrganizationConfig::default());
        let id1 = organizer.add_document(content("https://example.com/a", "A", "text"));
        let id2 = organizer.add_document(content("https://example.com/b", "B", "text"));
        assert_ne!(id1, id2);
        assert_eq!(organizer.document_count(), 2);
    }

    #[test]
    fn category_rule_assigns_matching_documents() {
        let mut config = OrganizationConfig::default();
        config.category_rules.insert("api".to_string(), vec!["endpoint".to_string()]);
        let organizer = DocumentOrganizer::new(config);
        let id = organizer.add_document(content("https://example.com/a", "A", "see the endpoint list"));
        let doc = organizer.get_document(id).unwrap();
        assert_eq!(doc.metadata.category, "api");
    }

    #[test]
    fn unmatched_document_is_uncategorized() {
        let mut config = OrganizationConfig::default();
        config.category_rules.insert("api".to_string(), vec!["endpoint".to_string()]);
        let organizer = DocumentOrganizer::new(config);
        let id = organizer.add_document(content("https://example.com/a", "A", "nothing relevant"));
        let doc = organizer.get_document(id).unwrap();
        assert_eq!(doc.metadata.category, "uncategorized");
    }

    #[test]
    fn similar_documents_become_related() {
        let mut config = OrganizationConfig::default();
        config.min_similarity_score = 0.3;
        config.stop_words = Vec::new();
        let organizer = DocumentOrganizer::new(config);
        let id1 = organizer.add_document(content("https://example.com/a", "A", "rust async tokio runtime"));
        let id2 = organizer.add_document(content("https://example.com/b", "B", "rust async tokio scheduler"));
        let related = organizer.get_related_documents(id1);
        assert!(related.iter().any(|d| d.id == id2));
    }

    #[test]
    fn create_collection_filters_invalid_ids() {
        let organizer = DocumentOrganizer::new(OrganizationConfig::default());
        let id = organizer.add_document(content("https://example.com/a", "A", "text"));
        let bogus = DocumentId::new();
        let collection_id = organizer.create_collection("favorites", "desc", vec![id, bogus]);
        let collection = organizer.collection(collection_id).unwrap();
        assert_eq!(collection.document_ids, vec![id]);
    }

    #[test]
    fn search_end_to_end_scenario() {
        let organizer = DocumentOrganizer::new(OrganizationConfig::default());
        organizer.add_document(content("https://example.com/api", "API Reference", "contains endpoint details"));
        organizer.add_document(content("https://example.com/guide", "User Guide", "a tutorial walkthrough"));
        organizer.add_document(content("https://example.com/examples", "Examples", "a sample snippet"));

        let results = organizer.search("endpoint", None);
        assert_eq!(results.len(), 1);
        assert!(results[0].reasons.iter().any(|r| r.contains("endpoint")));
    }
}
