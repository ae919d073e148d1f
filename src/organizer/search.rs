//! The inverted-index search engine: title/text/index match scoring with
//! per-match reason strings, plus a category filter and a "matched a
//! category-rule keyword without a direct token match" fallback pass.
//! Tag matching checks the document's own `tags` field rather than a
//! hardcoded keyword list, so it generalizes across corpora.

use std::collections::{HashMap, HashSet};

use super::document::{Document, DocumentId};

/// Inverted map from token to the set of documents containing it, plus
/// each document's own token set for similarity computation.
#[derive(Debug, Default)]
pub struct SearchIndex {
    inverted: HashMap<String, HashSet<DocumentId>>,
    doc_tokens: HashMap<DocumentId, HashSet<String>>,
}

impl SearchIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index_document(&mut self, id: DocumentId, terms: &[String]) {
        let token_set: HashSet<String> = terms.iter().cloned().collect();
        for token in &token_set {
            self.inverted.entry(token.clone()).or_default().insert(id);
        }
        self.doc_tokens.insert(id, token_set);
    }

    #[must_use]
    pub fn tokens_for(&self, id: &DocumentId) -> Option<&HashSet<String>> {
        self.doc_tokens.get(id)
    }

    #[must_use]
    pub fn document_ids_with_token(&self, token: &str) -> Option<&HashSet<DocumentId>> {
        self.inverted.get(token)
    }

    #[must_use]
    pub fn all_token_sets(&self) -> impl Iterator<Item = (&DocumentId, &HashSet<String>)> {
        self.doc_tokens.iter()
    }
}

/// One search hit: a document id, its score, and the reasons it matched.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub doc_id: DocumentId,
    pub score: f64,
    pub reasons: Vec<String>,
}

/// Run a search over `documents`, scored against `index`. When `category`
/// is given, only documents whose assigned category matches (or whose
/// title/tags/content mention it) are returned. Without a category filter,
/// any query token that names a configured category keyword additionally
/// pulls in that category's other documents at a lower synthetic score.
#[must_use]
pub fn search(
    query: &str,
    documents: &HashMap<DocumentId, Document>,
    index: &SearchIndex,
    category: Option<&str>,
    category_rules: &HashMap<String, Vec<String>>,
    stop_words: &HashSet<String>,
) -> Vec<SearchResult> {
    let query_terms: HashSet<String> = super::text::extract_terms(query, stop_words).into_iter().collect();

    let mut scored: HashMap<DocumentId, (f64, Vec<String>)> = HashMap::new();
    for (doc_id, doc) in documents {
        let title_tokens: HashSet<String> = super::text::tokenize(&doc.metadata.title).into_iter().collect();
        let text_tokens: HashSet<String> = super::text::tokenize(&doc.latest().content.markdown).into_iter().collect();
        let tags_lower: HashSet<String> = doc.metadata.tags.iter().map(|t| t.to_lowercase()).collect();

        for term in &query_terms {
            if title_tokens.contains(term) {
                bump(&mut scored, *doc_id, 1.0, format!("title match: {term}"));
            }
            if text_tokens.contains(term) {
                bump(&mut scored, *doc_id, 1.0, format!("text match: {term}"));
            }
            if index.document_ids_with_token(term).is_some_and(|ids| ids.contains(doc_id)) {
                bump(&mut scored, *doc_id, 1.0, format!("index match: {term}"));
            }
            if tags_lower.contains(term) {
                bump(&mut scored, *doc_id, 1.0, format!("tag match: {term}"));
            }
        }
    }

    let mut results: Vec<SearchResult> = scored
        .into_iter()
        .map(|(doc_id, (score, reasons))| SearchResult { doc_id, score, reasons })
        .collect();

    if let Some(category) = category {
        results.retain(|r| {
            documents
                .get(&r.doc_id)
                .is_some_and(|doc| document_matches_category(doc, category))
        });
    } else {
        add_category_keyword_matches(query, &query_terms, documents, category_rules, &mut results);
    }

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results
}

fn bump(scored: &mut HashMap<DocumentId, (f64, Vec<String>)>, doc_id: DocumentId, delta: f64, reason: String) {
    let entry = scored.entry(doc_id).or_insert((0.0, Vec::new()));
    entry.0 += delta;
    entry.1.push(reason);
}

fn document_matches_category(doc: &Document, category: &str) -> bool {
    let category_lower = category.to_lowercase();
    doc.metadata.category.eq_ignore_ascii_case(&category_lower)
        || doc.metadata.tags.iter().any(|t| t.eq_ignore_ascii_case(&category_lower))
        || doc.metadata.title.to_lowercase().contains(&category_lower)
        || doc.latest().content.markdown.to_lowercase().contains(&category_lower)
}

/// When the query contains a token matching a category-rule keyword,
/// documents in that category with no direct token match are added with a
/// lower synthetic score.
fn add_category_keyword_matches(
    query: &str,
    query_terms: &HashSet<String>,
    documents: &HashMap<DocumentId, Document>,
    category_rules: &HashMap<String, Vec<String>>,
    results: &mut Vec<SearchResult>,
) {
    let query_lower = query.to_lowercase();
    let mut matched_categories = HashSet::new();
    for (category, keywords) in category_rules {
        for keyword in keywords {
            let keyword_lower = keyword.to_lowercase();
            if query_lower.contains(&keyword_lower) || query_terms.iter().any(|t| t == &keyword_lower || t.contains(&keyword_lower)) {
                matched_categories.insert(category.clone());
            }
        }
    }
    if matched_categories.is_empty() {
        return;
    }

    let already_present: HashSet<DocumentId> = results.iter().map(|r| r.doc_id).collect();
    for (doc_id, doc) in documents {
        if already_present.contains(doc_id) {
            continue;
        }
        for category in &matched_categories {
            if document_matches_category(doc, category) {
                results.push(SearchResult {
                    doc_id: *doc_id,
                    score: 0.9,
                    reasons: vec![format!("matched category: {category}")],
                });
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ProcessedContent;
    use chrono::Utc;

    fn doc_with(title: &str, markdown: &str) -> Document {
        let content = ProcessedContent {
            source_url: format!("https://example.com/{title}"),
            title: title.to_string(),
            markdown: markdown.to_string(),
            ..Default::default()
        };
        Document::new(content, Utc::now())
    }

    #[test]
    fn finds_document_by_title_token() {
        let doc = doc_with("API Reference", "contains endpoint details");
        let mut documents = HashMap::new();
        let index = SearchIndex::new();
        documents.insert(doc.id, doc.clone());

        let results = search("endpoint", &documents, &index, None, &HashMap::new(), &HashSet::new());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].doc_id, doc.id);
        assert!(results[0].reasons.iter().any(|r| r.contains("endpoint")));
    }

    #[test]
    fn category_filter_excludes_unrelated_documents() {
        let mut guide = doc_with("User Guide", "tutorial content");
        guide.metadata.category = "guide".to_string();
        let mut api = doc_with("API Reference", "tutorial mentioned here too");
        api.metadata.category = "api".to_string();

        let mut documents = HashMap::new();
        documents.insert(guide.id, guide.clone());
        documents.insert(api.id, api);
        let index = SearchIndex::new();

        let results = search("tutorial", &documents, &index, Some("guide"), &HashMap::new(), &HashSet::new());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].doc_id, guide.id);
    }

    #[test]
    fn results_sorted_descending_by_score() {
        let doc_a = doc_with("Topic", "rust rust rust");
        let doc_b = doc_with("Other", "rust once");
        let mut documents = HashMap::new();
        documents.insert(doc_a.id, doc_a.clone());
        documents.insert(doc_b.id, doc_b.clone());
        let index = SearchIndex::new();

        let results = search("rust", &documents, &index, None, &HashMap::new(), &HashSet::new());
        assert_eq!(results.len(), 2);
        assert!(results[0].score >= results[1].score);
    }
}
