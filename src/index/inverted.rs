use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::types::DocId;
use crate::index::posting::{Posting, PostingList};

/// In-memory inverted index: token -> posting list.
///
/// Tokens are whole words plus prefix n-grams of whole words (prefix
/// n-grams are omitted for prefix-disabled fields). Readers and writers
/// coordinate through the owning index instance's RW lock; the structure
/// itself is not synchronized.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InvertedIndex {
    postings: HashMap<String, PostingList>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        InvertedIndex {
            postings: HashMap::new(),
        }
    }

    /// Append an entry to the list for `token`, creating it if absent.
    pub fn add(&mut self, token: &str, entry: Posting) {
        self.postings
            .entry(token.to_string())
            .or_default()
            .push(entry);
    }

    /// Remove every entry for `doc_id`; tokens whose lists empty out are
    /// dropped entirely.
    pub fn remove_doc(&mut self, doc_id: DocId) {
        self.postings.retain(|_, list| {
            list.retain(|p| p.doc_id != doc_id);
            !list.is_empty()
        });
    }

    pub fn get(&self, token: &str) -> &[Posting] {
        self.postings.get(token).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, token: &str) -> bool {
        self.postings.contains_key(token)
    }

    /// Snapshot of all known tokens, for seeding the typo finder.
    pub fn tokens(&self) -> Vec<String> {
        self.postings.keys().cloned().collect()
    }

    pub fn token_count(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn clear(&mut self) {
        self.postings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(doc: u32, field: &str) -> Posting {
        Posting {
            doc_id: DocId(doc),
            field: field.to_string(),
            score: 1.0,
            is_full_word: true,
            positions: vec![0],
        }
    }

    #[test]
    fn test_add_and_get() {
        let mut index = InvertedIndex::new();
        index.add("matrix", posting(1, "title"));
        index.add("matrix", posting(2, "title"));

        assert_eq!(index.get("matrix").len(), 2);
        assert!(index.get("missing").is_empty());
    }

    #[test]
    fn test_remove_doc_drops_empty_tokens() {
        let mut index = InvertedIndex::new();
        index.add("matrix", posting(1, "title"));
        index.add("matrix", posting(2, "title"));
        index.add("sequel", posting(1, "description"));

        index.remove_doc(DocId(1));

        assert_eq!(index.get("matrix").len(), 1);
        assert!(!index.contains("sequel"));
        assert_eq!(index.token_count(), 1);
    }

    #[test]
    fn test_tokens_snapshot() {
        let mut index = InvertedIndex::new();
        index.add("a", posting(1, "title"));
        index.add("b", posting(1, "title"));

        let mut tokens = index.tokens();
        tokens.sort();
        assert_eq!(tokens, vec!["a", "b"]);
    }
}
