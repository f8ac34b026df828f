use std::collections::HashMap;

use crate::analysis::tokenizer::{prefix_ngrams, tokenize};
use crate::core::error::{Error, Result};
use crate::core::settings::IndexSettings;
use crate::core::types::{external_id, DocId, Document};
use crate::index::inverted::InvertedIndex;
use crate::index::posting::Posting;
use crate::storage::document_store::DocumentStore;

/// Position gap inserted between tokenized array elements so that
/// adjacent elements never look positionally close.
pub const ARRAY_POSITION_GAP: u32 = 10;

/// Documents per sub-batch; cancellation and progress are observed at
/// sub-batch boundaries.
pub const SUB_BATCH_SIZE: usize = 100;

/// Tokenizes incoming documents and updates the inverted index and the
/// document store. Callers hold the index instance's write lock.
pub struct Indexer;

impl Indexer {
    /// Add documents in input order with upsert semantics. Not
    /// transactional: a failure on document N leaves 0..N-1 indexed and
    /// the error names the offending position. Returns the number of
    /// documents indexed.
    pub fn add_documents(
        settings: &IndexSettings,
        index: &mut InvertedIndex,
        store: &mut DocumentStore,
        docs: Vec<Document>,
    ) -> Result<usize> {
        Self::add_documents_with(settings, index, store, docs, |_, _| true)
    }

    /// Batched variant: `observer(indexed_so_far, total)` runs after each
    /// sub-batch; returning false stops with a cancellation error.
    pub fn add_documents_with(
        settings: &IndexSettings,
        index: &mut InvertedIndex,
        store: &mut DocumentStore,
        docs: Vec<Document>,
        mut observer: impl FnMut(usize, usize) -> bool,
    ) -> Result<usize> {
        let total = docs.len();
        let mut indexed = 0;

        for (position, doc) in docs.into_iter().enumerate() {
            Self::add_one(settings, index, store, doc)
                .map_err(|e| Error::new(e.kind, format!("document {}: {}", position, e.context)))?;
            indexed += 1;

            if indexed % SUB_BATCH_SIZE == 0 && !observer(indexed, total) {
                return Err(Error::cancelled(format!(
                    "indexing stopped after {}/{} documents",
                    indexed, total
                )));
            }
        }

        observer(indexed, total);
        Ok(indexed)
    }

    fn add_one(
        settings: &IndexSettings,
        index: &mut InvertedIndex,
        store: &mut DocumentStore,
        doc: Document,
    ) -> Result<()> {
        let ext_id = external_id(&doc)?;

        // Upsert: clean up postings for the previous version, then
        // allocate a fresh internal id for the replacement.
        if let Some(old_id) = store.internal_id(&ext_id) {
            index.remove_doc(old_id);
            store.remove(&ext_id);
        }
        let doc_id = store.allocate_id();

        for field in &settings.searchable_fields {
            let Some(value) = doc.get(field) else { continue };
            let positions_by_token = tokenize_field(value);
            if positions_by_token.is_empty() {
                continue;
            }

            let with_prefixes = !settings.is_prefix_search_disabled(field);
            for (token, positions) in positions_by_token {
                let term_freq = positions.len() as f64;
                index.add(
                    &token,
                    Posting {
                        doc_id,
                        field: field.clone(),
                        score: term_freq,
                        is_full_word: true,
                        positions: positions.clone(),
                    },
                );

                if with_prefixes {
                    for ngram in prefix_ngrams(&token) {
                        index.add(
                            &ngram,
                            Posting {
                                doc_id,
                                field: field.clone(),
                                score: term_freq,
                                is_full_word: false,
                                positions: positions.clone(),
                            },
                        );
                    }
                }
            }
        }

        // The document lands in the store after its postings; a crash in
        // between leaves the index dirty but the document absent.
        store.insert(doc_id, ext_id, doc);
        Ok(())
    }

    /// Remove one document by external id: posting scan plus store
    /// cleanup. Deletes are rare, so the full scan is acceptable.
    pub fn delete_document(
        index: &mut InvertedIndex,
        store: &mut DocumentStore,
        ext_id: &str,
    ) -> Result<DocId> {
        let doc_id = store
            .internal_id(ext_id)
            .ok_or_else(|| Error::not_found(format!("document '{}' not found", ext_id)))?;
        index.remove_doc(doc_id);
        store.remove(ext_id);
        Ok(doc_id)
    }

    /// Truncate the index and the store, restarting id allocation.
    pub fn delete_all(index: &mut InvertedIndex, store: &mut DocumentStore) {
        index.clear();
        store.clear();
    }
}

/// Tokenize one field value into token -> positions, concatenating array
/// elements with a position gap. Non-text scalars index their JSON
/// display form; nested objects and nulls are not searchable.
fn tokenize_field(value: &serde_json::Value) -> HashMap<String, Vec<u32>> {
    let mut positions_by_token: HashMap<String, Vec<u32>> = HashMap::new();
    let mut offset = 0u32;

    let fragments: Vec<String> = match value {
        serde_json::Value::Array(items) => items.iter().filter_map(fragment_text).collect(),
        other => fragment_text(other).into_iter().collect(),
    };

    for fragment in fragments {
        let tokens = tokenize(&fragment);
        let count = tokens.len() as u32;
        for (i, token) in tokens.into_iter().enumerate() {
            positions_by_token
                .entry(token)
                .or_default()
                .push(offset + i as u32);
        }
        offset += count + ARRAY_POSITION_GAP;
    }

    positions_by_token
}

fn fragment_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
