use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::types::{DocId, Document};

/// Maps internal numeric ids to documents and external string ids to
/// internal ids. The two maps are bijective over live documents; a
/// deletion removes both entries.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DocumentStore {
    docs: HashMap<u32, Document>,
    external_ids: HashMap<String, u32>,
    next_id: u32,
}

impl DocumentStore {
    pub fn new() -> Self {
        DocumentStore::default()
    }

    /// Hand out the next internal id. Ids are monotone and never reused
    /// within a process session.
    pub fn allocate_id(&mut self) -> DocId {
        let id = DocId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn insert(&mut self, id: DocId, external_id: String, doc: Document) {
        self.docs.insert(id.0, doc);
        self.external_ids.insert(external_id, id.0);
    }

    pub fn get(&self, id: DocId) -> Option<&Document> {
        self.docs.get(&id.0)
    }

    pub fn internal_id(&self, external_id: &str) -> Option<DocId> {
        self.external_ids.get(external_id).copied().map(DocId)
    }

    pub fn get_by_external(&self, external_id: &str) -> Option<&Document> {
        self.internal_id(external_id).and_then(|id| self.get(id))
    }

    /// Remove a document by external id, returning the internal id it
    /// held. Both mappings are cleaned up.
    pub fn remove(&mut self, external_id: &str) -> Option<DocId> {
        let id = self.external_ids.remove(external_id)?;
        self.docs.remove(&id);
        Some(DocId(id))
    }

    pub fn contains_internal(&self, id: DocId) -> bool {
        self.docs.contains_key(&id.0)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Truncate both mappings and restart id allocation at 0.
    pub fn clear(&mut self) {
        self.docs.clear();
        self.external_ids.clear();
        self.next_id = 0;
    }

    /// Live documents ordered by internal id, for stable listing.
    pub fn documents_by_id(&self) -> Vec<(DocId, &Document)> {
        let mut entries: Vec<(DocId, &Document)> =
            self.docs.iter().map(|(id, doc)| (DocId(*id), doc)).collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    /// Clone out every live document, for settings-induced reindexing.
    pub fn all_documents(&self) -> Vec<Document> {
        self.documents_by_id()
            .into_iter()
            .map(|(_, doc)| doc.clone())
            .collect()
    }
}
