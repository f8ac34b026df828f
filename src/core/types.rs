use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::error::{Error, Result};

/// Reserved document key holding the external identifier.
pub const DOCUMENT_ID_KEY: &str = "documentID";

/// Internal numeric document id, assigned monotonically at insertion.
/// Never reused within a process session; an upsert invalidates the old
/// id and allocates a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub u32);

impl DocId {
    pub fn new(id: u32) -> Self {
        DocId(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for DocId {
    fn from(id: u32) -> Self {
        DocId(id)
    }
}

/// Schemaless document: open mapping from field name to JSON value.
pub type Document = HashMap<String, serde_json::Value>;

/// Extract and validate the external id of a document.
/// The id must be present, a string, and non-empty after trimming.
pub fn external_id(doc: &Document) -> Result<String> {
    match doc.get(DOCUMENT_ID_KEY) {
        Some(serde_json::Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Err(Error::validation(format!("{} must not be empty", DOCUMENT_ID_KEY)))
            } else {
                Ok(trimmed.to_string())
            }
        }
        Some(_) => Err(Error::validation(format!("{} must be a string", DOCUMENT_ID_KEY))),
        None => Err(Error::validation(format!("{} is required", DOCUMENT_ID_KEY))),
    }
}
