use serde::{Deserialize, Serialize};

use crate::core::types::DocId;

/// One occurrence record: a token seen in one field of one document.
///
/// `score` is the term frequency of the token within that field.
/// `is_full_word` distinguishes whole-word postings from prefix n-gram
/// postings; positions index into the field's token stream (array-valued
/// fields concatenate element streams with a gap).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub field: String,
    pub score: f64,
    pub is_full_word: bool,
    pub positions: Vec<u32>,
}

/// Posting list for one token. Iteration order is unspecified; the
/// searcher tolerates arbitrary order.
pub type PostingList = Vec<Posting>;
