use serde::Serialize;
use std::collections::HashMap;

use crate::core::types::Document;

/// One matching document plus match diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct Hit {
    pub document: Document,
    #[serde(rename = "hitInfo")]
    pub info: HitInfo,
}

/// Per-hit match diagnostics.
///
/// `num_typos` counts query tokens whose best stage was a typo match;
/// `number_exact_words` counts tokens matched as exact whole words.
/// `field_matches` maps each field to the indexed terms that matched in
/// it.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HitInfo {
    pub num_typos: usize,
    pub number_exact_words: usize,
    pub filter_score: f64,
    pub field_matches: HashMap<String, Vec<String>>,
}

/// Ranked, paginated search response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub hits: Vec<Hit>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub processing_time_ms: u64,
}

/// Multi-search response: one result per named sub-query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSearchResult {
    pub results: HashMap<String, SearchResult>,
    pub total_queries: usize,
    pub processing_time_ms: u64,
}
