use serde::Serialize;

/// Point-in-time statistics for one index, served by the stats endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub name: String,
    pub document_count: usize,
    pub term_count: usize,
    pub searchable_fields: Vec<String>,
    pub filterable_fields: Vec<String>,
}
