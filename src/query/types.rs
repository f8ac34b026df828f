use serde::Deserialize;

use crate::core::error::{Error, Result};
use crate::search::filter::FilterExpression;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// One search request. The free-text query may be empty when filters
/// are provided; pagination defaults to the first page of 10.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchQuery {
    pub query: String,
    pub filters: Option<FilterExpression>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub restrict_searchable_fields: Option<Vec<String>>,
    pub retrievable_fields: Option<Vec<String>>,
    pub min_word_size_for_1_typo: Option<usize>,
    pub min_word_size_for_2_typos: Option<usize>,
}

impl SearchQuery {
    pub fn text(query: impl Into<String>) -> Self {
        SearchQuery {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Validated page number (1-based).
    pub fn page(&self) -> Result<usize> {
        match self.page {
            None => Ok(1),
            Some(0) => Err(Error::validation("page must be at least 1")),
            Some(p) => Ok(p),
        }
    }

    /// Validated page size, bounded at MAX_PAGE_SIZE.
    pub fn page_size(&self) -> Result<usize> {
        match self.page_size {
            None => Ok(DEFAULT_PAGE_SIZE),
            Some(0) => Err(Error::validation("pageSize must be at least 1")),
            Some(s) if s > MAX_PAGE_SIZE => Err(Error::validation(format!(
                "pageSize must not exceed {}",
                MAX_PAGE_SIZE
            ))),
            Some(s) => Ok(s),
        }
    }
}

/// One named sub-query of a multi-search request.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedQuery {
    pub name: String,
    #[serde(flatten)]
    pub query: SearchQuery,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MultiSearchQuery {
    pub queries: Vec<NamedQuery>,
}

impl MultiSearchQuery {
    /// Query names must be non-empty and unique.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for named in &self.queries {
            if named.name.trim().is_empty() {
                return Err(Error::validation("query names must not be empty"));
            }
            if !seen.insert(named.name.as_str()) {
                return Err(Error::validation(format!(
                    "duplicate query name '{}'",
                    named.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;

    #[test]
    fn test_pagination_defaults_and_bounds() {
        let q = SearchQuery::text("matrix");
        assert_eq!(q.page().unwrap(), 1);
        assert_eq!(q.page_size().unwrap(), DEFAULT_PAGE_SIZE);

        let mut q = SearchQuery::text("matrix");
        q.page = Some(0);
        assert_eq!(q.page().unwrap_err().kind, ErrorKind::Validation);

        let mut q = SearchQuery::text("matrix");
        q.page_size = Some(MAX_PAGE_SIZE + 1);
        assert_eq!(q.page_size().unwrap_err().kind, ErrorKind::Validation);
    }

    #[test]
    fn test_multi_search_name_validation() {
        let valid = MultiSearchQuery {
            queries: vec![
                NamedQuery { name: "a".to_string(), query: SearchQuery::text("x") },
                NamedQuery { name: "b".to_string(), query: SearchQuery::text("y") },
            ],
        };
        assert!(valid.validate().is_ok());

        let duplicate = MultiSearchQuery {
            queries: vec![
                NamedQuery { name: "a".to_string(), query: SearchQuery::text("x") },
                NamedQuery { name: "a".to_string(), query: SearchQuery::text("y") },
            ],
        };
        assert_eq!(duplicate.validate().unwrap_err().kind, ErrorKind::Validation);

        let empty = MultiSearchQuery {
            queries: vec![NamedQuery { name: "  ".to_string(), query: SearchQuery::text("x") }],
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_query_deserializes_from_camel_case() {
        let q: SearchQuery = serde_json::from_value(serde_json::json!({
            "query": "matrix",
            "pageSize": 5,
            "restrictSearchableFields": ["title"],
        }))
        .unwrap();
        assert_eq!(q.page_size.unwrap(), 5);
        assert_eq!(q.restrict_searchable_fields.unwrap(), vec!["title"]);
    }
}
