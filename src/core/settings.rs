use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::core::error::{Error, Result};

pub const DEFAULT_MIN_WORD_SIZE_FOR_1_TYPO: usize = 4;
pub const DEFAULT_MIN_WORD_SIZE_FOR_2_TYPOS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// One ranking criterion: a field (or synthetic field such as `~score`
/// and `~filters`) plus a sort direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingCriterion {
    pub field: String,
    pub order: SortOrder,
}

/// Per-index configuration. Field priority for search is the position in
/// `searchable_fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexSettings {
    pub name: String,
    pub searchable_fields: Vec<String>,
    pub filterable_fields: Vec<String>,
    pub ranking_criteria: Vec<RankingCriterion>,
    pub min_word_size_for_1_typo: usize,
    pub min_word_size_for_2_typos: usize,
    pub fields_without_prefix_search: Vec<String>,
    pub no_typo_tolerance_fields: Vec<String>,
    pub non_typo_tolerant_words: HashSet<String>,
    pub distinct_field: Option<String>,
}

impl Default for IndexSettings {
    fn default() -> Self {
        IndexSettings {
            name: String::new(),
            searchable_fields: Vec::new(),
            filterable_fields: Vec::new(),
            ranking_criteria: Vec::new(),
            min_word_size_for_1_typo: 0,
            min_word_size_for_2_typos: 0,
            fields_without_prefix_search: Vec::new(),
            no_typo_tolerance_fields: Vec::new(),
            non_typo_tolerant_words: HashSet::new(),
            distinct_field: None,
        }
    }
}

impl IndexSettings {
    pub fn new(name: impl Into<String>) -> Self {
        let mut settings = IndexSettings {
            name: name.into(),
            ..Default::default()
        };
        settings.apply_defaults();
        settings
    }

    /// Fill in zero-valued typo thresholds. `min_word_size_for_2_typos`
    /// defaults to `max(7, min_word_size_for_1_typo + 1)`.
    pub fn apply_defaults(&mut self) {
        if self.min_word_size_for_1_typo == 0 {
            self.min_word_size_for_1_typo = DEFAULT_MIN_WORD_SIZE_FOR_1_TYPO;
        }
        if self.min_word_size_for_2_typos == 0 {
            self.min_word_size_for_2_typos =
                DEFAULT_MIN_WORD_SIZE_FOR_2_TYPOS.max(self.min_word_size_for_1_typo + 1);
        }
    }

    /// Validate the settings, returning every issue found rather than
    /// stopping at the first.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.name.trim().is_empty() {
            issues.push("index name must not be empty".to_string());
        }

        check_field_list(&mut issues, "searchableFields", &self.searchable_fields);
        check_field_list(&mut issues, "filterableFields", &self.filterable_fields);
        check_field_list(
            &mut issues,
            "fieldsWithoutPrefixSearch",
            &self.fields_without_prefix_search,
        );
        check_field_list(
            &mut issues,
            "noTypoToleranceFields",
            &self.no_typo_tolerance_fields,
        );

        let searchable: HashSet<&str> =
            self.searchable_fields.iter().map(String::as_str).collect();
        for field in &self.fields_without_prefix_search {
            if !searchable.contains(field.as_str()) {
                issues.push(format!(
                    "fieldsWithoutPrefixSearch entry '{}' is not a searchable field",
                    field
                ));
            }
        }
        for field in &self.no_typo_tolerance_fields {
            if !searchable.contains(field.as_str()) {
                issues.push(format!(
                    "noTypoToleranceFields entry '{}' is not a searchable field",
                    field
                ));
            }
        }

        let mut seen_criteria = HashSet::new();
        for criterion in &self.ranking_criteria {
            if criterion.field.trim().is_empty() {
                issues.push("rankingCriteria entries must name a field".to_string());
            }
            if !seen_criteria.insert(criterion.field.as_str()) {
                issues.push(format!(
                    "duplicate rankingCriteria field '{}'",
                    criterion.field
                ));
            }
        }

        if self.min_word_size_for_2_typos < self.min_word_size_for_1_typo {
            issues.push(format!(
                "minWordSizeFor2Typos ({}) must be >= minWordSizeFor1Typo ({})",
                self.min_word_size_for_2_typos, self.min_word_size_for_1_typo
            ));
        }

        issues
    }

    /// Apply defaults and validate in one step, surfacing all issues as a
    /// single validation error.
    pub fn normalize(&mut self) -> Result<()> {
        self.apply_defaults();
        let issues = self.validate();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(Error::validation(issues.join("; ")))
        }
    }

    pub fn is_prefix_search_disabled(&self, field: &str) -> bool {
        self.fields_without_prefix_search.iter().any(|f| f == field)
    }

    pub fn is_typo_tolerance_disabled(&self, field: &str) -> bool {
        self.no_typo_tolerance_fields.iter().any(|f| f == field)
    }
}

fn check_field_list(issues: &mut Vec<String>, list_name: &str, fields: &[String]) {
    let mut seen = HashSet::new();
    for field in fields {
        if field.trim().is_empty() {
            issues.push(format!("{} entries must not be empty", list_name));
        }
        if !seen.insert(field.as_str()) {
            issues.push(format!("duplicate {} entry '{}'", list_name, field));
        }
    }
}

/// True iff moving from `old` to `new` invalidates the inverted index:
/// the indexed fields, ranking configuration, or typo thresholds differ.
pub fn requires_full_reindexing(old: &IndexSettings, new: &IndexSettings) -> bool {
    old.searchable_fields != new.searchable_fields
        || old.filterable_fields != new.filterable_fields
        || old.ranking_criteria != new.ranking_criteria
        || old.min_word_size_for_1_typo != new.min_word_size_for_1_typo
        || old.min_word_size_for_2_typos != new.min_word_size_for_2_typos
}

/// Partial settings payload for updates. Absent fields keep their
/// current value; `name` is not updatable here (rename is its own
/// operation).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsUpdate {
    pub searchable_fields: Option<Vec<String>>,
    pub filterable_fields: Option<Vec<String>>,
    pub ranking_criteria: Option<Vec<RankingCriterion>>,
    pub min_word_size_for_1_typo: Option<usize>,
    pub min_word_size_for_2_typos: Option<usize>,
    pub fields_without_prefix_search: Option<Vec<String>>,
    pub no_typo_tolerance_fields: Option<Vec<String>>,
    pub non_typo_tolerant_words: Option<HashSet<String>>,
    pub distinct_field: Option<Option<String>>,
}

impl SettingsUpdate {
    pub fn merged_into(&self, current: &IndexSettings) -> IndexSettings {
        let mut merged = current.clone();
        if let Some(v) = &self.searchable_fields {
            merged.searchable_fields = v.clone();
        }
        if let Some(v) = &self.filterable_fields {
            merged.filterable_fields = v.clone();
        }
        if let Some(v) = &self.ranking_criteria {
            merged.ranking_criteria = v.clone();
        }
        if let Some(v) = self.min_word_size_for_1_typo {
            merged.min_word_size_for_1_typo = v;
        }
        if let Some(v) = self.min_word_size_for_2_typos {
            merged.min_word_size_for_2_typos = v;
        }
        if let Some(v) = &self.fields_without_prefix_search {
            merged.fields_without_prefix_search = v.clone();
        }
        if let Some(v) = &self.no_typo_tolerance_fields {
            merged.no_typo_tolerance_fields = v.clone();
        }
        if let Some(v) = &self.non_typo_tolerant_words {
            merged.non_typo_tolerant_words = v.clone();
        }
        if let Some(v) = &self.distinct_field {
            merged.distinct_field = v.clone();
        }
        merged
    }
}
