use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::core::types::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "_exact")]
    Exact,
    #[serde(rename = "_ne")]
    NotEqual,
    #[serde(rename = "_gt")]
    GreaterThan,
    #[serde(rename = "_gte")]
    GreaterThanOrEqual,
    #[serde(rename = "_lt")]
    LessThan,
    #[serde(rename = "_lte")]
    LessThanOrEqual,
    #[serde(rename = "_contains")]
    Contains,
    #[serde(rename = "_ncontains")]
    NotContains,
    #[serde(rename = "_contains_any_of")]
    ContainsAnyOf,
}

/// Leaf condition. `score` is added to the document's filter score when
/// the condition matches, and feeds ranking through `~filters`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterCondition {
    pub field: String,
    pub operator: FilterOperator,
    pub value: Value,
    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoolOperator {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

/// Boolean expression tree over leaf conditions and subexpressions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterExpression {
    pub operator: BoolOperator,
    #[serde(default)]
    pub filters: Vec<FilterCondition>,
    #[serde(default)]
    pub groups: Vec<FilterExpression>,
}

/// Evaluate an expression against one document, returning whether it
/// matched and the accumulated filter score. AND sums every child's
/// score when all match; OR sums the scores of matched children only.
pub fn evaluate(
    expr: &FilterExpression,
    doc: &Document,
    filterable_fields: &HashSet<String>,
) -> (bool, f64) {
    let mut child_results: Vec<(bool, f64)> = Vec::new();

    for condition in &expr.filters {
        let matched = evaluate_condition(condition, doc, filterable_fields);
        child_results.push((matched, if matched { condition.score } else { 0.0 }));
    }
    for group in &expr.groups {
        child_results.push(evaluate(group, doc, filterable_fields));
    }

    match expr.operator {
        BoolOperator::And => {
            let matched = child_results.iter().all(|(m, _)| *m);
            let score = child_results.iter().map(|(_, s)| s).sum();
            if matched { (true, score) } else { (false, 0.0) }
        }
        BoolOperator::Or => {
            let matched = child_results.iter().any(|(m, _)| *m);
            let score = child_results
                .iter()
                .filter(|(m, _)| *m)
                .map(|(_, s)| s)
                .sum();
            if matched { (true, score) } else { (false, 0.0) }
        }
    }
}

/// A condition on a non-filterable or absent field is false, never an
/// error; type mismatches are likewise false.
fn evaluate_condition(
    condition: &FilterCondition,
    doc: &Document,
    filterable_fields: &HashSet<String>,
) -> bool {
    if !filterable_fields.contains(&condition.field) {
        return false;
    }
    let Some(doc_value) = doc.get(&condition.field) else {
        return false;
    };

    match condition.operator {
        FilterOperator::Exact => exact_match(doc_value, &condition.value),
        FilterOperator::NotEqual => !exact_match(doc_value, &condition.value),
        FilterOperator::GreaterThan => numeric_cmp(doc_value, &condition.value, |a, b| a > b),
        FilterOperator::GreaterThanOrEqual => {
            numeric_cmp(doc_value, &condition.value, |a, b| a >= b)
        }
        FilterOperator::LessThan => numeric_cmp(doc_value, &condition.value, |a, b| a < b),
        FilterOperator::LessThanOrEqual => numeric_cmp(doc_value, &condition.value, |a, b| a <= b),
        FilterOperator::Contains => contains_match(doc_value, &condition.value),
        FilterOperator::NotContains => !contains_match(doc_value, &condition.value),
        FilterOperator::ContainsAnyOf => match &condition.value {
            Value::Array(values) => values.iter().any(|v| contains_match(doc_value, v)),
            _ => false,
        },
    }
}

/// Equality after JSON coercion: numbers compare numerically, strings
/// byte-equal. For array fields this is a membership test.
fn exact_match(doc_value: &Value, filter_value: &Value) -> bool {
    match doc_value {
        Value::Array(items) => items.iter().any(|item| scalar_eq(item, filter_value)),
        other => scalar_eq(other, filter_value),
    }
}

fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn numeric_cmp(doc_value: &Value, filter_value: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (as_f64(doc_value), as_f64(filter_value)) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    value.as_f64()
}

/// Case-insensitive substring for string fields; case-insensitive
/// element test for array fields.
fn contains_match(doc_value: &Value, filter_value: &Value) -> bool {
    let Value::String(needle) = filter_value else {
        return false;
    };
    let needle = needle.to_lowercase();

    match doc_value {
        Value::String(haystack) => haystack.to_lowercase().contains(&needle),
        Value::Array(items) => items.iter().any(|item| match item {
            Value::String(s) => s.to_lowercase() == needle,
            _ => false,
        }),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Document {
        let mut d = Document::new();
        d.insert("documentID".to_string(), json!("a"));
        d.insert("genre".to_string(), json!("Action"));
        d.insert("rating".to_string(), json!(8.5));
        d.insert("tags".to_string(), json!(["Cult", "Sci-Fi"]));
        d
    }

    fn filterable() -> HashSet<String> {
        ["genre", "rating", "tags"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn leaf(field: &str, operator: FilterOperator, value: Value, score: f64) -> FilterCondition {
        FilterCondition {
            field: field.to_string(),
            operator,
            value,
            score,
        }
    }

    fn expr(operator: BoolOperator, filters: Vec<FilterCondition>) -> FilterExpression {
        FilterExpression {
            operator,
            filters,
            groups: Vec::new(),
        }
    }

    #[test]
    fn test_exact_and_ne() {
        let d = doc();
        let f = filterable();

        let (m, s) = evaluate(
            &expr(BoolOperator::And, vec![leaf("genre", FilterOperator::Exact, json!("Action"), 2.0)]),
            &d,
            &f,
        );
        assert!(m);
        assert_eq!(s, 2.0);

        let (m, _) = evaluate(
            &expr(BoolOperator::And, vec![leaf("genre", FilterOperator::NotEqual, json!("Drama"), 0.0)]),
            &d,
            &f,
        );
        assert!(m);
    }

    #[test]
    fn test_exact_is_membership_for_arrays() {
        let d = doc();
        let f = filterable();
        let (m, _) = evaluate(
            &expr(BoolOperator::And, vec![leaf("tags", FilterOperator::Exact, json!("Cult"), 0.0)]),
            &d,
            &f,
        );
        assert!(m);
    }

    #[test]
    fn test_numeric_comparisons() {
        let d = doc();
        let f = filterable();
        for (op, value, expected) in [
            (FilterOperator::GreaterThan, json!(8.0), true),
            (FilterOperator::GreaterThanOrEqual, json!(8.5), true),
            (FilterOperator::LessThan, json!(8.5), false),
            (FilterOperator::LessThanOrEqual, json!(8.5), true),
        ] {
            let (m, _) = evaluate(&expr(BoolOperator::And, vec![leaf("rating", op, value, 0.0)]), &d, &f);
            assert_eq!(m, expected, "operator {:?}", op);
        }

        // Non-numeric document value is simply false.
        let (m, _) = evaluate(
            &expr(BoolOperator::And, vec![leaf("genre", FilterOperator::GreaterThan, json!(1), 0.0)]),
            &d,
            &f,
        );
        assert!(!m);
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let d = doc();
        let f = filterable();

        let (m, _) = evaluate(
            &expr(BoolOperator::And, vec![leaf("genre", FilterOperator::Contains, json!("act"), 0.0)]),
            &d,
            &f,
        );
        assert!(m, "substring match on strings");

        let (m, _) = evaluate(
            &expr(BoolOperator::And, vec![leaf("tags", FilterOperator::Contains, json!("sci-fi"), 0.0)]),
            &d,
            &f,
        );
        assert!(m, "element match on arrays");
    }

    #[test]
    fn test_contains_any_of() {
        let d = doc();
        let f = filterable();
        let (m, _) = evaluate(
            &expr(
                BoolOperator::And,
                vec![leaf("tags", FilterOperator::ContainsAnyOf, json!(["western", "cult"]), 0.0)],
            ),
            &d,
            &f,
        );
        assert!(m);
    }

    #[test]
    fn test_or_sums_matched_children_only() {
        let d = doc();
        let f = filterable();
        let (m, s) = evaluate(
            &expr(
                BoolOperator::Or,
                vec![
                    leaf("genre", FilterOperator::Exact, json!("Action"), 5.0),
                    leaf("rating", FilterOperator::GreaterThanOrEqual, json!(9.0), 2.0),
                ],
            ),
            &d,
            &f,
        );
        assert!(m);
        assert_eq!(s, 5.0, "only the matched child contributes");
    }

    #[test]
    fn test_and_requires_all_children() {
        let d = doc();
        let f = filterable();
        let (m, s) = evaluate(
            &expr(
                BoolOperator::And,
                vec![
                    leaf("genre", FilterOperator::Exact, json!("Action"), 5.0),
                    leaf("rating", FilterOperator::GreaterThanOrEqual, json!(9.0), 2.0),
                ],
            ),
            &d,
            &f,
        );
        assert!(!m);
        assert_eq!(s, 0.0);
    }

    #[test]
    fn test_nested_groups() {
        let d = doc();
        let f = filterable();
        let inner = expr(
            BoolOperator::Or,
            vec![
                leaf("genre", FilterOperator::Exact, json!("Drama"), 1.0),
                leaf("rating", FilterOperator::GreaterThan, json!(8.0), 3.0),
            ],
        );
        let outer = FilterExpression {
            operator: BoolOperator::And,
            filters: vec![leaf("genre", FilterOperator::Contains, json!("action"), 1.0)],
            groups: vec![inner],
        };

        let (m, s) = evaluate(&outer, &d, &f);
        assert!(m);
        assert_eq!(s, 4.0);
    }

    #[test]
    fn test_non_filterable_field_is_false_not_error() {
        let d = doc();
        let f = filterable();
        let (m, s) = evaluate(
            &expr(BoolOperator::And, vec![leaf("documentID", FilterOperator::Exact, json!("a"), 1.0)]),
            &d,
            &f,
        );
        assert!(!m);
        assert_eq!(s, 0.0);
    }

    #[test]
    fn test_and_monotonicity() {
        let d = doc();
        let f = filterable();
        let base = expr(BoolOperator::And, vec![leaf("genre", FilterOperator::Exact, json!("Action"), 0.0)]);
        let (base_match, _) = evaluate(&base, &d, &f);

        let mut narrowed = base.clone();
        narrowed
            .filters
            .push(leaf("rating", FilterOperator::GreaterThan, json!(9.9), 0.0));
        let (narrowed_match, _) = evaluate(&narrowed, &d, &f);

        // Adding an AND clause can only shrink the match set.
        assert!(base_match);
        assert!(!narrowed_match || base_match);
    }

    #[test]
    fn test_wire_operator_names() {
        let parsed: FilterCondition = serde_json::from_value(json!({
            "field": "genre",
            "operator": "_contains_any_of",
            "value": ["a"],
        }))
        .unwrap();
        assert_eq!(parsed.operator, FilterOperator::ContainsAnyOf);
        assert_eq!(parsed.score, 0.0);
    }
}
