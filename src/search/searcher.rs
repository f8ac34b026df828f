use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::analysis::tokenizer::tokenize;
use crate::core::error::{Error, Result};
use crate::core::settings::{IndexSettings, RankingCriterion, SortOrder};
use crate::core::types::{DocId, Document, DOCUMENT_ID_KEY};
use crate::index::inverted::InvertedIndex;
use crate::query::types::SearchQuery;
use crate::search::filter;
use crate::search::results::{Hit, HitInfo, SearchResult};
use crate::search::typos::{
    damerau_levenshtein_bounded, TypoFinder, DEFAULT_CANDIDATE_LIMIT, DEFAULT_TIME_BUDGET,
};
use crate::storage::document_store::DocumentStore;

/// Match quality for one (query token, document) pair. Exact beats
/// prefix beats typo; an exact or prefix hit suppresses typo hits for
/// the same pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchKind {
    Typo,
    Prefix,
    Exact,
}

/// Best match of one query token against one document, across fields.
#[derive(Debug)]
struct TokenHit {
    kind: MatchKind,
    distance: usize,
    terms: HashMap<String, HashSet<String>>,
    positions: HashMap<String, Vec<u32>>,
}

/// Stages exact, prefix and typo matching across searchable fields in
/// priority order, then filters, ranks, deduplicates and paginates.
pub struct Searcher;

impl Searcher {
    pub fn search(
        settings: &IndexSettings,
        index: &InvertedIndex,
        store: &DocumentStore,
        typos: &TypoFinder,
        query: &SearchQuery,
    ) -> Result<SearchResult> {
        let started = Instant::now();

        let page = query.page()?;
        let page_size = query.page_size()?;
        let fields = effective_fields(settings, query)?;
        let min_1_typo = query
            .min_word_size_for_1_typo
            .unwrap_or(settings.min_word_size_for_1_typo);
        let min_2_typos = query
            .min_word_size_for_2_typos
            .unwrap_or(settings.min_word_size_for_2_typos);

        let tokens = tokenize(&query.query);
        let token_hits: Vec<HashMap<DocId, TokenHit>> = tokens
            .iter()
            .map(|q| match_token(q, &fields, settings, index, typos, min_1_typo, min_2_typos))
            .collect::<Result<_>>()?;

        // A document is a candidate iff every query token matched it
        // somewhere; an empty query is a filter-only scan.
        let candidate_ids: Vec<DocId> = match token_hits.split_first() {
            None => store.documents_by_id().into_iter().map(|(id, _)| id).collect(),
            Some((first, rest)) => {
                let mut ids: Vec<DocId> = first
                    .keys()
                    .filter(|id| rest.iter().all(|hits| hits.contains_key(id)))
                    .copied()
                    .collect();
                ids.sort();
                ids
            }
        };

        let filterable: HashSet<String> = settings.filterable_fields.iter().cloned().collect();
        let mut ranked: Vec<RankedDoc> = Vec::new();

        for doc_id in candidate_ids {
            let Some(doc) = store.get(doc_id) else { continue };

            let mut filter_score = 0.0;
            if let Some(expr) = &query.filters {
                let (matched, score) = filter::evaluate(expr, doc, &filterable);
                if !matched {
                    continue;
                }
                filter_score = score;
            }

            let info = build_hit_info(doc_id, &token_hits, filter_score);
            let relevance = relevance_score(doc_id, &token_hits, &info);
            ranked.push(RankedDoc {
                doc_id,
                relevance,
                info,
            });
        }

        let criteria = effective_criteria(settings);
        ranked.sort_by(|a, b| compare_ranked(a, b, &criteria, store));

        if let Some(distinct_field) = &settings.distinct_field {
            ranked = dedupe_distinct(ranked, distinct_field, store);
        }

        let total = ranked.len();
        let start = (page - 1) * page_size;
        let hits: Vec<Hit> = ranked
            .into_iter()
            .skip(start)
            .take(page_size)
            .filter_map(|r| {
                store.get(r.doc_id).map(|doc| Hit {
                    document: project(doc, query.retrievable_fields.as_deref()),
                    info: r.info,
                })
            })
            .collect();

        Ok(SearchResult {
            hits,
            total,
            page,
            page_size,
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }
}

struct RankedDoc {
    doc_id: DocId,
    relevance: f64,
    info: HitInfo,
}

/// Searchable fields in priority order, honoring a caller restriction.
/// Restriction entries must themselves be searchable.
fn effective_fields(settings: &IndexSettings, query: &SearchQuery) -> Result<Vec<String>> {
    match &query.restrict_searchable_fields {
        None => Ok(settings.searchable_fields.clone()),
        Some(restriction) => {
            for field in restriction {
                if !settings.searchable_fields.contains(field) {
                    return Err(Error::validation(format!(
                        "field '{}' is not searchable",
                        field
                    )));
                }
            }
            // Keep the settings' relative priority order.
            Ok(settings
                .searchable_fields
                .iter()
                .filter(|f| restriction.contains(*f))
                .cloned()
                .collect())
        }
    }
}

/// Match one query token against every field, staging exact -> prefix ->
/// typo per field and stopping at the first stage that produces a match
/// for that field.
fn match_token(
    q: &str,
    fields: &[String],
    settings: &IndexSettings,
    index: &InvertedIndex,
    typos: &TypoFinder,
    min_1_typo: usize,
    min_2_typos: usize,
) -> Result<HashMap<DocId, TokenHit>> {
    let mut hits: HashMap<DocId, TokenHit> = HashMap::new();

    for field in fields {
        // Stage 1: exact whole-word match.
        let mut field_matched = false;
        for posting in index.get(q).iter().filter(|p| &p.field == field && p.is_full_word) {
            record(&mut hits, posting.doc_id, MatchKind::Exact, 0, field, q, &posting.positions);
            field_matched = true;
        }
        if field_matched {
            continue;
        }

        // Stage 2: prefix n-gram match.
        if !settings.is_prefix_search_disabled(field) {
            for posting in index.get(q).iter().filter(|p| &p.field == field && !p.is_full_word) {
                record(&mut hits, posting.doc_id, MatchKind::Prefix, 0, field, q, &posting.positions);
                field_matched = true;
            }
            if field_matched {
                continue;
            }
        }

        // Stage 3: typo match.
        if settings.is_typo_tolerance_disabled(field)
            || settings.non_typo_tolerant_words.contains(q)
            || q.len() < min_1_typo
        {
            continue;
        }
        let max_distance = if q.len() < min_2_typos { 1 } else { 2 };
        let candidates =
            typos.candidates_within(q, max_distance, DEFAULT_CANDIDATE_LIMIT, DEFAULT_TIME_BUDGET)?;
        for term in candidates {
            let distance = damerau_levenshtein_bounded(q, &term, max_distance);
            for posting in index.get(&term).iter().filter(|p| &p.field == field) {
                record(
                    &mut hits,
                    posting.doc_id,
                    MatchKind::Typo,
                    distance,
                    field,
                    &term,
                    &posting.positions,
                );
            }
        }
    }

    Ok(hits)
}

/// Merge one posting into the per-document best match. A better kind
/// replaces everything recorded so far; among typo hits only the
/// minimum distance survives, all candidates at that distance are kept.
fn record(
    hits: &mut HashMap<DocId, TokenHit>,
    doc_id: DocId,
    kind: MatchKind,
    distance: usize,
    field: &str,
    term: &str,
    positions: &[u32],
) {
    let entry = hits.entry(doc_id).or_insert_with(|| TokenHit {
        kind,
        distance,
        terms: HashMap::new(),
        positions: HashMap::new(),
    });

    if kind > entry.kind {
        entry.kind = kind;
        entry.distance = distance;
        entry.terms.clear();
        entry.positions.clear();
    } else if kind < entry.kind {
        return;
    } else if kind == MatchKind::Typo {
        if distance < entry.distance {
            entry.distance = distance;
            entry.terms.clear();
            entry.positions.clear();
        } else if distance > entry.distance {
            return;
        }
    }

    entry.terms.entry(field.to_string()).or_default().insert(term.to_string());
    entry.positions.entry(field.to_string()).or_default().extend_from_slice(positions);
}

fn build_hit_info(
    doc_id: DocId,
    token_hits: &[HashMap<DocId, TokenHit>],
    filter_score: f64,
) -> HitInfo {
    let mut info = HitInfo {
        filter_score,
        ..Default::default()
    };

    let mut field_matches: HashMap<String, HashSet<String>> = HashMap::new();
    for hits in token_hits {
        let Some(hit) = hits.get(&doc_id) else { continue };
        match hit.kind {
            MatchKind::Exact => info.number_exact_words += 1,
            MatchKind::Typo => info.num_typos += 1,
            MatchKind::Prefix => {}
        }
        for (field, terms) in &hit.terms {
            field_matches.entry(field.clone()).or_default().extend(terms.iter().cloned());
        }
    }

    info.field_matches = field_matches
        .into_iter()
        .map(|(field, terms)| {
            let mut terms: Vec<String> = terms.into_iter().collect();
            terms.sort();
            (field, terms)
        })
        .collect();
    info
}

/// Relevance for the synthetic `~score` criterion: exact words weigh
/// 10, typos penalize 3, and multi-token queries earn a proximity bonus
/// of `1 / (1 + minimal pairwise position distance)` within a field.
fn relevance_score(doc_id: DocId, token_hits: &[HashMap<DocId, TokenHit>], info: &HitInfo) -> f64 {
    let mut score = 10.0 * info.number_exact_words as f64 - 3.0 * info.num_typos as f64;

    if let Some(min_distance) = minimal_pairwise_distance(doc_id, token_hits) {
        score += 1.0 / (1.0 + min_distance as f64);
    }
    score
}

fn minimal_pairwise_distance(
    doc_id: DocId,
    token_hits: &[HashMap<DocId, TokenHit>],
) -> Option<u32> {
    let mut best: Option<u32> = None;

    for i in 0..token_hits.len() {
        let Some(a) = token_hits[i].get(&doc_id) else { continue };
        for b_hits in &token_hits[i + 1..] {
            let Some(b) = b_hits.get(&doc_id) else { continue };
            for (field, a_positions) in &a.positions {
                let Some(b_positions) = b.positions.get(field) else { continue };
                for pa in a_positions {
                    for pb in b_positions {
                        let d = pa.abs_diff(*pb);
                        best = Some(best.map_or(d, |current| current.min(d)));
                    }
                }
            }
        }
    }
    best
}

fn effective_criteria(settings: &IndexSettings) -> Vec<RankingCriterion> {
    if settings.ranking_criteria.is_empty() {
        vec![RankingCriterion {
            field: "~score".to_string(),
            order: SortOrder::Desc,
        }]
    } else {
        settings.ranking_criteria.clone()
    }
}

/// Lexicographic comparison over the ranking criteria; ties break by
/// ascending internal id.
fn compare_ranked(
    a: &RankedDoc,
    b: &RankedDoc,
    criteria: &[RankingCriterion],
    store: &DocumentStore,
) -> Ordering {
    for criterion in criteria {
        let ord = match criterion.field.as_str() {
            "~score" => directed(a.relevance.total_cmp(&b.relevance), criterion.order),
            "~filters" => directed(
                a.info.filter_score.total_cmp(&b.info.filter_score),
                criterion.order,
            ),
            field => compare_doc_field(a.doc_id, b.doc_id, field, criterion.order, store),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.doc_id.cmp(&b.doc_id)
}

fn directed(ord: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ord,
        SortOrder::Desc => ord.reverse(),
    }
}

/// Missing fields sort last regardless of direction.
fn compare_doc_field(
    a: DocId,
    b: DocId,
    field: &str,
    order: SortOrder,
    store: &DocumentStore,
) -> Ordering {
    let av = store.get(a).and_then(|d| d.get(field));
    let bv = store.get(b).and_then(|d| d.get(field));

    match (av, bv) {
        (Some(x), Some(y)) => directed(json_cmp(x, y), order),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Runtime-typed comparison: numbers numerically, strings and bools by
/// their natural order; mismatched or non-scalar types rank equal.
fn json_cmp(a: &serde_json::Value, b: &serde_json::Value) -> Ordering {
    use serde_json::Value;
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => Ordering::Equal,
            }
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Keep only the top-ranked member of each distinct-field group.
/// Documents without the field are not grouped.
fn dedupe_distinct(
    ranked: Vec<RankedDoc>,
    distinct_field: &str,
    store: &DocumentStore,
) -> Vec<RankedDoc> {
    let mut seen: HashSet<String> = HashSet::new();
    ranked
        .into_iter()
        .filter(|r| {
            let Some(value) = store.get(r.doc_id).and_then(|d| d.get(distinct_field)) else {
                return true;
            };
            seen.insert(value.to_string())
        })
        .collect()
}

/// Restrict the returned document to the requested keys; the external
/// id is always included.
fn project(doc: &Document, retrievable: Option<&[String]>) -> Document {
    match retrievable {
        None => doc.clone(),
        Some(fields) => doc
            .iter()
            .filter(|(key, _)| key.as_str() == DOCUMENT_ID_KEY || fields.iter().any(|f| f == *key))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::index::indexer::Indexer;
    use crate::search::filter::{BoolOperator, FilterCondition, FilterExpression, FilterOperator};
    use serde_json::json;

    struct Fixture {
        settings: IndexSettings,
        index: InvertedIndex,
        store: DocumentStore,
        typos: TypoFinder,
    }

    impl Fixture {
        fn new(mut settings: IndexSettings, docs: Vec<Document>) -> Self {
            settings.apply_defaults();
            let mut index = InvertedIndex::new();
            let mut store = DocumentStore::new();
            Indexer::add_documents(&settings, &mut index, &mut store, docs).unwrap();
            let mut typos = TypoFinder::new();
            typos.update_corpus(index.tokens());
            Fixture {
                settings,
                index,
                store,
                typos,
            }
        }

        fn search(&self, query: &SearchQuery) -> Result<SearchResult> {
            Searcher::search(&self.settings, &self.index, &self.store, &self.typos, query)
        }

        fn hit_ids(&self, query: &SearchQuery) -> Vec<String> {
            self.search(query)
                .unwrap()
                .hits
                .iter()
                .map(|h| h.document["documentID"].as_str().unwrap().to_string())
                .collect()
        }
    }

    fn movie_settings() -> IndexSettings {
        let mut s = IndexSettings::new("movies");
        s.searchable_fields = vec!["title".to_string(), "description".to_string()];
        s
    }

    fn doc(pairs: &[(&str, serde_json::Value)]) -> Document {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn movies() -> Vec<Document> {
        vec![
            doc(&[
                ("documentID", json!("m1")),
                ("title", json!("The Matrix")),
                ("description", json!("programmer discovers reality")),
            ]),
            doc(&[
                ("documentID", json!("m2")),
                ("title", json!("Matrix Reloaded")),
                ("description", json!("sequel")),
            ]),
        ]
    }

    #[test]
    fn test_exact_match_ranks_both_movies() {
        let f = Fixture::new(movie_settings(), movies());
        let result = f.search(&SearchQuery::text("matrix")).unwrap();

        assert_eq!(result.total, 2);
        for hit in &result.hits {
            assert_eq!(hit.info.number_exact_words, 1);
            assert_eq!(hit.info.num_typos, 0);
            assert!(hit.info.field_matches["title"].contains(&"matrix".to_string()));
        }
    }

    #[test]
    fn test_typo_within_budget() {
        let f = Fixture::new(movie_settings(), movies());
        let result = f.search(&SearchQuery::text("matric")).unwrap();

        assert_eq!(result.total, 2, "DL(matric, matrix) = 1 with len 6 >= 4");
        for hit in &result.hits {
            assert_eq!(hit.info.num_typos, 1);
            assert_eq!(hit.info.number_exact_words, 0);
        }
    }

    #[test]
    fn test_prefix_match() {
        let f = Fixture::new(movie_settings(), movies());
        let result = f.search(&SearchQuery::text("mat")).unwrap();
        assert_eq!(result.total, 2);
        for hit in &result.hits {
            assert_eq!(hit.info.number_exact_words, 0);
            assert_eq!(hit.info.num_typos, 0);
        }
    }

    #[test]
    fn test_prefix_disabled_field() {
        let mut settings = movie_settings();
        settings.fields_without_prefix_search = vec!["title".to_string()];
        let f = Fixture::new(settings, movies());

        // No title prefix match; description has no token starting
        // with "mat" either.
        let result = f.search(&SearchQuery::text("mat")).unwrap();
        assert_eq!(result.total, 0);
    }

    #[test]
    fn test_exact_stage_wins_the_field() {
        // Once the exact stage matches in a field, prefix and typo
        // stages do not run for that field: a near-miss title cannot
        // ride along as a typo hit.
        let mut docs = movies();
        docs.push(doc(&[
            ("documentID", json!("m3")),
            ("title", json!("matric")),
        ]));
        let f = Fixture::new(movie_settings(), docs);

        let ids = f.hit_ids(&SearchQuery::text("matrix"));
        assert_eq!(ids.len(), 2);
        assert!(!ids.contains(&"m3".to_string()));
    }

    #[test]
    fn test_exact_hit_suppresses_typo_from_other_fields() {
        // m1 matches "matrix" exactly in the title; its description
        // only matches through the typo stage. The typo hit must not
        // count against a document that already matched exactly.
        let f = Fixture::new(
            movie_settings(),
            vec![doc(&[
                ("documentID", json!("m1")),
                ("title", json!("matrix")),
                ("description", json!("matrxx")),
            ])],
        );

        let result = f.search(&SearchQuery::text("matrix")).unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.hits[0].info.number_exact_words, 1);
        assert_eq!(result.hits[0].info.num_typos, 0);
    }

    #[test]
    fn test_every_token_must_match() {
        let f = Fixture::new(movie_settings(), movies());
        assert_eq!(f.hit_ids(&SearchQuery::text("matrix sequel")), vec!["m2"]);
        assert!(f.hit_ids(&SearchQuery::text("matrix unobtainium")).is_empty());
    }

    #[test]
    fn test_typo_thresholds_respect_word_length() {
        let f = Fixture::new(movie_settings(), movies());
        // len("mat") = 3 < minWordSizeFor1Typo, so "mta" gets no typo
        // stage and no prefix/exact hit exists for it.
        assert!(f.hit_ids(&SearchQuery::text("mta")).is_empty());
    }

    #[test]
    fn test_per_query_typo_override() {
        let f = Fixture::new(movie_settings(), movies());
        let mut query = SearchQuery::text("mtrx");
        assert!(f.hit_ids(&query).is_empty(), "distance 2 needs len >= 7 by default");

        query.min_word_size_for_1_typo = Some(2);
        query.min_word_size_for_2_typos = Some(3);
        let ids = f.hit_ids(&query);
        assert_eq!(ids.len(), 2, "override enables 2 typos for len 4");
    }

    #[test]
    fn test_non_typo_tolerant_words() {
        let mut settings = movie_settings();
        settings.non_typo_tolerant_words.insert("matric".to_string());
        let f = Fixture::new(settings, movies());
        assert!(f.hit_ids(&SearchQuery::text("matric")).is_empty());
    }

    #[test]
    fn test_no_typo_tolerance_fields() {
        let mut settings = movie_settings();
        settings.no_typo_tolerance_fields =
            vec!["title".to_string(), "description".to_string()];
        let f = Fixture::new(settings, movies());
        assert!(f.hit_ids(&SearchQuery::text("matric")).is_empty());
    }

    #[test]
    fn test_filter_or_with_scores_ranks_by_filters() {
        let mut settings = IndexSettings::new("items");
        settings.searchable_fields = vec!["name".to_string()];
        settings.filterable_fields = vec!["genre".to_string(), "rating".to_string()];
        settings.ranking_criteria = vec![RankingCriterion {
            field: "~filters".to_string(),
            order: SortOrder::Desc,
        }];
        let f = Fixture::new(
            settings,
            vec![
                doc(&[("documentID", json!("a")), ("genre", json!("Action")), ("rating", json!(8.5))]),
                doc(&[("documentID", json!("b")), ("genre", json!("Drama")), ("rating", json!(9.0))]),
            ],
        );

        let mut query = SearchQuery::text("");
        query.filters = Some(FilterExpression {
            operator: BoolOperator::Or,
            filters: vec![
                FilterCondition {
                    field: "genre".to_string(),
                    operator: FilterOperator::Exact,
                    value: json!("Action"),
                    score: 5.0,
                },
                FilterCondition {
                    field: "rating".to_string(),
                    operator: FilterOperator::GreaterThanOrEqual,
                    value: json!(9.0),
                    score: 2.0,
                },
            ],
            groups: Vec::new(),
        });

        let result = f.search(&query).unwrap();
        assert_eq!(result.total, 2);
        assert_eq!(result.hits[0].document["documentID"], json!("a"));
        assert_eq!(result.hits[0].info.filter_score, 5.0);
        assert_eq!(result.hits[1].info.filter_score, 2.0);
    }

    #[test]
    fn test_distinct_field_dedup() {
        let mut settings = movie_settings();
        settings.distinct_field = Some("series".to_string());
        let f = Fixture::new(
            settings,
            vec![
                doc(&[("documentID", json!("x")), ("title", json!("Matrix")), ("series", json!("s"))]),
                doc(&[("documentID", json!("y")), ("title", json!("Matrix 2")), ("series", json!("s"))]),
                doc(&[("documentID", json!("z")), ("title", json!("Matrix 3")), ("series", json!("t"))]),
            ],
        );

        let result = f.search(&SearchQuery::text("matrix")).unwrap();
        assert_eq!(result.total, 2, "one hit per distinct series value");

        let series: Vec<&str> = result
            .hits
            .iter()
            .map(|h| h.document["series"].as_str().unwrap())
            .collect();
        assert!(series.contains(&"s") && series.contains(&"t"));
    }

    #[test]
    fn test_ranking_criteria_are_lexicographic() {
        let mut settings = IndexSettings::new("items");
        settings.searchable_fields = vec!["name".to_string()];
        settings.ranking_criteria = vec![
            RankingCriterion { field: "year".to_string(), order: SortOrder::Asc },
            RankingCriterion { field: "rating".to_string(), order: SortOrder::Desc },
        ];
        let docs = vec![
            doc(&[("documentID", json!("a")), ("name", json!("item")), ("year", json!(2000)), ("rating", json!(5))]),
            doc(&[("documentID", json!("b")), ("name", json!("item")), ("year", json!(2000)), ("rating", json!(9))]),
            doc(&[("documentID", json!("c")), ("name", json!("item")), ("year", json!(1990)), ("rating", json!(1))]),
        ];
        let f = Fixture::new(settings.clone(), docs.clone());
        assert_eq!(f.hit_ids(&SearchQuery::text("item")), vec!["c", "b", "a"]);

        // Swapping a criterion's direction swaps the affected pair.
        settings.ranking_criteria[1].order = SortOrder::Asc;
        let f = Fixture::new(settings, docs);
        assert_eq!(f.hit_ids(&SearchQuery::text("item")), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_missing_ranking_field_sorts_last_in_both_directions() {
        let mut settings = IndexSettings::new("items");
        settings.searchable_fields = vec!["name".to_string()];
        settings.ranking_criteria = vec![RankingCriterion {
            field: "year".to_string(),
            order: SortOrder::Desc,
        }];
        let docs = vec![
            doc(&[("documentID", json!("a")), ("name", json!("item"))]),
            doc(&[("documentID", json!("b")), ("name", json!("item")), ("year", json!(1990))]),
        ];
        let f = Fixture::new(settings.clone(), docs.clone());
        assert_eq!(f.hit_ids(&SearchQuery::text("item")), vec!["b", "a"]);

        settings.ranking_criteria[0].order = SortOrder::Asc;
        let f = Fixture::new(settings, docs);
        assert_eq!(f.hit_ids(&SearchQuery::text("item")), vec!["b", "a"]);
    }

    #[test]
    fn test_proximity_bonus_prefers_adjacent_tokens() {
        let f = Fixture::new(
            movie_settings(),
            vec![
                doc(&[("documentID", json!("far")), ("title", json!("matrix of the old reloaded world"))]),
                doc(&[("documentID", json!("near")), ("title", json!("matrix reloaded"))]),
            ],
        );
        assert_eq!(
            f.hit_ids(&SearchQuery::text("matrix reloaded")),
            vec!["near", "far"]
        );
    }

    #[test]
    fn test_pagination_covers_all_hits_without_duplicates() {
        let docs: Vec<Document> = (0..25)
            .map(|i| doc(&[("documentID", json!(format!("m{:02}", i))), ("title", json!("matrix"))]))
            .collect();
        let f = Fixture::new(movie_settings(), docs);

        let mut collected = Vec::new();
        for page in 1..=3 {
            let mut query = SearchQuery::text("matrix");
            query.page = Some(page);
            let result = f.search(&query).unwrap();
            assert_eq!(result.total, 25);
            collected.extend(
                result
                    .hits
                    .iter()
                    .map(|h| h.document["documentID"].as_str().unwrap().to_string()),
            );
        }

        assert_eq!(collected.len(), 25);
        let unique: HashSet<&String> = collected.iter().collect();
        assert_eq!(unique.len(), 25);
    }

    #[test]
    fn test_restrict_searchable_fields() {
        let f = Fixture::new(movie_settings(), movies());

        let mut query = SearchQuery::text("sequel");
        query.restrict_searchable_fields = Some(vec!["title".to_string()]);
        assert!(f.hit_ids(&query).is_empty(), "sequel only appears in description");

        query.restrict_searchable_fields = Some(vec!["poster".to_string()]);
        assert_eq!(f.search(&query).unwrap_err().kind, ErrorKind::Validation);
    }

    #[test]
    fn test_projection_keeps_document_id() {
        let f = Fixture::new(movie_settings(), movies());
        let mut query = SearchQuery::text("matrix");
        query.retrievable_fields = Some(vec!["title".to_string()]);

        let result = f.search(&query).unwrap();
        for hit in &result.hits {
            assert!(hit.document.contains_key("documentID"));
            assert!(hit.document.contains_key("title"));
            assert!(!hit.document.contains_key("description"));
        }
    }

    #[test]
    fn test_empty_query_without_filters_lists_everything() {
        let f = Fixture::new(movie_settings(), movies());
        let result = f.search(&SearchQuery::text("")).unwrap();
        assert_eq!(result.total, 2);
    }
}
