use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::core::error::{Error, Result};

/// Candidate count cap per lookup.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 500;

/// Wall-clock budget per lookup.
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_millis(50);

const CACHE_CAPACITY: usize = 1000;

type CacheKey = (String, usize);

/// Finds indexed terms within a bounded Damerau-Levenshtein distance of
/// a query term.
///
/// The corpus is a snapshot of the inverted index's token set; writers
/// re-seed it (invalidating the cache) before releasing the instance
/// write lock, so readers always see a corpus consistent with the index.
pub struct TypoFinder {
    corpus: Vec<String>,
    cache: Mutex<LruCache<CacheKey, Vec<String>>>,
}

impl TypoFinder {
    pub fn new() -> Self {
        TypoFinder {
            corpus: Vec::new(),
            cache: Mutex::new(LruCache::new(NonZeroUsize::new(CACHE_CAPACITY).unwrap())),
        }
    }

    /// Replace the indexed term set and drop all cached results.
    pub fn update_corpus(&mut self, terms: Vec<String>) {
        self.corpus = terms;
        self.cache.lock().clear();
    }

    pub fn corpus_len(&self) -> usize {
        self.corpus.len()
    }

    /// Indexed terms with distance to `query` in `[1, max_distance]`,
    /// stopping at the first of: `max_results` found, `time_limit`
    /// elapsed, or corpus exhausted. Result order is unspecified.
    pub fn candidates_within(
        &self,
        query: &str,
        max_distance: usize,
        max_results: usize,
        time_limit: Duration,
    ) -> Result<Vec<String>> {
        if max_distance < 1 {
            return Err(Error::validation(format!(
                "typo distance must be at least 1, got {}",
                max_distance
            )));
        }

        let key = (query.to_string(), max_distance);
        if let Some(cached) = self.cache.lock().get(&key) {
            return Ok(cached.clone());
        }

        let deadline = Instant::now() + time_limit;
        let mut found = Vec::new();

        for term in &self.corpus {
            if found.len() >= max_results {
                break;
            }
            if Instant::now() >= deadline {
                debug!(
                    query,
                    max_distance,
                    found = found.len(),
                    "typo candidate scan hit its time budget"
                );
                break;
            }
            // Cheap length pre-filter before the distance computation.
            if term.len().abs_diff(query.len()) > max_distance {
                continue;
            }
            if term == query {
                continue;
            }
            if damerau_levenshtein_bounded(query, term, max_distance) <= max_distance {
                found.push(term.clone());
            }
        }

        self.cache.lock().put(key, found.clone());
        Ok(found)
    }
}

impl Default for TypoFinder {
    fn default() -> Self {
        Self::new()
    }
}

/// Damerau-Levenshtein distance (adjacent transposition counts as one
/// edit), capped at `max`: returns `max + 1` as soon as a full matrix
/// row exceeds `max`. Three rows are kept because the transposition
/// case reaches back two rows.
pub fn damerau_levenshtein_bounded(a: &str, b: &str, max: usize) -> usize {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a == b {
        return 0;
    }
    if a.len().abs_diff(b.len()) > max {
        return max + 1;
    }
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let width = b.len() + 1;
    let mut prev2: Vec<usize> = vec![0; width];
    let mut prev: Vec<usize> = (0..width).collect();
    let mut curr: Vec<usize> = vec![0; width];

    for i in 1..=a.len() {
        curr[0] = i;
        let mut row_min = i;

        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut d = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);

            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                d = d.min(prev2[j - 2] + 1);
            }

            curr[j] = d;
            row_min = row_min.min(d);
        }

        if row_min > max {
            return max + 1;
        }

        std::mem::swap(&mut prev2, &mut prev);
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
