use parking_lot::RwLock;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use crate::core::error::{Error, Result};
use crate::core::settings::IndexSettings;
use crate::core::stats::IndexStats;
use crate::core::types::Document;
use crate::index::indexer::Indexer;
use crate::index::inverted::InvertedIndex;
use crate::jobs::manager::JobContext;
use crate::query::types::{MultiSearchQuery, SearchQuery};
use crate::search::results::{MultiSearchResult, SearchResult};
use crate::search::searcher::Searcher;
use crate::search::typos::TypoFinder;
use crate::storage::document_store::DocumentStore;
use crate::storage::snapshot;

/// Everything one index owns, guarded as a unit: settings, inverted
/// index, document store, and the typo finder whose corpus mirrors the
/// index's token set.
pub struct IndexInner {
    pub settings: IndexSettings,
    pub index: InvertedIndex,
    pub store: DocumentStore,
    pub typos: TypoFinder,
}

/// One named index. Searches take the read lock and run concurrently;
/// every mutation takes the write lock, so jobs touching the same index
/// serialize here.
pub struct IndexInstance {
    inner: RwLock<IndexInner>,
}

impl IndexInstance {
    pub fn new(settings: IndexSettings) -> Self {
        IndexInstance {
            inner: RwLock::new(IndexInner {
                settings,
                index: InvertedIndex::new(),
                store: DocumentStore::new(),
                typos: TypoFinder::new(),
            }),
        }
    }

    /// Rebuild an instance from snapshot parts, re-seeding the typo
    /// corpus from the loaded index.
    pub fn from_parts(
        settings: IndexSettings,
        index: InvertedIndex,
        store: DocumentStore,
    ) -> Self {
        let mut typos = TypoFinder::new();
        typos.update_corpus(index.tokens());
        IndexInstance {
            inner: RwLock::new(IndexInner {
                settings,
                index,
                store,
                typos,
            }),
        }
    }

    pub fn settings(&self) -> IndexSettings {
        self.inner.read().settings.clone()
    }

    pub fn set_name(&self, name: &str) {
        self.inner.write().settings.name = name.to_string();
    }

    pub fn stats(&self) -> IndexStats {
        let inner = self.inner.read();
        IndexStats {
            name: inner.settings.name.clone(),
            document_count: inner.store.len(),
            term_count: inner.index.token_count(),
            searchable_fields: inner.settings.searchable_fields.clone(),
            filterable_fields: inner.settings.filterable_fields.clone(),
        }
    }

    pub fn search(&self, query: &SearchQuery) -> Result<SearchResult> {
        let inner = self.inner.read();
        Searcher::search(&inner.settings, &inner.index, &inner.store, &inner.typos, query)
    }

    /// Evaluate named sub-queries in parallel. Any failure fails the
    /// whole call.
    pub fn multi_search(&self, multi: &MultiSearchQuery) -> Result<MultiSearchResult> {
        multi.validate()?;
        let started = Instant::now();
        let inner = self.inner.read();

        let results: Result<HashMap<String, SearchResult>> = multi
            .queries
            .par_iter()
            .map(|named| {
                Searcher::search(
                    &inner.settings,
                    &inner.index,
                    &inner.store,
                    &inner.typos,
                    &named.query,
                )
                .map(|result| (named.name.clone(), result))
            })
            .collect();

        Ok(MultiSearchResult {
            results: results?,
            total_queries: multi.queries.len(),
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Index a batch under the write lock, reporting progress and
    /// honoring cancellation between sub-batches. The typo corpus is
    /// re-seeded before the lock is released.
    pub fn add_documents(&self, docs: Vec<Document>, ctx: Option<&JobContext>) -> Result<usize> {
        let mut inner = self.inner.write();
        let IndexInner {
            settings,
            index,
            store,
            typos,
        } = &mut *inner;

        let result = Indexer::add_documents_with(settings, index, store, docs, |done, total| {
            if let Some(ctx) = ctx {
                ctx.update_progress(done, total, "indexing documents");
                !ctx.is_cancelled()
            } else {
                true
            }
        });

        typos.update_corpus(index.tokens());
        result
    }

    pub fn delete_document(&self, external_id: &str) -> Result<()> {
        let mut inner = self.inner.write();
        let IndexInner { index, store, typos, .. } = &mut *inner;
        Indexer::delete_document(index, store, external_id)?;
        typos.update_corpus(index.tokens());
        Ok(())
    }

    pub fn delete_all_documents(&self) -> Result<()> {
        let mut inner = self.inner.write();
        let IndexInner { index, store, typos, .. } = &mut *inner;
        Indexer::delete_all(index, store);
        typos.update_corpus(index.tokens());
        Ok(())
    }

    pub fn get_document(&self, external_id: &str) -> Result<Document> {
        self.inner
            .read()
            .store
            .get_by_external(external_id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("document '{}' not found", external_id)))
    }

    /// Documents ordered by internal id, paginated.
    pub fn list_documents(&self, page: usize, page_size: usize) -> (Vec<Document>, usize) {
        let inner = self.inner.read();
        let all = inner.store.documents_by_id();
        let total = all.len();
        let docs = all
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .map(|(_, doc)| doc.clone())
            .collect();
        (docs, total)
    }

    /// Swap settings without touching the index; rebuilds the searcher
    /// state so new typo thresholds take effect.
    pub fn update_settings(&self, new_settings: IndexSettings) {
        let mut inner = self.inner.write();
        inner.settings = new_settings;
        let tokens = inner.index.tokens();
        inner.typos.update_corpus(tokens);
    }

    /// Full settings-induced rebuild: extract all documents, clear the
    /// index, swap settings, and re-index in cancellable batches.
    pub fn reindex(&self, new_settings: IndexSettings, ctx: Option<&JobContext>) -> Result<usize> {
        let mut inner = self.inner.write();
        let IndexInner {
            settings,
            index,
            store,
            typos,
        } = &mut *inner;

        let docs = store.all_documents();
        Indexer::delete_all(index, store);
        *settings = new_settings;

        let result = Indexer::add_documents_with(settings, index, store, docs, |done, total| {
            if let Some(ctx) = ctx {
                ctx.update_progress(done, total, "reindexing documents");
                !ctx.is_cancelled()
            } else {
                true
            }
        });

        typos.update_corpus(index.tokens());
        result
    }

    /// Persist the current state. Runs under the read lock.
    pub fn snapshot(&self, data_dir: &Path) -> Result<()> {
        let inner = self.inner.read();
        snapshot::save_index(data_dir, &inner.settings, &inner.index, &inner.store)
    }
}
