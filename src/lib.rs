pub mod analysis;
pub mod core;
pub mod engine;
pub mod http;
pub mod index;
pub mod jobs;
pub mod query;
pub mod search;
pub mod storage;

/*
┌──────────────────────────────────────────────────────────────────────────┐
│                         FINDEX STRUCT ARCHITECTURE                        │
└──────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── ENGINE LAYER ────────────────────────────┐
│                                                                           │
│  ┌─────────────────────────────────────────────────────────────────┐    │
│  │                        struct Engine                             │    │
│  │  indexes: RwLock<HashMap<String, Arc<IndexInstance>>>           │    │
│  │  data_dir: PathBuf              // snapshot root                │    │
│  │  jobs: Arc<JobManager>          // bounded worker pool          │    │
│  └─────────────────────────────────────────────────────────────────┘    │
│                                                                           │
│  ┌──────────────────────────┐   ┌──────────────────────────────────┐    │
│  │ struct IndexInstance     │   │ struct JobManager                │    │
│  │ • inner: RwLock<...>     │   │ • jobs: RwLock<HashMap<Uuid,Job>>│    │
│  │   settings               │   │ • cancel_flags per job           │    │
│  │   index: InvertedIndex   │   │ • crossbeam FIFO channel         │    │
│  │   store: DocumentStore   │   │ • 2·CPU workers, clamped [4,16]  │    │
│  │   typos: TypoFinder      │   │ • metrics: AtomicU64 counters    │    │
│  └──────────────────────────┘   └──────────────────────────────────┘    │
└───────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── SEARCH LAYER ────────────────────────────┐
│                                                                           │
│  ┌──────────────────────┐  ┌──────────────────────┐  ┌───────────────┐  │
│  │ struct Searcher      │  │ struct TypoFinder    │  │ FilterExpr    │  │
│  │ • staged matching:   │  │ • corpus: Vec<String>│  │ • AND/OR tree │  │
│  │   exact→prefix→typo  │  │ • LruCache results   │  │ • leaf ops    │  │
│  │ • ranking criteria   │  │ • bounded DL distance│  │ • filter score│  │
│  │ • distinct dedup     │  │ • 50ms scan budget   │  └───────────────┘  │
│  └──────────────────────┘  └──────────────────────┘                     │
└───────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── INDEX LAYER ─────────────────────────────┐
│                                                                           │
│  ┌──────────────────────┐  ┌──────────────────────┐  ┌───────────────┐  │
│  │ struct InvertedIndex │  │ struct DocumentStore │  │ struct Posting│  │
│  │ • token → postings   │  │ • id ↔ documentID    │  │ • doc_id      │  │
│  │ • whole words +      │  │ • next_id: u32       │  │ • field, tf   │  │
│  │   prefix n-grams     │  │   (monotone)         │  │ • positions   │  │
│  └──────────────────────┘  └──────────────────────┘  │ • is_full_word│  │
│                                                       └───────────────┘  │
│  Indexer ── tokenize(camel split, lowercase, [a-z0-9] runs) ──>          │
│             postings per searchable field, upsert by documentID          │
└───────────────────────────────────────────────────────────────────────────┘

  HTTP (axum) ──> Engine ──> IndexInstance ──> Searcher ──> ranked hits
  mutations  ──> Engine ──> JobManager ──> worker ──> Indexer ──> snapshot
*/
