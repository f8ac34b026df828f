use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::error::{Error, Result};
use crate::core::settings::{requires_full_reindexing, IndexSettings, SettingsUpdate};
use crate::core::stats::IndexStats;
use crate::core::types::Document;
use crate::engine::instance::IndexInstance;
use crate::jobs::manager::JobManager;
use crate::jobs::job::JobType;
use crate::storage::snapshot;

/// Registry of named index instances. The registry lock is held only
/// while the map itself is mutated, never for the duration of a job;
/// per-index serialization is the instance's own write lock.
pub struct Engine {
    indexes: RwLock<HashMap<String, Arc<IndexInstance>>>,
    data_dir: PathBuf,
    jobs: Arc<JobManager>,
}

impl Engine {
    /// Open the data directory, loading every subdirectory as an index.
    /// A corrupted snapshot is logged and yields an empty index rather
    /// than aborting startup.
    pub fn new(data_dir: PathBuf) -> Result<Arc<Self>> {
        fs::create_dir_all(&data_dir)?;
        let indexes = load_all(&data_dir);
        info!(
            data_dir = %data_dir.display(),
            indexes = indexes.len(),
            "engine ready"
        );

        Ok(Arc::new(Engine {
            indexes: RwLock::new(indexes),
            data_dir,
            jobs: Arc::new(JobManager::new()),
        }))
    }

    pub fn jobs(&self) -> &Arc<JobManager> {
        &self.jobs
    }

    pub fn shutdown(&self) {
        self.jobs.shutdown();
    }

    pub fn get_index(&self, name: &str) -> Result<Arc<IndexInstance>> {
        self.indexes
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("index '{}' not found", name)))
    }

    pub fn list_indexes(&self) -> Vec<IndexSettings> {
        let mut settings: Vec<IndexSettings> = self
            .indexes
            .read()
            .values()
            .map(|i| i.settings())
            .collect();
        settings.sort_by(|a, b| a.name.cmp(&b.name));
        settings
    }

    pub fn get_settings(&self, name: &str) -> Result<IndexSettings> {
        Ok(self.get_index(name)?.settings())
    }

    pub fn get_stats(&self, name: &str) -> Result<IndexStats> {
        Ok(self.get_index(name)?.stats())
    }

    /// Create an index and snapshot it to disk.
    pub fn create_index(&self, mut settings: IndexSettings) -> Result<()> {
        settings.normalize()?;

        let instance = {
            let mut indexes = self.indexes.write();
            if indexes.contains_key(&settings.name) {
                return Err(Error::already_exists(format!(
                    "index '{}' already exists",
                    settings.name
                )));
            }
            let instance = Arc::new(IndexInstance::new(settings.clone()));
            indexes.insert(settings.name.clone(), instance.clone());
            instance
        };

        instance.snapshot(&self.data_dir)
    }

    pub fn delete_index(&self, name: &str) -> Result<()> {
        let removed = self.indexes.write().remove(name);
        if removed.is_none() {
            return Err(Error::not_found(format!("index '{}' not found", name)));
        }
        snapshot::remove_index_dir(&self.data_dir, name)
    }

    /// Move an index to a new name: persist under the new directory,
    /// remove the old one, roll the registry back on failure.
    pub fn rename_index(&self, old: &str, new: &str) -> Result<()> {
        if old == new {
            return Err(Error::conflict("the new index name equals the current name"));
        }

        let instance = {
            let mut indexes = self.indexes.write();
            if !indexes.contains_key(old) {
                return Err(Error::not_found(format!("index '{}' not found", old)));
            }
            if indexes.contains_key(new) {
                return Err(Error::already_exists(format!("index '{}' already exists", new)));
            }
            let instance = indexes.remove(old).unwrap();
            instance.set_name(new);
            indexes.insert(new.to_string(), instance.clone());
            instance
        };

        match instance.snapshot(&self.data_dir) {
            Ok(()) => {
                if let Err(e) = snapshot::remove_index_dir(&self.data_dir, old) {
                    warn!(index = old, error = %e, "failed to remove renamed index directory");
                }
                Ok(())
            }
            Err(e) => {
                // Restore the old mapping; never leave both names live.
                let mut indexes = self.indexes.write();
                indexes.remove(new);
                instance.set_name(old);
                indexes.insert(old.to_string(), instance);
                let _ = snapshot::remove_index_dir(&self.data_dir, new);
                Err(e)
            }
        }
    }

    pub fn create_index_async(self: &Arc<Self>, mut settings: IndexSettings) -> Result<Uuid> {
        settings.normalize()?;
        if self.indexes.read().contains_key(&settings.name) {
            return Err(Error::already_exists(format!(
                "index '{}' already exists",
                settings.name
            )));
        }

        let engine = self.clone();
        let name = settings.name.clone();
        self.jobs.submit(JobType::CreateIndex, &name, HashMap::new(), move |_ctx| {
            engine.create_index(settings)
        })
    }

    pub fn delete_index_async(self: &Arc<Self>, name: &str) -> Result<Uuid> {
        self.get_index(name)?;
        let engine = self.clone();
        let owned = name.to_string();
        self.jobs.submit(JobType::DeleteIndex, name, HashMap::new(), move |_ctx| {
            engine.delete_index(&owned)
        })
    }

    pub fn rename_index_async(self: &Arc<Self>, old: &str, new: &str) -> Result<Uuid> {
        if old == new {
            return Err(Error::conflict("the new index name equals the current name"));
        }
        self.get_index(old)?;
        if self.indexes.read().contains_key(new) {
            return Err(Error::already_exists(format!("index '{}' already exists", new)));
        }

        let engine = self.clone();
        let (old_owned, new_owned) = (old.to_string(), new.to_string());
        self.jobs.submit(JobType::RenameIndex, old, HashMap::new(), move |_ctx| {
            engine.rename_index(&old_owned, &new_owned)
        })
    }

    /// Enqueue an indexing job. Returns the job id and the batch size
    /// is recorded in the job metadata.
    pub fn add_documents_async(self: &Arc<Self>, name: &str, docs: Vec<Document>) -> Result<Uuid> {
        let instance = self.get_index(name)?;
        let mut metadata = HashMap::new();
        metadata.insert("documentCount".to_string(), serde_json::json!(docs.len()));

        let engine = self.clone();
        self.jobs.submit(JobType::AddDocuments, name, metadata, move |ctx| {
            instance.add_documents(docs, Some(ctx))?;
            engine.persist(&instance)
        })
    }

    pub fn delete_document_async(self: &Arc<Self>, name: &str, doc_id: &str) -> Result<Uuid> {
        let instance = self.get_index(name)?;
        // Surface DOCUMENT_NOT_FOUND before enqueueing anything.
        instance.get_document(doc_id)?;

        let engine = self.clone();
        let doc_id = doc_id.to_string();
        self.jobs.submit(JobType::DeleteDocument, name, HashMap::new(), move |_ctx| {
            instance.delete_document(&doc_id)?;
            engine.persist(&instance)
        })
    }

    pub fn delete_all_documents_async(self: &Arc<Self>, name: &str) -> Result<Uuid> {
        let instance = self.get_index(name)?;
        let engine = self.clone();
        self.jobs.submit(JobType::DeleteAllDocuments, name, HashMap::new(), move |_ctx| {
            instance.delete_all_documents()?;
            engine.persist(&instance)
        })
    }

    /// Apply a partial settings update. Returns the job id and whether
    /// the change requires a full reindex.
    pub fn update_index_settings_async(
        self: &Arc<Self>,
        name: &str,
        update: SettingsUpdate,
    ) -> Result<(Uuid, bool)> {
        let instance = self.get_index(name)?;
        let current = instance.settings();
        let mut merged = update.merged_into(&current);
        merged.name = current.name.clone();
        merged.normalize()?;

        let reindexing = requires_full_reindexing(&current, &merged);
        let job_type = if reindexing { JobType::Reindex } else { JobType::UpdateSettings };

        let engine = self.clone();
        let job_id = self.jobs.submit(job_type, name, HashMap::new(), move |ctx| {
            if reindexing {
                instance.reindex(merged, Some(ctx))?;
            } else {
                instance.update_settings(merged);
            }
            engine.persist(&instance)
        })?;

        Ok((job_id, reindexing))
    }

    /// Snapshot after a mutation. By the time this fails the in-memory
    /// state has already changed, so the failure is critical: the job
    /// fails and recovery relies on the next successful snapshot.
    fn persist(&self, instance: &Arc<IndexInstance>) -> Result<()> {
        instance.snapshot(&self.data_dir).map_err(|e| {
            error!(
                index = %instance.settings().name,
                error = %e,
                "snapshot failed after in-memory mutation"
            );
            e
        })
    }
}

fn load_all(data_dir: &PathBuf) -> HashMap<String, Arc<IndexInstance>> {
    let mut indexes = HashMap::new();
    let Ok(entries) = fs::read_dir(data_dir) else {
        return indexes;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();

        let instance = match snapshot::load_index(&path) {
            Ok((mut settings, index, store)) => {
                settings.name = name.clone();
                info!(index = %name, documents = store.len(), "loaded index snapshot");
                IndexInstance::from_parts(settings, index, store)
            }
            Err(e) => {
                warn!(index = %name, error = %e, "corrupted snapshot, starting index empty");
                let settings = load_settings_or_default(&path, &name);
                IndexInstance::new(settings)
            }
        };
        indexes.insert(name, Arc::new(instance));
    }
    indexes
}

/// Salvage the settings file when the binary snapshot files are bad.
fn load_settings_or_default(path: &std::path::Path, name: &str) -> IndexSettings {
    fs::read(path.join(snapshot::SETTINGS_FILE))
        .ok()
        .and_then(|bytes| serde_json::from_slice::<IndexSettings>(&bytes).ok())
        .map(|mut settings| {
            settings.name = name.to_string();
            settings
        })
        .unwrap_or_else(|| IndexSettings::new(name))
}
