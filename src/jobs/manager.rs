use chrono::Utc;
use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::error::{Error, ErrorKind, Result};
use crate::jobs::job::{Job, JobStatus, JobType};

/// Terminal jobs retained for status queries before eviction kicks in.
const MAX_TERMINAL_JOBS: usize = 1000;

type JobFn = Box<dyn FnOnce(&JobContext) -> Result<()> + Send + 'static>;

struct WorkItem {
    job_id: Uuid,
    work: JobFn,
}

/// State shared between the manager, its workers, and job contexts.
struct Shared {
    jobs: RwLock<HashMap<Uuid, Job>>,
    cancel_flags: RwLock<HashMap<Uuid, Arc<AtomicBool>>>,
    jobs_created: AtomicU64,
    jobs_completed: AtomicU64,
    jobs_failed: AtomicU64,
    jobs_cancelled: AtomicU64,
    current_workload: AtomicU64,
}

/// Cancellation and progress handle passed to every job function.
/// Jobs poll `is_cancelled` at sub-batch boundaries; cancellation is
/// cooperative.
pub struct JobContext {
    job_id: Uuid,
    cancel: Arc<AtomicBool>,
    shared: Arc<Shared>,
}

impl JobContext {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Overwrite the job's progress snapshot. Best-effort: unknown job
    /// ids are ignored.
    pub fn update_progress(&self, current: usize, total: usize, message: &str) {
        if let Some(job) = self.shared.jobs.write().get_mut(&self.job_id) {
            job.progress.current = current;
            job.progress.total = total;
            job.progress.message = message.to_string();
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMetrics {
    pub jobs_created: u64,
    pub jobs_completed: u64,
    pub jobs_failed: u64,
    pub jobs_cancelled: u64,
    pub current_workload: u64,
    pub success_rate: f64,
}

/// Bounded worker pool executing mutating operations FIFO. Jobs on the
/// same index are not serialized here; the index instance's write lock
/// is what serializes mutation.
pub struct JobManager {
    shared: Arc<Shared>,
    sender: Mutex<Option<Sender<WorkItem>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl JobManager {
    pub fn new() -> Self {
        Self::with_workers(default_worker_count())
    }

    pub fn with_workers(worker_count: usize) -> Self {
        let shared = Arc::new(Shared {
            jobs: RwLock::new(HashMap::new()),
            cancel_flags: RwLock::new(HashMap::new()),
            jobs_created: AtomicU64::new(0),
            jobs_completed: AtomicU64::new(0),
            jobs_failed: AtomicU64::new(0),
            jobs_cancelled: AtomicU64::new(0),
            current_workload: AtomicU64::new(0),
        });

        let (sender, receiver) = unbounded::<WorkItem>();
        let workers = (0..worker_count)
            .map(|i| {
                let receiver = receiver.clone();
                let shared = shared.clone();
                std::thread::Builder::new()
                    .name(format!("findex-job-{}", i))
                    .spawn(move || worker_loop(receiver, shared))
                    .expect("failed to spawn job worker")
            })
            .collect();

        JobManager {
            shared,
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
        }
    }

    /// Enqueue a job and hand the work function to the pool. Returns
    /// the job id immediately.
    pub fn submit<F>(
        &self,
        job_type: JobType,
        index_name: &str,
        metadata: HashMap<String, serde_json::Value>,
        work: F,
    ) -> Result<Uuid>
    where
        F: FnOnce(&JobContext) -> Result<()> + Send + 'static,
    {
        let mut job = Job::new(job_type, index_name);
        job.metadata = metadata;
        let job_id = job.id;

        let evicted = {
            let mut jobs = self.shared.jobs.write();
            let evicted = evict_terminal(&mut jobs);
            jobs.insert(job_id, job);
            evicted
        };
        {
            let mut flags = self.shared.cancel_flags.write();
            for id in evicted {
                flags.remove(&id);
            }
            flags.insert(job_id, Arc::new(AtomicBool::new(false)));
        }
        self.shared.jobs_created.fetch_add(1, Ordering::Relaxed);

        let sender = self.sender.lock();
        match sender.as_ref() {
            Some(sender) => {
                sender
                    .send(WorkItem {
                        job_id,
                        work: Box::new(work),
                    })
                    .map_err(|_| Error::internal("job queue is closed"))?;
                Ok(job_id)
            }
            None => Err(Error::conflict("job manager is shutting down")),
        }
    }

    pub fn get_job(&self, job_id: Uuid) -> Option<Job> {
        self.shared.jobs.read().get(&job_id).cloned()
    }

    /// Jobs for one index, optionally restricted to a status, newest
    /// first.
    pub fn list_jobs(&self, index_name: &str, status: Option<JobStatus>) -> Vec<Job> {
        let mut jobs: Vec<Job> = self
            .shared
            .jobs
            .read()
            .values()
            .filter(|j| j.index_name == index_name)
            .filter(|j| status.is_none_or(|s| j.status == s))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    /// Request cancellation: a pending job is cancelled outright, a
    /// running job transitions to cancelling and its handle is
    /// signalled.
    pub fn cancel(&self, job_id: Uuid) -> Result<JobStatus> {
        let mut jobs = self.shared.jobs.write();
        let job = jobs
            .get_mut(&job_id)
            .ok_or_else(|| Error::not_found(format!("job '{}' not found", job_id)))?;

        match job.status {
            JobStatus::Pending => {
                job.status = JobStatus::Cancelled;
                job.completed_at = Some(Utc::now());
                if let Some(flag) = self.shared.cancel_flags.read().get(&job_id) {
                    flag.store(true, Ordering::Relaxed);
                }
                self.shared.jobs_cancelled.fetch_add(1, Ordering::Relaxed);
                Ok(JobStatus::Cancelled)
            }
            JobStatus::Running => {
                job.status = JobStatus::Cancelling;
                if let Some(flag) = self.shared.cancel_flags.read().get(&job_id) {
                    flag.store(true, Ordering::Relaxed);
                }
                Ok(JobStatus::Cancelling)
            }
            status => Err(Error::conflict(format!(
                "job '{}' is already {:?}",
                job_id, status
            ))),
        }
    }

    pub fn metrics(&self) -> JobMetrics {
        let completed = self.shared.jobs_completed.load(Ordering::Relaxed);
        let failed = self.shared.jobs_failed.load(Ordering::Relaxed);
        let denominator = completed + failed;
        let success_rate = if denominator == 0 {
            1.0
        } else {
            completed as f64 / denominator as f64
        };

        JobMetrics {
            jobs_created: self.shared.jobs_created.load(Ordering::Relaxed),
            jobs_completed: completed,
            jobs_failed: failed,
            jobs_cancelled: self.shared.jobs_cancelled.load(Ordering::Relaxed),
            current_workload: self.shared.current_workload.load(Ordering::Relaxed),
            success_rate,
        }
    }

    /// Close the queue and drain the workers.
    pub fn shutdown(&self) {
        self.sender.lock().take();
        for handle in self.workers.lock().drain(..) {
            let _ = handle.join();
        }
    }
}

impl Default for JobManager {
    fn default() -> Self {
        Self::new()
    }
}

pub fn default_worker_count() -> usize {
    (num_cpus::get() * 2).clamp(4, 16)
}

fn worker_loop(receiver: Receiver<WorkItem>, shared: Arc<Shared>) {
    while let Ok(item) = receiver.recv() {
        let cancel = shared
            .cancel_flags
            .read()
            .get(&item.job_id)
            .cloned()
            .unwrap_or_else(|| Arc::new(AtomicBool::new(false)));

        // Cancelled while still queued: skip without running.
        {
            let mut jobs = shared.jobs.write();
            let Some(job) = jobs.get_mut(&item.job_id) else { continue };
            if job.status != JobStatus::Pending {
                continue;
            }
            job.status = JobStatus::Running;
            job.started_at = Some(Utc::now());
        }

        shared.current_workload.fetch_add(1, Ordering::Relaxed);
        let ctx = JobContext {
            job_id: item.job_id,
            cancel: cancel.clone(),
            shared: shared.clone(),
        };
        let result = (item.work)(&ctx);
        shared.current_workload.fetch_sub(1, Ordering::Relaxed);

        let mut jobs = shared.jobs.write();
        let Some(job) = jobs.get_mut(&item.job_id) else { continue };
        job.completed_at = Some(Utc::now());

        let was_cancelling = job.status == JobStatus::Cancelling;
        match result {
            Err(e) if e.kind == ErrorKind::Cancelled => {
                job.status = JobStatus::Cancelled;
                shared.jobs_cancelled.fetch_add(1, Ordering::Relaxed);
                debug!(job_id = %item.job_id, "job cancelled");
            }
            Err(e) => {
                job.status = JobStatus::Failed;
                job.error = Some(e.to_string());
                shared.jobs_failed.fetch_add(1, Ordering::Relaxed);
                warn!(job_id = %item.job_id, error = %e, "job failed");
            }
            Ok(()) if was_cancelling => {
                job.status = JobStatus::Cancelled;
                shared.jobs_cancelled.fetch_add(1, Ordering::Relaxed);
            }
            Ok(()) => {
                job.status = JobStatus::Completed;
                shared.jobs_completed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Drop the oldest terminal jobs beyond the retention cap, returning
/// the evicted ids. Live jobs are never evicted.
fn evict_terminal(jobs: &mut HashMap<Uuid, Job>) -> Vec<Uuid> {
    let mut terminal: Vec<(Uuid, chrono::DateTime<Utc>)> = jobs
        .values()
        .filter(|j| j.status.is_terminal())
        .map(|j| (j.id, j.completed_at.unwrap_or(j.created_at)))
        .collect();
    if terminal.len() <= MAX_TERMINAL_JOBS {
        return Vec::new();
    }

    terminal.sort_by_key(|(_, at)| *at);
    let excess = terminal.len() - MAX_TERMINAL_JOBS;
    let evicted: Vec<Uuid> = terminal.into_iter().take(excess).map(|(id, _)| id).collect();
    for id in &evicted {
        jobs.remove(id);
    }
    evicted
}
