use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelling,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }

    pub fn parse(s: &str) -> Option<JobStatus> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "running" => Some(JobStatus::Running),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            "cancelling" => Some(JobStatus::Cancelling),
            "cancelled" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    CreateIndex,
    DeleteIndex,
    RenameIndex,
    AddDocuments,
    DeleteDocument,
    DeleteAllDocuments,
    UpdateSettings,
    Reindex,
}

/// Best-effort progress snapshot, overwritten by the running job.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobProgress {
    pub current: usize,
    pub total: usize,
    pub message: String,
}

/// Handle to one background mutating operation. Terminal jobs stay
/// queryable until evicted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub index_name: String,
    pub status: JobStatus,
    pub progress: JobProgress,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Job {
    pub fn new(job_type: JobType, index_name: impl Into<String>) -> Self {
        Job {
            id: Uuid::new_v4(),
            job_type,
            index_name: index_name.into(),
            status: JobStatus::Pending,
            progress: JobProgress::default(),
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            metadata: HashMap::new(),
        }
    }
}
