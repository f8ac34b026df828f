use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::Error;
use crate::core::settings::{IndexSettings, SettingsUpdate};
use crate::core::types::Document;
use crate::engine::engine::Engine;
use crate::http::error::{ApiError, ApiResult};
use crate::jobs::job::JobStatus;
use crate::query::types::{MultiSearchQuery, SearchQuery, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn create_index(
    State(engine): State<Arc<Engine>>,
    Json(settings): Json<IndexSettings>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let job_id = engine.create_index_async(settings)?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "job_id": job_id }))))
}

pub async fn list_indexes(State(engine): State<Arc<Engine>>) -> Json<Value> {
    let indexes = engine.list_indexes();
    Json(json!({ "count": indexes.len(), "indexes": indexes }))
}

pub async fn get_index(
    State(engine): State<Arc<Engine>>,
    Path(name): Path<String>,
) -> ApiResult<Json<IndexSettings>> {
    Ok(Json(engine.get_settings(&name)?))
}

pub async fn delete_index(
    State(engine): State<Arc<Engine>>,
    Path(name): Path<String>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let job_id = engine.delete_index_async(&name)?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "job_id": job_id }))))
}

pub async fn update_settings(
    State(engine): State<Arc<Engine>>,
    Path(name): Path<String>,
    Json(update): Json<SettingsUpdate>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let (job_id, reindexing) = engine.update_index_settings_async(&name, update)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "job_id": job_id, "reindexing_required": reindexing })),
    ))
}

#[derive(Deserialize)]
pub struct RenameRequest {
    pub new_name: String,
}

pub async fn rename_index(
    State(engine): State<Arc<Engine>>,
    Path(name): Path<String>,
    Json(request): Json<RenameRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let job_id = engine.rename_index_async(&name, &request.new_name)?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "job_id": job_id }))))
}

pub async fn get_stats(
    State(engine): State<Arc<Engine>>,
    Path(name): Path<String>,
) -> ApiResult<Json<crate::core::stats::IndexStats>> {
    Ok(Json(engine.get_stats(&name)?))
}

/// Accepts a single document object or an array of documents.
pub async fn put_documents(
    State(engine): State<Arc<Engine>>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let docs = parse_documents(body)?;
    let count = docs.len();
    let job_id = engine.add_documents_async(&name, docs)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "job_id": job_id, "document_count": count })),
    ))
}

fn parse_documents(body: Value) -> ApiResult<Vec<Document>> {
    let into_doc = |value: Value| -> ApiResult<Document> {
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            _ => Err(ApiError::from(Error::validation(
                "documents must be JSON objects",
            ))
            .with_code("INVALID_REQUEST")),
        }
    };

    match body {
        Value::Array(items) => items.into_iter().map(into_doc).collect(),
        other => Ok(vec![into_doc(other)?]),
    }
}

#[derive(Deserialize)]
pub struct Pagination {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl Pagination {
    fn resolve(&self) -> ApiResult<(usize, usize)> {
        let page = match self.page {
            None => 1,
            Some(0) => return Err(Error::validation("page must be at least 1").into()),
            Some(p) => p,
        };
        let page_size = match self.page_size {
            None => DEFAULT_PAGE_SIZE,
            Some(0) => return Err(Error::validation("page_size must be at least 1").into()),
            Some(s) if s > MAX_PAGE_SIZE => {
                return Err(Error::validation(format!(
                    "page_size must not exceed {}",
                    MAX_PAGE_SIZE
                ))
                .into())
            }
            Some(s) => s,
        };
        Ok((page, page_size))
    }
}

pub async fn list_documents(
    State(engine): State<Arc<Engine>>,
    Path(name): Path<String>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<Value>> {
    let (page, page_size) = pagination.resolve()?;
    let instance = engine.get_index(&name)?;
    let (documents, total) = instance.list_documents(page, page_size);
    Ok(Json(json!({
        "documents": documents,
        "total": total,
        "page": page,
        "pageSize": page_size,
    })))
}

pub async fn delete_all_documents(
    State(engine): State<Arc<Engine>>,
    Path(name): Path<String>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let job_id = engine.delete_all_documents_async(&name)?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "job_id": job_id }))))
}

pub async fn get_document(
    State(engine): State<Arc<Engine>>,
    Path((name, doc_id)): Path<(String, String)>,
) -> ApiResult<Json<Document>> {
    Ok(Json(engine.get_index(&name)?.get_document(&doc_id)?))
}

pub async fn delete_document(
    State(engine): State<Arc<Engine>>,
    Path((name, doc_id)): Path<(String, String)>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let job_id = engine.delete_document_async(&name, &doc_id)?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "job_id": job_id }))))
}

/// Searches run on the blocking pool so a slow scan cannot stall the
/// async runtime.
pub async fn search(
    State(engine): State<Arc<Engine>>,
    Path(name): Path<String>,
    Json(query): Json<SearchQuery>,
) -> ApiResult<Json<crate::search::results::SearchResult>> {
    let instance = engine.get_index(&name)?;
    let result = tokio::task::spawn_blocking(move || instance.search(&query))
        .await
        .map_err(|e| ApiError::from(Error::internal(format!("search task failed: {}", e))))?
        .map_err(search_error)?;
    Ok(Json(result))
}

pub async fn multi_search(
    State(engine): State<Arc<Engine>>,
    Path(name): Path<String>,
    Json(multi): Json<MultiSearchQuery>,
) -> ApiResult<Json<crate::search::results::MultiSearchResult>> {
    let instance = engine.get_index(&name)?;
    let result = tokio::task::spawn_blocking(move || instance.multi_search(&multi))
        .await
        .map_err(|e| ApiError::from(Error::internal(format!("search task failed: {}", e))))?
        .map_err(|e| {
            let api: ApiError = e.into();
            if api.status == StatusCode::BAD_REQUEST {
                api.with_code("INVALID_QUERY")
            } else {
                api
            }
        })?;
    Ok(Json(result))
}

fn search_error(err: Error) -> ApiError {
    let api: ApiError = err.into();
    if api.status == StatusCode::INTERNAL_SERVER_ERROR {
        api.with_code("SEARCH_FAILED")
    } else {
        api
    }
}

pub async fn get_job(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<String>,
) -> ApiResult<Json<crate::jobs::job::Job>> {
    let job_id = parse_job_id(&id)?;
    engine
        .jobs()
        .get_job(job_id)
        .map(Json)
        .ok_or_else(|| Error::not_found(format!("job '{}' not found", id)).into())
}

pub async fn cancel_job(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let job_id = parse_job_id(&id)?;
    let status = engine.jobs().cancel(job_id)?;
    Ok(Json(json!({ "job_id": job_id, "status": status })))
}

fn parse_job_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id)
        .map_err(|_| Error::validation(format!("'{}' is not a valid job id", id)).into())
}

#[derive(Deserialize)]
pub struct JobsFilter {
    pub status: Option<String>,
}

pub async fn list_index_jobs(
    State(engine): State<Arc<Engine>>,
    Path(name): Path<String>,
    Query(filter): Query<JobsFilter>,
) -> ApiResult<Json<Value>> {
    let status = match filter.status.as_deref() {
        None | Some("") => None,
        Some(s) => Some(
            JobStatus::parse(s)
                .ok_or_else(|| ApiError::from(Error::validation(format!("unknown job status '{}'", s))))?,
        ),
    };

    let jobs = engine.jobs().list_jobs(&name, status);
    Ok(Json(json!({ "total": jobs.len(), "jobs": jobs })))
}

pub async fn job_metrics(State(engine): State<Arc<Engine>>) -> Json<crate::jobs::manager::JobMetrics> {
    Json(engine.jobs().metrics())
}
