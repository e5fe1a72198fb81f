//! Job submission, status and log handlers.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use tubedl_jobs::{logs, status, JobError, LIST_TAIL_LINES, STATUS_TAIL_LINES};
use tubedl_models::{JobId, JobStatus};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Request body for starting a download job.
#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    /// Media URL to hand to the downloader
    pub url: Option<String>,
    /// Output directory; server default when omitted
    pub output: Option<String>,
}

/// Response for an accepted download job.
#[derive(Debug, Serialize)]
pub struct DownloadAccepted {
    pub job_id: String,
    pub pid: u32,
}

/// Response for the bulk job listing.
#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobStatus>,
}

/// Verify the external tools a job needs are on PATH.
///
/// Runs before every spawn, as tools can disappear between requests
/// (container rebuilds, PATH changes). Collects all missing tools so the
/// client sees the full picture at once.
fn check_dependencies(required: &[String]) -> Result<(), ApiError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|tool| which::which(tool).is_err())
        .map(|tool| format!("{tool} not found"))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::MissingDependencies(missing))
    }
}

/// Job ids name directories under the jobs root; reject anything that could
/// escape it. Legitimate ids are UUIDs.
fn parse_job_id(raw: &str) -> ApiResult<JobId> {
    if raw.is_empty()
        || raw == "."
        || raw == ".."
        || raw.contains('/')
        || raw.contains('\\')
        || raw.contains('\0')
    {
        return Err(ApiError::not_found(format!("job not found: {raw}")));
    }
    Ok(JobId::from_string(raw))
}

/// `POST /download` — start a background download job.
pub async fn start_download(
    State(state): State<AppState>,
    Json(req): Json<DownloadRequest>,
) -> ApiResult<(StatusCode, Json<DownloadAccepted>)> {
    let url = match req.url.as_deref() {
        Some(url) if !url.trim().is_empty() => url.trim().to_string(),
        _ => return Err(ApiError::bad_request("missing url parameter")),
    };

    check_dependencies(&state.config.required_tools)?;

    let output_dir = req
        .output
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| state.config.output_dir.clone());
    tokio::fs::create_dir_all(&output_dir)
        .await
        .map_err(|e| ApiError::internal(format!("cannot create output dir: {e}")))?;

    let argv = vec![
        state.config.downloader_bin.clone(),
        url.clone(),
        "-o".to_string(),
        output_dir.to_string_lossy().into_owned(),
    ];

    let (job_id, pid) = state.registry.create(argv).await?;
    info!(job_id = %job_id, pid, url = %url, "download job accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(DownloadAccepted {
            job_id: job_id.to_string(),
            pid,
        }),
    ))
}

/// `GET /status/{job_id}` — status plus a bounded log tail.
pub async fn job_status(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<JobStatus>> {
    let job_id = parse_job_id(&raw_id)?;
    let job = status::resolve(&state.registry, &job_id, STATUS_TAIL_LINES).await?;
    Ok(Json(job))
}

/// `GET /logs/{job_id}` — the raw captured log, as plain text.
pub async fn job_log(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Response> {
    let job_id = parse_job_id(&raw_id)?;
    let job_dir = state.registry.job_dir(&job_id);

    let bytes = logs::read_all(&job_dir)
        .await?
        .ok_or_else(|| ApiError::from(JobError::LogMissing(job_id.to_string())))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        bytes,
    )
        .into_response())
}

/// `GET /jobs` — list every job, sorted by id, with short log tails.
pub async fn list_jobs(State(state): State<AppState>) -> ApiResult<Json<JobListResponse>> {
    let jobs = status::list(&state.registry, LIST_TAIL_LINES).await?;
    Ok(Json(JobListResponse { jobs }))
}
