//! One handler per route. Each calls a single compiler and serializes what
//! it returns; filesystem work runs on the blocking pool.

use crate::{
    error::ApiError,
    router::AppState,
};
use axum::{
    body::{
        Body,
        Bytes,
    },
    extract::{
        rejection::QueryRejection,
        Path,
        Query,
        State,
    },
    http::header,
    response::{
        IntoResponse,
        Response,
    },
    Json,
};
use serde::{
    Deserialize,
    Serialize,
};
use sync_status_collector::{
    compilers::{
        self,
        snapshot,
        storage,
        BackupRecord,
        LogView,
        StatusReport,
        StatusSnapshot,
        StorageReport,
        SyncRecord,
        UserRecord,
    },
    format::format_bytes,
    probes::{
        logs::DailyCount,
        LogKind,
        SystemProbe,
        SystemStats,
    },
    state,
    ActionResult,
};
use sync_status_config::FeatureFlags;
use tokio_util::io::ReaderStream;

type ApiResult<T> = Result<Json<T>, ApiError>;

async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await?)
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<StatusSnapshot> {
    Ok(Json(
        blocking(move || snapshot::compile(&state.config, &state.backups)).await?,
    ))
}

pub async fn status(State(state): State<AppState>) -> ApiResult<StatusReport> {
    Ok(Json(
        blocking(move || snapshot::report(&state.config, &state.backups)).await?,
    ))
}

pub async fn users(State(state): State<AppState>) -> ApiResult<Vec<UserRecord>> {
    let state_dir = state.config.state_dir().to_path_buf();
    let names = blocking(move || state::users(&state_dir)).await?;
    Ok(Json(compilers::compile_users(state.config.data_dir(), &names).await))
}

pub async fn storage(State(state): State<AppState>) -> ApiResult<StorageReport> {
    let config = state.config.clone();
    let breakdown = blocking(move || {
        let users = state::users(config.state_dir());
        storage::breakdown(config.data_dir(), config.backup_dir(), config.log_dir(), &users)
    })
    .await?;
    Ok(Json(breakdown.report()))
}

pub async fn list_backups(State(state): State<AppState>) -> ApiResult<Vec<BackupRecord>> {
    Ok(Json(blocking(move || state.backups.list()).await?))
}

pub async fn create_backup(State(state): State<AppState>) -> Json<ActionResult> {
    Json(state.backups.create().await)
}

pub async fn download_backup(State(state): State<AppState>, Path(name): Path<String>) -> Result<Response, ApiError> {
    let archive = state.backups.open(&name).await?;
    info!(archive = %archive.filename, bytes = archive.len, "streaming backup");

    let headers = [
        (header::CONTENT_TYPE, "application/gzip".to_string()),
        (header::CONTENT_LENGTH, archive.len.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", archive.filename),
        ),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(archive.file))).into_response())
}

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    lines: Option<usize>,
}

pub async fn logs(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    query: Result<Query<LogQuery>, QueryRejection>,
) -> ApiResult<LogView> {
    let kind: LogKind = kind.parse().map_err(|_| ApiError::InvalidLogType(kind))?;
    let Query(query) = query?;
    let lines = compilers::line_limit(&state.config.logs, query.lines);

    Ok(Json(
        blocking(move || compilers::log_view(state.config.log_dir(), kind, lines)).await?,
    ))
}

pub async fn chart(State(state): State<AppState>) -> ApiResult<Vec<DailyCount>> {
    Ok(Json(
        blocking(move || compilers::sync_chart(state.config.log_dir(), &state.config.logs)).await?,
    ))
}

pub async fn syncs(State(state): State<AppState>) -> ApiResult<Vec<SyncRecord>> {
    Ok(Json(
        blocking(move || compilers::recent_syncs(state.config.log_dir())).await?,
    ))
}

/// Host counters together with their human readable renderings.
#[derive(Debug, Serialize)]
pub struct SystemReport {
    #[serde(flatten)]
    pub stats: SystemStats,
    pub disk_total_human: String,
    pub disk_used_human: String,
    pub memory_total_human: String,
    pub memory_used_human: String,
}

impl From<SystemStats> for SystemReport {
    fn from(stats: SystemStats) -> Self {
        Self {
            disk_total_human: format_bytes(stats.disk_total),
            disk_used_human: format_bytes(stats.disk_used),
            memory_total_human: format_bytes(stats.memory_total),
            memory_used_human: format_bytes(stats.memory_used),
            stats,
        }
    }
}

pub async fn system(State(state): State<AppState>) -> ApiResult<SystemReport> {
    let probe = SystemProbe::new(state.config.data_dir(), &state.config.proc_dir);
    Ok(Json(blocking(move || probe.probe()).await?.into()))
}

pub async fn features(State(state): State<AppState>) -> Json<FeatureFlags> {
    Json(state.config.features.clone())
}

#[derive(Debug, Default, Deserialize)]
pub struct NotifyRequest {
    message: Option<String>,
}

/// The body is optional; an empty one sends the default test message.
pub async fn notify_test(State(state): State<AppState>, body: Bytes) -> Result<Json<ActionResult>, ApiError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        NotifyRequest::default()
    } else {
        serde_json::from_slice::<NotifyRequest>(&body).map_err(|e| ApiError::InvalidBody(e.to_string()))?
    };
    let message = request
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| compilers::DEFAULT_TEST_MESSAGE.to_string());

    Ok(Json(compilers::send_notification(&state.config.notify, &message).await))
}
