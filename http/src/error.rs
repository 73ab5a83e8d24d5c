use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{
        IntoResponse,
        Response,
    },
};
use sync_status_collector::compilers::DownloadError;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Unknown log type {0:?}, expected one of sync, auth, backup")]
    InvalidLogType(String),
    #[error("Invalid backup file name")]
    InvalidArchiveName,
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Backup not found")]
    ArchiveNotFound,
    #[error("Collecting the status failed: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidLogType(_)
            | ApiError::InvalidArchiveName
            | ApiError::InvalidBody(_)
            | ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::ArchiveNotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DownloadError> for ApiError {
    fn from(e: DownloadError) -> Self {
        match e {
            DownloadError::InvalidName => ApiError::InvalidArchiveName,
            DownloadError::NotFound => ApiError::ArchiveNotFound,
            DownloadError::Io(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::InvalidQuery(e.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, error = %self);
        } else {
            debug!(%status, error = %self, "rejected request");
        }
        (status, axum::Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
