use crate::{
    auth::basic_auth,
    handlers,
};
use axum::{
    middleware,
    routing::{
        get,
        post,
    },
    Router,
};
use std::sync::Arc;
use sync_status_collector::compilers::BackupGateway;
use sync_status_config::Config;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub backups: Arc<BackupGateway>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let backups = BackupGateway::new(config.backup.clone(), config.backup_dir());
        Self {
            config: Arc::new(config),
            backups: Arc::new(backups),
        }
    }
}

pub fn create_router(config: Config) -> Router {
    router(AppState::new(config))
}

pub fn router(state: AppState) -> Router {
    let authed = Router::new()
        .route("/api/stats", get(handlers::stats))
        .route("/api/status", get(handlers::status))
        .route("/api/users", get(handlers::users))
        .route("/api/storage", get(handlers::storage))
        .route("/api/backups", get(handlers::list_backups))
        .route("/api/backups/create", post(handlers::create_backup))
        .route("/api/backups/download/{name}", get(handlers::download_backup))
        .route("/api/logs/{kind}", get(handlers::logs))
        .route("/api/chart", get(handlers::chart))
        .route("/api/syncs", get(handlers::syncs))
        .route("/api/system", get(handlers::system))
        .route("/api/features", get(handlers::features))
        .route("/api/notify/test", post(handlers::notify_test))
        .layer(middleware::from_fn_with_state(state.clone(), basic_auth));

    // liveness probes never carry credentials
    let public = Router::new().route("/health", get(handlers::health));

    public
        .merge(authed)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
