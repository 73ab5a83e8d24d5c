//! The top-level status view, assembled from every other collector.

use crate::{
    format::{
        format_bytes,
        format_duration,
        format_timestamp,
    },
    probes::{
        logs::{
            count_auth,
            tail,
            LogKind,
        },
        scan::scan_size,
    },
    state,
};
use super::backups::BackupGateway;
use chrono::{
    DateTime,
    Utc,
};
use serde::Serialize;
use sync_status_config::{
    Config,
    FeatureFlags,
};

pub const RUNNING: &str = "running";

/// One point-in-time view of the whole server. Built fresh for every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub status: &'static str,
    pub version: String,
    pub uptime_seconds: u64,
    pub uptime: String,
    pub user_count: usize,
    pub user_names: Vec<String>,
    pub data_size: u64,
    pub data_size_human: String,
    pub sync_count: u64,
    pub backup_count: u64,
    pub auth_success: u64,
    pub auth_failed: u64,
    pub features: FeatureFlags,
    pub last_updated: String,
}

/// The snapshot plus the names of the most recent backup archives and
/// whether a backup is being created right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    #[serde(flatten)]
    pub snapshot: StatusSnapshot,
    pub backups: Vec<String>,
    pub backup_running: bool,
}

/// Blocking.
pub fn compile(config: &Config, backups: &BackupGateway) -> StatusSnapshot {
    compile_at(config, backups, Utc::now())
}

/// Blocking. Every input degrades on its own; nothing here fails the
/// snapshot as a whole.
pub fn compile_at(config: &Config, backups: &BackupGateway, now: DateTime<Utc>) -> StatusSnapshot {
    let state_dir = config.state_dir();

    let started = state::start_time(state_dir, now);
    // a start time in the future reads as "just started"
    let uptime_seconds = u64::try_from((now - started).num_seconds()).unwrap_or(0);

    let user_names = state::users(state_dir);
    let data_size = scan_size(config.data_dir());
    let auth = count_auth(&tail(&LogKind::Auth.path_in(config.log_dir()), config.logs.scan_window));

    StatusSnapshot {
        status: RUNNING,
        version: state::version(state_dir),
        uptime_seconds,
        uptime: format_duration(uptime_seconds),
        user_count: user_names.len(),
        user_names,
        data_size,
        data_size_human: format_bytes(data_size),
        sync_count: state::sync_count(state_dir),
        backup_count: backups.count(),
        auth_success: auth.success,
        auth_failed: auth.failed,
        features: config.features.clone(),
        last_updated: format_timestamp(now.into()),
    }
}

/// Blocking.
pub fn report(config: &Config, backups: &BackupGateway) -> StatusReport {
    StatusReport {
        snapshot: compile(config, backups),
        backups: backups.recent_names(),
        backup_running: backups.is_running(),
    }
}
