use crate::probes::logs::{
    daily_sync_counts,
    is_sync_event,
    tail,
    DailyCount,
    LogKind,
    LogLine,
};
use chrono::{
    Local,
    NaiveDate,
};
use serde::Serialize;
use std::path::Path;
use sync_status_config::LogConfig;

/// Lines of `sync.log` searched for recent syncs.
const RECENT_SYNC_WINDOW: usize = 200;
const RECENT_SYNC_LIMIT: usize = 10;

/// The classified tail of one log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogView {
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub lines: Vec<LogLine>,
}

/// Clamps a requested line count into `1..=max_lines`, using the default
/// when nothing was asked for.
pub fn line_limit(config: &LogConfig, requested: Option<usize>) -> usize {
    requested.unwrap_or(config.default_lines).clamp(1, config.max_lines.max(1))
}

/// Blocking.
pub fn log_view(log_dir: &Path, kind: LogKind, lines: usize) -> LogView {
    LogView {
        kind,
        lines: tail(&kind.path_in(log_dir), lines).into_iter().map(LogLine::from).collect(),
    }
}

/// Blocking. Daily sync events for the chart window ending today.
pub fn sync_chart(log_dir: &Path, config: &LogConfig) -> Vec<DailyCount> {
    sync_chart_at(log_dir, config, Local::now().date_naive())
}

pub fn sync_chart_at(log_dir: &Path, config: &LogConfig, today: NaiveDate) -> Vec<DailyCount> {
    let lines = tail(&LogKind::Sync.path_in(log_dir), config.scan_window);
    daily_sync_counts(&lines, today, config.chart_days)
}

/// One completed sync. `user` is empty when the line names nobody.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncRecord {
    pub time: String,
    pub user: String,
}

impl SyncRecord {
    fn parse(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let time = format!("{} {}", fields.next()?, fields.next()?);
        let user = fields
            .find_map(|field| field.strip_prefix("user="))
            .unwrap_or_default()
            .to_string();
        Some(Self { time, user })
    }
}

/// Blocking. The most recent completed syncs, newest first.
pub fn recent_syncs(log_dir: &Path) -> Vec<SyncRecord> {
    tail(&LogKind::Sync.path_in(log_dir), RECENT_SYNC_WINDOW)
        .iter()
        .rev()
        .filter(|line| is_sync_event(line))
        .filter_map(|line| SyncRecord::parse(line))
        .take(RECENT_SYNC_LIMIT)
        .collect()
}
