//! Tailing and keyword classification of the sync server's plain-text logs.
//!
//! Lines look like `<date> <time> <TAG> ... key=value ...`, but nothing
//! enforces that shape. Everything here is substring based on purpose: a
//! line that does not follow the format still gets classified, it just
//! lands in `neutral`.

use crate::error::{
    Error,
    Result,
};
use chrono::{
    Days,
    NaiveDate,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    collections::HashMap,
    fs::File,
    io::{
        Read,
        Seek,
        SeekFrom,
    },
    path::Path,
};
use strum::{
    Display,
    EnumIter,
    EnumString,
};

const CHUNK_SIZE: u64 = 8 * 1024;

#[derive(Debug, Clone, Copy, Display, EnumIter, EnumString, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogKind {
    Sync,
    Auth,
    Backup,
}

impl LogKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            LogKind::Sync => "sync.log",
            LogKind::Auth => "auth.log",
            LogKind::Backup => "backup.log",
        }
    }

    pub fn path_in(&self, log_dir: &Path) -> std::path::PathBuf {
        log_dir.join(self.file_name())
    }
}

#[derive(Debug, Clone, Copy, Display, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Error,
    Success,
    Warning,
    Neutral,
}

/// First match wins, in the order error, success, warning.
pub fn classify(line: &str) -> LogLevel {
    if line.contains("ERROR") || line.contains("FAILED") {
        LogLevel::Error
    } else if line.contains("SUCCESS") || line.contains("COMPLETE") {
        LogLevel::Success
    } else if line.contains("WARN") {
        LogLevel::Warning
    } else {
        LogLevel::Neutral
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub text: String,
    pub level: LogLevel,
}

impl From<String> for LogLine {
    fn from(text: String) -> Self {
        let level = classify(&text);
        Self { text, level }
    }
}

/// The last `n` lines of the file at `path`, oldest first. Reads backwards
/// from the end so the cost is bounded by `n`, not by the size of the log.
pub fn read_tail(path: &Path, n: usize) -> Result<Vec<String>> {
    if n == 0 {
        return Ok(Vec::new());
    }

    let io_err = |e| Error::io(path, e);
    let mut file = File::open(path).map_err(io_err)?;
    let mut pos = file.metadata().map_err(io_err)?.len();

    // Chunks are collected back to front and joined once at the end.
    let mut chunks: Vec<Vec<u8>> = Vec::new();
    let mut newlines = 0;

    while pos > 0 {
        let read = CHUNK_SIZE.min(pos);
        pos -= read;
        file.seek(SeekFrom::Start(pos)).map_err(io_err)?;
        let mut chunk = vec![0; read as usize];
        file.read_exact(&mut chunk).map_err(io_err)?;

        newlines += chunk.iter().filter(|b| **b == b'\n').count();
        // the newline terminating the last line does not separate two lines
        if chunks.is_empty() && chunk.ends_with(b"\n") {
            newlines -= 1;
        }
        chunks.push(chunk);

        if newlines >= n {
            break;
        }
    }

    let buf: Vec<u8> = chunks.into_iter().rev().flatten().collect();

    // When we stopped mid-file the first segment is partial, but there are
    // more than `n` segments so it is cut off below.
    let mut lines: Vec<String> = String::from_utf8_lossy(&buf).lines().map(str::to_owned).collect();
    Ok(lines.split_off(lines.len().saturating_sub(n)))
}

/// [`read_tail`] with the missing-log policy applied: a log that does not
/// exist yet has no lines, any other failure is logged and treated the same.
pub fn tail(path: &Path, n: usize) -> Vec<String> {
    read_tail(path, n).unwrap_or_else(|e| {
        if !e.is_not_found() {
            warn!(error = %e, "cannot tail log, reporting it as empty");
        }
        Vec::new()
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuthCounts {
    pub success: u64,
    pub failed: u64,
}

pub fn count_auth<S: AsRef<str>>(lines: &[S]) -> AuthCounts {
    lines.iter().fold(AuthCounts::default(), |mut counts, line| {
        let line = line.as_ref();
        if line.contains("AUTH_SUCCESS") {
            counts.success += 1;
        } else if line.contains("AUTH_FAILED") {
            counts.failed += 1;
        }
        counts
    })
}

/// A sync event is a completed sync: a line tagged `SYNC*` that carries the
/// `COMPLETE` keyword and did not fail. Start lines are not counted, so each
/// sync is seen once.
pub fn is_sync_event(line: &str) -> bool {
    line.split_whitespace().nth(2).is_some_and(|tag| tag.starts_with("SYNC"))
        && line.contains("COMPLETE")
        && classify(line) != LogLevel::Error
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: String,
    /// Short weekday name for chart axes.
    pub label: String,
    pub count: u64,
}

/// Sync events per calendar day for the `days` days ending with `today`,
/// oldest first. Days without events are reported with a zero count.
pub fn daily_sync_counts<S: AsRef<str>>(lines: &[S], today: NaiveDate, days: u32) -> Vec<DailyCount> {
    let mut per_day: HashMap<&str, u64> = HashMap::new();
    for line in lines {
        let line = line.as_ref();
        if !is_sync_event(line) {
            continue;
        }
        if let Some(date) = line.split_whitespace().next() {
            *per_day.entry(date).or_default() += 1;
        }
    }

    (0..days)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(offset.into())))
        .map(|day| {
            let date = day.format("%Y-%m-%d").to_string();
            let count = per_day.get(date.as_str()).copied().unwrap_or(0);
            DailyCount {
                label: day.format("%a").to_string(),
                date,
                count,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    #[test]
    fn classification_keywords() {
        assert_eq!(classify("2024-05-01 10:00:00 ERROR disk"), LogLevel::Error);
        assert_eq!(classify("2024-05-01 10:00:00 AUTH_FAILED user=bob"), LogLevel::Error);
        assert_eq!(classify("2024-05-01 10:00:00 AUTH_SUCCESS user=bob"), LogLevel::Success);
        assert_eq!(classify("2024-05-01 10:00:00 SYNC_COMPLETE user=bob"), LogLevel::Success);
        assert_eq!(classify("2024-05-01 10:00:00 WARNING low space"), LogLevel::Warning);
        assert_eq!(classify("2024-05-01 10:00:00 INFO started"), LogLevel::Neutral);
        // error keywords win over success keywords on the same line
        assert_eq!(classify("BACKUP_COMPLETE with ERROR"), LogLevel::Error);
    }

    #[test]
    fn auth_counters() {
        let lines = [
            "2024-05-01 10:00:00 AUTH_SUCCESS user=alice",
            "2024-05-01 10:01:00 AUTH_FAILED user=mallory",
            "2024-05-01 10:02:00 AUTH_SUCCESS user=bob",
            "2024-05-01 10:03:00 SYNC_START user=bob",
        ];
        assert_eq!(count_auth(&lines), AuthCounts { success: 2, failed: 1 });
    }

    #[test]
    fn line_without_auth_keyword_counts_for_nothing() {
        assert_eq!(count_auth(&["INFO nothing to see"]), AuthCounts::default());
    }

    #[test]
    fn tail_returns_last_lines_oldest_first() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("sync.log");
        let content: String = (1..=5000).map(|i| format!("line {i}\n")).collect();
        std::fs::write(&path, content).unwrap();

        let lines = read_tail(&path, 3).unwrap();
        assert_eq!(lines, vec!["line 4998", "line 4999", "line 5000"]);

        let all = read_tail(&path, 10_000).unwrap();
        assert_eq!(all.len(), 5000);
        assert_eq!(all[0], "line 1");
    }

    #[test]
    fn tail_without_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("auth.log");
        std::fs::write(&path, "a\nb\nc").unwrap();

        assert_eq!(read_tail(&path, 2).unwrap(), vec!["b", "c"]);
        assert!(read_tail(&path, 0).unwrap().is_empty());
    }

    #[test]
    fn missing_log_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("backup.log");

        assert!(read_tail(&path, 10).unwrap_err().is_not_found());
        assert!(tail(&path, 10).is_empty());
    }

    #[test]
    fn log_kind_round_trips_through_its_name() {
        assert_eq!("auth".parse::<LogKind>().unwrap(), LogKind::Auth);
        assert_eq!(LogKind::Backup.to_string(), "backup");
        assert!("system".parse::<LogKind>().is_err());
    }

    #[test]
    fn daily_counts_are_zero_filled_and_oldest_first() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 7).unwrap();
        let lines = [
            "2024-04-30 09:00:00 SYNC_COMPLETE user=alice",
            "2024-05-01 09:00:00 SYNC_COMPLETE user=alice",
            "2024-05-01 09:05:00 SYNC_COMPLETE user=bob",
            "2024-05-01 09:06:00 SYNC_FAILED user=bob",
            "2024-05-07 11:00:00 SYNC_START user=alice",
            "2024-05-07 11:00:02 SYNC_COMPLETE user=alice",
            "2024-05-07 11:00:03 INFO heartbeat",
        ];

        let counts = daily_sync_counts(&lines, today, 7);

        assert_eq!(counts.len(), 7);
        assert_eq!(counts[0].date, "2024-05-01");
        assert_eq!(counts[0].label, "Wed");
        assert_eq!(counts[6].date, "2024-05-07");
        assert_eq!(
            counts.iter().map(|c| c.count).collect::<Vec<_>>(),
            vec![2, 0, 0, 0, 0, 0, 1]
        );
    }

    #[test]
    fn start_and_complete_of_one_sync_count_once() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 7).unwrap();
        let lines = [
            "2024-05-07 11:00:00 SYNC_START user=alice",
            "2024-05-07 11:00:03 SYNC_COMPLETE user=alice",
        ];

        assert!(!is_sync_event(lines[0]));
        assert!(is_sync_event(lines[1]));
        assert_eq!(daily_sync_counts(&lines, today, 7)[6].count, 1);
    }

    #[test]
    fn tail_stops_at_chunk_boundaries_without_losing_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("sync.log");
        // long lines so each request spans several chunks
        let content: String = (1..=300).map(|i| format!("{i:04} {}\n", "x".repeat(200))).collect();
        std::fs::write(&path, content).unwrap();

        for n in [1, 39, 40, 41, 299, 300, 301] {
            let lines = read_tail(&path, n).unwrap();
            assert_eq!(lines.len(), n.min(300), "n = {n}");
            assert!(lines.last().unwrap().starts_with("0300 "), "n = {n}");
            assert!(lines[0].starts_with(&format!("{:04} ", 301 - n.min(300))), "n = {n}");
        }
    }
}
