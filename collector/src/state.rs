//! The small state files the sync server leaves in its state directory.
//!
//! Every reader has a fixed default that is used when the file is missing
//! or does not parse.

use crate::error::{
    Error,
    Result,
};
use chrono::{
    DateTime,
    Utc,
};
use std::{
    path::Path,
    str::FromStr,
};

pub const VERSION_FILE: &str = "version.txt";
pub const START_TIME_FILE: &str = "start_time.txt";
pub const SYNC_COUNT_FILE: &str = "sync_count.txt";
pub const USERS_FILE: &str = "users.txt";

pub const UNKNOWN_VERSION: &str = "unknown";

pub fn read_trimmed(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map(|content| content.trim().to_string())
        .map_err(|e| Error::io(path, e))
}

pub fn read_parsed<T: FromStr>(path: &Path, what: &'static str) -> Result<T> {
    let content = read_trimmed(path)?;
    content.parse().map_err(|_| Error::parse(what, content))
}

fn or_default<T>(result: Result<T>, default: T) -> T {
    result.unwrap_or_else(|e| {
        if e.is_not_found() {
            debug!(error = %e, "state file absent, using default");
        } else {
            warn!(error = %e, "state file unreadable, using default");
        }
        default
    })
}

pub fn version(state_dir: &Path) -> String {
    let version = read_trimmed(&state_dir.join(VERSION_FILE)).and_then(|v| {
        if v.is_empty() {
            Err(Error::parse("version", v))
        } else {
            Ok(v)
        }
    });
    or_default(version, UNKNOWN_VERSION.to_string())
}

/// Unix seconds, possibly fractional; the fraction is dropped. Falls back to
/// `now`, which reads as "just started" rather than producing a negative
/// uptime.
pub fn start_time(state_dir: &Path, now: DateTime<Utc>) -> DateTime<Utc> {
    let started = read_parsed::<f64>(&state_dir.join(START_TIME_FILE), "start time").and_then(|secs| {
        Some(secs)
            .filter(|s| s.is_finite())
            .and_then(|s| DateTime::from_timestamp(s.trunc() as i64, 0))
            .ok_or_else(|| Error::parse("start time", secs.to_string()))
    });
    or_default(started, now)
}

pub fn sync_count(state_dir: &Path) -> u64 {
    or_default(read_parsed(&state_dir.join(SYNC_COUNT_FILE), "sync count"), 0)
}

/// Names that would resolve outside the data root are not users.
pub fn is_safe_username(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains(['/', '\\', '\0'])
}

/// Usernames from the newline-delimited user list, in file order.
pub fn users(state_dir: &Path) -> Vec<String> {
    let content = or_default(read_trimmed(&state_dir.join(USERS_FILE)), String::new());
    content
        .lines()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter(|name| {
            let safe = is_safe_username(name);
            if !safe {
                warn!(entry = %name, "ignoring user list entry that is not a plain directory name");
            }
            safe
        })
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    #[test]
    fn absent_files_use_defaults() {
        let dir = TempDir::new().unwrap();
        let now = Utc::now();

        assert_eq!(version(dir.path()), "unknown");
        assert_eq!(start_time(dir.path(), now), now);
        assert_eq!(sync_count(dir.path()), 0);
        assert!(users(dir.path()).is_empty());
    }

    #[test]
    fn malformed_files_use_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.child(VERSION_FILE), "  \n").unwrap();
        std::fs::write(dir.child(START_TIME_FILE), "yesterday").unwrap();
        std::fs::write(dir.child(SYNC_COUNT_FILE), "-4").unwrap();
        let now = Utc::now();

        assert_eq!(version(dir.path()), "unknown");
        assert_eq!(start_time(dir.path(), now), now);
        assert_eq!(sync_count(dir.path()), 0);
    }

    #[test]
    fn well_formed_files_are_read() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.child(VERSION_FILE), "25.02.5\n").unwrap();
        std::fs::write(dir.child(START_TIME_FILE), "1700000000\n").unwrap();
        std::fs::write(dir.child(SYNC_COUNT_FILE), " 42 ").unwrap();

        assert_eq!(version(dir.path()), "25.02.5");
        assert_eq!(start_time(dir.path(), Utc::now()).timestamp(), 1_700_000_000);
        assert_eq!(sync_count(dir.path()), 42);
    }

    #[test]
    fn user_list_skips_blank_and_unsafe_entries() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.child(USERS_FILE), "alice\n\n  bob  \n../etc\nnested/user\n.\ncarol\n").unwrap();

        assert_eq!(users(dir.path()), vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn fractional_start_time_is_truncated() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.child(START_TIME_FILE), "1700000000.5\n").unwrap();

        assert_eq!(start_time(dir.path(), Utc::now()).timestamp(), 1_700_000_000);
    }

    #[test]
    fn non_finite_start_time_uses_default() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.child(START_TIME_FILE), "NaN").unwrap();
        let now = Utc::now();

        assert_eq!(start_time(dir.path(), now), now);
    }
}
