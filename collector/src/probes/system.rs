//! Disk, memory and load counters of the host.
//!
//! Every sub-probe fails on its own. A host without `/proc` (or a disk path
//! that cannot be statted) reports zeros for that part only.

use crate::error::{
    Error,
    Result,
};
use serde::Serialize;
use std::path::{
    Path,
    PathBuf,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SystemStats {
    pub disk_total: u64,
    pub disk_used: u64,
    pub disk_percent: f64,
    pub memory_total: u64,
    pub memory_used: u64,
    pub memory_percent: f64,
    pub load_1: f64,
    pub load_5: f64,
    pub load_15: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capacity {
    pub total: u64,
    pub available: u64,
}

impl Capacity {
    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.available)
    }

    /// Zero when the total is unknown.
    pub fn percent(&self) -> f64 {
        percent(self.used(), self.total)
    }
}

pub fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let value = part as f64 / total as f64 * 100.0;
    (value * 10.0).round() / 10.0
}

pub struct SystemProbe {
    disk_path: PathBuf,
    proc_dir: PathBuf,
}

impl SystemProbe {
    pub fn new(disk_path: impl Into<PathBuf>, proc_dir: impl Into<PathBuf>) -> Self {
        Self {
            disk_path: disk_path.into(),
            proc_dir: proc_dir.into(),
        }
    }

    pub fn probe(&self) -> SystemStats {
        let disk = disk_capacity(&self.disk_path).unwrap_or_else(|e| {
            debug!(error = %e, "disk probe failed, reporting zeros");
            Capacity::default()
        });
        let memory = self.memory().unwrap_or_else(|e| {
            debug!(error = %e, "memory probe failed, reporting zeros");
            Capacity::default()
        });
        let [load_1, load_5, load_15] = self.load_average().unwrap_or_else(|e| {
            debug!(error = %e, "load probe failed, reporting zeros");
            [0.0; 3]
        });

        SystemStats {
            disk_total: disk.total,
            disk_used: disk.used(),
            disk_percent: disk.percent(),
            memory_total: memory.total,
            memory_used: memory.used(),
            memory_percent: memory.percent(),
            load_1,
            load_5,
            load_15,
        }
    }

    pub fn memory(&self) -> Result<Capacity> {
        let path = self.proc_dir.join("meminfo");
        let content = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        parse_meminfo(&content)
    }

    pub fn load_average(&self) -> Result<[f64; 3]> {
        let path = self.proc_dir.join("loadavg");
        let content = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        parse_loadavg(&content)
    }
}

#[cfg(unix)]
pub fn disk_capacity(path: &Path) -> Result<Capacity> {
    use std::{
        ffi::CString,
        os::unix::ffi::OsStrExt,
    };

    let c_path =
        CString::new(path.as_os_str().as_bytes()).map_err(|_| Error::parse("disk path", path.to_string_lossy()))?;

    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let ret = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if ret != 0 {
        return Err(Error::io(path, std::io::Error::last_os_error()));
    }

    // Field widths differ between Linux and macOS.
    #[allow(clippy::unnecessary_cast)]
    let block = stat.f_frsize as u64;
    #[allow(clippy::unnecessary_cast)]
    let (blocks, available) = (stat.f_blocks as u64, stat.f_bavail as u64);

    Ok(Capacity {
        total: blocks.saturating_mul(block),
        available: available.saturating_mul(block),
    })
}

#[cfg(not(unix))]
pub fn disk_capacity(_path: &Path) -> Result<Capacity> {
    Err(Error::Unavailable("statvfs"))
}

fn meminfo_kib(content: &str, field: &str) -> Option<u64> {
    content
        .lines()
        .find_map(|line| line.strip_prefix(field)?.strip_prefix(':'))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|value| value.parse().ok())
}

/// `MemAvailable` is preferred; kernels older than 3.14 only report `MemFree`.
pub fn parse_meminfo(content: &str) -> Result<Capacity> {
    let total = meminfo_kib(content, "MemTotal").ok_or_else(|| Error::parse("MemTotal", content))?;
    let available = meminfo_kib(content, "MemAvailable")
        .or_else(|| meminfo_kib(content, "MemFree"))
        .ok_or_else(|| Error::parse("MemAvailable", content))?;

    Ok(Capacity {
        total: total * 1024,
        available: available * 1024,
    })
}

pub fn parse_loadavg(content: &str) -> Result<[f64; 3]> {
    let mut fields = content.split_whitespace().map(str::parse::<f64>);
    let mut next = || {
        fields
            .next()
            .and_then(|v| v.ok())
            .ok_or_else(|| Error::parse("load average", content))
    };
    Ok([next()?, next()?, next()?])
}
