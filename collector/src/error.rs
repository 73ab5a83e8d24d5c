use std::{
    io,
    path::PathBuf,
    time::Duration,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures of a single probe. Collectors decide per call site whether a
/// failure degrades to a default value or is reported.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("cannot access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot read collection database {path:?}: {source}")]
    Database {
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },
    #[error("cannot parse {what} from {value:?}")]
    Parse { what: &'static str, value: String },
    #[error("{0} is not available on this host")]
    Unavailable(&'static str),
    #[error("failed to start {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{program:?} timed out after {}s", timeout.as_secs())]
    Timeout { program: PathBuf, timeout: Duration },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(what: &'static str, value: impl Into<String>) -> Self {
        Self::Parse {
            what,
            value: value.into(),
        }
    }

    /// Absent files and directories are the normal state of a fresh server.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}
