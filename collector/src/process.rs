//! Bounded invocation of the external helper executables.

use crate::error::{
    Error,
    Result,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    path::Path,
    process::{
        Output,
        Stdio,
    },
    time::Duration,
};
use tokio::process::Command;

/// Runs `program` with `args` and collects its output. The child is killed
/// if it does not finish within `timeout`.
pub async fn run_with_timeout(program: &Path, args: &[&str], timeout: Duration) -> Result<Output> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| Error::Spawn {
            program: program.to_path_buf(),
            source,
        })?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(Error::io(program, e)),
        Err(_) => Err(Error::Timeout {
            program: program.to_path_buf(),
            timeout,
        }),
    }
}

/// Outcome of a side-effecting action as reported to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// Exit code zero is success. Otherwise the captured error output is the
    /// message, falling back to standard output and then to the exit status.
    pub fn from_run(run: Result<Output>, success_message: &str) -> Self {
        let output = match run {
            Ok(output) => output,
            Err(e) => return Self::failed(e.to_string()),
        };

        if output.status.success() {
            return Self::ok(success_message);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let message = match (stderr.is_empty(), stdout.is_empty()) {
            (false, _) => stderr,
            (true, false) => stdout,
            (true, true) => format!("process exited with {}", output.status),
        };
        Self::failed(message)
    }
}
