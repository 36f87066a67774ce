use std::io::{self, Read};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ScriptError {
    /// The command could not be started at all (missing, not executable, ...).
    #[error("failed to run `{script}` script with error: {source}")]
    Spawn {
        script: String,
        #[source]
        source: io::Error,
    },

    /// The command ran but exited non-zero or was killed.
    #[error("`{script}` script failed with error: {status}")]
    Failed {
        script: String,
        status: ExitStatus,
        output: Vec<u8>,
    },

    /// Collecting output or waiting on the child failed.
    #[error("`{script}` script I/O error: {source}")]
    Io {
        script: String,
        #[source]
        source: io::Error,
    },
}

impl ScriptError {
    /// Combined output captured before the failure, if the script ran.
    pub fn output(&self) -> Option<&[u8]> {
        match self {
            ScriptError::Failed { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Runs deployment scripts to completion, capturing stdout and stderr into a
/// single buffer in arrival order.
///
/// Scripts inherit the server's working directory and environment. With a
/// limit set, at most that many scripts run at once and the rest wait their
/// turn; there is no timeout either way.
#[derive(Debug, Clone, Default)]
pub struct ScriptRunner {
    permits: Option<Arc<Semaphore>>,
}

impl ScriptRunner {
    /// `max_concurrent == 0` means unbounded.
    pub fn new(max_concurrent: usize) -> Self {
        let permits = (max_concurrent > 0).then(|| Arc::new(Semaphore::new(max_concurrent)));
        Self { permits }
    }

    pub async fn run(&self, script: &str, args: &[&str]) -> Result<Vec<u8>, ScriptError> {
        // semaphore is never closed; a closed one would just mean no limit
        let _permit = match &self.permits {
            Some(permits) => permits.clone().acquire_owned().await.ok(),
            None => None,
        };

        debug!("Starting `{}` with args {:?}", script, args);

        let spawn_error = |source| ScriptError::Spawn {
            script: script.to_string(),
            source,
        };

        // one pipe behind both stdout and stderr keeps the write order
        let (reader, writer) = io::pipe().map_err(spawn_error)?;
        let writer_err = writer.try_clone().map_err(spawn_error)?;

        // the Command holding the parent's write ends drops with this statement,
        // so the reader sees EOF once the script side closes
        let mut child = Command::new(script)
            .args(args)
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(writer_err)
            .spawn()
            .map_err(spawn_error)?;

        let collector = tokio::task::spawn_blocking(move || collect_combined(reader));

        let status = child.wait().await.map_err(|source| ScriptError::Io {
            script: script.to_string(),
            source,
        })?;

        let output = collector
            .await
            .unwrap_or_else(|e| Err(io::Error::other(e)))
            .map_err(|source| ScriptError::Io {
                script: script.to_string(),
                source,
            })?;

        if !status.success() {
            return Err(ScriptError::Failed {
                script: script.to_string(),
                status,
                output,
            });
        }

        Ok(output)
    }
}

fn collect_combined(mut reader: io::PipeReader) -> io::Result<Vec<u8>> {
    let mut combined = Vec::new();
    reader.read_to_end(&mut combined)?;
    Ok(combined)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn test_collects_stdout_and_stderr() {
        let runner = ScriptRunner::new(0);
        let output = runner
            .run("/bin/sh", &["-c", "echo to-out; echo to-err >&2"])
            .await
            .unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("to-out"));
        assert!(text.contains("to-err"));
    }

    #[tokio::test]
    async fn test_combined_output_keeps_write_order() {
        let runner = ScriptRunner::new(0);
        let output = runner
            .run("/bin/sh", &["-c", "echo 1; echo 2 >&2; echo 3; echo 4 >&2"])
            .await
            .unwrap();

        assert_eq!(output, b"1\n2\n3\n4\n");
    }

    #[tokio::test]
    async fn test_passes_positional_args() {
        let runner = ScriptRunner::new(0);
        let output = runner
            .run("/bin/sh", &["-c", "printf '%s|%s|%s' \"$0\" \"$1\" \"$2\"", "git@host:a/b.git", "main", "abc123"])
            .await
            .unwrap();

        assert_eq!(output, b"git@host:a/b.git|main|abc123");
    }

    #[tokio::test]
    async fn test_nonzero_exit_keeps_output() {
        let runner = ScriptRunner::new(0);
        let err = runner
            .run("/bin/sh", &["-c", "echo boom >&2; exit 3"])
            .await
            .unwrap_err();

        match &err {
            ScriptError::Failed { status, output, .. } => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(output, b"boom\n");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.output(), Some(&b"boom\n"[..]));
    }

    #[tokio::test]
    async fn test_missing_script_is_spawn_error() {
        let runner = ScriptRunner::new(0);
        let err = runner
            .run("/definitely/not/here.sh", &["a", "b", "c"])
            .await
            .unwrap_err();

        assert!(matches!(err, ScriptError::Spawn { .. }));
        assert!(err.output().is_none());
    }

    #[tokio::test]
    async fn test_limit_serializes_runs() {
        let runner = ScriptRunner::new(1);
        let start = Instant::now();

        let (a, b) = tokio::join!(
            runner.run("/bin/sh", &["-c", "sleep 0.3"]),
            runner.run("/bin/sh", &["-c", "sleep 0.3"]),
        );
        a.unwrap();
        b.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(600));
    }
}
