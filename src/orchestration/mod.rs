//! Process orchestration
//!
//! - `runner`: the `ProcessRunner` seam used by the extraction pipeline
//! - `native`: `tokio::process` implementation, including two-process pipes
//! - `engine`: the concrete docker/tar/rm invocations

pub mod engine;
mod native;
pub mod runner;

pub use engine::{
    ContainerEngine, RemovalOutcome, SudoMode, CACHE_CONTAINER_NAME, CONTAINER_CACHE_ROOT,
    EXTRACT_IMAGE_TAG,
};
pub use native::NativeRunner;
pub use runner::{CommandSpec, ProcessRunner};

use crate::error::{DanceError, DanceResult};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Max number of output lines to include in error messages.
const ERROR_TAIL_LINES: usize = 50;

/// Extract the useful tail of command output for error diagnostics.
///
/// Combines stdout and stderr, then returns the last `ERROR_TAIL_LINES`
/// lines so error messages are actionable without being overwhelming.
pub(crate) fn build_error_output(stdout: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
    let total = lines.len();
    let tail: Vec<&str> = if total > ERROR_TAIL_LINES {
        lines[total - ERROR_TAIL_LINES..].to_vec()
    } else {
        lines
    };
    tail.join("\n")
}

/// Stream stdout+stderr from a child process, calling `on_output` for each line.
///
/// Returns all collected output lines for error reporting. Both streams
/// must have been configured with `Stdio::piped()`.
pub(crate) async fn stream_child_output(
    child: &mut tokio::process::Child,
    on_output: &(dyn Fn(String) + Send + Sync),
) -> DanceResult<Vec<String>> {
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| DanceError::Internal("child stderr not piped".to_string()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| DanceError::Internal("child stdout not piped".to_string()))?;

    let mut stderr_reader = BufReader::new(stderr).lines();
    let mut stdout_reader = BufReader::new(stdout).lines();

    let mut all_output = Vec::new();
    let mut stderr_done = false;
    let mut stdout_done = false;

    while !stderr_done || !stdout_done {
        tokio::select! {
            line = stderr_reader.next_line(), if !stderr_done => {
                match line {
                    Ok(Some(line)) => {
                        on_output(line.clone());
                        all_output.push(line);
                    }
                    _ => stderr_done = true,
                }
            }
            line = stdout_reader.next_line(), if !stdout_done => {
                match line {
                    Ok(Some(line)) => {
                        on_output(line.clone());
                        all_output.push(line);
                    }
                    _ => stdout_done = true,
                }
            }
        }
    }

    Ok(all_output)
}
