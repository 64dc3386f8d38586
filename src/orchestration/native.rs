//! Native process runner
//!
//! Implements `ProcessRunner` with `tokio::process`. Output of every
//! command is forwarded to the log line by line and the tail is kept for
//! error messages.

use crate::error::{DanceError, DanceResult};
use crate::orchestration::runner::{CommandSpec, ProcessRunner};
use crate::orchestration::{build_error_output, stream_child_output};
use async_trait::async_trait;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::{debug, info};

/// Runs commands on the host
pub struct NativeRunner;

impl NativeRunner {
    /// Create a new native runner
    pub fn new() -> Self {
        Self
    }

    fn command(spec: &CommandSpec) -> Command {
        let mut command = Command::new(&spec.program);
        command.args(&spec.args).kill_on_drop(true);
        command
    }
}

impl Default for NativeRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Describe a failed side of a pipe, or `None` if it succeeded
fn pipe_side_failure(spec: &CommandSpec, output: &Output) -> Option<String> {
    if output.status.success() {
        return None;
    }

    let status = match output.status.code() {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    };
    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = build_error_output("", &stderr);

    if detail.is_empty() {
        Some(format!("`{}` failed ({})", spec, status))
    } else {
        Some(format!("`{}` failed ({}): {}", spec, status, detail))
    }
}

#[async_trait]
impl ProcessRunner for NativeRunner {
    async fn run(&self, spec: &CommandSpec) -> DanceResult<()> {
        info!("Running: {}", spec);

        let mut child = Self::command(spec)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DanceError::command_failed(spec.to_string(), e))?;

        let program = spec.program.clone();
        let lines = stream_child_output(&mut child, &move |line: String| {
            info!(target: "cache_dance::process", "[{}] {}", program, line);
        })
        .await?;

        let status = child
            .wait()
            .await
            .map_err(|e| DanceError::command_failed(spec.to_string(), e))?;

        if status.success() {
            Ok(())
        } else {
            debug!("{} exited with {:?}", spec, status.code());
            Err(DanceError::command_exec(
                spec.to_string(),
                build_error_output(&lines.join("\n"), ""),
            ))
        }
    }

    async fn run_piped(&self, producer: &CommandSpec, consumer: &CommandSpec) -> DanceResult<()> {
        info!("Running: {} | {}", producer, consumer);

        let mut upstream = Self::command(producer)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DanceError::command_failed(producer.to_string(), e))?;

        let pipe: Stdio = upstream
            .stdout
            .take()
            .ok_or_else(|| DanceError::Internal("producer stdout not captured".to_string()))?
            .try_into()
            .map_err(|e| DanceError::io("connecting pipe to consumer", e))?;

        let downstream = match Self::command(consumer)
            .stdin(pipe)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                let _ = upstream.kill().await;
                return Err(DanceError::command_failed(consumer.to_string(), e));
            }
        };

        let (upstream_out, downstream_out) =
            tokio::join!(upstream.wait_with_output(), downstream.wait_with_output());
        let upstream_out =
            upstream_out.map_err(|e| DanceError::command_failed(producer.to_string(), e))?;
        let downstream_out =
            downstream_out.map_err(|e| DanceError::command_failed(consumer.to_string(), e))?;

        let failures: Vec<String> = [
            pipe_side_failure(producer, &upstream_out),
            pipe_side_failure(consumer, &downstream_out),
        ]
        .into_iter()
        .flatten()
        .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DanceError::PipeFailed(failures.join("; ")))
        }
    }
}
