//! Running external tools with a timeout and bounded output capture.

use std::{ffi::OsString, path::Path, process::Stdio, time::Duration};

use {
    tokio::process::Command,
    tracing::{debug, warn},
};

use crate::error::{Error, Result};

/// Bytes of stderr kept for diagnostics.
const STDERR_TAIL_BYTES: usize = 2048;

/// Captured output of a successful run.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    /// Tail of stderr, for tools that report skips without failing.
    pub stderr_tail: String,
}

/// Run `program` with `args`, killing it if it outlives `timeout`.
///
/// A non-zero exit becomes [`Error::ToolFailed`] carrying the stderr tail.
pub async fn run_tool(program: &Path, args: &[OsString], timeout: Duration) -> Result<ToolOutput> {
    let tool = program.display().to_string();
    debug!(
        tool,
        args = ?args,
        timeout_secs = timeout.as_secs(),
        "running external tool"
    );

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd
        .spawn()
        .map_err(|e| Error::external(format!("failed to spawn `{tool}`"), e))?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(Error::external(format!("failed to run `{tool}`"), e)),
        Err(_) => {
            warn!(tool, "external tool timed out");
            return Err(Error::Timeout {
                tool,
                secs: timeout.as_secs(),
            });
        },
    };

    if output.status.success() {
        debug!(tool, stdout_len = output.stdout.len(), "external tool done");
        return Ok(ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr_tail: tail(&String::from_utf8_lossy(&output.stderr), STDERR_TAIL_BYTES),
        });
    }

    Err(Error::ToolFailed {
        tool,
        code: output.status.code(),
        stderr_tail: tail(&String::from_utf8_lossy(&output.stderr), STDERR_TAIL_BYTES),
    })
}

/// Last `max` bytes of `text`, cut on a char boundary and trimmed.
fn tail(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.len() <= max {
        return text.to_string();
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &text[start..])
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_short_text() {
        assert_eq!(tail("  error  \n", 100), "error");
    }

    #[test]
    fn tail_cuts_on_char_boundary() {
        let text = "ошибка".repeat(10);
        let cut = tail(&text, 7);
        assert!(cut.starts_with("..."));
        assert!(cut.len() <= 3 + 7);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_carries_stderr() {
        let args: Vec<OsString> = vec!["-c".into(), "echo boom >&2; exit 3".into()];
        let err = run_tool(Path::new("sh"), &args, Duration::from_secs(5))
            .await
            .unwrap_err();
        match err {
            Error::ToolFailed {
                code, stderr_tail, ..
            } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr_tail, "boom");
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_tool_times_out() {
        let args: Vec<OsString> = vec!["-c".into(), "sleep 5".into()];
        let err = run_tool(Path::new("sh"), &args, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[tokio::test]
    async fn missing_binary_is_an_external_error() {
        let err = run_tool(
            Path::new("/nonexistent/reelsmith-tool"),
            &[],
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("failed to spawn"));
    }
}
