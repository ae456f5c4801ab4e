//! Process spawning for the external tools.

use std::io;
use std::process::Command;

use thiserror::Error;
use tracing::debug;

/// Errors from spawning or completing an external tool.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The tool binary could not be started (usually: not installed).
    #[error("Failed to start `{tool}`: {source}. Is it installed and on PATH?")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// The tool ran but reported failure.
    #[error("`{tool}` exited with status {code}: {stderr}")]
    NonZeroExit {
        tool: String,
        code: i32,
        stderr: String,
    },
}

pub type RunnerResult<T> = Result<T, RunnerError>;

/// Captured result of a completed tool run.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: i32,
}

/// Seam for spawning external tools, so workflows can be exercised in
/// tests with a scripted runner.
pub trait ToolRunner {
    /// Run `tool` with `args`, requiring a zero exit status.
    fn run(&self, tool: &str, args: &[String]) -> RunnerResult<CommandOutput>;

    /// Run `tool` with `args`, returning the output whatever the status.
    ///
    /// mkvmerge exits with 1 for warnings while still producing a valid
    /// output file, so remux calls go through this variant.
    fn run_unchecked(&self, tool: &str, args: &[String]) -> RunnerResult<CommandOutput>;
}

/// The production runner: spawns the real binaries.
#[derive(Debug, Default, Clone)]
pub struct CommandRunner;

impl CommandRunner {
    pub fn new() -> Self {
        Self
    }

    fn spawn(&self, tool: &str, args: &[String]) -> RunnerResult<CommandOutput> {
        debug!("Running: {} {}", tool, args.join(" "));
        let output = Command::new(tool)
            .args(args)
            .output()
            .map_err(|e| RunnerError::Spawn {
                tool: tool.to_string(),
                source: e,
            })?;
        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code().unwrap_or(-1),
        })
    }
}

impl ToolRunner for CommandRunner {
    fn run(&self, tool: &str, args: &[String]) -> RunnerResult<CommandOutput> {
        let output = self.spawn(tool, args)?;
        if output.code != 0 {
            return Err(RunnerError::NonZeroExit {
                tool: tool.to_string(),
                code: output.code,
                stderr: tail(&output.stderr),
            });
        }
        Ok(output)
    }

    fn run_unchecked(&self, tool: &str, args: &[String]) -> RunnerResult<CommandOutput> {
        self.spawn(tool, args)
    }
}

/// Last few stderr lines, enough context without dumping a full transcript
/// into the error chain.
fn tail(stderr: &str) -> String {
    const KEEP: usize = 8;
    let lines: Vec<&str> = stderr.lines().collect();
    let start = lines.len().saturating_sub(KEEP);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_last_lines() {
        let text: String = (0..20).map(|i| format!("line {i}\n")).collect();
        let kept = tail(&text);
        assert!(kept.starts_with("line 12"));
        assert!(kept.ends_with("line 19"));
    }

    #[test]
    fn missing_binary_reports_spawn_error() {
        let runner = CommandRunner::new();
        let err = runner
            .run("definitely-not-a-real-tool-1234", &[])
            .unwrap_err();
        assert!(matches!(err, RunnerError::Spawn { .. }));
    }
}
