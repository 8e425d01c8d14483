// ABOUTME: Command execution seam for the external CLI tools.
// ABOUTME: Defines CommandRunner, CommandOutput, and the tokio-backed CliRunner.

use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

/// A single external tool invocation: program plus argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = String>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().collect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured output of a completed invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code of the command.
    pub exit_code: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout with surrounding whitespace removed, as the `--output tsv`
    /// responses are consumed.
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

/// Failure of an external tool invocation. This is the single error kind at
/// the process boundary; higher layers propagate it without reinterpreting.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("`{invocation}` exited with code {exit_code}: {stderr}")]
    CommandFailed {
        invocation: Invocation,
        exit_code: i32,
        stderr: String,
    },
}

impl ExecError {
    /// Captured stderr of the failed invocation, if it ran at all.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            ExecError::CommandFailed { stderr, .. } => Some(stderr),
            ExecError::Spawn { .. } => None,
        }
    }
}

/// Executes external tool invocations.
///
/// The production implementation spawns real processes; tests substitute a
/// scripted runner to drive the provisioning sequence hermetically.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run an invocation to completion, capturing stdout and stderr.
    /// Non-zero exit is an error; there are no retries and no timeout.
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError>;
}

#[async_trait]
impl<'a, T: CommandRunner + ?Sized> CommandRunner for &'a T {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError> {
        (**self).run(invocation).await
    }
}

/// Runner backed by `tokio::process`, blocking each step on the full
/// lifetime of the spawned tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliRunner;

#[async_trait]
impl CommandRunner for CliRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError> {
        tracing::info!(command = %invocation, "running external command");

        let output = Command::new(invocation.program())
            .args(invocation.args())
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| ExecError::Spawn {
                program: invocation.program().to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        // Terminated by signal leaves no code; treat as -1.
        let exit_code = output.status.code().unwrap_or(-1);

        if !output.status.success() {
            return Err(ExecError::CommandFailed {
                invocation: invocation.clone(),
                exit_code,
                stderr,
            });
        }

        tracing::debug!(command = %invocation, exit_code, "external command completed");

        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(program: &str, args: &[&str]) -> Invocation {
        Invocation::new(program, args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn invocation_renders_as_command_line() {
        let inv = invocation("az", &["group", "exists", "--name", "rg1"]);
        assert_eq!(inv.to_string(), "az group exists --name rg1");
    }

    #[tokio::test]
    async fn captures_stdout_of_successful_command() {
        let out = CliRunner
            .run(&invocation("sh", &["-c", "printf hello"]))
            .await
            .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout_trimmed(), "hello");
    }

    #[tokio::test]
    async fn nonzero_exit_becomes_command_failed() {
        let err = CliRunner
            .run(&invocation("sh", &["-c", "echo oops >&2; exit 3"]))
            .await
            .unwrap_err();
        match err {
            ExecError::CommandFailed {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, 3);
                assert!(stderr.contains("oops"));
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let err = CliRunner
            .run(&invocation("definitely-not-a-real-binary-5d41", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }
}
