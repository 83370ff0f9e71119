use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use super::error::CommandError;
use super::sampler::Settings;

pub const COMMAND_TIMEOUT_KEY: &str = "command_timeout_ms";
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(5000);

/// Executes a diagnostic command and hands back its stdout.
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &str) -> impl Future<Output = Result<String, CommandError>> + Send;
}

/// Runs commands through `sh -c`, bounded by a timeout.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    timeout: Duration,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

impl ShellRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Reads the timeout from `COMMAND_TIMEOUT_KEY`, falling back to the
    /// default when unset.
    pub fn from_settings(settings: &impl Settings) -> Self {
        let timeout = settings
            .setting(COMMAND_TIMEOUT_KEY)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_COMMAND_TIMEOUT);
        Self::new(timeout)
    }
}

impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str) -> Result<String, CommandError> {
        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CommandError::Spawn {
                command: command.to_string(),
                source,
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| CommandError::Spawn {
                command: command.to_string(),
                source,
            })?,
            Err(_) => {
                return Err(CommandError::Timeout {
                    command: command.to_string(),
                    timeout: self.timeout,
                });
            }
        };

        if !output.status.success() {
            return Err(CommandError::ExitStatus {
                command: command.to_string(),
                status: output.status.to_string(),
            });
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            return Err(CommandError::Stderr {
                command: command.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout() {
        let runner = ShellRunner::default();
        let out = runner.run("echo hello").await.unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[tokio::test]
    async fn non_zero_exit_is_failure() {
        let runner = ShellRunner::default();
        let err = runner.run("exit 3").await.unwrap_err();
        assert!(matches!(err, CommandError::ExitStatus { .. }));
    }

    #[tokio::test]
    async fn stderr_output_is_failure() {
        let runner = ShellRunner::default();
        let err = runner.run("echo oops 1>&2").await.unwrap_err();
        match err {
            CommandError::Stderr { stderr, .. } => assert_eq!(stderr, "oops"),
            other => panic!("unexpected error: {other}"),
        }
    }

    struct TimeoutSetting(Option<u64>);

    impl Settings for TimeoutSetting {
        fn setting(&self, key: &str) -> Option<u64> {
            match key {
                COMMAND_TIMEOUT_KEY => self.0,
                _ => None,
            }
        }
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let runner = ShellRunner::new(Duration::from_millis(50));
        let err = runner.run("sleep 5").await.unwrap_err();
        assert!(matches!(err, CommandError::Timeout { .. }));
    }

    #[tokio::test]
    async fn timeout_comes_from_settings() {
        let runner = ShellRunner::from_settings(&TimeoutSetting(Some(50)));
        match runner.run("sleep 5").await.unwrap_err() {
            CommandError::Timeout { timeout, .. } => {
                assert_eq!(timeout, Duration::from_millis(50))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_timeout_setting_uses_default() {
        let runner = ShellRunner::from_settings(&TimeoutSetting(None));
        assert_eq!(runner.timeout, DEFAULT_COMMAND_TIMEOUT);
    }
}
