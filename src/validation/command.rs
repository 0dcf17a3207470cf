//! Shell test command
//! Executes the configured test command line and classifies the result

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

use crate::validation::traits::{TestCommand, TestRun};

/// Shell exit codes meaning "command not found" / "not executable"
pub const DEFAULT_CRASH_EXIT_CODES: [i32; 2] = [126, 127];

/// Configuration for a shell test command
#[derive(Debug, Clone)]
pub struct CommandConfig {
    /// The command line, run with `sh -c`
    pub command: String,
    /// Environment variables to set
    pub env: Vec<(String, String)>,
    /// Timeout for a single run
    pub timeout: Duration,
    /// Exit codes that mean the command itself could not run
    pub crash_exit_codes: Vec<i32>,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            command: String::new(),
            env: Vec::new(),
            timeout: Duration::from_secs(60),
            crash_exit_codes: DEFAULT_CRASH_EXIT_CODES.to_vec(),
        }
    }
}

impl CommandConfig {
    /// Create a new command config with the given command
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    /// Add an environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Set the timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set which exit codes count as a crash rather than a test failure
    pub fn crash_exit_codes(mut self, codes: Vec<i32>) -> Self {
        self.crash_exit_codes = codes;
        self
    }
}

/// Test command that runs a shell command line in the project directory
pub struct ShellTestCommand {
    config: CommandConfig,
}

impl ShellTestCommand {
    pub fn new(config: CommandConfig) -> Self {
        Self { config }
    }

    /// Create a command with default timeout and crash codes
    pub fn simple(command: impl Into<String>) -> Self {
        Self::new(CommandConfig::new(command))
    }

    /// Get the command line
    pub fn command(&self) -> &str {
        &self.config.command
    }

    async fn execute(&self, project_dir: &Path) -> std::io::Result<Option<std::process::Output>> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&self.config.command);
        cmd.current_dir(project_dir);

        for (key, value) in &self.config.env {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn()?;

        match tokio::time::timeout(self.config.timeout, child.wait_with_output()).await {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        }
    }
}

#[async_trait]
impl TestCommand for ShellTestCommand {
    async fn run(&self, project_dir: &Path) -> TestRun {
        let start = Instant::now();
        let result = self.execute(project_dir).await;
        let duration = start.elapsed();

        match result {
            Ok(Some(output)) => {
                let combined = combine_output(&output.stdout, &output.stderr);
                let exit_code = output.status.code();

                if output.status.success() {
                    TestRun::Passed {
                        output: combined,
                        duration,
                    }
                } else if exit_code.is_some_and(|code| self.config.crash_exit_codes.contains(&code)) {
                    log::warn!("Test command '{}' could not run (exit {:?})", self.config.command, exit_code);
                    TestRun::Crashed {
                        reason: format!("Test command exited with code {:?}\n{}", exit_code, combined),
                        duration,
                    }
                } else {
                    TestRun::Failed {
                        output: combined,
                        exit_code,
                        duration,
                    }
                }
            }
            Ok(None) => {
                log::warn!("Test command '{}' timed out after {:?}", self.config.command, self.config.timeout);
                TestRun::Failed {
                    output: format!("Tests timed out after {} seconds", self.config.timeout.as_secs_f64()),
                    exit_code: None,
                    duration,
                }
            }
            Err(e) => {
                log::warn!("Test command '{}' failed to start: {}", self.config.command, e);
                TestRun::Crashed {
                    reason: format!("Error running tests: {}", e),
                    duration,
                }
            }
        }
    }

    fn description(&self) -> &str {
        &self.config.command
    }
}

/// Concatenate stdout and stderr the way the suite printed them to a terminal.
fn combine_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut combined = String::from_utf8_lossy(stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(stderr));
    combined
}
