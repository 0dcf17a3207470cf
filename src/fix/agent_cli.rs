//! Agent CLI strategy - hands the prompt to a coding-agent binary
//!
//! The agent runs in the project directory with the rendered prompt on stdin
//! and is expected to edit files in place before it exits.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::traits::{FixRequest, FixStrategy};
use crate::error::{AutoTddError, Result};

/// How much of the agent's stderr to keep in error messages
const STDERR_TAIL_CHARS: usize = 2_000;

/// Configuration for the agent process
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Binary to run
    pub program: String,
    /// Arguments passed before the prompt is written to stdin
    pub args: Vec<String>,
    /// Extra environment variables
    pub env: Vec<(String, String)>,
    /// Timeout for one dispatch
    pub timeout: Duration,
    /// Timeout for the preflight `--version` probe
    pub preflight_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            program: "claude".to_string(),
            args: vec![
                "-p".to_string(),
                "--permission-mode".to_string(),
                "acceptEdits".to_string(),
            ],
            env: Vec::new(),
            timeout: Duration::from_secs(1800),
            preflight_timeout: Duration::from_secs(30),
        }
    }
}

impl AgentConfig {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            ..Default::default()
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Fix strategy backed by an external agent CLI
pub struct AgentCliStrategy {
    config: AgentConfig,
}

impl AgentCliStrategy {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    pub fn program(&self) -> &str {
        &self.config.program
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.config.program);
        // Allow nesting inside a running agent session
        cmd.env_remove("CLAUDECODE");
        for (key, value) in &self.config.env {
            cmd.env(key, value);
        }
        cmd.kill_on_drop(true);
        cmd
    }

    fn exit_error(&self, code: Option<i32>, stderr: &[u8]) -> AutoTddError {
        let stderr = String::from_utf8_lossy(stderr);
        let tail = tail_chars(stderr.trim(), STDERR_TAIL_CHARS);
        let status = match code {
            Some(code) => format!("exited with code {}", code),
            None => "was terminated by signal".to_string(),
        };
        if tail.is_empty() {
            AutoTddError::Collaborator(format!("{} {}", self.config.program, status))
        } else {
            AutoTddError::Collaborator(format!("{} {}\nstderr: {}", self.config.program, status, tail))
        }
    }
}

#[async_trait]
impl FixStrategy for AgentCliStrategy {
    async fn preflight(&self) -> Result<()> {
        let mut cmd = self.command();
        cmd.arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|e| {
            AutoTddError::Collaborator(format!("cannot start '{}': {}", self.config.program, e))
        })?;

        let output = tokio::time::timeout(self.config.preflight_timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                AutoTddError::Collaborator(format!(
                    "'{} --version' did not finish within {:?}",
                    self.config.program, self.config.preflight_timeout
                ))
            })??;

        if !output.status.success() {
            return Err(self.exit_error(output.status.code(), &output.stderr));
        }

        log::info!(
            "Collaborator '{}' available: {}",
            self.config.program,
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }

    async fn apply(&self, request: &FixRequest) -> Result<()> {
        let mut cmd = self.command();
        cmd.args(&self.config.args)
            .current_dir(&request.project_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        log::info!(
            "Dispatching {:?} request for iteration {} to '{}' ({} prompt chars)",
            request.kind,
            request.iteration,
            self.config.program,
            request.prompt.len()
        );

        let mut child = cmd.spawn().map_err(|e| {
            AutoTddError::Collaborator(format!("cannot start '{}': {}", self.config.program, e))
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(request.prompt.as_bytes()).await?;
            stdin.flush().await?;
            // Dropping stdin closes it so the agent sees EOF
        }

        let output = tokio::time::timeout(self.config.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                AutoTddError::Collaborator(format!(
                    "'{}' did not finish within {:?}",
                    self.config.program, self.config.timeout
                ))
            })??;

        log::debug!("Collaborator stdout:\n{}", String::from_utf8_lossy(&output.stdout));

        if output.status.success() {
            Ok(())
        } else {
            Err(self.exit_error(output.status.code(), &output.stderr))
        }
    }

    fn name(&self) -> &str {
        &self.config.program
    }
}

/// Keep the last `max` characters of `text`.
fn tail_chars(text: &str, max: usize) -> &str {
    let count = text.chars().count();
    if count <= max {
        return text;
    }
    match text.char_indices().nth(count - max) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fix::FixKind;
    use tempfile::TempDir;

    fn request(dir: &TempDir, prompt: &str) -> FixRequest {
        FixRequest {
            iteration: 1,
            kind: FixKind::Build,
            project_dir: dir.path().to_path_buf(),
            requirements: "reqs".to_string(),
            failure_output: "failed".to_string(),
            prompt: prompt.to_string(),
        }
    }

    fn sh(script: &str) -> AgentCliStrategy {
        AgentCliStrategy::new(AgentConfig::new("sh", vec!["-c".to_string(), script.to_string()]))
    }

    #[test]
    fn test_agent_config_default() {
        let config = AgentConfig::default();
        assert_eq!(config.program, "claude");
        assert_eq!(config.args[0], "-p");
        assert_eq!(config.timeout, Duration::from_secs(1800));
    }

    #[tokio::test]
    async fn test_apply_writes_prompt_to_stdin_in_project_dir() {
        let dir = TempDir::new().unwrap();
        let strategy = sh("cat > received.txt");

        strategy.apply(&request(&dir, "implement add()")).await.unwrap();

        let received = std::fs::read_to_string(dir.path().join("received.txt")).unwrap();
        assert_eq!(received, "implement add()");
    }

    #[tokio::test]
    async fn test_apply_nonzero_exit_is_collaborator_error() {
        let dir = TempDir::new().unwrap();
        let strategy = sh("cat >/dev/null; echo 'not authenticated' >&2; exit 3");

        let err = strategy.apply(&request(&dir, "x")).await.unwrap_err();
        match err {
            AutoTddError::Collaborator(msg) => {
                assert!(msg.contains("exited with code 3"));
                assert!(msg.contains("not authenticated"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_apply_timeout() {
        let dir = TempDir::new().unwrap();
        let config = AgentConfig::new("sh", vec!["-c".to_string(), "sleep 10".to_string()])
            .timeout(Duration::from_millis(100));
        let strategy = AgentCliStrategy::new(config);

        let err = strategy.apply(&request(&dir, "x")).await.unwrap_err();
        assert!(err.to_string().contains("did not finish"));
    }

    #[tokio::test]
    async fn test_preflight_missing_program() {
        let strategy = AgentCliStrategy::new(AgentConfig::new("nonexistent_agent_xyz123", vec![]));
        let err = strategy.preflight().await.unwrap_err();
        assert!(matches!(err, AutoTddError::Collaborator(_)));
        assert!(err.to_string().contains("cannot start"));
    }

    #[tokio::test]
    async fn test_preflight_version_probe_succeeds() {
        // `true --version` exits 0 with GNU coreutils and is ignored elsewhere
        let strategy = AgentCliStrategy::new(AgentConfig::new("true", vec![]));
        assert!(strategy.preflight().await.is_ok());
    }

    #[test]
    fn test_tail_chars() {
        assert_eq!(tail_chars("abcdef", 3), "def");
        assert_eq!(tail_chars("abc", 10), "abc");
        assert_eq!(tail_chars("héllo", 4), "éllo");
    }

    #[test]
    fn test_name_is_program() {
        let strategy = AgentCliStrategy::new(AgentConfig::default());
        assert_eq!(strategy.name(), "claude");
        assert_eq!(strategy.program(), "claude");
    }
}
