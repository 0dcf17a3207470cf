//! File configuration for autotdd.
//!
//! Search order:
//! 1. Explicit path if provided
//! 2. ~/.config/autotdd/autotdd.yml (user config)
//! 3. ./autotdd.yml (project config)
//! 4. Default values

use colored::*;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::run_config::{DEFAULT_REQUIREMENTS_FILE, DEFAULT_TEST_COMMAND};
use crate::domain::{RunConfig, ScaffoldLayout};
use crate::fix::AgentConfig;
use crate::validation::CommandConfig;
use crate::validation::command::DEFAULT_CRASH_EXIT_CODES;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub requirements_file: PathBuf,
    pub test: TestConfig,
    pub fix: FixConfig,
    pub scaffold: ScaffoldLayout,
    pub report: ReportConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    pub command: String,
    pub timeout_ms: u64,
    pub crash_exit_codes: Vec<i32>,
    pub fail_fast_on_crash: bool,
    /// Extra environment for the test command
    pub env: BTreeMap<String, String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_TEST_COMMAND.to_string(),
            timeout_ms: 60_000,
            crash_exit_codes: DEFAULT_CRASH_EXIT_CODES.to_vec(),
            fail_fast_on_crash: false,
            env: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FixConfig {
    pub program: String,
    pub args: Vec<String>,
    pub timeout_ms: u64,
    pub system_instructions_file: PathBuf,
    /// Extra environment for the agent process
    pub env: BTreeMap<String, String>,
}

impl Default for FixConfig {
    fn default() -> Self {
        let agent = AgentConfig::default();
        Self {
            program: agent.program,
            args: agent.args,
            timeout_ms: agent.timeout.as_millis() as u64,
            system_instructions_file: PathBuf::from("SYSTEM_INSTRUCTIONS.md"),
            env: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub enabled: bool,
    pub coverage_command: Option<String>,
    pub state_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            coverage_command: Some("pytest tests/ --cov=src --cov-report=term".to_string()),
            state_dir: PathBuf::from(".autotdd"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub save_prompts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            requirements_file: PathBuf::from(DEFAULT_REQUIREMENTS_FILE),
            test: TestConfig::default(),
            fix: FixConfig::default(),
            scaffold: ScaffoldLayout::default(),
            report: ReportConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_name = env!("CARGO_PKG_NAME");
        let mut candidates = Vec::new();
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join(project_name).join(format!("{}.yml", project_name)));
        }
        candidates.push(PathBuf::from(format!("{}.yml", project_name)));

        Ok(Self::load_from_candidates(&candidates))
    }

    /// First candidate that exists and parses wins; broken files are skipped
    /// with a warning on stderr, since logging is not set up yet.
    pub fn load_from_candidates(candidates: &[PathBuf]) -> Self {
        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => {
                    eprintln!(
                        "{} ignoring config {}: {:#}",
                        "warning:".yellow().bold(),
                        path.display(),
                        e
                    );
                    log::warn!("Failed to load config from {}: {:#}", path.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Self::default()
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Build the run config for `project_dir` from this file config
    pub fn run_config(&self, project_dir: impl Into<PathBuf>, max_iterations: u32) -> Result<RunConfig> {
        let run = RunConfig::new(project_dir, max_iterations)?
            .with_test_command(&self.test.command)
            .with_requirements(&self.requirements_file)
            .with_fail_fast_on_crash(self.test.fail_fast_on_crash)
            .with_layout(self.scaffold.clone())
            .with_state_dir(&self.report.state_dir);
        Ok(run)
    }

    /// Shell command settings for the test suite
    pub fn test_command_config(&self, command: &str) -> CommandConfig {
        let config = CommandConfig::new(command)
            .timeout(Duration::from_millis(self.test.timeout_ms))
            .crash_exit_codes(self.test.crash_exit_codes.clone());
        self.test.env.iter().fold(config, |config, (key, value)| config.env(key, value))
    }

    /// Process settings for the agent collaborator
    pub fn agent_config(&self) -> AgentConfig {
        let agent =
            AgentConfig::new(&self.fix.program, self.fix.args.clone()).timeout(Duration::from_millis(self.fix.timeout_ms));
        self.fix.env.iter().fold(agent, |agent, (key, value)| agent.env(key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.requirements_file, PathBuf::from("PROJECT_REQUIREMENTS.md"));
        assert_eq!(config.test.command, "pytest tests/ -v --tb=short");
        assert_eq!(config.test.timeout_ms, 60_000);
        assert_eq!(config.fix.program, "claude");
        assert!(config.report.enabled);
        assert!(!config.debug.save_prompts);
    }

    #[test]
    fn test_load_explicit_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("autotdd.yml");
        fs::write(
            &path,
            r#"
test:
  command: "cargo test"
  fail_fast_on_crash: true
fix:
  program: codex
  args: ["exec", "--full-auto"]
scaffold:
  marker_files: []
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.test.command, "cargo test");
        assert!(config.test.fail_fast_on_crash);
        assert_eq!(config.test.timeout_ms, 60_000);
        assert_eq!(config.fix.program, "codex");
        assert_eq!(config.fix.args, vec!["exec", "--full-auto"]);
        assert!(config.scaffold.marker_files.is_empty());
        assert_eq!(config.scaffold.source_dir, PathBuf::from("src"));
    }

    #[test]
    fn test_load_explicit_missing_file_errors() {
        let path = PathBuf::from("/nonexistent/autotdd.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_load_explicit_invalid_yaml_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yml");
        fs::write(&path, "test: [unclosed").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_candidates_skip_broken_file() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join("user.yml");
        let good = dir.path().join("project.yml");
        fs::write(&broken, "test: [unclosed").unwrap();
        fs::write(&good, "test:\n  command: \"make check\"\n").unwrap();

        let config = Config::load_from_candidates(&[broken, good]);
        assert_eq!(config.test.command, "make check");
    }

    #[test]
    fn test_candidates_first_valid_wins() {
        let dir = TempDir::new().unwrap();
        let user = dir.path().join("user.yml");
        let project = dir.path().join("project.yml");
        fs::write(&user, "requirements_file: REQS.md\n").unwrap();
        fs::write(&project, "requirements_file: PRD.md\n").unwrap();

        let config = Config::load_from_candidates(&[dir.path().join("missing.yml"), user, project]);
        assert_eq!(config.requirements_file, PathBuf::from("REQS.md"));
    }

    #[test]
    fn test_candidates_all_broken_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join("bad.yml");
        fs::write(&broken, "fix: {program: [").unwrap();

        let config = Config::load_from_candidates(&[broken, dir.path().join("absent.yml")]);
        assert_eq!(config.test.command, "pytest tests/ -v --tb=short");
        assert_eq!(config.fix.program, "claude");
    }

    #[test]
    fn test_env_maps_feed_process_configs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("autotdd.yml");
        fs::write(
            &path,
            r#"
test:
  env:
    PYTHONPATH: src
fix:
  env:
    ANTHROPIC_MODEL: sonnet
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        let command = config.test_command_config("pytest");
        assert_eq!(command.env, vec![("PYTHONPATH".to_string(), "src".to_string())]);
        let agent = config.agent_config();
        assert_eq!(agent.env, vec![("ANTHROPIC_MODEL".to_string(), "sonnet".to_string())]);
    }

    #[test]
    fn test_run_config_from_file_config() {
        let mut config = Config::default();
        config.requirements_file = PathBuf::from("docs/PRD.md");
        config.test.command = "make test".to_string();

        let run = config.run_config("/work", 7).unwrap();
        assert_eq!(run.max_iterations, 7);
        assert_eq!(run.test_command, "make test");
        assert_eq!(run.requirements_path, PathBuf::from("/work/docs/PRD.md"));
        assert_eq!(run.state_dir, PathBuf::from("/work/.autotdd"));
        assert!(!run.clean);
    }

    #[test]
    fn test_run_config_rejects_zero_budget() {
        assert!(Config::default().run_config("/work", 0).is_err());
    }

    #[test]
    fn test_agent_and_command_configs() {
        let mut config = Config::default();
        config.test.timeout_ms = 1_500;
        config.fix.timeout_ms = 9_000;

        let command = config.test_command_config("pytest");
        assert_eq!(command.command, "pytest");
        assert_eq!(command.timeout, Duration::from_millis(1_500));

        let agent = config.agent_config();
        assert_eq!(agent.program, "claude");
        assert_eq!(agent.timeout, Duration::from_millis(9_000));
    }
}
