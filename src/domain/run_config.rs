//! RunConfig - the explicit input of one convergence run
//!
//! Built once at startup from CLI arguments and the config file, then passed
//! by reference through the loop. Every path the run touches is derived from
//! `project_dir`; nothing depends on the process working directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AutoTddError, Result};

/// Default name of the requirements document inside the project directory
pub const DEFAULT_REQUIREMENTS_FILE: &str = "PROJECT_REQUIREMENTS.md";

/// Default iteration budget
pub const DEFAULT_MAX_ITERATIONS: u32 = 50;

/// Default test command line
pub const DEFAULT_TEST_COMMAND: &str = "pytest tests/ -v --tb=short";

/// Where source and tests live, and which marker files make them importable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaffoldLayout {
    /// Source directory, relative to the project directory
    pub source_dir: PathBuf,
    /// Tests directory, relative to the project directory
    pub tests_dir: PathBuf,
    /// Files created (empty) in both directories when absent
    pub marker_files: Vec<String>,
}

impl Default for ScaffoldLayout {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("src"),
            tests_dir: PathBuf::from("tests"),
            marker_files: vec!["__init__.py".to_string()],
        }
    }
}

/// Configuration for a single convergence run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Root of the project being developed
    pub project_dir: PathBuf,

    /// Iteration budget, always >= 1
    pub max_iterations: u32,

    /// Shell command line that runs the test suite
    pub test_command: String,

    /// Absolute (or project-relative joined) path of the requirements document
    pub requirements_path: PathBuf,

    /// Delete the source and tests directories before scaffolding
    pub clean: bool,

    /// Stop the run when the test command itself cannot run
    pub fail_fast_on_crash: bool,

    /// Source/test layout to scaffold
    pub layout: ScaffoldLayout,

    /// Directory for transient run state (last-run log, saved prompts)
    pub state_dir: PathBuf,
}

impl RunConfig {
    /// Create a run config with defaults for everything but the directory and budget.
    ///
    /// Fails if `max_iterations` is zero.
    pub fn new(project_dir: impl Into<PathBuf>, max_iterations: u32) -> Result<Self> {
        if max_iterations == 0 {
            return Err(AutoTddError::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        let project_dir = project_dir.into();
        Ok(Self {
            requirements_path: project_dir.join(DEFAULT_REQUIREMENTS_FILE),
            state_dir: project_dir.join(".autotdd"),
            project_dir,
            max_iterations,
            test_command: DEFAULT_TEST_COMMAND.to_string(),
            clean: false,
            fail_fast_on_crash: false,
            layout: ScaffoldLayout::default(),
        })
    }

    /// Set the test command line
    pub fn with_test_command(mut self, command: impl Into<String>) -> Self {
        self.test_command = command.into();
        self
    }

    /// Set the requirements document, resolved against the project directory
    pub fn with_requirements(mut self, path: impl AsRef<Path>) -> Self {
        self.requirements_path = self.resolve(path);
        self
    }

    /// Opt into the destructive clean-then-scaffold variant
    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    /// Abort instead of relaying when the test command cannot run
    pub fn with_fail_fast_on_crash(mut self, fail_fast: bool) -> Self {
        self.fail_fast_on_crash = fail_fast;
        self
    }

    /// Set the scaffold layout
    pub fn with_layout(mut self, layout: ScaffoldLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the state directory, resolved against the project directory
    pub fn with_state_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.state_dir = self.resolve(path);
        self
    }

    /// Absolute path of the source directory
    pub fn source_path(&self) -> PathBuf {
        self.resolve(&self.layout.source_dir)
    }

    /// Absolute path of the tests directory
    pub fn tests_path(&self) -> PathBuf {
        self.resolve(&self.layout.tests_dir)
    }

    /// Path of the transient last-run output log
    pub fn last_run_log_path(&self) -> PathBuf {
        self.state_dir.join("last_run.log")
    }

    fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }
}
