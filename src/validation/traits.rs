//! Core test-command interfaces

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Outcome of one invocation of the test command.
///
/// `Crashed` means the command never produced a meaningful pass/fail signal
/// (it could not be spawned, or the shell could not find/execute it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestRun {
    /// All tests passed
    Passed { output: String, duration: Duration },
    /// At least one test failed, or the run timed out
    Failed {
        output: String,
        exit_code: Option<i32>,
        duration: Duration,
    },
    /// The test command could not be invoked
    Crashed { reason: String, duration: Duration },
}

impl TestRun {
    pub fn passed(&self) -> bool {
        matches!(self, TestRun::Passed { .. })
    }

    pub fn is_crash(&self) -> bool {
        matches!(self, TestRun::Crashed { .. })
    }

    /// Text relayed to the fix collaborator and shown to the user
    pub fn output(&self) -> &str {
        match self {
            TestRun::Passed { output, .. } | TestRun::Failed { output, .. } => output,
            TestRun::Crashed { reason, .. } => reason,
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            TestRun::Passed { .. } => Some(0),
            TestRun::Failed { exit_code, .. } => *exit_code,
            TestRun::Crashed { .. } => None,
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            TestRun::Passed { duration, .. }
            | TestRun::Failed { duration, .. }
            | TestRun::Crashed { duration, .. } => *duration,
        }
    }
}

/// Something that runs the project's test suite.
///
/// Implementations never return an error: any way the run can go wrong is
/// folded into a `TestRun` variant so the loop can relay it.
#[async_trait]
pub trait TestCommand: Send + Sync {
    /// Run the suite against the tree rooted at `project_dir`
    async fn run(&self, project_dir: &Path) -> TestRun;

    /// Get a description of what this command runs
    fn description(&self) -> &str {
        "test command"
    }
}
