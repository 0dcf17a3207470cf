//! Run termination types.
//!
//! A run produces exactly one `TerminationOutcome`, which also decides the
//! process exit code.

use serde::{Deserialize, Serialize};

/// Terminal result of a convergence run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TerminationOutcome {
    /// The test suite passed on iteration `iterations_used`
    Success { iterations_used: u32 },
    /// Every iteration in the budget failed
    Exhausted { iterations_used: u32, last_output: String },
    /// A prerequisite was missing; no iteration ran
    SetupFailure { reason: String },
    /// The run stopped early after iterations began
    Aborted { iterations_used: u32, reason: String },
}

impl TerminationOutcome {
    pub fn setup_failure(reason: impl Into<String>) -> Self {
        Self::SetupFailure { reason: reason.into() }
    }

    pub fn aborted(iterations_used: u32, reason: impl Into<String>) -> Self {
        Self::Aborted {
            iterations_used,
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Number of test passes that ran (zero for setup failures)
    pub fn iterations_used(&self) -> u32 {
        match self {
            Self::Success { iterations_used }
            | Self::Exhausted { iterations_used, .. }
            | Self::Aborted { iterations_used, .. } => *iterations_used,
            Self::SetupFailure { .. } => 0,
        }
    }

    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }
}
