//! Per-iteration record.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What one pass of the convergence loop observed from the test command.
///
/// Only the most recent result is kept by the loop; earlier ones are
/// reported and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationResult {
    /// Iteration number (1-indexed)
    pub iteration: u32,

    /// Whether the test suite passed
    pub passed: bool,

    /// Combined stdout and stderr of the test command
    pub raw_output: String,

    /// Exit code, if the command ran to completion
    pub exit_code: Option<i32>,

    /// How long the test command took
    pub duration: Duration,

    /// When the test command was started
    pub started_at: DateTime<Utc>,
}

impl IterationResult {
    pub fn new(
        iteration: u32,
        passed: bool,
        raw_output: impl Into<String>,
        exit_code: Option<i32>,
        duration: Duration,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            iteration,
            passed,
            raw_output: raw_output.into(),
            exit_code,
            duration,
            started_at,
        }
    }

    /// Short label for progress lines
    pub fn status_label(&self) -> &'static str {
        if self.passed { "pass" } else { "fail" }
    }
}
