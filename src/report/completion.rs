//! Run artifacts on disk: the transient last-run log and the completion report.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::domain::{IterationResult, RunConfig};
use crate::error::Result;
use crate::validation::TestCommand;

/// File name of the completion report, written into the project directory
pub const COMPLETION_REPORT_FILE: &str = "COMPLETION_REPORT.md";

fn last_run_json_path(config: &RunConfig) -> PathBuf {
    config.state_dir.join("last_run.json")
}

/// Overwrite the last-run log with the output of `result`.
///
/// Writes both a human-readable log and a JSON copy of the iteration record.
pub fn write_last_run(config: &RunConfig, result: &IterationResult) -> Result<()> {
    fs::create_dir_all(&config.state_dir)?;

    let header = format!(
        "# iteration {} ({}), exit {}, {:.1}s, started {}\n\n",
        result.iteration,
        result.status_label(),
        result.exit_code.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string()),
        result.duration.as_secs_f64(),
        result.started_at.to_rfc3339()
    );
    fs::write(config.last_run_log_path(), format!("{}{}", header, result.raw_output))?;
    fs::write(last_run_json_path(config), serde_json::to_string_pretty(result)?)?;
    Ok(())
}

/// Read back the record written by the most recent `write_last_run`
pub fn read_last_run(config: &RunConfig) -> Result<Option<IterationResult>> {
    let path = last_run_json_path(config);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

/// Summary written to `COMPLETION_REPORT.md` after a green run
#[derive(Debug, Clone)]
pub struct CompletionReport {
    pub iterations_used: u32,
    pub test_output: String,
    pub coverage: Option<CoverageSection>,
}

/// Output of the optional coverage command
#[derive(Debug, Clone)]
pub struct CoverageSection {
    pub command: String,
    pub passed: bool,
    pub output: String,
}

impl CompletionReport {
    /// Build a report from the last-run record, running coverage if configured
    pub async fn collect(
        config: &RunConfig,
        iterations_used: u32,
        coverage: Option<&dyn TestCommand>,
    ) -> Result<Self> {
        let test_output = read_last_run(config)?
            .map(|r| r.raw_output)
            .unwrap_or_default();

        let coverage = match coverage {
            Some(command) => {
                let run = command.run(&config.project_dir).await;
                if !run.passed() {
                    log::warn!("Coverage command '{}' did not pass", command.description());
                }
                Some(CoverageSection {
                    command: command.description().to_string(),
                    passed: run.passed(),
                    output: run.output().to_string(),
                })
            }
            None => None,
        };

        Ok(Self {
            iterations_used,
            test_output,
            coverage,
        })
    }

    pub fn render(&self, config: &RunConfig) -> String {
        let mut out = String::new();
        out.push_str("# Autonomous Development Complete\n\n");
        out.push_str(&format!("- Finished: {}\n", Utc::now().to_rfc3339()));
        out.push_str(&format!("- Total iterations: {}\n", self.iterations_used));
        out.push_str("- Final status: ALL TESTS PASSING\n");
        out.push_str(&format!("- Test command: `{}`\n\n", config.test_command));

        out.push_str("## Test Results\n\n```\n");
        out.push_str(self.test_output.trim_end());
        out.push_str("\n```\n\n");

        if let Some(coverage) = &self.coverage {
            out.push_str("## Coverage Report\n\n");
            if !coverage.passed {
                out.push_str(&format!("Coverage command `{}` did not succeed.\n\n", coverage.command));
            }
            out.push_str("```\n");
            out.push_str(coverage.output.trim_end());
            out.push_str("\n```\n\n");
        }

        out.push_str("## Next Steps\n\n");
        out.push_str(&format!(
            "1. Review the code in `{}/`\n",
            config.layout.source_dir.display()
        ));
        out.push_str(&format!(
            "2. Review the tests in `{}/` against the requirements\n",
            config.layout.tests_dir.display()
        ));
        out.push_str(&format!("3. Re-run `{}` to verify\n", config.test_command));
        out
    }

    /// Render and write into the project directory, returning the path
    pub fn write(&self, config: &RunConfig) -> Result<PathBuf> {
        let path = report_path(&config.project_dir);
        fs::write(&path, self.render(config))?;
        Ok(path)
    }
}

fn report_path(project_dir: &Path) -> PathBuf {
    project_dir.join(COMPLETION_REPORT_FILE)
}
