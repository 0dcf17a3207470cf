//! Progress notifications for a convergence run

use colored::*;

use crate::domain::{IterationResult, RunConfig, TerminationOutcome};
use crate::fix::FixRequest;
use crate::scaffold::ScaffoldReport;

/// Maximum number of output lines echoed in the exhaustion banner
const EXHAUSTED_TAIL_LINES: usize = 30;

/// Receives lifecycle events from the convergence loop.
///
/// All methods default to doing nothing so implementors pick what they need.
pub trait ProgressNotifier: Send + Sync {
    fn on_run_start(&self, _config: &RunConfig, _strategy: &str) {}

    fn on_requirements_loaded(&self, _chars: usize) {}

    fn on_scaffolded(&self, _report: &ScaffoldReport) {}

    fn on_iteration_start(&self, _iteration: u32, _max_iterations: u32) {}

    fn on_iteration_complete(&self, _result: &IterationResult) {}

    fn on_fix_dispatch(&self, _request: &FixRequest, _strategy: &str) {}

    fn on_finish(&self, _outcome: &TerminationOutcome, _config: &RunConfig) {}
}

/// Notifier that ignores every event
pub struct NullNotifier;

impl ProgressNotifier for NullNotifier {}

/// Prints progress and the final banner to stdout
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn rule() -> String {
        "=".repeat(80)
    }
}

impl ProgressNotifier for ConsoleReporter {
    fn on_run_start(&self, config: &RunConfig, strategy: &str) {
        println!("{}", "Starting autonomous development loop".bold());
        println!("  {} {}", "Project:".cyan(), config.project_dir.display());
        println!("  {} {}", "Tests:".cyan(), config.test_command);
        println!("  {} {}", "Collaborator:".cyan(), strategy);
        println!("  {} {}", "Budget:".cyan(), config.max_iterations);
    }

    fn on_requirements_loaded(&self, chars: usize) {
        println!("{} Requirements loaded ({} chars)", "ok".green(), chars);
    }

    fn on_scaffolded(&self, report: &ScaffoldReport) {
        for dir in &report.removed {
            println!("{} removed {}", "clean".yellow(), dir.display());
        }
        if report.is_noop() {
            println!("{} Project structure already in place", "ok".green());
        } else {
            println!(
                "{} Project structure created ({} dirs, {} files)",
                "ok".green(),
                report.created_dirs.len(),
                report.created_files.len()
            );
        }
    }

    fn on_iteration_start(&self, iteration: u32, max_iterations: u32) {
        println!("\n{} {}/{}", "Iteration".bold().blue(), iteration, max_iterations);
    }

    fn on_iteration_complete(&self, result: &IterationResult) {
        let status = if result.passed {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        println!(
            "  tests {} in {:.1}s (exit {})",
            status,
            result.duration.as_secs_f64(),
            result
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
        if self.verbose && !result.passed {
            println!("{}", result.raw_output.dimmed());
        }
    }

    fn on_fix_dispatch(&self, request: &FixRequest, strategy: &str) {
        println!(
            "  {} {:?} request to {} ({} chars)",
            "dispatching".yellow(),
            request.kind,
            strategy,
            request.prompt.len()
        );
    }

    fn on_finish(&self, outcome: &TerminationOutcome, config: &RunConfig) {
        println!("\n{}", Self::rule());
        match outcome {
            TerminationOutcome::Success { iterations_used } => {
                println!("{}", "ALL TESTS PASSED".green().bold());
                println!("Total iterations: {}", iterations_used);
            }
            TerminationOutcome::Exhausted {
                iterations_used,
                last_output,
            } => {
                println!("{}", "Max iterations reached. Development incomplete.".red().bold());
                println!("Total iterations: {}", iterations_used);
                println!("\nLast test output (tail):");
                println!("{}", tail_lines(last_output, EXHAUSTED_TAIL_LINES));
                println!(
                    "\nInspect the full output in {} and fix remaining failures manually.",
                    config.last_run_log_path().display()
                );
            }
            TerminationOutcome::SetupFailure { reason } => {
                println!("{} {}", "Setup failed:".red().bold(), reason);
            }
            TerminationOutcome::Aborted {
                iterations_used,
                reason,
            } => {
                println!("{} after {} iteration(s)", "Aborted".red().bold(), iterations_used);
                println!("{}", reason);
            }
        }
        println!("{}", Self::rule());
    }
}

/// Last `max` lines of `text`
pub(crate) fn tail_lines(text: &str, max: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(max);
    let mut result = String::new();
    if start > 0 {
        result.push_str("... (truncated)\n");
    }
    result.push_str(&lines[start..].join("\n"));
    result
}
