//! CLI definition using clap.
//!
//! `autotdd [PROJECT_DIR] [MAX_ITERATIONS]` plus flags that override the
//! config file for a single run.

use clap::Parser;
use std::path::PathBuf;

use autotdd::domain::run_config::DEFAULT_MAX_ITERATIONS;

/// autotdd - drive a coding agent through a test/fix loop until the suite is green
#[derive(Parser, Debug)]
#[command(name = "autotdd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project directory containing the requirements document
    #[arg(default_value = ".")]
    pub project_dir: PathBuf,

    /// Maximum number of test/fix iterations
    #[arg(default_value_t = DEFAULT_MAX_ITERATIONS, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_iterations: u32,

    /// Optional config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output (echo failing test output)
    #[arg(short, long)]
    pub verbose: bool,

    /// Test command line, overriding the config file
    #[arg(short, long)]
    pub test_command: Option<String>,

    /// Delete the source and tests directories before scaffolding
    #[arg(long)]
    pub clean: bool,

    /// Stop instead of relaying when the test command itself cannot run
    #[arg(long)]
    pub fail_fast_on_crash: bool,

    /// Do not invoke the agent; only run tests and log what would be sent
    #[arg(long)]
    pub no_fix: bool,

    /// Skip writing COMPLETION_REPORT.md on success
    #[arg(long)]
    pub no_report: bool,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::try_parse_from(["autotdd"]).unwrap();
        assert_eq!(cli.project_dir, PathBuf::from("."));
        assert_eq!(cli.max_iterations, 50);
        assert!(!cli.verbose);
        assert!(!cli.clean);
        assert!(!cli.no_fix);
        assert!(cli.config.is_none());
        assert!(cli.test_command.is_none());
    }

    #[test]
    fn test_cli_positionals() {
        let cli = Cli::try_parse_from(["autotdd", "/work/calc", "3"]).unwrap();
        assert_eq!(cli.project_dir, PathBuf::from("/work/calc"));
        assert_eq!(cli.max_iterations, 3);
    }

    #[test]
    fn test_cli_project_dir_only() {
        let cli = Cli::try_parse_from(["autotdd", "calc"]).unwrap();
        assert_eq!(cli.project_dir, PathBuf::from("calc"));
        assert_eq!(cli.max_iterations, 50);
    }

    #[test]
    fn test_cli_rejects_zero_iterations() {
        assert!(Cli::try_parse_from(["autotdd", ".", "0"]).is_err());
    }

    #[test]
    fn test_cli_rejects_non_numeric_iterations() {
        assert!(Cli::try_parse_from(["autotdd", ".", "many"]).is_err());
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "autotdd",
            "--clean",
            "--fail-fast-on-crash",
            "--no-fix",
            "--no-report",
            "-v",
            "-t",
            "cargo test",
            "-c",
            "/etc/autotdd.yml",
        ])
        .unwrap();
        assert!(cli.clean);
        assert!(cli.fail_fast_on_crash);
        assert!(cli.no_fix);
        assert!(cli.no_report);
        assert!(cli.is_verbose());
        assert_eq!(cli.test_command.as_deref(), Some("cargo test"));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/autotdd.yml")));
    }

    #[test]
    fn test_help_works() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag() {
        let result = Cli::try_parse_from(["autotdd", "--version"]);
        assert!(result.is_err());
    }
}
