use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;

use autotdd::config::Config;
use autotdd::domain::{RunConfig, TerminationOutcome};
use autotdd::fix::{AgentCliStrategy, FixStrategy, NoOpFixStrategy};
use autotdd::report::{CompletionReport, ConsoleReporter};
use autotdd::runner::{ConvergenceLoop, ConvergenceOptions};
use autotdd::validation::{ShellTestCommand, TestCommand};
use cli::Cli;

fn setup_logging(config: &Config) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("autotdd")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("autotdd.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let default_level = config.log_level.as_deref().unwrap_or("info");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn build_run_config(cli: &Cli, config: &Config) -> Result<RunConfig> {
    let project_dir = fs::canonicalize(&cli.project_dir).unwrap_or_else(|_| cli.project_dir.clone());
    let mut run = config
        .run_config(project_dir, cli.max_iterations)?
        .with_clean(cli.clean);

    if cli.fail_fast_on_crash {
        run = run.with_fail_fast_on_crash(true);
    }
    if let Some(command) = &cli.test_command {
        run = run.with_test_command(command);
    }
    Ok(run)
}

fn load_system_instructions(run: &RunConfig, config: &Config) -> Result<Option<String>> {
    let path = run.project_dir.join(&config.fix.system_instructions_file);
    if !path.is_file() {
        return Ok(None);
    }
    let text = fs::read_to_string(&path).context(format!("Failed to read {}", path.display()))?;
    info!("Loaded system instructions from {}", path.display());
    Ok(Some(text))
}

async fn run_application(cli: &Cli, config: &Config) -> Result<TerminationOutcome> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let run = build_run_config(cli, config)?;

    if run.clean {
        println!(
            "{} --clean will delete {} and {} before scaffolding",
            "warning:".yellow().bold(),
            run.source_path().display(),
            run.tests_path().display()
        );
    }

    if cli.no_fix {
        execute(cli, config, &run, NoOpFixStrategy).await
    } else {
        execute(cli, config, &run, AgentCliStrategy::new(config.agent_config())).await
    }
}

async fn execute<F: FixStrategy>(cli: &Cli, config: &Config, run: &RunConfig, strategy: F) -> Result<TerminationOutcome> {
    let tests = ShellTestCommand::new(config.test_command_config(&run.test_command));
    let options = ConvergenceOptions {
        system_instructions: load_system_instructions(run, config)?,
        save_prompts: config.debug.save_prompts,
    };

    let runner = ConvergenceLoop::new(Arc::new(tests), Arc::new(strategy))?
        .with_notifier(Arc::new(ConsoleReporter::new(cli.is_verbose())))
        .with_options(options);

    let outcome = runner.run(run).await;

    if let TerminationOutcome::Success { iterations_used } = &outcome {
        if config.report.enabled && !cli.no_report {
            report_success(config, run, *iterations_used).await;
        }
    }

    Ok(outcome)
}

/// Write the completion report, downgrading any failure to a warning.
///
/// Returns whether the report was written.
async fn report_success(config: &Config, run: &RunConfig, iterations_used: u32) -> bool {
    match write_completion_report(config, run, iterations_used).await {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to write completion report: {:#}", e);
            eprintln!("{} could not write completion report: {:#}", "warning:".yellow().bold(), e);
            false
        }
    }
}

async fn write_completion_report(config: &Config, run: &RunConfig, iterations_used: u32) -> Result<()> {
    let coverage = config
        .report
        .coverage_command
        .as_deref()
        .map(|command| ShellTestCommand::new(config.test_command_config(command)));
    let coverage_ref: Option<&dyn TestCommand> = coverage.as_ref().map(|c| c as &dyn TestCommand);

    let report = CompletionReport::collect(run, iterations_used, coverage_ref).await?;
    let path = report.write(run)?;
    println!("{} {}", "Report saved to".green(), path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(&config).context("Failed to setup logging")?;

    let outcome = tokio::select! {
        outcome = run_application(&cli, &config) => outcome.context("Application failed")?,
        _ = tokio::signal::ctrl_c() => {
            println!("\n{}", "Development interrupted by user".yellow());
            std::process::exit(1);
        }
    };

    std::process::exit(outcome.exit_code());
}
