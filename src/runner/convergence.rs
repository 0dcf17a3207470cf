//! Convergence loop - run tests, relay failures, repeat until green.
//!
//! The loop owns no repair logic. Each pass runs the test command; a failing
//! pass is rendered into a prompt and handed to the fix strategy, and the
//! loop waits for the strategy to finish before testing again.

use std::fs;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, info, warn};

use crate::domain::{IterationResult, LoopState, RunConfig, TerminationOutcome};
use crate::error::{AutoTddError, Result};
use crate::fix::{FixKind, FixRequest, FixStrategy};
use crate::prompt::{BUILD_TEMPLATE, DEBUG_TEMPLATE, PromptContext, PromptRenderer};
use crate::report::{NullNotifier, ProgressNotifier, write_last_run};
use crate::scaffold::Scaffolder;
use crate::validation::TestCommand;

/// Reason reported when the requirements document is absent
pub const MISSING_REQUIREMENTS: &str = "missing requirements";

/// Knobs that do not belong to a single run's `RunConfig`
#[derive(Debug, Clone, Default)]
pub struct ConvergenceOptions {
    /// Extra instructions embedded in the build prompt
    pub system_instructions: Option<String>,
    /// Write every dispatched prompt under `<state_dir>/prompts/`
    pub save_prompts: bool,
}

/// Drives the bounded test/fix cycle.
pub struct ConvergenceLoop<T, F>
where
    T: TestCommand,
    F: FixStrategy,
{
    test_command: Arc<T>,
    fix_strategy: Arc<F>,
    prompt_renderer: PromptRenderer,
    notifier: Arc<dyn ProgressNotifier>,
    options: ConvergenceOptions,
}

impl<T, F> ConvergenceLoop<T, F>
where
    T: TestCommand,
    F: FixStrategy,
{
    pub fn new(test_command: Arc<T>, fix_strategy: Arc<F>) -> Result<Self> {
        Ok(Self {
            test_command,
            fix_strategy,
            prompt_renderer: PromptRenderer::new()?,
            notifier: Arc::new(NullNotifier),
            options: ConvergenceOptions::default(),
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn ProgressNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_options(mut self, options: ConvergenceOptions) -> Self {
        self.options = options;
        self
    }

    /// Run to a terminal outcome.
    ///
    /// Never returns an error: every failure mode maps onto a
    /// `TerminationOutcome` variant.
    pub async fn run(&self, config: &RunConfig) -> TerminationOutcome {
        let mut state = LoopState::Idle;
        self.notifier.on_run_start(config, self.fix_strategy.name());

        let outcome = self.drive(config, &mut state).await;

        info!(
            "Run finished in state {} after {} iteration(s): {:?}",
            state,
            outcome.iterations_used(),
            outcome_label(&outcome)
        );
        self.notifier.on_finish(&outcome, config);
        outcome
    }

    async fn drive(&self, config: &RunConfig, state: &mut LoopState) -> TerminationOutcome {
        // Idle: everything that must hold before the tree is touched
        if !config.requirements_path.is_file() {
            error!("{}", AutoTddError::MissingRequirements(config.requirements_path.clone()));
            advance(state, LoopState::SetupFailure);
            return TerminationOutcome::setup_failure(MISSING_REQUIREMENTS);
        }

        let requirements = match fs::read_to_string(&config.requirements_path) {
            Ok(text) => text,
            Err(e) => {
                advance(state, LoopState::SetupFailure);
                return TerminationOutcome::setup_failure(format!(
                    "cannot read requirements {}: {}",
                    config.requirements_path.display(),
                    e
                ));
            }
        };
        self.notifier.on_requirements_loaded(requirements.len());

        if let Err(e) = self.fix_strategy.preflight().await {
            error!("Collaborator '{}' failed preflight: {}", self.fix_strategy.name(), e);
            advance(state, LoopState::SetupFailure);
            return TerminationOutcome::setup_failure(format!("collaborator unavailable: {}", e));
        }

        advance(state, LoopState::Scaffolding);
        match Scaffolder::new(config).ensure() {
            Ok(report) => self.notifier.on_scaffolded(&report),
            Err(e) => {
                advance(state, LoopState::SetupFailure);
                return TerminationOutcome::setup_failure(e.to_string());
            }
        }

        let mut last_output = String::new();

        for iteration in 1..=config.max_iterations {
            advance(state, LoopState::Running(iteration));
            self.notifier.on_iteration_start(iteration, config.max_iterations);

            let started_at = Utc::now();
            let run = self.test_command.run(&config.project_dir).await;
            let result = IterationResult::new(
                iteration,
                run.passed(),
                run.output(),
                run.exit_code(),
                run.duration(),
                started_at,
            );

            if let Err(e) = write_last_run(config, &result) {
                warn!("Failed to write last-run log: {}", e);
            }
            self.notifier.on_iteration_complete(&result);
            info!("Iteration {}/{}: {}", iteration, config.max_iterations, result.status_label());

            if result.passed {
                advance(state, LoopState::Success);
                return TerminationOutcome::Success {
                    iterations_used: iteration,
                };
            }

            if run.is_crash() && config.fail_fast_on_crash {
                advance(state, LoopState::Aborted);
                return TerminationOutcome::aborted(iteration, format!("test command crashed: {}", run.output()));
            }

            // Nothing would observe a fix made after the final test run
            if iteration == config.max_iterations {
                last_output = result.raw_output;
                break;
            }

            let request = match self.build_request(config, iteration, &requirements, &result.raw_output) {
                Ok(request) => request,
                Err(e) => {
                    advance(state, LoopState::Aborted);
                    return TerminationOutcome::aborted(iteration, e.to_string());
                }
            };

            if self.options.save_prompts {
                self.save_prompt(config, &request);
            }

            self.notifier.on_fix_dispatch(&request, self.fix_strategy.name());
            if let Err(e) = self.fix_strategy.apply(&request).await {
                error!("Collaborator failed on iteration {}: {}", iteration, e);
                advance(state, LoopState::Aborted);
                return TerminationOutcome::aborted(iteration, format!("collaborator failed: {}", e));
            }

            last_output = result.raw_output;
        }

        advance(state, LoopState::Exhausted);
        TerminationOutcome::Exhausted {
            iterations_used: config.max_iterations,
            last_output,
        }
    }

    fn build_request(
        &self,
        config: &RunConfig,
        iteration: u32,
        requirements: &str,
        failure_output: &str,
    ) -> Result<FixRequest> {
        let kind = if iteration == 1 { FixKind::Build } else { FixKind::Fix };
        let template = match kind {
            FixKind::Build => BUILD_TEMPLATE,
            FixKind::Fix => DEBUG_TEMPLATE,
        };

        let context = PromptContext {
            iteration,
            requirements: requirements.to_string(),
            system_instructions: self.options.system_instructions.clone(),
            failure_output: Some(failure_output.to_string()),
            source_dir: config.layout.source_dir.display().to_string(),
            tests_dir: config.layout.tests_dir.display().to_string(),
        };
        let prompt = self.prompt_renderer.render(template, &context)?;

        Ok(FixRequest {
            iteration,
            kind,
            project_dir: config.project_dir.clone(),
            requirements: requirements.to_string(),
            failure_output: failure_output.to_string(),
            prompt,
        })
    }

    fn save_prompt(&self, config: &RunConfig, request: &FixRequest) {
        let dir = config.state_dir.join("prompts");
        let path = dir.join(format!("iteration-{:03}.md", request.iteration));
        let written = fs::create_dir_all(&dir).and_then(|_| fs::write(&path, &request.prompt));
        match written {
            Ok(()) => debug!("Saved prompt to {}", path.display()),
            Err(e) => warn!("Failed to save prompt to {}: {}", path.display(), e),
        }
    }
}

fn advance(state: &mut LoopState, next: LoopState) {
    debug_assert!(state.can_transition_to(next), "illegal transition {} -> {}", state, next);
    debug!("Loop state {} -> {}", state, next);
    *state = next;
}

fn outcome_label(outcome: &TerminationOutcome) -> &'static str {
    match outcome {
        TerminationOutcome::Success { .. } => "success",
        TerminationOutcome::Exhausted { .. } => "exhausted",
        TerminationOutcome::SetupFailure { .. } => "setup_failure",
        TerminationOutcome::Aborted { .. } => "aborted",
    }
}
