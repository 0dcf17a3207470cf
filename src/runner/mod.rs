//! Runner module - the convergence loop.
//!
//! Provides:
//! - ConvergenceLoop for driving a test/fix cycle to a terminal outcome
//! - ConvergenceOptions for prompt-related knobs outside RunConfig

mod convergence;

pub use convergence::{ConvergenceLoop, ConvergenceOptions, MISSING_REQUIREMENTS};
