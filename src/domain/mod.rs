//! Domain types for autotdd
//!
//! This module contains the core domain types:
//! - RunConfig: Everything one convergence run needs, built once at startup
//! - IterationResult: What a single test pass observed
//! - TerminationOutcome: The single terminal result of a run
//! - LoopState: Where the convergence loop is in its lifecycle

pub mod iteration;
pub mod outcome;
pub mod run_config;
pub mod state;

pub use iteration::IterationResult;
pub use outcome::TerminationOutcome;
pub use run_config::{RunConfig, ScaffoldLayout};
pub use state::LoopState;
