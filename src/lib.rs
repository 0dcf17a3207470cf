//! autotdd - drive an external coding agent through test-driven development
//!
//! The convergence loop runs a project's test suite, relays each failure to a
//! fix collaborator, and repeats until the suite is green or the iteration
//! budget is spent.

pub mod config;
pub mod domain;
pub mod error;
pub mod fix;
pub mod prompt;
pub mod report;
pub mod runner;
pub mod scaffold;
pub mod validation;

pub use error::{AutoTddError, Result};
