//! Test suite invocation.
//! The test command is the loop's only source of pass/fail truth.

pub mod command;
pub mod traits;

pub use command::{CommandConfig, ShellTestCommand};
pub use traits::{TestCommand, TestRun};
