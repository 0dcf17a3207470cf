//! User-facing reporting: live progress, the last-run log, and the
//! completion report.

pub mod completion;
pub mod progress;

pub use completion::{COMPLETION_REPORT_FILE, CompletionReport, CoverageSection, read_last_run, write_last_run};
pub use progress::{ConsoleReporter, NullNotifier, ProgressNotifier};
