//! FixStrategy - the seam between the loop and the external collaborator

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::Result;

/// Which kind of request is being dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixKind {
    /// First dispatch of a run: implement the requirements
    Build,
    /// Later dispatch: repair the code given the latest failure
    Fix,
}

/// Everything the collaborator is handed for one dispatch
#[derive(Debug, Clone)]
pub struct FixRequest {
    /// Iteration whose failing test run triggered this request
    pub iteration: u32,
    pub kind: FixKind,
    /// Project root the collaborator works in
    pub project_dir: PathBuf,
    /// Requirements document, verbatim
    pub requirements: String,
    /// Output of the failing test run
    pub failure_output: String,
    /// Rendered prompt for text-driven collaborators
    pub prompt: String,
}

/// An external agent that edits the source and test trees.
///
/// The loop never looks at how a strategy works. `apply` must not return
/// until its edits are on disk, since the next test run starts right after.
#[async_trait]
pub trait FixStrategy: Send + Sync {
    /// Check that the collaborator can be invoked at all.
    ///
    /// Called once before any iteration. An error here ends the run with a
    /// setup failure instead of burning the iteration budget.
    async fn preflight(&self) -> Result<()> {
        Ok(())
    }

    /// Dispatch one request and wait for the collaborator to finish
    async fn apply(&self, request: &FixRequest) -> Result<()>;

    /// Short name for logs and progress output
    fn name(&self) -> &str;
}
