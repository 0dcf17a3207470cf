//! No-op strategy - logs the request and leaves the tree untouched.
//!
//! Useful for watching the loop against a tree someone else is editing, or
//! for checking a project's setup without invoking an agent.

use async_trait::async_trait;

use super::traits::{FixRequest, FixStrategy};
use crate::error::Result;

pub struct NoOpFixStrategy;

#[async_trait]
impl FixStrategy for NoOpFixStrategy {
    async fn apply(&self, request: &FixRequest) -> Result<()> {
        log::info!(
            "No-op collaborator skipping {:?} request for iteration {} ({} chars of failure output)",
            request.kind,
            request.iteration,
            request.failure_output.len()
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "no-op"
    }
}
