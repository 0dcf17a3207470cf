//! Fix collaborators.
//!
//! The convergence loop relays failing test output through a `FixStrategy`;
//! all repair intelligence lives behind that trait.

pub mod agent_cli;
pub mod noop;
pub mod traits;

pub use agent_cli::{AgentCliStrategy, AgentConfig};
pub use noop::NoOpFixStrategy;
pub use traits::{FixKind, FixRequest, FixStrategy};
