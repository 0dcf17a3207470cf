//! Lifecycle state of the convergence loop.

use std::fmt;

/// `Idle -> Scaffolding -> Running(i) -> {Running(i+1) | Success | Exhausted}`.
///
/// `SetupFailure` is reachable only from `Idle` and `Scaffolding`, `Aborted`
/// only from `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Scaffolding,
    Running(u32),
    Success,
    Exhausted,
    SetupFailure,
    Aborted,
}

impl LoopState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LoopState::Success | LoopState::Exhausted | LoopState::SetupFailure | LoopState::Aborted
        )
    }

    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: LoopState) -> bool {
        use LoopState::*;
        match (*self, next) {
            (Idle, Scaffolding) | (Idle, SetupFailure) => true,
            (Scaffolding, Running(1)) | (Scaffolding, SetupFailure) => true,
            (Running(i), Running(j)) => j == i + 1,
            (Running(_), Success) | (Running(_), Exhausted) | (Running(_), Aborted) => true,
            _ => false,
        }
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopState::Idle => write!(f, "idle"),
            LoopState::Scaffolding => write!(f, "scaffolding"),
            LoopState::Running(i) => write!(f, "running({})", i),
            LoopState::Success => write!(f, "success"),
            LoopState::Exhausted => write!(f, "exhausted"),
            LoopState::SetupFailure => write!(f, "setup_failure"),
            LoopState::Aborted => write!(f, "aborted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!LoopState::Idle.is_terminal());
        assert!(!LoopState::Scaffolding.is_terminal());
        assert!(!LoopState::Running(1).is_terminal());
        assert!(LoopState::Success.is_terminal());
        assert!(LoopState::Exhausted.is_terminal());
        assert!(LoopState::SetupFailure.is_terminal());
        assert!(LoopState::Aborted.is_terminal());
    }

    #[test]
    fn test_happy_path_transitions() {
        assert!(LoopState::Idle.can_transition_to(LoopState::Scaffolding));
        assert!(LoopState::Scaffolding.can_transition_to(LoopState::Running(1)));
        assert!(LoopState::Running(1).can_transition_to(LoopState::Running(2)));
        assert!(LoopState::Running(2).can_transition_to(LoopState::Success));
        assert!(LoopState::Running(2).can_transition_to(LoopState::Exhausted));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!LoopState::Running(1).can_transition_to(LoopState::SetupFailure));
        assert!(!LoopState::Running(1).can_transition_to(LoopState::Running(3)));
        assert!(!LoopState::Idle.can_transition_to(LoopState::Running(1)));
        assert!(!LoopState::Idle.can_transition_to(LoopState::Aborted));
        assert!(!LoopState::Success.can_transition_to(LoopState::Running(1)));
    }

    #[test]
    fn test_display() {
        assert_eq!(LoopState::Running(4).to_string(), "running(4)");
        assert_eq!(LoopState::SetupFailure.to_string(), "setup_failure");
    }
}
