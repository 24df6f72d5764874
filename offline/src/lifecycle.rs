//! Worker Lifecycle
//!
//! State of the offline worker itself, separate from the cache generations
//! it manages: `Parsed → Installing → Installed → Activating → Activated`,
//! with `Redundant` when install or activation fails or a newer worker
//! takes over.

use std::fmt;

use log::debug;

/// Worker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerState {
    /// Script evaluated, nothing run yet
    #[default]
    Parsed,
    /// Install in progress
    Installing,
    /// Installed, waiting to activate
    Installed,
    /// Activation in progress
    Activating,
    /// Active, controlling clients
    Activated,
    /// Replaced or failed
    Redundant,
}

/// Lifecycle error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// Transition not allowed from the current state
    InvalidTransition { from: WorkerState, to: WorkerState },
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleError::InvalidTransition { from, to } => {
                write!(f, "invalid worker transition {:?} -> {:?}", from, to)
            }
        }
    }
}

impl std::error::Error for LifecycleError {}

/// Tracks the worker state; every change goes through the transition table.
#[derive(Debug, Default)]
pub struct WorkerLifecycle {
    state: WorkerState,
}

impl WorkerLifecycle {
    /// A freshly parsed worker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Whether the worker is activated
    pub fn is_active(&self) -> bool {
        self.state == WorkerState::Activated
    }

    /// Whether the worker is installed and waiting
    pub fn is_waiting(&self) -> bool {
        self.state == WorkerState::Installed
    }

    /// Transition worker state
    pub fn transition_state(&mut self, new_state: WorkerState) -> Result<(), LifecycleError> {
        let old_state = self.state;
        if !is_valid_transition(old_state, new_state) {
            return Err(LifecycleError::InvalidTransition {
                from: old_state,
                to: new_state,
            });
        }

        self.state = new_state;
        debug!("[Peeble SW] worker {:?} -> {:?}", old_state, new_state);
        Ok(())
    }
}

/// Check if a state transition is valid
fn is_valid_transition(from: WorkerState, to: WorkerState) -> bool {
    use WorkerState::*;

    matches!(
        (from, to),
        (Parsed, Installing)
            | (Installing, Installed)
            | (Installing, Redundant) // install failed
            | (Installed, Activating)
            | (Installed, Redundant) // superseded while waiting
            | (Activating, Activated)
            | (Activating, Redundant) // activate failed
            | (Activated, Redundant) // replaced by a newer worker
    )
}
