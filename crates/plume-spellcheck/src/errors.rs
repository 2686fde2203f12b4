use crate::gate::GateState;

/// Errors surfaced by the gate to its caller.
///
/// Remote grammar failures never appear here: they degrade to an empty
/// finding list inside the remote client.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CheckError {
    /// Empty or whitespace-only text, rejected before any checker runs.
    #[error("Le message est vide")]
    EmptyText,

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: GateState,
        action: &'static str,
    },
}
