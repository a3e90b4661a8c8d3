use crate::program::{EvolutionError, ProgramId};
use thiserror::Error;

/// Fatal conditions for a single behaviour. The simulation aborts only the
/// affected agent's behaviour and keeps stepping the others.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BehaviourError {
    #[error("behaviour updated before setup")]
    NotSetUp,
    #[error("no performance recorded for controller {0}")]
    Unevaluated(ProgramId),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("evolution failed: {0}")]
    Evolution(#[from] EvolutionError),
}
