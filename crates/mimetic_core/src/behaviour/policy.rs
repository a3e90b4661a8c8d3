//! The seam between the shared arbitration engine and each strategy.

use super::scaling::scale;
use crate::config::ArbitrationConfig;
use mimetic_data::{AgentState, BehaviourKind};
use std::fmt::Debug;

/// Read-only copy of what a policy may look at during one tick.
#[derive(Debug, Clone, Copy)]
pub struct AgentView {
    /// Behaviour tick the view was taken on.
    pub tick: u64,
    pub agent: AgentState,
    pub mediator: AgentState,
    pub width: f64,
    pub height: f64,
}

impl AgentView {
    #[must_use]
    pub fn scaled_x(&self, x: f64) -> f64 {
        scale(x, -self.width / 2.0, self.width / 2.0)
    }

    #[must_use]
    pub fn scaled_y(&self, y: f64) -> f64 {
        scale(y, -self.height / 2.0, self.height / 2.0)
    }

    /// Scaled position interleaved with raw velocity: `x, vx, y, vy`.
    #[must_use]
    pub fn kinematic_inputs(&self) -> [f64; 4] {
        [
            self.scaled_x(self.agent.position.x),
            self.agent.velocity.x,
            self.scaled_y(self.agent.position.y),
            self.agent.velocity.y,
        ]
    }
}

/// Everything that distinguishes one utility-driven strategy from another.
pub trait ScoringPolicy {
    /// What gets appended to the ledger every tick.
    type Record: Clone + Debug;

    fn kind(&self) -> BehaviourKind;

    fn num_inputs(&self) -> usize;

    /// Called once at setup with the agent's starting state.
    fn bind(&mut self, _agent: &AgentState) {}

    fn inputs(&mut self, view: &AgentView) -> Vec<f64>;

    /// Per-tick contribution, given the state before and after the move.
    fn record(&mut self, before: &AgentView, after: &AgentView) -> Self::Record;

    /// Score of the last `window` records of a controller's history.
    fn window_score(&self, history: &[Self::Record], window: usize) -> f64;

    fn update_utility(&self, utility: f64, score: f64, params: &ArbitrationConfig) -> f64;

    /// Fitness handed to evolution. `window_scores` are the scores this
    /// controller received at each maturation boundary.
    fn evolution_fitness(&self, records: &[Self::Record], window_scores: &[f64]) -> f64;

    fn reselect_mediator_on_switch(&self) -> bool {
        false
    }
}

/// Arithmetic mean, 0 for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// The last `window` items (all of them when fewer).
#[must_use]
pub fn last_window<T>(history: &[T], window: usize) -> &[T] {
    &history[history.len().saturating_sub(window)..]
}
