//! Social fitness: a controller is scored on how fast it improves fitness,
//! with the mediator's position and fitness visible to the controller.

use super::policy::{last_window, mean, AgentView, ScoringPolicy};
use super::scaling::FitnessScaler;
use crate::config::ArbitrationConfig;
use mimetic_data::{AgentState, BehaviourKind};

/// Relative change between the mean of the last `window` records and the
/// mean of the `window` records before them.
///
/// With no full earlier window, `first_fitness` stands in for the previous
/// mean. A previous mean of exactly 0 yields the current mean unchanged.
#[must_use]
pub fn progression(history: &[f64], window: usize, first_fitness: f64) -> f64 {
    let window = window.max(1);
    let current = mean(last_window(history, window));
    let previous = if history.len() <= window {
        first_fitness
    } else {
        let end = history.len() - window;
        mean(&history[end.saturating_sub(window)..end])
    };
    if previous == 0.0 {
        current
    } else {
        (current - previous) / previous.abs()
    }
}

/// Utility rule shared by the progression-scored strategies.
#[must_use]
pub fn progression_utility(utility: f64, progress: f64, params: &ArbitrationConfig) -> f64 {
    if progress.abs() >= params.threshold {
        utility + progress * params.utility_update_speed
    } else {
        utility - params.utility_update_speed
    }
}

/// Mean progression, or the mean raw record for a controller that never
/// reached a maturation boundary.
#[must_use]
pub fn progression_fitness(records: &[f64], window_scores: &[f64]) -> f64 {
    if window_scores.is_empty() {
        mean(records)
    } else {
        mean(window_scores)
    }
}

/// Squared fitness change over one move.
#[must_use]
pub fn squared_delta(before: &AgentView, after: &AgentView) -> f64 {
    let delta = after.agent.fitness - before.agent.fitness;
    delta * delta
}

#[derive(Debug, Clone, Default)]
pub struct SocialFitness {
    scaler: FitnessScaler,
    first_fitness: f64,
}

impl ScoringPolicy for SocialFitness {
    type Record = f64;

    fn kind(&self) -> BehaviourKind {
        BehaviourKind::SocialFitness
    }

    fn num_inputs(&self) -> usize {
        10
    }

    fn bind(&mut self, agent: &AgentState) {
        self.first_fitness = agent.fitness;
    }

    fn inputs(&mut self, view: &AgentView) -> Vec<f64> {
        let [x, vx, y, vy] = view.kinematic_inputs();
        let own = self.scaler.scale(view.tick, view.agent.fitness);
        let mediator = self.scaler.scale(view.tick, view.mediator.fitness);
        vec![
            x,
            vx,
            y,
            vy,
            own,
            view.scaled_x(view.mediator.position.x),
            view.scaled_y(view.mediator.position.y),
            mediator,
            1.0,
            -1.0,
        ]
    }

    fn record(&mut self, before: &AgentView, after: &AgentView) -> f64 {
        squared_delta(before, after)
    }

    fn window_score(&self, history: &[f64], window: usize) -> f64 {
        progression(history, window, self.first_fitness)
    }

    fn update_utility(&self, utility: f64, score: f64, params: &ArbitrationConfig) -> f64 {
        progression_utility(utility, score, params)
    }

    fn evolution_fitness(&self, records: &[f64], window_scores: &[f64]) -> f64 {
        progression_fitness(records, window_scores)
    }
}
