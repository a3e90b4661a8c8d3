//! Fitness exploitation: progression scoring like social fitness, but the
//! controller only sees the agent itself.

use super::policy::{AgentView, ScoringPolicy};
use super::scaling::FitnessScaler;
use super::social_fitness::{progression, progression_fitness, progression_utility, squared_delta};
use crate::config::ArbitrationConfig;
use mimetic_data::{AgentState, BehaviourKind};

#[derive(Debug, Clone, Default)]
pub struct FitnessExploitation {
    scaler: FitnessScaler,
    first_fitness: f64,
    previous_fitness: f64,
}

impl ScoringPolicy for FitnessExploitation {
    type Record = f64;

    fn kind(&self) -> BehaviourKind {
        BehaviourKind::FitnessExploitation
    }

    fn num_inputs(&self) -> usize {
        8
    }

    fn bind(&mut self, agent: &AgentState) {
        self.first_fitness = agent.fitness;
        self.previous_fitness = agent.fitness;
    }

    /// `x, vx, y, vy, fitness, previous fitness, 1, -1`.
    fn inputs(&mut self, view: &AgentView) -> Vec<f64> {
        let [x, vx, y, vy] = view.kinematic_inputs();
        let current = self.scaler.scale(view.tick, view.agent.fitness);
        let previous = self.scaler.scale(view.tick, self.previous_fitness);
        vec![x, vx, y, vy, current, previous, 1.0, -1.0]
    }

    fn record(&mut self, before: &AgentView, after: &AgentView) -> f64 {
        self.previous_fitness = before.agent.fitness;
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
