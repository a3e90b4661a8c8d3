//! Competition: a controller is good while the agent keeps up with its
//! mediator's best fitness.

use super::policy::{last_window, mean, AgentView, ScoringPolicy};
use super::scaling::FitnessScaler;
use crate::config::ArbitrationConfig;
use mimetic_data::BehaviourKind;

/// Slow decay factor applied while the agent keeps up.
const SLOW_DECAY: f64 = 0.01;

/// `x, vx, y, vy, best_x, best_y, 0.5, -0.5` with positions scaled to the
/// domain.
#[must_use]
pub fn competition_inputs(view: &AgentView) -> Vec<f64> {
    let [x, vx, y, vy] = view.kinematic_inputs();
    vec![
        x,
        vx,
        y,
        vy,
        view.scaled_x(view.agent.best_position.x),
        view.scaled_y(view.agent.best_position.y),
        0.5,
        -0.5,
    ]
}

#[derive(Debug, Clone, Default)]
pub struct Competition {
    scaler: FitnessScaler,
}

impl ScoringPolicy for Competition {
    type Record = f64;

    fn kind(&self) -> BehaviourKind {
        BehaviourKind::Competition
    }

    fn num_inputs(&self) -> usize {
        8
    }

    fn inputs(&mut self, view: &AgentView) -> Vec<f64> {
        competition_inputs(view)
    }

    fn record(&mut self, _before: &AgentView, after: &AgentView) -> f64 {
        let own = self.scaler.scale(after.tick, after.agent.fitness);
        let rival = self.scaler.scale(after.tick, after.mediator.best_fitness);
        own - rival
    }

    fn window_score(&self, history: &[f64], window: usize) -> f64 {
        mean(last_window(history, window))
    }

    fn update_utility(&self, utility: f64, score: f64, params: &ArbitrationConfig) -> f64 {
        if score > -params.threshold {
            utility - SLOW_DECAY * params.utility_update_speed
        } else {
            utility - params.utility_update_speed
        }
    }

    fn evolution_fitness(&self, records: &[f64], _window_scores: &[f64]) -> f64 {
        mean(records)
    }

    fn reselect_mediator_on_switch(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimetic_data::{AgentState, Vec2};

    fn view(tick: u64, fitness: f64, mediator_best: f64) -> AgentView {
        let mut agent = AgentState::new(0, Vec2::new(2.0, -2.0), Vec2::new(0.1, 0.2), fitness);
        agent.best_position = Vec2::new(-4.0, 4.0);
        let mut mediator = AgentState::new(1, Vec2::ZERO, Vec2::ZERO, mediator_best);
        mediator.best_fitness = mediator_best;
        AgentView {
            tick,
            agent,
            mediator,
            width: 8.0,
            height: 8.0,
        }
    }

    #[test]
    fn test_inputs_layout() {
        let inputs = Competition::default().inputs(&view(0, 0.0, 0.0));
        assert_eq!(inputs, vec![0.5, 0.1, -0.5, 0.2, -1.0, 1.0, 0.5, -0.5]);
    }

    #[test]
    fn test_record_compares_against_mediator_best() {
        let mut policy = Competition::default();
        let v = view(0, 900.0, 950.0);
        assert_eq!(policy.record(&v, &v), 0.0);
        // tick 0 left the bounds at 950; 900 widens them downwards
        let v = view(1, 900.0, 950.0);
        assert_eq!(policy.record(&v, &v), -2.0);
        let v = view(2, 950.0, 900.0);
        assert_eq!(policy.record(&v, &v), 2.0);
    }

    #[test]
    fn test_utility_decays_slowly_while_keeping_up() {
        let policy = Competition::default();
        let params = ArbitrationConfig::default();
        assert!((policy.update_utility(10.0, 0.0, &params) - 9.99).abs() < 1e-12);
        assert!((policy.update_utility(10.0, -0.05, &params) - 9.99).abs() < 1e-12);
        assert_eq!(policy.update_utility(10.0, -0.5, &params), 9.0);
    }

    #[test]
    fn test_window_score_uses_last_window_only() {
        let policy = Competition::default();
        assert_eq!(policy.window_score(&[-9.0, 1.0, 3.0], 2), 2.0);
        assert_eq!(policy.evolution_fitness(&[-9.0, 1.0, 3.0, 1.0], &[]), -1.0);
        assert!(policy.reselect_mediator_on_switch());
    }
}
