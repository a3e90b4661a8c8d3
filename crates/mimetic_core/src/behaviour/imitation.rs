//! Imitation: a controller is scored on how closely the agent's velocity
//! tracks its mediator's.

use super::policy::{last_window, AgentView, ScoringPolicy};
use crate::config::ArbitrationConfig;
use mimetic_data::{BehaviourKind, Vec2};

/// Signed per-axis imitation error.
///
/// The x error is negated when the agent is slower than the mediator on x.
/// The y error copies the negated x error whenever the agent is slower on y.
#[must_use]
pub fn imitation_error(own: Vec2, mediator: Vec2) -> (f64, f64) {
    let mut ex = (own.x - mediator.x).abs();
    if own.x < mediator.x {
        ex = -ex;
    }
    let ey = if own.y < mediator.y {
        -ex
    } else {
        (own.y - mediator.y).abs()
    };
    (ex, ey)
}

fn magnitude((ex, ey): &(f64, f64)) -> f64 {
    ex.abs() + ey.abs()
}

fn mean_magnitude(records: &[(f64, f64)]) -> f64 {
    if records.is_empty() {
        0.0
    } else {
        records.iter().map(magnitude).sum::<f64>() / records.len() as f64
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Imitation;

impl ScoringPolicy for Imitation {
    type Record = (f64, f64);

    fn kind(&self) -> BehaviourKind {
        BehaviourKind::Imitation
    }

    fn num_inputs(&self) -> usize {
        6
    }

    fn inputs(&mut self, view: &AgentView) -> Vec<f64> {
        let [x, vx, y, vy] = view.kinematic_inputs();
        vec![x, vx, y, vy, 1.0, -1.0]
    }

    fn record(&mut self, _before: &AgentView, after: &AgentView) -> (f64, f64) {
        imitation_error(after.agent.velocity, after.mediator.velocity)
    }

    fn window_score(&self, history: &[(f64, f64)], window: usize) -> f64 {
        mean_magnitude(last_window(history, window))
    }

    /// Decays whenever `|score| >= score`, which holds for every non-NaN
    /// score; grows otherwise.
    fn update_utility(&self, utility: f64, score: f64, params: &ArbitrationConfig) -> f64 {
        if score.abs() >= score {
            utility - params.utility_update_speed
        } else {
            utility + params.utility_update_speed
        }
    }

    fn evolution_fitness(&self, records: &[(f64, f64)], _window_scores: &[f64]) -> f64 {
        -mean_magnitude(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_sign_rule() {
        assert_eq!(
            imitation_error(Vec2::new(0.75, 0.5), Vec2::new(0.25, 0.25)),
            (0.5, 0.25)
        );
        // Slower on y: the y error mirrors the x error, not the y gap.
        assert_eq!(
            imitation_error(Vec2::new(0.125, 0.125), Vec2::new(0.5, 1.0)),
            (-0.375, 0.375)
        );
    }

    #[test]
    fn test_identical_velocity_is_perfect() {
        assert_eq!(
            imitation_error(Vec2::new(0.3, -0.2), Vec2::new(0.3, -0.2)),
            (0.0, 0.0)
        );
        assert_eq!(Imitation.evolution_fitness(&[(0.0, 0.0)], &[]), 0.0);
    }

    #[test]
    fn test_window_score_is_mean_absolute_error() {
        let history = [(9.0, 9.0), (0.5, -0.5), (-0.25, 0.25)];
        assert_eq!(Imitation.window_score(&history, 2), 0.75);
        assert_eq!(Imitation.evolution_fitness(&history, &[]), -(18.0 + 1.0 + 0.5) / 3.0);
    }

    #[test]
    fn test_utility_always_decays_for_real_scores() {
        let params = ArbitrationConfig::default();
        assert_eq!(Imitation.update_utility(5.0, 0.0, &params), 4.0);
        assert_eq!(Imitation.update_utility(5.0, 2.5, &params), 4.0);
        assert_eq!(Imitation.update_utility(5.0, f64::NAN, &params), 6.0);
    }
}
