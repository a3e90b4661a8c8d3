//! Particle swarm baseline. Nothing evolves; each agent is pulled towards
//! its personal best, its neighbourhood best and the global best.

use super::{Behaviour, NamedCheckpoint, TickReport};
use crate::config::PsoConfig;
use crate::error::BehaviourError;
use crate::world::World;
use mimetic_data::{BehaviourKind, Vec2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

struct PsoState {
    agent: usize,
    rng: ChaCha8Rng,
}

pub struct Pso {
    params: PsoConfig,
    state: Option<PsoState>,
}

/// One velocity component: inertia plus three weighted attractions,
/// normalised by the total weight.
#[must_use]
pub fn attraction(
    inertia: f64,
    velocity: f64,
    deltas: [f64; 3],
    weights: [f64; 3],
) -> f64 {
    let pull: f64 = deltas.iter().zip(&weights).map(|(d, w)| d * w).sum();
    (inertia * velocity + pull) / (1.0 + weights.iter().sum::<f64>())
}

impl Pso {
    #[must_use]
    pub fn new(params: PsoConfig) -> Self {
        Self {
            params,
            state: None,
        }
    }

    pub fn setup(&mut self, world: &World, agent: usize, seed: u64) -> Result<(), BehaviourError> {
        if world.agent(agent).is_none() {
            return Err(BehaviourError::Config(format!(
                "agent {agent} is not in the world"
            )));
        }
        self.state = Some(PsoState {
            agent,
            rng: ChaCha8Rng::seed_from_u64(seed),
        });
        Ok(())
    }
}

impl Behaviour for Pso {
    fn kind(&self) -> BehaviourKind {
        BehaviourKind::Pso
    }

    fn update(&mut self, world: &mut World) -> Result<TickReport, BehaviourError> {
        let params = &self.params;
        let state = self.state.as_mut().ok_or(BehaviourError::NotSetUp)?;
        let agent = *world
            .agent(state.agent)
            .ok_or_else(|| BehaviourError::Config(format!("agent {} is not in the world", state.agent)))?;
        let neighbourhood = world
            .neighbourhood_best(state.agent)
            .map_or(agent.best_position, |n| n.best_position);
        let (_, global) = world.best_global();

        let mut weights = || {
            [
                state.rng.gen::<f64>() + params.weight_offset,
                state.rng.gen::<f64>() + params.weight_offset,
                state.rng.gen::<f64>() + params.weight_offset,
            ]
        };
        let (pos, best) = (agent.position, agent.best_position);
        let vx = attraction(
            params.inertia_x,
            agent.velocity.x,
            [best.x - pos.x, neighbourhood.x - pos.x, global.x - pos.x],
            weights(),
        );
        let vy = attraction(
            params.inertia_y,
            agent.velocity.y,
            [best.y - pos.y, neighbourhood.y - pos.y, global.y - pos.y],
            weights(),
        );

        let scalar = world.velocity_scalar();
        world.apply_velocity(state.agent, Vec2::new(vx * scalar, vy * scalar));
        Ok(TickReport::default())
    }

    fn generation(&self) -> Option<u64> {
        None
    }

    fn finish(&mut self) {
        self.state = None;
    }

    fn checkpoint(&self) -> Vec<NamedCheckpoint> {
        Vec::new()
    }
}
