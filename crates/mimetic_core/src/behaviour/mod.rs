//! Controller arbitration behaviours.
//!
//! Four strategies share one [`ArbitrationEngine`] and differ only in their
//! [`ScoringPolicy`]. Meta-competition keeps two populations and an energy
//! table and has its own state machine. PSO is the non-evolving baseline.

pub mod competition;
pub mod controller;
pub mod engine;
pub mod fitness_exploitation;
pub mod imitation;
pub mod ledger;
pub mod meta;
pub mod policy;
pub mod pso;
pub mod rotation;
pub mod scaling;
pub mod social_fitness;

pub use competition::Competition;
pub use engine::ArbitrationEngine;
pub use fitness_exploitation::FitnessExploitation;
pub use imitation::Imitation;
pub use ledger::PerformanceLedger;
pub use meta::MetaCompetition;
pub use policy::{AgentView, ScoringPolicy};
pub use pso::Pso;
pub use rotation::{ControllerCursor, ControllerSwitch};
pub use scaling::{scale, squash, FitnessScaler};
pub use social_fitness::SocialFitness;

use crate::config::AppConfig;
use crate::error::BehaviourError;
use crate::program::CgpPopulation;
use crate::world::World;
use mimetic_data::{BehaviourKind, PopulationCheckpoint};

pub const CONTROLLER_POPULATION: &str = "controllers";
pub const OBJECTIVE_POPULATION: &str = "objectives";

/// Controllers always steer with two outputs.
pub const CONTROLLER_OUTPUTS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationAdvance {
    pub population: String,
    pub generation: u64,
}

/// What changed during one update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub switch: Option<ControllerSwitch>,
    pub advanced: Option<GenerationAdvance>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedCheckpoint {
    pub population: String,
    pub checkpoint: PopulationCheckpoint,
}

/// Per-agent movement strategy.
pub trait Behaviour {
    fn kind(&self) -> BehaviourKind;

    /// Advances the behaviour by one tick and moves its agent.
    fn update(&mut self, world: &mut World) -> Result<TickReport, BehaviourError>;

    /// Controller generation, `None` for non-evolving or finished behaviours.
    fn generation(&self) -> Option<u64>;

    /// Releases populations and interpreters. Safe to call more than once;
    /// later updates fail with [`BehaviourError::NotSetUp`].
    fn finish(&mut self);

    fn checkpoint(&self) -> Vec<NamedCheckpoint>;
}

/// Derives an independent seed for a sub-stream (agent, population, ...).
#[must_use]
pub fn derive_seed(base: u64, stream: u64) -> u64 {
    base.wrapping_add(stream.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

fn arbitrated<P>(
    policy: P,
    config: &AppConfig,
    world: &World,
    agent: usize,
    seed: u64,
) -> Result<Box<dyn Behaviour>, BehaviourError>
where
    P: ScoringPolicy + 'static,
    P::Record: 'static,
{
    let kind = policy.kind();
    let params = config
        .arbitration(kind)
        .ok_or_else(|| BehaviourError::Config(format!("no arbitration parameters for {kind}")))?
        .clone();
    let population = CgpPopulation::new(
        CONTROLLER_POPULATION,
        params.evolution.clone(),
        policy.num_inputs(),
        CONTROLLER_OUTPUTS,
        derive_seed(seed, 1),
    );
    let mut engine = ArbitrationEngine::new(policy, params);
    engine.setup(world, agent, population, derive_seed(seed, 0))?;
    Ok(Box::new(engine))
}

/// Builds and sets up the behaviour `kind` for `agent`.
pub fn build_behaviour(
    config: &AppConfig,
    kind: BehaviourKind,
    world: &World,
    agent: usize,
    seed: u64,
) -> Result<Box<dyn Behaviour>, BehaviourError> {
    match kind {
        BehaviourKind::Competition => arbitrated(Competition::default(), config, world, agent, seed),
        BehaviourKind::Imitation => arbitrated(Imitation, config, world, agent, seed),
        BehaviourKind::SocialFitness => {
            arbitrated(SocialFitness::default(), config, world, agent, seed)
        }
        BehaviourKind::FitnessExploitation => {
            arbitrated(FitnessExploitation::default(), config, world, agent, seed)
        }
        BehaviourKind::MetaCompetition => {
            let mut meta: MetaCompetition = MetaCompetition::new(config.meta.clone());
            meta.setup_with_seed(world, agent, seed)?;
            Ok(Box::new(meta))
        }
        BehaviourKind::Pso => {
            let mut pso = Pso::new(config.pso.clone());
            pso.setup(world, agent, derive_seed(seed, 0))?;
            Ok(Box::new(pso))
        }
    }
}
