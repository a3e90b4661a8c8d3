//! Tick-driven simulation loop.
//!
//! Agents are stepped one at a time in index order. A mediator processed
//! earlier in the same tick is seen in its already-updated state.

use crate::agent::Agent;
use crate::behaviour::{build_behaviour, derive_seed, Behaviour, NamedCheckpoint};
use crate::config::AppConfig;
use crate::error::BehaviourError;
use crate::landscape::{landscape_for, FitnessLandscape};
use crate::metrics::{Metrics, ABORTED_BEHAVIOURS, CONTROLLER_SWITCHES, GENERATIONS};
use crate::stopping::StoppingCondition;
use crate::world::World;
use anyhow::Context;
use mimetic_data::{LiveEvent, SimulationStats, Vec2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::time::Instant;

/// Creates the behaviour for one agent: `(config, world, agent, seed)`.
pub type BehaviourFactory =
    Box<dyn Fn(&AppConfig, &World, usize, u64) -> Result<Box<dyn Behaviour>, BehaviourError>>;

fn configured_behaviour(
    config: &AppConfig,
    world: &World,
    agent: usize,
    seed: u64,
) -> Result<Box<dyn Behaviour>, BehaviourError> {
    build_behaviour(config, config.behaviour, world, agent, seed)
}

/// Offset separating per-agent seed streams from the world stream.
const AGENT_STREAM: u64 = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Ticks executed by this call.
    pub ticks: u64,
    pub halted: bool,
}

pub struct SimulationBuilder {
    config: AppConfig,
    landscape: Option<Arc<dyn FitnessLandscape>>,
    factory: Option<BehaviourFactory>,
    placements: Option<Vec<(Vec2, Vec2)>>,
}

impl SimulationBuilder {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            landscape: None,
            factory: None,
            placements: None,
        }
    }

    /// Replaces the configured landscape.
    #[must_use]
    pub fn landscape(mut self, landscape: Arc<dyn FitnessLandscape>) -> Self {
        self.landscape = Some(landscape);
        self
    }

    /// Replaces the configured behaviour for every agent.
    #[must_use]
    pub fn behaviour_factory(mut self, factory: BehaviourFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Places agents at fixed `(position, velocity)` pairs instead of
    /// spawning `num_agents` at random.
    #[must_use]
    pub fn agents_at(mut self, placements: Vec<(Vec2, Vec2)>) -> Self {
        self.placements = Some(placements);
        self
    }

    pub fn build(self) -> anyhow::Result<Simulation> {
        let mut config = self.config;
        if let Some(placements) = &self.placements {
            config.world.num_agents = placements.len();
        }
        config.validate()?;

        let landscape = self
            .landscape
            .unwrap_or_else(|| Arc::from(landscape_for(config.world.landscape)));
        let factory: BehaviourFactory = match self.factory {
            Some(factory) => factory,
            None => Box::new(configured_behaviour),
        };
        let seed = config.world.seed.unwrap_or_else(rand::random);
        let metrics = Metrics::new();

        let mut sim = Simulation {
            stopping: StoppingCondition::from_config(&config.world),
            world: World::new(&config.world, landscape.clone()),
            config,
            seed,
            landscape,
            factory,
            placements: self.placements,
            agents: Vec::new(),
            tick: 0,
            halted: false,
            finished: false,
            metrics,
            events: Vec::new(),
        };
        sim.populate()?;
        tracing::info!(
            agents = sim.agents.len(),
            behaviour = %sim.config.behaviour,
            landscape = sim.landscape.name(),
            seed = sim.seed,
            fingerprint = %sim.config.fingerprint(),
            "Simulation ready"
        );
        Ok(sim)
    }
}

pub struct Simulation {
    config: AppConfig,
    seed: u64,
    landscape: Arc<dyn FitnessLandscape>,
    factory: BehaviourFactory,
    placements: Option<Vec<(Vec2, Vec2)>>,
    world: World,
    agents: Vec<Agent>,
    stopping: StoppingCondition,
    tick: u64,
    halted: bool,
    finished: bool,
    metrics: Metrics,
    events: Vec<LiveEvent>,
}

impl Simulation {
    /// Builds world, agents and behaviours from `config`. Deterministic for a
    /// fixed `world.seed`.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        SimulationBuilder::new(config).build()
    }

    #[must_use]
    pub fn builder(config: AppConfig) -> SimulationBuilder {
        SimulationBuilder::new(config)
    }

    fn populate(&mut self) -> anyhow::Result<()> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut world = World::new(&self.config.world, self.landscape.clone());
        match &self.placements {
            Some(placements) => {
                for (position, velocity) in placements {
                    world.place_agent(*position, *velocity);
                }
            }
            None => world.spawn_agents(
                self.config.world.num_agents,
                self.config.world.initial_velocity_range,
                &mut rng,
            ),
        }

        let mut agents = Vec::with_capacity(world.len());
        for index in 0..world.len() {
            let seed = derive_seed(self.seed, AGENT_STREAM + index as u64);
            let behaviour = (self.factory)(&self.config, &world, index, seed)
                .with_context(|| format!("setting up behaviour of agent {index}"))?;
            agents.push(Agent::new(index, behaviour));
        }

        self.world = world;
        self.agents = agents;
        Ok(())
    }

    /// Steps every agent once, then checks the stopping condition. Returns
    /// whether the run has halted.
    pub fn tick(&mut self) -> bool {
        if self.halted || self.finished {
            return self.halted;
        }
        let start = Instant::now();
        let first_event = self.events.len();

        for agent in &mut self.agents {
            agent.step(&mut self.world, self.tick, &mut self.events);
        }
        self.tick += 1;

        for event in &self.events[first_event..] {
            match event {
                LiveEvent::ControllerSwitched { .. } => {
                    self.metrics.increment_counter(CONTROLLER_SWITCHES);
                }
                LiveEvent::GenerationAdvanced { .. } => {
                    self.metrics.increment_counter(GENERATIONS);
                }
                LiveEvent::BehaviourAborted { .. } => {
                    self.metrics.increment_counter(ABORTED_BEHAVIOURS);
                }
                _ => {}
            }
        }

        let interval = self.config.logging.snapshot_interval;
        if interval > 0 && self.tick % interval == 0 {
            let stats = self.stats();
            tracing::info!(
                tick = stats.tick,
                mean_fitness = stats.mean_fitness,
                best_fitness = stats.best_fitness,
                successes = stats.successes,
                "Snapshot"
            );
            self.events.push(LiveEvent::Snapshot {
                tick: self.tick,
                stats,
            });
        }

        if self.stopping.is_met(self.world.agents()) {
            self.halted = true;
            let successes = self.world.len();
            tracing::info!(tick = self.tick, successes, "Stopping condition met");
            self.events.push(LiveEvent::Halted {
                tick: self.tick,
                successes,
            });
        }

        self.metrics
            .record_tick(start.elapsed(), self.agents.len(), self.world.best_global().0);
        self.halted
    }

    /// Ticks until halted or `max_ticks` more ticks have run.
    pub fn run(&mut self, max_ticks: u64) -> RunOutcome {
        let mut ticks = 0;
        while ticks < max_ticks && !self.halted && !self.finished {
            self.tick();
            ticks += 1;
        }
        RunOutcome {
            ticks,
            halted: self.halted,
        }
    }

    /// Finishes every behaviour and rebuilds the run from the same seed.
    /// Undrained events and metrics of the previous run are discarded.
    pub fn reset(&mut self) -> anyhow::Result<()> {
        self.finish();
        self.populate()?;
        self.events.clear();
        self.metrics = Metrics::new();
        self.tick = 0;
        self.halted = false;
        self.finished = false;
        tracing::info!(seed = self.seed, "Simulation reset");
        Ok(())
    }

    /// Releases every behaviour. Later calls do nothing.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        for agent in &mut self.agents {
            agent.finish();
        }
        self.finished = true;
    }

    #[must_use]
    pub fn stats(&self) -> SimulationStats {
        let agents = self.world.agents();
        let count = agents.len();
        let mean_fitness = if count == 0 {
            0.0
        } else {
            agents.iter().map(|a| a.fitness).sum::<f64>() / count as f64
        };
        let best_fitness = agents
            .iter()
            .map(|a| a.fitness)
            .fold(f64::NEG_INFINITY, f64::max);
        let generations: Vec<u64> = self.agents.iter().filter_map(Agent::generation).collect();
        let mean_generation = if generations.is_empty() {
            0.0
        } else {
            generations.iter().sum::<u64>() as f64 / generations.len() as f64
        };
        let (global_best_fitness, global_best) = self.world.best_global();
        SimulationStats {
            tick: self.tick,
            agents: count,
            mean_fitness,
            best_fitness,
            successes: self.stopping.successes(agents),
            global_best_fitness,
            global_best_x: global_best.x,
            global_best_y: global_best.y,
            mean_generation,
            aborted_behaviours: self.agents.iter().filter(|a| a.is_aborted()).count(),
        }
    }

    /// Events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<LiveEvent> {
        std::mem::take(&mut self.events)
    }

    /// Population snapshots of every live behaviour, by agent index.
    #[must_use]
    pub fn checkpoints(&self) -> Vec<(usize, NamedCheckpoint)> {
        self.agents
            .iter()
            .flat_map(|agent| {
                agent
                    .checkpoint()
                    .into_iter()
                    .map(move |cp| (agent.index(), cp))
            })
            .collect()
    }

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use mimetic_data::BehaviourKind;

    fn config(behaviour: BehaviourKind, agents: usize) -> AppConfig {
        let mut config = AppConfig {
            behaviour,
            world: WorldConfig {
                num_agents: agents,
                neighbourhood_size: agents.min(4),
                seed: Some(7),
                ..WorldConfig::default()
            },
            ..AppConfig::default()
        };
        config.competition.evolution.population_size = 3;
        config.logging.snapshot_interval = 5;
        config
    }

    #[test]
    fn test_run_advances_all_agents() {
        let mut sim = Simulation::new(config(BehaviourKind::Competition, 6)).unwrap();
        let outcome = sim.run(10);
        assert_eq!(outcome.ticks, 10);
        assert_eq!(sim.current_tick(), 10);
        assert!(sim.world().agents().iter().all(|a| a.steps == 10));
        let snapshots = sim
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, LiveEvent::Snapshot { .. }))
            .count();
        assert_eq!(snapshots, 2);
        assert_eq!(sim.metrics().tick_count(), 10);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut bad = config(BehaviourKind::Competition, 2);
        bad.world.neighbourhood_size = 5;
        assert!(Simulation::new(bad).is_err());
    }

    #[test]
    fn test_failing_factory_surfaces_at_build() {
        let result = Simulation::builder(config(BehaviourKind::Competition, 2))
            .behaviour_factory(Box::new(|_: &AppConfig, _: &World, _: usize, _: u64| {
                Err(BehaviourError::Config("no parameters".into()))
            }))
            .build();
        let err = result.err().map(|e| format!("{e:#}")).unwrap_or_default();
        assert!(err.contains("agent 0"));
        assert!(err.contains("no parameters"));
    }

    #[test]
    fn test_reset_replays_from_seed() {
        let mut sim = Simulation::new(config(BehaviourKind::SocialFitness, 4)).unwrap();
        sim.run(5);
        let first = sim.stats();
        sim.reset().unwrap();
        assert_eq!(sim.current_tick(), 0);
        sim.run(5);
        assert_eq!(sim.stats(), first);
    }

    #[test]
    fn test_reset_discards_previous_history() {
        let mut sim = Simulation::new(config(BehaviourKind::Competition, 4)).unwrap();
        sim.run(6);
        assert_eq!(sim.metrics().tick_count(), 6);
        sim.reset().unwrap();
        assert_eq!(sim.metrics().tick_count(), 0);
        assert_eq!(sim.metrics().counter(CONTROLLER_SWITCHES), 0);
        assert!(sim.drain_events().is_empty());

        sim.run(6);
        let snapshots = sim
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, LiveEvent::Snapshot { .. }))
            .count();
        assert!(snapshots >= 1);
        assert_eq!(sim.metrics().tick_count(), 6);
    }

    #[test]
    fn test_finish_is_idempotent_and_stops_ticking() {
        let mut sim = Simulation::new(config(BehaviourKind::Pso, 3)).unwrap();
        sim.run(2);
        sim.finish();
        sim.finish();
        assert!(sim.agents().iter().all(Agent::is_finished));
        assert_eq!(sim.run(5).ticks, 0);
    }

    #[test]
    fn test_stats_report_generations() {
        let mut sim = Simulation::new(config(BehaviourKind::MetaCompetition, 3)).unwrap();
        sim.run(3);
        let stats = sim.stats();
        assert_eq!(stats.agents, 3);
        assert!(stats.mean_generation >= 0.0);
        assert!(stats.global_best_fitness >= stats.best_fitness);
        assert_eq!(sim.checkpoints().len(), 6);
    }
}
