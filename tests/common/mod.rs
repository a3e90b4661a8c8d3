pub mod macros;

use mimetic_core::behaviour::{Behaviour, NamedCheckpoint, TickReport};
use mimetic_core::config::AppConfig;
use mimetic_core::error::BehaviourError;
use mimetic_core::landscape::FitnessLandscape;
use mimetic_core::program::{
    EvaluationBinding, Evaluator, EvolutionError, Individual, Interpreter, ProgramId,
    ProgramPopulation,
};
use mimetic_core::simulation::{BehaviourFactory, Simulation};
use mimetic_core::world::World;
use mimetic_data::{BehaviourKind, PopulationCheckpoint, Vec2};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

/// Fluent setup for small, seeded simulations.
#[allow(dead_code)]
pub struct SimBuilder {
    config: AppConfig,
    landscape: Option<Arc<dyn FitnessLandscape>>,
    placements: Vec<(Vec2, Vec2)>,
    factory: Option<BehaviourFactory>,
}

#[allow(dead_code)]
impl SimBuilder {
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.world.num_agents = 4;
        config.world.neighbourhood_size = 2;
        config.world.seed = Some(7);
        config.logging.snapshot_interval = 0;
        for params in [
            &mut config.competition,
            &mut config.imitation,
            &mut config.social_fitness,
            &mut config.fitness_exploitation,
        ] {
            params.evolution.population_size = 3;
            params.evolution.num_nodes = 8;
        }
        config.meta.controllers.population_size = 3;
        config.meta.objectives.population_size = 2;
        Self {
            config,
            landscape: None,
            placements: Vec::new(),
            factory: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.world.seed = Some(seed);
        self
    }

    pub fn with_behaviour(mut self, kind: BehaviourKind) -> Self {
        self.config.behaviour = kind;
        self
    }

    pub fn with_agents(mut self, count: usize) -> Self {
        self.config.world.num_agents = count;
        self.config.world.neighbourhood_size = self.config.world.neighbourhood_size.min(count);
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn with_landscape(mut self, landscape: Arc<dyn FitnessLandscape>) -> Self {
        self.landscape = Some(landscape);
        self
    }

    pub fn with_agent_at(mut self, x: f64, y: f64) -> Self {
        self.placements.push((Vec2::new(x, y), Vec2::ZERO));
        self
    }

    pub fn with_factory(mut self, factory: BehaviourFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn build(self) -> Simulation {
        let mut builder = Simulation::builder(self.config);
        if let Some(landscape) = self.landscape {
            builder = builder.landscape(landscape);
        }
        if !self.placements.is_empty() {
            builder = builder.agents_at(self.placements);
        }
        if let Some(factory) = self.factory {
            builder = builder.behaviour_factory(factory);
        }
        builder.build().expect("Failed to build simulation in test builder")
    }
}

/// `1000 - (x² + y²)`: a single smooth peak at the origin.
pub struct Bowl;

impl FitnessLandscape for Bowl {
    fn evaluate(&self, x: f64, y: f64) -> f64 {
        1000.0 - (x * x + y * y)
    }

    fn name(&self) -> &str {
        "bowl"
    }
}

/// Steers its agent straight onto the origin in one move.
#[allow(dead_code)]
pub struct Homing {
    pub agent: usize,
}

impl Behaviour for Homing {
    fn kind(&self) -> BehaviourKind {
        BehaviourKind::Pso
    }

    fn update(&mut self, world: &mut World) -> Result<TickReport, BehaviourError> {
        let state = *world.agent(self.agent).ok_or(BehaviourError::NotSetUp)?;
        let scalar = world.velocity_scalar();
        let velocity = Vec2::new(-state.position.x / scalar, -state.position.y / scalar);
        world.apply_velocity(self.agent, velocity);
        Ok(TickReport::default())
    }

    fn generation(&self) -> Option<u64> {
        None
    }

    fn finish(&mut self) {}

    fn checkpoint(&self) -> Vec<NamedCheckpoint> {
        Vec::new()
    }
}

/// Emits its genome as both outputs.
#[derive(Default)]
pub struct ConstantInterpreter {
    value: f64,
    done: bool,
    outputs: Vec<f64>,
}

impl Interpreter for ConstantInterpreter {
    type Genome = f64;

    fn load(&mut self, genome: &f64) {
        self.value = *genome;
        self.done = false;
    }

    fn step(&mut self, _inputs: &[f64]) {
        self.outputs = vec![self.value, self.value];
        self.done = true;
    }

    fn finished(&self) -> bool {
        self.done
    }

    fn outputs(&self) -> &[f64] {
        &self.outputs
    }
}

/// Program population whose genomes are constants. Counts evolutions and
/// remembers the fitness each one assigned.
#[allow(dead_code)]
pub struct ScriptedPopulation {
    individuals: Vec<Individual<f64>>,
    generation: u64,
    next_id: u64,
    configured: bool,
    best: Option<Individual<f64>>,
    pub evolutions: Rc<Cell<u32>>,
    pub last_fitness: Rc<std::cell::RefCell<Vec<f64>>>,
}

#[allow(dead_code)]
impl ScriptedPopulation {
    pub fn new(genomes: &[f64]) -> Self {
        Self {
            individuals: genomes
                .iter()
                .enumerate()
                .map(|(i, g)| Individual {
                    id: ProgramId(i as u64),
                    genome: *g,
                    fitness: None,
                })
                .collect(),
            generation: 0,
            next_id: genomes.len() as u64,
            configured: false,
            best: None,
            evolutions: Rc::new(Cell::new(0)),
            last_fitness: Rc::default(),
        }
    }
}

impl ProgramPopulation for ScriptedPopulation {
    type Genome = f64;
    type Interpreter = ConstantInterpreter;

    fn individuals(&self) -> &[Individual<f64>] {
        &self.individuals
    }

    fn generation(&self) -> u64 {
        self.generation
    }

    fn new_interpreter(&self) -> ConstantInterpreter {
        ConstantInterpreter::default()
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    fn configure(&mut self, _binding: EvaluationBinding) {
        self.configured = true;
    }

    fn evolve(&mut self, evaluator: &dyn Evaluator) -> Result<(), EvolutionError> {
        if !self.configured {
            return Err(EvolutionError::Unconfigured);
        }
        let fitness = self
            .individuals
            .iter()
            .map(|i| evaluator.fitness_of(i.id))
            .collect::<Result<Vec<_>, _>>()?;
        for (individual, f) in self.individuals.iter_mut().zip(&fitness) {
            individual.fitness = Some(*f);
            if self.best.as_ref().and_then(|b| b.fitness).map_or(true, |b| *f > b) {
                self.best = Some(individual.clone());
            }
        }
        *self.last_fitness.borrow_mut() = fitness;
        for individual in &mut self.individuals {
            individual.id = ProgramId(self.next_id);
            individual.fitness = None;
            self.next_id += 1;
        }
        self.generation += 1;
        self.evolutions.set(self.evolutions.get() + 1);
        Ok(())
    }

    fn best_so_far(&self) -> Option<&Individual<f64>> {
        self.best.as_ref()
    }

    fn finish(&mut self) {}

    fn checkpoint(&self) -> PopulationCheckpoint {
        PopulationCheckpoint {
            generation: self.generation,
            next_id: self.next_id,
            genomes: Vec::new(),
        }
    }
}
