//! Shared controller arbitration state machine.
//!
//! Per tick, in order:
//! 1. pick a mediator from the neighbourhood if none is assigned;
//! 2. every `maturation_steps` ticks score the active controller, update its
//!    utility and switch to the next controller once utility is spent;
//! 3. once every controller of the generation was tried, evolve the
//!    population and clear the ledger;
//! 4. run the active controller and move the agent;
//! 5. append this tick's record to the ledger.

use super::controller::run_controller;
use super::ledger::PerformanceLedger;
use super::policy::{AgentView, ScoringPolicy};
use super::rotation::ControllerCursor;
use super::{Behaviour, GenerationAdvance, NamedCheckpoint, TickReport, CONTROLLER_POPULATION};
use crate::config::ArbitrationConfig;
use crate::error::BehaviourError;
use crate::program::{
    EvaluationBinding, Evaluator, EvolutionError, Individual, ProgramId, ProgramPopulation,
};
use crate::world::World;
use mimetic_data::BehaviourKind;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

struct EngineState<R, S: ProgramPopulation> {
    agent: usize,
    population: S,
    interpreter: S::Interpreter,
    cursor: ControllerCursor,
    utility: f64,
    mediator: Option<usize>,
    ledger: PerformanceLedger<R>,
    window_scores: PerformanceLedger<f64>,
    tick: u64,
    rng: ChaCha8Rng,
}

/// Generic arbitration engine, specialised by a [`ScoringPolicy`].
pub struct ArbitrationEngine<P: ScoringPolicy, S: ProgramPopulation> {
    policy: P,
    params: ArbitrationConfig,
    state: Option<EngineState<P::Record, S>>,
}

struct LedgerEvaluator<'a, P: ScoringPolicy> {
    policy: &'a P,
    ledger: &'a PerformanceLedger<P::Record>,
    window_scores: &'a PerformanceLedger<f64>,
}

impl<P: ScoringPolicy> Evaluator for LedgerEvaluator<'_, P> {
    fn fitness_of(&self, id: ProgramId) -> Result<f64, EvolutionError> {
        let records = self
            .ledger
            .history(id)
            .ok_or(EvolutionError::Unevaluated(id))?;
        let scores = self.window_scores.history(id).unwrap_or(&[]);
        Ok(self.policy.evolution_fitness(records, scores))
    }
}

pub(crate) fn select_mediator<R: Rng>(world: &World, agent: usize, rng: &mut R) -> Option<usize> {
    let neighbours = world.neighbours_of(agent);
    if neighbours.is_empty() {
        None
    } else {
        Some(neighbours[rng.gen_range(0..neighbours.len())])
    }
}

pub(crate) fn individual_at<S: ProgramPopulation>(
    population: &S,
    index: usize,
) -> Result<&Individual<S::Genome>, BehaviourError> {
    population
        .individuals()
        .get(index)
        .ok_or(BehaviourError::Evolution(EvolutionError::EmptyPopulation))
}

pub(crate) fn lift_evolution_error(err: EvolutionError) -> BehaviourError {
    match err {
        EvolutionError::Unevaluated(id) => BehaviourError::Unevaluated(id),
        other => BehaviourError::Evolution(other),
    }
}

pub(crate) fn view_of(
    world: &World,
    agent: usize,
    mediator: Option<usize>,
    tick: u64,
) -> Result<AgentView, BehaviourError> {
    let own = *world
        .agent(agent)
        .ok_or_else(|| BehaviourError::Config(format!("agent {agent} is not in the world")))?;
    let mediator = mediator
        .and_then(|m| world.agent(m))
        .copied()
        .unwrap_or(own);
    Ok(AgentView {
        tick,
        agent: own,
        mediator,
        width: world.width(),
        height: world.height(),
    })
}

impl<P: ScoringPolicy, S: ProgramPopulation> ArbitrationEngine<P, S> {
    /// An engine that still needs [`ArbitrationEngine::setup`].
    #[must_use]
    pub fn new(policy: P, params: ArbitrationConfig) -> Self {
        Self {
            policy,
            params,
            state: None,
        }
    }

    /// Binds the engine to `agent` and injects the controller population.
    pub fn setup(
        &mut self,
        world: &World,
        agent: usize,
        population: S,
        seed: u64,
    ) -> Result<(), BehaviourError> {
        if population.is_empty() {
            return Err(BehaviourError::Evolution(EvolutionError::EmptyPopulation));
        }
        let own = world
            .agent(agent)
            .ok_or_else(|| BehaviourError::Config(format!("agent {agent} is not in the world")))?;
        self.policy.bind(own);

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mediator = select_mediator(world, agent, &mut rng);
        let interpreter = population.new_interpreter();
        self.state = Some(EngineState {
            agent,
            cursor: ControllerCursor::new(population.len()),
            population,
            interpreter,
            utility: self.params.startup_utility,
            mediator,
            ledger: PerformanceLedger::new(),
            window_scores: PerformanceLedger::new(),
            tick: 0,
            rng,
        });
        Ok(())
    }

    #[must_use]
    pub fn is_set_up(&self) -> bool {
        self.state.is_some()
    }

    #[must_use]
    pub fn policy(&self) -> &P {
        &self.policy
    }

    #[must_use]
    pub fn utility(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.utility)
    }

    #[must_use]
    pub fn current_controller(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.cursor.current())
    }

    #[must_use]
    pub fn evaluated(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.cursor.evaluated())
    }

    #[must_use]
    pub fn mediator(&self) -> Option<usize> {
        self.state.as_ref().and_then(|s| s.mediator)
    }

    #[must_use]
    pub fn ticks(&self) -> Option<u64> {
        self.state.as_ref().map(|s| s.tick)
    }

    #[must_use]
    pub fn population(&self) -> Option<&S> {
        self.state.as_ref().map(|s| &s.population)
    }

    /// Records held for the current generation.
    #[must_use]
    pub fn ledger(&self) -> Option<&PerformanceLedger<P::Record>> {
        self.state.as_ref().map(|s| &s.ledger)
    }

    fn advance_generation(
        policy: &P,
        params: &ArbitrationConfig,
        state: &mut EngineState<P::Record, S>,
    ) -> Result<GenerationAdvance, BehaviourError> {
        if !state.population.is_configured() {
            state.population.configure(EvaluationBinding {
                agent: state.agent,
                behaviour: policy.kind(),
            });
        }
        let evaluator = LedgerEvaluator {
            policy,
            ledger: &state.ledger,
            window_scores: &state.window_scores,
        };
        state
            .population
            .evolve(&evaluator)
            .map_err(lift_evolution_error)?;

        state.ledger.clear();
        state.window_scores.clear();
        state.cursor.start_generation(state.population.len());
        state.utility = params.initial_utility;

        let generation = state.population.generation();
        tracing::debug!(
            agent = state.agent,
            behaviour = %policy.kind(),
            generation,
            "Controller generation advanced"
        );
        Ok(GenerationAdvance {
            population: CONTROLLER_POPULATION.to_string(),
            generation,
        })
    }
}

impl<P: ScoringPolicy, S: ProgramPopulation> Behaviour for ArbitrationEngine<P, S> {
    fn kind(&self) -> BehaviourKind {
        self.policy.kind()
    }

    fn update(&mut self, world: &mut World) -> Result<TickReport, BehaviourError> {
        let Self {
            policy,
            params,
            state,
        } = self;
        let state = state.as_mut().ok_or(BehaviourError::NotSetUp)?;
        let mut report = TickReport::default();

        if state.mediator.is_none() {
            state.mediator = select_mediator(world, state.agent, &mut state.rng);
        }

        let window = params.maturation_steps.max(1);
        if state.tick > 0 && state.tick % window == 0 {
            let id = individual_at(&state.population, state.cursor.current())?.id;
            let history = state.ledger.history(id).unwrap_or(&[]);
            let score = policy.window_score(history, window as usize);
            state.window_scores.record(id, score);
            state.utility = policy.update_utility(state.utility, score, params);

            if state.utility <= 0.0 {
                let switch = state.cursor.advance();
                state.utility = params.initial_utility;
                if policy.reselect_mediator_on_switch() {
                    state.mediator = select_mediator(world, state.agent, &mut state.rng);
                }
                tracing::debug!(
                    agent = state.agent,
                    from = switch.from,
                    to = switch.to,
                    evaluated = switch.evaluated,
                    score,
                    "Controller switched"
                );
                report.switch = Some(switch);
            }
        }

        if state.cursor.generation_complete() {
            report.advanced = Some(Self::advance_generation(policy, params, state)?);
        }

        let before = view_of(world, state.agent, state.mediator, state.tick)?;
        let inputs = policy.inputs(&before);
        let controller = individual_at(&state.population, state.cursor.current())?;
        let id = controller.id;
        let velocity = run_controller(&mut state.interpreter, &controller.genome, &inputs);

        world.apply_velocity(state.agent, velocity);

        let after = view_of(world, state.agent, state.mediator, state.tick)?;
        let record = policy.record(&before, &after);
        state.ledger.record(id, record);
        state.tick += 1;

        Ok(report)
    }

    fn generation(&self) -> Option<u64> {
        self.state.as_ref().map(|s| s.population.generation())
    }

    fn finish(&mut self) {
        if let Some(mut state) = self.state.take() {
            state.population.finish();
            tracing::trace!(agent = state.agent, "Behaviour finished");
        }
    }

    fn checkpoint(&self) -> Vec<NamedCheckpoint> {
        self.state
            .as_ref()
            .map(|s| {
                vec![NamedCheckpoint {
                    population: CONTROLLER_POPULATION.to_string(),
                    checkpoint: s.population.checkpoint(),
                }]
            })
            .unwrap_or_default()
    }
}
