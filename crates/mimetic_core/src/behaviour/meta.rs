//! Meta-competition: controllers and the objectives that judge them evolve
//! as two separate populations.
//!
//! Every tick each objective program rates the active controller's move and
//! the verdict is added to that (controller, objective) pair's energy. The
//! controller is replaced once its energy under the favoured objective is
//! spent. Energies are sampled periodically and on every switch; controller
//! fitness is the mean sampled energy under the favoured objective.

use super::competition::competition_inputs;
use super::controller::{run_controller, run_objective};
use super::engine::{individual_at, lift_evolution_error, view_of};
use super::rotation::ControllerCursor;
use super::{
    derive_seed, Behaviour, GenerationAdvance, NamedCheckpoint, TickReport,
    CONTROLLER_OUTPUTS, CONTROLLER_POPULATION, OBJECTIVE_POPULATION,
};
use crate::config::MetaConfig;
use crate::error::BehaviourError;
use crate::program::{
    CgpPopulation, EvaluationBinding, Evaluator, EvolutionError, ProgramId, ProgramPopulation,
};
use crate::stats::RunningStats;
use crate::world::World;
use mimetic_data::BehaviourKind;
use std::collections::BTreeMap;

/// Controllers see the competition inputs.
pub const CONTROLLER_INPUTS: usize = 8;
/// Objectives see the controller inputs followed by the chosen velocity.
pub const OBJECTIVE_INPUTS: usize = CONTROLLER_INPUTS + CONTROLLER_OUTPUTS;

type SampleTable = BTreeMap<(ProgramId, ProgramId), RunningStats>;

struct MetaState<S: ProgramPopulation> {
    agent: usize,
    controllers: S,
    objectives: S,
    controller_interpreter: S::Interpreter,
    objective_interpreter: S::Interpreter,
    cursor: ControllerCursor,
    /// Energy of the active controller under each objective, by index.
    energy: Vec<f64>,
    samples: SampleTable,
    tick: u64,
}

impl<S: ProgramPopulation> MetaState<S> {
    fn favoured_objective(&self) -> usize {
        self.objectives
            .best_so_far()
            .and_then(|best| {
                self.objectives
                    .individuals()
                    .iter()
                    .position(|o| o.id == best.id)
            })
            .unwrap_or(0)
    }

    fn reset_energy(&mut self, initial: f64) {
        self.energy.clear();
        self.energy.resize(self.objectives.len(), initial);
    }

    fn sample_energy(&mut self) -> Result<(), BehaviourError> {
        let controller = individual_at(&self.controllers, self.cursor.current())?.id;
        for (objective, energy) in self.objectives.individuals().iter().zip(&self.energy) {
            self.samples
                .entry((controller, objective.id))
                .or_default()
                .push(*energy);
        }
        Ok(())
    }
}

struct EnergyEvaluator<'a> {
    samples: &'a SampleTable,
    objective: ProgramId,
}

impl Evaluator for EnergyEvaluator<'_> {
    fn fitness_of(&self, id: ProgramId) -> Result<f64, EvolutionError> {
        self.samples
            .get(&(id, self.objective))
            .and_then(RunningStats::mean)
            .ok_or(EvolutionError::Unevaluated(id))
    }
}

/// Spread of an objective's mean energy across the controllers it judged.
/// An objective that rates every controller alike scores 0.
#[must_use]
pub fn discrimination(samples: &SampleTable, objective: ProgramId) -> Option<f64> {
    let mut spread = RunningStats::new();
    for ((_, o), stats) in samples {
        if *o == objective {
            if let Some(mean) = stats.mean() {
                spread.push(mean);
            }
        }
    }
    spread.std_dev()
}

pub struct MetaCompetition<S: ProgramPopulation = CgpPopulation> {
    params: MetaConfig,
    state: Option<MetaState<S>>,
}

impl MetaCompetition<CgpPopulation> {
    /// Sets up with fresh CGP populations derived from `seed`.
    pub fn setup_with_seed(
        &mut self,
        world: &World,
        agent: usize,
        seed: u64,
    ) -> Result<(), BehaviourError> {
        let controllers = CgpPopulation::new(
            CONTROLLER_POPULATION,
            self.params.controllers.clone(),
            CONTROLLER_INPUTS,
            CONTROLLER_OUTPUTS,
            derive_seed(seed, 1),
        );
        let objectives = CgpPopulation::new(
            OBJECTIVE_POPULATION,
            self.params.objectives.clone(),
            OBJECTIVE_INPUTS,
            1,
            derive_seed(seed, 2),
        );
        self.setup(world, agent, controllers, objectives)
    }
}

impl<S: ProgramPopulation> MetaCompetition<S> {
    #[must_use]
    pub fn new(params: MetaConfig) -> Self {
        Self {
            params,
            state: None,
        }
    }

    pub fn setup(
        &mut self,
        world: &World,
        agent: usize,
        controllers: S,
        objectives: S,
    ) -> Result<(), BehaviourError> {
        if controllers.is_empty() || objectives.is_empty() {
            return Err(BehaviourError::Evolution(EvolutionError::EmptyPopulation));
        }
        if world.agent(agent).is_none() {
            return Err(BehaviourError::Config(format!(
                "agent {agent} is not in the world"
            )));
        }
        let mut state = MetaState {
            agent,
            cursor: ControllerCursor::new(controllers.len()),
            controller_interpreter: controllers.new_interpreter(),
            objective_interpreter: objectives.new_interpreter(),
            controllers,
            objectives,
            energy: Vec::new(),
            samples: SampleTable::new(),
            tick: 0,
        };
        state.reset_energy(self.params.initial_energy);
        self.state = Some(state);
        Ok(())
    }

    #[must_use]
    pub fn energies(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.energy.as_slice())
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
    pub fn favoured_objective(&self) -> Option<usize> {
        self.state.as_ref().map(MetaState::favoured_objective)
    }

    #[must_use]
    pub fn objective_generation(&self) -> Option<u64> {
        self.state.as_ref().map(|s| s.objectives.generation())
    }

    /// Energy samples of the current controller generation.
    #[must_use]
    pub fn samples(&self) -> Option<&SampleTable> {
        self.state.as_ref().map(|s| &s.samples)
    }

    fn advance_controllers(state: &mut MetaState<S>) -> Result<GenerationAdvance, BehaviourError> {
        if !state.controllers.is_configured() {
            state.controllers.configure(EvaluationBinding {
                agent: state.agent,
                behaviour: BehaviourKind::MetaCompetition,
            });
        }
        let favoured = individual_at(&state.objectives, state.favoured_objective())?.id;
        let evaluator = EnergyEvaluator {
            samples: &state.samples,
            objective: favoured,
        };
        state
            .controllers
            .evolve(&evaluator)
            .map_err(lift_evolution_error)?;

        Self::evolve_objectives(state);
        state.samples.clear();
        state.cursor.start_generation(state.controllers.len());

        let generation = state.controllers.generation();
        tracing::debug!(
            agent = state.agent,
            generation,
            "Meta controller generation advanced"
        );
        Ok(GenerationAdvance {
            population: CONTROLLER_POPULATION.to_string(),
            generation,
        })
    }

    /// Scores the objectives on this generation's samples but keeps the
    /// objective population as it is.
    fn evolve_objectives(state: &mut MetaState<S>) {
        if !state.objectives.is_configured() {
            state.objectives.configure(EvaluationBinding {
                agent: state.agent,
                behaviour: BehaviourKind::MetaCompetition,
            });
        }
        for objective in state.objectives.individuals() {
            tracing::trace!(
                agent = state.agent,
                objective = %objective.id,
                discrimination = discrimination(&state.samples, objective.id),
                "Objective scored"
            );
        }
    }
}

impl<S: ProgramPopulation> Behaviour for MetaCompetition<S> {
    fn kind(&self) -> BehaviourKind {
        BehaviourKind::MetaCompetition
    }

    fn update(&mut self, world: &mut World) -> Result<TickReport, BehaviourError> {
        let params = &self.params;
        let state = self.state.as_mut().ok_or(BehaviourError::NotSetUp)?;
        let mut report = TickReport::default();

        if state.energy[state.favoured_objective()] <= 0.0 {
            state.sample_energy()?;
            let switch = state.cursor.advance();
            state.reset_energy(params.initial_energy);
            tracing::debug!(
                agent = state.agent,
                from = switch.from,
                to = switch.to,
                evaluated = switch.evaluated,
                "Meta controller switched"
            );
            report.switch = Some(switch);
        }

        if state.cursor.generation_complete() {
            report.advanced = Some(Self::advance_controllers(state)?);
        }

        let view = view_of(world, state.agent, None, state.tick)?;
        let inputs = competition_inputs(&view);
        let controller = individual_at(&state.controllers, state.cursor.current())?;
        let velocity = run_controller(
            &mut state.controller_interpreter,
            &controller.genome,
            &inputs,
        );
        world.apply_velocity(state.agent, velocity);

        for (objective, energy) in state.objectives.individuals().iter().zip(&mut state.energy) {
            *energy += run_objective(
                &mut state.objective_interpreter,
                &objective.genome,
                &inputs,
                velocity,
            );
        }

        state.tick += 1;
        if state.tick % params.energy_sampling_interval.max(1) == 0 {
            state.sample_energy()?;
        }
        Ok(report)
    }

    fn generation(&self) -> Option<u64> {
        self.state.as_ref().map(|s| s.controllers.generation())
    }

    fn finish(&mut self) {
        if let Some(mut state) = self.state.take() {
            state.controllers.finish();
            state.objectives.finish();
        }
    }

    fn checkpoint(&self) -> Vec<NamedCheckpoint> {
        self.state
            .as_ref()
            .map(|s| {
                vec![
                    NamedCheckpoint {
                        population: CONTROLLER_POPULATION.to_string(),
                        checkpoint: s.controllers.checkpoint(),
                    },
                    NamedCheckpoint {
                        population: OBJECTIVE_POPULATION.to_string(),
                        checkpoint: s.objectives.checkpoint(),
                    },
                ]
            })
            .unwrap_or_default()
    }
}
