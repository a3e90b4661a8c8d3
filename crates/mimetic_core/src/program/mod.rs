//! Program population service contract.
//!
//! The arbitration engine never looks inside a program. It asks a
//! [`ProgramPopulation`] for the current generation, drives an
//! [`Interpreter`] to completion, and hands an [`Evaluator`] back when every
//! individual has been tried.

pub mod cgp;

use mimetic_data::{BehaviourKind, PopulationCheckpoint};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use cgp::{CgpInterpreter, CgpPopulation, GenomeLogic};

/// Stable identity of one individual. Fresh for every offspring, never reused
/// within a population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgramId(pub u64);

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A program together with the fitness its last evaluation assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual<G> {
    pub id: ProgramId,
    pub genome: G,
    pub fitness: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvolutionError {
    #[error("evaluation problem has not been configured")]
    Unconfigured,
    #[error("individual {0} was never evaluated")]
    Unevaluated(ProgramId),
    #[error("population is empty")]
    EmptyPopulation,
    #[error("genome {index} is malformed: {reason}")]
    MalformedGenome { index: usize, reason: String },
}

/// Which agent and strategy an evaluation problem reads its scores from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationBinding {
    pub agent: usize,
    pub behaviour: BehaviourKind,
}

/// Assigns a fitness to an individual of the current generation.
pub trait Evaluator {
    fn fitness_of(&self, id: ProgramId) -> Result<f64, EvolutionError>;
}

/// Executes one program. Callers `load`, then `step` until `finished`, then
/// read `outputs`.
pub trait Interpreter {
    type Genome;

    fn load(&mut self, genome: &Self::Genome);
    fn step(&mut self, inputs: &[f64]);
    fn finished(&self) -> bool;
    fn outputs(&self) -> &[f64];
}

/// An evolvable population of programs, owned by exactly one behaviour.
pub trait ProgramPopulation {
    type Genome;
    type Interpreter: Interpreter<Genome = Self::Genome>;

    /// The current generation, in a stable order.
    fn individuals(&self) -> &[Individual<Self::Genome>];

    fn len(&self) -> usize {
        self.individuals().len()
    }

    fn is_empty(&self) -> bool {
        self.individuals().is_empty()
    }

    fn generation(&self) -> u64;

    fn new_interpreter(&self) -> Self::Interpreter;

    fn is_configured(&self) -> bool;

    /// Binds the evaluation problem. Calling it again is a no-op.
    fn configure(&mut self, binding: EvaluationBinding);

    /// Scores every individual through `evaluator` and replaces the
    /// generation. Fails without touching the population when an individual
    /// cannot be scored.
    fn evolve(&mut self, evaluator: &dyn Evaluator) -> Result<(), EvolutionError>;

    /// Highest-fitness individual seen in any evaluated generation.
    fn best_so_far(&self) -> Option<&Individual<Self::Genome>>;

    /// Releases the interpreter caches and run state. Idempotent.
    fn finish(&mut self);

    fn checkpoint(&self) -> PopulationCheckpoint;
}

/// Runs `genome` on `inputs` to completion and returns its outputs.
pub fn run_program<I: Interpreter>(interpreter: &mut I, genome: &I::Genome, inputs: &[f64]) -> Vec<f64> {
    interpreter.load(genome);
    while !interpreter.finished() {
        interpreter.step(inputs);
    }
    interpreter.outputs().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Countdown {
        remaining: usize,
        steps: usize,
        out: Vec<f64>,
    }

    impl Interpreter for Countdown {
        type Genome = usize;

        fn load(&mut self, genome: &usize) {
            self.remaining = *genome;
            self.steps = 0;
        }

        fn step(&mut self, inputs: &[f64]) {
            self.remaining -= 1;
            self.steps += 1;
            self.out = vec![inputs[0] * self.steps as f64];
        }

        fn finished(&self) -> bool {
            self.remaining == 0
        }

        fn outputs(&self) -> &[f64] {
            &self.out
        }
    }

    #[test]
    fn test_run_program_drives_until_finished() {
        let mut interp = Countdown {
            remaining: 0,
            steps: 0,
            out: vec![0.0],
        };
        let out = run_program(&mut interp, &3, &[2.0]);
        assert_eq!(interp.steps, 3);
        assert_eq!(out, vec![6.0]);
    }

    #[test]
    fn test_program_id_display() {
        assert_eq!(ProgramId(42).to_string(), "#42");
    }
}
