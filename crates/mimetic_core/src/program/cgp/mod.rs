//! Cartesian Genetic Programming implementation of the program service.

pub mod genome;
pub mod interpreter;
pub mod selection;

pub use genome::GenomeLogic;
pub use interpreter::CgpInterpreter;

use super::{
    EvaluationBinding, Evaluator, EvolutionError, Individual, ProgramId, ProgramPopulation,
};
use crate::config::EvolutionConfig;
use mimetic_data::{CgpGenome, PopulationCheckpoint};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug)]
pub struct CgpPopulation {
    name: String,
    params: EvolutionConfig,
    num_inputs: usize,
    num_outputs: usize,
    individuals: Vec<Individual<CgpGenome>>,
    generation: u64,
    next_id: u64,
    binding: Option<EvaluationBinding>,
    best: Option<Individual<CgpGenome>>,
    rng: ChaCha8Rng,
}

impl CgpPopulation {
    /// Random initial generation.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        params: EvolutionConfig,
        num_inputs: usize,
        num_outputs: usize,
        seed: u64,
    ) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let individuals = (0..params.population_size as u64)
            .map(|id| Individual {
                id: ProgramId(id),
                genome: CgpGenome::new_random_with_rng(
                    num_inputs,
                    params.num_nodes,
                    num_outputs,
                    &mut rng,
                ),
                fitness: None,
            })
            .collect();
        Self {
            name: name.into(),
            num_inputs,
            num_outputs,
            individuals,
            generation: 0,
            next_id: params.population_size as u64,
            params,
            binding: None,
            best: None,
            rng,
        }
    }

    /// Rebuilds a population from a checkpoint. The evaluation binding is not
    /// part of a checkpoint and must be configured again.
    ///
    /// Every genome must be feed-forward and share the first genome's input
    /// and output counts.
    pub fn from_checkpoint(
        name: impl Into<String>,
        params: EvolutionConfig,
        checkpoint: PopulationCheckpoint,
        seed: u64,
    ) -> Result<Self, EvolutionError> {
        let first = checkpoint
            .genomes
            .first()
            .ok_or(EvolutionError::EmptyPopulation)?;
        let num_inputs = first.num_inputs as usize;
        let num_outputs = first.num_outputs();
        for (index, genome) in checkpoint.genomes.iter().enumerate() {
            let reason = if !genome.is_well_formed() {
                "a connection is not feed-forward".to_string()
            } else if genome.num_inputs as usize != num_inputs {
                format!("{} inputs, expected {num_inputs}", genome.num_inputs)
            } else if genome.num_outputs() != num_outputs {
                format!("{} outputs, expected {num_outputs}", genome.num_outputs())
            } else {
                continue;
            };
            return Err(EvolutionError::MalformedGenome { index, reason });
        }
        let base = checkpoint
            .next_id
            .saturating_sub(checkpoint.genomes.len() as u64);
        let individuals = checkpoint
            .genomes
            .into_iter()
            .enumerate()
            .map(|(i, genome)| Individual {
                id: ProgramId(base + i as u64),
                genome,
                fitness: None,
            })
            .collect::<Vec<_>>();
        Ok(Self {
            name: name.into(),
            params,
            num_inputs,
            num_outputs,
            next_id: base + individuals.len() as u64,
            individuals,
            generation: checkpoint.generation,
            binding: None,
            best: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn binding(&self) -> Option<EvaluationBinding> {
        self.binding
    }

    #[must_use]
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    #[must_use]
    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    fn fresh_id(&mut self) -> ProgramId {
        let id = ProgramId(self.next_id);
        self.next_id += 1;
        id
    }

    fn breed(&mut self, fitness: &[f64]) -> Vec<Individual<CgpGenome>> {
        let size = self.individuals.len();
        let mut next = Vec::with_capacity(size);

        for &idx in selection::rank_by_fitness(fitness)
            .iter()
            .take(self.params.elites.min(size))
        {
            let genome = self.individuals[idx].genome.clone();
            let id = self.fresh_id();
            next.push(Individual {
                id,
                genome,
                fitness: None,
            });
        }

        while next.len() < size {
            let a = selection::tournament(fitness, self.params.tournament_size, &mut self.rng);
            let mut genome = if self.rng.gen::<f64>() < self.params.crossover_rate {
                let b =
                    selection::tournament(fitness, self.params.tournament_size, &mut self.rng);
                self.individuals[a]
                    .genome
                    .crossover_with_rng(&self.individuals[b].genome, &mut self.rng)
            } else {
                self.individuals[a].genome.clone()
            };
            genome.mutate_with_rate(self.params.mutation_rate, &mut self.rng);
            let id = self.fresh_id();
            next.push(Individual {
                id,
                genome,
                fitness: None,
            });
        }
        next
    }
}

impl ProgramPopulation for CgpPopulation {
    type Genome = CgpGenome;
    type Interpreter = CgpInterpreter;

    fn individuals(&self) -> &[Individual<CgpGenome>] {
        &self.individuals
    }

    fn generation(&self) -> u64 {
        self.generation
    }

    fn new_interpreter(&self) -> CgpInterpreter {
        CgpInterpreter::new()
    }

    fn is_configured(&self) -> bool {
        self.binding.is_some()
    }

    fn configure(&mut self, binding: EvaluationBinding) {
        if self.binding.is_none() {
            tracing::debug!(
                population = %self.name,
                agent = binding.agent,
                behaviour = %binding.behaviour,
                "Evaluation problem configured"
            );
            self.binding = Some(binding);
        }
    }

    fn evolve(&mut self, evaluator: &dyn Evaluator) -> Result<(), EvolutionError> {
        if self.binding.is_none() {
            return Err(EvolutionError::Unconfigured);
        }
        if self.individuals.is_empty() {
            return Err(EvolutionError::EmptyPopulation);
        }

        let fitness = self
            .individuals
            .iter()
            .map(|ind| evaluator.fitness_of(ind.id))
            .collect::<Result<Vec<f64>, _>>()?;

        for (ind, &f) in self.individuals.iter_mut().zip(&fitness) {
            ind.fitness = Some(f);
        }
        if let Some(&top) = selection::rank_by_fitness(&fitness).first() {
            let improves = self
                .best
                .as_ref()
                .and_then(|b| b.fitness)
                .map_or(true, |best| fitness[top] > best);
            if improves {
                self.best = Some(self.individuals[top].clone());
            }
        }

        self.individuals = self.breed(&fitness);
        self.generation += 1;
        tracing::debug!(
            population = %self.name,
            generation = self.generation,
            best = self.best.as_ref().and_then(|b| b.fitness),
            "Population evolved"
        );
        Ok(())
    }

    fn best_so_far(&self) -> Option<&Individual<CgpGenome>> {
        self.best.as_ref()
    }

    fn finish(&mut self) {
        self.binding = None;
    }

    fn checkpoint(&self) -> PopulationCheckpoint {
        PopulationCheckpoint {
            generation: self.generation,
            next_id: self.next_id,
            genomes: self.individuals.iter().map(|i| i.genome.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimetic_data::BehaviourKind;
    use std::collections::HashMap;

    struct TableEvaluator(HashMap<ProgramId, f64>);

    impl Evaluator for TableEvaluator {
        fn fitness_of(&self, id: ProgramId) -> Result<f64, EvolutionError> {
            self.0
                .get(&id)
                .copied()
                .ok_or(EvolutionError::Unevaluated(id))
        }
    }

    fn params() -> EvolutionConfig {
        EvolutionConfig {
            population_size: 4,
            num_nodes: 8,
            ..EvolutionConfig::default()
        }
    }

    fn binding() -> EvaluationBinding {
        EvaluationBinding {
            agent: 0,
            behaviour: BehaviourKind::Competition,
        }
    }

    fn score_all(pop: &CgpPopulation) -> TableEvaluator {
        TableEvaluator(
            pop.individuals()
                .iter()
                .enumerate()
                .map(|(i, ind)| (ind.id, i as f64))
                .collect(),
        )
    }

    #[test]
    fn test_evolve_requires_configuration() {
        let mut pop = CgpPopulation::new("controllers", params(), 8, 2, 1);
        let eval = score_all(&pop);
        assert_eq!(pop.evolve(&eval), Err(EvolutionError::Unconfigured));
        assert_eq!(pop.generation(), 0);
    }

    #[test]
    fn test_evolve_requires_every_fitness() {
        let mut pop = CgpPopulation::new("controllers", params(), 8, 2, 1);
        pop.configure(binding());
        let missing = pop.individuals()[2].id;
        let mut eval = score_all(&pop);
        eval.0.remove(&missing);
        assert_eq!(pop.evolve(&eval), Err(EvolutionError::Unevaluated(missing)));
        assert_eq!(pop.generation(), 0);
    }

    #[test]
    fn test_evolve_issues_fresh_ids_and_keeps_elite() {
        let mut pop = CgpPopulation::new("controllers", params(), 8, 2, 1);
        pop.configure(binding());
        let old_ids: Vec<_> = pop.individuals().iter().map(|i| i.id).collect();
        let fittest = pop.individuals()[3].genome.clone();

        pop.evolve(&score_all(&pop)).unwrap();

        assert_eq!(pop.generation(), 1);
        assert_eq!(pop.len(), 4);
        assert!(pop.individuals().iter().all(|i| !old_ids.contains(&i.id)));
        assert!(pop.individuals().iter().all(|i| i.fitness.is_none()));
        assert_eq!(pop.individuals()[0].genome, fittest);
        assert_eq!(pop.best_so_far().and_then(|b| b.fitness), Some(3.0));
    }

    #[test]
    fn test_configure_is_idempotent() {
        let mut pop = CgpPopulation::new("controllers", params(), 8, 2, 1);
        pop.configure(binding());
        pop.configure(EvaluationBinding {
            agent: 9,
            behaviour: BehaviourKind::Imitation,
        });
        assert_eq!(pop.binding(), Some(binding()));
    }

    #[test]
    fn test_same_seed_same_population() {
        let a = CgpPopulation::new("c", params(), 8, 2, 99);
        let b = CgpPopulation::new("c", params(), 8, 2, 99);
        assert_eq!(a.individuals(), b.individuals());
    }

    #[test]
    fn test_checkpoint_restore() {
        let mut pop = CgpPopulation::new("controllers", params(), 8, 2, 1);
        pop.configure(binding());
        pop.evolve(&score_all(&pop)).unwrap();

        let restored =
            CgpPopulation::from_checkpoint("controllers", params(), pop.checkpoint(), 2).unwrap();
        assert_eq!(restored.generation(), 1);
        assert!(!restored.is_configured());
        let ids: Vec<_> = restored.individuals().iter().map(|i| i.id).collect();
        let original: Vec<_> = pop.individuals().iter().map(|i| i.id).collect();
        assert_eq!(ids, original);

        let empty = PopulationCheckpoint {
            generation: 0,
            next_id: 0,
            genomes: vec![],
        };
        assert!(CgpPopulation::from_checkpoint("x", params(), empty, 0).is_err());
    }

    #[test]
    fn test_checkpoint_with_dangling_connection_is_rejected() {
        let pop = CgpPopulation::new("controllers", params(), 3, 2, 4);
        let mut checkpoint = pop.checkpoint();
        checkpoint.genomes[1].nodes[0].connections = [0, 40];
        let err = CgpPopulation::from_checkpoint("controllers", params(), checkpoint, 4).unwrap_err();
        assert!(matches!(err, EvolutionError::MalformedGenome { index: 1, .. }));
    }

    #[test]
    fn test_checkpoint_with_mixed_shapes_is_rejected() {
        let pop = CgpPopulation::new("controllers", params(), 3, 2, 4);
        let mut checkpoint = pop.checkpoint();
        checkpoint.genomes[2].outputs.pop();
        let err = CgpPopulation::from_checkpoint("controllers", params(), checkpoint, 4).unwrap_err();
        assert!(matches!(err, EvolutionError::MalformedGenome { index: 2, .. }));
    }
}
