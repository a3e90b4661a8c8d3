use super::genome::GenomeLogic;
use crate::program::Interpreter;
use mimetic_data::{CgpFunction, CgpGenome, CgpNode};

/// Applies a node function. Division by zero yields 1.
#[must_use]
pub fn apply(function: CgpFunction, a: f64, b: f64) -> f64 {
    match function {
        CgpFunction::Add => a + b,
        CgpFunction::Sub => a - b,
        CgpFunction::Mul => a * b,
        CgpFunction::Div => {
            if b == 0.0 {
                1.0
            } else {
                a / b
            }
        }
        CgpFunction::Sin => a.sin(),
    }
}

/// Steppable CGP evaluator.
///
/// The first `step` copies the inputs into the value table, every further
/// step evaluates one active node. Outputs are valid once `finished`.
#[derive(Debug, Default, Clone)]
pub struct CgpInterpreter {
    num_inputs: usize,
    nodes: Vec<CgpNode>,
    output_genes: Vec<u32>,
    active: Vec<usize>,
    values: Vec<f64>,
    cursor: usize,
    inputs_loaded: bool,
    outputs: Vec<f64>,
}

impl CgpInterpreter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes the loaded program actually evaluates.
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    fn collect_outputs(&mut self) {
        self.outputs.clear();
        for &gene in &self.output_genes {
            self.outputs
                .push(self.values.get(gene as usize).copied().unwrap_or(0.0));
        }
    }
}

impl Interpreter for CgpInterpreter {
    type Genome = CgpGenome;

    fn load(&mut self, genome: &CgpGenome) {
        self.num_inputs = genome.num_inputs as usize;
        self.nodes.clear();
        self.nodes.extend_from_slice(&genome.nodes);
        self.output_genes.clear();
        self.output_genes.extend_from_slice(&genome.outputs);
        self.active = genome.active_nodes();
        self.values.clear();
        self.values.resize(genome.value_count(), 0.0);
        self.cursor = 0;
        self.inputs_loaded = false;
        self.outputs.clear();
    }

    fn step(&mut self, inputs: &[f64]) {
        if !self.inputs_loaded {
            for (slot, value) in self.values[..self.num_inputs]
                .iter_mut()
                .zip(inputs.iter().chain(std::iter::repeat(&0.0)))
            {
                *slot = *value;
            }
            self.inputs_loaded = true;
        } else if let Some(&idx) = self.active.get(self.cursor) {
            let node = self.nodes[idx];
            let a = self.values[node.connections[0] as usize];
            let b = self.values[node.connections[1] as usize];
            self.values[self.num_inputs + idx] = apply(node.function, a, b);
            self.cursor += 1;
        }

        if self.finished() {
            self.collect_outputs();
        }
    }

    fn finished(&self) -> bool {
        self.inputs_loaded && self.cursor >= self.active.len()
    }

    fn outputs(&self) -> &[f64] {
        &self.outputs
    }
}
