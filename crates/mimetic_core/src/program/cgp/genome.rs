use mimetic_data::{CgpFunction, CgpGenome, CgpNode};
use rand::Rng;

/// Genetic operators over Cartesian GP genomes.
pub trait GenomeLogic {
    fn new_random_with_rng<R: Rng>(
        num_inputs: usize,
        num_nodes: usize,
        num_outputs: usize,
        rng: &mut R,
    ) -> Self;
    fn mutate_with_rate<R: Rng>(&mut self, rate: f64, rng: &mut R);
    fn crossover_with_rng<R: Rng>(&self, other: &Self, rng: &mut R) -> Self;
    /// Node indices that contribute to an output, in evaluation order.
    fn active_nodes(&self) -> Vec<usize>;
    fn is_well_formed(&self) -> bool;
    fn to_hex(&self) -> anyhow::Result<String>;
    fn from_hex(hex_str: &str) -> anyhow::Result<Self>
    where
        Self: Sized;
}

fn random_function<R: Rng>(rng: &mut R) -> CgpFunction {
    CgpFunction::MOVEMENT[rng.gen_range(0..CgpFunction::MOVEMENT.len())]
}

/// A connection gene for node `position` may address any input or any
/// earlier node.
fn random_connection<R: Rng>(num_inputs: u32, position: usize, rng: &mut R) -> u32 {
    rng.gen_range(0..num_inputs + position as u32)
}

impl GenomeLogic for CgpGenome {
    fn new_random_with_rng<R: Rng>(
        num_inputs: usize,
        num_nodes: usize,
        num_outputs: usize,
        rng: &mut R,
    ) -> Self {
        let inputs = num_inputs as u32;
        let nodes = (0..num_nodes)
            .map(|i| CgpNode {
                function: random_function(rng),
                connections: [
                    random_connection(inputs, i, rng),
                    random_connection(inputs, i, rng),
                ],
            })
            .collect();
        let value_count = (num_inputs + num_nodes) as u32;
        let outputs = (0..num_outputs)
            .map(|_| rng.gen_range(0..value_count))
            .collect();
        Self {
            num_inputs: inputs,
            nodes,
            outputs,
        }
    }

    fn mutate_with_rate<R: Rng>(&mut self, rate: f64, rng: &mut R) {
        let inputs = self.num_inputs;
        for (i, node) in self.nodes.iter_mut().enumerate() {
            if rng.gen::<f64>() < rate {
                node.function = random_function(rng);
            }
            for conn in &mut node.connections {
                if rng.gen::<f64>() < rate {
                    *conn = random_connection(inputs, i, rng);
                }
            }
        }
        let value_count = self.value_count() as u32;
        for out in &mut self.outputs {
            if rng.gen::<f64>() < rate {
                *out = rng.gen_range(0..value_count);
            }
        }
    }

    /// One-point crossover on the node list. Parents of different shapes
    /// cannot be aligned, so the first parent is returned unchanged.
    fn crossover_with_rng<R: Rng>(&self, other: &Self, rng: &mut R) -> Self {
        if self.num_inputs != other.num_inputs
            || self.nodes.len() != other.nodes.len()
            || self.outputs.len() != other.outputs.len()
        {
            return self.clone();
        }

        let cut = rng.gen_range(0..=self.nodes.len());
        let mut nodes = Vec::with_capacity(self.nodes.len());
        nodes.extend_from_slice(&self.nodes[..cut]);
        nodes.extend_from_slice(&other.nodes[cut..]);

        let outputs = self
            .outputs
            .iter()
            .zip(&other.outputs)
            .map(|(a, b)| if rng.gen_bool(0.5) { *a } else { *b })
            .collect();

        Self {
            num_inputs: self.num_inputs,
            nodes,
            outputs,
        }
    }

    fn active_nodes(&self) -> Vec<usize> {
        let inputs = self.num_inputs as usize;
        let mut active = vec![false; self.nodes.len()];
        let mut pending: Vec<usize> = self
            .outputs
            .iter()
            .map(|&o| o as usize)
            .filter(|&o| o >= inputs)
            .map(|o| o - inputs)
            .collect();

        while let Some(idx) = pending.pop() {
            if idx >= active.len() || active[idx] {
                continue;
            }
            active[idx] = true;
            let node = &self.nodes[idx];
            for &conn in &node.connections[..node.function.arity()] {
                let conn = conn as usize;
                if conn >= inputs {
                    pending.push(conn - inputs);
                }
            }
        }

        active
            .iter()
            .enumerate()
            .filter_map(|(i, &on)| on.then_some(i))
            .collect()
    }

    fn is_well_formed(&self) -> bool {
        let inputs = self.num_inputs as usize;
        let nodes_ok = self.nodes.iter().enumerate().all(|(i, node)| {
            node.connections
                .iter()
                .all(|&c| (c as usize) < inputs + i)
        });
        let value_count = self.value_count();
        nodes_ok && self.outputs.iter().all(|&o| (o as usize) < value_count)
    }

    fn to_hex(&self) -> anyhow::Result<String> {
        let json = serde_json::to_vec(self)?;
        Ok(hex::encode(json))
    }

    fn from_hex(hex_str: &str) -> anyhow::Result<Self> {
        let bytes = hex::decode(hex_str)?;
        let genome: CgpGenome = serde_json::from_slice(&bytes)?;
        anyhow::ensure!(genome.is_well_formed(), "genome is not feed-forward");
        Ok(genome)
    }
}
