use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

/// Primitive operation a CGP node can perform.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[archive(check_bytes)]
pub enum CgpFunction {
    Add,
    Sub,
    Mul,
    /// Protected division: yields 1 when the denominator is 0.
    Div,
    /// Unary; reads only the first connection.
    Sin,
}

impl CgpFunction {
    /// The movement function set, in gene order.
    pub const MOVEMENT: [CgpFunction; 5] = [
        CgpFunction::Add,
        CgpFunction::Sub,
        CgpFunction::Mul,
        CgpFunction::Div,
        CgpFunction::Sin,
    ];

    #[must_use]
    pub fn arity(&self) -> usize {
        match self {
            CgpFunction::Sin => 1,
            _ => 2,
        }
    }
}

/// One computational node. Connections address the value table: indices below
/// `num_inputs` are program inputs, the rest are earlier nodes.
#[derive(
    Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct CgpNode {
    pub function: CgpFunction,
    pub connections: [u32; 2],
}

/// A feed-forward Cartesian GP program.
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct CgpGenome {
    pub num_inputs: u32,
    pub nodes: Vec<CgpNode>,
    /// One value-table address per program output.
    pub outputs: Vec<u32>,
}

impl CgpGenome {
    #[must_use]
    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Size of the value table (inputs followed by node results).
    #[must_use]
    pub fn value_count(&self) -> usize {
        self.num_inputs as usize + self.nodes.len()
    }
}

/// Serialisable snapshot of a program population.
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct PopulationCheckpoint {
    pub generation: u64,
    /// Next identity the population would hand out.
    pub next_id: u64,
    pub genomes: Vec<CgpGenome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_count_includes_inputs() {
        let genome = CgpGenome {
            num_inputs: 4,
            nodes: vec![CgpNode {
                function: CgpFunction::Add,
                connections: [0, 1],
            }],
            outputs: vec![4, 2],
        };
        assert_eq!(genome.value_count(), 5);
        assert_eq!(genome.num_outputs(), 2);
    }

    #[test]
    fn test_sin_is_unary() {
        assert_eq!(CgpFunction::Sin.arity(), 1);
        assert!(CgpFunction::MOVEMENT
            .iter()
            .filter(|f| **f != CgpFunction::Sin)
            .all(|f| f.arity() == 2));
    }
}
