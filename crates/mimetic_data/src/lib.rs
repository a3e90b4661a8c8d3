//! # Mimetic Data
//!
//! Plain, serialisable data shared by the simulation engine, the I/O layer and
//! the binary. Nothing in here owns behaviour; logic lives in `mimetic_core`.

pub mod data;

pub use data::agent::{AgentState, Vec2};
pub use data::environment::{
    BehaviourKind, LandscapeKind, LiveEvent, SimulationStats, UnknownVariant,
};
pub use data::genome::{CgpFunction, CgpGenome, CgpNode, PopulationCheckpoint};
