//! # Mimetic Core
//!
//! The deterministic engine behind Mimetic: agents exploring a toroidal
//! fitness landscape, each steering with evolvable controller programs.
//!
//! This crate contains:
//! - The controller arbitration engine and its scoring strategies
//!   (competition, imitation, social fitness, fitness exploitation)
//! - Meta-competition, where objective programs co-evolve with controllers
//! - A particle swarm baseline
//! - A Cartesian GP program population service
//! - The toroidal world, benchmark landscapes and the simulation loop
//! - Configuration, metrics and structured logging
//!
//! ## Example
//!
//! ```
//! use mimetic_core::config::AppConfig;
//! use mimetic_core::simulation::Simulation;
//!
//! let mut config = AppConfig::default();
//! config.world.num_agents = 10;
//! config.world.seed = Some(42);
//!
//! let mut sim = Simulation::new(config).unwrap();
//! let outcome = sim.run(20);
//! assert!(outcome.ticks <= 20);
//! ```

/// Per-agent behaviour slot and step ordering
pub mod agent;
/// Controller arbitration behaviours and their scoring policies
pub mod behaviour;
/// Configuration management for simulation parameters
pub mod config;
/// Behaviour error taxonomy
pub mod error;
/// Benchmark fitness landscapes
pub mod landscape;
/// Performance metrics collection and logging
pub mod metrics;
/// Program population service contract and its CGP implementation
pub mod program;
/// Simulation loop, builder and snapshots
pub mod simulation;
/// Streaming statistics
pub mod stats;
/// Success criterion that halts a run
pub mod stopping;
/// Toroidal domain and agent table
pub mod world;

pub use behaviour::{build_behaviour, Behaviour, ScoringPolicy};
pub use error::BehaviourError;
pub use landscape::FitnessLandscape;
pub use metrics::{init_logging, Metrics};
pub use program::{Interpreter, ProgramPopulation};
pub use simulation::{Simulation, SimulationBuilder};
pub use world::World;
