//! Core data structures for the Mimetic simulation.

pub mod agent;
pub mod environment;
pub mod genome;
