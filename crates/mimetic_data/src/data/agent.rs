use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

/// A point or direction on the continuous 2D domain.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Vec2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Per-agent kinematic and historical state.
///
/// Lives in the world's agent table and is addressed by `index`. Other agents
/// only ever read copies of it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct AgentState {
    /// Stable index into the agent table.
    pub index: usize,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Landscape value at `position`, refreshed on every move.
    pub fitness: f64,
    /// Highest fitness ever observed by this agent. Never decreases.
    pub best_fitness: f64,
    pub best_position: Vec2,
    /// Completed steps. Never decreases.
    pub steps: u64,
}

impl AgentState {
    #[must_use]
    pub fn new(index: usize, position: Vec2, velocity: Vec2, fitness: f64) -> Self {
        Self {
            index,
            position,
            velocity,
            fitness,
            best_fitness: fitness,
            best_position: position,
            steps: 0,
        }
    }
}
