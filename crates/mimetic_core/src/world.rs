//! Toroidal 2D domain and the agent table.
//!
//! Agents never hold references to each other. Everything that needs another
//! agent (mediators, neighbourhood bests) looks it up here by index and works
//! on a copy.

use crate::config::WorldConfig;
use crate::landscape::FitnessLandscape;
use mimetic_data::{AgentState, Vec2};
use rand::Rng;
use std::sync::Arc;

/// Wraps `v` into `[-extent/2, extent/2)`.
#[must_use]
pub fn wrap(v: f64, extent: f64) -> f64 {
    let half = extent / 2.0;
    let mut r = (v + half).rem_euclid(extent);
    // rem_euclid can round up to `extent` for tiny negative inputs.
    if r >= extent {
        r = 0.0;
    }
    let wrapped = r - half;
    if wrapped >= half {
        -half
    } else {
        wrapped
    }
}

pub struct World {
    width: f64,
    height: f64,
    velocity_scalar: f64,
    neighbourhood_size: usize,
    landscape: Arc<dyn FitnessLandscape>,
    agents: Vec<AgentState>,
    global_best_fitness: f64,
    global_best_position: Vec2,
}

impl World {
    /// An empty world. Populate it with [`World::spawn_agents`] or
    /// [`World::place_agent`].
    #[must_use]
    pub fn new(config: &WorldConfig, landscape: Arc<dyn FitnessLandscape>) -> Self {
        Self {
            width: config.width,
            height: config.height,
            velocity_scalar: config.velocity_scalar,
            neighbourhood_size: config.neighbourhood_size,
            landscape,
            agents: Vec::new(),
            global_best_fitness: f64::NEG_INFINITY,
            global_best_position: Vec2::ZERO,
        }
    }

    /// Adds `count` agents with uniform random positions and velocities in
    /// `[-range/2, range/2)`.
    pub fn spawn_agents<R: Rng>(&mut self, count: usize, velocity_range: f64, rng: &mut R) {
        for _ in 0..count {
            let position = Vec2::new(
                uniform_centered(self.width, rng),
                uniform_centered(self.height, rng),
            );
            let velocity = Vec2::new(
                uniform_centered(velocity_range, rng),
                uniform_centered(velocity_range, rng),
            );
            self.place_agent(position, velocity);
        }
    }

    /// Appends an agent at `position` (wrapped into the domain) and returns
    /// its index.
    pub fn place_agent(&mut self, position: Vec2, velocity: Vec2) -> usize {
        let index = self.agents.len();
        let position = Vec2::new(wrap(position.x, self.width), wrap(position.y, self.height));
        let fitness = self.evaluate(position);
        self.agents
            .push(AgentState::new(index, position, velocity, fitness));
        self.record_fitness(index);
        index
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    #[must_use]
    pub fn velocity_scalar(&self) -> f64 {
        self.velocity_scalar
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    #[must_use]
    pub fn agents(&self) -> &[AgentState] {
        &self.agents
    }

    #[must_use]
    pub fn agent(&self, index: usize) -> Option<&AgentState> {
        self.agents.get(index)
    }

    #[must_use]
    pub fn landscape(&self) -> &Arc<dyn FitnessLandscape> {
        &self.landscape
    }

    #[must_use]
    pub fn evaluate(&self, position: Vec2) -> f64 {
        self.landscape.evaluate(position.x, position.y)
    }

    /// Stores `velocity` on the agent and moves it by `velocity * scalar`,
    /// wrapping on both axes. Fitness is re-evaluated at the new position.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a live agent.
    pub fn apply_velocity(&mut self, index: usize, velocity: Vec2) -> Vec2 {
        let (width, height, scalar) = (self.width, self.height, self.velocity_scalar);
        let position = {
            let agent = &self.agents[index];
            Vec2::new(
                wrap(agent.position.x + velocity.x * scalar, width),
                wrap(agent.position.y + velocity.y * scalar, height),
            )
        };
        let fitness = self.evaluate(position);
        let agent = &mut self.agents[index];
        agent.velocity = velocity;
        agent.position = position;
        agent.fitness = fitness;
        position
    }

    /// Indices of the fixed-size ring centred on `index`, starting at
    /// `index - size/2` and wrapping. The agent itself is part of its ring.
    #[must_use]
    pub fn neighbours_of(&self, index: usize) -> Vec<usize> {
        let n = self.agents.len();
        if n == 0 {
            return Vec::new();
        }
        let size = self.neighbourhood_size.clamp(1, n);
        let start = (index % n + n - (size / 2) % n) % n;
        (0..size).map(|k| (start + k) % n).collect()
    }

    /// The neighbour with the highest personal best.
    #[must_use]
    pub fn neighbourhood_best(&self, index: usize) -> Option<&AgentState> {
        self.neighbours_of(index)
            .into_iter()
            .filter_map(|i| self.agents.get(i))
            .max_by(|a, b| a.best_fitness.total_cmp(&b.best_fitness))
    }

    #[must_use]
    pub fn best_global(&self) -> (f64, Vec2) {
        (self.global_best_fitness, self.global_best_position)
    }

    /// Folds the agent's current fitness into its personal best and the
    /// global best. Both only ever improve.
    pub fn record_fitness(&mut self, index: usize) {
        let Some(agent) = self.agents.get_mut(index) else {
            return;
        };
        if agent.fitness > agent.best_fitness {
            agent.best_fitness = agent.fitness;
            agent.best_position = agent.position;
        }
        if agent.best_fitness > self.global_best_fitness {
            self.global_best_fitness = agent.best_fitness;
            self.global_best_position = agent.best_position;
        }
    }

    pub fn increment_steps(&mut self, index: usize) {
        if let Some(agent) = self.agents.get_mut(index) {
            agent.steps += 1;
        }
    }
}

fn uniform_centered<R: Rng>(extent: f64, rng: &mut R) -> f64 {
    if extent > 0.0 {
        rng.gen_range(-extent / 2.0..extent / 2.0)
    } else {
        0.0
    }
}
