use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which controller arbitration strategy an agent runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BehaviourKind {
    /// Score = own fitness relative to a mediator's best fitness.
    #[default]
    Competition,
    /// Score = how closely the agent's velocity tracks a mediator's.
    Imitation,
    /// Score = fitness progression, with the mediator visible to the controller.
    SocialFitness,
    /// Score = fitness progression, agent-only inputs.
    FitnessExploitation,
    /// Controllers scored by a co-evolving population of objective programs.
    MetaCompetition,
    /// Non-evolving particle swarm baseline.
    Pso,
}

impl BehaviourKind {
    pub const ALL: [BehaviourKind; 6] = [
        BehaviourKind::Competition,
        BehaviourKind::Imitation,
        BehaviourKind::SocialFitness,
        BehaviourKind::FitnessExploitation,
        BehaviourKind::MetaCompetition,
        BehaviourKind::Pso,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviourKind::Competition => "competition",
            BehaviourKind::Imitation => "imitation",
            BehaviourKind::SocialFitness => "social_fitness",
            BehaviourKind::FitnessExploitation => "fitness_exploitation",
            BehaviourKind::MetaCompetition => "meta_competition",
            BehaviourKind::Pso => "pso",
        }
    }

    /// Whether this strategy evolves its controllers.
    #[must_use]
    pub fn is_evolutionary(&self) -> bool {
        !matches!(self, BehaviourKind::Pso)
    }
}

impl fmt::Display for BehaviourKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a name does not match any known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown variant '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for BehaviourKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "competition" => Ok(BehaviourKind::Competition),
            "imitation" | "mimetic" => Ok(BehaviourKind::Imitation),
            "social_fitness" | "social" => Ok(BehaviourKind::SocialFitness),
            "fitness_exploitation" | "exploitation" => Ok(BehaviourKind::FitnessExploitation),
            "meta_competition" | "meta" => Ok(BehaviourKind::MetaCompetition),
            "pso" => Ok(BehaviourKind::Pso),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

/// Which fitness landscape the agents explore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LandscapeKind {
    #[default]
    Booth,
    Rastrigin,
    Griewangk,
    Rosenbrock,
}

impl fmt::Display for LandscapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LandscapeKind::Booth => "booth",
            LandscapeKind::Rastrigin => "rastrigin",
            LandscapeKind::Griewangk => "griewangk",
            LandscapeKind::Rosenbrock => "rosenbrock",
        };
        f.write_str(name)
    }
}

impl FromStr for LandscapeKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "booth" => Ok(LandscapeKind::Booth),
            "rastrigin" => Ok(LandscapeKind::Rastrigin),
            "griewangk" | "griewank" => Ok(LandscapeKind::Griewangk),
            "rosenbrock" => Ok(LandscapeKind::Rosenbrock),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

/// Population-wide snapshot taken by the simulation loop.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SimulationStats {
    pub tick: u64,
    pub agents: usize,
    pub mean_fitness: f64,
    pub best_fitness: f64,
    /// Agents currently within the success threshold of the target fitness.
    pub successes: usize,
    pub global_best_fitness: f64,
    pub global_best_x: f64,
    pub global_best_y: f64,
    /// Mean controller generation across evolutionary behaviours.
    pub mean_generation: f64,
    pub aborted_behaviours: usize,
}

/// Tagged union of the notable things that happen during a run.
///
/// Serialised with `#[serde(tag = "event")]` for streaming JSONL output.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event")]
pub enum LiveEvent {
    /// A behaviour's utility ran out and it moved on to the next controller.
    ControllerSwitched {
        agent: usize,
        tick: u64,
        from: usize,
        to: usize,
        evaluated: usize,
    },
    /// Every controller of a generation was tried and the population evolved.
    GenerationAdvanced {
        agent: usize,
        tick: u64,
        population: String,
        generation: u64,
    },
    /// A behaviour hit a fatal precondition and stopped updating.
    BehaviourAborted {
        agent: usize,
        tick: u64,
        reason: String,
    },
    /// Periodic macro-state snapshot.
    Snapshot { tick: u64, stats: SimulationStats },
    /// The stopping condition fired.
    Halted { tick: u64, successes: usize },
}

impl LiveEvent {
    #[must_use]
    pub fn tick(&self) -> u64 {
        match self {
            LiveEvent::ControllerSwitched { tick, .. }
            | LiveEvent::GenerationAdvanced { tick, .. }
            | LiveEvent::BehaviourAborted { tick, .. }
            | LiveEvent::Snapshot { tick, .. }
            | LiveEvent::Halted { tick, .. } => *tick,
        }
    }
}
