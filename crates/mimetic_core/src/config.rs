//! Configuration management for simulation parameters.
//!
//! This module provides strongly-typed configuration structures that map to
//! the `config.toml` file. Every section has defaults, so a file only needs to
//! name what it overrides.
//!
//! ## Configuration Hierarchy
//!
//! 1. Default values (hardcoded in `Default` impls)
//! 2. `config.toml` file (overrides defaults)
//! 3. Command line flags applied by the binary
//!
//! ## Example `config.toml`
//!
//! ```toml
//! behaviour = "social_fitness"
//!
//! [world]
//! num_agents = 50
//! landscape = "rastrigin"
//! seed = 42
//!
//! [social_fitness]
//! maturation_steps = 5
//!
//! [social_fitness.evolution]
//! population_size = 8
//! mutation_rate = 0.15
//! ```

use anyhow::Context;
use mimetic_data::{BehaviourKind, LandscapeKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// World-level simulation configuration.
///
/// Geometry of the toroidal domain, population size, neighbourhood ring and
/// the success criterion of the stopping condition.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f64,
    pub height: f64,
    pub num_agents: usize,
    pub neighbourhood_size: usize,
    pub initial_velocity_range: f64,
    pub velocity_scalar: f64,
    pub landscape: LandscapeKind,
    pub target_fitness: f64,
    pub success_threshold: f64,
    pub seed: Option<u64>,
    pub max_ticks: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 20.24,
            height: 20.24,
            num_agents: 100,
            neighbourhood_size: 10,
            initial_velocity_range: 1.0,
            velocity_scalar: 0.5,
            landscape: LandscapeKind::Booth,
            target_fitness: 1000.0,
            success_threshold: 1.0e-8,
            seed: None,
            max_ticks: None,
        }
    }
}

/// Parameters of one program population.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    /// Computational nodes per CGP genome.
    pub num_nodes: usize,
    /// Per-gene probability of a point mutation.
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub tournament_size: usize,
    /// Individuals copied unchanged into the next generation.
    pub elites: usize,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 10,
            num_nodes: 20,
            mutation_rate: 0.1,
            crossover_rate: 0.2,
            tournament_size: 2,
            elites: 1,
        }
    }
}

/// Parameters shared by the four utility-driven arbitration strategies.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ArbitrationConfig {
    /// Ticks a controller runs between two scorings.
    pub maturation_steps: u64,
    /// Utility restored after every controller switch.
    pub initial_utility: f64,
    /// Utility granted to the very first controller at setup.
    pub startup_utility: f64,
    pub utility_update_speed: f64,
    /// Competition threshold or minimal progress, depending on the strategy.
    /// Imitation ignores it.
    pub threshold: f64,
    pub evolution: EvolutionConfig,
}

impl Default for ArbitrationConfig {
    fn default() -> Self {
        Self {
            maturation_steps: 1,
            initial_utility: 10.0,
            startup_utility: 30.0,
            utility_update_speed: 1.0,
            threshold: 0.1,
            evolution: EvolutionConfig::default(),
        }
    }
}

/// Dual-population co-evolution parameters.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MetaConfig {
    pub controllers: EvolutionConfig,
    pub objectives: EvolutionConfig,
    /// Energy every (controller, objective) pair starts from after a reset.
    pub initial_energy: f64,
    /// Ticks between two energy snapshots.
    pub energy_sampling_interval: u64,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            controllers: EvolutionConfig::default(),
            objectives: EvolutionConfig {
                population_size: 5,
                ..EvolutionConfig::default()
            },
            initial_energy: 100.0,
            energy_sampling_interval: 10,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PsoConfig {
    pub inertia_x: f64,
    pub inertia_y: f64,
    /// Lower bound of the random attraction weights.
    pub weight_offset: f64,
}

impl Default for PsoConfig {
    fn default() -> Self {
        Self {
            inertia_x: 0.9,
            inertia_y: 0.8,
            weight_offset: 0.4,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `mimetic_core=debug`.
    pub level: String,
    /// Ticks between two stats snapshots. 0 disables snapshots.
    pub snapshot_interval: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            snapshot_interval: 100,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub behaviour: BehaviourKind,
    pub world: WorldConfig,
    pub competition: ArbitrationConfig,
    pub imitation: ArbitrationConfig,
    pub social_fitness: ArbitrationConfig,
    pub fitness_exploitation: ArbitrationConfig,
    pub meta: MetaConfig,
    pub pso: PsoConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            behaviour: BehaviourKind::Competition,
            world: WorldConfig::default(),
            competition: ArbitrationConfig::default(),
            imitation: ArbitrationConfig {
                maturation_steps: 10,
                ..ArbitrationConfig::default()
            },
            social_fitness: ArbitrationConfig {
                threshold: 1.0,
                ..ArbitrationConfig::default()
            },
            fitness_exploitation: ArbitrationConfig {
                threshold: 1.0,
                ..ArbitrationConfig::default()
            },
            meta: MetaConfig::default(),
            pso: PsoConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn validate_evolution(name: &str, evo: &EvolutionConfig) -> anyhow::Result<()> {
    anyhow::ensure!(
        evo.population_size > 0,
        "{name}: population size must be positive"
    );
    anyhow::ensure!(evo.num_nodes > 0, "{name}: node count must be positive");
    anyhow::ensure!(
        (0.0..=1.0).contains(&evo.mutation_rate),
        "{name}: mutation rate must be in [0.0, 1.0]"
    );
    anyhow::ensure!(
        (0.0..=1.0).contains(&evo.crossover_rate),
        "{name}: crossover rate must be in [0.0, 1.0]"
    );
    anyhow::ensure!(
        evo.tournament_size > 0,
        "{name}: tournament size must be positive"
    );
    anyhow::ensure!(
        evo.elites <= evo.population_size,
        "{name}: elites cannot exceed the population size"
    );
    Ok(())
}

fn validate_arbitration(name: &str, params: &ArbitrationConfig) -> anyhow::Result<()> {
    anyhow::ensure!(
        params.maturation_steps > 0,
        "{name}: maturation steps must be positive"
    );
    anyhow::ensure!(
        params.initial_utility > 0.0,
        "{name}: initial utility must be positive"
    );
    anyhow::ensure!(
        params.startup_utility > 0.0,
        "{name}: startup utility must be positive"
    );
    anyhow::ensure!(
        params.utility_update_speed >= 0.0,
        "{name}: utility update speed must be non-negative"
    );
    anyhow::ensure!(
        params.threshold >= 0.0,
        "{name}: threshold must be non-negative"
    );
    validate_evolution(name, &params.evolution)
}

impl AppConfig {
    /// Validates all configuration parameters.
    ///
    /// Returns `Ok(())` if all parameters are valid, or `Err` with a description
    /// of the first validation failure.
    pub fn validate(&self) -> anyhow::Result<()> {
        let world = &self.world;
        anyhow::ensure!(
            world.width > 0.0 && world.width.is_finite(),
            "World width must be positive"
        );
        anyhow::ensure!(
            world.height > 0.0 && world.height.is_finite(),
            "World height must be positive"
        );
        anyhow::ensure!(world.num_agents > 0, "At least one agent is required");
        anyhow::ensure!(
            world.num_agents <= 100_000,
            "Too many agents (max 100000)"
        );
        anyhow::ensure!(
            world.neighbourhood_size > 0 && world.neighbourhood_size <= world.num_agents,
            "Neighbourhood size must be in [1, num_agents]"
        );
        anyhow::ensure!(
            world.initial_velocity_range >= 0.0,
            "Initial velocity range must be non-negative"
        );
        anyhow::ensure!(
            world.velocity_scalar >= 0.0,
            "Velocity scalar must be non-negative"
        );
        anyhow::ensure!(
            world.success_threshold >= 0.0,
            "Success threshold must be non-negative"
        );

        validate_arbitration("competition", &self.competition)?;
        validate_arbitration("imitation", &self.imitation)?;
        validate_arbitration("social_fitness", &self.social_fitness)?;
        validate_arbitration("fitness_exploitation", &self.fitness_exploitation)?;

        validate_evolution("meta.controllers", &self.meta.controllers)?;
        validate_evolution("meta.objectives", &self.meta.objectives)?;
        anyhow::ensure!(
            self.meta.initial_energy > 0.0,
            "Meta initial energy must be positive"
        );
        anyhow::ensure!(
            self.meta.energy_sampling_interval > 0,
            "Energy sampling interval must be positive"
        );

        anyhow::ensure!(
            self.pso.weight_offset >= 0.0,
            "PSO weight offset must be non-negative"
        );
        Ok(())
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// A missing or unreadable file is an error; there is no silent fallback.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration from {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("parsing configuration from {}", path.display()))
    }

    /// Parameter set of a utility-driven strategy, or `None` for strategies
    /// that do not arbitrate by utility.
    #[must_use]
    pub fn arbitration(&self, kind: BehaviourKind) -> Option<&ArbitrationConfig> {
        match kind {
            BehaviourKind::Competition => Some(&self.competition),
            BehaviourKind::Imitation => Some(&self.imitation),
            BehaviourKind::SocialFitness => Some(&self.social_fitness),
            BehaviourKind::FitnessExploitation => Some(&self.fitness_exploitation),
            BehaviourKind::MetaCompetition | BehaviourKind::Pso => None,
        }
    }

    /// Stable hash of everything that shapes agent behaviour.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.behaviour.as_str().as_bytes());
        hasher.update(format!("{:?}", self.world).as_bytes());
        hasher.update(format!("{:?}", self.competition).as_bytes());
        hasher.update(format!("{:?}", self.imitation).as_bytes());
        hasher.update(format!("{:?}", self.social_fitness).as_bytes());
        hasher.update(format!("{:?}", self.fitness_exploitation).as_bytes());
        hasher.update(format!("{:?}", self.meta).as_bytes());
        hasher.update(format!("{:?}", self.pso).as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_imitation_matures_slower_by_default() {
        let config = AppConfig::default();
        assert_eq!(config.imitation.maturation_steps, 10);
        assert_eq!(config.competition.maturation_steps, 1);
        assert_eq!(config.social_fitness.threshold, 1.0);
    }

    #[test]
    fn test_invalid_neighbourhood() {
        let config = AppConfig {
            world: WorldConfig {
                num_agents: 4,
                neighbourhood_size: 5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_maturation_rejected() {
        let config = AppConfig {
            competition: ArbitrationConfig {
                maturation_steps: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_mutation_rate() {
        let mut config = AppConfig::default();
        config.meta.objectives.mutation_rate = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            behaviour = "meta_competition"

            [world]
            num_agents = 20
            landscape = "griewangk"

            [meta]
            energy_sampling_interval = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.behaviour, BehaviourKind::MetaCompetition);
        assert_eq!(config.world.num_agents, 20);
        assert_eq!(config.world.neighbourhood_size, 10);
        assert_eq!(config.world.landscape, LandscapeKind::Griewangk);
        assert_eq!(config.meta.energy_sampling_interval, 5);
        assert_eq!(config.meta.initial_energy, 100.0);
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let err = AppConfig::load("/definitely/not/here/config.toml").unwrap_err();
        assert!(format!("{err:#}").contains("reading configuration"));
    }

    #[test]
    fn test_arbitration_lookup() {
        let config = AppConfig::default();
        assert!(config.arbitration(BehaviourKind::Imitation).is_some());
        assert!(config.arbitration(BehaviourKind::MetaCompetition).is_none());
        assert!(config.arbitration(BehaviourKind::Pso).is_none());
    }

    #[test]
    fn test_fingerprint_consistency() {
        let config1 = AppConfig::default();
        let config2 = AppConfig::default();
        assert_eq!(config1.fingerprint(), config2.fingerprint());

        let mut config3 = AppConfig::default();
        config3.behaviour = BehaviourKind::Imitation;
        assert_ne!(config1.fingerprint(), config3.fingerprint());
    }
}
