use crate::config::WorldConfig;
use mimetic_data::AgentState;

/// Halts a run once every agent sits within `threshold` of `target` fitness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoppingCondition {
    pub target: f64,
    pub threshold: f64,
}

impl StoppingCondition {
    #[must_use]
    pub fn new(target: f64, threshold: f64) -> Self {
        Self { target, threshold }
    }

    #[must_use]
    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(config.target_fitness, config.success_threshold)
    }

    #[must_use]
    pub fn is_success(&self, agent: &AgentState) -> bool {
        (agent.fitness - self.target).abs() <= self.threshold
    }

    #[must_use]
    pub fn successes(&self, agents: &[AgentState]) -> usize {
        agents.iter().filter(|a| self.is_success(a)).count()
    }

    /// An empty population never halts.
    #[must_use]
    pub fn is_met(&self, agents: &[AgentState]) -> bool {
        !agents.is_empty() && agents.iter().all(|a| self.is_success(a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimetic_data::Vec2;

    fn agent(fitness: f64) -> AgentState {
        AgentState::new(0, Vec2::ZERO, Vec2::ZERO, fitness)
    }

    #[test]
    fn test_all_agents_must_succeed() {
        let stop = StoppingCondition::new(1000.0, 1e-8);
        let agents = [agent(1000.0), agent(1000.0 - 1e-9), agent(999.0)];
        assert_eq!(stop.successes(&agents), 2);
        assert!(!stop.is_met(&agents));
        assert!(stop.is_met(&agents[..2]));
        assert!(!stop.is_met(&[]));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let stop = StoppingCondition::new(1000.0, 0.5);
        assert!(stop.is_met(&[agent(999.5), agent(1000.5)]));
    }
}
