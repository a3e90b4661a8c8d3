mod common;

use common::{Bowl, Homing, SimBuilder};
use mimetic_core::behaviour::Behaviour;
use mimetic_core::stopping::StoppingCondition;
use mimetic_data::{AgentState, BehaviourKind, LiveEvent, Vec2};
use std::sync::Arc;

fn homing_sim() -> mimetic_core::simulation::Simulation {
    SimBuilder::new()
        .with_landscape(Arc::new(Bowl))
        .with_agent_at(3.0, -2.0)
        .with_agent_at(-4.5, 1.5)
        .with_agent_at(0.5, 0.25)
        .with_factory(Box::new(|_config, _world, agent, _seed| {
            Ok(Box::new(Homing { agent }) as Box<dyn Behaviour>)
        }))
        .build()
}

#[test]
fn test_run_halts_once_every_agent_reaches_the_target() {
    let mut sim = homing_sim();
    assert!(!sim.is_halted());

    let outcome = sim.run(100);
    assert!(outcome.halted);
    assert_eq!(outcome.ticks, 1);
    assert_eq!(sim.stats().successes, 3);
    assert_eq!(sim.world().best_global().0, 1000.0);

    let events = sim.drain_events();
    assert!(matches!(
        events.last(),
        Some(LiveEvent::Halted {
            tick: 1,
            successes: 3
        })
    ));
}

#[test]
fn test_halted_run_ignores_further_ticks() {
    let mut sim = homing_sim();
    sim.run(10);
    let tick = sim.current_tick();
    assert!(sim.tick());
    assert_eq!(sim.run(10).ticks, 0);
    assert_eq!(sim.current_tick(), tick);
}

#[test]
fn test_one_straggler_keeps_the_run_going() {
    let condition = StoppingCondition::new(1000.0, 1e-8);
    let at = |fitness| AgentState::new(0, Vec2::ZERO, Vec2::ZERO, fitness);
    assert!(condition.is_met(&[at(1000.0), at(1000.0 - 1e-9)]));
    assert!(!condition.is_met(&[at(1000.0), at(999.0)]));
    assert!(!condition.is_met(&[]));
    assert_eq!(condition.successes(&[at(1000.0), at(999.0)]), 1);
}

#[test]
fn test_swarm_climbs_the_bowl() {
    let mut sim = SimBuilder::new()
        .with_behaviour(BehaviourKind::Pso)
        .with_landscape(Arc::new(Bowl))
        .with_agents(12)
        .with_config(|c| c.world.neighbourhood_size = 3)
        .build();
    let start = sim.world().best_global().0;
    let start_mean = sim.stats().mean_fitness;
    sim.run(300);
    let stats = sim.stats();
    assert!(stats.global_best_fitness >= start);
    assert!(stats.global_best_fitness > 999.0);
    assert!(stats.mean_fitness > start_mean);
    assert_in_domain!(sim);
    assert_bests_monotone!(sim);
}
