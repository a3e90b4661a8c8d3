/// Asserts that every agent of the simulation sits inside the toroidal domain.
#[macro_export]
macro_rules! assert_in_domain {
    ($sim:expr) => {
        let world = $sim.world();
        let (hw, hh) = (world.width() / 2.0, world.height() / 2.0);
        for agent in world.agents() {
            assert!(
                agent.position.x >= -hw && agent.position.x < hw,
                "Agent {} x = {} outside [{}, {})",
                agent.index,
                agent.position.x,
                -hw,
                hw
            );
            assert!(
                agent.position.y >= -hh && agent.position.y < hh,
                "Agent {} y = {} outside [{}, {})",
                agent.index,
                agent.position.y,
                -hh,
                hh
            );
        }
    };
}

/// Asserts that no agent's personal best is below its current fitness.
#[macro_export]
macro_rules! assert_bests_monotone {
    ($sim:expr) => {
        for agent in $sim.world().agents() {
            assert!(
                agent.best_fitness >= agent.fitness,
                "Agent {} best {} is below current {}",
                agent.index,
                agent.best_fitness,
                agent.fitness
            );
        }
    };
}
