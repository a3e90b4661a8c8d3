use crate::behaviour::{Behaviour, NamedCheckpoint, TickReport};
use crate::world::World;
use mimetic_data::{BehaviourKind, LiveEvent};

/// An agent's behaviour slot. Kinematic state lives in the [`World`].
pub struct Agent {
    index: usize,
    behaviour: Box<dyn Behaviour>,
    aborted: bool,
    finished: bool,
}

impl Agent {
    #[must_use]
    pub fn new(index: usize, behaviour: Box<dyn Behaviour>) -> Self {
        Self {
            index,
            behaviour,
            aborted: false,
            finished: false,
        }
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn kind(&self) -> BehaviourKind {
        self.behaviour.kind()
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    #[must_use]
    pub fn generation(&self) -> Option<u64> {
        self.behaviour.generation()
    }

    #[must_use]
    pub fn behaviour(&self) -> &dyn Behaviour {
        self.behaviour.as_ref()
    }

    /// Runs the behaviour, then folds the new fitness into the bests and
    /// counts the step. An aborted behaviour no longer moves the agent.
    pub fn step(&mut self, world: &mut World, tick: u64, events: &mut Vec<LiveEvent>) {
        if !self.aborted && !self.finished {
            match self.behaviour.update(world) {
                Ok(report) => self.publish(report, tick, events),
                Err(err) => {
                    tracing::error!(
                        agent = self.index,
                        tick,
                        behaviour = %self.behaviour.kind(),
                        error = %err,
                        "Behaviour aborted"
                    );
                    self.aborted = true;
                    events.push(LiveEvent::BehaviourAborted {
                        agent: self.index,
                        tick,
                        reason: err.to_string(),
                    });
                }
            }
        }
        world.record_fitness(self.index);
        world.increment_steps(self.index);
    }

    fn publish(&self, report: TickReport, tick: u64, events: &mut Vec<LiveEvent>) {
        if let Some(switch) = report.switch {
            events.push(LiveEvent::ControllerSwitched {
                agent: self.index,
                tick,
                from: switch.from,
                to: switch.to,
                evaluated: switch.evaluated,
            });
        }
        if let Some(advance) = report.advanced {
            events.push(LiveEvent::GenerationAdvanced {
                agent: self.index,
                tick,
                population: advance.population,
                generation: advance.generation,
            });
        }
    }

    #[must_use]
    pub fn checkpoint(&self) -> Vec<NamedCheckpoint> {
        self.behaviour.checkpoint()
    }

    /// Releases the behaviour's resources exactly once.
    pub fn finish(&mut self) {
        if !self.finished {
            self.behaviour.finish();
            self.finished = true;
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviour::{ControllerSwitch, GenerationAdvance};
    use crate::config::WorldConfig;
    use crate::error::BehaviourError;
    use crate::landscape::Booth;
    use mimetic_data::Vec2;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::Arc;

    struct Scripted {
        ticks: u32,
        fail_at: u32,
        finishes: Rc<Cell<u32>>,
    }

    impl Behaviour for Scripted {
        fn kind(&self) -> BehaviourKind {
            BehaviourKind::Competition
        }

        fn update(&mut self, world: &mut World) -> Result<TickReport, BehaviourError> {
            self.ticks += 1;
            if self.ticks == self.fail_at {
                return Err(BehaviourError::NotSetUp);
            }
            world.apply_velocity(0, Vec2::new(0.2, 0.0));
            Ok(TickReport {
                switch: Some(ControllerSwitch {
                    from: 0,
                    to: 1,
                    evaluated: 1,
                }),
                advanced: Some(GenerationAdvance {
                    population: "controllers".into(),
                    generation: 1,
                }),
            })
        }

        fn generation(&self) -> Option<u64> {
            None
        }

        fn finish(&mut self) {
            self.finishes.set(self.finishes.get() + 1);
        }

        fn checkpoint(&self) -> Vec<NamedCheckpoint> {
            Vec::new()
        }
    }

    fn world() -> World {
        let mut world = World::new(&WorldConfig::default(), Arc::new(Booth));
        world.place_agent(Vec2::ZERO, Vec2::ZERO);
        world
    }

    #[test]
    fn test_step_publishes_events_and_counts_steps() {
        let finishes = Rc::new(Cell::new(0));
        let mut agent = Agent::new(
            0,
            Box::new(Scripted {
                ticks: 0,
                fail_at: 0,
                finishes: finishes.clone(),
            }),
        );
        let mut w = world();
        let mut events = Vec::new();
        agent.step(&mut w, 0, &mut events);
        assert_eq!(events.len(), 2);
        assert_eq!(w.agent(0).unwrap().steps, 1);
        assert!(w.agent(0).unwrap().best_fitness >= w.agent(0).unwrap().fitness);
    }

    #[test]
    fn test_abort_stops_the_behaviour_only() {
        let finishes = Rc::new(Cell::new(0));
        let mut agent = Agent::new(
            0,
            Box::new(Scripted {
                ticks: 0,
                fail_at: 1,
                finishes: finishes.clone(),
            }),
        );
        let mut w = world();
        let mut events = Vec::new();
        agent.step(&mut w, 3, &mut events);
        agent.step(&mut w, 4, &mut events);
        assert!(agent.is_aborted());
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], LiveEvent::BehaviourAborted { tick: 3, .. }));
        assert_eq!(w.agent(0).unwrap().steps, 2);
        assert_eq!(w.agent(0).unwrap().position, Vec2::ZERO);
    }

    #[test]
    fn test_finish_runs_once() {
        let finishes = Rc::new(Cell::new(0));
        let mut agent = Agent::new(
            0,
            Box::new(Scripted {
                ticks: 0,
                fail_at: 0,
                finishes: finishes.clone(),
            }),
        );
        agent.finish();
        agent.finish();
        assert_eq!(finishes.get(), 1);
        assert!(agent.is_finished());
    }
}
