//! Offline analysis of a run's `live.jsonl`.

use mimetic_data::{LiveEvent, SimulationStats};
use mimetic_io::HistoryRecord;
use std::collections::BTreeMap;
use std::fmt::Write;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryReport {
    pub events: usize,
    /// Controller switches per agent.
    pub switches: BTreeMap<usize, u64>,
    /// Highest generation reached per population name.
    pub max_generation: BTreeMap<String, u64>,
    /// `(agent, tick, reason)` of every aborted behaviour.
    pub aborts: Vec<(usize, u64, String)>,
    pub halted_at: Option<u64>,
    pub last_snapshot: Option<SimulationStats>,
}

impl HistoryReport {
    #[must_use]
    pub fn from_records(records: &[HistoryRecord]) -> Self {
        let mut report = Self {
            events: records.len(),
            ..Self::default()
        };
        for record in records {
            match &record.event {
                LiveEvent::ControllerSwitched { agent, .. } => {
                    *report.switches.entry(*agent).or_default() += 1;
                }
                LiveEvent::GenerationAdvanced {
                    population,
                    generation,
                    ..
                } => {
                    let best = report.max_generation.entry(population.clone()).or_default();
                    *best = (*best).max(*generation);
                }
                LiveEvent::BehaviourAborted {
                    agent,
                    tick,
                    reason,
                } => report.aborts.push((*agent, *tick, reason.clone())),
                LiveEvent::Snapshot { stats, .. } => report.last_snapshot = Some(stats.clone()),
                LiveEvent::Halted { tick, .. } => report.halted_at = Some(*tick),
            }
        }
        report
    }

    #[must_use]
    pub fn total_switches(&self) -> u64 {
        self.switches.values().sum()
    }

    #[must_use]
    pub fn mean_switches_per_agent(&self) -> f64 {
        if self.switches.is_empty() {
            0.0
        } else {
            self.total_switches() as f64 / self.switches.len() as f64
        }
    }

    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("# Mimetic Run Report\n\n## Summary\n");
        let _ = writeln!(out, "- **Events**: {}", self.events);
        let _ = writeln!(out, "- **Controller switches**: {}", self.total_switches());
        let _ = writeln!(
            out,
            "- **Switches per switching agent**: {:.2}",
            self.mean_switches_per_agent()
        );
        match self.halted_at {
            Some(tick) => {
                let _ = writeln!(out, "- **Halted at tick**: {tick}");
            }
            None => out.push_str("- **Halted**: no\n"),
        }

        if !self.max_generation.is_empty() {
            out.push_str("\n## Generations\n");
            for (population, generation) in &self.max_generation {
                let _ = writeln!(out, "- {population}: {generation}");
            }
        }

        if let Some(stats) = &self.last_snapshot {
            out.push_str("\n## Last Snapshot\n");
            let _ = writeln!(out, "- Tick: {}", stats.tick);
            let _ = writeln!(out, "- Mean fitness: {:.6}", stats.mean_fitness);
            let _ = writeln!(out, "- Global best: {:.6}", stats.global_best_fitness);
            let _ = writeln!(out, "- Successes: {}/{}", stats.successes, stats.agents);
        }

        if !self.aborts.is_empty() {
            let _ = writeln!(out, "\n## Aborted Behaviours ({})", self.aborts.len());
            for (i, (agent, tick, reason)) in self.aborts.iter().enumerate() {
                let _ = writeln!(out, "{}. agent {agent} at tick {tick}: {reason}", i + 1);
            }
        }
        out
    }
}
