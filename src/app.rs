//! Headless run driver: ticks a [`Simulation`] to completion while streaming
//! its events to disk, then writes the summary, archive and checkpoints.

use anyhow::{Context, Result};
use chrono::Utc;
use mimetic_core::config::AppConfig;
use mimetic_core::metrics::{ABORTED_BEHAVIOURS, CONTROLLER_SWITCHES, GENERATIONS};
use mimetic_core::simulation::Simulation;
use mimetic_data::{BehaviourKind, LiveEvent, SimulationStats};
use mimetic_io::{save_checkpoints, write_json_file, HistoryLogger, RunArchive};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;

/// Tick limit when neither the command line nor the config sets one.
pub const DEFAULT_MAX_TICKS: u64 = 10_000;

pub const SUMMARY_FILE: &str = "summary.json";
pub const ARCHIVE_FILE: &str = "run.json.gz";

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub max_ticks: Option<u64>,
    /// Where `live.jsonl`, the summary and the archive go. Nothing is
    /// written when unset.
    pub log_dir: Option<PathBuf>,
    pub checkpoint_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub fingerprint: String,
    pub seed: u64,
    pub behaviour: BehaviourKind,
    pub landscape: String,
    pub ticks: u64,
    pub halted: bool,
    pub stats: SimulationStats,
    pub controller_switches: u64,
    pub generations: u64,
    pub aborted_behaviours: u64,
    pub elapsed_ms: u64,
    pub archive_hash: Option<String>,
    pub checkpoints_written: usize,
}

pub struct App {
    sim: Simulation,
    history: HistoryLogger,
    options: RunOptions,
    events: Vec<LiveEvent>,
}

impl App {
    pub fn new(config: AppConfig, options: RunOptions) -> Result<Self> {
        let history = match &options.log_dir {
            Some(dir) => HistoryLogger::new_at(dir)
                .with_context(|| format!("opening history in {}", dir.display()))?,
            None => HistoryLogger::new_dummy(),
        };
        let sim = Simulation::new(config)?;
        Ok(Self {
            sim,
            history,
            options,
            events: Vec::new(),
        })
    }

    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    fn max_ticks(&self) -> u64 {
        self.options
            .max_ticks
            .or(self.sim.config().world.max_ticks)
            .unwrap_or(DEFAULT_MAX_TICKS)
    }

    /// Runs until the stopping condition fires or the tick limit is reached.
    pub fn run(&mut self) -> Result<RunSummary> {
        let start = Instant::now();
        let limit = self.max_ticks();
        let mut ticks = 0;
        while ticks < limit {
            let halted = self.sim.tick();
            ticks += 1;
            let events = self.sim.drain_events();
            self.history.log_events(&events)?;
            self.events.extend(events);
            if halted {
                break;
            }
        }

        let checkpoints_written = match &self.options.checkpoint_dir {
            Some(dir) => save_checkpoints(dir, &self.sim.checkpoints())
                .with_context(|| format!("writing checkpoints to {}", dir.display()))?
                .len(),
            None => 0,
        };

        let metrics = self.sim.metrics();
        let mut summary = RunSummary {
            fingerprint: self.sim.config().fingerprint(),
            seed: self.sim.seed(),
            behaviour: self.sim.config().behaviour,
            landscape: self.sim.world().landscape().name().to_string(),
            ticks,
            halted: self.sim.is_halted(),
            stats: self.sim.stats(),
            controller_switches: metrics.counter(CONTROLLER_SWITCHES),
            generations: metrics.counter(GENERATIONS),
            aborted_behaviours: metrics.counter(ABORTED_BEHAVIOURS),
            elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            archive_hash: None,
            checkpoints_written,
        };

        if let Some(dir) = &self.options.log_dir {
            let archive = RunArchive {
                fingerprint: summary.fingerprint.clone(),
                seed: summary.seed,
                behaviour: summary.behaviour,
                created_at: Utc::now(),
                final_stats: summary.stats.clone(),
                events: self.events.clone(),
            };
            summary.archive_hash = Some(archive.save(dir.join(ARCHIVE_FILE))?);
            write_json_file(&summary, dir.join(SUMMARY_FILE))?;
        }

        self.sim.finish();
        tracing::info!(
            ticks = summary.ticks,
            halted = summary.halted,
            best_fitness = summary.stats.global_best_fitness,
            "Run complete"
        );
        Ok(summary)
    }
}

impl RunSummary {
    /// Human-readable lines for the terminal.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!(
            "Behaviour:            {}\n\
             Landscape:            {}\n\
             Seed:                 {}\n\
             Config fingerprint:   {}\n\
             Ticks:                {}{}\n\
             Global best fitness:  {:.6} at ({:.4}, {:.4})\n\
             Mean fitness:         {:.6}\n\
             Successful agents:    {}/{}\n\
             Controller switches:  {}\n\
             Generations evolved:  {}\n\
             Aborted behaviours:   {}\n\
             Elapsed:              {} ms\n",
            self.behaviour,
            self.landscape,
            self.seed,
            &self.fingerprint[..self.fingerprint.len().min(16)],
            self.ticks,
            if self.halted { " (halted)" } else { "" },
            self.stats.global_best_fitness,
            self.stats.global_best_x,
            self.stats.global_best_y,
            self.stats.mean_fitness,
            self.stats.successes,
            self.stats.agents,
            self.controller_switches,
            self.generations,
            self.aborted_behaviours,
            self.elapsed_ms,
        );
        if let Some(hash) = &self.archive_hash {
            out.push_str(&format!("Archive SHA-256:      {hash}\n"));
        }
        if self.checkpoints_written > 0 {
            out.push_str(&format!("Checkpoints written:  {}\n", self.checkpoints_written));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(kind: BehaviourKind) -> AppConfig {
        let mut config = AppConfig::default();
        config.behaviour = kind;
        config.world.num_agents = 4;
        config.world.neighbourhood_size = 2;
        config.world.seed = Some(3);
        config.logging.snapshot_interval = 5;
        config
    }

    #[test]
    fn test_run_respects_tick_limit() {
        let options = RunOptions {
            max_ticks: Some(12),
            ..RunOptions::default()
        };
        let mut app = App::new(small_config(BehaviourKind::Competition), options).unwrap();
        let summary = app.run().unwrap();
        assert!(summary.ticks <= 12);
        assert_eq!(summary.stats.agents, 4);
        assert_eq!(summary.archive_hash, None);
        assert!(app.simulation().is_finished());
    }

    #[test]
    fn test_run_writes_history_and_archive() {
        let dir = std::env::temp_dir().join(format!("mimetic_app_{}", std::process::id()));
        let options = RunOptions {
            max_ticks: Some(20),
            log_dir: Some(dir.clone()),
            checkpoint_dir: Some(dir.join("checkpoints")),
        };
        let mut app = App::new(small_config(BehaviourKind::SocialFitness), options).unwrap();
        let summary = app.run().unwrap();

        let hash = summary.archive_hash.clone().unwrap();
        let archive = RunArchive::load_verified(dir.join(ARCHIVE_FILE), &hash).unwrap();
        assert_eq!(archive.seed, 3);
        assert_eq!(summary.checkpoints_written, 4);

        let restored: RunSummary = mimetic_io::read_json_file(dir.join(SUMMARY_FILE)).unwrap();
        assert_eq!(restored.ticks, summary.ticks);
        assert!(summary.render().contains("social_fitness"));
        let _ = std::fs::remove_dir_all(dir);
    }
}
