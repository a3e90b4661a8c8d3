use crate::error::{IoError, Result};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use mimetic_data::{BehaviourKind, LiveEvent, SimulationStats};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const LIVE_FILE: &str = "live.jsonl";

/// One line of `live.jsonl`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub timestamp: DateTime<Utc>,
    pub event: LiveEvent,
}

/// Appends run events to `<dir>/live.jsonl`, one JSON object per line.
pub struct HistoryLogger {
    live_file: Option<BufWriter<File>>,
    log_dir: PathBuf,
    written: u64,
}

impl HistoryLogger {
    pub fn new_at<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .map_err(|e| IoError::from(e).during(format!("creating {}", dir.display())))?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(LIVE_FILE))?;
        Ok(Self {
            live_file: Some(BufWriter::new(file)),
            log_dir: dir.to_path_buf(),
            written: 0,
        })
    }

    /// A logger that accepts events and writes nothing.
    #[must_use]
    pub fn new_dummy() -> Self {
        Self {
            live_file: None,
            log_dir: PathBuf::new(),
            written: 0,
        }
    }

    #[must_use]
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Events written since this logger was opened.
    #[must_use]
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn log_event(&mut self, event: &LiveEvent) -> Result<()> {
        if let Some(ref mut file) = self.live_file {
            let record = HistoryRecord {
                timestamp: Utc::now(),
                event: event.clone(),
            };
            let json = serde_json::to_string(&record)?;
            writeln!(file, "{}", json)?;
            file.flush()?;
            self.written += 1;
        }
        Ok(())
    }

    pub fn log_events<'a, I>(&mut self, events: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a LiveEvent>,
    {
        for event in events {
            self.log_event(event)?;
        }
        Ok(())
    }

    /// Every readable record in the live file. Corrupt lines are skipped.
    pub fn read_records(&self) -> Result<Vec<HistoryRecord>> {
        if self.live_file.is_none() {
            return Ok(Vec::new());
        }
        read_history(self.log_dir.join(LIVE_FILE))
    }

    pub fn snapshots(&self) -> Result<Vec<(u64, SimulationStats)>> {
        Ok(self
            .read_records()?
            .into_iter()
            .filter_map(|record| match record.event {
                LiveEvent::Snapshot { tick, stats } => Some((tick, stats)),
                _ => None,
            })
            .collect())
    }
}

/// Reads a `live.jsonl` file. A missing file is an empty history; corrupt
/// lines are skipped.
pub fn read_history<P: AsRef<Path>>(path: P) -> Result<Vec<HistoryRecord>> {
    let file = match File::open(path.as_ref()) {
        Ok(f) => f,
        Err(_) => return Ok(Vec::new()),
    };
    let reader = BufReader::new(file);
    let mut records = Vec::new();
    for line in reader.lines().map_while(std::result::Result::ok) {
        match serde_json::from_str::<HistoryRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!(error = %e, "Skipping unreadable history line"),
        }
    }
    Ok(records)
}

/// Everything needed to inspect a finished run offline.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunArchive {
    pub fingerprint: String,
    pub seed: u64,
    pub behaviour: BehaviourKind,
    pub created_at: DateTime<Utc>,
    pub final_stats: SimulationStats,
    pub events: Vec<LiveEvent>,
}

impl RunArchive {
    /// SHA-256 of the archive's JSON form, hex encoded.
    pub fn compute_hash(&self) -> Result<String> {
        let json = serde_json::to_string(self)?;
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }

    /// Writes the archive as gzip-compressed JSON and returns its hash.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        let json = serde_json::to_string(self)?;
        encoder
            .write_all(json.as_bytes())
            .map_err(|e| IoError::archive(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| IoError::archive(e.to_string()))?;
        self.compute_hash()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(IoError::missing(path));
        }
        let mut decoder = GzDecoder::new(File::open(path)?);
        let mut decoded = Vec::new();
        decoder
            .read_to_end(&mut decoded)
            .map_err(|e| IoError::archive(e.to_string()))?;
        Ok(serde_json::from_slice(&decoded)?)
    }

    /// Loads the archive and checks it against a previously returned hash.
    pub fn load_verified<P: AsRef<Path>>(path: P, expected_hash: &str) -> Result<Self> {
        let archive = Self::load(path)?;
        let actual = archive.compute_hash()?;
        if actual != expected_hash {
            return Err(IoError::HashMismatch {
                expected: expected_hash.to_string(),
                found: actual,
            });
        }
        Ok(archive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mimetic_history_{}_{}", name, std::process::id()))
    }

    fn events() -> Vec<LiveEvent> {
        vec![
            LiveEvent::ControllerSwitched {
                agent: 2,
                tick: 10,
                from: 0,
                to: 1,
                evaluated: 1,
            },
            LiveEvent::Snapshot {
                tick: 50,
                stats: SimulationStats {
                    tick: 50,
                    agents: 4,
                    best_fitness: 998.0,
                    ..SimulationStats::default()
                },
            },
            LiveEvent::Halted {
                tick: 61,
                successes: 4,
            },
        ]
    }

    #[test]
    fn test_logger_appends_records() {
        let dir = scratch("append");
        {
            let mut logger = HistoryLogger::new_at(&dir).unwrap();
            logger.log_events(&events()).unwrap();
            assert_eq!(logger.written(), 3);
        }
        let logger = HistoryLogger::new_at(&dir).unwrap();
        let records = logger.read_records().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].event.tick(), 61);

        let snapshots = logger.snapshots().unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].0, 50);
        assert_eq!(snapshots[0].1.agents, 4);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let dir = scratch("corrupt");
        let mut logger = HistoryLogger::new_at(&dir).unwrap();
        logger.log_event(&events()[0]).unwrap();
        {
            let mut raw = OpenOptions::new()
                .append(true)
                .open(dir.join(LIVE_FILE))
                .unwrap();
            writeln!(raw, "{{not json").unwrap();
        }
        logger.log_event(&events()[2]).unwrap();
        assert_eq!(logger.read_records().unwrap().len(), 2);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_dummy_logger_writes_nothing() {
        let mut logger = HistoryLogger::new_dummy();
        logger.log_events(&events()).unwrap();
        assert_eq!(logger.written(), 0);
        assert!(logger.read_records().unwrap().is_empty());
    }

    #[test]
    fn test_archive_hash_is_verified() {
        let dir = scratch("archive");
        let path = dir.join("run.json.gz");
        let archive = RunArchive {
            fingerprint: "abc123".into(),
            seed: 42,
            behaviour: BehaviourKind::SocialFitness,
            created_at: Utc::now(),
            final_stats: SimulationStats::default(),
            events: events(),
        };
        let hash = archive.save(&path).unwrap();
        assert_eq!(hash.len(), 64);

        let loaded = RunArchive::load_verified(&path, &hash).unwrap();
        assert_eq!(loaded, archive);
        assert!(matches!(
            RunArchive::load_verified(&path, "00"),
            Err(IoError::HashMismatch { .. })
        ));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_missing_archive() {
        assert!(matches!(
            RunArchive::load(scratch("absent").join("run.json.gz")),
            Err(IoError::Missing(_))
        ));
    }
}
