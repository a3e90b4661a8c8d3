use crate::error::{IoError, Result};
use mimetic_core::behaviour::NamedCheckpoint;
use mimetic_core::program::GenomeLogic;
use mimetic_data::PopulationCheckpoint;
use rkyv::de::deserializers::SharedDeserializeMap;
use rkyv::ser::serializers::AllocSerializer;
use rkyv::ser::Serializer;
use rkyv::{Archive, Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn save_rkyv<T, P>(data: &T, path: P) -> Result<()>
where
    T: Serialize<AllocSerializer<4096>>,
    T: Archive,
    P: AsRef<Path>,
{
    let mut serializer = AllocSerializer::<4096>::default();
    serializer
        .serialize_value(data)
        .map_err(|e| IoError::checkpoint(format!("serialization failed: {:?}", e)))?;
    let bytes = serializer.into_serializer().into_inner();
    let mut file = File::create(path)?;
    file.write_all(&bytes)?;
    Ok(())
}

pub fn load_rkyv<T, P>(path: P) -> Result<T>
where
    T: Archive,
    T::Archived: Deserialize<T, SharedDeserializeMap>
        + for<'a> rkyv::CheckBytes<rkyv::validation::validators::DefaultValidator<'a>>,
    P: AsRef<Path>,
{
    let bytes = std::fs::read(path)?;
    let archived = rkyv::check_archived_root::<T>(&bytes)
        .map_err(|e| IoError::checkpoint(format!("validation failed: {:?}", e)))?;
    let mut deserializer = SharedDeserializeMap::default();
    archived
        .deserialize(&mut deserializer)
        .map_err(|e| IoError::checkpoint(format!("deserialization failed: {:?}", e)))
}

/// `<dir>/agent_00007_controllers.rkyv`
#[must_use]
pub fn checkpoint_path(dir: &Path, agent: usize, population: &str) -> PathBuf {
    dir.join(format!("agent_{agent:05}_{population}.rkyv"))
}

pub fn save_checkpoint(dir: &Path, agent: usize, named: &NamedCheckpoint) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = checkpoint_path(dir, agent, &named.population);
    save_rkyv(&named.checkpoint, &path)
        .map_err(|e| e.during(format!("saving {}", path.display())))?;
    Ok(path)
}

/// Writes every checkpoint of a run and returns the files written.
pub fn save_checkpoints(dir: &Path, checkpoints: &[(usize, NamedCheckpoint)]) -> Result<Vec<PathBuf>> {
    checkpoints
        .iter()
        .map(|(agent, named)| save_checkpoint(dir, *agent, named))
        .collect()
}

pub fn load_checkpoint(dir: &Path, agent: usize, population: &str) -> Result<PopulationCheckpoint> {
    let path = checkpoint_path(dir, agent, population);
    if !path.exists() {
        return Err(IoError::missing(path));
    }
    let checkpoint: PopulationCheckpoint = load_rkyv(&path)?;
    if checkpoint.genomes.is_empty() {
        return Err(IoError::invalid(format!("{} holds no genomes", path.display())));
    }
    if let Some(index) = checkpoint.genomes.iter().position(|g| !g.is_well_formed()) {
        return Err(IoError::invalid(format!(
            "{}: genome {index} is not feed-forward",
            path.display()
        )));
    }
    Ok(checkpoint)
}
