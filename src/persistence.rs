// File: src/persistence.rs
use crate::error::{GuesserError, Result};
use crate::guess_number::ReferenceSample;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Progress of a batch scoring run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Checkpoint {
    pub n_processed: u64,
    pub completed: bool,
}

impl Checkpoint {
    /// Leading records a new run should skip.
    pub fn resume_from(&self) -> u64 {
        if self.completed {
            0
        } else {
            self.n_processed
        }
    }
}

/// Checkpoint file for a named session.
pub fn checkpoint_path(session_name: &str) -> PathBuf {
    PathBuf::from(format!("{}.checkpoint.json", session_name))
}

/// Writes into a temp file beside `path`, then renames it over `path`.
fn write_atomic<F>(path: &Path, context: &str, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&NamedTempFile>) -> Result<()>,
{
    let parent_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir).map_err(|e| GuesserError::io(context, e))?;

    let temp_file = NamedTempFile::new_in(parent_dir).map_err(|e| GuesserError::io(context, e))?;
    {
        let mut writer = BufWriter::new(&temp_file);
        write(&mut writer)?;
        writer.flush().map_err(|e| GuesserError::io(context, e))?;
    }
    temp_file
        .persist(path)
        .map_err(|e| GuesserError::io(context, e.error))?;
    Ok(())
}

pub fn save_checkpoint(checkpoint: &Checkpoint, path: &Path) -> Result<()> {
    let context = format!("saving checkpoint {}", path.display());
    write_atomic(path, &context, |writer| {
        serde_json::to_writer(writer, checkpoint).map_err(|e| GuesserError::json(context.clone(), e))
    })
}

/// A missing or unreadable checkpoint means no progress yet.
pub fn load_checkpoint(path: &Path) -> Checkpoint {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(_) => return Checkpoint::default(),
    };
    match serde_json::from_reader(BufReader::new(file)) {
        Ok(checkpoint) => checkpoint,
        Err(e) => {
            warn!("Ignoring unreadable checkpoint {}: {}", path.display(), e);
            Checkpoint::default()
        }
    }
}

pub fn save_sample(sample: &ReferenceSample, path: &Path) -> Result<()> {
    let context = format!("saving reference sample {}", path.display());
    write_atomic(path, &context, |writer| {
        bincode::serialize_into(writer, sample).map_err(|e| GuesserError::bincode(context.clone(), e))
    })
}

pub fn load_sample(path: &Path) -> Result<ReferenceSample> {
    let file = File::open(path)
        .map_err(|e| GuesserError::io(format!("opening reference sample {}", path.display()), e))?;
    bincode::deserialize_from(BufReader::new(file))
        .map_err(|e| GuesserError::bincode(format!("reading reference sample {}", path.display()), e))
}
