use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use super::memory::Snapshot;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to access snapshot file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to (de)serialize snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn read_snapshot<P: AsRef<Path>>(path: P) -> Result<Snapshot, PersistenceError> {
    let file = File::open(path)?;
    let snapshot = serde_json::from_reader(BufReader::new(file))?;
    Ok(snapshot)
}

/// Writes next to the target first and renames, so a crash mid-write never
/// leaves a truncated snapshot behind.
pub fn write_snapshot<P: AsRef<Path>>(path: P, snapshot: &Snapshot) -> Result<(), PersistenceError> {
    let path = path.as_ref();
    let tmp = path.with_extension("tmp");

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, snapshot)?;
    writer.flush()?;
    drop(writer);

    fs::rename(&tmp, path)?;
    Ok(())
}
