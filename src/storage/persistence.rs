use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::ResourceError;
use crate::protocol::Snapshot;

/// Where the storage peer keeps its snapshot between runs.
pub trait SnapshotStore: Send {
    fn load(&self) -> Result<Snapshot, ResourceError>;

    fn save(&mut self, snapshot: &Snapshot) -> Result<(), ResourceError>;
}

/// JSON file on disk. Saves go to a sibling temp file which is then renamed over the target.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Snapshot, ResourceError> {
        if !self.path.exists() {
            return Err(ResourceError::Missing(self.path.clone()));
        }

        let reader = BufReader::new(File::open(&self.path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<(), ResourceError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let temp = self.temp_path();
        {
            let mut writer = BufWriter::new(File::create(&temp)?);
            serde_json::to_writer_pretty(&mut writer, snapshot)?;
            writer.flush()?;
        }
        fs::rename(&temp, &self.path)?;

        tracing::debug!("Snapshot written to {}", self.path.display());
        Ok(())
    }
}

/// In-process store, used by tests and by peers that should not touch the disk.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    snapshot: Option<Snapshot>,
    saves: usize,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            saves: 0,
        }
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Snapshot, ResourceError> {
        self.snapshot
            .clone()
            .ok_or_else(|| ResourceError::Missing(PathBuf::from("<memory>")))
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<(), ResourceError> {
        self.snapshot = Some(snapshot.clone());
        self.saves += 1;
        Ok(())
    }
}
