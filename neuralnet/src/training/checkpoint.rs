use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::debug;
use tempfile::TempDir;

use crate::{Result, arch::Network};

const BEST: &str = "best.net";
const PENDING: &str = "pending.net";

/// Scratch storage for the best snapshot of a single training run.
///
/// The snapshot lives in a fresh temporary directory that is removed, along with everything in
/// it, when this value is dropped.
#[derive(Debug)]
pub struct Checkpoints {
    dir: TempDir,
    best: Option<usize>,
}

impl Checkpoints {
    /// Creates a new empty `Checkpoints` backed by a unique directory under the system's
    /// temporary directory.
    pub fn new() -> Result<Self> {
        Self::build(tempfile::Builder::new().prefix("neuralnet-").tempdir()?)
    }

    /// Creates a new empty `Checkpoints` backed by a unique directory inside `parent`.
    pub fn new_in<P: AsRef<Path>>(parent: P) -> Result<Self> {
        Self::build(
            tempfile::Builder::new()
                .prefix("neuralnet-")
                .tempdir_in(parent)?,
        )
    }

    fn build(dir: TempDir) -> Result<Self> {
        debug!(dir:? = dir.path(); "created checkpoint directory");
        Ok(Self { dir, best: None })
    }

    /// The directory holding the snapshot.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The epoch index of the stored snapshot, if any was saved.
    pub fn best(&self) -> Option<usize> {
        self.best
    }

    /// Replaces the stored snapshot with `net`.
    ///
    /// The new snapshot is fully written before it takes the old one's place, so a failed save
    /// leaves the previous snapshot intact.
    ///
    /// # Arguments
    /// * `index` - The epoch index `net` was snapshotted at.
    /// * `net` - The network to store.
    pub fn save(&mut self, index: usize, net: &Network) -> Result<()> {
        let pending = self.dir.path().join(PENDING);
        net.save(&pending)?;
        fs::rename(&pending, self.best_path())?;

        debug!(index = index; "saved checkpoint");
        self.best = Some(index);
        Ok(())
    }

    /// Replaces `net` with the stored snapshot.
    pub fn restore(&self, net: &mut Network) -> Result<()> {
        *net = Network::load(self.snapshot()?)?;
        Ok(())
    }

    /// Copies the stored snapshot to `destination`, replacing any existing file.
    pub fn persist(&self, destination: &Path) -> Result<()> {
        fs::copy(self.snapshot()?, destination)?;
        Ok(())
    }

    fn best_path(&self) -> PathBuf {
        self.dir.path().join(BEST)
    }

    fn snapshot(&self) -> Result<PathBuf> {
        if self.best.is_none() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no snapshot was saved").into());
        }

        Ok(self.best_path())
    }
}
