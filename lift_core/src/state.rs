//! Logger state persistence with file locking.
//!
//! The draft and rest timer survive restarts by being written to a JSON file
//! after every change and read back on start. Read-modify-write cycles from
//! separate processes are serialized through a `.lock` file beside the state.

use crate::logger::WorkoutLogger;
use crate::{Error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

impl WorkoutLogger {
    /// Load logger state, falling back to a fresh workout when the file is
    /// missing or unreadable
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No state file found, starting a new workout");
            return Ok(Self::default());
        }

        let parsed = read_shared(path)
            .and_then(|contents| Ok(serde_json::from_str::<Self>(&contents)?));
        match parsed {
            Ok(state) => {
                tracing::debug!("Loaded logger state from {:?}", path);
                Ok(state)
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable state file {:?}: {}", path, e);
                Ok(Self::default())
            }
        }
    }

    /// Replace the state file with this state via a synced temp file and rename
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = state_dir(path)?;
        std::fs::create_dir_all(parent)?;

        let mut temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;
        temp.write_all(serde_json::to_string(self)?.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved logger state to {:?}", path);
        Ok(())
    }

    /// Load state, modify it, and save it back while holding the state lock
    ///
    /// Nothing is written when `f` fails.
    pub fn update<F, T>(path: &Path, f: F) -> Result<(Self, T)>
    where
        F: FnOnce(&mut WorkoutLogger) -> Result<T>,
    {
        std::fs::create_dir_all(state_dir(path)?)?;
        let guard = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(lock_path(path))?;
        guard.lock_exclusive()?;

        let mut state = Self::load(path)?;
        let out = f(&mut state)?;
        state.save(path)?;

        guard.unlock()?;
        Ok((state, out))
    }
}

fn state_dir(path: &Path) -> Result<&Path> {
    path.parent()
        .ok_or_else(|| Error::State(format!("state path {:?} has no parent", path)))
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

fn read_shared(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    file.lock_shared()?;
    let mut contents = String::new();
    let read = file.read_to_string(&mut contents);
    file.unlock()?;
    read?;
    Ok(contents)
}
