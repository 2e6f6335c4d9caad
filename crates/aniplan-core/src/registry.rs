//! Flat-file registry of AniList usernames.
//!
//! The whole file is the state: a JSON array of strings, insertion order
//! preserved. Every mutation is load, check, rewrite.
//!
//! `register`/`remove` hold an in-process lock across load, check and save,
//! shared by every clone of a store. There is no file lock: two processes
//! pointed at the same file can still both append the same name.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use crate::{domain::Username, errors::Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterOutcome {
    Added,
    AlreadyRegistered,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotRegistered,
}

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Debug)]
pub struct RegistryStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // The guarded data is `()`, so a poisoned lock carries no broken state.
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Registered usernames, or an empty list when nothing was saved yet.
    pub fn load(&self) -> Result<Vec<Username>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let txt = fs::read_to_string(&self.path)?;
        if txt.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&txt).map_err(|e| Error::InvalidRegistry {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Replace the stored list with `users`.
    ///
    /// Written to a sibling temp file and renamed over the target, so a
    /// failed write never leaves a truncated registry behind.
    pub fn save(&self, users: &[Username]) -> Result<()> {
        let _guard = self.lock();
        self.save_unlocked(users)
    }

    fn save_unlocked(&self, users: &[Username]) -> Result<()> {
        let txt = serde_json::to_string(users)?;
        write_atomic(&self.path, txt.as_bytes())
    }

    pub fn register(&self, username: &Username) -> Result<RegisterOutcome> {
        let _guard = self.lock();
        let mut users = self.load()?;
        if users.contains(username) {
            return Ok(RegisterOutcome::AlreadyRegistered);
        }
        users.push(username.clone());
        self.save_unlocked(&users)?;
        tracing::info!(username = %username, total = users.len(), "registered user");
        Ok(RegisterOutcome::Added)
    }

    pub fn remove(&self, username: &Username) -> Result<RemoveOutcome> {
        let _guard = self.lock();
        let mut users = self.load()?;
        let Some(idx) = users.iter().position(|u| u == username) else {
            return Ok(RemoveOutcome::NotRegistered);
        };
        users.remove(idx);
        self.save_unlocked(&users)?;
        tracing::info!(username = %username, total = users.len(), "removed user");
        Ok(RemoveOutcome::Removed)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("registry");
    let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let tmp = parent.join(format!(
        ".{file_name}.tmp.{}.{seq}",
        std::process::id()
    ));
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
