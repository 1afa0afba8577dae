//! Local session artifact storage.
//!
//! # Responsibilities
//! - Persist the session document between process runs
//! - Provide the scoped cleanup the guard relies on: every artifact whose
//!   filename starts with the token key prefix, plus the whole transient
//!   namespace
//!
//! # Design Decisions
//! - Plain JSON files under one directory; no database
//! - Missing files are benign on every read path
//! - Cleanup never fails the caller; it reports how much it removed

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::StorageConfig;
use crate::provider::Session;

/// Subdirectory for short-lived artifacts wiped on every cleanup.
const TRANSIENT_DIR: &str = "transient";

/// File-backed store for persisted session artifacts.
pub struct SessionStore {
    root: PathBuf,
    token_key_prefix: String,
}

impl SessionStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: PathBuf::from(&config.dir),
            token_key_prefix: config.token_key_prefix.clone(),
        }
    }

    /// Store rooted at an explicit directory. Used by tests and tooling.
    pub fn at_dir(root: &Path, token_key_prefix: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            token_key_prefix: token_key_prefix.to_string(),
        }
    }

    fn session_path(&self) -> PathBuf {
        self.root.join(format!("{}.json", self.token_key_prefix))
    }

    /// Read the persisted session, if any. Corrupt or missing files read as
    /// no session.
    pub fn load_session(&self) -> Option<Session> {
        let content = fs::read_to_string(self.session_path()).ok()?;
        match serde_json::from_str(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(error = %e, "Persisted session is unreadable, treating as absent");
                None
            }
        }
    }

    /// Persist a session document.
    pub fn save_session(&self, session: &Session) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        let json = serde_json::to_string_pretty(session)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(self.session_path(), json)
    }

    /// Write a short-lived artifact into the transient namespace.
    pub fn put_transient(&self, key: &str, value: &str) -> io::Result<()> {
        let dir = self.root.join(TRANSIENT_DIR);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(key), value)
    }

    /// Remove every token artifact and the entire transient namespace.
    ///
    /// Returns the number of entries removed. Individual removal failures
    /// are logged and skipped so the cleanup always runs to completion.
    pub fn clear_all(&self) -> usize {
        let mut removed = 0;

        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            // Nothing persisted yet.
            Err(e) if e.kind() == io::ErrorKind::NotFound => return 0,
            Err(e) => {
                tracing::warn!(dir = %self.root.display(), error = %e, "Cannot scan session store");
                return 0;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };

            if name.starts_with(&self.token_key_prefix) {
                match fs::remove_file(entry.path()) {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        tracing::warn!(file = name, error = %e, "Failed to remove token artifact");
                    }
                }
            }
        }

        let transient = self.root.join(TRANSIENT_DIR);
        match fs::remove_dir_all(&transient) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(error = %e, "Failed to remove transient namespace");
            }
        }

        removed
    }
}
