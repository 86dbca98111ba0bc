//! Session-backed memory store.
//!
//! Keeps the current session's memories in memory and writes them to a single
//! JSON file per session on [`MemoryStore::save_session`].
//!
//! # File layout
//!
//! ```text
//! <data_dir>/sessions/<session_id>.json
//! ```
//!
//! Writes go to a temporary sibling first and are then renamed into place, so
//! a crash mid-write never leaves a truncated session file behind.

use super::{MemoryStore, Statistics};
use crate::config::BridgeConfig;
use crate::models::{Memory, MemoryId, MemoryMetadata, SalienceLevel};
use crate::{Error, Result, current_timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Reverse;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Version written into every session file.
const SESSION_FORMAT_VERSION: u32 = 1;

/// Maximum session file size read back on startup (64MB).
const MAX_SESSION_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// On-disk session format.
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    session_id: String,
    saved_at: DateTime<Utc>,
    memories: Vec<Memory>,
}

/// In-process memory store for one session.
#[derive(Debug)]
pub struct SessionStore {
    session_id: String,
    session_file: PathBuf,
    min_salience: SalienceLevel,
    memories: Vec<Memory>,
    /// Set when an unreadable session file could not be moved aside.
    overwrite_blocked: bool,
}

impl SessionStore {
    /// Opens the session `session_id` under `data_dir`.
    ///
    /// A missing session file starts an empty session. An unreadable or
    /// corrupt file is renamed to `<id>.json.corrupt-<unix ts>` and the
    /// session starts empty. If it cannot be renamed, saving is refused so
    /// the old file is never overwritten.
    #[must_use]
    pub fn open(session_id: &str, data_dir: impl AsRef<Path>) -> Self {
        let session_file = session_file_path(data_dir.as_ref(), session_id);
        let mut overwrite_blocked = false;
        let memories = match load_session_file(&session_file) {
            Ok(Some(memories)) => {
                tracing::info!(
                    session_id,
                    path = %session_file.display(),
                    count = memories.len(),
                    "Loaded session"
                );
                memories
            },
            Ok(None) => {
                tracing::debug!(session_id, "No saved session, starting empty");
                Vec::new()
            },
            Err(e) => {
                tracing::warn!(
                    session_id,
                    path = %session_file.display(),
                    error = %e,
                    "Failed to load session, starting empty"
                );
                match set_aside(&session_file) {
                    Ok(moved_to) => tracing::warn!(
                        session_id,
                        moved_to = %moved_to.display(),
                        "Moved unreadable session file aside"
                    ),
                    Err(e) => {
                        tracing::error!(
                            session_id,
                            error = %e,
                            "Cannot move unreadable session file aside, saving disabled"
                        );
                        overwrite_blocked = true;
                    },
                }
                Vec::new()
            },
        };

        Self {
            session_id: session_id.to_string(),
            session_file,
            min_salience: SalienceLevel::Noise,
            memories,
            overwrite_blocked,
        }
    }

    /// Opens the session described by `config`.
    #[must_use]
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::open(&config.session_id, &config.data_dir)
            .with_min_salience(config.recall.min_salience)
    }

    /// Sets the lowest salience returned by recall.
    #[must_use]
    pub const fn with_min_salience(mut self, min_salience: SalienceLevel) -> Self {
        self.min_salience = min_salience;
        self
    }

    /// Returns the session identifier.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Returns the path the session is saved to.
    #[must_use]
    pub fn session_file(&self) -> &Path {
        &self.session_file
    }

    /// Returns the number of memories in the session.
    #[must_use]
    pub fn len(&self) -> usize {
        self.memories.len()
    }

    /// Returns true if the session holds no memories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.memories.is_empty()
    }

    fn recent(&self, top_k: usize) -> Vec<Memory> {
        let mut ranked: Vec<(usize, &Memory)> = self
            .memories
            .iter()
            .enumerate()
            .filter(|(_, m)| m.salience >= self.min_salience)
            .collect();
        ranked.sort_by_key(|(index, m)| Reverse((m.created_at, *index)));
        ranked.into_iter().take(top_k).map(|(_, m)| m.clone()).collect()
    }

    fn matching(&self, terms: &[String], top_k: usize) -> Vec<Memory> {
        let mut ranked: Vec<(usize, usize, &Memory)> = self
            .memories
            .iter()
            .enumerate()
            .filter(|(_, m)| m.salience >= self.min_salience)
            .filter_map(|(index, m)| {
                let haystack = searchable_text(m);
                let score = terms.iter().filter(|t| haystack.contains(t.as_str())).count();
                (score > 0).then_some((score, index, m))
            })
            .collect();
        ranked.sort_by_key(|(score, index, m)| Reverse((*score, m.salience, m.created_at, *index)));
        ranked
            .into_iter()
            .take(top_k)
            .map(|(_, _, m)| m.clone())
            .collect()
    }
}

impl MemoryStore for SessionStore {
    fn remember(
        &mut self,
        content: &str,
        metadata: MemoryMetadata,
        salience: SalienceLevel,
    ) -> Result<MemoryId> {
        let id = MemoryId::new(uuid::Uuid::now_v7().to_string());
        self.memories.push(Memory {
            id: id.clone(),
            gist: None,
            verbatim: content.to_string(),
            salience,
            created_at: current_timestamp(),
            metadata,
        });
        tracing::debug!(memory_id = %id, %salience, "Remembered");
        Ok(id)
    }

    fn recall(&self, query: &str, top_k: usize) -> Result<Vec<Memory>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if terms.is_empty() {
            return Ok(self.recent(top_k));
        }
        Ok(self.matching(&terms, top_k))
    }

    fn statistics(&self) -> Result<Statistics> {
        let mut by_salience = serde_json::Map::new();
        for level in SalienceLevel::all() {
            let count = self.memories.iter().filter(|m| m.salience == *level).count();
            by_salience.insert(level.as_str().to_string(), Value::from(count));
        }

        let mut stats = Statistics::new();
        stats.insert("session_id".to_string(), Value::from(self.session_id.clone()));
        stats.insert("total_memories".to_string(), Value::from(self.memories.len()));
        stats.insert(
            "session_file".to_string(),
            Value::from(self.session_file.display().to_string()),
        );
        stats.insert("by_salience".to_string(), Value::Object(by_salience));
        Ok(stats)
    }

    fn save_session(&mut self) -> Result<()> {
        if self.overwrite_blocked {
            return Err(Error::Persistence(format!(
                "refusing to overwrite unreadable session file {}",
                self.session_file.display()
            )));
        }
        let file = SessionFile {
            version: SESSION_FORMAT_VERSION,
            session_id: self.session_id.clone(),
            saved_at: Utc::now(),
            memories: self.memories.clone(),
        };
        write_session_file(&self.session_file, &file)?;
        tracing::info!(
            session_id = %self.session_id,
            path = %self.session_file.display(),
            count = self.memories.len(),
            "Saved session"
        );
        Ok(())
    }
}

/// Lowercased text a recall query is matched against.
fn searchable_text(memory: &Memory) -> String {
    let mut text = memory.verbatim.to_lowercase();
    text.push('\n');
    text.push_str(&memory.metadata.source().to_lowercase());
    if let MemoryMetadata::Diagnostic { severity, .. } = &memory.metadata {
        text.push('\n');
        text.push_str(&severity.to_lowercase());
    }
    text
}

/// Returns `<data_dir>/sessions/<session_id>.json`.
///
/// Characters other than alphanumerics, `-` and `_` are replaced so the
/// session id can never escape the sessions directory.
fn session_file_path(data_dir: &Path, session_id: &str) -> PathBuf {
    let safe: String = session_id
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let safe = if safe.is_empty() { "default".to_string() } else { safe };
    data_dir.join("sessions").join(format!("{safe}.json"))
}

fn load_session_file(path: &Path) -> Result<Option<Vec<Memory>>> {
    if !path.exists() {
        return Ok(None);
    }

    let metadata = fs::metadata(path).map_err(|e| Error::Persistence(e.to_string()))?;
    if metadata.len() > MAX_SESSION_FILE_SIZE {
        return Err(Error::Persistence(format!(
            "session file exceeds maximum size of {MAX_SESSION_FILE_SIZE} bytes: {}",
            path.display()
        )));
    }

    let json = fs::read_to_string(path).map_err(|e| Error::Persistence(e.to_string()))?;
    let file: SessionFile =
        serde_json::from_str(&json).map_err(|e| Error::Persistence(e.to_string()))?;
    Ok(Some(file.memories))
}

/// Renames an unreadable session file to `<name>.corrupt-<unix ts>` and
/// returns the new path.
fn set_aside(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .map_or_else(|| "session".into(), |n| n.to_string_lossy().into_owned());
    let stamp = current_timestamp();

    let mut target = path.with_file_name(format!("{name}.corrupt-{stamp}"));
    let mut attempt = 1;
    while target.exists() {
        target = path.with_file_name(format!("{name}.corrupt-{stamp}-{attempt}"));
        attempt += 1;
    }

    fs::rename(path, &target).map_err(|e| {
        Error::Persistence(format!(
            "cannot move {} to {}: {e}",
            path.display(),
            target.display()
        ))
    })?;
    Ok(target)
}

fn write_session_file(path: &Path, file: &SessionFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            Error::Persistence(format!("cannot create {}: {e}", parent.display()))
        })?;
    }

    let json = serde_json::to_string_pretty(file).map_err(|e| Error::Persistence(e.to_string()))?;

    let tmp_path = path.with_extension("json.tmp");
    File::create(&tmp_path)
        .and_then(|mut tmp| {
            tmp.write_all(json.as_bytes())?;
            tmp.sync_all()
        })
        .map_err(|e| Error::Persistence(format!("cannot write {}: {e}", tmp_path.display())))?;
    fs::rename(&tmp_path, path)
        .map_err(|e| Error::Persistence(format!("cannot replace {}: {e}", path.display())))?;
    Ok(())
}
