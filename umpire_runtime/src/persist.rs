//! Persistence hook: outbound snapshot sinks.
//!
//! A sink receives every post-transition snapshot under the match's
//! storage key. Sinks run after the kernel has committed the transition;
//! a failing sink is retried, then reported, never rolled back.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use thiserror::Error;
use tracing::{debug, warn};

use umpire_engine::domain::MatchState;

use crate::snapshot_codec::{encode_state, SnapshotError};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("persist io: {0}")]
    Io(#[from] io::Error),
    #[error("persist encode: {0}")]
    Encode(#[from] SnapshotError),
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Where snapshots go after each transition.
///
/// Production: a document-store adapter living outside this crate.
/// Here: `FileMirror` and `SpectatorFeed`.
pub trait SnapshotSink: Send + Sync {
    fn name(&self) -> &str;

    /// Store `state` under `key`, replacing whatever was there.
    fn persist(&self, key: &str, state: &MatchState) -> Result<(), PersistError>;
}

/// Outcome of delivering one snapshot to one sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Synced { attempts: u32 },
    Failed { attempts: u32, last_error: String },
}

impl SyncStatus {
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncStatus::Synced { .. })
    }
}

/// Deliver a snapshot, retrying up to `retries` extra times.
pub fn deliver(sink: &dyn SnapshotSink, key: &str, state: &MatchState, retries: u32) -> SyncStatus {
    let mut attempts = 0;
    loop {
        attempts += 1;
        match sink.persist(key, state) {
            Ok(()) => {
                debug!(sink = sink.name(), key, attempts, "snapshot persisted");
                return SyncStatus::Synced { attempts };
            }
            Err(e) if attempts > retries => {
                warn!(sink = sink.name(), key, attempts, error = %e, "snapshot not persisted");
                return SyncStatus::Failed {
                    attempts,
                    last_error: e.to_string(),
                };
            }
            Err(e) => {
                debug!(sink = sink.name(), key, attempts, error = %e, "persist failed, retrying");
            }
        }
    }
}

// ── File mirror ────────────────────────────────────────────────

/// Mirrors each match to `<root>/<key>.json`, overwritten in place.
#[derive(Debug, Clone)]
pub struct FileMirror {
    root: PathBuf,
}

impl FileMirror {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SnapshotSink for FileMirror {
    fn name(&self) -> &str {
        "file_mirror"
    }

    fn persist(&self, key: &str, state: &MatchState) -> Result<(), PersistError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write-then-rename so readers never see a half-written file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, encode_state(state)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

// ── Spectator feed ─────────────────────────────────────────────

/// One published snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedFrame {
    /// Increases by one per publish, across all keys.
    pub revision: u64,
    pub key: String,
    pub state: MatchState,
}

/// Last-write-wins view for spectators. Only the newest snapshot is kept.
#[derive(Debug, Default)]
pub struct SpectatorFeed {
    latest: RwLock<Option<FeedFrame>>,
}

impl SpectatorFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<FeedFrame> {
        self.latest.read().ok().and_then(|frame| frame.clone())
    }

    pub fn revision(&self) -> u64 {
        self.latest
            .read()
            .ok()
            .and_then(|frame| frame.as_ref().map(|f| f.revision))
            .unwrap_or(0)
    }

    /// True when a newer frame than `seen` exists.
    pub fn has_update_since(&self, seen: u64) -> bool {
        self.revision() > seen
    }
}

impl SnapshotSink for SpectatorFeed {
    fn name(&self) -> &str {
        "spectator_feed"
    }

    fn persist(&self, key: &str, state: &MatchState) -> Result<(), PersistError> {
        let mut slot = self
            .latest
            .write()
            .map_err(|_| PersistError::Unavailable("spectator feed lock poisoned".into()))?;
        let revision = slot.as_ref().map(|f| f.revision).unwrap_or(0) + 1;
        *slot = Some(FeedFrame {
            revision,
            key: key.to_string(),
            state: state.clone(),
        });
        Ok(())
    }
}
