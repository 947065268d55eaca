//! Snapshot layer: deterministic match snapshots.
//!
//! A snapshot holds the encoded state, its canonical hash and the
//! effective command journal, so a session can resume from it with undo
//! still working. No timestamps in snapshot content.
//!
//! If a snapshot fails verification, fall back to a full replay.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use umpire_engine::domain::MatchState;
use umpire_engine::events::Command;
use umpire_engine::RULESET_VERSION;

use crate::snapshot_codec::{encode_state, restore_state, state_hash, SnapshotError};

/// Snapshot on-disk format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    /// Sequence of the last command folded into this snapshot.
    pub sequence: u64,
    pub ruleset_version: u32,
    /// Canonical hash of `state_json`'s decoded state.
    pub hash: String,
    pub state_json: String,
    pub journal: Vec<Command>,
}

fn snapshot_path(dir: &Path, sequence: u64) -> PathBuf {
    dir.join(format!("snapshot_{:06}.json", sequence))
}

/// Save a snapshot of the current state and journal.
pub fn save_snapshot(
    dir: &Path,
    sequence: u64,
    state: &MatchState,
    journal: &[Command],
) -> Result<PathBuf, SnapshotError> {
    fs::create_dir_all(dir)?;

    let snap = Snapshot {
        sequence,
        ruleset_version: RULESET_VERSION,
        hash: state_hash(state)?,
        state_json: encode_state(state)?,
        journal: journal.to_vec(),
    };
    let content = serde_json::to_string(&snap).map_err(SnapshotError::Serialization)?;

    let path = snapshot_path(dir, sequence);
    let mut file = File::create(&path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    Ok(path)
}

/// Load the snapshot taken at `sequence`, if any.
pub fn load_snapshot(dir: &Path, sequence: u64) -> Result<Option<Snapshot>, SnapshotError> {
    let path = snapshot_path(dir, sequence);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    let snap = serde_json::from_str(&content).map_err(SnapshotError::Deserialization)?;
    Ok(Some(snap))
}

/// Load the snapshot with the highest sequence in a directory.
pub fn load_latest_snapshot(dir: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    match latest_sequence(dir)? {
        Some(seq) => load_snapshot(dir, seq),
        None => Ok(None),
    }
}

fn latest_sequence(dir: &Path) -> Result<Option<u64>, SnapshotError> {
    if !dir.exists() {
        return Ok(None);
    }

    let mut best: Option<u64> = None;
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        let seq = name
            .to_string_lossy()
            .strip_prefix("snapshot_")
            .and_then(|s| s.strip_suffix(".json"))
            .and_then(|s| s.parse::<u64>().ok());
        if let Some(seq) = seq {
            best = best.max(Some(seq));
        }
    }
    Ok(best)
}

/// Check ruleset, invariants and hash. Returns the decoded state.
pub fn verify_snapshot(snap: &Snapshot) -> Result<MatchState, SnapshotError> {
    if snap.ruleset_version != RULESET_VERSION {
        return Err(SnapshotError::RulesetMismatch {
            found: snap.ruleset_version,
            expected: RULESET_VERSION,
        });
    }
    let state = restore_state(&snap.state_json)?;
    let computed = state_hash(&state)?;
    if computed != snap.hash {
        return Err(SnapshotError::HashMismatch {
            recorded: snap.hash.clone(),
            computed,
        });
    }
    Ok(state)
}
