//! Match sessions: one scorer, one command log, persist-after-apply.
//!
//! Each match gets its own directory keyed by match code:
//!   <data_dir>/<CODE>/commands.log
//!   <data_dir>/<CODE>/snapshots/
//!
//! Submit order:
//!   1. engine.apply_envelope()  : rejection leaves everything untouched
//!   2. command_log.append()     : only if step 1 succeeded; undone in memory if it fails
//!   3. snapshot if interval reached (failure is a warning)
//!   4. every sink, with retries (failure is a warning)

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, info, warn};

use umpire_engine::domain::{MatchState, TransitionOutcome};
use umpire_engine::engine::ScoringEngine;
use umpire_engine::error::ScoringError;
use umpire_engine::events::{Command, CommandEnvelope};

use crate::command_log::CommandLog;
use crate::config::RuntimeConfig;
use crate::match_code::MatchCode;
use crate::persist::{deliver, FileMirror, SnapshotSink, SyncStatus};
use crate::proto_bridge::{kernel_to_proto, proto_to_kernel, BridgeError};
use crate::replay::{self, ReplayError};
use crate::snapshot::{self, Snapshot};
use crate::snapshot_codec::{state_hash, SnapshotError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Rejected(#[from] ScoringError),
    #[error("command log: {0}")]
    Log(#[from] io::Error),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error(transparent)]
    Replay(#[from] ReplayError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("snapshot at {snapshot} is ahead of the log ending at {log}")]
    SnapshotAhead { snapshot: u64, log: u64 },
    #[error("session lock poisoned")]
    Poisoned,
}

impl SessionError {
    /// The kernel refused the command; nothing was logged.
    pub fn is_rejection(&self) -> bool {
        matches!(self, SessionError::Rejected(_))
    }
}

/// What one accepted command produced.
#[derive(Debug, Clone)]
pub struct Submission {
    pub sequence: u64,
    pub outcome: TransitionOutcome,
    pub state: MatchState,
    /// One entry per sink, in registration order.
    pub sync: Vec<SyncStatus>,
}

/// A single match with its own command log and state.
pub struct MatchSession {
    code: MatchCode,
    dir: PathBuf,
    engine: ScoringEngine,
    log: CommandLog,
    snapshot_interval: u64,
    persist_retries: u32,
    sinks: Vec<Arc<dyn SnapshotSink>>,
}

impl MatchSession {
    /// Open the session for `code`, recovering from its log if one exists.
    ///
    /// Recovery prefers the latest snapshot plus the log tail; a snapshot
    /// that fails verification falls back to a full replay.
    pub fn open(config: &RuntimeConfig, code: MatchCode) -> Result<Self, SessionError> {
        let dir = config.data_dir.join(code.as_str());
        let log = CommandLog::open(&dir.join("commands.log"))?;
        let envelopes = load_envelopes(&log)?;
        let engine = recover(&dir.join("snapshots"), &envelopes)?;

        let mut sinks: Vec<Arc<dyn SnapshotSink>> = Vec::new();
        if let Some(mirror) = &config.mirror_dir {
            sinks.push(Arc::new(FileMirror::new(mirror)));
        }

        info!(code = %code, recovered = envelopes.len(), "match session opened");
        Ok(Self {
            code,
            dir,
            engine,
            log,
            snapshot_interval: config.snapshot_interval,
            persist_retries: config.persist_retries,
            sinks,
        })
    }

    /// Open a session under a freshly generated code.
    pub fn create(config: &RuntimeConfig) -> Result<Self, SessionError> {
        Self::open(config, MatchCode::generate())
    }

    pub fn add_sink(&mut self, sink: Arc<dyn SnapshotSink>) {
        self.sinks.push(sink);
    }

    /// Apply one command, log it, then snapshot and persist.
    pub fn submit(&mut self, command: Command) -> Result<Submission, SessionError> {
        let envelope = CommandEnvelope::new(self.engine.last_sequence() + 1, command);
        let committed = self.engine.clone();
        let (state, outcome) = self.engine.apply_envelope(&envelope)?;
        let state = state.clone();

        // The log is the source of truth; an unlogged command must not stay applied.
        if let Err(e) = self.log.append(&kernel_to_proto(&envelope)) {
            self.engine = committed;
            return Err(e.into());
        }

        if self.snapshot_interval > 0 && envelope.sequence % self.snapshot_interval == 0 {
            if let Err(e) = snapshot::save_snapshot(
                &self.snapshots_dir(),
                envelope.sequence,
                &state,
                self.engine.journal(),
            ) {
                warn!(code = %self.code, sequence = envelope.sequence, error = %e, "snapshot failed");
            }
        }

        let key = self.code.storage_key();
        let sync = self
            .sinks
            .iter()
            .map(|sink| deliver(sink.as_ref(), &key, &state, self.persist_retries))
            .collect();

        debug!(code = %self.code, sequence = envelope.sequence, command = %outcome.command, "submitted");
        Ok(Submission {
            sequence: envelope.sequence,
            outcome,
            state,
            sync,
        })
    }

    pub fn undo(&mut self) -> Result<Submission, SessionError> {
        self.submit(Command::Undo)
    }

    /// Rebuild from the full command log, ignoring snapshots.
    pub fn replay_full(&mut self) -> Result<(MatchState, String), SessionError> {
        let envelopes = load_envelopes(&self.log)?;
        let (engine, state, hash) = replay::rebuild_engine(&envelopes)?;
        self.engine = engine;
        Ok((state, hash))
    }

    pub fn state(&self) -> Option<&MatchState> {
        self.engine.state()
    }

    pub fn current_hash(&self) -> Result<Option<String>, SessionError> {
        match self.engine.state() {
            Some(state) => Ok(Some(state_hash(state)?)),
            None => Ok(None),
        }
    }

    pub fn current_sequence(&self) -> u64 {
        self.engine.last_sequence()
    }

    pub fn code(&self) -> &MatchCode {
        &self.code
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn snapshots_dir(&self) -> PathBuf {
        self.dir.join("snapshots")
    }
}

fn load_envelopes(log: &CommandLog) -> Result<Vec<CommandEnvelope>, SessionError> {
    log.load_all()?
        .iter()
        .map(|frame| proto_to_kernel(frame).map_err(SessionError::from))
        .collect()
}

fn recover(snapshots: &Path, envelopes: &[CommandEnvelope]) -> Result<ScoringEngine, SessionError> {
    if envelopes.is_empty() {
        return Ok(ScoringEngine::new());
    }

    match snapshot::load_latest_snapshot(snapshots) {
        Ok(Some(snap)) => match resume_from(&snap, envelopes) {
            Ok(engine) => return Ok(engine),
            Err(e) => {
                warn!(sequence = snap.sequence, error = %e, "snapshot unusable, replaying full log");
            }
        },
        Ok(None) => {}
        Err(e) => warn!(error = %e, "snapshot unreadable, replaying full log"),
    }

    let (engine, _, _) = replay::rebuild_engine(envelopes)?;
    Ok(engine)
}

fn resume_from(snap: &Snapshot, envelopes: &[CommandEnvelope]) -> Result<ScoringEngine, SessionError> {
    snapshot::verify_snapshot(snap)?;
    let last = envelopes.last().map(|e| e.sequence).unwrap_or(0);
    if snap.sequence > last {
        return Err(SessionError::SnapshotAhead { snapshot: snap.sequence, log: last });
    }

    let mut engine = ScoringEngine::resume(snap.journal.clone(), snap.sequence)?;
    let resumed = engine.state().map(state_hash).transpose()?;
    if resumed.as_deref() != Some(snap.hash.as_str()) {
        return Err(SnapshotError::HashMismatch {
            recorded: snap.hash.clone(),
            computed: resumed.unwrap_or_default(),
        }
        .into());
    }

    for envelope in envelopes.iter().filter(|e| e.sequence > snap.sequence) {
        engine.apply_envelope(envelope)?;
    }
    debug!(from = snap.sequence, to = engine.last_sequence(), "resumed from snapshot");
    Ok(engine)
}

/// Thread-safe session handle. Commands for one match are serialized.
pub struct SharedSession {
    inner: Mutex<MatchSession>,
}

impl SharedSession {
    pub fn new(session: MatchSession) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    pub fn submit(&self, command: Command) -> Result<Submission, SessionError> {
        let mut session = self.inner.lock().map_err(|_| SessionError::Poisoned)?;
        session.submit(command)
    }

    pub fn state(&self) -> Result<Option<MatchState>, SessionError> {
        let session = self.inner.lock().map_err(|_| SessionError::Poisoned)?;
        Ok(session.state().cloned())
    }

    pub fn current_hash(&self) -> Result<Option<String>, SessionError> {
        let session = self.inner.lock().map_err(|_| SessionError::Poisoned)?;
        session.current_hash()
    }

    pub fn current_sequence(&self) -> Result<u64, SessionError> {
        let session = self.inner.lock().map_err(|_| SessionError::Poisoned)?;
        Ok(session.current_sequence())
    }
}
