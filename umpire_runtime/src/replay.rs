//! Replay orchestrator: rebuild state from the command log.
//!
//! Delegates all scoring logic to the kernel. No shortcuts, no cached state.

use thiserror::Error;

use umpire_engine::domain::MatchState;
use umpire_engine::engine::ScoringEngine;
use umpire_engine::error::ScoringError;
use umpire_engine::events::CommandEnvelope;
use umpire_engine::hashing::canonical_hash;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("kernel rejected a logged command: {0}")]
    Kernel(#[from] ScoringError),
    #[error("hashing failed: {0}")]
    Hash(#[from] serde_json::Error),
}

/// Rebuild the match from a sequence of envelopes.
///
/// 1. Create a fresh engine
/// 2. Pass each envelope to the kernel in order
/// 3. Return (engine, final_state, canonical_hash)
///
/// The engine is returned so a session can continue from it with the
/// effective journal and sequence already in place.
pub fn rebuild_engine(
    envelopes: &[CommandEnvelope],
) -> Result<(ScoringEngine, MatchState, String), ReplayError> {
    let mut engine = ScoringEngine::new();
    let state = engine.replay(envelopes)?.clone();
    let hash = canonical_hash(&state)?;
    Ok((engine, state, hash))
}

/// Rebuild the match and return (final_state, canonical_hash).
pub fn rebuild_state(envelopes: &[CommandEnvelope]) -> Result<(MatchState, String), ReplayError> {
    let (_, state, hash) = rebuild_engine(envelopes)?;
    Ok((state, hash))
}

/// Rebuild the match and return only the canonical hash.
pub fn rebuild_hash(envelopes: &[CommandEnvelope]) -> Result<String, ReplayError> {
    rebuild_state(envelopes).map(|(_, hash)| hash)
}
