//! Snapshot codec: strict MatchState encoder/decoder.
//!
//! Pure codec layer. No side-effects, no timestamps, no envelope.
//!
//! - `encode_state`:  MatchState → JSON string
//! - `decode_state`:  JSON string → MatchState (strict, no unknown fields)
//! - `restore_state`: decode + invariant validation
//! - `export_state_to_file` / `import_state_from_file`: file I/O
//! - `state_hash`:    the kernel's canonical hash

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use umpire_engine::domain::MatchState;
use umpire_engine::error::ScoringError;
use umpire_engine::hashing::canonical_hash;
use umpire_engine::invariants::validate_invariants;

/// All possible snapshot failures.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("SerializationError: {0}")]
    Serialization(#[source] serde_json::Error),
    /// Malformed JSON, missing fields, or unknown fields.
    #[error("DeserializationError: {0}")]
    Deserialization(#[source] serde_json::Error),
    /// Decoded state breaks a match invariant.
    #[error("InvariantViolation: {0}")]
    Invariant(#[source] ScoringError),
    #[error("HashMismatch: recorded {recorded}, computed {computed}")]
    HashMismatch { recorded: String, computed: String },
    #[error("RulesetMismatch: snapshot uses ruleset {found}, kernel is {expected}")]
    RulesetMismatch { found: u32, expected: u32 },
    #[error("IoError: {0}")]
    Io(#[from] io::Error),
}

/// Encode a MatchState to compact JSON. Field order follows the type
/// definitions, so identical states give identical bytes.
pub fn encode_state(state: &MatchState) -> Result<String, SnapshotError> {
    serde_json::to_string(state).map_err(SnapshotError::Serialization)
}

/// Decode JSON into a MatchState without validating it.
pub fn decode_state(json: &str) -> Result<MatchState, SnapshotError> {
    serde_json::from_str::<MatchState>(json).map_err(SnapshotError::Deserialization)
}

/// Decode and validate invariants immediately.
///
/// This is the entry point for loading state from untrusted sources.
pub fn restore_state(json: &str) -> Result<MatchState, SnapshotError> {
    let state = decode_state(json)?;
    validate_invariants(&state).map_err(SnapshotError::Invariant)?;
    Ok(state)
}

/// Write a MatchState to a file, creating parent directories.
pub fn export_state_to_file(state: &MatchState, path: &Path) -> Result<(), SnapshotError> {
    let json = encode_state(state)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json.as_bytes())?;
    Ok(())
}

/// Read, decode and validate a MatchState file.
pub fn import_state_from_file(path: &Path) -> Result<MatchState, SnapshotError> {
    let content = fs::read_to_string(path)?;
    restore_state(&content)
}

pub fn state_hash(state: &MatchState) -> Result<String, SnapshotError> {
    canonical_hash(state).map_err(SnapshotError::Serialization)
}

#[cfg(test)]
mod tests {
    use super::*;
    use umpire_engine::domain::{
        MatchConfig, MatchRules, PlayerEntry, TeamSheet, TeamSide, TossDecision, TossResult,
    };
    use umpire_engine::engine::ScoringEngine;
    use umpire_engine::events::Command;

    fn sheet(name: &str, prefix: &str) -> TeamSheet {
        TeamSheet {
            name: name.into(),
            players: (1..=5)
                .map(|i| PlayerEntry {
                    name: format!("{}{}", prefix, i),
                    captain: i == 1,
                    wicket_keeper: i == 5,
                })
                .collect(),
        }
    }

    fn sample_state() -> MatchState {
        let mut engine = ScoringEngine::new();
        let commands = [
            Command::StartMatch {
                config: MatchConfig {
                    team_a: sheet("Owls", "O"),
                    team_b: sheet("Hawks", "H"),
                    total_overs: 2,
                    team_size: 5,
                    rules: MatchRules::default(),
                },
                toss: TossResult { winner: TeamSide::A, decision: TossDecision::Bat },
            },
            Command::SelectOpeningPlayers {
                striker: "O1".into(),
                non_striker: "O2".into(),
                bowler: "H1".into(),
            },
            Command::AddRuns { runs: 4 },
            Command::AddRuns { runs: 1 },
        ];
        for command in commands {
            engine.apply(command).expect("apply");
        }
        engine.state().expect("started").clone()
    }

    #[test]
    fn roundtrip_produces_identical_json() {
        let state = sample_state();
        let json1 = encode_state(&state).unwrap();
        let decoded = decode_state(&json1).unwrap();
        assert_eq!(decoded, state);
        assert_eq!(encode_state(&decoded).unwrap(), json1);
    }

    #[test]
    fn tampered_score_returns_invariant_violation() {
        let mut state = sample_state();
        state.score.runs += 1;
        let json = encode_state(&state).unwrap();
        match restore_state(&json) {
            Err(SnapshotError::Invariant(e)) => {
                assert!(e.to_string().contains("score_matches_history"), "got: {}", e);
            }
            other => panic!("expected InvariantViolation, got: {:?}", other),
        }
    }

    #[test]
    fn unknown_field_returns_deserialization_error() {
        let state = sample_state();
        let mut value = serde_json::to_value(&state).unwrap();
        value["umpire_notes"] = serde_json::Value::String("rain delay".into());
        let json = serde_json::to_string(&value).unwrap();
        assert!(matches!(decode_state(&json), Err(SnapshotError::Deserialization(_))));
    }

    #[test]
    fn missing_field_returns_deserialization_error() {
        assert!(matches!(
            decode_state(r#"{"innings":1}"#),
            Err(SnapshotError::Deserialization(_))
        ));
    }

    #[test]
    fn file_roundtrip_matches() {
        let state = sample_state();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        export_state_to_file(&state, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), encode_state(&state).unwrap());
        let imported = import_state_from_file(&path).unwrap();
        assert_eq!(state_hash(&imported).unwrap(), state_hash(&state).unwrap());
    }

    #[test]
    fn corrupted_file_returns_deserialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, b"{ not valid json !!!}").unwrap();
        assert!(matches!(
            import_state_from_file(&path),
            Err(SnapshotError::Deserialization(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            import_state_from_file(&dir.path().join("absent.json")),
            Err(SnapshotError::Io(_))
        ));
    }
}
