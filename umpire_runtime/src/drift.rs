//! Drift detection: determinism verification and state comparison.
//!
//! All numeric values are integers. No float arithmetic anywhere.

use std::collections::BTreeSet;

use thiserror::Error;

use umpire_engine::domain::{MatchState, Phase};
use umpire_engine::events::CommandEnvelope;

use crate::replay::{self, ReplayError};

#[derive(Debug, Error)]
pub enum DriftError {
    #[error("determinism failure: run 1 {first}, run 2 {second}")]
    Nondeterministic { first: String, second: String },
    #[error(transparent)]
    Replay(#[from] ReplayError),
}

/// Replay the same envelopes twice and require identical hashes.
/// Returns the agreed hash.
pub fn verify_determinism(envelopes: &[CommandEnvelope]) -> Result<String, DriftError> {
    let first = replay::rebuild_hash(envelopes)?;
    let second = replay::rebuild_hash(envelopes)?;
    if first != second {
        return Err(DriftError::Nondeterministic { first, second });
    }
    Ok(first)
}

/// Structured comparison of two snapshots of the same match, typically a
/// spectator's last-seen state and the scorer's current one.
pub fn compare_states(a: &MatchState, b: &MatchState) -> DriftReport {
    let shared = a
        .ball_history
        .iter()
        .zip(&b.ball_history)
        .take_while(|(x, y)| x == y)
        .count();

    let dismissed = |s: &MatchState| -> BTreeSet<String> {
        s.team_a
            .players
            .iter()
            .chain(&s.team_b.players)
            .filter(|p| p.is_out())
            .map(|p| p.name.clone())
            .collect()
    };
    let out_a = dismissed(a);
    let out_b = dismissed(b);

    DriftReport {
        same_innings: a.innings == b.innings,
        phase_a: a.phase,
        phase_b: b.phase,
        runs_delta: b.score.runs as i64 - a.score.runs as i64,
        wickets_delta: b.score.wickets as i64 - a.score.wickets as i64,
        balls_delta: b.score.balls as i64 - a.score.balls as i64,
        shared_deliveries: shared,
        new_deliveries: b.ball_history[shared..].iter().map(|e| e.label()).collect(),
        retracted_deliveries: a.ball_history[shared..].iter().map(|e| e.label()).collect(),
        newly_dismissed: out_b.difference(&out_a).cloned().collect(),
        reinstated: out_a.difference(&out_b).cloned().collect(),
        bowler_changed: a.bowler != b.bowler,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftReport {
    pub same_innings: bool,
    pub phase_a: Phase,
    pub phase_b: Phase,
    pub runs_delta: i64,
    pub wickets_delta: i64,
    pub balls_delta: i64,
    /// Length of the common ball-history prefix.
    pub shared_deliveries: usize,
    /// Labels of deliveries only `b` has.
    pub new_deliveries: Vec<String>,
    /// Labels of deliveries only `a` has (undone since).
    pub retracted_deliveries: Vec<String>,
    pub newly_dismissed: Vec<String>,
    pub reinstated: Vec<String>,
    pub bowler_changed: bool,
}

impl DriftReport {
    pub fn is_identical(&self) -> bool {
        self.same_innings
            && self.phase_a == self.phase_b
            && self.runs_delta == 0
            && self.wickets_delta == 0
            && self.balls_delta == 0
            && self.new_deliveries.is_empty()
            && self.retracted_deliveries.is_empty()
            && !self.bowler_changed
    }
}
