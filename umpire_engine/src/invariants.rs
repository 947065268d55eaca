/// Third Umpire: Invariant Checks
///
/// Hard-fail validation of a `MatchState`. Totals are recomputed from the
/// ball history rather than trusted. The first failing check is returned as
/// `ScoringError::Invariant` tagged `[INVARIANT:<name>]`.

use crate::domain::{ActiveBatsmen, MatchState, Phase};
use crate::eligibility::bowler_cap;
use crate::error::ScoringError;
use crate::events::{BallEvent, ExtraKind};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run every check. Returns the first failure.
pub fn validate_invariants(state: &MatchState) -> Result<(), ScoringError> {
    check_score_matches_history(state)?;
    check_ball_limit(state)?;
    check_wicket_limit(state)?;
    check_crease(state)?;
    check_bowler_caps(state)?;
    check_free_hit(state)?;
    check_run_conservation(state)?;
    check_phase_consistency(state)?;
    Ok(())
}

fn violation(tag: &str, msg: String) -> ScoringError {
    ScoringError::Invariant(format!("[INVARIANT:{}] {}", tag, msg))
}

// ---------------------------------------------------------------------------
// Individual checks (private)
// ---------------------------------------------------------------------------

/// Score runs, balls and wickets equal the totals of this innings' events.
fn check_score_matches_history(state: &MatchState) -> Result<(), ScoringError> {
    let (mut runs, mut balls, mut wickets) = (0u32, 0u32, 0u32);
    for event in state.innings_events() {
        runs += event.total_runs();
        balls += u32::from(event.is_legal());
        wickets += u32::from(event.is_wicket());
    }

    let score = state.score;
    if (runs, balls, wickets) != (score.runs, score.balls, score.wickets) {
        return Err(violation(
            "score_matches_history",
            format!(
                "score is {}/{} after {} balls but the history adds up to {}/{} after {}",
                score.runs, score.wickets, score.balls, runs, wickets, balls
            ),
        ));
    }
    Ok(())
}

fn check_ball_limit(state: &MatchState) -> Result<(), ScoringError> {
    let limit = state.config.balls_per_innings();
    if state.score.balls > limit {
        return Err(violation(
            "ball_limit",
            format!("{} legal balls bowled, innings allows {}", state.score.balls, limit),
        ));
    }
    Ok(())
}

fn check_wicket_limit(state: &MatchState) -> Result<(), ScoringError> {
    let limit = state.config.wickets_per_innings();
    if state.score.wickets > limit {
        return Err(violation(
            "wicket_limit",
            format!("{} wickets down, a side of {} has only {}", state.score.wickets, state.config.team_size, limit),
        ));
    }
    Ok(())
}

/// Batters at the crease are distinct, on the batting side, and not out.
fn check_crease(state: &MatchState) -> Result<(), ScoringError> {
    if let ActiveBatsmen::Pair { striker, non_striker } = &state.crease {
        if striker == non_striker {
            return Err(violation(
                "distinct_batters",
                format!("{} is at both ends", striker),
            ));
        }
    }

    let at_crease = [state.crease.striker(), state.crease.non_striker()];
    for name in at_crease.into_iter().flatten() {
        match state.batting_team().player(name) {
            None => {
                return Err(violation(
                    "crease_roster",
                    format!("{} is batting but is not on {}", name, state.batting_team().name),
                ))
            }
            Some(p) if p.is_out() => {
                return Err(violation("crease_roster", format!("{} is at the crease but out", name)))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn check_bowler_caps(state: &MatchState) -> Result<(), ScoringError> {
    let cap = bowler_cap(state);
    for (name, overs) in &state.bowler_overs {
        if *overs > cap {
            return Err(violation(
                "bowler_cap",
                format!("{} has bowled {} overs, the cap is {}", name, overs, cap),
            ));
        }
    }
    Ok(())
}

/// A free hit follows a no-ball. Wides carry it over, legal balls clear it.
fn check_free_hit(state: &MatchState) -> Result<(), ScoringError> {
    let expected = state
        .innings_events()
        .filter(|e| !matches!(e, BallEvent::Extra(x) if x.kind == ExtraKind::Wide))
        .last()
        .is_some_and(BallEvent::is_no_ball);
    if state.is_free_hit != expected {
        return Err(violation(
            "free_hit",
            format!("free hit flag is {} but history implies {}", state.is_free_hit, expected),
        ));
    }
    Ok(())
}

/// Batting-credited runs plus extras equal the team total.
fn check_run_conservation(state: &MatchState) -> Result<(), ScoringError> {
    let batted: u32 = state.batting_team().players.iter().map(|p| p.batting.runs).sum();
    let extras: u32 = state.innings_events().map(BallEvent::extras).sum();
    if batted + extras != state.score.runs {
        return Err(violation(
            "run_conservation",
            format!(
                "batters scored {} and extras are {}, but the total is {}",
                batted, extras, state.score.runs
            ),
        ));
    }
    Ok(())
}

fn check_phase_consistency(state: &MatchState) -> Result<(), ScoringError> {
    let ended = state.phase == Phase::MatchEnded;
    if ended != state.result.is_some() {
        return Err(violation(
            "result_phase",
            format!("phase {:?} with result {:?}", state.phase, state.match_result()),
        ));
    }
    if state.innings == 2 && state.target.is_none() {
        return Err(violation("target_set", "second innings without a target".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MatchConfig, MatchRules, PlayerEntry, TeamSheet, TeamSide, TossDecision, TossResult};
    use crate::events::Command;
    use crate::reversal::rebuild;

    fn scored() -> MatchState {
        let sheet = |name: &str| TeamSheet {
            name: name.to_string(),
            players: (1..=5)
                .map(|i| PlayerEntry {
                    name: format!("{}{}", name, i),
                    captain: i == 1,
                    wicket_keeper: i == 5,
                })
                .collect(),
        };
        let journal = vec![
            Command::StartMatch {
                config: MatchConfig {
                    team_a: sheet("A"),
                    team_b: sheet("B"),
                    total_overs: 4,
                    team_size: 5,
                    rules: MatchRules::default(),
                },
                toss: TossResult { winner: TeamSide::B, decision: TossDecision::Bowl },
            },
            Command::SelectOpeningPlayers { striker: "A1".into(), non_striker: "A2".into(), bowler: "B1".into() },
            Command::AddRuns { runs: 4 },
            Command::AddExtra { kind: ExtraKind::NoBall, total_runs: 3, runs_off_bat: Some(2) },
            Command::AddExtra { kind: ExtraKind::Wide, total_runs: 1, runs_off_bat: None },
        ];
        rebuild(&journal).expect("valid journal")
    }

    #[test]
    fn replayed_state_passes() {
        let s = scored();
        assert!(s.is_free_hit);
        assert_eq!(validate_invariants(&s), Ok(()));
    }

    #[test]
    fn tampered_score_is_caught() {
        let mut s = scored();
        s.score.runs += 1;
        let err = validate_invariants(&s).unwrap_err();
        assert!(err.to_string().contains("[INVARIANT:score_matches_history]"));
    }

    #[test]
    fn tampered_batting_runs_are_caught() {
        let mut s = scored();
        if let Some(p) = s.team_a.player_mut("A1") {
            p.batting.runs += 2;
        }
        let err = validate_invariants(&s).unwrap_err();
        assert!(err.to_string().contains("[INVARIANT:run_conservation]"));
    }

    #[test]
    fn stale_free_hit_is_caught() {
        let mut s = scored();
        s.is_free_hit = false;
        let err = validate_invariants(&s).unwrap_err();
        assert!(err.to_string().contains("[INVARIANT:free_hit]"));
    }
}
