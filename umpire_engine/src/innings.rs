/// Third Umpire: Innings Supervisor
///
/// Runs after every delivery. Decides whether the innings or the match is
/// over, records the target, writes the result, and derives which
/// selection the scorer is asked for next.

use tracing::info;

use crate::domain::{
    ActiveBatsmen, MatchResult, MatchState, PartnershipMark, Phase, ResultKind, Score, View,
};
use crate::eligibility::eligible_batsmen;
use crate::error::ScoringError;

/// What the supervisor concluded after a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InningsChange {
    Continues,
    InningsClosed,
    MatchEnded,
}

/// Evaluate end conditions in order: a successful chase first, then
/// all-out or overs exhausted.
pub fn supervise(state: &mut MatchState) -> InningsChange {
    let change = evaluate(state);
    refresh_view(state);
    change
}

fn evaluate(state: &mut MatchState) -> InningsChange {
    if !state.phase.is_live() {
        return InningsChange::Continues;
    }

    if state.innings == 2 {
        if let Some(target) = state.target {
            if state.score.runs >= target {
                let wickets_in_hand = state.config.wickets_per_innings().saturating_sub(state.score.wickets);
                let balls_remaining = state.balls_remaining();
                let summary = format!(
                    "{} won by {} wickets with {} balls remaining.",
                    state.batting_team().name,
                    wickets_in_hand,
                    balls_remaining
                );
                let result = MatchResult {
                    kind: ResultKind::ChaseWon { wickets_in_hand, balls_remaining },
                    winner: Some(state.batting),
                    summary,
                };
                finish(state, result);
                return InningsChange::MatchEnded;
            }
        }
    }

    if !innings_exhausted(state) {
        return InningsChange::Continues;
    }

    if state.innings == 1 {
        close_first_innings(state);
        return InningsChange::InningsClosed;
    }

    let target = state
        .target
        .or_else(|| state.first_innings.map(|s| s.runs + 1))
        .unwrap_or(1);
    let result = if state.score.runs + 1 == target {
        MatchResult {
            kind: ResultKind::Tied,
            winner: None,
            summary: format!("Match Tied! Scores level at {} each.", target - 1),
        }
    } else {
        let runs_margin = (target - 1).saturating_sub(state.score.runs);
        MatchResult {
            kind: ResultKind::DefenceWon { runs_margin },
            winner: Some(state.bowling),
            summary: format!("{} wins by {} runs!", state.bowling_team().name, runs_margin),
        }
    };
    finish(state, result);
    InningsChange::MatchEnded
}

/// All out, no batter left to walk in, or no legal balls left.
pub fn innings_exhausted(state: &MatchState) -> bool {
    let all_out = state.score.wickets >= state.config.wickets_per_innings();
    let nobody_left = matches!(state.crease, ActiveBatsmen::OneDown { .. })
        && eligible_batsmen(state).is_empty();
    let overs_done = state.score.balls >= state.config.balls_per_innings();
    all_out || nobody_left || overs_done
}

fn close_first_innings(state: &mut MatchState) {
    let score = state.score;
    let target_runs = *state.target.get_or_insert(score.runs + 1);
    state.first_innings = Some(score);
    state.phase = Phase::InningsBreak;
    info!(
        runs = score.runs,
        wickets = score.wickets,
        balls = score.balls,
        target_runs,
        "first innings closed"
    );
}

fn finish(state: &mut MatchState, result: MatchResult) {
    info!(summary = %result.summary, "match ended");
    state.phase = Phase::MatchEnded;
    state.result = Some(result);
}

/// Open the second innings from the innings break.
pub fn start_second_innings(state: &mut MatchState) -> Result<(), ScoringError> {
    if state.phase != Phase::InningsBreak {
        return Err(ScoringError::configuration(format!(
            "second innings can only start from the innings break (phase is {:?})",
            state.phase
        )));
    }

    let first = state.first_innings.unwrap_or(state.score);
    state.target.get_or_insert(first.runs + 1);

    state.batting = state.batting.opponent();
    state.bowling = state.bowling.opponent();
    let batting = state.batting;
    for player in &mut state.team_mut(batting).players {
        player.dismissal = None;
        player.has_batted = false;
    }

    state.innings = 2;
    state.phase = Phase::SecondInnings;
    state.score = Score::default();
    state.crease = ActiveBatsmen::Pending;
    state.bowler = None;
    state.last_over_bowler = None;
    state.bowler_overs.clear();
    state.is_free_hit = false;
    state.partnership_start = PartnershipMark::default();
    refresh_view(state);

    info!(target_runs = ?state.target, batting = %state.batting_team().name, "second innings started");
    Ok(())
}

/// Derive the next prompt. A missing batter is asked for before a missing bowler.
pub fn refresh_view(state: &mut MatchState) {
    state.view = match (state.phase, &state.crease, &state.bowler) {
        (Phase::MatchEnded, _, _) => View::MatchEnd,
        (Phase::InningsBreak, _, _) => View::InningsBreak,
        (_, ActiveBatsmen::Pending, _) => View::OpeningSelection,
        (_, ActiveBatsmen::OneDown { .. }, _) => View::NewBatsmanSelection,
        (_, ActiveBatsmen::Pair { .. }, None) => View::NewBowlerSelection,
        (_, ActiveBatsmen::Pair { .. }, Some(_)) => View::Scoring,
    };
}
