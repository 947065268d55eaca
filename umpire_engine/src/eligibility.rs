/// Third Umpire: Selection Eligibility
///
/// Stateless predicates over the roster and the bowler-over ledger.
/// Output order follows roster order so selection prompts are stable.

use crate::arithmetic::max_overs_per_bowler;
use crate::domain::MatchState;

/// Overs any single bowler may bowl in one innings.
pub fn bowler_cap(state: &MatchState) -> u32 {
    max_overs_per_bowler(state.config.total_overs, state.config.team_size)
}

/// Completed overs the named bowler has in the current innings.
pub fn overs_bowled(state: &MatchState, name: &str) -> u32 {
    state.bowler_overs.get(name).copied().unwrap_or(0)
}

/// Legal choices for the next over.
///
/// The wicket-keeper, anyone at the cap, and the previous over's bowler are
/// excluded. When that leaves nobody, the previous bowler is re-admitted
/// provided they are still under the cap; that is the only route to two
/// consecutive overs.
pub fn eligible_bowlers(state: &MatchState) -> Vec<String> {
    let cap = bowler_cap(state);
    let under_cap: Vec<&str> = state
        .bowling_team()
        .players
        .iter()
        .filter(|p| !p.is_wicket_keeper)
        .filter(|p| overs_bowled(state, &p.name) < cap)
        .map(|p| p.name.as_str())
        .collect();

    let previous = state.last_over_bowler.as_deref();
    let fresh: Vec<String> = under_cap
        .iter()
        .filter(|name| Some(**name) != previous)
        .map(|name| name.to_string())
        .collect();

    if !fresh.is_empty() {
        return fresh;
    }
    match previous {
        Some(prev) if under_cap.contains(&prev) => vec![prev.to_string()],
        _ => Vec::new(),
    }
}

pub fn is_eligible_bowler(state: &MatchState, name: &str) -> bool {
    eligible_bowlers(state).iter().any(|b| b == name)
}

/// Batting-side players who have not yet walked out this innings.
pub fn eligible_batsmen(state: &MatchState) -> Vec<String> {
    state
        .batting_team()
        .players
        .iter()
        .filter(|p| !p.has_batted)
        .map(|p| p.name.clone())
        .collect()
}

pub fn is_eligible_batsman(state: &MatchState, name: &str) -> bool {
    state
        .batting_team()
        .player(name)
        .is_some_and(|p| !p.has_batted)
}
