/// Third Umpire: Scorecard Analysis
///
/// Read-only views over a `MatchState` for renderers: batting and bowling
/// cards, fall of wickets, the live partnership and rates, and per-innings
/// summaries rebuilt from the ball history.

use serde::Serialize;

use crate::arithmetic::{runs_per_over, strike_rate, Overs, Rate};
use crate::domain::{Dismissal, MatchState, Score, TeamSide};
use crate::eligibility::eligible_batsmen;
use crate::events::{BallEvent, WicketKind};

/// How many names the summary lists per discipline.
pub const TOP_PERFORMERS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BattingRow {
    pub name: String,
    /// `"not out"` or a dismissal such as `"c Smith b Jones"`.
    pub status: String,
    pub runs: u32,
    pub balls: u32,
    pub fours: u32,
    pub sixes: u32,
    pub strike_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BowlingRow {
    pub name: String,
    pub overs: Overs,
    pub maidens: u32,
    pub runs: u32,
    pub wickets: u32,
    pub dot_balls: u32,
    pub economy: Rate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallOfWicket {
    pub wicket_number: u32,
    pub batter: String,
    pub runs: u32,
    pub overs: Overs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Partnership {
    pub runs: u32,
    pub balls: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Performer {
    pub name: String,
    pub runs: u32,
    pub balls: u32,
    pub wickets: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InningsSummary {
    pub innings: u8,
    pub team: String,
    pub score: Score,
    pub extras: u32,
    pub top_batters: Vec<Performer>,
    pub top_bowlers: Vec<Performer>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchTotals {
    pub runs: u32,
    pub wickets: u32,
    pub fours: u32,
    pub sixes: u32,
    pub dot_balls: u32,
    pub extras: u32,
}

/// Side that batted in the given innings, if it has started.
pub fn batting_side(state: &MatchState, innings: u8) -> Option<TeamSide> {
    let first = state.toss.batting_first();
    match innings {
        1 => Some(first),
        2 if state.innings >= 2 => Some(first.opponent()),
        _ => None,
    }
}

pub fn dismissal_text(d: &Dismissal) -> String {
    match (d.kind, d.fielder.as_deref()) {
        (WicketKind::Caught, Some(f)) if f == d.bowler => format!("c & b {}", d.bowler),
        (WicketKind::Caught, Some(f)) => format!("c {} b {}", f, d.bowler),
        (WicketKind::Caught, None) => format!("c ? b {}", d.bowler),
        (WicketKind::Bowled, _) => format!("b {}", d.bowler),
        (WicketKind::Lbw, _) => format!("lbw b {}", d.bowler),
        (WicketKind::Stumped, Some(f)) => format!("st {} b {}", f, d.bowler),
        (WicketKind::Stumped, None) => format!("st b {}", d.bowler),
        (WicketKind::RunOut, Some(f)) => format!("run out ({})", f),
        (WicketKind::RunOut, None) => "run out".to_string(),
    }
}

/// Everyone who walked out in `innings`, roster order.
pub fn batting_card(state: &MatchState, innings: u8) -> Vec<BattingRow> {
    let Some(side) = batting_side(state, innings) else {
        return Vec::new();
    };
    state
        .team(side)
        .players
        .iter()
        .filter(|p| p.has_batted)
        .map(|p| BattingRow {
            name: p.name.clone(),
            status: p
                .dismissal
                .as_ref()
                .map(dismissal_text)
                .unwrap_or_else(|| "not out".to_string()),
            runs: p.batting.runs,
            balls: p.batting.balls_faced,
            fours: p.batting.fours,
            sixes: p.batting.sixes,
            strike_rate: strike_rate(p.batting.runs, p.batting.balls_faced),
        })
        .collect()
}

/// Everyone who bowled in `innings`, including a bowler whose only
/// deliveries were wides or no-balls.
pub fn bowling_card(state: &MatchState, innings: u8) -> Vec<BowlingRow> {
    let Some(side) = batting_side(state, innings) else {
        return Vec::new();
    };
    state
        .team(side.opponent())
        .players
        .iter()
        .filter(|p| p.bowling.balls_bowled > 0 || p.bowling.runs_conceded > 0)
        .map(|p| BowlingRow {
            name: p.name.clone(),
            overs: Overs::from_balls(p.bowling.balls_bowled),
            maidens: p.bowling.maidens,
            runs: p.bowling.runs_conceded,
            wickets: p.bowling.wickets_taken,
            dot_balls: p.bowling.dot_balls,
            economy: runs_per_over(p.bowling.runs_conceded, p.bowling.balls_bowled),
        })
        .collect()
}

pub fn fall_of_wickets(state: &MatchState, innings: u8) -> Vec<FallOfWicket> {
    let Some(side) = batting_side(state, innings) else {
        return Vec::new();
    };
    let mut fow: Vec<FallOfWicket> = state
        .team(side)
        .players
        .iter()
        .filter_map(|p| {
            p.dismissal.as_ref().map(|d| FallOfWicket {
                wicket_number: d.wicket_number,
                batter: p.name.clone(),
                runs: d.fow_runs,
                overs: Overs::from_balls(d.fow_balls),
            })
        })
        .collect();
    fow.sort_by_key(|f| f.wicket_number);
    fow
}

pub fn yet_to_bat(state: &MatchState) -> Vec<String> {
    eligible_batsmen(state)
}

/// Runs and legal balls since the last wicket (or the start of the innings).
pub fn partnership(state: &MatchState) -> Partnership {
    Partnership {
        runs: state.score.runs.saturating_sub(state.partnership_start.runs),
        balls: state.score.balls.saturating_sub(state.partnership_start.balls),
    }
}

pub fn current_run_rate(state: &MatchState) -> Rate {
    runs_per_over(state.score.runs, state.score.balls)
}

/// Runs still needed in a live chase.
pub fn runs_needed(state: &MatchState) -> Option<u32> {
    if state.innings != 2 || state.is_terminal() {
        return None;
    }
    state.target.map(|t| t.saturating_sub(state.score.runs))
}

pub fn required_run_rate(state: &MatchState) -> Option<Rate> {
    let needed = runs_needed(state)?;
    let balls = state.balls_remaining();
    (balls > 0).then(|| runs_per_over(needed, balls))
}

/// Ticker labels for the last `n` deliveries of the current innings, oldest first.
pub fn recent_balls(state: &MatchState, n: usize) -> Vec<String> {
    let events: Vec<&BallEvent> = state.innings_events().collect();
    let skip = events.len().saturating_sub(n);
    events[skip..].iter().map(|e| e.label()).collect()
}

/// Rebuild an innings from the ball history alone.
pub fn innings_summary(state: &MatchState, innings: u8) -> Option<InningsSummary> {
    let side = batting_side(state, innings)?;
    let events: Vec<&BallEvent> = state
        .ball_history
        .iter()
        .filter(|e| e.context().innings == innings)
        .collect();

    let mut score = Score::default();
    let mut extras = 0;
    let mut batters: Vec<Performer> = Vec::new();
    let mut bowlers: Vec<Performer> = Vec::new();

    for e in &events {
        let ctx = e.context();
        score.runs += e.total_runs();
        score.balls += u32::from(e.is_legal());
        extras += e.extras();

        let batter = performer(&mut batters, &ctx.striker);
        batter.runs += e.off_bat();
        batter.balls += u32::from(e.faced_by_striker());

        let bowler = performer(&mut bowlers, &ctx.bowler);
        bowler.runs += e.bowler_runs();
        bowler.balls += u32::from(e.is_legal());

        if let BallEvent::Wicket(w) = e {
            score.wickets += 1;
            if w.kind.credits_bowler(&state.config.rules) {
                bowler.wickets += 1;
            }
        }
    }

    batters.sort_by(|a, b| b.runs.cmp(&a.runs));
    batters.truncate(TOP_PERFORMERS);
    bowlers.sort_by(|a, b| b.wickets.cmp(&a.wickets).then(a.runs.cmp(&b.runs)));
    bowlers.truncate(TOP_PERFORMERS);

    Some(InningsSummary {
        innings,
        team: state.team(side).name.clone(),
        score,
        extras,
        top_batters: batters,
        top_bowlers: bowlers,
    })
}

fn performer<'a>(list: &'a mut Vec<Performer>, name: &str) -> &'a mut Performer {
    let idx = match list.iter().position(|p| p.name == name) {
        Some(i) => i,
        None => {
            list.push(Performer {
                name: name.to_string(),
                runs: 0,
                balls: 0,
                wickets: 0,
            });
            list.len() - 1
        }
    };
    &mut list[idx]
}

/// Whole-match aggregates over both innings.
pub fn match_totals(state: &MatchState) -> MatchTotals {
    state
        .ball_history
        .iter()
        .fold(MatchTotals::default(), |mut t, e| {
            t.runs += e.total_runs();
            t.wickets += u32::from(e.is_wicket());
            t.extras += e.extras();
            match e.boundary() {
                Some(4) => t.fours += 1,
                Some(6) => t.sixes += 1,
                _ => {}
            }
            if e.is_legal() && e.bowler_runs() == 0 {
                t.dot_balls += 1;
            }
            t
        })
}
