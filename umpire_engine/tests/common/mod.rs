#![allow(dead_code)]

use umpire_engine::domain::{
    MatchConfig, MatchRules, MatchState, PlayerEntry, TeamSheet, TeamSide, TossDecision,
    TossResult, View,
};
use umpire_engine::eligibility::{eligible_batsmen, eligible_bowlers};
use umpire_engine::engine::ScoringEngine;
use umpire_engine::events::{Command, ExtraKind, WicketKind};

/// Players are `<prefix>1..<prefix>n`; 1 captains, n keeps wicket.
pub fn sheet(team: &str, prefix: &str, size: usize) -> TeamSheet {
    TeamSheet {
        name: team.to_string(),
        players: (1..=size)
            .map(|i| PlayerEntry {
                name: format!("{}{}", prefix, i),
                captain: i == 1,
                wicket_keeper: i == size,
            })
            .collect(),
    }
}

pub fn config(size: usize, overs: u32) -> MatchConfig {
    MatchConfig {
        team_a: sheet("Royals", "R", size),
        team_b: sheet("Kings", "K", size),
        total_overs: overs,
        team_size: size,
        rules: MatchRules::default(),
    }
}

/// Royals bat first.
pub fn start(size: usize, overs: u32) -> Command {
    Command::StartMatch {
        config: config(size, overs),
        toss: TossResult { winner: TeamSide::A, decision: TossDecision::Bat },
    }
}

pub fn openers(striker: &str, non_striker: &str, bowler: &str) -> Command {
    Command::SelectOpeningPlayers {
        striker: striker.into(),
        non_striker: non_striker.into(),
        bowler: bowler.into(),
    }
}

/// Started match with R1/R2 facing K1.
pub fn scoring_engine(size: usize, overs: u32) -> ScoringEngine {
    let mut engine = ScoringEngine::new();
    engine.apply(start(size, overs)).expect("start");
    engine.apply(openers("R1", "R2", "K1")).expect("openers");
    engine
}

pub fn apply(engine: &mut ScoringEngine, command: Command) -> MatchState {
    let name = command.name();
    match engine.apply(command) {
        Ok((state, _)) => state.clone(),
        Err(e) => panic!("{} rejected: {}", name, e),
    }
}

pub fn current(engine: &ScoringEngine) -> MatchState {
    engine.state().expect("match started").clone()
}

pub fn runs(n: u32) -> Command {
    Command::AddRuns { runs: n }
}

pub fn bowled() -> Command {
    Command::AddWicket {
        kind: WicketKind::Bowled,
        fielder: None,
        runs: 0,
        out_batsman: None,
        no_ball: false,
    }
}

pub fn extra(kind: ExtraKind, total_runs: u32, runs_off_bat: Option<u32>) -> Command {
    Command::AddExtra { kind, total_runs, runs_off_bat }
}

/// Answer whatever selection the engine is waiting for with the first
/// eligible choice. Returns false once the match is over.
pub fn auto_select(engine: &mut ScoringEngine) -> bool {
    let state = current(engine);
    let command = match state.view {
        View::Scoring => return true,
        View::MatchEnd => return false,
        View::InningsBreak => Command::StartSecondInnings,
        View::OpeningSelection => {
            let batsmen = eligible_batsmen(&state);
            Command::SelectOpeningPlayers {
                striker: batsmen[0].clone(),
                non_striker: batsmen[1].clone(),
                bowler: eligible_bowlers(&state)[0].clone(),
            }
        }
        View::NewBatsmanSelection => Command::SelectNewBatsman {
            player: eligible_batsmen(&state)[0].clone(),
        },
        View::NewBowlerSelection => Command::SelectNewBowler {
            player: eligible_bowlers(&state)[0].clone(),
        },
    };
    apply(engine, command);
    auto_select(engine)
}

/// Bowl each delivery, making any pending selection before it.
/// Whatever the last delivery asks for is left unanswered.
pub fn drive(engine: &mut ScoringEngine, deliveries: &[Command]) {
    for d in deliveries {
        if !auto_select(engine) {
            return;
        }
        apply(engine, d.clone());
    }
}

/// A delivery description that resolves names against the live state.
#[derive(Debug, Clone, Copy)]
pub enum Ball {
    Runs(u32),
    Bowled,
    Caught,
    Stumped,
    RunOutNonStriker(u32),
    NoBallRunOut(u32),
    Wide(u32),
    NoBall(u32, Option<u32>),
    Bye(u32),
    LegBye(u32),
}

pub const BALLS: [Ball; 18] = [
    Ball::Runs(0),
    Ball::Runs(1),
    Ball::Runs(2),
    Ball::Runs(3),
    Ball::Runs(4),
    Ball::Runs(6),
    Ball::Bowled,
    Ball::Caught,
    Ball::Stumped,
    Ball::RunOutNonStriker(1),
    Ball::NoBallRunOut(0),
    Ball::Wide(1),
    Ball::Wide(5),
    Ball::NoBall(1, None),
    Ball::NoBall(5, Some(4)),
    Ball::NoBall(2, Some(1)),
    Ball::Bye(2),
    Ball::LegBye(1),
];

impl Ball {
    pub fn to_command(self, state: &MatchState) -> Command {
        let fielder = state.bowling_team().players[0].name.clone();
        let wicket = |kind, fielder: Option<String>, runs, out_batsman: Option<String>, no_ball| {
            Command::AddWicket { kind, fielder, runs, out_batsman, no_ball }
        };
        match self {
            Ball::Runs(n) => runs(n),
            Ball::Bowled => bowled(),
            Ball::Caught => wicket(WicketKind::Caught, Some(fielder), 0, None, false),
            Ball::Stumped => wicket(WicketKind::Stumped, None, 0, None, false),
            Ball::RunOutNonStriker(r) => wicket(
                WicketKind::RunOut,
                Some(fielder),
                r,
                state.non_striker().map(str::to_string),
                false,
            ),
            Ball::NoBallRunOut(r) => wicket(WicketKind::RunOut, Some(fielder), r, None, true),
            Ball::Wide(t) => extra(ExtraKind::Wide, t, None),
            Ball::NoBall(t, off) => extra(ExtraKind::NoBall, t, off),
            Ball::Bye(t) => extra(ExtraKind::Bye, t, None),
            Ball::LegBye(t) => extra(ExtraKind::LegBye, t, None),
        }
    }
}
