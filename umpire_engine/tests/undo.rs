mod common;

use common::*;
use proptest::prelude::*;
use umpire_engine::domain::{ActiveBatsmen, Phase, View};
use umpire_engine::engine::ScoringEngine;
use umpire_engine::error::ScoringError;
use umpire_engine::events::{Command, ExtraKind};

/// Bowl the picked deliveries, answering selections in between. Deliveries
/// the current state refuses (a bowled on a free hit, say) are skipped.
fn play(picks: &[usize]) -> ScoringEngine {
    let mut engine = scoring_engine(6, 3);
    for &i in picks {
        if !auto_select(&mut engine) {
            break;
        }
        let command = BALLS[i].to_command(&current(&engine));
        let _ = engine.apply(command);
    }
    engine
}

proptest! {
    #[test]
    fn undo_restores_the_prior_state_exactly(
        picks in prop::collection::vec(0..BALLS.len(), 0..60),
        next in 0..BALLS.len(),
    ) {
        let mut engine = play(&picks);
        auto_select(&mut engine);
        let before = current(&engine);
        prop_assume!(before.view == View::Scoring);

        let command = BALLS[next].to_command(&before);
        if engine.apply(command).is_ok() {
            let (after_undo, _) = engine.undo().expect("undo after a delivery");
            prop_assert_eq!(after_undo, &before);
        }
    }

    #[test]
    fn balls_count_legal_deliveries_only(
        picks in prop::collection::vec(0..BALLS.len(), 0..80),
    ) {
        let engine = play(&picks);
        let s = current(&engine);
        let legal = s.innings_events().filter(|e| e.is_legal()).count() as u32;
        prop_assert_eq!(s.score.balls, legal);
        prop_assert!(s.score.balls <= s.config.balls_per_innings());

        let batted: u32 = s.batting_team().players.iter().map(|p| p.batting.runs).sum();
        let extras: u32 = s.innings_events().map(|e| e.extras()).sum();
        prop_assert_eq!(batted + extras, s.score.runs);
    }

    #[test]
    fn repeated_undo_walks_back_to_the_openers(
        picks in prop::collection::vec(0..BALLS.len(), 1..30),
    ) {
        let mut engine = play(&picks);
        loop {
            match engine.undo() {
                Ok(_) => continue,
                Err(ScoringError::NoOp(_)) => break,
                Err(e) => return Err(TestCaseError::fail(format!("undo failed: {}", e))),
            }
        }
        let s = current(&engine);
        prop_assert!(s.ball_history.is_empty());
        prop_assert_eq!(s.innings, 1);
        prop_assert_eq!(s.score.runs, 0);
    }
}

#[test]
fn undo_on_empty_history_is_noop() {
    let mut engine = scoring_engine(11, 2);
    let before = current(&engine);
    assert!(matches!(engine.undo(), Err(ScoringError::NoOp(_))));
    assert_eq!(current(&engine), before);

    let mut fresh = ScoringEngine::new();
    assert!(matches!(fresh.undo(), Err(ScoringError::NoOp(_))));
}

#[test]
fn undo_reverses_a_wicket_and_the_following_selection() {
    let mut engine = scoring_engine(11, 2);
    apply(&mut engine, runs(2));
    let before = current(&engine);
    apply(&mut engine, bowled());
    apply(&mut engine, Command::SelectNewBatsman { player: "R3".into() });

    let (s, outcome) = engine.undo().expect("undo");
    assert_eq!(s, &before);
    assert_eq!(outcome.view, View::Scoring);
    assert_eq!(
        s.crease,
        ActiveBatsmen::Pair { striker: "R1".into(), non_striker: "R2".into() }
    );
    assert!(!s.team_a.player("R3").expect("R3").has_batted);
    assert!(!s.team_a.player("R1").expect("R1").is_out());
}

#[test]
fn undo_restores_the_bowler_after_an_over() {
    let mut engine = scoring_engine(11, 2);
    drive(&mut engine, &[runs(0), runs(0), runs(0), runs(0), runs(0)]);
    let before = current(&engine);
    apply(&mut engine, runs(0));
    let s = apply(&mut engine, Command::SelectNewBowler { player: "K2".into() });
    assert_eq!(s.bowler.as_deref(), Some("K2"));

    let (s, _) = engine.undo().expect("undo");
    assert_eq!(s, &before);
    assert_eq!(s.bowler.as_deref(), Some("K1"));
    assert!(s.bowler_overs.is_empty());
    assert_eq!(s.team_b.player("K1").expect("K1").bowling.maidens, 0);
}

#[test]
fn undo_reopens_a_finished_match() {
    let mut engine = scoring_engine(4, 1);
    drive(&mut engine, &[runs(1), runs(0), runs(0), runs(0), runs(0), runs(0)]);
    drive(&mut engine, &[extra(ExtraKind::NoBall, 1, None), runs(1)]);
    let s = current(&engine);
    assert_eq!(s.phase, Phase::MatchEnded);

    let (s, outcome) = engine.undo().expect("undo");
    assert_eq!(s.phase, Phase::SecondInnings);
    assert!(s.result.is_none());
    assert!(s.is_free_hit);
    assert_eq!(s.score.runs, 1);
    assert_eq!(outcome.view, View::Scoring);
}

#[test]
fn undo_in_fresh_second_innings_returns_to_first() {
    let mut engine = scoring_engine(4, 1);
    drive(&mut engine, &[runs(0), runs(0), runs(0), runs(0), runs(0), runs(4)]);
    apply(&mut engine, Command::StartSecondInnings);
    apply(&mut engine, openers("K1", "K2", "R1"));

    let (s, _) = engine.undo().expect("undo");
    assert_eq!(s.innings, 1);
    assert_eq!(s.phase, Phase::FirstInnings);
    assert_eq!(s.score.balls, 5);
    assert_eq!(s.target, None);
    assert_eq!(engine.journal().len(), 7);
}
