use umpire_engine::domain::{Phase, TeamSide};
use umpire_engine::engine::ScoringEngine;
use umpire_engine::events::{Command, CommandEnvelope};
use umpire_engine::hashing::{canonical_hash, canonical_serialize};
use umpire_engine::reversal::rebuild;

fn load_fixture() -> Vec<CommandEnvelope> {
    let data = include_str!("fixtures/short_match.json");
    serde_json::from_str(data).expect("fixture parses")
}

#[test]
fn fixture_replays_to_a_chase_win() {
    let envelopes = load_fixture();
    let mut engine = ScoringEngine::new();
    let state = engine.replay(&envelopes).expect("replay").clone();

    assert_eq!(state.phase, Phase::MatchEnded);
    assert_eq!(state.first_innings.map(|s| (s.runs, s.wickets, s.balls)), Some((13, 1, 6)));
    assert_eq!(state.target, Some(14));
    assert_eq!(state.score.runs, 14);
    assert_eq!(state.score.balls, 2);
    assert_eq!(state.result.as_ref().and_then(|r| r.winner), Some(TeamSide::B));
    assert_eq!(
        state.match_result(),
        Some("Valley XI won by 3 wickets with 4 balls remaining.")
    );

    // The undone two and the undo itself leave the effective journal.
    assert_eq!(engine.last_sequence(), 17);
    assert_eq!(engine.journal().len(), 15);
    assert!(!engine.journal().iter().any(|c| matches!(c, Command::Undo)));
}

#[test]
fn two_replays_hash_identically() {
    let envelopes = load_fixture();
    let mut first = ScoringEngine::new();
    let mut second = ScoringEngine::new();
    let h1 = canonical_hash(first.replay(&envelopes).expect("replay")).expect("hash");
    let h2 = canonical_hash(second.replay(&envelopes).expect("replay")).expect("hash");
    assert_eq!(h1, h2);
    assert_eq!(h1.len(), 64);
}

#[test]
fn effective_journal_rebuilds_the_same_state() {
    let envelopes = load_fixture();
    let mut engine = ScoringEngine::new();
    let live = engine.replay(&envelopes).expect("replay").clone();
    let rebuilt = rebuild(engine.journal()).expect("rebuild");
    assert_eq!(rebuilt, live);
    assert_eq!(
        canonical_serialize(&rebuilt).expect("serialize"),
        canonical_serialize(&live).expect("serialize")
    );
}

#[test]
fn truncated_fixture_stops_at_the_innings_break() {
    let envelopes = load_fixture();
    let mut engine = ScoringEngine::new();
    let state = engine.replay(&envelopes[..12]).expect("replay");
    assert_eq!(state.phase, Phase::InningsBreak);
    assert_eq!(state.score.runs, 13);
    assert!(state.result.is_none());
}
