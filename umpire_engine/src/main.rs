/// Third Umpire: Replay Harness
///
/// Loads a JSON command journal, replays it through the engine twice,
/// compares hashes, and prints the result with both scorecards.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use umpire_engine::engine::ScoringEngine;
use umpire_engine::events::CommandEnvelope;
use umpire_engine::hashing::canonical_hash;
use umpire_engine::scorecard::{
    batting_card, bowling_card, current_run_rate, fall_of_wickets, innings_summary, match_totals,
    partnership, recent_balls, required_run_rate, runs_needed, yet_to_bat,
};
use umpire_engine::domain::MatchState;

#[derive(Parser, Debug)]
#[command(name = "umpire-replay", about = "Replay a scoring journal and verify determinism")]
struct Cli {
    /// JSON array of command envelopes.
    journal: PathBuf,
    /// Fail unless the final state hashes to this value.
    #[arg(long)]
    expected_hash: Option<String>,
    /// Skip the scorecards and print only the hash and result.
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let data = fs::read_to_string(&cli.journal)
        .with_context(|| format!("reading {}", cli.journal.display()))?;
    let envelopes: Vec<CommandEnvelope> =
        serde_json::from_str(&data).context("parsing command journal")?;
    info!(commands = envelopes.len(), "journal loaded");

    // Run 1
    let mut engine = ScoringEngine::new();
    let state = engine.replay(&envelopes).context("replay failed")?.clone();
    let h1 = canonical_hash(&state)?;

    // Run 2 (determinism check)
    let mut engine2 = ScoringEngine::new();
    let h2 = canonical_hash(engine2.replay(&envelopes).context("second replay failed")?)?;

    if h1 != h2 {
        bail!("determinism failure: run1={} run2={}", h1, h2);
    }
    println!("hash:   {}", h1);
    println!("score:  {}", state.score);
    println!("result: {}", state.match_result().unwrap_or("in progress"));

    if !cli.quiet {
        for innings in 1..=state.innings {
            print_innings(&state, innings);
        }
        print_live(&state);
    }

    if let Some(expected) = cli.expected_hash {
        if expected != h1 {
            bail!("hash mismatch: got {} expected {}", h1, expected);
        }
        println!("[OK] hash matches");
    }
    Ok(())
}

fn print_innings(state: &MatchState, innings: u8) {
    let Some(summary) = innings_summary(state, innings) else {
        return;
    };
    println!("\n=== Innings {}: {} {} (extras {}) ===", innings, summary.team, summary.score, summary.extras);

    for row in batting_card(state, innings) {
        println!(
            "  {:<20} {:<28} {:>3} ({:>3}) 4s:{} 6s:{} SR {}",
            row.name, row.status, row.runs, row.balls, row.fours, row.sixes, row.strike_rate
        );
    }

    let fow: Vec<String> = fall_of_wickets(state, innings)
        .iter()
        .map(|f| format!("{}-{} ({}, {} ov)", f.wicket_number, f.runs, f.batter, f.overs))
        .collect();
    if !fow.is_empty() {
        println!("  FoW: {}", fow.join(", "));
    }

    for row in bowling_card(state, innings) {
        println!(
            "  {:<20} {:>4}-{}-{:>3}-{} econ {} dots {}",
            row.name, row.overs, row.maidens, row.runs, row.wickets, row.economy, row.dot_balls
        );
    }
}

fn print_live(state: &MatchState) {
    let totals = match_totals(state);
    println!(
        "\nmatch:  {} runs, {} wkts, {} fours, {} sixes, {} dots, {} extras",
        totals.runs, totals.wickets, totals.fours, totals.sixes, totals.dot_balls, totals.extras
    );
    if state.is_terminal() {
        return;
    }

    let stand = partnership(state);
    println!(
        "live:   partnership {} ({}), CRR {}, last: {}",
        stand.runs,
        stand.balls,
        current_run_rate(state),
        recent_balls(state, 6).join(" ")
    );
    if let (Some(needed), Some(rate)) = (runs_needed(state), required_run_rate(state)) {
        println!("chase:  need {} off {} balls, RRR {}", needed, state.balls_remaining(), rate);
    }
    let waiting = yet_to_bat(state);
    if !waiting.is_empty() {
        println!("to bat: {}", waiting.join(", "));
    }
}
