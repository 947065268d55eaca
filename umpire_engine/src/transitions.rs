/// Third Umpire: Centralized Transition Logic
///
/// ALL state-mutation logic for a single command lives here.
/// Every handler works on a clone; a rejected command returns an error and
/// the caller's state is untouched.

use tracing::debug;

use crate::arithmetic::BALLS_PER_OVER;
use crate::domain::{
    ActiveBatsmen, Dismissal, MatchState, PartnershipMark, Phase, TransitionOutcome,
};
use crate::eligibility::{is_eligible_batsman, is_eligible_bowler};
use crate::error::ScoringError;
use crate::events::{
    BallContext, BallEvent, Command, ExtraEvent, ExtraKind, RunsEvent, WicketEvent, WicketKind,
};
use crate::innings::{refresh_view, start_second_innings, supervise, InningsChange};
use crate::state::create_initial_state;

const SCORING_SHOTS: [u32; 6] = [0, 1, 2, 3, 4, 6];
const MAX_WICKET_RUNS: u32 = 6;
const MAX_WIDE_OR_NO_BALL: u32 = 7;
const MAX_BYES: u32 = 6;

// ---------------------------------------------------------------------------
// Public dispatchers
// ---------------------------------------------------------------------------

/// `StartMatch` is the only command that does not need a prior state.
pub fn start_match(command: &Command) -> Result<(MatchState, TransitionOutcome), ScoringError> {
    match command {
        Command::StartMatch { config, toss } => {
            let state = create_initial_state(config, *toss)?;
            let outcome = TransitionOutcome::new(command.name(), state.view);
            Ok((state, outcome))
        }
        other => Err(ScoringError::configuration(format!(
            "no match in progress; {} needs start_match first",
            other.name()
        ))),
    }
}

/// Apply *command* to *state* and return `(new_state, outcome)`.
/// The original state is never mutated; a deep clone is made first.
pub fn apply_command(
    state: &MatchState,
    command: &Command,
) -> Result<(MatchState, TransitionOutcome), ScoringError> {
    let mut next = state.clone();

    let mut outcome = match command {
        Command::StartMatch { .. } => {
            return Err(ScoringError::configuration("the match has already started"))
        }
        Command::Undo => {
            return Err(ScoringError::configuration(
                "undo is resolved against the command journal, not a single state",
            ))
        }
        Command::SelectOpeningPlayers { striker, non_striker, bowler } => {
            select_opening_players(&mut next, striker, non_striker, bowler)?;
            TransitionOutcome::new(command.name(), next.view)
        }
        Command::SelectNewBatsman { player } => {
            select_new_batsman(&mut next, player)?;
            TransitionOutcome::new(command.name(), next.view)
        }
        Command::SelectNewBowler { player } => {
            select_new_bowler(&mut next, player)?;
            TransitionOutcome::new(command.name(), next.view)
        }
        Command::StartSecondInnings => {
            start_second_innings(&mut next)?;
            TransitionOutcome::new(command.name(), next.view)
        }
        Command::AddRuns { runs } => {
            let context = delivery_context(&next)?;
            let event = build_runs(context, *runs)?;
            record_delivery(&mut next, event)?
        }
        Command::AddWicket { kind, fielder, runs, out_batsman, no_ball } => {
            let context = delivery_context(&next)?;
            let event = build_wicket(
                &next,
                context,
                *kind,
                fielder.as_deref(),
                *runs,
                out_batsman.as_deref(),
                *no_ball,
            )?;
            record_delivery(&mut next, event)?
        }
        Command::AddExtra { kind, total_runs, runs_off_bat } => {
            let context = delivery_context(&next)?;
            let event = build_extra(context, *kind, *total_runs, *runs_off_bat)?;
            record_delivery(&mut next, event)?
        }
    };

    outcome.command = command.name().to_string();
    Ok((next, outcome))
}

// ---------------------------------------------------------------------------
// Preconditions
// ---------------------------------------------------------------------------

fn ensure_live(state: &MatchState) -> Result<(), ScoringError> {
    match state.phase {
        Phase::FirstInnings | Phase::SecondInnings => Ok(()),
        Phase::InningsBreak => Err(ScoringError::configuration("the innings has concluded")),
        Phase::MatchEnded => Err(ScoringError::configuration("the match has concluded")),
    }
}

/// Snapshot of who is involved in the next delivery.
fn delivery_context(state: &MatchState) -> Result<BallContext, ScoringError> {
    ensure_live(state)?;
    match (&state.crease, &state.bowler) {
        (ActiveBatsmen::Pair { striker, non_striker }, Some(bowler)) => Ok(BallContext {
            innings: state.innings,
            batting_team: state.batting,
            striker: striker.clone(),
            non_striker: non_striker.clone(),
            bowler: bowler.clone(),
            over: state.score.balls / BALLS_PER_OVER,
            ball_in_over: state.score.balls_in_current_over() + 1,
        }),
        (ActiveBatsmen::Pair { .. }, None) => {
            Err(ScoringError::configuration("select a bowler before the next delivery"))
        }
        _ => Err(ScoringError::configuration(
            "select the striker and non-striker before the next delivery",
        )),
    }
}

// ---------------------------------------------------------------------------
// Selections
// ---------------------------------------------------------------------------

fn select_opening_players(
    state: &mut MatchState,
    striker: &str,
    non_striker: &str,
    bowler: &str,
) -> Result<(), ScoringError> {
    ensure_live(state)?;
    if state.crease != ActiveBatsmen::Pending {
        return Err(ScoringError::configuration("openers have already been selected"));
    }
    if striker == non_striker {
        return Err(ScoringError::validation(format!(
            "{} cannot open at both ends",
            striker
        )));
    }
    for name in [striker, non_striker] {
        if !is_eligible_batsman(state, name) {
            return Err(ScoringError::validation(format!(
                "{} is not available to bat for {}",
                name,
                state.batting_team().name
            )));
        }
    }
    if !is_eligible_bowler(state, bowler) {
        return Err(ScoringError::validation(format!(
            "{} is not eligible to bowl",
            bowler
        )));
    }

    let batting = state.batting;
    for name in [striker, non_striker] {
        if let Some(p) = state.team_mut(batting).player_mut(name) {
            p.has_batted = true;
        }
    }
    state.crease = ActiveBatsmen::Pair {
        striker: striker.to_string(),
        non_striker: non_striker.to_string(),
    };
    state.bowler = Some(bowler.to_string());
    state.partnership_start = PartnershipMark { runs: state.score.runs, balls: state.score.balls };
    refresh_view(state);
    Ok(())
}

fn select_new_batsman(state: &mut MatchState, player: &str) -> Result<(), ScoringError> {
    ensure_live(state)?;
    if !matches!(state.crease, ActiveBatsmen::OneDown { .. }) {
        return Err(ScoringError::configuration("there is no vacancy at the crease"));
    }
    if !is_eligible_batsman(state, player) {
        return Err(ScoringError::validation(format!(
            "{} is not available to bat for {}",
            player,
            state.batting_team().name
        )));
    }

    let batting = state.batting;
    if let Some(p) = state.team_mut(batting).player_mut(player) {
        p.has_batted = true;
    }
    state.crease.fill(player.to_string());
    refresh_view(state);
    Ok(())
}

fn select_new_bowler(state: &mut MatchState, player: &str) -> Result<(), ScoringError> {
    ensure_live(state)?;
    if state.crease == ActiveBatsmen::Pending {
        return Err(ScoringError::configuration(
            "the opening bowler is chosen with the openers",
        ));
    }
    if let Some(current) = &state.bowler {
        return Err(ScoringError::configuration(format!(
            "{} is still bowling the current over",
            current
        )));
    }
    if !is_eligible_bowler(state, player) {
        return Err(ScoringError::validation(format!(
            "{} is not eligible to bowl the next over",
            player
        )));
    }

    state.bowler = Some(player.to_string());
    refresh_view(state);
    Ok(())
}

// ---------------------------------------------------------------------------
// Delivery validation
// ---------------------------------------------------------------------------

fn build_runs(context: BallContext, runs: u32) -> Result<BallEvent, ScoringError> {
    if !SCORING_SHOTS.contains(&runs) {
        return Err(ScoringError::validation(format!(
            "{} is not a valid run value (expected 0, 1, 2, 3, 4 or 6)",
            runs
        )));
    }
    Ok(BallEvent::Runs(RunsEvent { context, runs }))
}

fn build_wicket(
    state: &MatchState,
    context: BallContext,
    kind: WicketKind,
    fielder: Option<&str>,
    runs: u32,
    out_batsman: Option<&str>,
    no_ball: bool,
) -> Result<BallEvent, ScoringError> {
    if runs > MAX_WICKET_RUNS {
        return Err(ScoringError::validation(format!("{} runs on a wicket ball", runs)));
    }
    if runs > 0 && kind != WicketKind::RunOut {
        return Err(ScoringError::validation(format!(
            "only a run-out can be completed with runs, not {}",
            kind
        )));
    }
    if no_ball && kind != WicketKind::RunOut {
        return Err(ScoringError::validation(format!(
            "a batter cannot be out {} off a no-ball",
            kind
        )));
    }
    if state.is_free_hit && kind != WicketKind::RunOut {
        return Err(ScoringError::validation(format!(
            "a batter cannot be out {} on a free hit",
            kind
        )));
    }

    match fielder {
        None if kind.requires_fielder() => {
            return Err(ScoringError::validation(format!("{} needs a fielder", kind)));
        }
        Some(name) if !state.bowling_team().contains(name) => {
            return Err(ScoringError::validation(format!(
                "{} does not field for {}",
                name,
                state.bowling_team().name
            )));
        }
        _ => {}
    }

    let victim = match out_batsman {
        Some(name) if name != context.striker && name != context.non_striker => {
            return Err(ScoringError::validation(format!("{} is not at the crease", name)));
        }
        Some(name) if kind != WicketKind::RunOut && name != context.striker => {
            return Err(ScoringError::validation(format!(
                "only the striker can be out {}",
                kind
            )));
        }
        Some(name) => name.to_string(),
        None => context.striker.clone(),
    };

    Ok(BallEvent::Wicket(WicketEvent {
        context,
        kind,
        fielder: fielder.map(str::to_string),
        runs,
        out_batsman: victim,
        no_ball,
    }))
}

fn build_extra(
    context: BallContext,
    kind: ExtraKind,
    total_runs: u32,
    runs_off_bat: Option<u32>,
) -> Result<BallEvent, ScoringError> {
    if runs_off_bat.is_some() && kind != ExtraKind::NoBall {
        return Err(ScoringError::validation(format!(
            "runs off the bat only apply to no-balls, not {}",
            kind
        )));
    }

    let max = match kind {
        ExtraKind::Wide | ExtraKind::NoBall => MAX_WIDE_OR_NO_BALL,
        ExtraKind::Bye | ExtraKind::LegBye => MAX_BYES,
    };
    if total_runs == 0 || total_runs > max {
        return Err(ScoringError::validation(format!(
            "{} total must be between 1 and {}, got {}",
            kind, max, total_runs
        )));
    }

    if let Some(off_bat) = runs_off_bat {
        if !SCORING_SHOTS.contains(&off_bat) {
            return Err(ScoringError::validation(format!(
                "{} is not a valid run value off the bat",
                off_bat
            )));
        }
        if off_bat > total_runs - 1 {
            return Err(ScoringError::validation(format!(
                "{} off the bat leaves no room for the no-ball penalty in {}",
                off_bat, total_runs
            )));
        }
    }

    Ok(BallEvent::Extra(ExtraEvent { context, kind, total_runs, runs_off_bat }))
}

// ---------------------------------------------------------------------------
// Delivery effects
// ---------------------------------------------------------------------------

/// Apply one validated delivery: score, batter and bowler figures, dismissal,
/// free hit, strike rotation, over completion, then the innings supervisor.
fn record_delivery(
    state: &mut MatchState,
    event: BallEvent,
) -> Result<TransitionOutcome, ScoringError> {
    let ctx = event.context().clone();
    let legal = event.is_legal();
    let batting = state.batting;
    let bowling = state.bowling;

    state.score.runs += event.total_runs();
    if legal {
        state.score.balls += 1;
    }

    let striker = state
        .team_mut(batting)
        .player_mut(&ctx.striker)
        .ok_or_else(|| missing_player(&ctx.striker))?;
    if event.faced_by_striker() {
        striker.batting.balls_faced += 1;
    }
    striker.batting.runs += event.off_bat();
    match event.boundary() {
        Some(4) => striker.batting.fours += 1,
        Some(6) => striker.batting.sixes += 1,
        _ => {}
    }

    let charged = event.bowler_runs();
    let bowler = state
        .team_mut(bowling)
        .player_mut(&ctx.bowler)
        .ok_or_else(|| missing_player(&ctx.bowler))?;
    bowler.bowling.runs_conceded += charged;
    if legal {
        bowler.bowling.balls_bowled += 1;
        if charged == 0 {
            bowler.bowling.dot_balls += 1;
        }
    }

    let wicket_fell = if let BallEvent::Wicket(w) = &event {
        dismiss(state, &ctx, w)?;
        true
    } else {
        false
    };

    if event.is_no_ball() {
        state.is_free_hit = true;
    } else if legal {
        state.is_free_hit = false;
    }

    let over_completed = legal && state.score.balls % BALLS_PER_OVER == 0;
    if let Some(ran) = event.rotation_runs() {
        // Ends change at the close of an over, which inverts the parity.
        if (ran % 2 == 1) != over_completed {
            state.crease.swap_ends();
        }
    }

    let label = event.label();
    state.ball_history.push(event);

    if over_completed {
        complete_over(state, &ctx)?;
    }

    debug!(
        innings = ctx.innings,
        over = ctx.over,
        ball = ctx.ball_in_over,
        delivery = %label,
        score = %state.score,
        "delivery recorded"
    );

    let change = supervise(state);
    let mut outcome = TransitionOutcome::new("", state.view);
    outcome.delivery = Some(label);
    outcome.over_completed = over_completed;
    outcome.wicket_fell = wicket_fell;
    outcome.innings_closed = change != InningsChange::Continues;
    outcome.match_ended = change == InningsChange::MatchEnded;
    Ok(outcome)
}

fn dismiss(state: &mut MatchState, ctx: &BallContext, w: &WicketEvent) -> Result<(), ScoringError> {
    if !state.crease.remove(&w.out_batsman) {
        return Err(ScoringError::Invariant(format!(
            "{} was dismissed but is not at the crease",
            w.out_batsman
        )));
    }
    state.score.wickets += 1;

    let dismissal = Dismissal {
        kind: w.kind,
        bowler: ctx.bowler.clone(),
        fielder: w.fielder.clone(),
        fow_runs: state.score.runs,
        fow_balls: state.score.balls,
        wicket_number: state.score.wickets,
    };
    let batting = state.batting;
    let victim = state
        .team_mut(batting)
        .player_mut(&w.out_batsman)
        .ok_or_else(|| missing_player(&w.out_batsman))?;
    victim.dismissal = Some(dismissal);

    if w.kind.credits_bowler(&state.config.rules) {
        let bowling = state.bowling;
        if let Some(bowler) = state.team_mut(bowling).player_mut(&ctx.bowler) {
            bowler.bowling.wickets_taken += 1;
        }
    }

    state.partnership_start = PartnershipMark { runs: state.score.runs, balls: state.score.balls };
    Ok(())
}

/// Close the over: ledger, maiden, and free the bowler slot.
fn complete_over(state: &mut MatchState, ctx: &BallContext) -> Result<(), ScoringError> {
    let conceded: u32 = state
        .innings_events()
        .filter(|e| e.context().over == ctx.over && e.context().bowler == ctx.bowler)
        .map(BallEvent::bowler_runs)
        .sum();

    *state.bowler_overs.entry(ctx.bowler.clone()).or_insert(0) += 1;

    let bowling = state.bowling;
    let bowler = state
        .team_mut(bowling)
        .player_mut(&ctx.bowler)
        .ok_or_else(|| missing_player(&ctx.bowler))?;
    bowler.bowling.overs_bowled += 1;
    if conceded == 0 {
        bowler.bowling.maidens += 1;
    }

    state.last_over_bowler = Some(ctx.bowler.clone());
    state.bowler = None;
    debug!(bowler = %ctx.bowler, over = ctx.over + 1, conceded, "over completed");
    Ok(())
}

fn missing_player(name: &str) -> ScoringError {
    ScoringError::Invariant(format!("{} is not on the roster", name))
}
