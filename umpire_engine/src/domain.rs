/// Third Umpire: Core Domain Types
///
/// Pure data. Transition logic lives in `transitions` and `innings`.
/// Players are addressed by `(TeamSide, name)`; names are unique within a team only.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::arithmetic::{Overs, BALLS_PER_OVER};
use crate::error::ScoringError;
use crate::events::{BallEvent, WicketKind};

// ── Sides, toss ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamSide {
    A,
    B,
}

impl TeamSide {
    pub fn opponent(self) -> Self {
        match self {
            TeamSide::A => TeamSide::B,
            TeamSide::B => TeamSide::A,
        }
    }
}

impl fmt::Display for TeamSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamSide::A => f.write_str("a"),
            TeamSide::B => f.write_str("b"),
        }
    }
}

impl FromStr for TeamSide {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a" | "team_a" => Ok(TeamSide::A),
            "b" | "team_b" => Ok(TeamSide::B),
            other => Err(ScoringError::validation(format!("unknown team side {:?}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TossDecision {
    Bat,
    Bowl,
}

impl FromStr for TossDecision {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bat" => Ok(TossDecision::Bat),
            "bowl" => Ok(TossDecision::Bowl),
            other => Err(ScoringError::validation(format!("unknown toss decision {:?}", other))),
        }
    }
}

impl fmt::Display for TossDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TossDecision::Bat => f.write_str("bat"),
            TossDecision::Bowl => f.write_str("bowl"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoinFace {
    Heads,
    Tails,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TossResult {
    pub winner: TeamSide,
    pub decision: TossDecision,
}

impl TossResult {
    /// Resolve a called toss. The caller wins when the coin lands on their call.
    pub fn from_call(
        calling: TeamSide,
        call: CoinFace,
        landed: CoinFace,
        decision: TossDecision,
    ) -> Self {
        let winner = if call == landed { calling } else { calling.opponent() };
        Self { winner, decision }
    }

    /// The side that bats in the first innings.
    pub fn batting_first(&self) -> TeamSide {
        match self.decision {
            TossDecision::Bat => self.winner,
            TossDecision::Bowl => self.winner.opponent(),
        }
    }
}

// ── Configuration ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlayerEntry {
    pub name: String,
    #[serde(default)]
    pub captain: bool,
    #[serde(default)]
    pub wicket_keeper: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TeamSheet {
    pub name: String,
    pub players: Vec<PlayerEntry>,
}

/// Scoring policies that vary between competitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchRules {
    /// Off by default: stumpings count as team dismissals like run-outs.
    #[serde(default)]
    pub credit_stumpings_to_bowler: bool,
}

/// Immutable once the match starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchConfig {
    pub team_a: TeamSheet,
    pub team_b: TeamSheet,
    pub total_overs: u32,
    pub team_size: usize,
    #[serde(default)]
    pub rules: MatchRules,
}

impl MatchConfig {
    pub fn sheet(&self, side: TeamSide) -> &TeamSheet {
        match side {
            TeamSide::A => &self.team_a,
            TeamSide::B => &self.team_b,
        }
    }

    /// Legal deliveries available to each innings. Saturates for configs
    /// decoded without validation.
    pub fn balls_per_innings(&self) -> u32 {
        self.total_overs.saturating_mul(BALLS_PER_OVER)
    }

    /// Wickets that end an innings.
    pub fn wickets_per_innings(&self) -> u32 {
        self.team_size.saturating_sub(1) as u32
    }
}

// ── Players and teams ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BattingStats {
    pub runs: u32,
    pub balls_faced: u32,
    pub fours: u32,
    pub sixes: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BowlingStats {
    /// Legal deliveries, for partial overs and economy.
    pub balls_bowled: u32,
    /// Completed overs.
    pub overs_bowled: u32,
    pub runs_conceded: u32,
    pub wickets_taken: u32,
    pub maidens: u32,
    pub dot_balls: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dismissal {
    pub kind: WicketKind,
    /// Bowler of the delivery, recorded for every kind.
    pub bowler: String,
    pub fielder: Option<String>,
    /// Team runs when the wicket fell.
    pub fow_runs: u32,
    /// Team legal balls when the wicket fell.
    pub fow_balls: u32,
    pub wicket_number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Player {
    pub name: String,
    pub is_captain: bool,
    pub is_wicket_keeper: bool,
    pub batting: BattingStats,
    pub bowling: BowlingStats,
    pub dismissal: Option<Dismissal>,
    pub has_batted: bool,
}

impl Player {
    pub fn from_entry(entry: &PlayerEntry) -> Self {
        Self {
            name: entry.name.trim().to_string(),
            is_captain: entry.captain,
            is_wicket_keeper: entry.wicket_keeper,
            batting: BattingStats::default(),
            bowling: BowlingStats::default(),
            dismissal: None,
            has_batted: false,
        }
    }

    pub fn is_out(&self) -> bool {
        self.dismissal.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Team {
    pub name: String,
    pub players: Vec<Player>,
}

impl Team {
    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn player_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.player(name).is_some()
    }
}

// ── Score and crease ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Score {
    pub runs: u32,
    pub wickets: u32,
    /// Legal deliveries only.
    pub balls: u32,
}

impl Score {
    pub fn overs(&self) -> Overs {
        Overs::from_balls(self.balls)
    }

    pub fn balls_in_current_over(&self) -> u32 {
        self.balls % BALLS_PER_OVER
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({} ov)", self.runs, self.wickets, self.overs())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum End {
    Striker,
    NonStriker,
}

impl End {
    pub fn opposite(self) -> Self {
        match self {
            End::Striker => End::NonStriker,
            End::NonStriker => End::Striker,
        }
    }
}

/// Who is at the crease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ActiveBatsmen {
    /// No openers chosen for this innings yet.
    Pending,
    /// A wicket fell; `vacant` is the end the next batter walks to.
    OneDown { survivor: String, vacant: End },
    Pair { striker: String, non_striker: String },
}

impl ActiveBatsmen {
    pub fn striker(&self) -> Option<&str> {
        match self {
            ActiveBatsmen::Pair { striker, .. } => Some(striker.as_str()),
            ActiveBatsmen::OneDown { survivor, vacant: End::NonStriker } => Some(survivor.as_str()),
            _ => None,
        }
    }

    pub fn non_striker(&self) -> Option<&str> {
        match self {
            ActiveBatsmen::Pair { non_striker, .. } => Some(non_striker.as_str()),
            ActiveBatsmen::OneDown { survivor, vacant: End::Striker } => Some(survivor.as_str()),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.striker() == Some(name) || self.non_striker() == Some(name)
    }

    /// Batters change ends. A vacant end moves with them.
    pub fn swap_ends(&mut self) {
        match self {
            ActiveBatsmen::Pair { striker, non_striker } => std::mem::swap(striker, non_striker),
            ActiveBatsmen::OneDown { vacant, .. } => *vacant = vacant.opposite(),
            ActiveBatsmen::Pending => {}
        }
    }

    /// Take a dismissed batter off the field. Returns false if they were not in.
    pub fn remove(&mut self, name: &str) -> bool {
        let next = match self {
            ActiveBatsmen::Pair { striker, non_striker } if striker.as_str() == name => ActiveBatsmen::OneDown {
                survivor: non_striker.clone(),
                vacant: End::Striker,
            },
            ActiveBatsmen::Pair { striker, non_striker } if non_striker.as_str() == name => ActiveBatsmen::OneDown {
                survivor: striker.clone(),
                vacant: End::NonStriker,
            },
            ActiveBatsmen::OneDown { survivor, .. } if survivor.as_str() == name => ActiveBatsmen::Pending,
            _ => return false,
        };
        *self = next;
        true
    }

    /// Fill the vacant end. Returns false when no end is vacant.
    pub fn fill(&mut self, newcomer: String) -> bool {
        let next = match self {
            ActiveBatsmen::OneDown { survivor, vacant: End::Striker } => ActiveBatsmen::Pair {
                striker: newcomer,
                non_striker: survivor.clone(),
            },
            ActiveBatsmen::OneDown { survivor, vacant: End::NonStriker } => ActiveBatsmen::Pair {
                striker: survivor.clone(),
                non_striker: newcomer,
            },
            _ => return false,
        };
        *self = next;
        true
    }
}

// ── Phases and results ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    FirstInnings,
    InningsBreak,
    SecondInnings,
    MatchEnded,
}

impl Phase {
    pub fn is_live(self) -> bool {
        matches!(self, Phase::FirstInnings | Phase::SecondInnings)
    }
}

/// What the scorer is being asked for next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    OpeningSelection,
    Scoring,
    NewBatsmanSelection,
    NewBowlerSelection,
    InningsBreak,
    MatchEnd,
}

/// Runs and balls on the board when the current partnership began.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartnershipMark {
    pub runs: u32,
    pub balls: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultKind {
    ChaseWon { wickets_in_hand: u32, balls_remaining: u32 },
    DefenceWon { runs_margin: u32 },
    Tied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchResult {
    pub kind: ResultKind,
    pub winner: Option<TeamSide>,
    pub summary: String,
}

// ── Match aggregate ────────────────────────────────────────────────

/// Complete match snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchState {
    pub config: MatchConfig,
    pub toss: TossResult,
    pub team_a: Team,
    pub team_b: Team,
    /// 1 or 2.
    pub innings: u8,
    pub phase: Phase,
    pub view: View,
    pub batting: TeamSide,
    pub bowling: TeamSide,
    pub score: Score,
    pub crease: ActiveBatsmen,
    pub bowler: Option<String>,
    pub last_over_bowler: Option<String>,
    /// Completed overs per bowler, current innings.
    pub bowler_overs: BTreeMap<String, u32>,
    pub ball_history: Vec<BallEvent>,
    pub is_free_hit: bool,
    pub partnership_start: PartnershipMark,
    pub first_innings: Option<Score>,
    pub target: Option<u32>,
    pub result: Option<MatchResult>,
}

impl MatchState {
    pub fn team(&self, side: TeamSide) -> &Team {
        match side {
            TeamSide::A => &self.team_a,
            TeamSide::B => &self.team_b,
        }
    }

    pub fn team_mut(&mut self, side: TeamSide) -> &mut Team {
        match side {
            TeamSide::A => &mut self.team_a,
            TeamSide::B => &mut self.team_b,
        }
    }

    pub fn batting_team(&self) -> &Team {
        self.team(self.batting)
    }

    pub fn bowling_team(&self) -> &Team {
        self.team(self.bowling)
    }

    pub fn striker(&self) -> Option<&str> {
        self.crease.striker()
    }

    pub fn non_striker(&self) -> Option<&str> {
        self.crease.non_striker()
    }

    /// Events of the innings in progress (or just closed).
    pub fn innings_events(&self) -> impl Iterator<Item = &BallEvent> + '_ {
        let innings = self.innings;
        self.ball_history
            .iter()
            .filter(move |e| e.context().innings == innings)
    }

    pub fn balls_remaining(&self) -> u32 {
        self.config.balls_per_innings().saturating_sub(self.score.balls)
    }

    /// Nullable result string for renderers.
    pub fn match_result(&self) -> Option<&str> {
        self.result.as_ref().map(|r| r.summary.as_str())
    }

    pub fn is_terminal(&self) -> bool {
        self.result.is_some()
    }
}

/// Structured outcome of one accepted command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransitionOutcome {
    pub command: String,
    /// Short label of the delivery (`"4"`, `"W"`, `"NB"`, `"2lb"`), if one was bowled.
    pub delivery: Option<String>,
    pub over_completed: bool,
    pub wicket_fell: bool,
    pub innings_closed: bool,
    pub match_ended: bool,
    pub view: View,
}

impl TransitionOutcome {
    pub fn new(command: &str, view: View) -> Self {
        Self {
            command: command.to_string(),
            delivery: None,
            over_completed: false,
            wicket_fell: false,
            innings_closed: false,
            match_ended: false,
            view,
        }
    }
}
