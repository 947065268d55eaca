/// Third Umpire: Commands and Ball Events
///
/// Commands carry scorer intent. Ball events are the append-only record of
/// what was bowled. Neither contains transition logic; the accounting
/// helpers on `BallEvent` only read the event itself.
///
/// Schema version is locked at 1. Envelopes with any other
/// schema_version are rejected by the engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::{MatchConfig, MatchRules, TeamSide, TossResult};
use crate::error::ScoringError;

/// Schema version for command envelopes. Hardcoded, never changes.
pub const SCHEMA_VERSION: u32 = 1;

// ── Kinds ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WicketKind {
    Bowled,
    Caught,
    Lbw,
    Stumped,
    RunOut,
}

impl WicketKind {
    /// Whether the bowler's wicket tally is credited.
    pub fn credits_bowler(self, rules: &MatchRules) -> bool {
        match self {
            WicketKind::Bowled | WicketKind::Caught | WicketKind::Lbw => true,
            WicketKind::Stumped => rules.credit_stumpings_to_bowler,
            WicketKind::RunOut => false,
        }
    }

    pub fn requires_fielder(self) -> bool {
        matches!(self, WicketKind::Caught | WicketKind::RunOut)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WicketKind::Bowled => "bowled",
            WicketKind::Caught => "caught",
            WicketKind::Lbw => "lbw",
            WicketKind::Stumped => "stumped",
            WicketKind::RunOut => "run_out",
        }
    }
}

impl fmt::Display for WicketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WicketKind {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bowled" => Ok(WicketKind::Bowled),
            "caught" => Ok(WicketKind::Caught),
            "lbw" => Ok(WicketKind::Lbw),
            "stumped" => Ok(WicketKind::Stumped),
            "run_out" => Ok(WicketKind::RunOut),
            other => Err(ScoringError::validation(format!("unknown wicket kind {:?}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtraKind {
    #[serde(rename = "wd")]
    Wide,
    #[serde(rename = "nb")]
    NoBall,
    #[serde(rename = "b")]
    Bye,
    #[serde(rename = "lb")]
    LegBye,
}

impl ExtraKind {
    /// Byes and leg-byes count towards the over.
    pub fn is_legal(self) -> bool {
        matches!(self, ExtraKind::Bye | ExtraKind::LegBye)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExtraKind::Wide => "wd",
            ExtraKind::NoBall => "nb",
            ExtraKind::Bye => "b",
            ExtraKind::LegBye => "lb",
        }
    }
}

impl fmt::Display for ExtraKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtraKind {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wd" => Ok(ExtraKind::Wide),
            "nb" => Ok(ExtraKind::NoBall),
            "b" => Ok(ExtraKind::Bye),
            "lb" => Ok(ExtraKind::LegBye),
            other => Err(ScoringError::validation(format!("unknown extra kind {:?}", other))),
        }
    }
}

// ── Ball events ────────────────────────────────────────────────────

/// Who was involved, and where in the innings, when the ball was bowled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BallContext {
    pub innings: u8,
    pub batting_team: TeamSide,
    pub striker: String,
    pub non_striker: String,
    pub bowler: String,
    /// Zero-based over index within the innings.
    pub over: u32,
    /// One-based legal ball this delivery was bowled as (an illegal
    /// delivery shares the number of the ball that follows it).
    pub ball_in_over: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunsEvent {
    pub context: BallContext,
    pub runs: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WicketEvent {
    pub context: BallContext,
    pub kind: WicketKind,
    pub fielder: Option<String>,
    /// Runs completed before the dismissal.
    pub runs: u32,
    /// The dismissed batter.
    pub out_batsman: String,
    pub no_ball: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtraEvent {
    pub context: BallContext,
    pub kind: ExtraKind,
    pub total_runs: u32,
    pub runs_off_bat: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BallEvent {
    Runs(RunsEvent),
    Wicket(WicketEvent),
    Extra(ExtraEvent),
}

impl BallEvent {
    pub fn context(&self) -> &BallContext {
        match self {
            BallEvent::Runs(e) => &e.context,
            BallEvent::Wicket(e) => &e.context,
            BallEvent::Extra(e) => &e.context,
        }
    }

    /// Counts towards the six balls of an over.
    pub fn is_legal(&self) -> bool {
        match self {
            BallEvent::Runs(_) => true,
            BallEvent::Wicket(e) => !e.no_ball,
            BallEvent::Extra(e) => e.kind.is_legal(),
        }
    }

    pub fn is_no_ball(&self) -> bool {
        match self {
            BallEvent::Runs(_) => false,
            BallEvent::Wicket(e) => e.no_ball,
            BallEvent::Extra(e) => e.kind == ExtraKind::NoBall,
        }
    }

    pub fn is_wicket(&self) -> bool {
        matches!(self, BallEvent::Wicket(_))
    }

    /// Everything added to the team total.
    pub fn total_runs(&self) -> u32 {
        match self {
            BallEvent::Runs(e) => e.runs,
            BallEvent::Wicket(e) => e.runs + u32::from(e.no_ball),
            BallEvent::Extra(e) => e.total_runs,
        }
    }

    /// Runs credited to the striker's personal tally.
    pub fn off_bat(&self) -> u32 {
        match self {
            BallEvent::Runs(e) => e.runs,
            BallEvent::Wicket(e) => e.runs,
            BallEvent::Extra(e) if e.kind == ExtraKind::NoBall => e.runs_off_bat.unwrap_or(0),
            BallEvent::Extra(_) => 0,
        }
    }

    pub fn extras(&self) -> u32 {
        self.total_runs() - self.off_bat()
    }

    /// Runs charged against the bowler's figures.
    pub fn bowler_runs(&self) -> u32 {
        match self {
            BallEvent::Runs(e) => e.runs,
            BallEvent::Wicket(e) => e.runs + u32::from(e.no_ball),
            BallEvent::Extra(e) => match e.kind {
                ExtraKind::Wide => e.total_runs,
                ExtraKind::NoBall => 1 + e.runs_off_bat.unwrap_or(0),
                ExtraKind::Bye | ExtraKind::LegBye => 0,
            },
        }
    }

    /// Whether the striker is charged a ball faced. Wides are not faced.
    pub fn faced_by_striker(&self) -> bool {
        !matches!(self, BallEvent::Extra(e) if e.kind == ExtraKind::Wide)
    }

    /// Four or six struck off the bat.
    pub fn boundary(&self) -> Option<u32> {
        let struck = match self {
            BallEvent::Runs(e) => e.runs,
            BallEvent::Extra(e) if e.kind == ExtraKind::NoBall => e.runs_off_bat.unwrap_or(0),
            _ => return None,
        };
        matches!(struck, 4 | 6).then_some(struck)
    }

    /// Runs the batters physically ran or struck, for strike rotation.
    /// `None` when the delivery does not rotate strike by itself.
    pub fn rotation_runs(&self) -> Option<u32> {
        match self {
            BallEvent::Runs(e) => Some(e.runs),
            BallEvent::Wicket(e) => Some(e.runs),
            BallEvent::Extra(e) => match e.kind {
                ExtraKind::Wide => None,
                ExtraKind::NoBall => Some(e.runs_off_bat.unwrap_or(0)),
                ExtraKind::Bye | ExtraKind::LegBye => Some(e.total_runs),
            },
        }
    }

    /// Short ticker label: `"4"`, `"W"`, `"WD"`, `"3NB"`, `"2lb"`.
    pub fn label(&self) -> String {
        match self {
            BallEvent::Runs(e) => e.runs.to_string(),
            BallEvent::Wicket(_) => "W".to_string(),
            BallEvent::Extra(e) => match e.kind {
                ExtraKind::Wide | ExtraKind::NoBall => {
                    let tag = e.kind.as_str().to_ascii_uppercase();
                    if e.total_runs == 1 {
                        tag
                    } else {
                        format!("{}{}", e.total_runs, tag)
                    }
                }
                ExtraKind::Bye | ExtraKind::LegBye => format!("{}{}", e.total_runs, e.kind),
            },
        }
    }
}

// ── Commands ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    StartMatch {
        config: MatchConfig,
        toss: TossResult,
    },
    SelectOpeningPlayers {
        striker: String,
        non_striker: String,
        bowler: String,
    },
    AddRuns {
        runs: u32,
    },
    AddWicket {
        kind: WicketKind,
        #[serde(default)]
        fielder: Option<String>,
        #[serde(default)]
        runs: u32,
        #[serde(default)]
        out_batsman: Option<String>,
        #[serde(default)]
        no_ball: bool,
    },
    AddExtra {
        kind: ExtraKind,
        total_runs: u32,
        #[serde(default)]
        runs_off_bat: Option<u32>,
    },
    SelectNewBatsman {
        player: String,
    },
    SelectNewBowler {
        player: String,
    },
    StartSecondInnings,
    Undo,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::StartMatch { .. } => "start_match",
            Command::SelectOpeningPlayers { .. } => "select_opening_players",
            Command::AddRuns { .. } => "add_runs",
            Command::AddWicket { .. } => "add_wicket",
            Command::AddExtra { .. } => "add_extra",
            Command::SelectNewBatsman { .. } => "select_new_batsman",
            Command::SelectNewBowler { .. } => "select_new_bowler",
            Command::StartSecondInnings => "start_second_innings",
            Command::Undo => "undo",
        }
    }

    /// Commands that append exactly one ball event.
    pub fn is_delivery(&self) -> bool {
        matches!(
            self,
            Command::AddRuns { .. } | Command::AddWicket { .. } | Command::AddExtra { .. }
        )
    }
}

/// Sequenced command as stored in the command log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandEnvelope {
    pub sequence: u64,
    pub schema_version: u32,
    pub command: Command,
}

impl CommandEnvelope {
    pub fn new(sequence: u64, command: Command) -> Self {
        Self {
            sequence,
            schema_version: SCHEMA_VERSION,
            command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> BallContext {
        BallContext {
            innings: 1,
            batting_team: TeamSide::A,
            striker: "S".into(),
            non_striker: "N".into(),
            bowler: "B".into(),
            over: 0,
            ball_in_over: 1,
        }
    }

    #[test]
    fn no_ball_accounting_splits_bat_and_extras() {
        let nb = BallEvent::Extra(ExtraEvent {
            context: ctx(),
            kind: ExtraKind::NoBall,
            total_runs: 5,
            runs_off_bat: Some(4),
        });
        assert!(!nb.is_legal());
        assert_eq!(nb.total_runs(), 5);
        assert_eq!(nb.off_bat(), 4);
        assert_eq!(nb.extras(), 1);
        assert_eq!(nb.bowler_runs(), 5);
        assert_eq!(nb.boundary(), Some(4));
        assert_eq!(nb.rotation_runs(), Some(4));
        assert_eq!(nb.label(), "5NB");
    }

    #[test]
    fn byes_are_legal_but_not_charged_to_bowler() {
        let bye = BallEvent::Extra(ExtraEvent {
            context: ctx(),
            kind: ExtraKind::LegBye,
            total_runs: 2,
            runs_off_bat: None,
        });
        assert!(bye.is_legal());
        assert_eq!(bye.bowler_runs(), 0);
        assert_eq!(bye.extras(), 2);
        assert_eq!(bye.label(), "2lb");
    }

    #[test]
    fn no_ball_wicket_adds_penalty() {
        let w = BallEvent::Wicket(WicketEvent {
            context: ctx(),
            kind: WicketKind::RunOut,
            fielder: Some("F".into()),
            runs: 1,
            out_batsman: "N".into(),
            no_ball: true,
        });
        assert!(!w.is_legal());
        assert!(w.is_no_ball());
        assert_eq!(w.total_runs(), 2);
        assert_eq!(w.extras(), 1);
        assert_eq!(w.label(), "W");
    }

    #[test]
    fn unknown_kinds_are_validation_errors() {
        assert!(matches!("hit_wicket".parse::<WicketKind>(), Err(ScoringError::Validation(_))));
        assert!(matches!("pen".parse::<ExtraKind>(), Err(ScoringError::Validation(_))));
        assert_eq!("lb".parse::<ExtraKind>(), Ok(ExtraKind::LegBye));
    }

    #[test]
    fn command_json_shape() {
        let cmd: Command = serde_json::from_str(r#"{"type":"add_extra","kind":"nb","total_runs":1}"#)
            .expect("parse");
        assert_eq!(
            cmd,
            Command::AddExtra {
                kind: ExtraKind::NoBall,
                total_runs: 1,
                runs_off_bat: None
            }
        );
        assert!(cmd.is_delivery());
        assert!(!Command::Undo.is_delivery());
    }
}
