//! Hand-written protobuf types for the command log.
//!
//! Uses prost derive macros for encode/decode without prost-build.
//! Field numbers are part of the on-disk format; never renumber.

use prost::Message;

// ── Envelope ───────────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoCommandEnvelope {
    #[prost(uint64, tag = "1")]
    pub sequence: u64,
    #[prost(uint32, tag = "2")]
    pub schema_version: u32,
    #[prost(message, optional, tag = "3")]
    pub command: Option<ProtoCommand>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoCommand {
    #[prost(oneof = "CommandKind", tags = "1, 2, 3, 4, 5, 6, 7, 8, 9")]
    pub kind: Option<CommandKind>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum CommandKind {
    #[prost(message, tag = "1")]
    StartMatch(StartMatch),
    #[prost(message, tag = "2")]
    SelectOpeningPlayers(SelectOpeningPlayers),
    #[prost(message, tag = "3")]
    AddRuns(AddRuns),
    #[prost(message, tag = "4")]
    AddWicket(AddWicket),
    #[prost(message, tag = "5")]
    AddExtra(AddExtra),
    #[prost(message, tag = "6")]
    SelectNewBatsman(SelectPlayer),
    #[prost(message, tag = "7")]
    SelectNewBowler(SelectPlayer),
    #[prost(message, tag = "8")]
    StartSecondInnings(Empty),
    #[prost(message, tag = "9")]
    Undo(Empty),
}

// ── Match setup ────────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoPlayerEntry {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(bool, tag = "2")]
    pub captain: bool,
    #[prost(bool, tag = "3")]
    pub wicket_keeper: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoTeamSheet {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, repeated, tag = "2")]
    pub players: Vec<ProtoPlayerEntry>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoMatchConfig {
    #[prost(message, optional, tag = "1")]
    pub team_a: Option<ProtoTeamSheet>,
    #[prost(message, optional, tag = "2")]
    pub team_b: Option<ProtoTeamSheet>,
    #[prost(uint32, tag = "3")]
    pub total_overs: u32,
    #[prost(uint32, tag = "4")]
    pub team_size: u32,
    #[prost(bool, tag = "5")]
    pub credit_stumpings_to_bowler: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct StartMatch {
    #[prost(message, optional, tag = "1")]
    pub config: Option<ProtoMatchConfig>,
    /// "a" or "b".
    #[prost(string, tag = "2")]
    pub toss_winner: String,
    /// "bat" or "bowl".
    #[prost(string, tag = "3")]
    pub toss_decision: String,
}

// ── Selections ─────────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct SelectOpeningPlayers {
    #[prost(string, tag = "1")]
    pub striker: String,
    #[prost(string, tag = "2")]
    pub non_striker: String,
    #[prost(string, tag = "3")]
    pub bowler: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct SelectPlayer {
    #[prost(string, tag = "1")]
    pub player: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct Empty {}

// ── Deliveries ─────────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct AddRuns {
    #[prost(uint32, tag = "1")]
    pub runs: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct AddWicket {
    #[prost(string, tag = "1")]
    pub kind: String,
    #[prost(string, optional, tag = "2")]
    pub fielder: Option<String>,
    #[prost(uint32, tag = "3")]
    pub runs: u32,
    #[prost(string, optional, tag = "4")]
    pub out_batsman: Option<String>,
    #[prost(bool, tag = "5")]
    pub no_ball: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct AddExtra {
    /// "wd", "nb", "b" or "lb".
    #[prost(string, tag = "1")]
    pub kind: String,
    #[prost(uint32, tag = "2")]
    pub total_runs: u32,
    #[prost(uint32, optional, tag = "3")]
    pub runs_off_bat: Option<u32>,
}
