//! Proto ↔ kernel conversion bridge.
//!
//! Converts between the protobuf wire types (proto_types.rs) and the
//! kernel's typed `CommandEnvelope`. Kind strings use the same spelling
//! as the kernel's serde names, so a JSON journal and a binary log carry
//! identical values.

use thiserror::Error;

use umpire_engine::domain::{MatchConfig, MatchRules, PlayerEntry, TeamSheet, TossResult};
use umpire_engine::error::ScoringError;
use umpire_engine::events::{Command, CommandEnvelope};

use crate::proto_types::*;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("frame {sequence}: missing {field}")]
    MissingField { sequence: u64, field: &'static str },
    #[error("frame {sequence}: {source}")]
    BadValue {
        sequence: u64,
        #[source]
        source: ScoringError,
    },
}

/// Convert a protobuf envelope to the kernel's envelope.
pub fn proto_to_kernel(proto: &ProtoCommandEnvelope) -> Result<CommandEnvelope, BridgeError> {
    let sequence = proto.sequence;
    let missing = |field| BridgeError::MissingField { sequence, field };
    let bad = |source| BridgeError::BadValue { sequence, source };

    let kind = proto
        .command
        .as_ref()
        .and_then(|c| c.kind.as_ref())
        .ok_or_else(|| missing("command"))?;

    let command = match kind {
        CommandKind::StartMatch(sm) => {
            let c = sm.config.as_ref().ok_or_else(|| missing("config"))?;
            let team_a = c.team_a.as_ref().ok_or_else(|| missing("team_a"))?;
            let team_b = c.team_b.as_ref().ok_or_else(|| missing("team_b"))?;
            Command::StartMatch {
                config: MatchConfig {
                    team_a: sheet_from_proto(team_a),
                    team_b: sheet_from_proto(team_b),
                    total_overs: c.total_overs,
                    team_size: c.team_size as usize,
                    rules: MatchRules {
                        credit_stumpings_to_bowler: c.credit_stumpings_to_bowler,
                    },
                },
                toss: TossResult {
                    winner: sm.toss_winner.parse().map_err(bad)?,
                    decision: sm.toss_decision.parse().map_err(bad)?,
                },
            }
        }
        CommandKind::SelectOpeningPlayers(op) => Command::SelectOpeningPlayers {
            striker: op.striker.clone(),
            non_striker: op.non_striker.clone(),
            bowler: op.bowler.clone(),
        },
        CommandKind::AddRuns(r) => Command::AddRuns { runs: r.runs },
        CommandKind::AddWicket(w) => Command::AddWicket {
            kind: w.kind.parse().map_err(bad)?,
            fielder: w.fielder.clone(),
            runs: w.runs,
            out_batsman: w.out_batsman.clone(),
            no_ball: w.no_ball,
        },
        CommandKind::AddExtra(x) => Command::AddExtra {
            kind: x.kind.parse().map_err(bad)?,
            total_runs: x.total_runs,
            runs_off_bat: x.runs_off_bat,
        },
        CommandKind::SelectNewBatsman(p) => Command::SelectNewBatsman { player: p.player.clone() },
        CommandKind::SelectNewBowler(p) => Command::SelectNewBowler { player: p.player.clone() },
        CommandKind::StartSecondInnings(_) => Command::StartSecondInnings,
        CommandKind::Undo(_) => Command::Undo,
    };

    Ok(CommandEnvelope {
        sequence,
        schema_version: proto.schema_version,
        command,
    })
}

/// Convert a kernel envelope to its protobuf form.
pub fn kernel_to_proto(envelope: &CommandEnvelope) -> ProtoCommandEnvelope {
    let kind = match &envelope.command {
        Command::StartMatch { config, toss } => CommandKind::StartMatch(StartMatch {
            config: Some(ProtoMatchConfig {
                team_a: Some(sheet_to_proto(&config.team_a)),
                team_b: Some(sheet_to_proto(&config.team_b)),
                total_overs: config.total_overs,
                team_size: config.team_size as u32,
                credit_stumpings_to_bowler: config.rules.credit_stumpings_to_bowler,
            }),
            toss_winner: toss.winner.to_string(),
            toss_decision: toss.decision.to_string(),
        }),
        Command::SelectOpeningPlayers { striker, non_striker, bowler } => {
            CommandKind::SelectOpeningPlayers(SelectOpeningPlayers {
                striker: striker.clone(),
                non_striker: non_striker.clone(),
                bowler: bowler.clone(),
            })
        }
        Command::AddRuns { runs } => CommandKind::AddRuns(AddRuns { runs: *runs }),
        Command::AddWicket { kind, fielder, runs, out_batsman, no_ball } => {
            CommandKind::AddWicket(AddWicket {
                kind: kind.as_str().to_string(),
                fielder: fielder.clone(),
                runs: *runs,
                out_batsman: out_batsman.clone(),
                no_ball: *no_ball,
            })
        }
        Command::AddExtra { kind, total_runs, runs_off_bat } => CommandKind::AddExtra(AddExtra {
            kind: kind.as_str().to_string(),
            total_runs: *total_runs,
            runs_off_bat: *runs_off_bat,
        }),
        Command::SelectNewBatsman { player } => {
            CommandKind::SelectNewBatsman(SelectPlayer { player: player.clone() })
        }
        Command::SelectNewBowler { player } => {
            CommandKind::SelectNewBowler(SelectPlayer { player: player.clone() })
        }
        Command::StartSecondInnings => CommandKind::StartSecondInnings(Empty {}),
        Command::Undo => CommandKind::Undo(Empty {}),
    };

    ProtoCommandEnvelope {
        sequence: envelope.sequence,
        schema_version: envelope.schema_version,
        command: Some(ProtoCommand { kind: Some(kind) }),
    }
}

fn sheet_from_proto(sheet: &ProtoTeamSheet) -> TeamSheet {
    TeamSheet {
        name: sheet.name.clone(),
        players: sheet
            .players
            .iter()
            .map(|p| PlayerEntry {
                name: p.name.clone(),
                captain: p.captain,
                wicket_keeper: p.wicket_keeper,
            })
            .collect(),
    }
}

fn sheet_to_proto(sheet: &TeamSheet) -> ProtoTeamSheet {
    ProtoTeamSheet {
        name: sheet.name.clone(),
        players: sheet
            .players
            .iter()
            .map(|p| ProtoPlayerEntry {
                name: p.name.clone(),
                captain: p.captain,
                wicket_keeper: p.wicket_keeper,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;
    use umpire_engine::domain::{TeamSide, TossDecision};
    use umpire_engine::events::{ExtraKind, WicketKind};

    fn sheet(name: &str, prefix: &str) -> TeamSheet {
        TeamSheet {
            name: name.into(),
            players: (1..=4)
                .map(|i| PlayerEntry {
                    name: format!("{}{}", prefix, i),
                    captain: i == 1,
                    wicket_keeper: i == 4,
                })
                .collect(),
        }
    }

    #[test]
    fn every_command_kind_survives_the_wire() {
        let commands = vec![
            Command::StartMatch {
                config: MatchConfig {
                    team_a: sheet("Owls", "O"),
                    team_b: sheet("Hawks", "H"),
                    total_overs: 5,
                    team_size: 4,
                    rules: MatchRules { credit_stumpings_to_bowler: true },
                },
                toss: TossResult { winner: TeamSide::B, decision: TossDecision::Bowl },
            },
            Command::SelectOpeningPlayers {
                striker: "O1".into(),
                non_striker: "O2".into(),
                bowler: "H1".into(),
            },
            Command::AddRuns { runs: 4 },
            Command::AddWicket {
                kind: WicketKind::RunOut,
                fielder: Some("H2".into()),
                runs: 1,
                out_batsman: Some("O2".into()),
                no_ball: true,
            },
            Command::AddExtra { kind: ExtraKind::NoBall, total_runs: 5, runs_off_bat: Some(4) },
            Command::AddExtra { kind: ExtraKind::Wide, total_runs: 1, runs_off_bat: None },
            Command::SelectNewBatsman { player: "O3".into() },
            Command::SelectNewBowler { player: "H2".into() },
            Command::StartSecondInnings,
            Command::Undo,
        ];

        for (i, command) in commands.into_iter().enumerate() {
            let envelope = CommandEnvelope::new(i as u64 + 1, command);
            let bytes = kernel_to_proto(&envelope).encode_to_vec();
            let decoded = ProtoCommandEnvelope::decode(bytes.as_slice()).expect("decode");
            assert_eq!(proto_to_kernel(&decoded).expect("bridge"), envelope);
        }
    }

    #[test]
    fn empty_frame_is_missing_command() {
        let proto = ProtoCommandEnvelope { sequence: 3, schema_version: 1, command: None };
        assert!(matches!(
            proto_to_kernel(&proto),
            Err(BridgeError::MissingField { sequence: 3, field: "command" })
        ));
    }

    #[test]
    fn unknown_kind_string_is_rejected() {
        let proto = ProtoCommandEnvelope {
            sequence: 7,
            schema_version: 1,
            command: Some(ProtoCommand {
                kind: Some(CommandKind::AddExtra(AddExtra {
                    kind: "penalty".into(),
                    total_runs: 5,
                    runs_off_bat: None,
                })),
            }),
        };
        let err = proto_to_kernel(&proto).unwrap_err();
        assert!(matches!(err, BridgeError::BadValue { sequence: 7, .. }));
        assert!(err.to_string().contains("penalty"));
    }
}
