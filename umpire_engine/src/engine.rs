/// Third Umpire: Engine
///
/// Top-level orchestrator. Delegates mutation to transitions, undo to
/// reversal, and validates via invariants.
///
/// Strict sequence enforcement, start-match-first validation.

use tracing::{debug, warn};

use crate::domain::{MatchState, TransitionOutcome};
use crate::error::ScoringError;
use crate::events::{Command, CommandEnvelope, SCHEMA_VERSION};
use crate::invariants::validate_invariants;
use crate::reversal::{last_delivery_index, rebuild, revert_last_delivery};
use crate::transitions::{apply_command, start_match};

/// Stateful engine wrapping the pure functional transition layer.
///
/// Keeps the effective command journal: every accepted command except
/// `Undo`, with undone deliveries (and the selections after them) removed.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    state: Option<MatchState>,
    journal: Vec<Command>,
    last_sequence: u64,
}

impl ScoringEngine {
    /// Create a new engine with no match in progress.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an engine from an effective journal.
    pub fn resume(journal: Vec<Command>, last_sequence: u64) -> Result<Self, ScoringError> {
        let state = rebuild(&journal)?;
        validate_invariants(&state)?;
        Ok(Self {
            state: Some(state),
            journal,
            last_sequence,
        })
    }

    pub fn state(&self) -> Option<&MatchState> {
        self.state.as_ref()
    }

    pub fn journal(&self) -> &[Command] {
        &self.journal
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Apply one command. On error nothing changes.
    pub fn apply(
        &mut self,
        command: Command,
    ) -> Result<(&MatchState, TransitionOutcome), ScoringError> {
        let outcome = self.step(command)?;
        Ok((self.current()?, outcome))
    }

    /// Revert the most recent delivery.
    pub fn undo(&mut self) -> Result<(&MatchState, TransitionOutcome), ScoringError> {
        self.apply(Command::Undo)
    }

    /// Apply a sequenced envelope:
    ///   1. Validate schema version (must be 1)
    ///   2. Validate sequence (strictly increasing, no gaps)
    ///   3. Apply the command
    ///
    /// A rejected envelope does not consume its sequence number.
    pub fn apply_envelope(
        &mut self,
        envelope: &CommandEnvelope,
    ) -> Result<(&MatchState, TransitionOutcome), ScoringError> {
        if envelope.schema_version != SCHEMA_VERSION {
            return Err(ScoringError::Sequence(format!(
                "schema version mismatch: expected {}, got {}",
                SCHEMA_VERSION, envelope.schema_version
            )));
        }

        let expected = self.last_sequence + 1;
        if envelope.sequence != expected {
            return Err(ScoringError::Sequence(format!(
                "expected sequence {}, got {}",
                expected, envelope.sequence
            )));
        }

        let outcome = self.step(envelope.command.clone())?;
        self.last_sequence = envelope.sequence;
        Ok((self.current()?, outcome))
    }

    /// Event-sourced reconstruction: reset and replay.
    pub fn replay(&mut self, envelopes: &[CommandEnvelope]) -> Result<&MatchState, ScoringError> {
        *self = Self::new();
        for envelope in envelopes {
            self.apply_envelope(envelope)?;
        }
        self.state
            .as_ref()
            .ok_or_else(|| ScoringError::configuration("the command log is empty"))
    }

    fn current(&self) -> Result<&MatchState, ScoringError> {
        self.state
            .as_ref()
            .ok_or_else(|| ScoringError::Invariant("engine holds no state after a transition".to_string()))
    }

    /// Run one command through the kernel and commit it.
    fn step(&mut self, command: Command) -> Result<TransitionOutcome, ScoringError> {
        let transition = match (&self.state, &command) {
            (None, Command::Undo) => Err(ScoringError::NoOp("no match in progress".to_string())),
            (None, _) => start_match(&command),
            (Some(_), Command::Undo) => self.revert(),
            (Some(current), _) => apply_command(current, &command),
        };
        let checked = transition.and_then(|(s, o)| validate_invariants(&s).map(|_| (s, o)));
        let (next, outcome) = match checked {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(command = command.name(), error = %e, "command rejected");
                return Err(e);
            }
        };

        debug!(
            command = command.name(),
            view = ?outcome.view,
            score = %next.score,
            "command accepted"
        );
        if command == Command::Undo {
            if let Some(cut) = last_delivery_index(&self.journal) {
                self.journal.truncate(cut);
            }
        } else {
            self.journal.push(command);
        }
        self.state = Some(next);
        Ok(outcome)
    }

    fn revert(&self) -> Result<(MatchState, TransitionOutcome), ScoringError> {
        let (state, _) = revert_last_delivery(&self.journal)?;
        let outcome = TransitionOutcome::new(Command::Undo.name(), state.view);
        Ok((state, outcome))
    }
}
