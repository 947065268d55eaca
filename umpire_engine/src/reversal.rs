/// Third Umpire: Reversal
///
/// Undo never inverts a delivery field by field. The effective command
/// journal is cut just before the most recent delivery and the match is
/// rebuilt from `StartMatch`. Selections made after that delivery go with it.

use tracing::debug;

use crate::domain::MatchState;
use crate::error::ScoringError;
use crate::events::Command;
use crate::transitions::{apply_command, start_match};

/// Fold an effective journal (no `Undo` entries) into a state.
pub fn rebuild(journal: &[Command]) -> Result<MatchState, ScoringError> {
    let (first, rest) = journal
        .split_first()
        .ok_or_else(|| ScoringError::configuration("the journal is empty"))?;

    let (mut state, _) = start_match(first)?;
    for command in rest {
        let (next, _) = apply_command(&state, command)?;
        state = next;
    }
    Ok(state)
}

/// Position of the most recent delivery in the journal, if any.
pub fn last_delivery_index(journal: &[Command]) -> Option<usize> {
    journal.iter().rposition(Command::is_delivery)
}

/// Drop the latest delivery and everything after it, then replay.
/// Returns the rebuilt state together with the shortened journal.
pub fn revert_last_delivery(
    journal: &[Command],
) -> Result<(MatchState, Vec<Command>), ScoringError> {
    let cut = last_delivery_index(journal)
        .ok_or_else(|| ScoringError::NoOp("there is no delivery to undo".to_string()))?;

    let kept = journal[..cut].to_vec();
    let state = rebuild(&kept)?;
    debug!(
        dropped = journal.len() - cut,
        remaining = kept.len(),
        "reverted last delivery"
    );
    Ok((state, kept))
}
