/// Third Umpire: State Construction
///
/// `StartMatch` validation and the zeroed initial aggregate.

use std::collections::{BTreeMap, BTreeSet};

use crate::arithmetic::is_valid_name;
use crate::domain::{
    ActiveBatsmen, MatchConfig, MatchState, PartnershipMark, Phase, Player, Score, Team,
    TeamSheet, TeamSide, TossResult, View,
};
use crate::error::ScoringError;

pub const MIN_TEAM_SIZE: usize = 4;
pub const MAX_TEAM_SIZE: usize = 11;
pub const MAX_OVERS: u32 = 50;

/// Build the first-innings state once toss and configuration are complete.
/// Every stat starts at zero and no player is selected.
pub fn create_initial_state(
    config: &MatchConfig,
    toss: TossResult,
) -> Result<MatchState, ScoringError> {
    validate_config(config)?;

    let batting = toss.batting_first();
    Ok(MatchState {
        config: config.clone(),
        toss,
        team_a: build_team(&config.team_a),
        team_b: build_team(&config.team_b),
        innings: 1,
        phase: Phase::FirstInnings,
        view: View::OpeningSelection,
        batting,
        bowling: batting.opponent(),
        score: Score::default(),
        crease: ActiveBatsmen::Pending,
        bowler: None,
        last_over_bowler: None,
        bowler_overs: BTreeMap::new(),
        ball_history: Vec::new(),
        is_free_hit: false,
        partnership_start: PartnershipMark::default(),
        first_innings: None,
        target: None,
        result: None,
    })
}

fn build_team(sheet: &TeamSheet) -> Team {
    Team {
        name: sheet.name.trim().to_string(),
        players: sheet.players.iter().map(Player::from_entry).collect(),
    }
}

/// Reject configurations the match-creation flow would never produce.
pub fn validate_config(config: &MatchConfig) -> Result<(), ScoringError> {
    if !(MIN_TEAM_SIZE..=MAX_TEAM_SIZE).contains(&config.team_size) {
        return Err(ScoringError::validation(format!(
            "team size must be between {} and {}, got {}",
            MIN_TEAM_SIZE, MAX_TEAM_SIZE, config.team_size
        )));
    }
    if !(1..=MAX_OVERS).contains(&config.total_overs) {
        return Err(ScoringError::validation(format!(
            "total overs must be between 1 and {}, got {}",
            MAX_OVERS, config.total_overs
        )));
    }

    for side in [TeamSide::A, TeamSide::B] {
        validate_sheet(config.sheet(side), config.team_size)?;
    }

    if config.team_a.name.trim() == config.team_b.name.trim() {
        return Err(ScoringError::validation(format!(
            "both teams are named {:?}",
            config.team_a.name.trim()
        )));
    }
    Ok(())
}

fn validate_sheet(sheet: &TeamSheet, team_size: usize) -> Result<(), ScoringError> {
    if !is_valid_name(&sheet.name) {
        return Err(ScoringError::validation(format!("invalid team name {:?}", sheet.name)));
    }
    if sheet.players.len() != team_size {
        return Err(ScoringError::validation(format!(
            "{} lists {} players, expected {}",
            sheet.name,
            sheet.players.len(),
            team_size
        )));
    }

    let mut seen = BTreeSet::new();
    for entry in &sheet.players {
        if !is_valid_name(&entry.name) {
            return Err(ScoringError::validation(format!(
                "{} has an invalid player name {:?}",
                sheet.name, entry.name
            )));
        }
        if !seen.insert(entry.name.trim()) {
            return Err(ScoringError::validation(format!(
                "{} lists {:?} twice",
                sheet.name,
                entry.name.trim()
            )));
        }
    }

    let captains = sheet.players.iter().filter(|p| p.captain).count();
    if captains != 1 {
        return Err(ScoringError::validation(format!(
            "{} must name exactly one captain, found {}",
            sheet.name, captains
        )));
    }
    let keepers = sheet.players.iter().filter(|p| p.wicket_keeper).count();
    if keepers != 1 {
        return Err(ScoringError::validation(format!(
            "{} must name exactly one wicket-keeper, found {}",
            sheet.name, keepers
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MatchRules, PlayerEntry, TossDecision};

    fn sheet(name: &str, size: usize) -> TeamSheet {
        TeamSheet {
            name: name.to_string(),
            players: (1..=size)
                .map(|i| PlayerEntry {
                    name: format!("{}{}", name, i),
                    captain: i == 1,
                    wicket_keeper: i == 2,
                })
                .collect(),
        }
    }

    fn config(size: usize) -> MatchConfig {
        MatchConfig {
            team_a: sheet("Lions", size),
            team_b: sheet("Tigers", size),
            total_overs: 5,
            team_size: size,
            rules: MatchRules::default(),
        }
    }

    #[test]
    fn initial_state_is_zeroed() {
        let toss = TossResult { winner: TeamSide::B, decision: TossDecision::Bat };
        let s = create_initial_state(&config(6), toss).expect("valid config");
        assert_eq!(s.batting, TeamSide::B);
        assert_eq!(s.bowling, TeamSide::A);
        assert_eq!(s.phase, Phase::FirstInnings);
        assert_eq!(s.view, View::OpeningSelection);
        assert_eq!(s.score, Score::default());
        assert!(s.ball_history.is_empty());
        assert!(s.team_a.players.iter().all(|p| !p.has_batted && p.batting.runs == 0));
    }

    #[test]
    fn rejects_out_of_range_team_size() {
        let toss = TossResult { winner: TeamSide::A, decision: TossDecision::Bat };
        assert!(matches!(create_initial_state(&config(3), toss), Err(ScoringError::Validation(_))));
        assert!(matches!(create_initial_state(&config(12), toss), Err(ScoringError::Validation(_))));
    }

    #[test]
    fn rejects_out_of_range_overs() {
        let toss = TossResult { winner: TeamSide::A, decision: TossDecision::Bat };
        for overs in [0, MAX_OVERS + 1, u32::MAX] {
            let mut c = config(6);
            c.total_overs = overs;
            assert!(
                matches!(create_initial_state(&c, toss), Err(ScoringError::Validation(_))),
                "{} overs accepted",
                overs
            );
        }
        let mut full = config(6);
        full.total_overs = MAX_OVERS;
        assert!(create_initial_state(&full, toss).is_ok());
    }

    #[test]
    fn rejects_duplicate_names_and_missing_keeper() {
        let mut dup = config(4);
        dup.team_a.players[3].name = "Lions1".into();
        assert!(validate_config(&dup).is_err());

        let mut no_keeper = config(4);
        no_keeper.team_b.players[1].wicket_keeper = false;
        assert!(validate_config(&no_keeper).is_err());

        let mut same_names = config(4);
        same_names.team_b.name = "Lions".into();
        assert!(validate_config(&same_names).is_err());
    }
}
