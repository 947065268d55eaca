/// Third Umpire: Canonical Hashing
///
/// Deterministic canonical serialization + SHA-256 hashing.
/// Produces byte-identical output across platforms.
///
/// Rules:
///   - Root fields in a fixed order, `ruleset_version` first
///   - Rosters keep roster order (batting order matters)
///   - Bowler-over ledger sorted by bowler name
///   - Ball history in delivery order
///   - UTF-8 JSON, no whitespace, no float

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::MatchState;
use crate::RULESET_VERSION;

/// Canonical serialization of MatchState to UTF-8 JSON bytes.
pub fn canonical_serialize(state: &MatchState) -> Result<Vec<u8>, serde_json::Error> {
    let obj = build_canonical_value(state)?;
    serde_json::to_vec(&obj)
}

/// SHA-256 of canonical serialization. Lowercase hex string.
pub fn canonical_hash(state: &MatchState) -> Result<String, serde_json::Error> {
    let bytes = canonical_serialize(state)?;
    Ok(hex_digest(&bytes))
}

/// Lowercase hex SHA-256 of arbitrary bytes.
pub fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn insert<T: Serialize>(map: &mut Map<String, Value>, key: &str, value: &T) -> Result<(), serde_json::Error> {
    map.insert(key.to_string(), serde_json::to_value(value)?);
    Ok(())
}

/// Field order: ruleset_version, config, toss, teams, innings, phase, view,
/// sides, score, crease, bowler slots, ledger, history, free hit,
/// partnership, first innings, target, result.
fn build_canonical_value(state: &MatchState) -> Result<Value, serde_json::Error> {
    let mut teams = Map::new();
    insert(&mut teams, "a", &state.team_a)?;
    insert(&mut teams, "b", &state.team_b)?;

    // BTreeMap iterates in key order already.
    let mut ledger = Map::new();
    for (bowler, overs) in &state.bowler_overs {
        ledger.insert(bowler.clone(), Value::Number((*overs).into()));
    }

    let mut root = Map::new();
    root.insert(
        "ruleset_version".to_string(),
        Value::Number(RULESET_VERSION.into()),
    );
    insert(&mut root, "config", &state.config)?;
    insert(&mut root, "toss", &state.toss)?;
    root.insert("teams".to_string(), Value::Object(teams));
    insert(&mut root, "innings", &state.innings)?;
    insert(&mut root, "phase", &state.phase)?;
    insert(&mut root, "view", &state.view)?;
    insert(&mut root, "batting", &state.batting)?;
    insert(&mut root, "bowling", &state.bowling)?;
    insert(&mut root, "score", &state.score)?;
    insert(&mut root, "crease", &state.crease)?;
    insert(&mut root, "bowler", &state.bowler)?;
    insert(&mut root, "last_over_bowler", &state.last_over_bowler)?;
    root.insert("bowler_overs".to_string(), Value::Object(ledger));
    insert(&mut root, "ball_history", &state.ball_history)?;
    root.insert("is_free_hit".to_string(), Value::Bool(state.is_free_hit));
    insert(&mut root, "partnership_start", &state.partnership_start)?;
    insert(&mut root, "first_innings", &state.first_innings)?;
    insert(&mut root, "target", &state.target)?;
    insert(&mut root, "result", &state.result)?;

    Ok(Value::Object(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MatchConfig, MatchRules, PlayerEntry, TeamSheet, TeamSide, TossDecision, TossResult};
    use crate::state::create_initial_state;

    fn state() -> MatchState {
        let sheet = |name: &str| TeamSheet {
            name: name.to_string(),
            players: (1..=4)
                .map(|i| PlayerEntry {
                    name: format!("{}{}", name, i),
                    captain: i == 1,
                    wicket_keeper: i == 2,
                })
                .collect(),
        };
        let config = MatchConfig {
            team_a: sheet("A"),
            team_b: sheet("B"),
            total_overs: 2,
            team_size: 4,
            rules: MatchRules::default(),
        };
        create_initial_state(&config, TossResult { winner: TeamSide::A, decision: TossDecision::Bat })
            .expect("valid config")
    }

    #[test]
    fn hash_is_stable_and_sensitive() {
        let s = state();
        let h1 = canonical_hash(&s).expect("hash");
        let h2 = canonical_hash(&s.clone()).expect("hash");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);

        let mut changed = s;
        changed.bowler_overs.insert("B1".into(), 1);
        assert_ne!(canonical_hash(&changed).expect("hash"), h1);
    }

    #[test]
    fn ruleset_version_leads_the_document() {
        let bytes = canonical_serialize(&state()).expect("serialize");
        let text = String::from_utf8(bytes).expect("utf8");
        assert!(text.starts_with("{\"ruleset_version\":1,"));
    }
}
