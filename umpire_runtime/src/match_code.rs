//! Short public match codes.
//!
//! Six upper-case alphanumerics. Spectators type them in, so parsing
//! trims and upper-cases before validating.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CODE_LEN: usize = 6;
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid match code {input:?}: expected 6 letters or digits")]
pub struct MatchCodeError {
    pub input: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MatchCode(String);

impl MatchCode {
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..CODE_LEN)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        MatchCode(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Document key the persistence adapter stores the match under.
    pub fn storage_key(&self) -> String {
        format!("matches/{}", self.0)
    }
}

impl FromStr for MatchCode {
    type Err = MatchCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        if code.len() == CODE_LEN && code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            Ok(MatchCode(code))
        } else {
            Err(MatchCodeError { input: s.to_string() })
        }
    }
}

impl TryFrom<String> for MatchCode {
    type Error = MatchCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MatchCode> for String {
    fn from(code: MatchCode) -> Self {
        code.0
    }
}

impl fmt::Display for MatchCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generated_codes_are_well_formed() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let code = MatchCode::generate_with(&mut rng);
            assert_eq!(code.as_str().len(), CODE_LEN);
            assert!(code.as_str().bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
            assert_eq!(code.as_str().parse::<MatchCode>().unwrap(), code);
        }
    }

    #[test]
    fn parsing_normalizes_case_and_whitespace() {
        let code: MatchCode = " ab12cd ".parse().unwrap();
        assert_eq!(code.as_str(), "AB12CD");
        assert_eq!(code.storage_key(), "matches/AB12CD");
    }

    #[test]
    fn malformed_codes_are_rejected() {
        for bad in ["", "ABC12", "ABC1234", "AB-12C", "ÄBC123"] {
            assert!(bad.parse::<MatchCode>().is_err(), "{:?} accepted", bad);
        }
    }

    #[test]
    fn serde_goes_through_validation() {
        let code: MatchCode = serde_json::from_str("\"xy9zz1\"").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"XY9ZZ1\"");
        assert!(serde_json::from_str::<MatchCode>("\"nope\"").is_err());
    }
}
