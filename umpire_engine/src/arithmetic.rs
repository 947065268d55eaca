/// Third Umpire: Arithmetic Primitives
///
/// Ball counts, overs notation and rates.
/// No float. Rates are fixed-point hundredths (SCALE = 100).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Legal deliveries in one over.
pub const BALLS_PER_OVER: u32 = 6;

/// Fixed-point scale for rates: `12.34` is stored as `1234`.
pub const SCALE: u64 = 100;

/// Overs in cricket notation: `completed.balls`, e.g. `3.4` is 3 overs and 4 balls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Overs {
    pub completed: u32,
    pub balls: u32,
}

impl Overs {
    /// Derive overs from a count of legal deliveries.
    pub fn from_balls(legal_balls: u32) -> Self {
        Self {
            completed: legal_balls / BALLS_PER_OVER,
            balls: legal_balls % BALLS_PER_OVER,
        }
    }

    pub fn total_balls(&self) -> u32 {
        self.completed * BALLS_PER_OVER + self.balls
    }
}

impl fmt::Display for Overs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.completed, self.balls)
    }
}

/// A fixed-point rate in hundredths. Displays with two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rate(pub u64);

impl Rate {
    pub const ZERO: Rate = Rate(0);

    pub fn hundredths(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / SCALE, self.0 % SCALE)
    }
}

/// `ceil(total_overs / (team_size - 1))`. A side of `n` has `n - 1`
/// bowlers once the wicket-keeper is excluded.
pub fn max_overs_per_bowler(total_overs: u32, team_size: usize) -> u32 {
    let bowlers = team_size.saturating_sub(1).max(1) as u32;
    total_overs.div_ceil(bowlers)
}

/// Runs per 100 balls.
pub fn strike_rate(runs: u32, balls: u32) -> Rate {
    if balls == 0 {
        return Rate::ZERO;
    }
    Rate(u64::from(runs) * 100 * SCALE / u64::from(balls))
}

/// Runs per six legal balls.
pub fn runs_per_over(runs: u32, balls: u32) -> Rate {
    if balls == 0 {
        return Rate::ZERO;
    }
    Rate(u64::from(runs) * u64::from(BALLS_PER_OVER) * SCALE / u64::from(balls))
}

/// Player and team names: non-empty after trimming, no control characters.
pub fn is_valid_name(name: &str) -> bool {
    !name.trim().is_empty() && !name.chars().any(char::is_control)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overs_notation() {
        assert_eq!(Overs::from_balls(0).to_string(), "0.0");
        assert_eq!(Overs::from_balls(6).to_string(), "1.0");
        assert_eq!(Overs::from_balls(22).to_string(), "3.4");
        assert_eq!(Overs::from_balls(22).total_balls(), 22);
    }

    #[test]
    fn test_max_overs_per_bowler() {
        assert_eq!(max_overs_per_bowler(20, 11), 2);
        assert_eq!(max_overs_per_bowler(50, 11), 5);
        assert_eq!(max_overs_per_bowler(2, 11), 1);
        assert_eq!(max_overs_per_bowler(5, 4), 2);
        assert_eq!(max_overs_per_bowler(6, 4), 2);
        assert_eq!(max_overs_per_bowler(7, 4), 3);
    }

    #[test]
    fn test_rates() {
        assert_eq!(strike_rate(0, 0), Rate::ZERO);
        assert_eq!(strike_rate(50, 40).to_string(), "125.00");
        assert_eq!(strike_rate(1, 3).to_string(), "33.33");
        assert_eq!(runs_per_over(12, 6).to_string(), "12.00");
        assert_eq!(runs_per_over(13, 7).to_string(), "11.14");
    }

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("V Kohli"));
        assert!(!is_valid_name("   "));
        assert!(!is_valid_name("bad\nname"));
    }
}
