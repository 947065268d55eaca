#![forbid(unsafe_code)]

/// Ruleset v1. Changing any scoring rule requires a new version.
pub const RULESET_VERSION: u32 = 1;

pub mod arithmetic;
pub mod error;
pub mod domain;
pub mod events;
pub mod state;
pub mod eligibility;
pub mod innings;
pub mod transitions;
pub mod reversal;
pub mod invariants;
pub mod hashing;
pub mod engine;
pub mod scorecard;
