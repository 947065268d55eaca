#![forbid(unsafe_code)]

//! Third Umpire runtime.
//!
//! Wraps the scoring kernel with a command log, replay, snapshots,
//! persistence sinks, match codes, configuration and per-match sessions.
//!
//! No scoring logic lives here; every transition and invariant is
//! delegated to `umpire_engine`.

pub mod proto_types;
pub mod proto_bridge;
pub mod command_log;
pub mod replay;
pub mod snapshot_codec;
pub mod snapshot;
pub mod persist;
pub mod match_code;
pub mod config;
pub mod telemetry;
pub mod session;
pub mod drift;
