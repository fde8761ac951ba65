//! Caribbean Core - Hex naval combat engine
//!
//! This crate provides the game logic for a two-player naval battle on a
//! 23x21 offset hex grid:
//! - Hex geometry (offset and cube coordinates)
//! - Ships, cannonballs, mines and rum barrels
//! - Command parsing and MOVE steering
//! - Deterministic round resolution with exact snapshots
//! - Rollout evaluation
//! - The referee/bot line protocol

pub mod hex;
pub mod entities;
pub mod action;
pub mod steering;
pub mod ruleset;
pub mod engine;
pub mod eval;
pub mod protocol;

// Re-exports for convenient access
pub use hex::{Coord, CubeCoord, MAP_WIDTH, MAP_HEIGHT};
pub use entities::{Cannonball, Damage, Entity, EntityId, EntityType, Mine, PlayerId, RumBarrel, Ship};
pub use action::{Action, ActionParseError, Command, CommandLine};
pub use ruleset::RuleSet;
pub use engine::{opponent, EngineState, Fleet, GameResult, HealthLedger, RoundStatus};
pub use eval::{evaluate, Heuristics};
pub use protocol::{render_player_input, EntityRecord, Observation, ProtocolError};
