//! Core data model for the dungeon agent simulation.
//!
//! This crate holds the pure, host-independent pieces: grid geometry and
//! spatial predicates, the terrain oracle interface, race templates, the
//! agent population, player/world state, deterministic RNG, and the tuning
//! configuration. The decision engine that drives agents each turn lives in
//! `delve-ai`.

pub mod agent;
pub mod config;
pub mod energy;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod race;
pub mod rng;
pub mod spatial;
pub mod world;

pub use agent::{AgentId, AgentState, Alignment};
pub use config::{DisturbPolicy, SimConfig};
pub use energy::{TURN_ENERGY, speed_to_energy};
pub use error::SimError;
pub use geometry::{Dir, Position, SCAN_DIRS, distance};
pub use grid::{Feature, GridDimensions, GridOracle, ItemHandle, Tile, can_cross_terrain};
pub use race::{RaceBook, RaceFlags, RaceId, RaceTemplate};
pub use rng::GameRng;
pub use spatial::SpatialQuery;
pub use world::{LoreLedger, PlayerState, Population, RaceLore, SimState, WorldState};
