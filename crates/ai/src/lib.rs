//! Per-turn decision engine for dungeon agents.
//!
//! Drives every live agent once per game turn: perception, approach and
//! flee pathing over the floor's cost/scent fields, multiplication, door
//! and wall handling, and attack dispatch through host-provided hooks. The
//! data model lives in `delve-core`; this crate owns only the decisions.
//!
//! Entry point: build an [`AiEngine`] for the turn and call
//! [`AiEngine::run_turn`].

mod decide;
mod direction;
mod engine;
pub mod flow;
mod hooks;
mod movement;
mod scheduler;

pub use engine::AiEngine;
pub use hooks::{AttackOutcome, CombatHooks, EventSink, FloorSink, TerrainChange};
