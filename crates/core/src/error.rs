//! Fatal invariant violations.
//!
//! Filtered movement candidates, stale targets, and mid-pipeline deaths are
//! policy outcomes, not errors; the variants here mark states the simulation
//! must never reach silently.

use crate::agent::AgentId;
use crate::race::RaceId;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    /// An agent references a race the race book does not contain.
    #[error("agent {agent} references unregistered race {race:?}")]
    UnknownRace { agent: AgentId, race: RaceId },

    /// An agent stands on a tile the grid oracle does not cover.
    #[error("agent {agent} occupies out-of-bounds tile {y},{x}")]
    AgentOffGrid { agent: AgentId, y: i32, x: i32 },
}
