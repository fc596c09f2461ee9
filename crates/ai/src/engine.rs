//! The per-turn decision engine.
//!
//! [`AiEngine`] borrows everything an agent sweep needs: the mutable
//! simulation state, the read-only floor oracle and race book, tuning
//! config, the RNG, and the host's resolution hooks. One engine value is
//! built per turn and driven through [`AiEngine::run_turn`].

use delve_core::{
    AgentId, AgentState, Feature, GameRng, GridOracle, Position, RaceBook, RaceTemplate,
    SimConfig, SimError, SimState, SpatialQuery, can_cross_terrain, distance,
};

use crate::hooks::{CombatHooks, EventSink, FloorSink};

/// Turn-scoped decision driver for the whole agent population.
pub struct AiEngine<'a> {
    pub(crate) state: &'a mut SimState,
    pub(crate) grid: &'a dyn GridOracle,
    pub(crate) races: &'a RaceBook,
    pub(crate) config: &'a SimConfig,
    pub(crate) rng: &'a mut GameRng,
    pub(crate) combat: &'a mut dyn CombatHooks,
    pub(crate) events: &'a mut dyn EventSink,
    pub(crate) floor: &'a mut dyn FloorSink,
}

impl<'a> AiEngine<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        state: &'a mut SimState,
        grid: &'a dyn GridOracle,
        races: &'a RaceBook,
        config: &'a SimConfig,
        rng: &'a mut GameRng,
        combat: &'a mut dyn CombatHooks,
        events: &'a mut dyn EventSink,
        floor: &'a mut dyn FloorSink,
    ) -> Self {
        Self {
            state,
            grid,
            races,
            config,
            rng,
            combat,
            events,
            floor,
        }
    }

    pub(crate) fn spatial(&self) -> SpatialQuery<'a> {
        SpatialQuery::new(self.grid, self.config)
    }

    /// Race template lookup; a missing template is a fatal data error.
    pub(crate) fn race_of(&self, id: AgentId, agent: &AgentState) -> Result<&'a RaceTemplate, SimError> {
        self.races
            .template(agent.race)
            .ok_or(SimError::UnknownRace {
                agent: id,
                race: agent.race,
            })
    }

    /// Cloned view of an agent, or `None` if it died mid-pipeline.
    pub(crate) fn snapshot(&self, id: AgentId) -> Option<AgentState> {
        self.state.agents.agent(id).cloned()
    }

    pub(crate) fn is_alive(&self, id: AgentId) -> bool {
        self.state.agents.is_alive(id)
    }

    /// Whether the player currently rides this agent.
    pub(crate) fn is_ridden(&self, id: AgentId) -> bool {
        self.state.player.riding == Some(id)
    }

    /// Effective wall-phasing: PASS_WALL loses to a rider without the power,
    /// KILL_WALL is never usable while ridden (the tunnel would bury the
    /// rider).
    pub(crate) fn can_phase_walls(&self, id: AgentId, race: &RaceTemplate) -> bool {
        race.can_pass_walls() && (!self.is_ridden(id) || self.state.player.pass_wall)
    }

    pub(crate) fn can_tunnel_walls(&self, id: AgentId, race: &RaceTemplate) -> bool {
        race.can_kill_walls() && !self.is_ridden(id)
    }

    pub(crate) fn can_cross(&self, id: AgentId, race: &RaceTemplate, feature: Feature) -> bool {
        can_cross_terrain(feature, race, self.is_ridden(id), self.state.player.pass_wall)
    }

    /// Whether `race` could occupy `pos` right now: legal terrain, in
    /// bounds, and not already occupied by the player or another agent.
    pub(crate) fn can_enter(&self, id: AgentId, race: &RaceTemplate, pos: Position) -> bool {
        let Some(tile) = self.grid.tile(pos) else {
            return false;
        };
        if pos == self.state.player.pos {
            return false;
        }
        if self.state.agents.agent_at(pos).is_some() {
            return false;
        }
        self.can_cross(id, race, tile.feature)
    }

    /// Refreshes the cached player distance after a position change.
    pub(crate) fn refresh_distance(&mut self, id: AgentId) {
        let player_pos = self.state.player.pos;
        if let Some(agent) = self.state.agents.agent_mut(id) {
            agent.dist_to_player = distance(agent.pos, player_pos);
        }
    }

    /// Display name for messages; panics never, falls back to the id.
    pub(crate) fn name_of(&self, agent: &AgentState) -> String {
        self.races
            .template(agent.race)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| format!("creature {:?}", agent.race))
    }
}
