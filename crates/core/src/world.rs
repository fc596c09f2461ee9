//! World-side mutable state: the player view, the agent population, the
//! reproduction counter, and the race lore ledger.
//!
//! Everything here is owned by one [`SimState`] passed by reference into the
//! scheduler; there are no ambient singletons.

use crate::agent::{AgentId, AgentState, Alignment};
use crate::geometry::Position;
use crate::race::RaceId;

/// The engine's read/write view of the player.
///
/// Combat, spell, and inventory mechanics stay with the host; the engine
/// only needs the scheduling- and perception-relevant slice.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerState {
    pub pos: Position,
    pub level: i32,
    pub hp: i32,
    pub max_hp: i32,
    pub sp: i32,
    pub max_sp: i32,
    pub speed: u8,
    pub stealth_skill: i32,
    /// Hyper-stealth status: agents must roll awareness to act on the player.
    pub hyper_stealth: bool,
    /// The player is carrying light that exposes them to monsters.
    pub monster_lite: bool,
    /// Aggravation curse: wakes and enrages everything nearby.
    pub aggravate: bool,
    /// The agent the player is currently riding, if any.
    pub riding: Option<AgentId>,
    /// The player can walk through walls (shares the power with a mount).
    pub pass_wall: bool,
    /// Commanded follow distance for pets; negative means "keep away".
    pub pet_follow_distance: i32,
    /// Pets may pick up items.
    pub pet_pickup_items: bool,
    /// Player-designated target for all pets.
    pub pet_target: Option<AgentId>,
    /// Arena/spectated-duel suspension: hostility flips and speech pause.
    pub phase_out: bool,
    /// The floor is being torn down; abort all processing.
    pub leaving: bool,
    pub playing: bool,
    pub dead: bool,
    /// Global flow suppression: herds occasionally revert to direct pathing.
    pub no_flow_suppression: bool,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            pos: Position::ORIGIN,
            level: 1,
            hp: 10,
            max_hp: 10,
            sp: 0,
            max_sp: 0,
            speed: 110,
            stealth_skill: 0,
            hyper_stealth: false,
            monster_lite: false,
            aggravate: false,
            riding: None,
            pass_wall: false,
            pet_follow_distance: 6,
            pet_pickup_items: false,
            pet_target: None,
            phase_out: false,
            leaving: false,
            playing: true,
            dead: false,
            no_flow_suppression: false,
        }
    }
}

/// Floor-global bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldState {
    /// Current game turn; spawn epochs compare against this.
    pub game_turn: u64,
    /// Live count of breeding-capable agents spawned by multiplication.
    pub repro_count: u32,
    /// An agent made noise this sweep.
    pub noise: bool,
    /// Debug/scenario override: treat every breeder as fully crowded.
    pub multiply_barrier: bool,
}

/// Aggregate per-race observation counters. This is the only race-side state
/// the simulation mutates; templates themselves stay immutable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RaceLore {
    pub wakes: u8,
    pub splits: u8,
    pub ignored_moves: u8,
    pub opened_doors: u8,
    pub bashed_doors: u8,
    pub killed_walls: u8,
    pub passed_walls: u8,
    pub took_items: u8,
    pub killed_items: u8,
}

/// Lore ledger keyed by race id, grown on demand.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoreLedger {
    entries: Vec<RaceLore>,
}

impl LoreLedger {
    pub fn get(&self, race: RaceId) -> RaceLore {
        self.entries.get(race.0 as usize).copied().unwrap_or_default()
    }

    pub fn entry(&mut self, race: RaceId) -> &mut RaceLore {
        let idx = race.0 as usize;
        if idx >= self.entries.len() {
            self.entries.resize(idx + 1, RaceLore::default());
        }
        &mut self.entries[idx]
    }
}

/// The agent population: a slot vector with stable indices and reuse.
///
/// Iteration for the turn sweep runs from the highest slot down so that
/// removals never disturb not-yet-visited indices. A freed slot may be
/// reclaimed by a newborn within the same sweep; the spawn epoch keeps the
/// newborn from acting until the next turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Population {
    slots: Vec<Option<AgentState>>,
}

impl Population {
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn agent(&self, id: AgentId) -> Option<&AgentState> {
        self.slots.get(id.0 as usize).and_then(|s| s.as_ref())
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut AgentState> {
        self.slots.get_mut(id.0 as usize).and_then(|s| s.as_mut())
    }

    pub fn is_alive(&self, id: AgentId) -> bool {
        self.agent(id).is_some()
    }

    /// Inserts an agent into the lowest free slot, or appends one.
    pub fn spawn(&mut self, agent: AgentState) -> AgentId {
        if let Some(idx) = self.slots.iter().position(Option::is_none) {
            self.slots[idx] = Some(agent);
            AgentId(idx as u32)
        } else {
            self.slots.push(Some(agent));
            AgentId(self.slots.len() as u32 - 1)
        }
    }

    /// Removes an agent; freeing its slot for reuse. Returns the agent.
    pub fn remove(&mut self, id: AgentId) -> Option<AgentState> {
        self.slots.get_mut(id.0 as usize).and_then(Option::take)
    }

    /// The live agent occupying `pos`, if any.
    pub fn agent_at(&self, pos: Position) -> Option<AgentId> {
        self.slots.iter().enumerate().find_map(|(idx, slot)| {
            slot.as_ref()
                .filter(|a| a.pos == pos)
                .map(|_| AgentId(idx as u32))
        })
    }

    /// Live agents with their ids, ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &AgentState)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|a| (AgentId(idx as u32), a)))
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

/// Everything the engine mutates, passed by reference into the scheduler.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimState {
    pub player: PlayerState,
    pub world: WorldState,
    pub agents: Population,
    pub lore: LoreLedger,
}

impl SimState {
    /// Whether two agents are on opposite sides.
    pub fn are_enemies(&self, a: &AgentState, b: &AgentState) -> bool {
        match (a.alignment, b.alignment) {
            (Alignment::Hostile, Alignment::Hostile) => false,
            (Alignment::Hostile, _) | (_, Alignment::Hostile) => true,
            _ => false,
        }
    }

    /// The sweep must stop immediately after the current agent.
    pub fn should_abort_sweep(&self) -> bool {
        self.player.leaving || self.player.dead || !self.player.playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::RaceId;

    fn agent_at(y: i32, x: i32) -> AgentState {
        AgentState::new(RaceId(0), Position::new(y, x), 10, 110, 0)
    }

    #[test]
    fn spawn_reuses_lowest_free_slot() {
        let mut pop = Population::default();
        let a = pop.spawn(agent_at(1, 1));
        let b = pop.spawn(agent_at(2, 2));
        let c = pop.spawn(agent_at(3, 3));
        assert_eq!((a.0, b.0, c.0), (0, 1, 2));

        pop.remove(b);
        let d = pop.spawn(agent_at(4, 4));
        assert_eq!(d, b, "freed slot is reclaimed first");
        assert_eq!(pop.live_count(), 3);
    }

    #[test]
    fn agent_at_finds_occupant() {
        let mut pop = Population::default();
        let id = pop.spawn(agent_at(5, 7));
        assert_eq!(pop.agent_at(Position::new(5, 7)), Some(id));
        assert_eq!(pop.agent_at(Position::new(7, 5)), None);
    }

    #[test]
    fn enemies_cross_the_alignment_boundary_only() {
        let state = SimState::default();
        let hostile = agent_at(0, 0);
        let pet = agent_at(0, 1).with_alignment(Alignment::Pet);
        let friendly = agent_at(0, 2).with_alignment(Alignment::Friendly);
        assert!(state.are_enemies(&hostile, &pet));
        assert!(state.are_enemies(&friendly, &hostile));
        assert!(!state.are_enemies(&pet, &friendly));
        assert!(!state.are_enemies(&hostile, &hostile.clone()));
    }
}
