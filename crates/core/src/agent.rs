//! Per-agent mutable state.

use crate::geometry::Position;
use crate::race::RaceId;

/// Slot index of an agent in the population. Slots are reused after death,
/// so an id is only meaningful while the agent it named is alive; the spawn
/// epoch disambiguates newborns within a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentId(pub u32);

impl core::fmt::Display for AgentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whose side an agent is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Alignment {
    Hostile,
    /// On the player's side but not under the player's command.
    Friendly,
    /// Under the player's command.
    Pet,
}

/// One live agent ("monster").
///
/// Timed statuses are decrementing counters in the host's hands; the engine
/// only tests them for zero and clears fear/sleep where the pipeline says so.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentState {
    pub race: RaceId,
    pub pos: Position,
    pub hp: i32,
    pub max_hp: i32,
    /// Current speed on the 110-is-normal scale (race base plus haste/slow).
    pub speed: u8,
    pub sleep: u16,
    pub fear: u16,
    pub stun: u16,
    pub alignment: Alignment,
    /// Remembered position of interest (usually a rival agent's tile).
    pub target: Option<Position>,
    /// Summoner, for summoned children. Orphans vanish.
    pub parent: Option<AgentId>,
    /// Energy deficit; the agent acts when this crosses zero and it is then
    /// replenished by the fixed per-turn need.
    pub energy_need: i32,
    /// Suppresses cost-field pathing for this agent (herd dispersal).
    pub no_flow: bool,
    /// Game turn the agent was spawned on. A newborn never acts on the turn
    /// of its birth, even if its slot index has already been swept.
    pub born_at: u64,
    /// Whether the player can currently see this agent.
    pub visible: bool,
    /// Cached distance to the player, maintained by the scheduler/executor.
    pub dist_to_player: i32,
}

impl AgentState {
    pub fn new(race: RaceId, pos: Position, hp: i32, speed: u8, born_at: u64) -> Self {
        Self {
            race,
            pos,
            hp,
            max_hp: hp,
            speed,
            sleep: 0,
            fear: 0,
            stun: 0,
            alignment: Alignment::Hostile,
            target: None,
            parent: None,
            energy_need: 0,
            no_flow: false,
            born_at,
            visible: false,
            dist_to_player: 0,
        }
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_parent(mut self, parent: AgentId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn is_asleep(&self) -> bool {
        self.sleep > 0
    }

    pub fn is_afraid(&self) -> bool {
        self.fear > 0
    }

    pub fn is_stunned(&self) -> bool {
        self.stun > 0
    }

    pub fn is_pet(&self) -> bool {
        self.alignment == Alignment::Pet
    }

    pub fn is_hostile(&self) -> bool {
        self.alignment == Alignment::Hostile
    }

    /// Pet or friendly: fights on the player's side.
    pub fn is_player_side(&self) -> bool {
        !self.is_hostile()
    }
}
