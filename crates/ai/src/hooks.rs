//! Collaborator interfaces consumed by the decision engine.
//!
//! Damage formulas, spell selection, item handling, and floor mutation are
//! opaque to this crate: the engine decides *whether* and *where*, the host
//! decides *what happens*. Hooks receive the full mutable [`SimState`] so a
//! resolution can kill the acting agent; every pipeline stage re-checks
//! liveness afterwards.

use delve_core::{AgentId, Position, RaceId, SimState};

/// Result of a melee or ranged resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttackOutcome {
    pub attacker_died: bool,
    pub target_died: bool,
    pub target_fled: bool,
}

/// Combat, spell, and special-ability resolution.
pub trait CombatHooks {
    /// Melee attack against the player. The destination tile held the
    /// player when the engine committed to the attack.
    fn melee_player(&mut self, state: &mut SimState, attacker: AgentId) -> AttackOutcome;

    /// Melee attack against another agent.
    fn melee_monster(
        &mut self,
        state: &mut SimState,
        attacker: AgentId,
        defender: AgentId,
    ) -> AttackOutcome;

    /// Attack spell aimed at the player. Returns true if a spell was cast.
    fn spell_at_player(&mut self, state: &mut SimState, caster: AgentId) -> bool;

    /// Attack spell aimed at the caster's remembered target. Returns true
    /// if a spell was cast.
    fn spell_at_monster(&mut self, state: &mut SimState, caster: AgentId) -> bool;

    /// Race-scripted special ability (e.g. spore burst). Returns true if
    /// the ability fired.
    fn special_ability(&mut self, state: &mut SimState, agent: AgentId) -> bool;

    /// Chameleon disguise roll. Returns the new apparent race, if changed.
    fn shapechange(&mut self, state: &mut SimState, agent: AgentId) -> Option<RaceId>;

    /// One-shot self-destruct resolution. Returns true if the agent died.
    fn self_destruct(&mut self, state: &mut SimState, agent: AgentId) -> bool;

    /// Explosive-rune detonation against `agent` entering `at`. Returns
    /// true if the rune is spent and the tile may now be entered.
    fn rune_detonation(&mut self, state: &mut SimState, agent: AgentId, at: Position) -> bool;

    /// Item pickup or destruction at `at` by a permitted agent.
    fn item_interaction(&mut self, state: &mut SimState, agent: AgentId, at: Position);

    /// The player's mount is no longer rideable; attempt to drop the
    /// player. Returns true if the player fell.
    fn dismount(&mut self, state: &mut SimState, mount: AgentId) -> bool;

    /// A ridden mount moved; drag the player along to `to`.
    fn drag_rider(&mut self, state: &mut SimState, mount: AgentId, to: Position);
}

/// UI-facing notifications. Fire-and-forget; the engine never reads back.
pub trait EventSink {
    fn message(&mut self, text: &str);

    /// Interrupt whatever the player is doing (resting, running).
    fn disturb(&mut self, stop_search: bool, stop_travel: bool);

    /// A visible agent finished a turn without being fought; the host may
    /// apply virtue/compassion bookkeeping.
    fn compassion(&mut self, agent: AgentId);
}

/// Floor mutations requested by the engine. The external floor collaborator
/// owns the grid; the engine only reports what an agent did to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum TerrainChange {
    WallDestroyed,
    DoorOpened,
    DoorBroken,
    GlyphBroken,
}

pub trait FloorSink {
    fn alter(&mut self, at: Position, change: TerrainChange);
}
