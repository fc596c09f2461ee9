//! Movement execution: consuming the direction queue.
//!
//! Each queued direction is tried against the destination one step from the
//! agent's original tile. Walls, doors, runes, and occupants are resolved
//! in a fixed order; the first turn-completing action (a move, an attack, a
//! door worked on) stops the queue. Plain blocked candidates are filtered
//! and the next direction is tried; engaging an obstacle the agent cannot
//! resolve (a door it cannot breach, a rune that holds) ends the whole
//! queue.

use delve_core::{
    AgentId, AgentState, Dir, Feature, Position, RaceFlags, RaceTemplate, SCAN_DIRS, SimError,
    TURN_ENERGY,
};
use tracing::debug;

use crate::direction::MoveQueue;
use crate::engine::AiEngine;
use crate::hooks::TerrainChange;

/// 1-in-N chance that tunneling through rock is audible.
const GRIND_NOISE: u32 = 20;

/// Ephemeral bookkeeping for one agent-turn.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct TurnFlags {
    /// The player currently rides this agent.
    pub is_riding_mon: bool,
    /// The player can see the agent this turn.
    pub see_m: bool,
    pub aware: bool,
    /// The agent spent its turn (moved, attacked, or worked an obstacle).
    pub do_turn: bool,
    pub do_move: bool,
    pub did_open_door: bool,
    pub did_bash_door: bool,
    pub did_kill_wall: bool,
    pub did_pass_wall: bool,
    pub did_take_item: bool,
    pub did_kill_item: bool,
    /// Entering the destination required destroying terrain first.
    pub must_alter_to_move: bool,
}

enum DoorOutcome {
    /// Door worked on or ignored; keep resolving this direction.
    Resolved,
    /// The agent cannot breach this door; the whole queue ends.
    Blocked,
}

impl AiEngine<'_> {
    /// Runs the queue. Returns the number of directions tried without
    /// completing the turn, which the caller uses to relax the no-flow
    /// flag after repeated dead ends.
    pub(crate) fn execute_movement(
        &mut self,
        id: AgentId,
        flags: &mut TurnFlags,
        moves: &MoveQueue,
    ) -> Result<u32, SimError> {
        let Some(agent) = self.snapshot(id) else {
            return Ok(0);
        };
        let race = self.race_of(id, &agent)?;
        let origin = agent.pos;
        let mut count = 0u32;

        for &queued in moves {
            let dir = if queued == Dir::Random {
                SCAN_DIRS[self.rng.randint0(8) as usize]
            } else {
                queued
            };
            let dest = origin.step(dir);
            let Some(tile) = self.grid.tile(dest) else {
                continue;
            };
            let can_cross = self.can_cross(id, race, tile.feature);
            flags.do_move = false;

            let player_here = dest == self.state.player.pos;
            let occupant = self.state.agents.agent_at(dest);

            if player_here || occupant.is_some() {
                // Attack resolution happens below; entry is nominally fine.
                flags.do_move = true;
            } else if tile.feature.is_wall() {
                if self.can_tunnel_walls(id, race) {
                    flags.do_move = true;
                    flags.did_kill_wall = true;
                    if !can_cross {
                        flags.must_alter_to_move = true;
                    }
                } else if can_cross {
                    flags.do_move = true;
                    if race.can_pass_walls() && !flags.is_riding_mon {
                        flags.did_pass_wall = true;
                    }
                }
                // A wall the agent cannot breach falls through to the
                // failure counter like any other blocked candidate.
            } else if let Feature::ClosedDoor { jam } = tile.feature {
                match self.process_door(id, &agent, race, flags, dest, jam) {
                    DoorOutcome::Resolved => {}
                    DoorOutcome::Blocked => return Ok(count),
                }
            } else {
                flags.do_move = can_cross;
            }

            if flags.do_move && tile.feature == Feature::Glyph && !player_here {
                self.process_glyph(id, &agent, race, flags, dest);
                if !flags.do_move && agent.is_hostile() {
                    // The ward holds; the agent balks entirely.
                    return Ok(count);
                }
            }

            if flags.do_move && tile.feature == Feature::ExplosiveRune && !player_here {
                if !self.combat.rune_detonation(&mut *self.state, id, dest) {
                    flags.do_move = false;
                    return Ok(count);
                }
                if !self.is_alive(id) {
                    return Ok(count);
                }
                flags.must_alter_to_move = true;
            }

            if flags.do_move && player_here {
                flags.do_move = false;
                if !agent.is_hostile() {
                    // Own-side agents never strike the player; blocked.
                    count += 1;
                    continue;
                }
                flags.do_turn = true;
                self.combat.melee_player(&mut *self.state, id);
                return Ok(count);
            }

            if flags.do_move {
                if let Some(occ_id) = occupant {
                    flags.do_move = false;
                    if self.resolve_occupant(id, &agent, race, flags, occ_id, can_cross)? {
                        return Ok(count);
                    }
                }
            }

            // A calm ridden mount goes where the player steers it, not here.
            if flags.is_riding_mon && !agent.is_afraid() {
                flags.do_move = false;
            }

            if flags.do_move && flags.did_kill_wall {
                self.floor.alter(dest, TerrainChange::WallDestroyed);
                if self.rng.one_in(GRIND_NOISE) {
                    self.events.message("There is a grinding sound.");
                }
            }

            // Aquatic races re-check the tile once the obstruction is gone:
            // a drained doorway or dug wall is dry land.
            if flags.must_alter_to_move && race.is_aquatic() && !race.can_fly() {
                flags.do_move = false;
            }

            if flags.do_move && !can_cross && !flags.did_kill_wall && !flags.did_bash_door {
                flags.do_move = false;
            }

            if flags.do_move && race.never_moves() {
                if flags.see_m {
                    let lore = self.state.lore.entry(agent.race);
                    lore.ignored_moves = lore.ignored_moves.saturating_add(1);
                }
                flags.do_move = false;
            }

            if !flags.do_move {
                if flags.do_turn {
                    break;
                }
                count += 1;
                continue;
            }

            flags.do_turn = true;

            // Thickets cost ground-bound outsiders a whole extra turn.
            if tile.feature == Feature::Tree
                && !race.can_fly()
                && !race.flags.contains(RaceFlags::WILD_WOOD)
            {
                if let Some(a) = self.state.agents.agent_mut(id) {
                    a.energy_need += TURN_ENERGY;
                }
            }

            if let Some(a) = self.state.agents.agent_mut(id) {
                a.pos = dest;
            }
            self.refresh_distance(id);
            debug!(agent = %id, from = %origin, to = %dest, "agent moved");

            if flags.is_riding_mon {
                self.combat.drag_rider(&mut *self.state, id, dest);
            }

            self.notify_disturb(&agent, race, flags, dest);
            self.pick_over_items(id, &agent, race, flags, dest, tile.item.is_some());
            if !self.is_alive(id) {
                return Ok(count);
            }

            break;
        }

        // Lore covers worked obstacles too, not just completed moves: a
        // quietly opened door spends the turn without leaving the tile.
        self.record_move_lore(&agent, flags);

        Ok(count)
    }

    fn process_door(
        &mut self,
        _id: AgentId,
        agent: &AgentState,
        race: &RaceTemplate,
        flags: &mut TurnFlags,
        dest: Position,
        jam: u8,
    ) -> DoorOutcome {
        if !race.can_breach_doors() {
            return DoorOutcome::Blocked;
        }

        let strength = (agent.hp / 10).max(1) as u32;
        let mut may_bash = race.can_bash_doors();

        if race.can_open_doors() {
            if jam == 0 {
                // A simply closed door opens quietly; no movement this turn.
                flags.do_turn = true;
                flags.did_open_door = true;
                may_bash = false;
            } else if self.rng.randint0(strength) > jam as u32 {
                // Forced the stuck door open.
                flags.do_turn = true;
                flags.did_open_door = true;
                may_bash = false;
            }
        }

        if !flags.did_open_door && may_bash {
            if self.rng.randint0(strength) > jam as u32 {
                self.events.message("You hear a door burst open!");
                self.state.world.noise = true;
                flags.did_bash_door = true;
                flags.do_move = true;
                flags.must_alter_to_move = true;
            }
            // A failed bash still counts as engaging the door; try the
            // next direction.
        }

        if flags.did_open_door || flags.did_bash_door {
            let change = if flags.did_bash_door && self.rng.one_in(2) {
                TerrainChange::DoorBroken
            } else {
                TerrainChange::DoorOpened
            };
            self.floor.alter(dest, change);
        }

        // Capable but unlucky rolls are filtered, not terminal.
        DoorOutcome::Resolved
    }

    fn process_glyph(
        &mut self,
        _id: AgentId,
        agent: &AgentState,
        race: &RaceTemplate,
        flags: &mut TurnFlags,
        dest: Position,
    ) {
        flags.do_move = false;
        if agent.is_player_side() {
            return;
        }
        if flags.is_riding_mon {
            return;
        }
        if (self.rng.randint1(self.config.rune_break_roll) as i32) < race.level + 20 {
            self.events.message("The rune of protection is broken!");
            self.floor.alter(dest, TerrainChange::GlyphBroken);
            flags.do_move = true;
        }
    }

    /// Returns true when the encounter ends the queue.
    fn resolve_occupant(
        &mut self,
        id: AgentId,
        agent: &AgentState,
        race: &RaceTemplate,
        flags: &mut TurnFlags,
        occ_id: AgentId,
        can_cross: bool,
    ) -> Result<bool, SimError> {
        let Some(occupant) = self.state.agents.agent(occ_id) else {
            return Ok(false);
        };
        let occ_race = self.race_of(occ_id, occupant)?;

        if self.state.are_enemies(agent, occupant) {
            flags.do_turn = true;
            self.combat.melee_monster(&mut *self.state, id, occ_id);
            return Ok(true);
        }

        // A heavyweight trampler clears own-side chaff out of its way.
        let trampler = race.flags.contains(RaceFlags::KILL_BODY)
            && race.level * race.hp > occ_race.level * occ_race.hp
            && can_cross
            && !self.is_ridden(occ_id);
        if trampler {
            flags.do_turn = true;
            self.combat.melee_monster(&mut *self.state, id, occ_id);
            return Ok(true);
        }

        // Blocked by a friend: try another direction.
        Ok(false)
    }

    fn record_move_lore(&mut self, agent: &AgentState, flags: &TurnFlags) {
        if !flags.see_m {
            return;
        }
        let lore = self.state.lore.entry(agent.race);
        if flags.did_pass_wall {
            lore.passed_walls = lore.passed_walls.saturating_add(1);
        }
        if flags.did_kill_wall {
            lore.killed_walls = lore.killed_walls.saturating_add(1);
        }
        if flags.did_open_door {
            lore.opened_doors = lore.opened_doors.saturating_add(1);
        }
        if flags.did_bash_door {
            lore.bashed_doors = lore.bashed_doors.saturating_add(1);
        }
    }

    fn notify_disturb(
        &mut self,
        agent: &AgentState,
        race: &RaceTemplate,
        flags: &TurnFlags,
        dest: Position,
    ) {
        use delve_core::DisturbPolicy as P;
        if !flags.see_m || !agent.is_hostile() {
            return;
        }
        let policy = self.config.disturb;
        let near = policy.contains(P::NEAR)
            && agent.visible
            && self.spatial().projectable(self.state.player.pos, dest);
        let high = policy.contains(P::HIGH) && race.level >= self.state.player.level;
        if policy.contains(P::MOVE) || near || high {
            self.events.disturb(false, true);
        }
    }

    fn pick_over_items(
        &mut self,
        id: AgentId,
        agent: &AgentState,
        race: &RaceTemplate,
        flags: &mut TurnFlags,
        dest: Position,
        item_present: bool,
    ) {
        if !item_present {
            return;
        }
        let takes = race.flags.contains(RaceFlags::TAKE_ITEM);
        let kills = race.flags.contains(RaceFlags::KILL_ITEM);
        if !takes && !kills {
            return;
        }
        if agent.is_pet() && !(self.state.player.pet_pickup_items && takes) {
            return;
        }
        self.combat.item_interaction(&mut *self.state, id, dest);
        if takes {
            flags.did_take_item = true;
        } else {
            flags.did_kill_item = true;
        }
        if flags.see_m {
            let lore = self.state.lore.entry(agent.race);
            if takes {
                lore.took_items = lore.took_items.saturating_add(1);
            } else {
                lore.killed_items = lore.killed_items.saturating_add(1);
            }
        }
    }
}
