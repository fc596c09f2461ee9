//! The per-agent decision pipeline.
//!
//! Strictly ordered stages; a terminal stage ends the agent's turn. Fleeing
//! is resolved early: once `will_run` is decided the agent goes straight to
//! the movement executor with the flee queue, skipping wake, anger,
//! multiplication, and spellcasting.

use delve_core::{
    AgentId, AgentState, Alignment, DisturbPolicy, RaceFlags, RaceTemplate, SCAN_DIRS, SimError,
};
use tracing::debug;

use crate::engine::AiEngine;
use crate::movement::TurnFlags;

impl AiEngine<'_> {
    /// Runs one agent's full decision pipeline.
    pub(crate) fn process_agent(&mut self, id: AgentId) -> Result<(), SimError> {
        let Some(agent) = self.snapshot(id) else {
            return Ok(());
        };
        let race = self.race_of(id, &agent)?;

        let mut flags = TurnFlags {
            is_riding_mon: self.is_ridden(id),
            see_m: agent.visible,
            aware: true,
            ..TurnFlags::default()
        };

        // 1. A mount that stopped being rideable drops the player.
        if flags.is_riding_mon && !race.is_rideable() {
            if self.combat.dismount(&mut *self.state, id) {
                let name = self.name_of(&agent);
                self.events.message(&format!("You have fallen from {name}."));
                flags.is_riding_mon = false;
            }
        }

        // 2. Chameleon disguise roll.
        if race.is_chameleon() && !agent.is_asleep() && self.rng.one_in(13) {
            if let Some(new_race) = self.combat.shapechange(&mut *self.state, id) {
                if let Some(a) = self.state.agents.agent_mut(id) {
                    a.race = new_race;
                }
                debug!(agent = %id, "shapechanged");
            }
        }
        // Re-fetch: the disguise may have swapped the template.
        let Some(agent) = self.snapshot(id) else {
            return Ok(());
        };
        let race = self.race_of(id, &agent)?;

        // 3. Hyper-stealth awareness roll.
        flags.aware = self.perceive_player(race);

        // 4. Orphaned summons vanish without acting.
        if let Some(parent) = agent.parent {
            if !self.state.agents.is_alive(parent) {
                if flags.see_m {
                    let name = self.name_of(&agent);
                    self.events.message(&format!("{name} disappears!"));
                }
                self.state.agents.remove(id);
                return Ok(());
            }
        }

        // 5. One-shot hazards resolve themselves.
        if race.self_destructs() {
            let died = self.combat.self_destruct(&mut *self.state, id);
            if died || !self.is_alive(id) {
                return Ok(());
            }
        }

        // 6. Flee evaluation; a running agent goes straight to movement.
        if !agent.is_asleep() && self.will_run(id, &agent, race) {
            debug!(agent = %id, "fleeing");
            if let Some(moves) = self.decide_movement(id, flags.aware, true)? {
                self.execute_movement(id, &mut flags, &moves)?;
            }
            if !self.is_alive(id) {
                return Ok(());
            }
            return self.post_movement(id, &flags, false);
        }

        // 7. Sleep gate; only aggravation wakes an agent mid-slumber.
        if agent.is_asleep() {
            if !self.state.player.aggravate {
                return Ok(());
            }
            if let Some(a) = self.state.agents.agent_mut(id) {
                a.sleep = 0;
            }
            if flags.see_m {
                let name = self.name_of(&agent);
                self.events.message(&format!("{name} wakes up."));
                let lore = self.state.lore.entry(agent.race);
                lore.wakes = lore.wakes.saturating_add(1);
            }
        }

        // 8. Stun: half the time the whole turn is lost.
        if agent.is_stunned() && self.rng.one_in(2) {
            return Ok(());
        }

        // 9. Hostility flip, suspended during phase-out.
        if !self.state.player.phase_out {
            let enraged = (agent.alignment == Alignment::Friendly
                && self.state.player.aggravate)
                || (agent.is_pet() && race.flags.contains(RaceFlags::RES_ALL));
            if enraged {
                if let Some(a) = self.state.agents.agent_mut(id) {
                    a.alignment = Alignment::Hostile;
                }
                let name = self.name_of(&agent);
                self.events.message(&format!("{name} suddenly becomes hostile!"));
            }
        }
        let Some(agent) = self.snapshot(id) else {
            return Ok(());
        };

        // 10. Multiplication.
        if race.can_multiply()
            && self.state.world.repro_count < self.config.repro_cap
            && self.decide_multiplication(id, &agent, race, flags.see_m)
        {
            return Ok(());
        }

        // 11a. Scripted special ability.
        if race.spell_freq > 0
            && self.rng.randint1(100) <= race.spell_freq as u32
            && self.combat.special_ability(&mut *self.state, id)
        {
            return Ok(());
        }
        if !self.is_alive(id) {
            return Ok(());
        }

        // 11b. Ambient noise and speech.
        self.emit_presence(id, &agent, race, &flags);

        // 11c. Scheduled spellcast.
        if self.scheduled_spellcast(id, &agent, race, flags.aware)? {
            return Ok(());
        }
        if !self.is_alive(id) {
            return Ok(());
        }

        // 12. Movement.
        let Some(moves) = self.decide_movement(id, flags.aware, false)? else {
            return Ok(());
        };
        let count = self.execute_movement(id, &mut flags, &moves)?;
        if !self.is_alive(id) {
            return Ok(());
        }

        // Repeated dead ends make a suppressed agent trust the flow again.
        if agent.no_flow && count > 2 && agent.target.is_some() {
            if let Some(a) = self.state.agents.agent_mut(id) {
                a.no_flow = false;
            }
        }

        // 13-15. Fallback cast, fear resolution, compassion.
        self.post_movement(id, &flags, true)
    }

    /// Whether this agent spends the turn running from the player.
    pub(crate) fn will_run(&self, id: AgentId, agent: &AgentState, race: &RaceTemplate) -> bool {
        if agent.is_pet() {
            // Keep-away pets are the only pets that run.
            let pfd = self.state.player.pet_follow_distance;
            return pfd < 0 && agent.dist_to_player <= -pfd;
        }
        if agent.dist_to_player > self.config.max_sight + 5 {
            return false;
        }
        if agent.is_afraid() {
            return true;
        }
        if agent.dist_to_player <= 5 {
            return false;
        }

        // Level bands, with a per-slot wobble so equal races don't all
        // break at once.
        let p_lev = self.state.player.level;
        let m_lev = race.level + ((id.0 as i32) & 0x08) + 25;
        if m_lev > p_lev + 4 {
            return false;
        }
        if m_lev + 4 <= p_lev {
            return true;
        }

        let p = &self.state.player;
        let p_val = p_lev * p.max_hp + (p.hp << 2);
        let m_val = m_lev * agent.max_hp + (agent.hp << 2);
        p_val * agent.max_hp > m_val * p.max_hp
    }

    /// Awareness under the player's hyper-stealth status.
    fn perceive_player(&mut self, race: &RaceTemplate) -> bool {
        let p = &self.state.player;
        if !p.hyper_stealth {
            return true;
        }
        let mut t = p.level * 6 + (p.stealth_skill + 10) * 4;
        if p.monster_lite {
            t /= 3;
        }
        if p.aggravate {
            t /= 2;
        }
        if race.level > p.level * p.level / 20 + 10 {
            t /= 3;
        }
        (self.rng.randint0(t.max(1) as u32) as i32) <= race.level + 20
    }

    /// 3x3 crowding check and clone spawn. Returns true when a clone was
    /// born (terminal).
    fn decide_multiplication(
        &mut self,
        id: AgentId,
        agent: &AgentState,
        race: &RaceTemplate,
        seen: bool,
    ) -> bool {
        let mut k = 0u32;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if self.state.agents.agent_at(agent.pos.offset(dy, dx)).is_some() {
                    k += 1;
                }
            }
        }
        if self.state.world.multiply_barrier {
            k = 8;
        }
        if k >= 4 {
            return false;
        }
        if k != 0 && !self.rng.one_in(k * self.config.mult_adjustment) {
            return false;
        }

        for dir in SCAN_DIRS {
            let pos = agent.pos.step(dir);
            if !self.can_enter(id, race, pos) {
                continue;
            }
            let child = AgentState::new(
                agent.race,
                pos,
                agent.max_hp,
                race.speed,
                self.state.world.game_turn,
            )
            .with_alignment(agent.alignment);
            let child_id = self.state.agents.spawn(child);
            self.state.world.repro_count += 1;
            if seen {
                let lore = self.state.lore.entry(agent.race);
                lore.splits = lore.splits.saturating_add(1);
            }
            debug!(agent = %id, child = %child_id, "multiplied");
            return true;
        }
        false
    }

    /// Ambient heavy-step noise and speech lines.
    fn emit_presence(
        &mut self,
        _id: AgentId,
        agent: &AgentState,
        race: &RaceTemplate,
        flags: &TurnFlags,
    ) {
        if self.state.player.phase_out {
            return;
        }

        if race.flags.contains(RaceFlags::NOISY)
            && !agent.visible
            && agent.dist_to_player <= self.config.max_sight
            && self.rng.one_in(self.config.noise_chance)
        {
            self.events.message("You hear heavy steps.");
            if self.config.disturb.contains(DisturbPolicy::MINOR) {
                self.events.disturb(false, false);
            }
        }

        let spatial = self.spatial();
        if race.can_speak()
            && flags.aware
            && self.rng.one_in(self.config.speak_chance)
            && spatial.line_of_sight(self.state.player.pos, agent.pos)
            && spatial.projectable(agent.pos, self.state.player.pos)
        {
            let name = self.name_of(agent);
            let line = if agent.is_afraid() {
                format!("{name} cries out in terror!")
            } else if agent.is_player_side() {
                format!("{name} mutters to itself.")
            } else {
                format!("{name} growls a challenge.")
            };
            self.events.message(&line);
        }
    }

    /// Frequency-gated attack spell, preferring a live counterattack target
    /// in range, then the player. Returns true when a spell was cast.
    fn scheduled_spellcast(
        &mut self,
        id: AgentId,
        agent: &AgentState,
        race: &RaceTemplate,
        aware: bool,
    ) -> Result<bool, SimError> {
        if race.spell_freq == 0 || self.rng.randint1(100) > race.spell_freq as u32 {
            return Ok(false);
        }

        let counterattack = agent.target.is_some_and(|t| {
            self.state
                .agents
                .agent_at(t)
                .and_then(|tid| self.state.agents.agent(tid))
                .is_some_and(|rival| self.state.are_enemies(agent, rival))
                && self.spatial().projectable(agent.pos, t)
        });

        let cast = if counterattack {
            self.combat.spell_at_monster(&mut *self.state, id)
                || (aware && self.combat.spell_at_player(&mut *self.state, id))
        } else {
            (aware && self.combat.spell_at_player(&mut *self.state, id))
                || self.combat.spell_at_monster(&mut *self.state, id)
        };
        Ok(cast)
    }

    /// Stages 13-15: fallback cast, fear resolution, compassion.
    fn post_movement(
        &mut self,
        id: AgentId,
        flags: &TurnFlags,
        allow_fallback_cast: bool,
    ) -> Result<(), SimError> {
        let Some(agent) = self.snapshot(id) else {
            return Ok(());
        };
        let race = self.race_of(id, &agent)?;

        if allow_fallback_cast
            && !flags.do_turn
            && !flags.do_move
            && !agent.is_afraid()
            && !flags.is_riding_mon
            && flags.aware
            && race.spell_freq > 0
            && self.rng.randint1(100) <= race.spell_freq as u32
            && self.combat.spell_at_player(&mut *self.state, id)
        {
            return Ok(());
        }
        if !self.is_alive(id) {
            return Ok(());
        }

        if !flags.do_turn && !flags.do_move && agent.is_afraid() && flags.aware {
            if let Some(a) = self.state.agents.agent_mut(id) {
                a.fear = 0;
            }
            if flags.see_m {
                let name = self.name_of(&agent);
                self.events.message(&format!("{name} turns to fight!"));
                self.events.compassion(id);
            }
        }
        Ok(())
    }
}
