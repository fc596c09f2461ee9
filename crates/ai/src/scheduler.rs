//! Energy-driven turn sweep over the population.

use delve_core::{AgentId, AgentState, RaceTemplate, SimError, TURN_ENERGY, speed_to_energy};
use tracing::debug;

use crate::engine::AiEngine;

impl AiEngine<'_> {
    /// Processes every live agent once for the current game turn.
    ///
    /// Agents are visited from the highest slot down so removals never
    /// disturb not-yet-visited indices; newborns stamped with the current
    /// turn sit the sweep out. The leaving/dead/not-playing flags are
    /// re-checked around every agent because a single action can end the
    /// floor.
    pub fn run_turn(&mut self) -> Result<(), SimError> {
        let _span =
            tracing::debug_span!("run_turn", turn = self.state.world.game_turn).entered();

        for slot in (0..self.state.agents.slot_count()).rev() {
            if self.state.should_abort_sweep() {
                return Ok(());
            }

            let id = AgentId(slot as u32);
            let Some(agent) = self.snapshot(id) else {
                continue;
            };
            if agent.born_at == self.state.world.game_turn {
                continue;
            }
            if agent.dist_to_player >= self.config.active_radius {
                continue;
            }
            let race = self.race_of(id, &agent)?;

            // With the global suppression off the per-agent flag decays.
            if !self.state.player.no_flow_suppression {
                if let Some(a) = self.state.agents.agent_mut(id) {
                    a.no_flow = false;
                }
            }

            if !self.should_process(&agent, race) {
                continue;
            }

            // A ridden mount paces itself to the player.
            let speed = if self.is_ridden(id) {
                self.state.player.speed
            } else {
                agent.speed
            };
            let gain = speed_to_energy(speed);
            let fired = match self.state.agents.agent_mut(id) {
                Some(a) => {
                    a.energy_need -= gain;
                    if a.energy_need > 0 {
                        false
                    } else {
                        a.energy_need += TURN_ENERGY;
                        true
                    }
                }
                None => false,
            };
            if !fired {
                continue;
            }

            debug!(agent = %id, "processing");
            self.process_agent(id)?;

            // The remembered target never outlives the turn it was set for.
            if let Some(a) = self.state.agents.agent_mut(id) {
                a.target = None;
            }

            if self.state.player.no_flow_suppression && self.rng.one_in(3) {
                if let Some(a) = self.state.agents.agent_mut(id) {
                    a.no_flow = true;
                }
            }

            if self.state.should_abort_sweep() {
                return Ok(());
            }
        }
        Ok(())
    }

    /// Whether the agent is close or alert enough to spend energy at all.
    fn should_process(&self, agent: &AgentState, race: &RaceTemplate) -> bool {
        let aaf = if agent.is_pet() {
            race.aaf.min(self.config.max_sight)
        } else {
            race.aaf
        };
        if agent.dist_to_player <= aaf {
            return true;
        }

        if (agent.dist_to_player <= self.config.max_sight || self.state.player.phase_out)
            && (self
                .spatial()
                .line_of_sight(self.state.player.pos, agent.pos)
                || self.state.player.aggravate)
        {
            return true;
        }

        agent.target.is_some()
    }
}
