//! Direction resolution: turning goals into prioritized keypad queues.
//!
//! The resolver produces, per agent-turn, an ordered queue of up to eight
//! keypad directions for the movement executor to try. Approach and flee
//! goals are first expressed as a `self - goal` displacement vector and
//! then folded into the classic octant priority tables; keeping the exact
//! tables (including their asymmetric tie-breaks) keeps long-standing
//! movement feel intact.

use arrayvec::ArrayVec;
use delve_core::{
    AgentId, AgentState, Dir, Position, RaceFlags, RaceTemplate, SCAN_DIRS, SimError,
    can_cross_terrain, distance,
};

use crate::engine::AiEngine;
use crate::flow;

/// A prioritized list of keypad directions for one agent-turn.
pub type MoveQueue = ArrayVec<Dir, 8>;

/// Queue of four "move at random" entries, used for unaware and drifting
/// agents.
pub(crate) fn random_queue() -> MoveQueue {
    let mut mm = MoveQueue::new();
    for _ in 0..4 {
        mm.push(Dir::Random);
    }
    mm
}

/// Converts a `self - goal` displacement into the octant-keyed priority
/// queue of five keypad directions.
///
/// The octant key packs the vector's sign and dominance bits: +8 when the
/// goal lies south, +4 when it lies west, +2/+1 when one axis dominates the
/// other by more than double.
pub(crate) fn queue_moves(y: i32, x: i32) -> MoveQueue {
    let ay = y.abs();
    let ax = x.abs();

    let mut octant = 0;
    if y < 0 {
        octant += 8;
    }
    if x > 0 {
        octant += 4;
    }
    if ay > ax << 1 {
        octant += 2;
    } else if ax > ay << 1 {
        octant += 1;
    }

    let codes: [u8; 5] = match octant {
        0 => {
            if ay > ax {
                [9, 8, 6, 7, 3]
            } else {
                [9, 6, 8, 3, 7]
            }
        }
        1 | 9 => {
            if y < 0 {
                [6, 3, 9, 2, 8]
            } else {
                [6, 9, 3, 8, 2]
            }
        }
        2 | 6 => {
            if x < 0 {
                [8, 9, 7, 6, 4]
            } else {
                [8, 7, 9, 4, 6]
            }
        }
        4 => {
            if ay > ax {
                [7, 8, 4, 9, 1]
            } else {
                [7, 4, 8, 1, 9]
            }
        }
        5 | 13 => {
            if y < 0 {
                [4, 1, 7, 2, 8]
            } else {
                [4, 7, 1, 8, 2]
            }
        }
        8 => {
            if ay > ax {
                [3, 2, 6, 1, 9]
            } else {
                [3, 6, 2, 9, 1]
            }
        }
        10 | 14 => {
            if x < 0 {
                [2, 1, 3, 4, 6]
            } else {
                [2, 3, 1, 6, 4]
            }
        }
        12 => {
            if ay > ax {
                [1, 2, 4, 3, 7]
            } else {
                [1, 4, 2, 7, 3]
            }
        }
        // +2 and +1 are mutually exclusive, so 3/7/11/15 cannot occur.
        _ => unreachable!("octant bits 1 and 2 are exclusive"),
    };

    codes.iter().filter_map(|&c| Dir::from_code(c)).collect()
}

/// Converts a `goal - self` displacement into the short three-entry
/// approach queue used when closing on a rival agent.
pub(crate) fn queue_approach(y: i32, x: i32) -> MoveQueue {
    let codes: [u8; 3] = match (y.signum(), x.signum()) {
        (-1, 0) => [8, 7, 9],
        (1, 0) => [2, 1, 3],
        (0, 1) => [6, 9, 3],
        (0, -1) => [4, 7, 1],
        (-1, -1) => [7, 4, 8],
        (-1, 1) => [9, 6, 8],
        (1, -1) => [1, 4, 2],
        (1, 1) => [3, 6, 2],
        _ => return MoveQueue::new(),
    };
    codes.iter().filter_map(|&c| Dir::from_code(c)).collect()
}

/// Offsets at Chebyshev radius `d`, for the growing-perimeter searches.
fn ring(d: i32) -> impl Iterator<Item = (i32, i32)> {
    (-d..=d)
        .flat_map(move |dy| (-d..=d).map(move |dx| (dy, dx)))
        .filter(move |&(dy, dx)| dy.abs() == d || dx.abs() == d)
}

impl AiEngine<'_> {
    /// The flow field the race actually reads: door-capable races use the
    /// door-blind `dist` field, everyone else the door-respecting `cost`.
    pub(crate) fn flow_cost(&self, pos: Position, race: &RaceTemplate) -> i32 {
        self.grid
            .tile(pos)
            .map(|t| if race.can_breach_doors() { t.dist } else { t.cost } as i32)
            .unwrap_or(0)
    }

    /// Whether the per-agent no-flow flag is in effect right now: it only
    /// bites once the agent is meaningfully far from the player by flow.
    pub(crate) fn no_flow_active(&self, agent: &AgentState, race: &RaceTemplate) -> bool {
        agent.no_flow && self.flow_cost(agent.pos, race) > 2
    }

    /// Pursuit goal via the cost/scent fields (the flow scan).
    ///
    /// Ranged-capable races first look for a firing position; wall movers,
    /// suppressed agents, and agents the player can already see and hit go
    /// straight for the player; everyone else follows the fields.
    fn pursuit_goal(
        &self,
        id: AgentId,
        agent: &AgentState,
        race: &RaceTemplate,
        no_flow: bool,
    ) -> Position {
        let player = self.state.player.pos;
        let spatial = self.spatial();

        if race.has_ranged_attack() {
            let wall_exempt =
                self.can_phase_walls(id, race) || self.can_tunnel_walls(id, race);
            if let Some(goal) = flow::ranged_attack_goal(
                self.grid,
                &spatial,
                agent.pos,
                player,
                wall_exempt,
                race.can_breach_doors(),
            ) {
                return goal;
            }
        }

        if no_flow
            || self.can_phase_walls(id, race)
            || self.can_tunnel_walls(id, race)
            || (spatial.projectable(player, agent.pos)
                && spatial.line_of_sight(player, agent.pos))
        {
            return player;
        }

        flow::flow_toward(self.grid, self.config, agent.pos, player, race.can_breach_doors())
            .unwrap_or(player)
    }

    /// Farthest reachable cell the player cannot project to, searched on a
    /// growing perimeter. Fleeing agents head here.
    fn find_safety(&self, from: Position) -> Option<Position> {
        let player = self.state.player.pos;
        let spatial = self.spatial();
        for d in 1..10 {
            let mut best: Option<(i32, Position)> = None;
            for (dy, dx) in ring(d) {
                let pos = from.offset(dy, dx);
                let Some(tile) = self.grid.tile(pos) else {
                    continue;
                };
                // Unset flow marks cells sealed off from the player's area.
                if tile.dist == 0 {
                    continue;
                }
                if spatial.projectable(player, pos) {
                    continue;
                }
                let dis = distance(pos, player);
                if best.is_none_or(|(b, _)| dis > b) {
                    best = Some((dis, pos));
                }
            }
            if let Some((_, pos)) = best {
                return Some(pos);
            }
        }
        None
    }

    /// Nearest enterable cell hidden from the player but reachable by a
    /// straight dash. Weak pack animals lurk here instead of charging.
    fn find_hiding(
        &self,
        id: AgentId,
        race: &RaceTemplate,
        from: Position,
    ) -> Option<(i32, i32)> {
        let player = self.state.player.pos;
        let spatial = self.spatial();
        for d in 1..10 {
            let mut best: Option<(i32, Position)> = None;
            for (dy, dx) in ring(d) {
                let pos = from.offset(dy, dx);
                if !self.can_enter(id, race, pos) {
                    continue;
                }
                if spatial.projectable(player, pos) {
                    continue;
                }
                if !spatial.projectable(from, pos) {
                    continue;
                }
                let dis = distance(pos, from);
                if best.is_none_or(|(b, _)| dis < b) {
                    best = Some((dis, pos));
                }
            }
            if let Some((_, pos)) = best {
                return Some((from.y - pos.y, from.x - pos.x));
            }
        }
        None
    }

    /// Refines a flee toward `refuge` into a single swerving step that keeps
    /// a safe berth from the player, scoring each of the eight neighbors.
    fn swerve_away(&self, from: Position, refuge: Position) -> Option<(i32, i32)> {
        let mut score = -1;
        let mut choice = from;
        for i in (0..SCAN_DIRS.len()).rev() {
            let pos = from.step(SCAN_DIRS[i]);
            let Some(tile) = self.grid.tile(pos) else {
                continue;
            };
            let s = flow::swerve_score(pos, refuge, tile.dist as i32);
            if s < score {
                continue;
            }
            score = s;
            choice = pos;
        }
        if score == -1 {
            return None;
        }
        Some((from.y - choice.y, from.x - choice.x))
    }

    /// The main approach-or-flee vector, as `self - goal`. `None` means no
    /// movement impulse this turn.
    pub(crate) fn movable_vector(
        &self,
        id: AgentId,
        agent: &AgentState,
        race: &RaceTemplate,
        will_run: bool,
        no_flow: bool,
    ) -> Option<(i32, i32)> {
        let player = self.state.player.pos;
        let spatial = self.spatial();
        let mut vec = (0i32, 0i32);
        let mut done = false;

        // A remembered rival that is visibly attackable takes priority.
        if !will_run {
            if let Some(target) = agent.target {
                let rival = self
                    .state
                    .agents
                    .agent_at(target)
                    .and_then(|rid| self.state.agents.agent(rid));
                if let Some(rival) = rival {
                    if self.state.are_enemies(agent, rival)
                        && spatial.line_of_sight(agent.pos, target)
                        && spatial.projectable(agent.pos, target)
                    {
                        vec = (agent.pos.y - target.y, agent.pos.x - target.x);
                        done = true;
                    }
                }
            }
        }

        // Pack tactics for hostile group races near the player.
        if !done && !will_run && agent.is_hostile() && race.travels_in_groups() {
            let sees_player = spatial.line_of_sight(agent.pos, player)
                && spatial.projectable(agent.pos, player);
            // Pack gates read the door-blind field whatever the race's door
            // capability.
            let pack_dist = self
                .grid
                .tile(agent.pos)
                .map(|t| t.dist as i32)
                .unwrap_or(0);
            let near_by_flow = pack_dist < self.config.max_sight / 2;
            if sees_player || near_by_flow {
                // Animals without wall powers judge whether the player can be
                // surrounded at all; too little open ground around a healthy
                // player and they lurk out of sight instead.
                if race.is_animal()
                    && !self.can_phase_walls(id, race)
                    && !race.can_kill_walls()
                {
                    let mut room = 0i32;
                    for dir in SCAN_DIRS {
                        if let Some(tile) = self.grid.tile(player.step(dir)) {
                            if can_cross_terrain(tile.feature, race, false, false) {
                                room += 1;
                            }
                        }
                    }
                    if self.grid.tile(player).is_some_and(|t| t.in_room) {
                        room -= 2;
                    }
                    if race.spell_freq == 0 {
                        room -= 2;
                    }
                    let p = &self.state.player;
                    let vitality = (8 * (p.hp + p.sp)) / (p.max_hp + p.max_sp).max(1);
                    if room < vitality {
                        if let Some(v) = self.find_hiding(id, race, agent.pos) {
                            vec = v;
                            done = true;
                        }
                    }
                }

                // Close in: claim a free cell adjacent to the player, the
                // slot-rotated start spreading packmates around them.
                if !done && pack_dist < 3 {
                    let mut goal = player;
                    for i in 0..8 {
                        let dir = SCAN_DIRS[(id.0 as usize + i) & 7];
                        let cand = player.step(dir);
                        goal = cand;
                        if agent.pos == cand {
                            goal = player;
                            break;
                        }
                        if !self.can_enter(id, race, cand) {
                            continue;
                        }
                        break;
                    }
                    vec = (agent.pos.y - goal.y, agent.pos.x - goal.x);
                    done = true;
                }
            }
        }

        if !done {
            let goal = self.pursuit_goal(id, agent, race, no_flow);
            vec = (agent.pos.y - goal.y, agent.pos.x - goal.x);
        }

        if agent.is_pet() && will_run {
            // A commanded keep-away pet backs straight off.
            vec = (-vec.0, -vec.1);
        } else if !done && will_run {
            let fallback = (-vec.0, -vec.1);
            let mut fled = false;
            if !no_flow {
                if let Some(refuge) = self.find_safety(agent.pos) {
                    if let Some(v) = self.swerve_away(agent.pos, refuge) {
                        vec = v;
                        fled = true;
                    }
                }
            }
            if !fled {
                vec = fallback;
            }
        }

        if vec == (0, 0) { None } else { Some(vec) }
    }

    /// Position of the rival a non-hostile (or designated) agent should
    /// close on: the player-designated pet target first, then a population
    /// scan for the first projectable enemy.
    fn rival_position(
        &mut self,
        id: AgentId,
        agent: &AgentState,
        race: &RaceTemplate,
    ) -> Option<Position> {
        if (agent.is_pet() || self.is_ridden(id)) && self.state.player.pet_target.is_some() {
            if let Some(t) = self
                .state
                .player
                .pet_target
                .and_then(|tid| self.state.agents.agent(tid))
            {
                if self.state.are_enemies(agent, t) {
                    return Some(t.pos);
                }
            }
        }

        let n = self.state.agents.slot_count();
        if n == 0 {
            return None;
        }

        // Arena suspension randomizes scan start and direction so duels do
        // not always pick on the lowest slot.
        let (start, step): (i64, i64) = if self.state.player.phase_out {
            let start = self.rng.randint0(n as u32) as i64;
            let step = if self.rng.one_in(2) { 1 } else { -1 };
            (start, step)
        } else {
            (0, 1)
        };

        let wall_exempt = self.can_phase_walls(id, race) || self.can_tunnel_walls(id, race);
        for k in 0..n as i64 {
            let slot = (start + step * k).rem_euclid(n as i64) as usize;
            let tid = AgentId(slot as u32);
            if tid == id {
                continue;
            }
            let Some(rival) = self.state.agents.agent(tid) else {
                continue;
            };

            if agent.is_pet() {
                let pfd = self.state.player.pet_follow_distance;
                // Keep-away pets ignore rivals inside the exclusion ring.
                if pfd < 0 && rival.dist_to_player <= -pfd {
                    continue;
                }
                // Do not chase a rival farther from the player than we are.
                if agent.dist_to_player < rival.dist_to_player && rival.dist_to_player > pfd {
                    continue;
                }
                if race.aaf < rival.dist_to_player {
                    continue;
                }
            }

            if !self.state.are_enemies(agent, rival) {
                continue;
            }

            let reachable = if wall_exempt {
                distance(agent.pos, rival.pos) <= self.config.max_sight
            } else {
                self.spatial().projectable(agent.pos, rival.pos)
            };
            if !reachable {
                continue;
            }

            return Some(rival.pos);
        }
        None
    }

    /// Approach queue toward the chosen rival, or `None` when no rival is
    /// in reach.
    pub(crate) fn enemy_direction(
        &mut self,
        id: AgentId,
        agent: &AgentState,
        race: &RaceTemplate,
    ) -> Option<MoveQueue> {
        let goal = self.rival_position(id, agent, race)?;
        if goal == agent.pos {
            return None;
        }
        Some(queue_approach(goal.y - agent.pos.y, goal.x - agent.pos.x))
    }

    /// Resolves the full movement queue for one agent-turn. `None` means
    /// the agent stands still.
    pub(crate) fn decide_movement(
        &mut self,
        id: AgentId,
        aware: bool,
        will_run: bool,
    ) -> Result<Option<MoveQueue>, SimError> {
        let Some(agent) = self.snapshot(id) else {
            return Ok(None);
        };
        let race = self.race_of(id, &agent)?;

        if !aware {
            return Ok(Some(random_queue()));
        }

        // Erratic races stumble at their flagged rate; both flags stack.
        let erratic_chance = match (
            race.flags.contains(RaceFlags::ERRATIC_50),
            race.flags.contains(RaceFlags::ERRATIC_25),
        ) {
            (true, true) => 75,
            (true, false) => 50,
            (false, true) => 25,
            (false, false) => 0,
        };
        if erratic_chance > 0 && self.rng.randint0(100) < erratic_chance {
            return Ok(Some(random_queue()));
        }

        let no_flow = self.no_flow_active(&agent, race);

        if agent.is_pet() {
            let pfd = self.state.player.pet_follow_distance;
            let avoid = pfd < 0 && agent.dist_to_player <= -pfd;
            let lonely = !avoid && agent.dist_to_player > pfd;
            let distant = agent.dist_to_player > self.config.pet_seek_distance;

            if let Some(mm) = self.enemy_direction(id, &agent, race) {
                return Ok(Some(mm));
            }
            if avoid || lonely || distant {
                let mm = self
                    .movable_vector(id, &agent, race, will_run, no_flow)
                    .map(|(y, x)| queue_moves(y, x))
                    .unwrap_or_else(random_queue);
                return Ok(Some(mm));
            }
            // A content pet with nothing to fight drifts in place.
            return Ok(Some(random_queue()));
        }

        if !agent.is_hostile() {
            let mm = self.enemy_direction(id, &agent, race).unwrap_or_else(random_queue);
            return Ok(Some(mm));
        }

        Ok(self
            .movable_vector(id, &agent, race, will_run, no_flow)
            .map(|(y, x)| queue_moves(y, x)))
    }
}
