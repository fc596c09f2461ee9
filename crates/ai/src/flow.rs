//! Cost-field and scent-trail pursuit scans.
//!
//! The floor collaborator maintains two grid-wide fields: `cost`, a
//! door-respecting path-distance proxy toward the player (`dist` is the same
//! ignoring doors), and `when`, a monotonically increasing timestamp of
//! player presence. Agents approximate shortest-path pursuit by greedily
//! descending `cost`; when they stand on an unset tile they can fall back
//! to chasing the freshest scent instead.
//!
//! All scans walk the eight neighbors in the fixed [`SCAN_DIRS`] order from
//! index 7 down to 0 and keep the *last* equal-best candidate. The
//! resulting directional bias on ties is inherited behavior, preserved for
//! parity.

use delve_core::{GridOracle, Position, SCAN_DIRS, SimConfig, SpatialQuery, Tile, distance};

/// Sub-cell scaling applied to flow displacements so the later conversion
/// into eight discrete directions keeps a diagonal bias.
pub const FLOW_SCALE: i32 = 16;

fn tile_at(grid: &dyn GridOracle, pos: Position) -> Option<Tile> {
    if !grid.contains(pos) {
        return None;
    }
    grid.tile(pos)
}

/// Greedy descent step on the pursuit fields.
///
/// With a nonzero own-tile cost, picks the neighbor with the lowest nonzero
/// cost (door-capable agents read the door-blind `dist` field instead).
/// With a zero cost but a warm scent, picks the neighbor with the highest
/// `when`; scent colder than `scent_horizon` ticks behind the player's own
/// trail is ignored. Returns the goal expressed as the player's position
/// displaced by `FLOW_SCALE` times the chosen offset, or `None` when the
/// fields offer nothing.
pub fn flow_toward(
    grid: &dyn GridOracle,
    config: &SimConfig,
    agent_pos: Position,
    player_pos: Position,
    door_capable: bool,
) -> Option<Position> {
    let here = tile_at(grid, agent_pos)?;

    let use_scent;
    let mut best: i32;
    if here.cost != 0 {
        use_scent = false;
        best = 999;
    } else if here.when != 0 {
        let player_when = tile_at(grid, player_pos).map(|t| t.when).unwrap_or(0);
        if player_when.saturating_sub(here.when) > config.scent_horizon {
            return None;
        }
        use_scent = true;
        best = 0;
    } else {
        return None;
    }

    let mut goal = None;
    for i in (0..SCAN_DIRS.len()).rev() {
        let dir = SCAN_DIRS[i];
        let pos = agent_pos.step(dir);
        let Some(tile) = tile_at(grid, pos) else {
            continue;
        };

        if use_scent {
            let when = tile.when as i32;
            if best > when {
                continue;
            }
            best = when;
        } else {
            let cost = if door_capable { tile.dist } else { tile.cost } as i32;
            if cost == 0 || best < cost {
                continue;
            }
            best = cost;
        }

        let (dy, dx) = dir.delta();
        goal = Some(player_pos.offset(FLOW_SCALE * dy, FLOW_SCALE * dx));
    }

    goal
}

/// Search for a tile to lob ranged attacks from.
///
/// Only meaningful when the agent has no direct line to the player: scans
/// the agent's own tile cost and its eight neighbors, preferring reachable
/// cells no costlier than the current tile that themselves have a
/// projectable line to the player. Wall-exempt agents ignore the cost
/// gating; closed doors disqualify candidates unless the agent can breach
/// doors. A neighbor holding the player aborts the search; melee applies.
pub fn ranged_attack_goal(
    grid: &dyn GridOracle,
    spatial: &SpatialQuery<'_>,
    agent_pos: Position,
    player_pos: Position,
    wall_exempt: bool,
    door_capable: bool,
) -> Option<Position> {
    if spatial.projectable(agent_pos, player_pos) {
        return None;
    }

    let mut now_cost = tile_at(grid, agent_pos).map(|t| t.cost).unwrap_or(0) as i32;
    if now_cost == 0 {
        now_cost = 999;
    }

    let mut best = 999;
    let mut goal = None;
    for i in (0..SCAN_DIRS.len()).rev() {
        let pos = agent_pos.step(SCAN_DIRS[i]);
        let Some(tile) = tile_at(grid, pos) else {
            continue;
        };
        if pos == player_pos {
            return None;
        }

        let mut cost = tile.cost as i32;
        if !wall_exempt {
            if cost == 0 {
                continue;
            }
            if !door_capable && tile.feature.is_closed_door() {
                continue;
            }
        }
        if cost == 0 {
            cost = 998;
        }

        if now_cost < cost {
            continue;
        }
        if !spatial.projectable(pos, player_pos) {
            continue;
        }
        if best < cost {
            continue;
        }

        best = cost;
        goal = Some(pos);
    }

    goal
}

/// Flee scoring for one candidate step while swerving around the player:
/// stay close to the desired refuge, stay on cheap terrain.
pub fn swerve_score(candidate: Position, desired: Position, terrain_dist: i32) -> i32 {
    let s = 5000 / (distance(candidate, desired) + 3) - 500 / (terrain_dist + 1);
    s.max(0)
}
