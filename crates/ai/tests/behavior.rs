//! End-to-end sweeps over small scripted floors.

mod common;

use std::collections::HashMap;

use common::World;
use delve_ai::TerrainChange;
use delve_core::{
    Alignment, Feature, ItemHandle, Position, RaceFlags, RaceId, RaceTemplate,
};

#[test]
fn adjacent_hostile_attacks_the_player() {
    let mut w = World::new(11);
    let orc = w.add_race("orc", 5, RaceFlags::empty());
    let id = w.spawn(orc, Position::new(10, 11), Alignment::Hostile);

    w.sweep();

    assert_eq!(w.combat.player_melees, vec![id]);
    assert_eq!(w.pos_of(id), Position::new(10, 11), "attacking is not moving");
}

#[test]
fn energy_gates_actions_to_speed() {
    let mut w = World::new(12);
    let orc = w.add_race("orc", 5, RaceFlags::empty());
    w.spawn(orc, Position::new(10, 11), Alignment::Hostile);

    // Normal speed gains 10 energy per sweep against a need of 100, and an
    // agent fires the moment the deficit reaches zero: the second action
    // lands on the tenth sweep.
    for _ in 0..9 {
        w.sweep();
    }
    assert_eq!(w.combat.player_melees.len(), 1);
    w.sweep();
    assert_eq!(w.combat.player_melees.len(), 2);
}

#[test]
fn newborns_sit_out_their_birth_turn() {
    let mut w = World::new(13);
    let orc = w.add_race("orc", 5, RaceFlags::empty());
    let id = w.spawn(orc, Position::new(10, 11), Alignment::Hostile);
    w.agent_mut(id).born_at = w.state.world.game_turn;

    w.sweep();
    assert!(w.combat.player_melees.is_empty());

    w.recharge();
    w.sweep();
    assert_eq!(w.combat.player_melees.len(), 1);
}

#[test]
fn dead_player_aborts_the_sweep() {
    let mut w = World::new(14);
    let orc = w.add_race("orc", 5, RaceFlags::empty());
    w.spawn(orc, Position::new(10, 11), Alignment::Hostile);
    w.state.player.dead = true;

    w.sweep();

    assert!(w.combat.player_melees.is_empty());
}

#[test]
fn outmatched_agent_breaks_away() {
    let mut w = World::new(21);
    w.state.player.level = 50;
    let rat = w.add_race("giant rat", 1, RaceFlags::empty());
    let id = w.spawn(rat, Position::new(10, 18), Alignment::Hostile);

    w.sweep();

    assert_eq!(w.pos_of(id), Position::new(10, 19), "runs straight away");
    assert!(w.combat.player_melees.is_empty());
}

#[test]
fn confident_agent_closes_in() {
    let mut w = World::new(22);
    w.state.player.level = 50;
    let giant = w.add_race("hill giant", 40, RaceFlags::empty());
    let id = w.spawn(giant, Position::new(10, 18), Alignment::Hostile);

    w.sweep();

    assert_eq!(w.pos_of(id), Position::new(10, 17));
    assert!(w.events.disturbs >= 1, "visible hostile movement disturbs");
}

#[test]
fn close_quarters_suppress_flight() {
    // The same outmatched race stands its ground inside the close radius.
    let mut w = World::new(23);
    w.state.player.level = 50;
    let rat = w.add_race("giant rat", 1, RaceFlags::empty());
    let id = w.spawn(rat, Position::new(10, 14), Alignment::Hostile);

    w.sweep();

    assert_eq!(w.pos_of(id), Position::new(10, 13));
}

#[test]
fn afraid_agent_runs_even_when_adjacent() {
    let mut w = World::new(24);
    let orc = w.add_race("orc", 5, RaceFlags::empty());
    let id = w.spawn(orc, Position::new(10, 11), Alignment::Hostile);
    w.agent_mut(id).fear = 10;

    w.sweep();

    assert_eq!(w.pos_of(id), Position::new(10, 12));
    assert!(w.combat.player_melees.is_empty());
    assert_eq!(w.agent(id).fear, 10, "a successful flee keeps the fear");
}

#[test]
fn cornered_afraid_agent_turns_to_fight() {
    let mut w = World::new(25);
    let orc = w.add_race("orc", 5, RaceFlags::empty());
    let id = w.spawn(orc, Position::new(10, 11), Alignment::Hostile);
    w.agent_mut(id).fear = 10;
    // Wall in every neighbor except the player's own tile to the west.
    for (y, x) in [(9, 10), (9, 11), (9, 12), (10, 12), (11, 10), (11, 11), (11, 12)] {
        w.grid.set_feature(Position::new(y, x), Feature::Wall);
    }

    w.sweep();

    assert_eq!(w.pos_of(id), Position::new(10, 11));
    assert_eq!(w.agent(id).fear, 0);
    assert!(w.events.saw("turns to fight!"));
    assert_eq!(w.events.compassion, vec![id]);
}

#[test]
fn keep_away_pet_step_mirrors_its_approach_step() {
    let start = Position::new(10, 18);

    let mut follow = World::new(31);
    let dog = follow.add_race("warhound", 8, RaceFlags::empty());
    let id = follow.spawn(dog, start, Alignment::Pet);
    follow.state.player.pet_follow_distance = 2;
    follow.sweep();
    let toward = (follow.pos_of(id).y - start.y, follow.pos_of(id).x - start.x);

    let mut avoid = World::new(31);
    let dog = avoid.add_race("warhound", 8, RaceFlags::empty());
    let id = avoid.spawn(dog, start, Alignment::Pet);
    avoid.state.player.pet_follow_distance = -10;
    avoid.sweep();
    let away = (avoid.pos_of(id).y - start.y, avoid.pos_of(id).x - start.x);

    assert_eq!(toward, (0, -1));
    assert_eq!(away, (-toward.0, -toward.1));
}

#[test]
fn content_pet_drifts_uniformly() {
    // A pet inside its follow ring with nothing to fight takes a random
    // step; over many seeds every one of the eight steps shows up at a
    // sane rate.
    let mut counts: HashMap<(i32, i32), u32> = HashMap::new();
    for seed in 0..800 {
        let mut w = World::new(seed);
        let dog = w.add_race("warhound", 8, RaceFlags::empty());
        let start = Position::new(16, 10);
        let id = w.spawn(dog, start, Alignment::Pet);
        w.sweep();
        let pos = w.pos_of(id);
        *counts.entry((pos.y - start.y, pos.x - start.x)).or_default() += 1;
    }

    assert_eq!(counts.len(), 8, "all eight steps taken: {counts:?}");
    for (delta, n) in &counts {
        assert!((50..=160).contains(n), "step {delta:?} taken {n} of 800");
    }
}

#[test]
fn orphaned_summon_vanishes_without_acting() {
    let mut w = World::new(32);
    let imp = w.add_race("imp", 5, RaceFlags::empty());
    let id = w.spawn(imp, Position::new(10, 11), Alignment::Hostile);
    w.agent_mut(id).parent = Some(delve_core::AgentId(77));

    w.sweep();

    assert!(!w.state.agents.is_alive(id));
    assert!(w.combat.player_melees.is_empty());
    assert!(w.events.saw("disappears!"));
}

#[test]
fn only_aggravation_wakes_sleepers() {
    let mut w = World::new(33);
    let orc = w.add_race("orc", 5, RaceFlags::empty());
    let id = w.spawn(orc, Position::new(10, 11), Alignment::Hostile);
    w.agent_mut(id).sleep = 10;

    w.sweep();
    assert!(w.combat.player_melees.is_empty());
    assert_eq!(w.agent(id).sleep, 10);

    w.state.player.aggravate = true;
    w.recharge();
    w.sweep();

    assert_eq!(w.agent(id).sleep, 0);
    assert!(w.events.saw("wakes up."));
    assert_eq!(w.state.lore.get(orc).wakes, 1);
    // Once awake the same turn continues into the attack.
    assert_eq!(w.combat.player_melees.len(), 1);
}

#[test]
fn fully_resistant_pet_turns_on_the_player() {
    let mut w = World::new(34);
    // Resistance alone flips a pet; no unique standing required.
    let wisp = w.add_race("chaos wisp", 12, RaceFlags::RES_ALL);
    let id = w.spawn(wisp, Position::new(10, 14), Alignment::Pet);

    w.sweep();

    assert!(w.agent(id).is_hostile());
    assert!(w.events.saw("suddenly becomes hostile!"));
}

#[test]
fn pack_gates_read_the_door_blind_field() {
    let mut w = World::new(62);
    let wolf = w.add_race("wolf", 10, RaceFlags::FRIENDS | RaceFlags::ANIMAL);
    let id = w.spawn(wolf, Position::new(10, 12), Alignment::Hostile);
    // Door-respecting cost says far away, door-blind distance says close:
    // the pack logic must trust the latter and claim a flanking cell
    // instead of charging straight in.
    w.grid.set_flow(Position::new(10, 12), 12, 2);

    w.sweep();

    assert_eq!(w.pos_of(id), Position::new(11, 11));
}

#[test]
fn walled_off_queue_restores_flow_trust() {
    let mut w = World::new(61);
    w.state.player.no_flow_suppression = true;
    let orc = w.add_race("orc", 5, RaceFlags::empty());
    let id = w.spawn(orc, Position::new(10, 14), Alignment::Hostile);
    // Every direction the approach queue tries is solid rock.
    for (y, x) in [(10, 13), (9, 13), (11, 13), (9, 14), (11, 14)] {
        w.grid.set_feature(Position::new(y, x), Feature::Wall);
    }
    w.agent_mut(id).no_flow = true;
    w.agent_mut(id).target = Some(Position::new(12, 14));

    w.sweep();

    assert!(
        !w.agent(id).no_flow,
        "burning the whole queue on walls relaxes the suppression"
    );
}

#[test]
fn door_capable_agent_opens_quietly() {
    let mut w = World::new(41);
    let door = Position::new(10, 11);
    w.grid.set_feature(door, Feature::ClosedDoor { jam: 0 });
    let ghoul = w.add_race("ghoul", 10, RaceFlags::OPEN_DOOR);
    let id = w.spawn(ghoul, Position::new(10, 12), Alignment::Hostile);

    w.sweep();

    assert_eq!(w.floor.changes, vec![(door, TerrainChange::DoorOpened)]);
    assert_eq!(w.pos_of(id), Position::new(10, 12), "opening takes the turn");
    assert_eq!(w.state.lore.get(ghoul).opened_doors, 1);
    assert!(w.combat.player_melees.is_empty());
}

#[test]
fn basher_bursts_through_the_door() {
    let mut w = World::new(42);
    let door = Position::new(10, 11);
    w.grid.set_feature(door, Feature::ClosedDoor { jam: 0 });
    // Box the basher in so a failed roll cannot leak it around the door.
    for (y, x) in [(9, 11), (9, 12), (9, 13), (10, 13), (11, 11), (11, 12), (11, 13)] {
        w.grid.set_feature(Position::new(y, x), Feature::Wall);
    }
    let minotaur = w.add_race("minotaur", 10, RaceFlags::BASH_DOOR);
    let id = w.spawn(minotaur, Position::new(10, 12), Alignment::Hostile);

    for _ in 0..30 {
        if !w.floor.changes.is_empty() {
            break;
        }
        w.recharge();
        w.sweep();
    }

    let (at, change) = w.floor.changes[0];
    assert_eq!(at, door);
    assert!(matches!(change, TerrainChange::DoorOpened | TerrainChange::DoorBroken));
    assert!(w.events.saw("door burst open"));
    assert_eq!(w.pos_of(id), door, "bashing carries the agent through");
    assert_eq!(w.state.lore.get(minotaur).bashed_doors, 1);
}

#[test]
fn ghost_phases_through_rock() {
    let mut w = World::new(43);
    w.grid.set_feature(Position::new(10, 11), Feature::Wall);
    w.grid.set_feature(Position::new(10, 12), Feature::Wall);
    let ghost = w.add_race("ghost", 15, RaceFlags::PASS_WALL);
    let id = w.spawn(ghost, Position::new(10, 13), Alignment::Hostile);

    w.sweep();

    assert_eq!(w.pos_of(id), Position::new(10, 12));
    assert!(w.floor.changes.is_empty(), "phasing leaves the wall standing");
    assert_eq!(w.state.lore.get(ghost).passed_walls, 1);
}

#[test]
fn borer_digs_through_rock() {
    let mut w = World::new(44);
    let wall = Position::new(10, 11);
    w.grid.set_feature(wall, Feature::Wall);
    let worm = w.add_race("rock worm", 15, RaceFlags::KILL_WALL);
    let id = w.spawn(worm, Position::new(10, 12), Alignment::Hostile);

    w.sweep();

    assert_eq!(w.pos_of(id), wall);
    assert_eq!(w.floor.changes, vec![(wall, TerrainChange::WallDestroyed)]);
    assert_eq!(w.state.lore.get(worm).killed_walls, 1);
}

#[test]
fn ward_breaks_before_a_strong_intruder() {
    let mut w = World::new(45);
    let glyph = Position::new(10, 11);
    w.grid.set_feature(glyph, Feature::Glyph);
    // Level high enough that the breakage roll cannot fail.
    let troll = w.add_race("grave troll", 200, RaceFlags::empty());
    let id = w.spawn(troll, Position::new(10, 12), Alignment::Hostile);

    w.sweep();

    assert_eq!(w.pos_of(id), glyph);
    assert_eq!(w.floor.changes, vec![(glyph, TerrainChange::GlyphBroken)]);
    assert!(w.events.saw("rune of protection is broken"));
}

#[test]
fn holding_explosive_rune_ends_the_turn() {
    let mut w = World::new(46);
    w.grid.set_feature(Position::new(10, 11), Feature::ExplosiveRune);
    let orc = w.add_race("orc", 5, RaceFlags::empty());
    let id = w.spawn(orc, Position::new(10, 12), Alignment::Hostile);
    w.combat.rune_spends = false;

    w.sweep();

    assert_eq!(w.combat.rune_checks.len(), 1);
    assert_eq!(w.pos_of(id), Position::new(10, 12), "held at the rune");
}

#[test]
fn spent_explosive_rune_admits_the_intruder() {
    let mut w = World::new(47);
    let rune = Position::new(10, 11);
    w.grid.set_feature(rune, Feature::ExplosiveRune);
    let orc = w.add_race("orc", 5, RaceFlags::empty());
    let id = w.spawn(orc, Position::new(10, 12), Alignment::Hostile);
    w.combat.rune_spends = true;

    w.sweep();

    assert_eq!(w.pos_of(id), rune);
}

#[test]
fn thickets_cost_a_whole_extra_turn() {
    let mut w = World::new(48);
    let tree = Position::new(10, 11);
    w.grid.set_feature(tree, Feature::Tree);
    let orc = w.add_race("orc", 5, RaceFlags::empty());
    let id = w.spawn(orc, Position::new(10, 12), Alignment::Hostile);

    w.sweep();

    assert_eq!(w.pos_of(id), tree);
    // 100 replenished on firing, minus the 10 gained, plus 100 for the tree.
    assert_eq!(w.agent(id).energy_need, 190);
}

#[test]
fn scavenger_picks_over_items_on_its_path() {
    let mut w = World::new(49);
    let cache = Position::new(10, 11);
    w.grid.set_item(cache, ItemHandle(7));
    let crow = w.add_race("crow", 5, RaceFlags::TAKE_ITEM);
    let id = w.spawn(crow, Position::new(10, 12), Alignment::Hostile);

    w.sweep();

    assert_eq!(w.combat.item_calls, vec![(id, cache)]);
    assert_eq!(w.state.lore.get(crow).took_items, 1);
}

#[test]
fn lone_breeder_multiplies() {
    let mut w = World::new(51);
    let mold = w.add_race("mold", 2, RaceFlags::MULTIPLY | RaceFlags::NEVER_MOVE);
    w.spawn(mold, Position::new(14, 10), Alignment::Hostile);

    for _ in 0..300 {
        if w.state.agents.live_count() > 1 {
            break;
        }
        w.recharge();
        w.sweep();
    }

    assert!(w.state.agents.live_count() > 1);
    assert!(w.state.world.repro_count >= 1);
    assert!(w.state.lore.get(mold).splits >= 1);
}

#[test]
fn crowding_stops_multiplication() {
    let mut w = World::new(52);
    let mold = w.add_race("mold", 2, RaceFlags::MULTIPLY | RaceFlags::NEVER_MOVE);
    let statue = w.add_race("statue", 2, RaceFlags::NEVER_MOVE);
    w.spawn(mold, Position::new(14, 10), Alignment::Hostile);
    // Three neighbors plus the breeder itself crosses the crowding cutoff.
    w.spawn(statue, Position::new(14, 9), Alignment::Hostile);
    w.spawn(statue, Position::new(14, 11), Alignment::Hostile);
    w.spawn(statue, Position::new(13, 10), Alignment::Hostile);

    for _ in 0..1000 {
        w.recharge();
        w.sweep();
    }

    assert_eq!(w.state.agents.live_count(), 4);
    assert_eq!(w.state.world.repro_count, 0);
}

#[test]
fn multiplication_odds_fall_with_crowding() {
    // One eligible roll per fresh world; a lone breeder (k = 1) must split
    // more often than one with two packed neighbors (k = 3).
    let mut lone = 0;
    let mut crowded = 0;
    for seed in 0..200 {
        let mut w = World::new(seed);
        let mold = w.add_race("mold", 2, RaceFlags::MULTIPLY | RaceFlags::NEVER_MOVE);
        w.spawn(mold, Position::new(14, 10), Alignment::Hostile);
        w.sweep();
        if w.state.world.repro_count > 0 {
            lone += 1;
        }

        let mut w = World::new(seed);
        let mold = w.add_race("mold", 2, RaceFlags::MULTIPLY | RaceFlags::NEVER_MOVE);
        let statue = w.add_race("statue", 2, RaceFlags::NEVER_MOVE);
        w.spawn(mold, Position::new(14, 10), Alignment::Hostile);
        w.spawn(statue, Position::new(14, 9), Alignment::Hostile);
        w.spawn(statue, Position::new(13, 10), Alignment::Hostile);
        w.sweep();
        if w.state.world.repro_count > 0 {
            crowded += 1;
        }
    }

    assert!(lone > crowded, "lone {lone} vs crowded {crowded} of 200");
    assert!(crowded > 0, "crowding lowers the odds, it does not zero them");
}

#[test]
fn multiply_barrier_stops_breeding_outright() {
    let mut w = World::new(53);
    let mold = w.add_race("mold", 2, RaceFlags::MULTIPLY | RaceFlags::NEVER_MOVE);
    w.spawn(mold, Position::new(14, 10), Alignment::Hostile);
    w.state.world.multiply_barrier = true;

    for _ in 0..200 {
        w.recharge();
        w.sweep();
    }

    assert_eq!(w.state.agents.live_count(), 1);
    assert_eq!(w.state.world.repro_count, 0);
}

#[test]
fn agents_beyond_the_active_radius_never_act() {
    let mut w = World::sized(54, 40, 200);
    let orc = w.add_race("orc", 5, RaceFlags::empty());
    let id = w.spawn(orc, Position::new(10, 180), Alignment::Hostile);
    w.agent_mut(id).target = Some(Position::new(12, 180));

    for _ in 0..3 {
        w.recharge();
        w.sweep();
    }

    assert_eq!(w.pos_of(id), Position::new(10, 180));
    assert!(w.agent(id).target.is_some(), "skipped agents keep their target");
}

#[test]
fn remembered_target_keeps_a_far_agent_processing() {
    let mut w = World::new(55);
    w.grid.wall_column(15);
    let lurker = w
        .races
        .push(RaceTemplate::new(RaceId(0), "lurker", 10, 110, 5, 0, RaceFlags::empty()));
    let id = w.spawn(lurker, Position::new(10, 18), Alignment::Hostile);

    // Out of its short perception range and out of sight: idle.
    w.sweep();
    assert_eq!(w.pos_of(id), Position::new(10, 18));

    w.agent_mut(id).target = Some(Position::new(12, 18));
    w.recharge();
    w.sweep();

    assert_eq!(w.pos_of(id), Position::new(10, 17));
    assert!(w.agent(id).target.is_none(), "targets last a single turn");
}
