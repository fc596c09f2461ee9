#![allow(dead_code)]

//! Shared test fixture: an in-memory floor oracle, scripted combat hooks,
//! and capturing sinks, bundled with the state the engine borrows per turn.

use std::collections::HashMap;

use delve_ai::{AiEngine, AttackOutcome, CombatHooks, EventSink, FloorSink, TerrainChange};
use delve_core::{
    AgentId, AgentState, Alignment, GameRng, GridDimensions, GridOracle, Position, RaceBook,
    RaceFlags, RaceId, RaceTemplate, SimConfig, SimState, Tile, distance,
};

/// Floor oracle over a sparse tile map; anything unset is plain floor.
pub struct TestGrid {
    dims: GridDimensions,
    tiles: HashMap<Position, Tile>,
}

impl TestGrid {
    pub fn open(height: u32, width: u32) -> Self {
        Self {
            dims: GridDimensions::new(height, width),
            tiles: HashMap::new(),
        }
    }

    fn entry(&mut self, pos: Position) -> &mut Tile {
        self.tiles.entry(pos).or_insert_with(Tile::floor)
    }

    pub fn set_feature(&mut self, pos: Position, feature: delve_core::Feature) {
        self.entry(pos).feature = feature;
    }

    pub fn set_flow(&mut self, pos: Position, cost: u16, dist: u16) {
        let tile = self.entry(pos);
        tile.cost = cost;
        tile.dist = dist;
    }

    pub fn set_when(&mut self, pos: Position, when: u16) {
        self.entry(pos).when = when;
    }

    pub fn set_item(&mut self, pos: Position, item: delve_core::ItemHandle) {
        self.entry(pos).item = Some(item);
    }

    /// Fills a vertical wall spanning the whole height at column `x`.
    pub fn wall_column(&mut self, x: i32) {
        for y in 0..self.dims.height as i32 {
            self.set_feature(Position::new(y, x), delve_core::Feature::Wall);
        }
    }
}

impl GridOracle for TestGrid {
    fn dimensions(&self) -> GridDimensions {
        self.dims
    }

    fn tile(&self, position: Position) -> Option<Tile> {
        if !self.dims.contains(position) {
            return None;
        }
        Some(self.tiles.get(&position).copied().unwrap_or_else(Tile::floor))
    }
}

/// Combat hooks that record every call and resolve nothing.
#[derive(Default)]
pub struct ScriptedCombat {
    pub player_melees: Vec<AgentId>,
    pub monster_melees: Vec<(AgentId, AgentId)>,
    pub rune_checks: Vec<(AgentId, Position)>,
    pub item_calls: Vec<(AgentId, Position)>,
    /// Whether an explosive rune is spent (and the tile opened) on contact.
    pub rune_spends: bool,
}

impl CombatHooks for ScriptedCombat {
    fn melee_player(&mut self, _state: &mut SimState, attacker: AgentId) -> AttackOutcome {
        self.player_melees.push(attacker);
        AttackOutcome::default()
    }

    fn melee_monster(
        &mut self,
        _state: &mut SimState,
        attacker: AgentId,
        defender: AgentId,
    ) -> AttackOutcome {
        self.monster_melees.push((attacker, defender));
        AttackOutcome::default()
    }

    fn spell_at_player(&mut self, _state: &mut SimState, _caster: AgentId) -> bool {
        false
    }

    fn spell_at_monster(&mut self, _state: &mut SimState, _caster: AgentId) -> bool {
        false
    }

    fn special_ability(&mut self, _state: &mut SimState, _agent: AgentId) -> bool {
        false
    }

    fn shapechange(&mut self, _state: &mut SimState, _agent: AgentId) -> Option<RaceId> {
        None
    }

    fn self_destruct(&mut self, _state: &mut SimState, _agent: AgentId) -> bool {
        false
    }

    fn rune_detonation(&mut self, _state: &mut SimState, agent: AgentId, at: Position) -> bool {
        self.rune_checks.push((agent, at));
        self.rune_spends
    }

    fn item_interaction(&mut self, _state: &mut SimState, agent: AgentId, at: Position) {
        self.item_calls.push((agent, at));
    }

    fn dismount(&mut self, _state: &mut SimState, _mount: AgentId) -> bool {
        false
    }

    fn drag_rider(&mut self, _state: &mut SimState, _mount: AgentId, _to: Position) {}
}

#[derive(Default)]
pub struct Recorder {
    pub messages: Vec<String>,
    pub disturbs: u32,
    pub compassion: Vec<AgentId>,
}

impl Recorder {
    pub fn saw(&self, needle: &str) -> bool {
        self.messages.iter().any(|m| m.contains(needle))
    }
}

impl EventSink for Recorder {
    fn message(&mut self, text: &str) {
        self.messages.push(text.to_owned());
    }

    fn disturb(&mut self, _stop_search: bool, _stop_travel: bool) {
        self.disturbs += 1;
    }

    fn compassion(&mut self, agent: AgentId) {
        self.compassion.push(agent);
    }
}

#[derive(Default)]
pub struct FloorLog {
    pub changes: Vec<(Position, TerrainChange)>,
}

impl FloorSink for FloorLog {
    fn alter(&mut self, at: Position, change: TerrainChange) {
        self.changes.push((at, change));
    }
}

/// Everything one engine turn borrows, plus spawn and sweep helpers.
pub struct World {
    pub state: SimState,
    pub grid: TestGrid,
    pub races: RaceBook,
    pub config: SimConfig,
    pub rng: GameRng,
    pub combat: ScriptedCombat,
    pub events: Recorder,
    pub floor: FloorLog,
}

/// Installs the env-filtered subscriber once so `RUST_LOG` works in tests.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

impl World {
    pub fn new(seed: u64) -> Self {
        Self::sized(seed, 40, 40)
    }

    pub fn sized(seed: u64, height: u32, width: u32) -> Self {
        init_tracing();
        let mut state = SimState::default();
        state.player.pos = Position::new(10, 10);
        // Turn 1, so agents spawned with epoch 0 act on the first sweep.
        state.world.game_turn = 1;
        Self {
            state,
            grid: TestGrid::open(height, width),
            races: RaceBook::default(),
            config: SimConfig::default(),
            rng: GameRng::new(seed),
            combat: ScriptedCombat::default(),
            events: Recorder::default(),
            floor: FloorLog::default(),
        }
    }

    pub fn add_race(&mut self, name: &str, level: i32, flags: RaceFlags) -> RaceId {
        self.races
            .push(RaceTemplate::new(RaceId(0), name, level, 110, 20, 0, flags))
    }

    pub fn spawn(&mut self, race: RaceId, pos: Position, alignment: Alignment) -> AgentId {
        let template = self.races.template(race).unwrap().clone();
        let mut agent =
            AgentState::new(race, pos, template.hp, template.speed, 0).with_alignment(alignment);
        agent.visible = true;
        agent.dist_to_player = distance(pos, self.state.player.pos);
        self.state.agents.spawn(agent)
    }

    /// Runs one engine sweep and advances the game clock.
    pub fn sweep(&mut self) {
        let mut engine = AiEngine::new(
            &mut self.state,
            &self.grid,
            &self.races,
            &self.config,
            &mut self.rng,
            &mut self.combat,
            &mut self.events,
            &mut self.floor,
        );
        engine.run_turn().unwrap();
        self.state.world.game_turn += 1;
    }

    /// Zeroes every agent's energy deficit so the next sweep fires them all.
    pub fn recharge(&mut self) {
        for slot in 0..self.state.agents.slot_count() {
            if let Some(agent) = self.state.agents.agent_mut(AgentId(slot as u32)) {
                agent.energy_need = 0;
            }
        }
    }

    pub fn agent(&self, id: AgentId) -> &AgentState {
        self.state.agents.agent(id).unwrap()
    }

    pub fn agent_mut(&mut self, id: AgentId) -> &mut AgentState {
        self.state.agents.agent_mut(id).unwrap()
    }

    pub fn pos_of(&self, id: AgentId) -> Position {
        self.agent(id).pos
    }
}
