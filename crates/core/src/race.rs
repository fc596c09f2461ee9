//! Race templates: immutable per-kind capability and stat data.
//!
//! A [`RaceTemplate`] is shared read-only by every agent of that kind; the
//! only race-side mutation during simulation is the aggregate lore ledger,
//! which lives in the world state, not here.

use bitflags::bitflags;

/// Index into the race book.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RaceId(pub u16);

bitflags! {
    /// Movement and behavior capabilities of a race.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct RaceFlags: u32 {
        /// Moves through solid rock.
        const PASS_WALL     = 1 << 0;
        /// Bores through solid rock, destroying it.
        const KILL_WALL     = 1 << 1;
        const CAN_FLY       = 1 << 2;
        /// Lives in water and cannot leave it (unless it also flies).
        const AQUATIC       = 1 << 3;
        /// Breeds explosively when left alone.
        const MULTIPLY      = 1 << 4;
        /// Never leaves its tile.
        const NEVER_MOVE    = 1 << 5;
        const CAN_SPEAK     = 1 << 6;
        const OPEN_DOOR     = 1 << 7;
        const BASH_DOOR     = 1 << 8;
        const TAKE_ITEM     = 1 << 9;
        const KILL_ITEM     = 1 << 10;
        /// Travels in groups; prefers pack tactics.
        const FRIENDS       = 1 << 11;
        const ANIMAL        = 1 << 12;
        const UNIQUE        = 1 << 13;
        /// Has any ranged attack (spell, breath, bolt).
        const RANGED        = 1 << 14;
        /// Moves erratically 25% of the time.
        const ERRATIC_25    = 1 << 15;
        /// Moves erratically 50% of the time.
        const ERRATIC_50    = 1 << 16;
        /// At home in woodland; trees do not slow it.
        const WILD_WOOD     = 1 << 17;
        /// Can serve as the player's mount.
        const RIDEABLE      = 1 << 18;
        /// Periodically disguises itself as another race.
        const CHAMELEON     = 1 << 19;
        /// One-shot hazard: detonates instead of living.
        const SELF_DESTRUCT = 1 << 20;
        /// Emits loud ambient noise even when unseen.
        const NOISY         = 1 << 21;
        /// Resists everything; pets of this kind turn on the player.
        const RES_ALL       = 1 << 22;
        /// Tramples weaker creatures of its own side.
        const KILL_BODY     = 1 << 23;
    }
}

/// Immutable template describing one agent kind.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RaceTemplate {
    pub id: RaceId,
    pub name: String,
    pub level: i32,
    /// Base speed on the 110-is-normal scale.
    pub speed: u8,
    /// Perception radius in tiles ("area of effect" of awareness).
    pub aaf: i32,
    /// Percent chance per turn to use a spell or special ability.
    pub spell_freq: u8,
    pub flags: RaceFlags,
    pub hp: i32,
}

impl RaceTemplate {
    pub fn new(
        id: RaceId,
        name: &str,
        level: i32,
        speed: u8,
        aaf: i32,
        spell_freq: u8,
        flags: RaceFlags,
    ) -> Self {
        Self {
            id,
            name: name.to_owned(),
            level,
            speed,
            aaf,
            spell_freq,
            flags,
            hp: level.max(1) * 10,
        }
    }

    pub fn with_hp(mut self, hp: i32) -> Self {
        self.hp = hp;
        self
    }

    pub fn can_pass_walls(&self) -> bool {
        self.flags.contains(RaceFlags::PASS_WALL)
    }

    pub fn can_kill_walls(&self) -> bool {
        self.flags.contains(RaceFlags::KILL_WALL)
    }

    pub fn can_fly(&self) -> bool {
        self.flags.contains(RaceFlags::CAN_FLY)
    }

    pub fn is_aquatic(&self) -> bool {
        self.flags.contains(RaceFlags::AQUATIC)
    }

    pub fn can_multiply(&self) -> bool {
        self.flags.contains(RaceFlags::MULTIPLY)
    }

    pub fn never_moves(&self) -> bool {
        self.flags.contains(RaceFlags::NEVER_MOVE)
    }

    pub fn can_speak(&self) -> bool {
        self.flags.contains(RaceFlags::CAN_SPEAK)
    }

    pub fn can_open_doors(&self) -> bool {
        self.flags.contains(RaceFlags::OPEN_DOOR)
    }

    pub fn can_bash_doors(&self) -> bool {
        self.flags.contains(RaceFlags::BASH_DOOR)
    }

    /// Whether the race can breach a closed door at all.
    pub fn can_breach_doors(&self) -> bool {
        self.flags.intersects(RaceFlags::OPEN_DOOR | RaceFlags::BASH_DOOR)
    }

    pub fn has_ranged_attack(&self) -> bool {
        self.flags.contains(RaceFlags::RANGED)
    }

    pub fn travels_in_groups(&self) -> bool {
        self.flags.contains(RaceFlags::FRIENDS)
    }

    pub fn is_animal(&self) -> bool {
        self.flags.contains(RaceFlags::ANIMAL)
    }

    pub fn is_unique(&self) -> bool {
        self.flags.contains(RaceFlags::UNIQUE)
    }

    pub fn is_rideable(&self) -> bool {
        self.flags.contains(RaceFlags::RIDEABLE)
    }

    pub fn is_chameleon(&self) -> bool {
        self.flags.contains(RaceFlags::CHAMELEON)
    }

    pub fn self_destructs(&self) -> bool {
        self.flags.contains(RaceFlags::SELF_DESTRUCT)
    }
}

/// The read-only collection of all race templates for a scenario.
#[derive(Clone, Debug, Default)]
pub struct RaceBook {
    templates: Vec<RaceTemplate>,
}

impl RaceBook {
    pub fn new(templates: Vec<RaceTemplate>) -> Self {
        Self { templates }
    }

    /// Registers a template, assigning it the next id. Returns the id.
    pub fn push(&mut self, mut template: RaceTemplate) -> RaceId {
        let id = RaceId(self.templates.len() as u16);
        template.id = id;
        self.templates.push(template);
        id
    }

    pub fn template(&self, id: RaceId) -> Option<&RaceTemplate> {
        self.templates.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
