//! Simulation tuning knobs and the disturb policy.

use bitflags::bitflags;

bitflags! {
    /// When agent movement interrupts whatever the player is doing.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct DisturbPolicy: u8 {
        /// Any visible hostile movement disturbs.
        const MOVE  = 1 << 0;
        /// Movement within projection range of the player disturbs.
        const NEAR  = 1 << 1;
        /// Movement of agents at or above the player's level disturbs.
        const HIGH  = 1 << 2;
        /// Minor ambient events (distant noise, doors) disturb.
        const MINOR = 1 << 3;
    }
}

/// Tuning constants for the decision engine.
///
/// Defaults reproduce the inherited game balance.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Maximum sight radius in tiles.
    pub max_sight: i32,
    /// Hard radius beyond which agents are never processed.
    pub active_radius: i32,
    /// Cap on the number of multiplication-spawned agents per floor.
    pub repro_cap: u32,
    /// Divisor scaling multiplication chance by local crowding.
    pub mult_adjustment: u32,
    /// 1-in-N chance per eligible turn that a speaking agent speaks.
    pub speak_chance: u32,
    /// 1-in-N chance per turn that a noisy agent is heard.
    pub noise_chance: u32,
    /// Scent older than this many ticks behind the player's trail is cold.
    pub scent_horizon: u16,
    /// Upper bound for the protection-rune breakage roll.
    pub rune_break_roll: u32,
    /// Distance beyond which a pet always closes in on the player.
    pub pet_seek_distance: i32,
    pub disturb: DisturbPolicy,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_sight: 20,
            active_radius: 100,
            repro_cap: 100,
            mult_adjustment: 7,
            speak_chance: 8,
            noise_chance: 20,
            scent_horizon: 127,
            rune_break_roll: 150,
            pet_seek_distance: 10,
            disturb: DisturbPolicy::MOVE | DisturbPolicy::MINOR,
        }
    }
}
