//! Speed-to-energy conversion.
//!
//! Speed is on the 110-is-normal scale. Each game turn an agent's energy
//! deficit shrinks by the table value for its speed; when the deficit
//! crosses zero the agent acts and the deficit grows back by
//! [`TURN_ENERGY`]. A normal-speed agent therefore acts once per ten game
//! turns, and the table's flattening tail keeps extreme hasting from
//! scaling linearly forever.

/// Energy an action costs (the per-turn replenishment of the deficit).
pub const TURN_ENERGY: i32 = 100;

/// Energy gained per game turn, indexed by speed. Inherited game-balance
/// data; the exact values are load-bearing for pacing parity.
const EXTRACT_ENERGY: [u8; 200] = [
    // Slow
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, //
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, //
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, //
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, //
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, //
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, //
    // Speed - 50 .. - 41
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, //
    // Speed - 40 .. - 31
    2, 2, 2, 2, 2, 2, 2, 2, 2, 2, //
    // Speed - 30 .. - 21
    2, 2, 2, 2, 2, 2, 2, 3, 3, 3, //
    // Speed - 20 .. - 11
    3, 3, 3, 3, 3, 4, 4, 4, 4, 4, //
    // Speed - 10 .. - 1
    5, 5, 5, 5, 6, 6, 7, 7, 8, 9, //
    // Normal .. + 9
    10, 11, 12, 13, 14, 15, 16, 17, 18, 19, //
    // Fast + 10 .. + 19
    20, 21, 22, 23, 24, 25, 26, 27, 28, 29, //
    // Fast + 20 .. + 29
    30, 31, 32, 33, 34, 35, 36, 36, 37, 37, //
    // Fast + 30 .. + 39
    38, 38, 39, 39, 40, 40, 40, 41, 41, 41, //
    // Fast + 40 .. + 49
    42, 42, 42, 43, 43, 43, 44, 44, 44, 44, //
    // Fast + 50 .. + 59
    45, 45, 45, 45, 45, 46, 46, 46, 46, 46, //
    // Fast + 60 .. + 69
    47, 47, 47, 47, 47, 48, 48, 48, 48, 48, //
    // Fast + 70 .. + 79
    49, 49, 49, 49, 49, 49, 49, 49, 49, 49, //
    // Fast
    49, 49, 49, 49, 49, 49, 49, 49, 49, 49, //
];

/// Energy gained per game turn at the given speed.
pub fn speed_to_energy(speed: u8) -> i32 {
    let idx = (speed as usize).min(EXTRACT_ENERGY.len() - 1);
    EXTRACT_ENERGY[idx] as i32
}
