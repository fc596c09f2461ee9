//! Deterministic random number generation.
//!
//! PCG-XSH-RR: 64-bit LCG state, 32-bit permuted output. Deterministic by
//! seed so whole simulations can be replayed. The dice helpers mirror the
//! classic dungeon conventions: `randint0(n)` is `[0, n)`, `randint1(n)` is
//! `[1, n]`, and `one_in(n)` succeeds with probability `1/n`.

/// Stateful PCG random number generator (Permuted Congruential Generator).
#[derive(Clone, Debug)]
pub struct GameRng {
    state: u64,
}

impl GameRng {
    /// PCG multiplier constant.
    const MULTIPLIER: u64 = 6364136223846793005;

    /// PCG increment constant.
    const INCREMENT: u64 = 1442695040888963407;

    pub fn new(seed: u64) -> Self {
        let mut rng = Self { state: seed };
        // One warm-up step so trivial seeds (0, 1) diverge immediately.
        rng.next_u32();
        rng
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
        let state = self.state;

        // XSH-RR output permutation: xorshift high bits, then rotate by the
        // topmost bits.
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Uniform value in `[0, n)`. Returns 0 when `n` is 0.
    pub fn randint0(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        self.next_u32() % n
    }

    /// Uniform value in `[1, n]`. Returns 1 when `n` is 0 or 1.
    pub fn randint1(&mut self, n: u32) -> u32 {
        self.randint0(n) + 1
    }

    /// True with probability `1/n`.
    pub fn one_in(&mut self, n: u32) -> bool {
        self.randint0(n) == 0
    }
}
