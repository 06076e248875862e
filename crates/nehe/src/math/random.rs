/// Seedable linear congruential generator matching the MSVC `rand()` sequence.
///
/// Outputs are in `0..=MAX`; the particle lessons depend on the exact stream.
#[derive(Debug, Clone)]
pub struct Random(u32);

impl Random {
    pub const MAX: i32 = 0x7FFF;

    #[inline]
    pub const fn new() -> Self {
        Self(1)
    }

    #[inline]
    pub const fn with_seed(seed: u32) -> Self {
        Self(seed)
    }

    #[inline]
    pub const fn seed(&self) -> u32 {
        self.0
    }

    #[inline]
    pub fn set_seed(&mut self, seed: u32) {
        self.0 = seed;
    }

    /// Next value in `0..=Random::MAX`.
    pub fn next(&mut self) -> i32 {
        self.0 = self.0.wrapping_mul(214013).wrapping_add(2531011);
        ((self.0 >> 16) & 0x7FFF) as i32
    }
}

impl Default for Random {
    fn default() -> Self {
        Self::new()
    }
}
