// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector2f, Vector3f};

/// Per-thread random generator. Cheap to copy, never shared across threads.
#[derive(Debug, Clone)]
pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    pub fn new(seed: u64) -> Self {
        let mut rng = Self { state: 0 };
        // Decorrelate nearby seeds.
        rng.state = seed.wrapping_mul(0x9E3779B97F4A7C15).wrapping_add(0x2545F4914F6CDD1D);
        rng.next_u32();
        rng
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let xorshifted = (((self.state >> 18) ^ self.state) >> 27) as u32;
        let rot = (self.state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Uniform float in [0, 1).
    pub fn next_f32(&mut self) -> Float {
        (self.next_u32() >> 8) as Float * (1.0 / 16777216.0)
    }

    pub fn next_vec2(&mut self) -> Vector2f {
        Vector2f::new(self.next_f32(), self.next_f32())
    }

    pub fn next_vec3(&mut self) -> Vector3f {
        Vector3f::new(self.next_f32(), self.next_f32(), self.next_f32())
    }

    /// Uniform integer in [0, bound).
    pub fn next_below(&mut self, bound: u32) -> u32 {
        debug_assert!(bound > 0);
        ((self.next_u32() as u64 * bound as u64) >> 32) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_unit_interval() {
        let mut rng = LcgRng::new(42);
        let mut sum = 0.0;
        for _ in 0..10000 {
            let v = rng.next_f32();
            assert!(v >= 0.0 && v < 1.0);
            sum += v;
        }
        let mean = sum / 10000.0;
        assert!((mean - 0.5).abs() < 0.02);
    }

    #[test]
    fn test_rng_next_below_bounds() {
        let mut rng = LcgRng::new(1);
        for _ in 0..1000 {
            assert!(rng.next_below(5) < 5);
        }
    }

    #[test]
    fn test_rng_seeds_differ() {
        let mut a = LcgRng::new(1);
        let mut b = LcgRng::new(2);
        assert_ne!(a.next_u32(), b.next_u32());
    }
}
