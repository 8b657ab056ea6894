// Copyright @yucwang 2026

use crate::core::rng::LcgRng;
use crate::math::bitmap::Bitmap;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::spectrum::RayColor;
use parking_lot::Mutex;

pub const NUM_LOCKS: usize = 256;

/// Accumulation buffer shared by all render threads. Pixel `i` lives in shard
/// `i % NUM_LOCKS`, so neighbouring pixels never share a lock.
pub struct Film {
    width: usize,
    height: usize,
    shards: Vec<Mutex<Vec<Vector3f>>>,
}

impl Film {
    pub fn new(width: usize, height: usize) -> Self {
        let num_pixels = width * height;
        let shards = (0..NUM_LOCKS)
            .map(|shard| {
                let len = if shard < num_pixels { (num_pixels - shard + NUM_LOCKS - 1) / NUM_LOCKS } else { 0 };
                Mutex::new(vec![Vector3f::zeros(); len])
            })
            .collect();
        Self { width, height, shards }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn num_pixels(&self) -> usize {
        self.width * self.height
    }

    fn locate(index: usize) -> (usize, usize) {
        (index % NUM_LOCKS, index / NUM_LOCKS)
    }

    pub fn accumulate_color(&self, x: usize, y: usize, color: &RayColor) {
        debug_assert!(color.is_valid());
        if x >= self.width || y >= self.height {
            return;
        }
        let (shard, offset) = Self::locate(x + y * self.width);
        let mut pixels = self.shards[shard].lock();
        pixels[offset] += color.to_vector();
    }

    /// Splats onto the pixel under `film_pos` after a jitter of half a pixel.
    /// Splats jittered past the border land on the edge pixel.
    pub fn accumulate_color_at(&self, film_pos: &Vector2f, color: &RayColor, rng: &mut LcgRng) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let jitter = rng.next_vec2() - Vector2f::new(0.5, 0.5);
        let x = (film_pos.x * self.width as Float + jitter.x).max(0.0) as usize;
        let y = (film_pos.y * self.height as Float + jitter.y).max(0.0) as usize;
        self.accumulate_color(x.min(self.width - 1), y.min(self.height - 1), color);
    }

    /// Average over `passes` accumulated passes.
    pub fn resolve(&self, passes: u32) -> Bitmap {
        let scale = 1.0 / passes.max(1) as Float;
        let mut data = vec![Vector3f::zeros(); self.num_pixels()];
        for (shard, lock) in self.shards.iter().enumerate() {
            let pixels = lock.lock();
            for (offset, value) in pixels.iter().enumerate() {
                data[shard + offset * NUM_LOCKS] = value * scale;
            }
        }
        Bitmap::from_pixels(self.width, self.height, data)
    }

    pub fn clear(&self) {
        for lock in &self.shards {
            lock.lock().iter_mut().for_each(|value| *value = Vector3f::zeros());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_accumulate_and_resolve() {
        let film = Film::new(20, 15);
        film.accumulate_color(3, 4, &RayColor::new(1.0, 2.0, 3.0));
        film.accumulate_color(3, 4, &RayColor::new(1.0, 2.0, 3.0));
        film.accumulate_color(25, 4, &RayColor::one());
        let bitmap = film.resolve(2);
        assert!((bitmap[(3, 4)].y - 2.0).abs() < 1e-6);
        assert_eq!(bitmap[(4, 4)], Vector3f::zeros());

        film.clear();
        assert_eq!(film.resolve(1)[(3, 4)], Vector3f::zeros());
    }

    #[test]
    fn test_splat_lands_near_position() {
        let film = Film::new(8, 8);
        let mut rng = LcgRng::new(9);
        for _ in 0..100 {
            film.accumulate_color_at(&Vector2f::new(0.5, 0.5), &RayColor::one(), &mut rng);
        }
        let bitmap = film.resolve(1);
        let total: Float = bitmap.pixels().iter().map(|p| p.x).sum();
        assert!((total - 100.0).abs() < 1e-3);
        assert!(bitmap.region_average(3, 3, 5, 5).x > 0.0);
        assert_eq!(bitmap[(0, 0)].x, 0.0);
    }

    #[test]
    fn test_splats_at_the_border_are_kept() {
        let film = Film::new(4, 3);
        let mut rng = LcgRng::new(31);
        let corners = [Vector2f::new(0.0, 0.0), Vector2f::new(1.0, 1.0),
                       Vector2f::new(0.999, 0.0), Vector2f::new(0.0, 0.999)];
        for _ in 0..50 {
            for corner in corners.iter() {
                film.accumulate_color_at(corner, &RayColor::one(), &mut rng);
            }
        }
        let bitmap = film.resolve(1);
        let total: Float = bitmap.pixels().iter().map(|p| p.x).sum();
        assert!((total - 200.0).abs() < 1e-3);
        assert!(bitmap[(0, 0)].x > 0.0 && bitmap[(3, 2)].x > 0.0);
        assert!(bitmap[(3, 0)].x > 0.0 && bitmap[(0, 2)].x > 0.0);
    }

    #[test]
    fn test_concurrent_accumulation() {
        let film = Film::new(64, 64);
        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for y in 0..64 {
                        for x in 0..64 {
                            film.accumulate_color(x, y, &RayColor::one());
                        }
                    }
                });
            }
        });
        let bitmap = film.resolve(4);
        assert!(bitmap.pixels().iter().all(|p| (p.x - 1.0).abs() < 1e-6));
    }
}
