// Copyright 2020 @TwoCookingMice

use super::constants::{Float, Vector3f};

#[derive(Debug, Copy, Clone)]
pub struct Ray3f {
    origin: Vector3f,
    dir: Vector3f,
    inv_dir: Vector3f,
    pub min_t: Float,
    pub max_t: Float
}

impl Ray3f {
    pub fn new(o: Vector3f, d: Vector3f,
               min_t: Option<Float>, max_t: Option<Float>) -> Self {
        let dir = d.normalize();
        Self { origin: o, dir,
               inv_dir: Vector3f::new(1.0 / dir.x, 1.0 / dir.y, 1.0 / dir.z),
               min_t: min_t.unwrap_or(0.0),
               max_t: max_t.unwrap_or(std::f32::MAX)}
    }

    /// Ray starting slightly off `origin` along `d` to escape the surface it leaves.
    pub fn offset(o: Vector3f, d: Vector3f, offset: Float, max_t: Option<Float>) -> Self {
        let dir = d.normalize();
        Self::new(o + dir * offset, dir, None, max_t)
    }

    pub fn origin(&self) -> Vector3f {
        self.origin
    }

    pub fn dir(&self) -> Vector3f {
        self.dir
    }

    pub fn inv_dir(&self) -> Vector3f {
        self.inv_dir
    }

    pub fn at(&self, t: Float) -> Vector3f {
        self.origin + self.dir * t
    }

    pub fn update(&mut self, t: Float) -> bool {
        if t < self.min_t || t > self.max_t {
            false
        } else {
            self.max_t = t;
            true
        }
    }

    pub fn test_segment(&self, t: Float) -> bool {
        t >= self.min_t && t <= self.max_t
    }

    pub fn is_valid(&self) -> bool {
        self.origin.iter().all(|v| v.is_finite())
            && self.dir.iter().all(|v| v.is_finite())
            && (self.dir.norm() - 1.0).abs() < 1.0e-3
    }
}

/* Tests for Ray */
