// Copyright @yucwang 2026

pub mod rectangle;
pub mod sphere;
