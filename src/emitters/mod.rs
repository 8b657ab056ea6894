// Copyright @yucwang 2026

pub mod area;
pub mod background;
pub mod directional;
pub mod point;
