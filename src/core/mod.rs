// Copyright @yucwang 2021

pub mod bsdf;
pub mod bvh;
pub mod computation_node;
pub mod context;
pub mod emitter;
pub mod error;
pub mod film;
pub mod hash_grid;
pub mod integrator;
pub mod interaction;
pub mod material;
pub mod medium;
pub mod rng;
pub mod scene;
pub mod sensor;
pub mod shape;
pub mod texture;
