// Copyright @yucwang 2026

use thiserror::Error;

/// Failures surfaced while assembling or configuring a render. Nothing in
/// here is produced while tracing a pixel.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown BSDF name: '{0}'")]
    UnknownBsdf(String),

    #[error("invalid material '{name}': {reason}")]
    InvalidMaterial { name: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read image '{path}': {reason}")]
    ImageRead { path: String, reason: String },

    #[error("failed to write image '{path}': {reason}")]
    ImageWrite { path: String, reason: String },
}

pub type RenderResult<T> = Result<T, RenderError>;
