// Copyright @yucwang 2026

pub mod exr_utils;
pub mod ldr_utils;

use crate::core::error::RenderError;
use crate::math::bitmap::Bitmap;
use crate::math::constants::Float;

/// Writes `.exr` as linear HDR, anything else through the tone mapper.
pub fn write_image(image: &Bitmap, exposure: Float, file_path: &str) -> Result<(), RenderError> {
    let is_exr = std::path::Path::new(file_path)
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("exr"));
    if is_exr {
        exr_utils::write_exr_to_file(image, file_path)
    } else {
        ldr_utils::write_ldr_to_file(image, exposure, file_path)
    }
}
