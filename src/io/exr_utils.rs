/* Copyright 2020 @TwoCookingMice */

use crate::core::error::RenderError;
use crate::math::bitmap::Bitmap;
use crate::math::constants::Vector3f;

use exr::prelude::{read_first_rgba_layer_from_file, write_rgb_file};

/// Reads the first RGBA layer of an OpenEXR file, dropping alpha.
pub fn read_exr_from_file(file_path: &str) -> Result<Bitmap, RenderError> {
    log::info!("Starting reading OpenEXR image from: {}.", file_path);

    let image = read_first_rgba_layer_from_file(
        file_path,
        |resolution, _| Bitmap::new(resolution.width(), resolution.height()),
        |bitmap: &mut Bitmap, position, (r, g, b, _a): (f32, f32, f32, f32)| {
            bitmap[(position.x(), position.y())] = Vector3f::new(r, g, b);
        },
    ).map_err(|e| RenderError::ImageRead { path: file_path.to_string(), reason: e.to_string() })?;

    let bitmap = image.layer_data.channel_data.pixels;
    log::info!("OpenEXR loaded, width = {}, height = {}.", bitmap.width(), bitmap.height());
    Ok(bitmap)
}

// Write EXR Image to file
pub fn write_exr_to_file(image: &Bitmap, file_path: &str) -> Result<(), RenderError> {
    log::info!("Starting writing openexr images: {}.", file_path);

    write_rgb_file(file_path, image.width(), image.height(), |x, y| {
        let pixel = image[(x, y)];
        (pixel.x, pixel.y, pixel.z)
    }).map_err(|e| RenderError::ImageWrite { path: file_path.to_string(), reason: e.to_string() })?;

    log::info!("EXR written to: {}.", file_path);
    Ok(())
}
