// Copyright @yucwang 2026

use crate::core::error::RenderError;
use crate::math::bitmap::Bitmap;
use crate::math::constants::Float;

use image::{Rgb, RgbImage};

/// Linear to sRGB transfer curve.
pub fn linear_to_srgb(v: Float) -> Float {
    let v = v.max(0.0).min(1.0);
    if v <= 0.003_130_8 {
        12.92 * v
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

/// Exposure scaled Reinhard curve followed by sRGB encoding.
pub fn tone_map(v: Float, exposure: Float) -> u8 {
    let v = (v * exposure).max(0.0);
    let mapped = v / (1.0 + v);
    (linear_to_srgb(mapped) * 255.0 + 0.5) as u8
}

pub fn to_ldr_image(image: &Bitmap, exposure: Float) -> RgbImage {
    RgbImage::from_fn(image.width() as u32, image.height() as u32, |x, y| {
        let pixel = image[(x as usize, y as usize)];
        Rgb([tone_map(pixel.x, exposure), tone_map(pixel.y, exposure), tone_map(pixel.z, exposure)])
    })
}

/// Tone maps the image and writes it in the format the extension names (png, jpg, ...).
pub fn write_ldr_to_file(image: &Bitmap, exposure: Float, file_path: &str) -> Result<(), RenderError> {
    log::info!("Writing tone mapped image: {}.", file_path);
    to_ldr_image(image, exposure)
        .save(file_path)
        .map_err(|e| RenderError::ImageWrite { path: file_path.to_string(), reason: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::Vector3f;

    #[test]
    fn test_tone_map_is_monotonic_and_bounded() {
        assert_eq!(tone_map(0.0, 1.0), 0);
        assert_eq!(tone_map(-3.0, 1.0), 0);
        let mut previous = 0;
        for i in 0..200 {
            let value = tone_map(i as Float * 0.25, 1.0);
            assert!(value >= previous);
            previous = value;
        }
        assert!(tone_map(1.0e6, 1.0) >= 254);
    }

    #[test]
    fn test_srgb_endpoints() {
        assert!(linear_to_srgb(0.0).abs() < 1e-6);
        assert!((linear_to_srgb(1.0) - 1.0).abs() < 1e-4);
        assert!((linear_to_srgb(0.18) - 0.4614).abs() < 1e-3);
    }

    #[test]
    fn test_ldr_image_layout() {
        let mut bitmap = Bitmap::new(2, 3);
        bitmap[(1, 2)] = Vector3f::new(1.0, 0.0, 0.0);
        let ldr = to_ldr_image(&bitmap, 1.0);
        assert_eq!(ldr.dimensions(), (2, 3));
        assert!(ldr.get_pixel(1, 2)[0] > 0);
        assert_eq!(ldr.get_pixel(0, 0)[0], 0);
    }
}
