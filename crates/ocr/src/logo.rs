use image::{imageops, RgbaImage};

use crate::normalize::NormalizeError;
use crate::types::RawImage;

/// Crop the fixed top-left corner where a logo usually sits.
///
/// This is a placeholder, not detection: no image content is inspected.
/// The region is clamped to the image bounds.
pub fn crop_logo_region(image: &RawImage, width: u32, height: u32) -> Result<RgbaImage, NormalizeError> {
    if width == 0 || height == 0 {
        return Err(NormalizeError::ZeroArea { width, height });
    }
    let rgba = image.to_dynamic()?.to_rgba8();
    let w = width.min(rgba.width());
    let h = height.min(rgba.height());
    Ok(imageops::crop_imm(&rgba, 0, 0, w, h).to_image())
}
