use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use thiserror::Error;

use crate::types::{NormalizedImage, RawImage};

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Image has zero area ({width}x{height})")]
    ZeroArea { width: u32, height: u32 },
    #[error("Unsupported channel layout: {0} channels")]
    UnsupportedChannels(u8),
    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// 5-tap binomial approximation of a Gaussian (sigma ≈ 1.1), sums to 16.
const BLUR_KERNEL: [u32; 5] = [1, 4, 6, 4, 1];
const BLUR_RADIUS: i64 = 2;

/// Grayscale → 5×5 Gaussian blur → Otsu binarization.
///
/// The output holds only the values 0 and 255.
pub fn normalize(image: &RawImage) -> Result<NormalizedImage, NormalizeError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(NormalizeError::ZeroArea { width: image.width(), height: image.height() });
    }
    let gray = to_gray(&image.to_dynamic()?);
    let blurred = gaussian_blur_5x5(&gray);
    let level = otsu_level(&blurred);
    tracing::trace!(level, "Otsu threshold selected");
    Ok(NormalizedImage::new(threshold(&blurred, level, ThresholdType::Binary)))
}

/// BT.601 luma (0.299, 0.587, 0.114) in 14-bit fixed point, rounded to
/// nearest. Alpha is ignored.
fn to_gray(image: &DynamicImage) -> GrayImage {
    if !image.color().has_color() {
        return image.to_luma8();
    }
    let rgb = image.to_rgb8();
    ImageBuffer::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = (r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868 + 8192) >> 14;
        Luma([luma as u8])
    })
}

/// Separable 5×5 blur with reflect-101 borders (`dcb|abcd|cba` without
/// repeating the edge pixel).
pub fn gaussian_blur_5x5(gray: &GrayImage) -> GrayImage {
    let (w, h) = (gray.width() as i64, gray.height() as i64);
    if w == 0 || h == 0 {
        return gray.clone();
    }

    // Horizontal pass keeps the un-normalized sums (max 255 * 16).
    let mut horizontal = vec![0u32; (w * h) as usize];
    for y in 0..h {
        for x in 0..w {
            let sum: u32 = BLUR_KERNEL
                .iter()
                .enumerate()
                .map(|(k, weight)| {
                    let sx = reflect101(x + k as i64 - BLUR_RADIUS, w);
                    weight * gray.get_pixel(sx as u32, y as u32)[0] as u32
                })
                .sum();
            horizontal[(y * w + x) as usize] = sum;
        }
    }

    ImageBuffer::from_fn(w as u32, h as u32, |x, y| {
        let (x, y) = (x as i64, y as i64);
        let sum: u32 = BLUR_KERNEL
            .iter()
            .enumerate()
            .map(|(k, weight)| {
                let sy = reflect101(y + k as i64 - BLUR_RADIUS, h);
                weight * horizontal[(sy as i64 * w + x) as usize]
            })
            .sum();
        // Total weight is 16 * 16; round to nearest.
        Luma([((sum + 128) / 256).min(255) as u8])
    })
}

fn reflect101(i: i64, n: i64) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n - 1);
    let i = i.rem_euclid(period);
    (if i >= n { period - i } else { i }) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::collection::vec;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn rgb_card(width: u32, height: u32) -> RawImage {
        // Light background with a dark "text" band and some gradient noise.
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = if y > height / 3 && y < height / 2 && x % 7 < 4 {
                    30 + (x % 11) as u8
                } else {
                    200 + (x * 40 / width) as u8
                };
                pixels.extend_from_slice(&[v, v, v.saturating_sub(10)]);
            }
        }
        RawImage::new(width, height, 3, pixels).unwrap()
    }

    fn distinct(img: &GrayImage) -> BTreeSet<u8> {
        img.pixels().map(|p| p[0]).collect()
    }

    #[test]
    fn output_is_binary_and_same_size() {
        let raw = rgb_card(64, 40);
        let norm = normalize(&raw).unwrap();
        assert_eq!((norm.width(), norm.height()), (64, 40));
        let values = distinct(norm.as_gray());
        assert!(values.is_subset(&BTreeSet::from([0, 255])), "values: {values:?}");
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn single_pixel_image_is_supported() {
        let raw = RawImage::new(1, 1, 1, vec![90]).unwrap();
        let norm = normalize(&raw).unwrap();
        assert!(distinct(norm.as_gray()).is_subset(&BTreeSet::from([0, 255])));
    }

    #[test]
    fn rgba_and_gray_alpha_inputs_are_accepted() {
        let rgba = RawImage::new(2, 2, 4, vec![255, 0, 0, 255].repeat(4)).unwrap();
        assert!(normalize(&rgba).is_ok());
        let la = RawImage::new(2, 2, 2, vec![10, 255].repeat(4)).unwrap();
        assert!(normalize(&la).is_ok());
    }

    #[test]
    fn bimodal_image_splits_into_black_and_white() {
        let pixels: Vec<u8> = (0..100).map(|i| if i % 10 < 5 { 40 } else { 210 }).collect();
        let norm = normalize(&RawImage::new(10, 10, 1, pixels).unwrap()).unwrap();
        assert_eq!(norm.as_gray().get_pixel(0, 5)[0], 0);
        assert_eq!(norm.as_gray().get_pixel(9, 5)[0], 255);
    }

    #[test]
    fn uniform_image_stays_two_level() {
        let norm = normalize(&RawImage::new(4, 4, 1, vec![128; 16]).unwrap()).unwrap();
        assert!(distinct(norm.as_gray()).is_subset(&BTreeSet::from([0, 255])));
    }

    #[test]
    fn grayscale_uses_bt601_weights() {
        let raw = RawImage::new(3, 1, 3, vec![255, 0, 0, 0, 255, 0, 0, 0, 255]).unwrap();
        let gray = to_gray(&raw.to_dynamic().unwrap());
        assert_eq!(gray.as_raw(), &[76, 150, 29]);
    }

    #[test]
    fn grayscale_ignores_alpha() {
        let raw = RawImage::new(1, 1, 4, vec![255, 255, 255, 0]).unwrap();
        assert_eq!(to_gray(&raw.to_dynamic().unwrap()).as_raw(), &[255]);
    }

    #[test]
    fn blur_preserves_uniform_image() {
        let img: GrayImage = ImageBuffer::from_fn(6, 6, |_, _| Luma([77u8]));
        assert_eq!(gaussian_blur_5x5(&img), img);
    }

    #[test]
    fn blur_spreads_single_bright_pixel() {
        let mut img: GrayImage = ImageBuffer::from_fn(9, 9, |_, _| Luma([0u8]));
        img.put_pixel(4, 4, Luma([255]));
        let out = gaussian_blur_5x5(&img);
        // Centre weight is 36/256 of 255.
        assert_eq!(out.get_pixel(4, 4)[0], 36);
        assert!(out.get_pixel(3, 4)[0] > 0);
        assert_eq!(out.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn reflect101_mirrors_without_edge_repeat() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(-2, 5), 2);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(6, 5), 2);
        assert_eq!(reflect101(-2, 2), 0);
        assert_eq!(reflect101(3, 2), 1);
        assert_eq!(reflect101(7, 1), 0);
    }

    proptest! {
        #[test]
        fn any_raster_normalizes_to_two_levels(
            (width, height, channels, pixels) in (1u32..24, 1u32..24, 1u8..=4).prop_flat_map(|(w, h, c)| {
                (Just(w), Just(h), Just(c), vec(any::<u8>(), (w * h * c as u32) as usize))
            })
        ) {
            let raw = RawImage::new(width, height, channels, pixels).unwrap();
            let norm = normalize(&raw).unwrap();
            prop_assert_eq!((norm.width(), norm.height()), (width, height));
            prop_assert!(norm.as_gray().pixels().all(|p| p[0] == 0 || p[0] == 255));
        }
    }
}
