//! Spotlight thumbnail processing

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::types::{Cell, CELL_SIZE};

/// Luminance curve `L' = 255 * (L / 255)^gamma` applied per pixel
///
/// Chroma is scaled by `L' / L`; black pixels are left untouched.
pub fn gamma_darken(image: &mut RgbaImage, gamma: f32) {
    for px in image.pixels_mut() {
        let [r, g, b, _] = px.0;
        let lum = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        if lum == 0.0 {
            continue;
        }
        let target = 255.0 * (lum / 255.0).powf(gamma);
        let ratio = target / lum;
        for c in &mut px.0[..3] {
            *c = (*c as f32 * ratio).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// The selected cell's thumbnail resampled to `size` px and darkened
///
/// Returns `None` when the tile lies outside the sprite sheet.
pub fn spotlight_tile(sprite: &RgbaImage, cell: Cell, size: u32, gamma: f32) -> Option<RgbaImage> {
    if !cell.in_bounds() || size == 0 {
        return None;
    }
    let (ox, oy) = (cell.x as u32 * CELL_SIZE, cell.y as u32 * CELL_SIZE);
    if ox + CELL_SIZE > sprite.width() || oy + CELL_SIZE > sprite.height() {
        return None;
    }

    let tile = imageops::crop_imm(sprite, ox, oy, CELL_SIZE, CELL_SIZE).to_image();
    let mut resized = imageops::resize(&tile, size, size, FilterType::Triangle);
    gamma_darken(&mut resized, gamma);
    Some(resized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::tests::test_sprite;

    #[test]
    fn test_gamma_skips_black_and_keeps_white() {
        let mut img = RgbaImage::from_pixel(2, 1, image::Rgba([0, 0, 0, 255]));
        img.put_pixel(1, 0, image::Rgba([255, 255, 255, 128]));
        gamma_darken(&mut img, 4.0);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(1, 0).0, [255, 255, 255, 128]);
    }

    #[test]
    fn test_gamma_darkens_midtones() {
        let mut img = RgbaImage::from_pixel(1, 1, image::Rgba([128, 128, 128, 255]));
        gamma_darken(&mut img, 4.0);
        // 255 * (128/255)^4 = 16.19
        assert_eq!(img.get_pixel(0, 0).0, [16, 16, 16, 255]);
    }

    #[test]
    fn test_spotlight_tile_size_and_bounds() {
        let sprite = test_sprite();
        let tile = spotlight_tile(&sprite, Cell::new(2, 3), 64, 1.0).unwrap();
        assert_eq!(tile.dimensions(), (64, 64));
        let px = tile.get_pixel(32, 32).0;
        for (got, want) in px.iter().zip([2u8, 3, 200, 255]) {
            assert!(got.abs_diff(want) <= 1, "{:?}", px);
        }
        assert!(spotlight_tile(&sprite, Cell::new(-1, 0), 64, 4.0).is_none());
        assert!(spotlight_tile(&RgbaImage::new(32, 32), Cell::new(1, 0), 64, 4.0).is_none());
    }
}
