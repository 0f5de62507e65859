// texture.rs - 全景纹理准备：尺寸上限、缩放、调试棋盘图

#[cfg(test)]
#[path = "texture_test.rs"]
mod texture_test;

use crate::error::ViewerError;
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use std::path::Path;

const DEBUG_BACKGROUND: Rgba<u8> = Rgba([0x66, 0x66, 0x66, 255]);
const DEBUG_COLORS: [Rgba<u8>; 4] = [
    Rgba([0xff, 0x00, 0x00, 255]),
    Rgba([0x00, 0xff, 0x00, 255]),
    Rgba([0x00, 0x00, 0xff, 255]),
    Rgba([0xff, 0xcc, 0x00, 255]),
];

/// Colour of the 1x1 texture shown before any image arrives.
pub const PLACEHOLDER_PIXEL: [u8; 4] = [63, 63, 63, 255];

/// Texture edge: the GPU limit, further capped by a non-zero `max_texture_size`.
pub fn texture_size(gpu_max: u32, max_texture_size: u32) -> u32 {
    if max_texture_size > 0 {
        gpu_max.min(max_texture_size)
    } else {
        gpu_max
    }
}

/// Resizes `img` to the `size x size/2` equirectangular target.
pub fn fit_equirect(img: DynamicImage, size: u32) -> RgbaImage {
    let (w, h) = (size.max(1), (size >> 1).max(1));
    let (src_w, src_h) = img.dimensions();
    if (src_w, src_h) == (w, h) {
        return img.into_rgba8();
    }
    log::info!("scaling {src_w}x{src_h} panorama to {w}x{h}");
    img.resize_exact(w, h, image::imageops::FilterType::Lanczos3)
        .into_rgba8()
}

/// Decodes an image file, guessing the format from its contents.
pub fn load_image(path: &Path) -> Result<DynamicImage, ViewerError> {
    let mut reader = image::io::Reader::open(path)?.with_guessed_format()?;
    reader.no_limits();
    let img = reader.decode()?;
    let (w, h) = img.dimensions();
    log::info!("loaded {} ({w}x{h})", path.display());
    Ok(img)
}

/// Checkerboard used to check orientation and seams: 8x4 cells on a gray ground.
pub fn debug_image(size: u32) -> RgbaImage {
    let (w, h) = (size.max(8), (size >> 1).max(4));
    let h_div = 8;
    let v_div = h_div / 2;
    let unit = (w / h_div).max(1);

    RgbaImage::from_fn(w, h, |x, y| {
        let (ch, cv) = (x / unit, y / unit);
        if ch < h_div && cv < v_div && (ch + cv) % 2 == 0 {
            DEBUG_COLORS[ch as usize % DEBUG_COLORS.len()]
        } else {
            DEBUG_BACKGROUND
        }
    })
}
