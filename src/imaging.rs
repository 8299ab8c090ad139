use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, Rgb, RgbImage};

use crate::error::Result;

pub const JPEG_QUALITY: u8 = 95;
pub const PLACEHOLDER_SIZE: u32 = 1024;

/// Drops any alpha channel by compositing onto white.
pub fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = a as u16;
        let blend = |c: u8| ((c as u16 * a + 255 * (255 - a)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Decodes whatever the image model returned and writes it as a baseline JPEG.
pub fn save_as_jpeg(bytes: &[u8], dest: &Path) -> Result<()> {
    let img = image::load_from_memory(bytes)?;
    write_jpeg(&flatten_on_white(&img), dest)
}

fn write_jpeg(rgb: &RgbImage, dest: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(dest)?);
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ColorType::Rgb8,
    )?;
    out.flush()?;
    Ok(())
}

/// Solid-colour square standing in for a generated image.
pub fn write_placeholder(index: u8, dest: &Path) -> Result<()> {
    let color = Rgb([50u8.saturating_add(index.saturating_mul(50)), 100, 150]);
    let img = RgbImage::from_pixel(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, color);
    write_jpeg(&img, dest)
}
