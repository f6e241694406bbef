//! Image → classifier input.
//!
//! Uploaded X-rays are decoded as single-channel intensity, resized to
//! 64×64 with a Lanczos3 (anti-aliasing) filter, flattened row-major and
//! scaled to [0, 1].

use std::path::Path;

use image::imageops::{self, FilterType};
use image::ImageFormat;
use thiserror::Error;

/// Side length of the square network input.
pub const IMAGE_SIDE: u32 = 64;
/// Length of the flattened input vector.
pub const INPUT_LEN: usize = (IMAGE_SIDE * IMAGE_SIDE) as usize;

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("Could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Could not read image file {path}: {source}")]
    Io { path: String, source: std::io::Error },
}

/// Decodes image bytes (PNG/JPEG/BMP/GIF) into a normalized 4096-vector.
pub fn grayscale_input(bytes: &[u8]) -> Result<Vec<f64>, PreprocessError> {
    let img = image::load_from_memory(bytes)?;
    Ok(to_input(&img))
}

/// Same as [`grayscale_input`] for a file on disk.
pub fn grayscale_input_from_path(path: &Path) -> Result<Vec<f64>, PreprocessError> {
    let bytes = std::fs::read(path).map_err(|source| PreprocessError::Io {
        path: path.display().to_string(),
        source,
    })?;
    grayscale_input(&bytes)
}

fn to_input(img: &image::DynamicImage) -> Vec<f64> {
    let gray = img.to_luma8();
    let resized = imageops::resize(&gray, IMAGE_SIDE, IMAGE_SIDE, FilterType::Lanczos3);
    resized.pixels().map(|p| p.0[0] as f64 / 255.0).collect()
}

/// Sniffs the container format so uploads can be rejected before they are
/// stored. Returns the canonical file extension.
pub fn detect_extension(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        format @ (ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Bmp | ImageFormat::Gif) => {
            format.extensions_str().first().copied()
        }
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod test_images {
    use std::io::Cursor;

    use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Luma};

    /// A `w`×`h` PNG with a horizontal gradient.
    pub fn gradient_png(w: u32, h: u32) -> Vec<u8> {
        let buf = ImageBuffer::from_fn(w, h, |x, _y| Luma([((x * 255) / w.max(1)) as u8]));
        encode(DynamicImage::ImageLuma8(buf))
    }

    /// A solid-colour RGB PNG.
    pub fn solid_rgb_png(w: u32, h: u32, rgb: [u8; 3]) -> Vec<u8> {
        let buf = ImageBuffer::from_pixel(w, h, image::Rgb(rgb));
        encode(DynamicImage::ImageRgb8(buf))
    }

    fn encode(img: DynamicImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageOutputFormat::Png).unwrap();
        out.into_inner()
    }
}
