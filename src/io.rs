//! Codec glue: decode files into [`PixelBuffer`]s and encode them back.
//! The transform engine itself never touches files.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageEncoder};

use crate::buffer::PixelBuffer;
use crate::error::{EngineError, Result};

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    Png,
    Jpeg,
    Bmp,
}

impl SaveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Bmp => "bmp",
        }
    }

    /// Format named by `name` (`png`, `jpg`/`jpeg`, `bmp`), case-insensitive.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "png" => Ok(SaveFormat::Png),
            "jpg" | "jpeg" => Ok(SaveFormat::Jpeg),
            "bmp" => Ok(SaveFormat::Bmp),
            _ => Err(EngineError::UnsupportedFormat(name.to_string())),
        }
    }

    /// Format implied by the file extension. A path without one is PNG; an
    /// unrecognized extension is an error rather than a mislabeled file.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension() {
            Some(ext) => Self::from_name(&ext.to_string_lossy()),
            None => Ok(SaveFormat::Png),
        }
    }
}

/// Decode any supported file into an RGBA buffer.
pub fn load_buffer(path: &Path) -> Result<PixelBuffer> {
    let img = image::open(path)?.to_rgba8();
    log::info!("loaded {} ({}x{})", path.display(), img.width(), img.height());
    PixelBuffer::from_rgba(img)
}

/// Encode `buffer` in the format implied by `path`'s extension.
pub fn save_buffer(buffer: &PixelBuffer, path: &Path) -> Result<()> {
    save_buffer_as(buffer, path, SaveFormat::from_path(path)?, DEFAULT_JPEG_QUALITY)
}

pub fn save_buffer_as(buffer: &PixelBuffer, path: &Path, format: SaveFormat, quality: u8) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let (w, h) = buffer.dimensions();

    match format {
        SaveFormat::Png => {
            PngEncoder::new(&mut writer).write_image(buffer.as_raw(), w, h, image::ColorType::Rgba8)?;
        }
        SaveFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgba8(buffer.as_rgba().clone()).to_rgb8();
            JpegEncoder::new_with_quality(&mut writer, quality).write_image(
                rgb.as_raw(),
                w,
                h,
                image::ColorType::Rgb8,
            )?;
        }
        SaveFormat::Bmp => {
            BmpEncoder::new(&mut writer).write_image(buffer.as_raw(), w, h, image::ColorType::Rgba8)?;
        }
    }
    log::info!("saved {} as {}", path.display(), format.extension());
    Ok(())
}
