use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageError, RgbaImage};
use rfd::FileDialog;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::canvas::RasterSurface;
use crate::{log_err, log_info};

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Flattened raster export formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveFormat {
    #[default]
    Png,
    Bmp,
    Jpeg,
}

impl SaveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Bmp => "bmp",
            SaveFormat::Jpeg => "jpg",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SaveFormat::Png => "PNG (lossless)",
            SaveFormat::Bmp => "BMP (lossless)",
            SaveFormat::Jpeg => "JPEG",
        }
    }

    pub fn all() -> &'static [SaveFormat] {
        &[SaveFormat::Png, SaveFormat::Bmp, SaveFormat::Jpeg]
    }

    /// Accepts extensions and names: `png`, `bmp`, `jpg`, `jpeg` (any case).
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "png" => Some(SaveFormat::Png),
            "bmp" => Some(SaveFormat::Bmp),
            "jpg" | "jpeg" => Some(SaveFormat::Jpeg),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_key)
    }
}

/// Encode `image` into any writer.
pub fn encode_into<W: Write>(
    image: &RgbaImage,
    writer: &mut W,
    format: SaveFormat,
    quality: u8,
) -> Result<(), ImageError> {
    match format {
        SaveFormat::Png => {
            let encoder = PngEncoder::new(writer);
            #[allow(deprecated)]
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        SaveFormat::Jpeg => {
            let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100));
            encoder.encode(
                rgb_image.as_raw(),
                rgb_image.width(),
                rgb_image.height(),
                image::ColorType::Rgb8,
            )?;
        }
        SaveFormat::Bmp => {
            let mut encoder = BmpEncoder::new(writer);
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
    }
    Ok(())
}

/// Encode and write to `path`.
pub fn encode_and_write(
    image: &RgbaImage,
    path: &Path,
    format: SaveFormat,
    quality: u8,
) -> Result<(), ImageError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    encode_into(image, &mut writer, format, quality)?;
    writer.flush()?;
    Ok(())
}

/// Encode into memory (download buffers, tests).
pub fn encode_to_vec(image: &RgbaImage, format: SaveFormat, quality: u8) -> Result<Vec<u8>, ImageError> {
    let mut buf = Vec::new();
    encode_into(image, &mut buf, format, quality)?;
    Ok(buf)
}

/// Export the surface, logging the outcome. The surface is only read.
pub fn export_surface(
    surface: &RasterSurface,
    path: &Path,
    format: SaveFormat,
    quality: u8,
) -> Result<(), ImageError> {
    let result = encode_and_write(&surface.to_rgba_image(), path, format, quality);
    match &result {
        Ok(()) => {
            log_info!(
                "Exported {}x{} {} to {}",
                surface.width(),
                surface.height(),
                format.extension(),
                path.display()
            );
        }
        Err(e) => {
            log_err!("Export to {} failed: {}", path.display(), e);
        }
    }
    result
}

/// Native save dialog. The chosen extension decides the format, falling back
/// to `default_format` when it is missing or unknown.
pub fn pick_save_path(default_format: SaveFormat) -> Option<(PathBuf, SaveFormat)> {
    let path = FileDialog::new()
        .add_filter("PNG Image", &["png"])
        .add_filter("BMP Image", &["bmp"])
        .add_filter("JPEG Image", &["jpg", "jpeg"])
        .set_file_name(format!("drawing.{}", default_format.extension()))
        .save_file()?;
    let format = SaveFormat::from_path(&path).unwrap_or(default_format);
    Some((path, format))
}
