//! Image decoding and JPEG persistence.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::error::{Error, Result};
use crate::model::ImageData;

/// Converts page image payloads to RGB JPEG files.
#[derive(Debug, Clone, Copy)]
pub struct ImageCodec {
    quality: u8,
}

impl ImageCodec {
    /// Create a codec writing JPEGs at `quality` (1-100).
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Decode a payload into 8-bit RGB.
    pub fn decode(&self, data: &ImageData) -> Result<RgbImage> {
        match data {
            ImageData::Encoded(bytes) => Ok(image::load_from_memory(bytes)?.to_rgb8()),
            ImageData::Raw {
                width,
                height,
                components,
                samples,
            } => rgb_from_samples(*width, *height, *components, samples),
            ImageData::Missing => Err(Error::ImageDecode("no image payload".into())),
        }
    }

    /// Decode and write `data` as a JPEG at `path`, creating parent directories.
    pub fn persist(&self, data: &ImageData, path: &Path) -> Result<()> {
        let rgb = self.decode(data)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        let mut encoder = JpegEncoder::new_with_quality(&mut writer, self.quality);
        encoder.encode_image(&rgb)?;
        writer.flush()?;
        Ok(())
    }
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self::new(90)
    }
}

fn rgb_from_samples(width: u32, height: u32, components: u8, samples: &[u8]) -> Result<RgbImage> {
    if width == 0 || height == 0 {
        return Err(Error::ImageDecode(format!(
            "empty image dimensions {}x{}",
            width, height
        )));
    }
    let pixels = width as usize * height as usize;
    let needed = pixels * components as usize;
    if samples.len() < needed {
        return Err(Error::ImageDecode(format!(
            "expected {} samples for {}x{}x{}, got {}",
            needed,
            width,
            height,
            components,
            samples.len()
        )));
    }

    let buf: Vec<u8> = match components {
        1 => samples[..pixels].iter().flat_map(|&g| [g, g, g]).collect(),
        3 => samples[..needed].to_vec(),
        4 => samples[..needed]
            .chunks_exact(4)
            .flat_map(|cmyk| {
                let k = 255 - u16::from(cmyk[3]);
                let channel = |c: u8| ((255 - u16::from(c)) * k / 255) as u8;
                [channel(cmyk[0]), channel(cmyk[1]), channel(cmyk[2])]
            })
            .collect(),
        other => {
            return Err(Error::ImageDecode(format!(
                "unsupported component count {}",
                other
            )))
        }
    };

    RgbImage::from_raw(width, height, buf)
        .ok_or_else(|| Error::ImageDecode("sample buffer does not match dimensions".into()))
}
