use crate::media::UploadedMedia;
use crate::video::RgbFrame;
use anyhow::{anyhow, Context, Result};
use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// Encode a packed RGB frame as PNG for transport.
pub fn encode_png(frame: &RgbFrame) -> Result<Vec<u8>> {
    let buffer: RgbImage =
        ImageBuffer::<Rgb<u8>, _>::from_raw(frame.width, frame.height, frame.data.clone())
            .ok_or_else(|| {
                anyhow!(
                    "Pixel buffer does not match {}x{} RGB frame",
                    frame.width,
                    frame.height
                )
            })?;

    let mut bytes = Vec::new();
    buffer
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .context("PNG encoding failed")?;
    Ok(bytes)
}

/// Decode an uploaded image and re-encode it in its detected original format.
pub fn reencode_image(media: &UploadedMedia) -> Result<Vec<u8>> {
    let format = image::guess_format(&media.bytes)
        .with_context(|| format!("Could not detect image format of {}", media.name))?;
    let decoded = image::load_from_memory_with_format(&media.bytes, format)
        .with_context(|| format!("Failed to decode {}", media.name))?;

    let mut bytes = Vec::new();
    decoded
        .write_to(&mut Cursor::new(&mut bytes), format)
        .with_context(|| format!("Failed to re-encode {}", media.name))?;
    Ok(bytes)
}
