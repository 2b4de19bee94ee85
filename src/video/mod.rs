pub mod ffmpeg_reader;
pub mod opencv_reader;

use anyhow::{bail, Context, Result};

use ffmpeg_reader::FfmpegReader;
use opencv_reader::OpencvReader;

/// A single decoded frame in packed RGB24, row-major, plus its source
/// frame position.
pub struct RgbFrame {
    pub position: usize,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

pub trait VideoReader {
    fn frame_count(&self) -> Result<usize>;
    fn seek_to_frame(&mut self, frame_num: usize) -> Result<()>;
    fn read_frame(&mut self) -> Result<RgbFrame>;
}

/// Create a reader for the selected backend.
pub fn open_reader(path: &str, backend: &str) -> Result<Box<dyn VideoReader>> {
    match backend {
        "ffmpeg" => Ok(Box::new(
            FfmpegReader::new(path)
                .with_context(|| format!("Failed to open video with ffmpeg at: '{}'", path))?,
        )),
        "opencv" => Ok(Box::new(
            OpencvReader::new(path)
                .with_context(|| format!("Failed to open video at: '{}'", path))?,
        )),
        other => bail!("Unsupported backend: {}", other),
    }
}

/// Frame positions for `n` evenly spaced samples over `total` frames:
/// position(i) = round(i * (total - 1) / (n - 1)).
///
/// Duplicate positions are kept when `total < n`; a one-frame source maps
/// every sample to position 0.
pub fn sample_positions(total: usize, n: usize) -> Vec<usize> {
    if total == 0 || n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![0];
    }
    (0..n)
        .map(|i| (i as f64 * (total - 1) as f64 / (n - 1) as f64).round() as usize)
        .collect()
}

/// Sample up to `n` evenly spaced frames, in non-decreasing position order.
///
/// A position where seeking or decoding fails is skipped, so the result may
/// be shorter than `n`. The reader is owned by the call and released on
/// every exit path.
pub fn sample_frames(mut reader: Box<dyn VideoReader>, n: usize) -> Result<Vec<RgbFrame>> {
    let total = reader.frame_count()?;
    let mut frames = Vec::new();

    for position in sample_positions(total, n) {
        if let Err(e) = reader.seek_to_frame(position) {
            tracing::debug!("Skipping frame {}: seek failed: {}", position, e);
            continue;
        }
        match reader.read_frame() {
            Ok(mut frame) => {
                frame.position = position;
                frames.push(frame);
            }
            Err(e) => tracing::debug!("Skipping frame {}: decode failed: {}", position, e),
        }
    }

    Ok(frames)
}
