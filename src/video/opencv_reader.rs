use super::{RgbFrame, VideoReader};
use anyhow::{anyhow, Result};
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{VideoCapture, CAP_ANY, CAP_PROP_FRAME_COUNT, CAP_PROP_POS_FRAMES},
};

/// Video reader backed by OpenCV's `VideoCapture`.
pub struct OpencvReader {
    capture: VideoCapture,
    total_frames: usize,
}

impl OpencvReader {
    pub fn new(path: &str) -> Result<Self> {
        let capture = VideoCapture::from_file(path, CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(anyhow!("Failed to open video file: {}", path));
        }

        let total_frames = capture.get(CAP_PROP_FRAME_COUNT)? as usize;
        tracing::info!(
            "OpencvReader: opened {}, stream_frames={}",
            path,
            total_frames
        );

        Ok(Self {
            capture,
            total_frames,
        })
    }
}

impl VideoReader for OpencvReader {
    fn frame_count(&self) -> Result<usize> {
        Ok(self.total_frames)
    }

    fn seek_to_frame(&mut self, frame_num: usize) -> Result<()> {
        self.capture.set(CAP_PROP_POS_FRAMES, frame_num as f64)?;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<RgbFrame> {
        let position = self.capture.get(CAP_PROP_POS_FRAMES)? as usize;

        let mut frame = Mat::default();
        let success = self.capture.read(&mut frame)?;
        if !success || frame.empty() {
            return Err(anyhow!("Failed to read frame"));
        }

        // VideoCapture decodes to BGR; the pipeline works in canonical RGB.
        let mut rgb = Mat::default();
        imgproc::cvt_color_def(&frame, &mut rgb, imgproc::COLOR_BGR2RGB)?;

        mat_to_rgb_frame(&rgb, position)
    }
}

/// Deep-copy an RGB Mat into a packed row-major buffer so the frame outlives
/// the capture's internal storage.
fn mat_to_rgb_frame(mat: &Mat, position: usize) -> Result<RgbFrame> {
    let size = mat.size()?;
    let width = size.width as u32;
    let height = size.height as u32;

    let data = if mat.is_continuous() {
        mat.data_bytes()?.to_vec()
    } else {
        let row_len = width as usize * 3;
        let mut packed = Vec::with_capacity(height as usize * row_len);
        for y in 0..size.height {
            let row = mat.at_row::<opencv::core::Vec3b>(y)?;
            for px in row {
                packed.extend_from_slice(&px.0);
            }
        }
        packed
    };

    Ok(RgbFrame {
        position,
        width,
        height,
        data,
    })
}
