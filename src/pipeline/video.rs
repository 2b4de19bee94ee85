// Video pipeline: stage the upload, sample frames, submit each one in order.
//
// Stages run strictly sequentially on the calling thread. Detection failures
// degrade per frame; anything else propagates to the caller, and the temp
// file guard cleans up on every exit path.

use crate::detect::{DetectionClient, DetectionOutcome};
use crate::encode::encode_png;
use crate::media::{TempMedia, UploadedMedia};
use crate::pipeline::report::{FrameReport, VideoReport};
use crate::video::{open_reader, sample_frames, RgbFrame};
use anyhow::{anyhow, Result};
use chrono::Utc;

/// Per-invocation context for one video run.
pub struct VideoRun {
    pub media: UploadedMedia,
    pub frames: usize,
    pub backend: String,
}

/// Run the full pipeline for one uploaded video.
///
/// `progress` is called with `(submitted, total)` after each frame's result
/// (or non-result) is recorded; the fraction is monotonically non-decreasing
/// and reaches 1.0 only after the last frame.
pub fn run_video_pipeline(
    run: &VideoRun,
    client: &DetectionClient,
    progress: &mut dyn FnMut(usize, usize),
) -> Result<VideoReport> {
    let temp = TempMedia::write(&run.media)?;
    tracing::info!(
        "Received {} ({:.2} KB), staged at {}",
        run.media.name,
        run.media.size_kb(),
        temp.path().display()
    );

    let path = temp
        .path()
        .to_str()
        .ok_or_else(|| anyhow!("Temp path is not valid UTF-8"))?;
    let reader = open_reader(path, &run.backend)?;
    let frames = sample_frames(reader, run.frames)?;
    tracing::info!(
        "Extracted {} of {} requested frames",
        frames.len(),
        run.frames
    );

    let results = submit_frames(&frames, client, progress)?;

    Ok(VideoReport {
        source: run.media.name.clone(),
        frames_sampled: frames.len(),
        generated_at: Utc::now(),
        frames: results,
    })
}

/// Submit frames strictly in order. A detection failure becomes "no data"
/// for that frame and the loop continues; encoder errors propagate.
pub fn submit_frames(
    frames: &[RgbFrame],
    client: &DetectionClient,
    progress: &mut dyn FnMut(usize, usize),
) -> Result<Vec<FrameReport>> {
    let total = frames.len();
    let mut reports = Vec::with_capacity(total);

    for (i, frame) in frames.iter().enumerate() {
        let bytes = encode_png(frame)?;
        let outcome = client.detect(bytes, "frame.png", "image/png");
        if let DetectionOutcome::Failed(reason) = &outcome {
            tracing::warn!("Frame {}: {}", i + 1, reason);
        }

        reports.push(FrameReport {
            frame: i + 1,
            position: frame.position,
            plaques: outcome.plaques(),
        });
        progress(i + 1, total);
    }

    Ok(reports)
}
