// Image pipeline: each upload is re-encoded and submitted exactly once,
// independently of every other upload.

use crate::detect::{DetectionClient, DetectionOutcome};
use crate::encode::reencode_image;
use crate::media::UploadedMedia;
use crate::pipeline::report::ImageReport;

/// Submit each image once; a failure for one image never affects another.
pub fn run_image_pipeline(images: &[UploadedMedia], client: &DetectionClient) -> Vec<ImageReport> {
    images
        .iter()
        .map(|media| {
            let outcome = match reencode_image(media) {
                Ok(bytes) => client.detect(bytes, &media.name, &media.mime),
                Err(e) => {
                    tracing::warn!("{}: {:#}", media.name, e);
                    DetectionOutcome::Failed(format!("{:#}", e))
                }
            };
            ImageReport {
                name: media.name.clone(),
                outcome,
            }
        })
        .collect()
}
