mod cli;

use anyhow::Result;
use cli::{Args, Command};
use indicatif::{ProgressBar, ProgressStyle};
use plaque_relay::detect::{DetectionClient, DetectionOutcome};
use plaque_relay::media::{UploadedMedia, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
use plaque_relay::pipeline::image::run_image_pipeline;
use plaque_relay::pipeline::video::{run_video_pipeline, VideoRun};

fn main() -> Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args = Args::parse_args();
    let client = DetectionClient::new(&args.endpoint)?;

    match args.command {
        Command::Image { files } => run_images(&files, &client),
        Command::Video {
            file,
            frames,
            backend,
        } => run_video(&file, frames, backend, &client),
    }
}

fn run_images(files: &[std::path::PathBuf], client: &DetectionClient) -> Result<()> {
    let mut images = Vec::with_capacity(files.len());
    for file in files {
        images.push(UploadedMedia::from_path(file, IMAGE_EXTENSIONS)?);
    }

    for media in &images {
        println!(
            "{} ({}, {:.2} KB)",
            media.name,
            media.mime,
            media.size_kb()
        );
    }

    let reports = run_image_pipeline(&images, client);
    let mut failures = 0usize;
    for report in reports {
        match report.outcome {
            DetectionOutcome::Detected(body) => {
                println!("{}:", report.name);
                println!("{}", serde_json::to_string_pretty(&body)?);
            }
            DetectionOutcome::Failed(reason) => {
                failures += 1;
                eprintln!("{}: {}", report.name, reason);
            }
        }
    }

    if failures > 0 {
        tracing::warn!("{} image(s) produced no result", failures);
    }
    Ok(())
}

fn run_video(
    file: &std::path::Path,
    frames: usize,
    backend: String,
    client: &DetectionClient,
) -> Result<()> {
    let media = UploadedMedia::from_path(file, VIDEO_EXTENSIONS)?;
    println!(
        "{} ({}, {:.2} KB)",
        media.name,
        media.mime,
        media.size_kb()
    );

    let pb = ProgressBar::new(frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("#>-"),
    );

    let run = VideoRun {
        media,
        frames,
        backend,
    };
    let mut progress = |submitted: usize, total: usize| {
        pb.set_length(total as u64);
        pb.set_position(submitted as u64);
    };

    let report = run_video_pipeline(&run, client, &mut progress)?;
    pb.finish_and_clear();

    for frame in &report.frames {
        for line in frame.render_lines() {
            println!("{}", line);
        }
    }
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
