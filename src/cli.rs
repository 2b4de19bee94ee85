use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Detection API endpoint URL
    #[arg(long, env = "PLAQUE_RELAY_ENDPOINT")]
    pub endpoint: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Submit one or more images for plaque detection
    Image {
        /// Image files (jpg, jpeg, png)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Sample evenly spaced frames from a video and submit each one
    Video {
        /// Video file (mp4, mov, mkv)
        file: PathBuf,

        /// Number of evenly spaced frames to sample
        #[arg(long, default_value_t = 6)]
        frames: usize,

        /// Video decode backend ("opencv" or "ffmpeg")
        #[arg(long, default_value = "opencv")]
        backend: String,
    },
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
