use super::{RgbFrame, VideoReader};
use anyhow::{anyhow, Context, Result};
use ffmpeg_next::ffi;
use std::path::Path;

/// Video reader backed by FFmpeg via ffmpeg-next (CPU decoding).
pub struct FfmpegReader {
    input_ctx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::codec::decoder::Video,
    video_stream_index: usize,
    /// Lazily created on first frame (source format is only known then).
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    width: u32,
    height: u32,
    source_fps: f64,
    total_frames: usize,
    frames_decoded: usize,
    /// Whether we've sent EOF to the decoder.
    eof_sent: bool,
}

impl FfmpegReader {
    pub fn new(path: &str) -> Result<Self> {
        ffmpeg_next::init().context("Failed to initialize FFmpeg")?;

        let source = Path::new(path);
        if !source.exists() {
            return Err(anyhow!("Video file not found: {}", path));
        }

        let input_ctx = ffmpeg_next::format::input(&source).context("Failed to open video file")?;

        let video_stream = input_ctx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| anyhow!("No video stream found in {}", path))?;

        let video_stream_index = video_stream.index();

        let rational_fps = video_stream.avg_frame_rate();
        let source_fps = if rational_fps.denominator() > 0 {
            rational_fps.numerator() as f64 / rational_fps.denominator() as f64
        } else {
            tracing::warn!("FfmpegReader: could not determine FPS, defaulting to 30.0");
            30.0
        };

        let stream_frames = video_stream.frames() as usize;
        let duration_secs = input_ctx.duration() as f64 / ffi::AV_TIME_BASE as f64;

        // Some containers do not carry a frame count; estimate from duration.
        let total_frames = if stream_frames == 0 {
            (duration_secs * source_fps).round() as usize
        } else {
            stream_frames
        };

        tracing::info!(
            "FfmpegReader: opened {}, duration={:.2}s, fps={:.2}, stream_frames={}, estimated_total={}",
            path,
            duration_secs,
            source_fps,
            stream_frames,
            total_frames
        );

        let decoder_ctx =
            ffmpeg_next::codec::context::Context::from_parameters(video_stream.parameters())
                .context("Failed to create decoder context")?;

        let decoder = decoder_ctx
            .decoder()
            .video()
            .context("Failed to open video decoder")?;

        let width = decoder.width();
        let height = decoder.height();

        Ok(Self {
            input_ctx,
            decoder,
            video_stream_index,
            scaler: None,
            width,
            height,
            source_fps,
            total_frames,
            frames_decoded: 0,
            eof_sent: false,
        })
    }

    /// Core decoding loop: receive a frame, feeding packets on demand.
    fn decode_next(&mut self) -> Result<ffmpeg_next::util::frame::Video> {
        let mut frame = ffmpeg_next::util::frame::Video::empty();
        loop {
            match self.decoder.receive_frame(&mut frame) {
                Ok(()) => return Ok(frame),
                Err(ffmpeg_next::Error::Other { errno: ffi::EAGAIN }) => {
                    if self.eof_sent {
                        return Err(anyhow!("End of stream"));
                    }
                }
                Err(ffmpeg_next::Error::Eof) => {
                    return Err(anyhow!("End of stream"));
                }
                Err(e) => return Err(anyhow!("Decoder error: {}", e)),
            }

            // Feed packets until we find a video packet or reach EOF.
            let mut packet = ffmpeg_next::codec::packet::Packet::empty();
            let mut found_packet = false;
            while packet.read(&mut self.input_ctx).is_ok() {
                if packet.stream() == self.video_stream_index {
                    self.decoder
                        .send_packet(&packet)
                        .context("Failed to send packet to decoder")?;
                    found_packet = true;
                    break;
                }
            }

            if !found_packet {
                self.decoder
                    .send_eof()
                    .context("Failed to send EOF to decoder")?;
                self.eof_sent = true;
            }
        }
    }

    fn get_or_create_scaler(
        &mut self,
        src_format: ffmpeg_next::format::Pixel,
    ) -> Result<&mut ffmpeg_next::software::scaling::Context> {
        if self.scaler.is_none() {
            let scaler = ffmpeg_next::software::scaling::Context::get(
                src_format,
                self.width,
                self.height,
                ffmpeg_next::format::Pixel::RGB24,
                self.width,
                self.height,
                ffmpeg_next::software::scaling::Flags::BILINEAR,
            )
            .context("Failed to create scaler")?;
            self.scaler = Some(scaler);
        }
        Ok(self.scaler.as_mut().unwrap())
    }

    fn seek_backward(&mut self, frame_num: usize) -> Result<()> {
        let time_secs = frame_num as f64 / self.source_fps;
        let timestamp = (time_secs * ffi::AV_TIME_BASE as f64) as i64;
        self.input_ctx
            .seek(timestamp, ..timestamp)
            .context("Failed to seek")?;
        self.decoder.flush();
        self.eof_sent = false;
        self.scaler = None; // reset scaler on seek (format might change)
        self.frames_decoded = frame_num;
        Ok(())
    }
}

/// Convert an RGB24 ffmpeg frame to a packed row-major buffer. The frame's
/// stride may be wider than the row, so rows are copied individually.
fn rgb_frame_to_packed(frame: &ffmpeg_next::util::frame::Video) -> Vec<u8> {
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let data = frame.data(0);
    let stride = frame.stride(0);

    let row_len = width * 3;
    let mut packed = Vec::with_capacity(height * row_len);
    for y in 0..height {
        let offset = y * stride;
        packed.extend_from_slice(&data[offset..offset + row_len]);
    }
    packed
}

impl VideoReader for FfmpegReader {
    fn frame_count(&self) -> Result<usize> {
        Ok(self.total_frames)
    }

    fn seek_to_frame(&mut self, frame_num: usize) -> Result<()> {
        if frame_num < self.frames_decoded {
            return self.seek_backward(frame_num);
        }
        // Decode-and-discard forward; sampling positions are non-decreasing
        // so this is the common path.
        while self.frames_decoded < frame_num {
            self.decode_next()?;
            self.frames_decoded += 1;
        }
        Ok(())
    }

    fn read_frame(&mut self) -> Result<RgbFrame> {
        let position = self.frames_decoded;
        let raw_frame = self.decode_next()?;

        let scaler = self.get_or_create_scaler(raw_frame.format())?;
        let mut rgb_frame = ffmpeg_next::util::frame::Video::empty();
        scaler.run(&raw_frame, &mut rgb_frame).context("Scaler failed")?;

        self.frames_decoded += 1;

        Ok(RgbFrame {
            position,
            width: rgb_frame.width(),
            height: rgb_frame.height(),
            data: rgb_frame_to_packed(&rgb_frame),
        })
    }
}
