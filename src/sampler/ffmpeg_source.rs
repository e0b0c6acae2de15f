use std::path::Path;

use ffmpeg_next as ffmpeg;
use image::RgbImage;

use crate::errors::{AssetScanError, AssetScanResult};
use crate::sampler::traits::{ReadFrame, VideoSource};
use crate::sampler::types::VideoInfo;

/// Decodes the best video stream of a file with FFmpeg, one frame at a time.
pub struct FfmpegSource {
    input: ffmpeg::format::context::Input,
    decoder: ffmpeg::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    stream_index: usize,
    info: VideoInfo,
    decoded: ffmpeg::util::frame::video::Video,
    eof_sent: bool,
}

impl FfmpegSource {
    /// Opens `path` read-only. Any failure to open or locate a decodable video
    /// stream is reported as `SourceUnavailable`.
    pub fn open<P: AsRef<Path>>(path: P) -> AssetScanResult<Self> {
        let path = path.as_ref();
        let unavailable = |what: &str, e: ffmpeg::Error| {
            AssetScanError::SourceUnavailable(format!("{}: {what}: {e}", path.display()))
        };

        ffmpeg::init().map_err(|e| unavailable("failed to initialize FFmpeg", e))?;

        let input = ffmpeg::format::input(&path)
            .map_err(|e| unavailable("failed to open video file", e))?;

        let stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| {
                AssetScanError::SourceUnavailable(format!("{}: no video stream", path.display()))
            })?;
        let stream_index = stream.index();
        let fps = rational_fps(stream.avg_frame_rate()).or_else(|| rational_fps(stream.rate()));
        let frame_count = u64::try_from(stream.frames()).ok().filter(|n| *n > 0);

        let context = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| unavailable("failed to create codec context", e))?;
        let decoder = context
            .decoder()
            .video()
            .map_err(|e| unavailable("failed to create video decoder", e))?;

        let scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::format::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .map_err(|e| unavailable("failed to create scaler", e))?;

        let info = VideoInfo {
            fps,
            frame_count,
            width: decoder.width(),
            height: decoder.height(),
        };
        tracing::debug!(
            path = %path.display(),
            fps = ?info.fps,
            frames = ?info.frame_count,
            width = info.width,
            height = info.height,
            "video opened"
        );

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index,
            info,
            decoded: ffmpeg::util::frame::video::Video::empty(),
            eof_sent: false,
        })
    }

    fn next_packet(&mut self) -> Option<ffmpeg::Packet> {
        let index = self.stream_index;
        self.input
            .packets()
            .find(|(stream, _)| stream.index() == index)
            .map(|(_, packet)| packet)
    }

    fn convert_current(&mut self) -> AssetScanResult<RgbImage> {
        let mut rgb = ffmpeg::util::frame::video::Video::empty();
        self.scaler
            .run(&self.decoded, &mut rgb)
            .map_err(|e| AssetScanError::Decode(format!("failed to scale frame: {e}")))?;
        rgb_frame_to_image(&rgb)
    }
}

impl VideoSource for FfmpegSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn read_frame(&mut self, want_pixels: bool) -> AssetScanResult<ReadFrame> {
        loop {
            if self.decoder.receive_frame(&mut self.decoded).is_ok() {
                if !want_pixels {
                    return Ok(ReadFrame::Skipped);
                }
                return self.convert_current().map(ReadFrame::Pixels);
            }
            if self.eof_sent {
                return Ok(ReadFrame::End);
            }
            match self.next_packet() {
                Some(packet) => {
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        tracing::warn!(error = %e, "dropping undecodable packet");
                    }
                }
                None => {
                    self.decoder.send_eof().map_err(|e| {
                        AssetScanError::Decode(format!("failed to flush decoder: {e}"))
                    })?;
                    self.eof_sent = true;
                }
            }
        }
    }
}

fn rational_fps(rate: ffmpeg::Rational) -> Option<f64> {
    if rate.numerator() <= 0 || rate.denominator() <= 0 {
        return None;
    }
    let fps = f64::from(rate);
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

/// Copies an RGB24 frame into a tightly packed image, dropping row padding.
fn rgb_frame_to_image(frame: &ffmpeg::util::frame::video::Video) -> AssetScanResult<RgbImage> {
    let width = frame.width();
    let height = frame.height();
    let stride = frame.stride(0);
    let row_len = width as usize * 3;
    let data = frame.data(0);

    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        let end = start + row_len;
        let line = data
            .get(start..end)
            .ok_or_else(|| AssetScanError::Decode(format!("short frame buffer at row {row}")))?;
        pixels.extend_from_slice(line);
    }

    RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| AssetScanError::Decode("failed to create image buffer from frame".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rates_are_unknown() {
        assert_eq!(rational_fps(ffmpeg::Rational::new(0, 1)), None);
        assert_eq!(rational_fps(ffmpeg::Rational::new(30, 0)), None);
        assert_eq!(rational_fps(ffmpeg::Rational::new(30000, 1001)).map(|f| f.round()), Some(30.0));
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let result = FfmpegSource::open("/nonexistent/walkthrough.mov");
        assert!(matches!(result, Err(AssetScanError::SourceUnavailable(_))));
    }
}
