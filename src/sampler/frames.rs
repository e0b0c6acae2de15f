use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::errors::{AssetScanError, AssetScanResult};
use crate::sampler::ffmpeg_source::FfmpegSource;
use crate::sampler::traits::{ReadFrame, VideoSource};
use crate::sampler::types::{Frame, SampleOutput};

/// Number of source frames between two samples: `round(fps * interval)`, at least 1.
pub fn frame_step(fps: f64, interval_seconds: f64) -> AssetScanResult<u64> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(AssetScanError::UnknownFrameRate);
    }
    if !interval_seconds.is_finite() || interval_seconds <= 0.0 {
        return Err(AssetScanError::Config(format!(
            "sampling interval must be positive, got {interval_seconds}"
        )));
    }
    Ok(((fps * interval_seconds).round() as u64).max(1))
}

pub struct FrameSampler {
    interval_seconds: f64,
    output_dir: PathBuf,
    jpeg_quality: u8,
}

impl FrameSampler {
    pub fn new(interval_seconds: f64, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            interval_seconds,
            output_dir: output_dir.into(),
            jpeg_quality: 85,
        }
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Opens `video_path` with FFmpeg and samples it.
    pub fn sample_file(&self, video_path: &Path) -> AssetScanResult<SampleOutput> {
        let mut source = FfmpegSource::open(video_path)?;
        self.sample(&mut source)
    }

    /// Reads `source` front to back and keeps every frame whose offset is a
    /// multiple of the step. Each kept frame is written to
    /// `<output_dir>/frame_<offset>.jpg`, overwriting earlier runs.
    ///
    /// A source that decodes no frames yields an empty output, not an error.
    pub fn sample(&self, source: &mut dyn VideoSource) -> AssetScanResult<SampleOutput> {
        let fps = source.info().fps.ok_or(AssetScanError::UnknownFrameRate)?;
        let step = frame_step(fps, self.interval_seconds)?;

        std::fs::create_dir_all(&self.output_dir)?;

        tracing::info!(
            fps = fps,
            interval_seconds = self.interval_seconds,
            step = step,
            output_dir = %self.output_dir.display(),
            "sampling video"
        );

        let mut frames = Vec::new();
        let mut offset: u64 = 0;
        loop {
            let wanted = offset % step == 0;
            match source.read_frame(wanted)? {
                ReadFrame::End => break,
                ReadFrame::Pixels(image) if wanted => {
                    let frame = self.persist(frames.len(), offset, image)?;
                    tracing::debug!(
                        index = frame.index(),
                        offset = offset,
                        path = %frame.path().display(),
                        "frame sampled"
                    );
                    frames.push(frame);
                }
                ReadFrame::Skipped if wanted => {
                    return Err(AssetScanError::Decode(format!(
                        "source skipped requested frame {offset}"
                    )));
                }
                ReadFrame::Pixels(_) | ReadFrame::Skipped => {}
            }
            offset += 1;
        }

        tracing::info!(frames = frames.len(), decoded = offset, "sampling complete");
        if frames.is_empty() {
            tracing::warn!("video decoded no frames");
        }

        Ok(SampleOutput { frames, fps, step })
    }

    fn persist(&self, index: usize, offset: u64, image: RgbImage) -> AssetScanResult<Frame> {
        let mut encoded = Vec::new();
        image.write_with_encoder(JpegEncoder::new_with_quality(&mut encoded, self.jpeg_quality))?;

        let path = self.output_dir.join(frame_file_name(offset));
        std::fs::write(&path, &encoded)?;

        Ok(Frame::new(index, offset, image, encoded, path))
    }
}

pub fn frame_file_name(offset: u64) -> String {
    format!("frame_{offset}.jpg")
}
