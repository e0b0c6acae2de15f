use image::{Rgb, RgbImage};

use crate::errors::AssetScanResult;
use crate::sampler::traits::{ReadFrame, VideoSource};
use crate::sampler::types::VideoInfo;

/// Deterministic in-memory video: `total_frames` frames of a colour ramp that
/// shifts with the frame position. Useful for dry runs and tests.
pub struct SyntheticSource {
    info: VideoInfo,
    total_frames: u64,
    position: u64,
}

impl SyntheticSource {
    pub fn new(fps: Option<f64>, total_frames: u64, width: u32, height: u32) -> Self {
        Self {
            info: VideoInfo {
                fps,
                frame_count: Some(total_frames),
                width,
                height,
            },
            total_frames,
            position: 0,
        }
    }

    /// A `seconds` long clip at `fps`, 32x24 pixels.
    pub fn with_duration(fps: f64, seconds: f64) -> Self {
        let total = (fps * seconds).round() as u64;
        Self::new(Some(fps), total, 32, 24)
    }

    fn render(&self, position: u64) -> RgbImage {
        let shade = (position % 256) as u8;
        RgbImage::from_fn(self.info.width, self.info.height, |x, y| {
            Rgb([shade, (x % 256) as u8, (y % 256) as u8])
        })
    }
}

impl VideoSource for SyntheticSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn read_frame(&mut self, want_pixels: bool) -> AssetScanResult<ReadFrame> {
        if self.position >= self.total_frames {
            return Ok(ReadFrame::End);
        }
        let position = self.position;
        self.position += 1;
        if want_pixels {
            Ok(ReadFrame::Pixels(self.render(position)))
        } else {
            Ok(ReadFrame::Skipped)
        }
    }
}
