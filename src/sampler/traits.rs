use image::RgbImage;

use crate::errors::AssetScanResult;
use crate::sampler::types::VideoInfo;

/// Outcome of advancing a video source by one frame.
#[derive(Debug)]
pub enum ReadFrame {
    /// The frame was decoded and converted to RGB.
    Pixels(RgbImage),
    /// The frame was decoded but pixel conversion was not requested.
    Skipped,
    /// No more frames.
    End,
}

/// Sequential frame decoder. Implementations are consumed once, front to back.
pub trait VideoSource {
    fn info(&self) -> &VideoInfo;

    /// Advances one source frame. Pixels are only produced when `want_pixels` is set.
    fn read_frame(&mut self, want_pixels: bool) -> AssetScanResult<ReadFrame>;
}
