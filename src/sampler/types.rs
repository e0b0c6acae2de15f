use std::path::{Path, PathBuf};

use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Stream properties reported by a video source when it is opened.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoInfo {
    /// Native frame rate. `None` when the container does not report one.
    pub fps: Option<f64>,
    /// Total frame count, if the container declares it. Informational only.
    pub frame_count: Option<u64>,
    pub width: u32,
    pub height: u32,
}

/// One sampled still image. Immutable once produced.
#[derive(Debug, Clone)]
pub struct Frame {
    index: usize,
    source_offset_frames: u64,
    image: RgbImage,
    encoded: Vec<u8>,
    path: PathBuf,
}

impl Frame {
    pub(crate) fn new(
        index: usize,
        source_offset_frames: u64,
        image: RgbImage,
        encoded: Vec<u8>,
        path: PathBuf,
    ) -> Self {
        Self {
            index,
            source_offset_frames,
            image,
            encoded,
            path,
        }
    }

    /// Zero-based position in the sampled sequence.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Position of this frame in the source video, counted in source frames.
    pub fn source_offset_frames(&self) -> u64 {
        self.source_offset_frames
    }

    /// Raw RGB24 pixel payload, row-major without padding.
    pub fn image_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// JPEG bytes, identical to what was written to `path()`.
    pub fn encoded_jpeg(&self) -> &[u8] {
        &self.encoded
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Result of one sampling pass.
#[derive(Debug, Clone)]
pub struct SampleOutput {
    pub frames: Vec<Frame>,
    pub fps: f64,
    /// Source frames between two consecutive samples.
    pub step: u64,
}

impl SampleOutput {
    pub fn count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn offsets(&self) -> Vec<u64> {
        self.frames.iter().map(Frame::source_offset_frames).collect()
    }
}
