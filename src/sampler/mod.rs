//! Frame sampling: decodes a video source and keeps one frame per interval.
pub mod ffmpeg_source;
pub mod frames;
pub mod synthetic;
pub mod traits;
pub mod types;

pub use frames::{frame_step, FrameSampler};
pub use types::{Frame, SampleOutput, VideoInfo};
