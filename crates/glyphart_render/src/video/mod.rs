//! Video conversion: sampling a time window, rendering every sampled frame
//! and reassembling the result with its audio.

pub mod ffmpeg;
pub mod pipeline;
pub mod source;
pub mod timing;

pub use pipeline::{PipelineOptions, PipelineReport, PipelineState, Progress, VideoPipeline};
pub use source::{AudioClip, AudioSource, VideoMetadata, VideoSink, VideoSource, VideoStream};
pub use timing::{SampleSchedule, TimeWindow};
