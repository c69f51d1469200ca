//! # framesampler
//!
//! Decode selected frames from compressed video into packed RGB24 buffers,
//! ready to be handed to a model as one contiguous tensor.
//!
//! Frames are addressed by index, but containers only carry timestamps.
//! The sampler reconstructs indices from presentation timestamps with one of
//! two [`IndexMode`]s, can seek near the first requested frame, and pads the
//! output by replaying earlier frames when the stream ends early so a
//! successful call always fills the whole buffer.
//!
//! ## Quick Start
//!
//! ### Sample specific frames
//!
//! ```no_run
//! use framesampler::{SamplingOptions, VideoStreamContext};
//!
//! let bytes = std::fs::read("input.mp4")?;
//! let mut stream = VideoStreamContext::from_bytes(bytes)?;
//!
//! let targets = [0, 15, 30, 45];
//! let mut buffer = vec![0u8; stream.layout().buffer_len(targets.len())];
//! stream.sample_frames(&mut buffer, &targets, &SamplingOptions::new().with_seek(true))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### Sample a random clip
//!
//! ```no_run
//! use framesampler::{KeyframeSeekPlanner, ScalingAlgorithm, VideoStreamContext};
//!
//! let mut stream = VideoStreamContext::open("input.mp4")?;
//! let mut planner = KeyframeSeekPlanner::with_seed(42);
//! let mut clip = vec![0u8; stream.layout().buffer_len(16)];
//! let report = stream.sample_random_clip(&mut clip, 16, &mut planner, ScalingAlgorithm::Bilinear)?;
//! if let Some(plan) = report.seek {
//!     println!("started {:.2}s in", plan.seek_distance_seconds);
//! }
//! # Ok::<(), framesampler::SamplerError>(())
//! ```
//!
//! ## Custom sources
//!
//! [`FrameSampler`] is generic over [`FrameSource`] and [`PixelPacker`], so
//! the sampling logic can be driven by anything that yields timestamped
//! frames.
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `rayon` | [`batch::sample_clips_parallel`] samples many videos across rayon threads |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

#[cfg(feature = "rayon")]
pub mod batch;
pub mod config;
pub mod context;
mod conversion;
pub mod error;
pub mod ffmpeg;
pub mod index_model;
pub mod layout;
pub mod memory_io;
pub mod metadata;
pub mod packer;
pub mod planner;
mod probe;
pub mod reconciler;
pub mod sampler;
pub mod source;
pub mod wraparound;

#[cfg(feature = "rayon")]
pub use batch::{SampledClip, sample_clips_parallel};
pub use config::{DEFAULT_IO_BUFFER_SIZE, SamplingOptions, ScalingAlgorithm, StreamOptions};
pub use context::VideoStreamContext;
pub use error::SamplerError;
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use index_model::{AverageDurationModel, FrameCursor, IndexMode, IndexModel, RawTimebaseModel};
pub use layout::{BYTES_PER_PIXEL, FrameLayout, frame_image};
pub use memory_io::{MemoryCursor, Whence};
pub use metadata::StreamMetadata;
pub use packer::{PixelPacker, RgbPacker};
pub use planner::{KeyframeSeekPlanner, SeekPlan};
pub use reconciler::{reconcile_after_seek, skip_past_timestamp};
pub use sampler::{FrameSampler, SampleReport};
pub use source::{DecodeStatus, FrameSource};
pub use wraparound::pad_by_replay;
