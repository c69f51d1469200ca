//! Error types for the `framesampler` crate.
//!
//! This module defines [`SamplerError`], the unified error type returned by
//! every fallible operation in the crate. End of stream is not an error: it
//! is reported through [`DecodeStatus::EndOfStream`](crate::DecodeStatus) and
//! normally ends in buffer padding.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `framesampler` operations.
///
/// Decode failures are fatal for the sampling call that hit them. Caller
/// input defects (unordered targets, a target behind the decoder position,
/// a seek that landed past its target, nothing to pad from) have their own
/// variants so they fail loudly instead of being coerced.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SamplerError {
    /// The media file could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoStreamContext::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The in-memory input could not be recognised as a container format.
    #[error("Failed to probe input format: {0}")]
    FormatProbe(String),

    /// The input does not contain a video stream.
    #[error("No video stream found in input")]
    NoVideoStream,

    /// The decoder rejected a packet or failed internally.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// The demuxer refused to seek.
    #[error("Failed to seek to timestamp {timestamp}: {reason}")]
    SeekFailed {
        /// Requested timestamp in stream time-base units.
        timestamp: i64,
        /// Underlying reason the seek failed.
        reason: String,
    },

    /// A stream property needed by the requested operation is unknown.
    #[error("Stream metadata is missing or zero: {0}")]
    MissingStreamMetadata(&'static str),

    /// The destination buffer does not hold exactly the requested frames.
    #[error("Output buffer is {actual} bytes but {expected} bytes are required")]
    BufferSizeMismatch {
        /// Size required by the frame layout and frame count.
        expected: usize,
        /// Size of the buffer that was supplied.
        actual: usize,
    },

    /// The target frame list decreases.
    #[error("Target frame {target} at position {position} is before previous target {previous}")]
    TargetOrder {
        /// Position of the offending entry in the target list.
        position: usize,
        /// The entry before it.
        previous: u64,
        /// The offending entry.
        target: u64,
    },

    /// A target lies behind the frame the decoder has already reached.
    #[error("Target frame {target} is behind the current frame index {current}")]
    TargetBehindCursor {
        /// The requested frame index.
        target: u64,
        /// The reconstructed index of the frame currently held.
        current: i64,
    },

    /// A backward seek landed after the first requested frame.
    #[error("Seek landed on frame index {landed}, past the first target {target}")]
    SeekOvershoot {
        /// Reconstructed index of the first frame decoded after the seek.
        landed: i64,
        /// The first requested frame index.
        target: u64,
    },

    /// Decoding ended before a single frame was written, so there is
    /// nothing to replay into the rest of the buffer.
    #[error("No frames available to fill the output buffer")]
    NoFramesAvailable,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while exporting a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for SamplerError {
    fn from(error: FfmpegError) -> Self {
        SamplerError::FfmpegError(error.to_string())
    }
}
