//! The decode contract consumed by the sampler.
//!
//! A [`FrameSource`] is a demuxer and decoder bound to one video stream. It
//! owns a single reusable decoded frame that each successful
//! [`next_frame`](FrameSource::next_frame) call overwrites.
//! [`VideoStreamContext`](crate::VideoStreamContext) is the FFmpeg-backed
//! implementation; tests drive the sampler with synthetic sources.

use crate::error::SamplerError;
use crate::metadata::StreamMetadata;

/// Outcome of pulling the next frame from a [`FrameSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// A frame was decoded and is available through [`FrameSource::frame`].
    Frame,
    /// The stream is exhausted and the decoder has been fully drained.
    EndOfStream,
}

/// A stateful, strictly sequential frame decoder.
///
/// Implementations are not required to be thread-safe; all calls for one
/// stream must come from a single caller.
pub trait FrameSource {
    /// The decoded frame type handed to a [`PixelPacker`](crate::PixelPacker).
    type Frame;

    /// Cached metadata for the bound stream.
    fn metadata(&self) -> &StreamMetadata;

    /// Decode the next frame in stream order.
    ///
    /// Must keep feeding the decoder, including the final drain pass, until a
    /// frame emerges or the decoder itself reports end of stream.
    ///
    /// # Errors
    ///
    /// Any decode failure. These are fatal for the caller.
    fn next_frame(&mut self) -> Result<DecodeStatus, SamplerError>;

    /// The most recently decoded frame.
    ///
    /// Only meaningful after [`next_frame`](FrameSource::next_frame) returned
    /// [`DecodeStatus::Frame`].
    fn frame(&self) -> &Self::Frame;

    /// Presentation timestamp of the most recently decoded frame, in stream
    /// time-base units.
    fn frame_pts(&self) -> i64;

    /// Seek to the closest decodable keyframe at or before `timestamp`
    /// (stream time-base units). The exact landing frame is only known once
    /// the next frame is decoded.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::SeekFailed`] if the demuxer rejects the seek.
    fn seek_near(&mut self, timestamp: i64) -> Result<(), SamplerError>;
}
