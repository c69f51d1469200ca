//! Recovering the decoder position after an approximate seek.
//!
//! A backward seek lands on some keyframe at or before the requested
//! timestamp; which frame that is only becomes known once a frame has been
//! decoded and its PTS inspected.

use crate::error::SamplerError;
use crate::index_model::{FrameCursor, IndexModel};
use crate::source::{DecodeStatus, FrameSource};

/// Decode exactly one frame after a seek and reconstruct its index.
///
/// Returns `Ok(None)` if the stream ended before any frame was decoded.
///
/// # Errors
///
/// - [`SamplerError::SeekOvershoot`] if the landing frame lies past
///   `first_target`. Backward seeks never do this unless the stream metadata
///   is inconsistent.
/// - [`SamplerError::MissingStreamMetadata`] if `model` cannot reconstruct
///   indices for this stream.
/// - Any decode error from `source`.
pub fn reconcile_after_seek<S: FrameSource + ?Sized>(
    source: &mut S,
    model: &dyn IndexModel,
    first_target: u64,
) -> Result<Option<FrameCursor>, SamplerError> {
    match source.next_frame()? {
        DecodeStatus::EndOfStream => {
            log::warn!("No frames received after seek");
            Ok(None)
        }
        DecodeStatus::Frame => {
            let pts = source.frame_pts();
            let landed = model
                .reconstruct_index(pts)
                .ok_or(SamplerError::MissingStreamMetadata("frame duration or time base"))?;
            log::debug!("Seek landed on frame index {landed} (pts {pts})");

            if landed > first_target as i64 {
                return Err(SamplerError::SeekOvershoot {
                    landed,
                    target: first_target,
                });
            }
            Ok(Some(FrameCursor::at(landed, pts)))
        }
    }
}

/// Decode forward until a frame with `pts >= timestamp` has been decoded.
///
/// That frame is consumed: the next call to
/// [`FrameSource::next_frame`] yields the frame after it. Running out of
/// frames is reported as [`DecodeStatus::EndOfStream`], not as an error.
///
/// # Errors
///
/// Any decode error from `source`.
pub fn skip_past_timestamp<S: FrameSource + ?Sized>(
    source: &mut S,
    timestamp: i64,
) -> Result<DecodeStatus, SamplerError> {
    loop {
        if source.next_frame()? == DecodeStatus::EndOfStream {
            log::warn!("Ran out of frames during seek");
            return Ok(DecodeStatus::EndOfStream);
        }
        if source.frame_pts() >= timestamp {
            return Ok(DecodeStatus::Frame);
        }
    }
}
