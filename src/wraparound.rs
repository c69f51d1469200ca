//! End-of-stream padding by cyclic replay.
//!
//! When a stream runs out before every requested frame has been written,
//! the frames already in the buffer are treated as a repeating cycle and
//! copied forward until the buffer is full. Frame `k + j` of the result
//! equals frame `j mod k`.

use crate::error::SamplerError;

/// Fill the rest of `dest` by replaying its first `frames_written` frames.
///
/// `bytes_written` must equal `frames_written × bytes_per_frame`. Each pass
/// copies `min(remaining, frames_written)` frames from the start of the
/// buffer to the current write position. Returns the total bytes written,
/// `num_requested_frames × bytes_per_frame`.
///
/// # Errors
///
/// - [`SamplerError::NoFramesAvailable`] if `frames_written` is zero. Nothing
///   is written.
/// - [`SamplerError::BufferSizeMismatch`] if `dest` cannot hold
///   `num_requested_frames` frames.
pub fn pad_by_replay(
    dest: &mut [u8],
    bytes_written: usize,
    frames_written: usize,
    bytes_per_frame: usize,
    num_requested_frames: usize,
) -> Result<usize, SamplerError> {
    if frames_written == 0 {
        log::warn!("No frames received after seek; cannot pad output buffer");
        return Err(SamplerError::NoFramesAvailable);
    }

    let total = num_requested_frames * bytes_per_frame;
    if dest.len() < total {
        return Err(SamplerError::BufferSizeMismatch {
            expected: total,
            actual: dest.len(),
        });
    }
    debug_assert_eq!(bytes_written, frames_written * bytes_per_frame);

    let mut remaining = num_requested_frames.saturating_sub(frames_written);
    if remaining > 0 {
        log::debug!(
            "Ran out of frames after {frames_written}; replaying to fill {remaining} more"
        );
    }

    let mut write_offset = bytes_written;
    while remaining > 0 {
        let frames = remaining.min(frames_written);
        let bytes = frames * bytes_per_frame;
        dest.copy_within(0..bytes, write_offset);

        write_offset += bytes;
        remaining -= frames;
    }

    Ok(write_offset)
}
