//! Frame sampling into packed RGB buffers.
//!
//! [`FrameSampler`] walks a [`FrameSource`] forward and packs selected
//! frames into a caller-owned buffer. Three entry points are provided:
//!
//! - [`sample_frames`](FrameSampler::sample_frames) packs a non-decreasing
//!   list of target frames, optionally seeking near the first one.
//! - [`sample_sequential`](FrameSampler::sample_sequential) packs the next
//!   `n` frames from the current position.
//! - [`sample_random_clip`](FrameSampler::sample_random_clip) packs `n`
//!   consecutive frames from a randomly chosen position.
//!
//! When the stream ends early the buffer is completed by replaying the
//! frames already written, so a successful call always fills the whole
//! buffer. Trailing frames may therefore be repeats of earlier ones; check
//! [`SampleReport::padded_frames`] to tell.

use crate::conversion;
use crate::error::SamplerError;
use crate::index_model::{FrameCursor, IndexMode, IndexModel};
use crate::layout::FrameLayout;
use crate::packer::PixelPacker;
use crate::planner::{KeyframeSeekPlanner, SeekPlan};
use crate::reconciler::{reconcile_after_seek, skip_past_timestamp};
use crate::source::{DecodeStatus, FrameSource};
use crate::wraparound::pad_by_replay;

/// Summary of one sampling call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SampleReport {
    /// Output slots filled from decoded frames.
    pub decoded_frames: usize,
    /// Output slots filled by replaying earlier slots after end of stream.
    pub padded_frames: usize,
    /// Total bytes written to the output buffer.
    pub bytes_written: usize,
    /// The seek that was made before decoding, if any.
    pub seek: Option<SeekPlan>,
}

/// Write position within the output buffer.
#[derive(Debug, Clone, Copy, Default)]
struct WriteHead {
    offset: usize,
    frames: usize,
}

/// Drives a [`FrameSource`] and a [`PixelPacker`] to fill output buffers.
///
/// The sampler borrows the source mutably for its lifetime; sampling calls
/// continue from wherever the previous call left the decoder.
///
/// # Example
///
/// ```no_run
/// use framesampler::{FrameSampler, IndexMode, ScalingAlgorithm, VideoStreamContext};
///
/// let bytes = std::fs::read("input.mp4")?;
/// let mut stream = VideoStreamContext::from_bytes(bytes)?;
/// let packer = stream.rgb_packer(ScalingAlgorithm::Bilinear)?;
/// let layout = stream.layout();
///
/// let targets = [5, 5, 6, 20];
/// let mut buffer = vec![0u8; layout.buffer_len(targets.len())];
/// FrameSampler::new(&mut stream, packer).sample_frames(
///     &mut buffer,
///     &targets,
///     false,
///     IndexMode::AverageDuration,
/// )?;
/// # Ok::<(), framesampler::SamplerError>(())
/// ```
pub struct FrameSampler<'a, S: FrameSource, P: PixelPacker<S::Frame>> {
    source: &'a mut S,
    packer: P,
}

impl<'a, S: FrameSource, P: PixelPacker<S::Frame>> FrameSampler<'a, S, P> {
    /// Create a sampler over `source` that writes frames with `packer`.
    pub fn new(source: &'a mut S, packer: P) -> Self {
        Self { source, packer }
    }

    /// Layout of every frame this sampler writes.
    pub fn layout(&self) -> FrameLayout {
        self.packer.layout()
    }

    /// Pack the frames at `targets` into `dest`, one output slot per entry.
    ///
    /// `targets` must be non-decreasing; repeated entries pack the same frame
    /// again. With `seek` set, the source first seeks near `targets[0]` and
    /// the landing frame's index is reconstructed with the `index_mode`
    /// model; otherwise decoding continues from the current position and the
    /// first decoded frame is index 0.
    ///
    /// In [`IndexMode::AverageDuration`] the running index advances only on
    /// strictly increasing PTS and a target is reached when the index equals
    /// it. In [`IndexMode::RawTimebase`] a target is reached by the first
    /// frame whose PTS exceeds `target × ticks_per_second`.
    ///
    /// A target beyond the stream's known frame count ends scanning and pads
    /// the rest of the buffer, as does end of stream. When a seek is made it
    /// is recorded in [`SampleReport::seek`].
    ///
    /// # Errors
    ///
    /// - [`SamplerError::BufferSizeMismatch`] if `dest` is not exactly
    ///   `targets.len()` frames.
    /// - [`SamplerError::TargetOrder`] if `targets` decreases.
    /// - [`SamplerError::TargetBehindCursor`] if a target lies behind the
    ///   frame already reached (average-duration model).
    /// - [`SamplerError::SeekOvershoot`] if the seek landed past `targets[0]`.
    /// - [`SamplerError::NoFramesAvailable`] if the stream ended before any
    ///   frame was written.
    /// - Any decode or seek error from the source.
    pub fn sample_frames(
        &mut self,
        dest: &mut [u8],
        targets: &[u64],
        seek: bool,
        index_mode: IndexMode,
    ) -> Result<SampleReport, SamplerError> {
        let num_requested_frames = targets.len();
        if num_requested_frames == 0 {
            return Ok(SampleReport::default());
        }
        self.layout().check_buffer(dest, num_requested_frames)?;
        check_target_order(targets)?;

        let model = index_mode.model(self.source.metadata());
        let frame_count = self.source.metadata().frame_count;
        let mut head = WriteHead::default();
        let mut cursor: Option<FrameCursor> = None;
        let mut first_unfilled = 0;
        let mut plan = None;

        if seek {
            let first_target = targets[0];
            let timestamp = model
                .seek_timestamp(first_target)
                .ok_or(SamplerError::MissingStreamMetadata("frame duration or time base"))?;
            log::debug!("Seeking near frame {first_target} (timestamp {timestamp})");
            self.source.seek_near(timestamp)?;
            plan = Some(SeekPlan {
                timestamp: Some(timestamp),
                target_frame: Some(first_target),
                seek_distance_seconds: conversion::pts_to_seconds(
                    timestamp,
                    self.source.metadata().time_base,
                ),
            });

            match reconcile_after_seek(&mut *self.source, model.as_ref(), first_target)? {
                None => return self.pad(dest, head, num_requested_frames, plan),
                Some(landed) => {
                    if landed.index() == first_target as i64 {
                        self.pack_current(dest, &mut head)?;
                        first_unfilled = 1;
                    }
                    cursor = Some(landed);
                }
            }
        }

        for &target in &targets[first_unfilled..] {
            if frame_count > 0 && target > frame_count {
                log::debug!(
                    "Target frame {target} is past the stream's {frame_count} frames; padding"
                );
                return self.pad(dest, head, num_requested_frames, plan);
            }

            // Unreachable while targets are non-decreasing: scanning stops on
            // each target exactly.
            if let Some(current) = &cursor
                && model.requires_index_order()
                && current.index() > target as i64
            {
                return Err(SamplerError::TargetBehindCursor {
                    target,
                    current: current.index(),
                });
            }

            if !self.scan_to(model.as_ref(), &mut cursor, target)? {
                return self.pad(dest, head, num_requested_frames, plan);
            }
            self.pack_current(dest, &mut head)?;
        }

        Ok(SampleReport {
            decoded_frames: head.frames,
            padded_frames: 0,
            bytes_written: head.offset,
            seek: plan,
        })
    }

    /// Pack the next `num_requested_frames` decoded frames into `dest`.
    ///
    /// # Errors
    ///
    /// - [`SamplerError::BufferSizeMismatch`] if `dest` is not exactly
    ///   `num_requested_frames` frames.
    /// - [`SamplerError::NoFramesAvailable`] if the stream is already
    ///   exhausted.
    /// - Any decode error from the source.
    pub fn sample_sequential(
        &mut self,
        dest: &mut [u8],
        num_requested_frames: usize,
    ) -> Result<SampleReport, SamplerError> {
        if num_requested_frames == 0 {
            return Ok(SampleReport::default());
        }
        self.layout().check_buffer(dest, num_requested_frames)?;
        self.decode_sequential(dest, num_requested_frames)
    }

    /// Pack `num_requested_frames` consecutive frames starting at a random
    /// position chosen by `planner`.
    ///
    /// The source must be positioned at the start of the stream. After the
    /// planned seek, frames are skipped until one at or past the planned
    /// timestamp has been consumed; packing starts with the frame after it.
    ///
    /// # Errors
    ///
    /// As for [`sample_sequential`](FrameSampler::sample_sequential), plus
    /// seek errors.
    pub fn sample_random_clip(
        &mut self,
        dest: &mut [u8],
        num_requested_frames: usize,
        planner: &mut KeyframeSeekPlanner,
    ) -> Result<SampleReport, SamplerError> {
        if num_requested_frames == 0 {
            return Ok(SampleReport::default());
        }
        self.layout().check_buffer(dest, num_requested_frames)?;

        let plan = planner.seek_to_closest_keypoint(&mut *self.source, num_requested_frames)?;
        if let Some(timestamp) = plan.timestamp {
            skip_past_timestamp(&mut *self.source, timestamp)?;
        }

        let report = self.decode_sequential(dest, num_requested_frames)?;
        Ok(SampleReport {
            seek: Some(plan),
            ..report
        })
    }

    fn decode_sequential(
        &mut self,
        dest: &mut [u8],
        num_requested_frames: usize,
    ) -> Result<SampleReport, SamplerError> {
        let mut head = WriteHead::default();
        for _ in 0..num_requested_frames {
            if self.source.next_frame()? == DecodeStatus::EndOfStream {
                return self.pad(dest, head, num_requested_frames, None);
            }
            self.pack_current(dest, &mut head)?;
        }

        Ok(SampleReport {
            decoded_frames: head.frames,
            padded_frames: 0,
            bytes_written: head.offset,
            seek: None,
        })
    }

    /// Decode until `cursor` satisfies `target`. Returns `false` on end of
    /// stream.
    fn scan_to(
        &mut self,
        model: &dyn IndexModel,
        cursor: &mut Option<FrameCursor>,
        target: u64,
    ) -> Result<bool, SamplerError> {
        loop {
            if let Some(current) = cursor.as_ref()
                && model.is_reached(current, target)
            {
                return Ok(true);
            }

            if self.source.next_frame()? == DecodeStatus::EndOfStream {
                return Ok(false);
            }
            let pts = self.source.frame_pts();
            if let Some(current) = cursor.as_mut() {
                current.advance(pts);
            } else {
                *cursor = Some(FrameCursor::first(pts));
            }
            log::trace!("Decoded frame pts={pts} while scanning to {target}");
        }
    }

    fn pack_current(&mut self, dest: &mut [u8], head: &mut WriteHead) -> Result<(), SamplerError> {
        head.offset = self.packer.pack(dest, self.source.frame(), head.offset)?;
        head.frames += 1;
        Ok(())
    }

    fn pad(
        &self,
        dest: &mut [u8],
        head: WriteHead,
        num_requested_frames: usize,
        seek: Option<SeekPlan>,
    ) -> Result<SampleReport, SamplerError> {
        let bytes_written = pad_by_replay(
            dest,
            head.offset,
            head.frames,
            self.layout().bytes_per_frame(),
            num_requested_frames,
        )?;

        Ok(SampleReport {
            decoded_frames: head.frames,
            padded_frames: num_requested_frames - head.frames,
            bytes_written,
            seek,
        })
    }
}

/// Reject target lists that decrease.
fn check_target_order(targets: &[u64]) -> Result<(), SamplerError> {
    for (position, pair) in targets.windows(2).enumerate() {
        if pair[1] < pair[0] {
            return Err(SamplerError::TargetOrder {
                position: position + 1,
                previous: pair[0],
                target: pair[1],
            });
        }
    }
    Ok(())
}
