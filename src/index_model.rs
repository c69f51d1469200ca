//! Mapping presentation timestamps onto frame indices.
//!
//! Compressed streams expose timestamps, not frame numbers. Two models are
//! supported, selected with [`IndexMode`]:
//!
//! - [`AverageDurationModel`] assumes every frame lasts
//!   `duration / frame_count` ticks. Targets are frame numbers and the
//!   sampler counts frames as it decodes them.
//! - [`RawTimebaseModel`] treats targets as whole seconds and compares
//!   timestamps against `target × ticks_per_second` directly.
//!
//! The two do not agree near variable-frame-duration boundaries, so both are
//! kept as separate strategies.

use crate::conversion;
use crate::metadata::StreamMetadata;

/// Selects the [`IndexModel`] used by the sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexMode {
    /// Uniform average frame duration; targets are frame numbers.
    #[default]
    AverageDuration,
    /// Raw time-base units; targets are compared as seconds.
    RawTimebase,
}

impl IndexMode {
    /// Build the model for `metadata`.
    pub fn model(self, metadata: &StreamMetadata) -> Box<dyn IndexModel> {
        match self {
            IndexMode::AverageDuration => Box::new(AverageDurationModel::new(metadata)),
            IndexMode::RawTimebase => Box::new(RawTimebaseModel::new(metadata)),
        }
    }
}

/// Position of the decoder in frame-index terms.
///
/// The running index only advances when a frame's PTS is strictly greater
/// than the PTS that last advanced it. Some decoders emit the first frame
/// after a seek twice; the repeat carries the same PTS and is not counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCursor {
    index: i64,
    pts: i64,
    last_advanced_pts: i64,
}

impl FrameCursor {
    /// Cursor for the first frame of an unseeked stream (index 0).
    pub fn first(pts: i64) -> Self {
        Self::at(0, pts)
    }

    /// Cursor for a frame whose index was reconstructed after a seek.
    pub fn at(index: i64, pts: i64) -> Self {
        Self {
            index,
            pts,
            last_advanced_pts: pts,
        }
    }

    /// Record a newly decoded frame. Returns `true` if the index advanced.
    pub fn advance(&mut self, pts: i64) -> bool {
        self.pts = pts;
        if pts > self.last_advanced_pts {
            self.index += 1;
            self.last_advanced_pts = pts;
            true
        } else {
            false
        }
    }

    /// Reconstructed index of the frame currently held.
    pub fn index(&self) -> i64 {
        self.index
    }

    /// PTS of the frame currently held.
    pub fn pts(&self) -> i64 {
        self.pts
    }
}

/// Strategy for locating target frames by timestamp.
pub trait IndexModel {
    /// Timestamp to seek near for `target`, or `None` if the stream
    /// metadata cannot express it.
    fn seek_timestamp(&self, target: u64) -> Option<i64>;

    /// Frame index of a frame with presentation timestamp `pts`, truncated
    /// toward zero.
    fn reconstruct_index(&self, pts: i64) -> Option<i64>;

    /// Whether the frame held by `cursor` satisfies `target`.
    fn is_reached(&self, cursor: &FrameCursor, target: u64) -> bool;

    /// Whether targets must never be behind the cursor's index. Only true
    /// when the cursor index is the unit targets are expressed in.
    fn requires_index_order(&self) -> bool;
}

/// Frame index = `pts / (duration / frame_count)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AverageDurationModel {
    frame_duration: Option<i64>,
}

impl AverageDurationModel {
    /// Build from stream metadata. The average duration is unknown when the
    /// stream reports no duration or frame count; scanning still works, but
    /// seeking does not.
    pub fn new(metadata: &StreamMetadata) -> Self {
        Self {
            frame_duration: conversion::average_frame_duration(
                metadata.duration,
                metadata.frame_count,
            ),
        }
    }

    /// Average frame duration in time-base ticks, if known.
    pub fn frame_duration(&self) -> Option<i64> {
        self.frame_duration
    }
}

impl IndexModel for AverageDurationModel {
    fn seek_timestamp(&self, target: u64) -> Option<i64> {
        self.frame_duration?.checked_mul(i64::try_from(target).ok()?)
    }

    fn reconstruct_index(&self, pts: i64) -> Option<i64> {
        Some(pts / self.frame_duration?)
    }

    fn is_reached(&self, cursor: &FrameCursor, target: u64) -> bool {
        cursor.index() >= target as i64
    }

    fn requires_index_order(&self) -> bool {
        true
    }
}

/// Frame index = `pts / ticks_per_second`; a target is reached once the
/// held frame's PTS exceeds `target × ticks_per_second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTimebaseModel {
    ticks_per_second: Option<i64>,
}

impl RawTimebaseModel {
    /// Build from the stream time base.
    pub fn new(metadata: &StreamMetadata) -> Self {
        Self {
            ticks_per_second: conversion::ticks_per_second(metadata.time_base),
        }
    }

    /// Time-base ticks per second, if the time base is usable.
    pub fn ticks_per_second(&self) -> Option<i64> {
        self.ticks_per_second
    }
}

impl IndexModel for RawTimebaseModel {
    fn seek_timestamp(&self, target: u64) -> Option<i64> {
        self.ticks_per_second?.checked_mul(i64::try_from(target).ok()?)
    }

    fn reconstruct_index(&self, pts: i64) -> Option<i64> {
        Some(pts / self.ticks_per_second?)
    }

    fn is_reached(&self, cursor: &FrameCursor, target: u64) -> bool {
        match self.seek_timestamp(target) {
            Some(limit) => cursor.pts() > limit,
            // Unusable time base: every frame is as good as the next.
            None => true,
        }
    }

    fn requires_index_order(&self) -> bool {
        false
    }
}
