//! Randomised keyframe seeking for clip sampling.
//!
//! [`KeyframeSeekPlanner`] picks a window of consecutive frames uniformly
//! from anywhere in a stream such that the window fits before the end under
//! ideal decoding. It owns its random number generator, so seeded planners
//! are reproducible and independent of each other.
//!
//! # Example
//!
//! ```no_run
//! use framesampler::{KeyframeSeekPlanner, VideoStreamContext};
//!
//! let bytes = std::fs::read("input.mp4")?;
//! let mut stream = VideoStreamContext::from_bytes(bytes)?;
//! let mut planner = KeyframeSeekPlanner::with_seed(7);
//! let plan = planner.plan(stream.metadata(), 16);
//! println!("seek distance: {:.2}s", plan.seek_distance_seconds);
//! # Ok::<(), framesampler::SamplerError>(())
//! ```

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::conversion;
use crate::error::SamplerError;
use crate::metadata::StreamMetadata;
use crate::source::FrameSource;

/// A seek decision produced by [`KeyframeSeekPlanner`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekPlan {
    /// Seek timestamp in stream time-base units, or `None` to decode from
    /// the start without seeking.
    pub timestamp: Option<i64>,
    /// Frame index the timestamp was derived from.
    pub target_frame: Option<u64>,
    /// `timestamp` converted to seconds, for diagnostics. Zero when not
    /// seeking.
    pub seek_distance_seconds: f64,
}

impl SeekPlan {
    /// A plan that starts decoding at the beginning of the stream.
    pub fn no_seek() -> Self {
        Self {
            timestamp: None,
            target_frame: None,
            seek_distance_seconds: 0.0,
        }
    }
}

/// Chooses random seek targets that leave room for a full window.
#[derive(Debug, Clone)]
pub struct KeyframeSeekPlanner {
    rng: StdRng,
}

impl KeyframeSeekPlanner {
    /// Planner with a deterministic seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Planner seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Draw a seek plan for a window of `num_requested_frames` frames.
    ///
    /// With `limit = frame_count - num_requested_frames`, draws `t` from
    /// `0..=limit`. `t == 0` (or `limit <= 0`) means no seek; otherwise frame
    /// `t - 1` is converted to a timestamp with
    /// `floor((t - 1) × duration / frame_count) + start_time`. Reserving
    /// `t == 0` for "start at frame 0" gives the first frame the same odds
    /// as every other start.
    pub fn plan(&mut self, metadata: &StreamMetadata, num_requested_frames: usize) -> SeekPlan {
        let frame_count = i64::try_from(metadata.frame_count).unwrap_or(i64::MAX);
        let requested = i64::try_from(num_requested_frames).unwrap_or(i64::MAX);
        let valid_seek_frame_limit = frame_count.saturating_sub(requested);
        if valid_seek_frame_limit <= 0 {
            return SeekPlan::no_seek();
        }

        let draw = self.rng.gen_range(0..=valid_seek_frame_limit);
        if draw == 0 {
            return SeekPlan::no_seek();
        }
        let target_frame = draw - 1;

        let Some(offset) =
            conversion::rescale_round_down(target_frame, metadata.duration, frame_count)
        else {
            return SeekPlan::no_seek();
        };
        let timestamp = offset.saturating_add(metadata.start_time);
        let seek_distance_seconds = conversion::pts_to_seconds(timestamp, metadata.time_base);

        log::debug!(
            "Planned seek to frame {target_frame} (timestamp {timestamp}, {seek_distance_seconds:.3}s)"
        );

        SeekPlan {
            timestamp: Some(timestamp),
            target_frame: Some(target_frame as u64),
            seek_distance_seconds,
        }
    }

    /// Plan a seek for `source` and issue it.
    ///
    /// # Errors
    ///
    /// Propagates [`SamplerError::SeekFailed`] from the source.
    pub fn seek_to_closest_keypoint<S: FrameSource>(
        &mut self,
        source: &mut S,
        num_requested_frames: usize,
    ) -> Result<SeekPlan, SamplerError> {
        let plan = self.plan(source.metadata(), num_requested_frames);
        if let Some(timestamp) = plan.timestamp {
            source.seek_near(timestamp)?;
        }
        Ok(plan)
    }
}

impl Default for KeyframeSeekPlanner {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use ffmpeg_next::Rational;

    use super::*;

    fn metadata(frame_count: u64, start_time: i64) -> StreamMetadata {
        StreamMetadata {
            duration: frame_count as i64 * 512,
            frame_count,
            time_base: Rational::new(1, 12_800),
            start_time,
            width: 2,
            height: 2,
            frames_per_second: 25.0,
            codec: "test".to_string(),
        }
    }

    #[test]
    fn window_filling_the_stream_never_seeks() {
        let meta = metadata(30, 0);
        let mut planner = KeyframeSeekPlanner::with_seed(1);
        for _ in 0..100 {
            assert_eq!(planner.plan(&meta, 30), SeekPlan::no_seek());
            assert_eq!(planner.plan(&meta, 45), SeekPlan::no_seek());
        }
    }

    #[test]
    fn targets_stay_inside_the_valid_window() {
        let meta = metadata(100, 0);
        let mut planner = KeyframeSeekPlanner::with_seed(42);
        let mut saw_seek = false;
        let mut saw_no_seek = false;
        for _ in 0..2000 {
            let plan = planner.plan(&meta, 10);
            match plan.target_frame {
                Some(target) => {
                    saw_seek = true;
                    assert!(target <= 100 - 10 - 1);
                }
                None => saw_no_seek = true,
            }
        }
        assert!(saw_seek && saw_no_seek);
    }

    #[test]
    fn timestamp_is_rescaled_and_offset_by_start_time() {
        let meta = metadata(100, 1000);
        let mut planner = KeyframeSeekPlanner::with_seed(3);
        for _ in 0..200 {
            let plan = planner.plan(&meta, 10);
            if let (Some(target), Some(timestamp)) = (plan.target_frame, plan.timestamp) {
                assert_eq!(timestamp, target as i64 * 512 + 1000);
                let expected = timestamp as f64 / 12_800.0;
                assert!((plan.seek_distance_seconds - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn seeded_planners_repeat() {
        let meta = metadata(500, 0);
        let mut first = KeyframeSeekPlanner::with_seed(99);
        let mut second = KeyframeSeekPlanner::with_seed(99);
        for _ in 0..50 {
            assert_eq!(first.plan(&meta, 8), second.plan(&meta, 8));
        }
    }
}
