//! Synthetic frame source shared by the sampling tests and benchmarks.
//!
//! Frames carry their own index, and the packer writes that index into a
//! 1×1 RGB frame (little-endian across the three channels), so an output
//! buffer can be read back as the list of frame indices it holds.

#![allow(dead_code)]

use ffmpeg_next::Rational;
use framesampler::{
    DecodeStatus, FrameLayout, FrameSource, PixelPacker, SamplerError, StreamMetadata,
    packer::copy_rows,
};

/// Ticks per frame for the default 25 fps stream with a 1/12800 time base.
pub const FRAME_DURATION: i64 = 512;
pub const TICKS_PER_SECOND: i32 = 12_800;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyntheticFrame {
    pub index: u64,
    pub pts: i64,
}

/// A decoder over a fixed list of frames with keyframe-granular seeking.
pub struct SyntheticSource {
    metadata: StreamMetadata,
    frames: Vec<SyntheticFrame>,
    position: usize,
    current: SyntheticFrame,
    keyframe_interval: usize,
    seek_overshoot: usize,
    duplicate_after_seek: bool,
    duplicate_armed: bool,
    duplicate_pending: bool,
    fail_at: Option<usize>,
    /// Every timestamp passed to `seek_near`, in order.
    pub seeks: Vec<i64>,
    /// Number of frames handed out by `next_frame`, duplicates included.
    pub decoded: usize,
}

impl SyntheticSource {
    /// `frame_count` frames, [`FRAME_DURATION`] ticks apart, every frame a
    /// keyframe.
    pub fn uniform(frame_count: u64) -> Self {
        let frames = (0..frame_count)
            .map(|index| SyntheticFrame {
                index,
                pts: index as i64 * FRAME_DURATION,
            })
            .collect();

        let metadata = StreamMetadata {
            duration: frame_count as i64 * FRAME_DURATION,
            frame_count,
            time_base: Rational::new(1, TICKS_PER_SECOND),
            start_time: 0,
            width: 1,
            height: 1,
            frames_per_second: 25.0,
            codec: "synthetic".to_string(),
        };

        Self {
            metadata,
            frames,
            position: 0,
            current: SyntheticFrame::default(),
            keyframe_interval: 1,
            seek_overshoot: 0,
            duplicate_after_seek: false,
            duplicate_armed: false,
            duplicate_pending: false,
            fail_at: None,
            seeks: Vec::new(),
            decoded: 0,
        }
    }

    /// Seeks land on the last multiple of `interval` at or before the target.
    pub fn with_keyframe_interval(mut self, interval: usize) -> Self {
        self.keyframe_interval = interval.max(1);
        self
    }

    /// Frame count reported in metadata, independent of the real count.
    pub fn with_reported_frame_count(mut self, frame_count: u64) -> Self {
        self.metadata.frame_count = frame_count;
        self
    }

    /// Start time reported in metadata. Frame timestamps are unchanged.
    pub fn with_start_time(mut self, start_time: i64) -> Self {
        self.metadata.start_time = start_time;
        self
    }

    /// Every PTS is shifted `frames` frame durations later, as in streams
    /// with B-frame reordering where the first frame is presented after
    /// time zero. Metadata is unchanged.
    pub fn with_presentation_delay(mut self, frames: i64) -> Self {
        for frame in &mut self.frames {
            frame.pts += frames * FRAME_DURATION;
        }
        self
    }

    /// Seeks land this many frames past the correct keyframe.
    pub fn with_seek_overshoot(mut self, frames: usize) -> Self {
        self.seek_overshoot = frames;
        self
    }

    /// The first frame after every seek is emitted twice.
    pub fn with_duplicate_after_seek(mut self) -> Self {
        self.duplicate_after_seek = true;
        self
    }

    /// Decoding the frame at `position` fails.
    pub fn with_decode_error_at(mut self, position: usize) -> Self {
        self.fail_at = Some(position);
        self
    }
}

impl FrameSource for SyntheticSource {
    type Frame = SyntheticFrame;

    fn metadata(&self) -> &StreamMetadata {
        &self.metadata
    }

    fn next_frame(&mut self) -> Result<DecodeStatus, SamplerError> {
        if self.duplicate_pending {
            self.duplicate_pending = false;
            self.decoded += 1;
            return Ok(DecodeStatus::Frame);
        }
        if self.fail_at == Some(self.position) {
            return Err(SamplerError::VideoDecodeError(format!(
                "corrupt packet at {}",
                self.position
            )));
        }
        let Some(frame) = self.frames.get(self.position) else {
            return Ok(DecodeStatus::EndOfStream);
        };

        self.current = *frame;
        self.position += 1;
        self.decoded += 1;
        if self.duplicate_armed {
            self.duplicate_armed = false;
            self.duplicate_pending = true;
        }
        Ok(DecodeStatus::Frame)
    }

    fn frame(&self) -> &SyntheticFrame {
        &self.current
    }

    fn frame_pts(&self) -> i64 {
        self.current.pts
    }

    fn seek_near(&mut self, timestamp: i64) -> Result<(), SamplerError> {
        if timestamp < 0 {
            return Err(SamplerError::SeekFailed {
                timestamp,
                reason: "negative timestamp".to_string(),
            });
        }
        self.seeks.push(timestamp);

        let at_or_before = self
            .frames
            .iter()
            .rposition(|frame| frame.pts <= timestamp)
            .unwrap_or(0);
        let keyframe = at_or_before - at_or_before % self.keyframe_interval;

        self.position = (keyframe + self.seek_overshoot).min(self.frames.len());
        self.duplicate_armed = self.duplicate_after_seek;
        self.duplicate_pending = false;
        Ok(())
    }
}

/// Writes each frame's index into a 1×1 RGB frame.
pub struct IndexPacker;

impl PixelPacker<SyntheticFrame> for IndexPacker {
    fn layout(&self) -> FrameLayout {
        FrameLayout::new(1, 1)
    }

    fn pack(
        &mut self,
        dest: &mut [u8],
        frame: &SyntheticFrame,
        offset: usize,
    ) -> Result<usize, SamplerError> {
        let bytes = (frame.index as u32).to_le_bytes();
        copy_rows(dest, offset, &bytes, 3, 3, 1)
    }
}

/// Output buffer for `frames` slots of [`IndexPacker`] output.
pub fn index_buffer(frames: usize) -> Vec<u8> {
    vec![0u8; FrameLayout::new(1, 1).buffer_len(frames)]
}

/// Read frame indices back out of an [`IndexPacker`] buffer.
pub fn decode_indices(buffer: &[u8]) -> Vec<u64> {
    buffer
        .chunks_exact(3)
        .map(|pixel| u64::from(u32::from_le_bytes([pixel[0], pixel[1], pixel[2], 0])))
        .collect()
}
