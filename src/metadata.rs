//! Stream metadata cached when a video stream is opened.

use ffmpeg_next::Rational;

/// Metadata for the sampled video stream.
///
/// `duration` and `start_time` are in stream time-base units. `frame_count`
/// is an estimate and may be imprecise for some containers; zero means
/// unknown.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct StreamMetadata {
    /// Stream duration in time-base ticks (zero when unknown).
    pub duration: i64,
    /// Estimated total number of frames (zero when unknown).
    pub frame_count: u64,
    /// Conversion factor between ticks and seconds.
    pub time_base: Rational,
    /// PTS of the first frame, or zero when the container does not say.
    pub start_time: i64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average frames per second (may be approximate).
    pub frames_per_second: f64,
    /// Codec name (e.g. `"h264"`).
    pub codec: String,
}

impl StreamMetadata {
    /// Stream duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        crate::conversion::pts_to_seconds(self.duration, self.time_base)
    }
}
