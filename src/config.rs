//! Sampling and input configuration.
//!
//! [`SamplingOptions`] selects whether to seek before sampling and which
//! index model maps timestamps to frame numbers. [`StreamOptions`] tunes how
//! an in-memory input is presented to the demuxer.
//!
//! # Example
//!
//! ```no_run
//! use framesampler::{IndexMode, SamplingOptions, ScalingAlgorithm};
//!
//! let options = SamplingOptions::new()
//!     .with_seek(true)
//!     .with_index_mode(IndexMode::RawTimebase)
//!     .with_scaling(ScalingAlgorithm::Bicubic);
//! ```

use ffmpeg_next::software::scaling::Flags as ScalingFlags;

use crate::index_model::IndexMode;

/// Interpolation used when converting decoded frames to RGB24.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalingAlgorithm {
    /// Bilinear filtering. This is the default.
    #[default]
    Bilinear,
    /// Fast bilinear filtering.
    FastBilinear,
    /// Bicubic filtering.
    Bicubic,
    /// Nearest-neighbour sampling.
    Point,
    /// Area averaging.
    Area,
}

impl ScalingAlgorithm {
    /// Map to the corresponding FFmpeg scaler flag.
    pub(crate) fn to_ffmpeg_flags(self) -> ScalingFlags {
        match self {
            ScalingAlgorithm::Bilinear => ScalingFlags::BILINEAR,
            ScalingAlgorithm::FastBilinear => ScalingFlags::FAST_BILINEAR,
            ScalingAlgorithm::Bicubic => ScalingFlags::BICUBIC,
            ScalingAlgorithm::Point => ScalingFlags::POINT,
            ScalingAlgorithm::Area => ScalingFlags::AREA,
        }
    }
}

/// Settings for [`FrameSampler::sample_frames`](crate::FrameSampler::sample_frames).
#[derive(Debug, Clone, Default)]
pub struct SamplingOptions {
    /// Seek near the first target before scanning. Defaults to `false`,
    /// which decodes from the current stream position.
    pub seek: bool,
    /// How frame indices are reconstructed from timestamps.
    pub index_mode: IndexMode,
    /// Interpolation used for RGB conversion.
    pub scaling: ScalingAlgorithm,
}

impl SamplingOptions {
    /// Create options with default settings: no seek, average-duration
    /// index model, bilinear scaling.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seek near the first target before scanning.
    #[must_use]
    pub fn with_seek(mut self, seek: bool) -> Self {
        self.seek = seek;
        self
    }

    /// Select the index model.
    #[must_use]
    pub fn with_index_mode(mut self, mode: IndexMode) -> Self {
        self.index_mode = mode;
        self
    }

    /// Select the scaling algorithm used for RGB conversion.
    #[must_use]
    pub fn with_scaling(mut self, algorithm: ScalingAlgorithm) -> Self {
        self.scaling = algorithm;
        self
    }
}

/// Default size of the buffer handed to FFmpeg's custom I/O context.
pub const DEFAULT_IO_BUFFER_SIZE: usize = 32 * 1024;

/// Settings for opening an in-memory input.
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Size of the read buffer owned by the custom I/O context.
    pub io_buffer_size: usize,
    /// Number of leading bytes fed to the container prober. `None` uses
    /// [`io_buffer_size`](StreamOptions::io_buffer_size). Always clamped to
    /// the input length.
    pub probe_size: Option<usize>,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            io_buffer_size: DEFAULT_IO_BUFFER_SIZE,
            probe_size: None,
        }
    }
}

impl StreamOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the custom I/O buffer size. Clamped to a minimum of 4 KiB.
    #[must_use]
    pub fn with_io_buffer_size(mut self, size: usize) -> Self {
        self.io_buffer_size = size.max(4096);
        self
    }

    /// Set how many leading bytes are used to probe the container format.
    #[must_use]
    pub fn with_probe_size(mut self, size: usize) -> Self {
        self.probe_size = Some(size);
        self
    }

    /// Resolve the probe size for an input of `input_len` bytes.
    pub(crate) fn resolve_probe_size(&self, input_len: usize) -> usize {
        self.probe_size
            .unwrap_or(self.io_buffer_size)
            .min(input_len)
    }
}
