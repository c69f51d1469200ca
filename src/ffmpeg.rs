//! FFmpeg's own console verbosity.
//!
//! FFmpeg logs to stderr independently of the [`log`] facade used by this
//! crate. Decoders in particular warn about every damaged packet, which is
//! noisy when sampling large datasets.
//!
//! ```no_run
//! use framesampler::FfmpegLogLevel;
//!
//! framesampler::set_ffmpeg_log_level(FfmpegLogLevel::Error);
//! ```

use std::fmt;
use std::str::FromStr;

use ffmpeg_next::util::log::Level;

/// FFmpeg log verbosity, quietest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FfmpegLogLevel {
    /// No output.
    Quiet,
    /// Unrecoverable errors only.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings (FFmpeg's default).
    Warning,
    /// Informational messages.
    Info,
    /// Decoder and demuxer debugging output.
    Debug,
}

impl FfmpegLogLevel {
    const NAMES: [(&'static str, FfmpegLogLevel); 6] = [
        ("quiet", FfmpegLogLevel::Quiet),
        ("fatal", FfmpegLogLevel::Fatal),
        ("error", FfmpegLogLevel::Error),
        ("warning", FfmpegLogLevel::Warning),
        ("info", FfmpegLogLevel::Info),
        ("debug", FfmpegLogLevel::Debug),
    ];

    fn to_ffmpeg_level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Debug => Level::Debug,
        }
    }

    fn from_ffmpeg_level(level: Level) -> Self {
        match level {
            Level::Quiet => FfmpegLogLevel::Quiet,
            Level::Panic | Level::Fatal => FfmpegLogLevel::Fatal,
            Level::Error => FfmpegLogLevel::Error,
            Level::Warning => FfmpegLogLevel::Warning,
            Level::Info => FfmpegLogLevel::Info,
            Level::Verbose | Level::Debug | Level::Trace => FfmpegLogLevel::Debug,
        }
    }

    /// Lower-case name accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(_, level)| *level == self)
            .map_or("unknown", |(name, _)| name)
    }
}

impl fmt::Display for FfmpegLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lower = value.to_ascii_lowercase();
        let lower = if lower == "warn" { "warning" } else { lower.as_str() };
        Self::NAMES
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, level)| *level)
            .ok_or_else(|| {
                format!(
                    "invalid log level '{value}', expected one of: quiet, fatal, error, warning, info, debug"
                )
            })
    }
}

/// Set FFmpeg's console verbosity. Does not affect [`log`] output.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}

/// Current FFmpeg console verbosity, if FFmpeg reports a known level.
pub fn get_ffmpeg_log_level() -> Option<FfmpegLogLevel> {
    ffmpeg_next::util::log::get_level()
        .ok()
        .map(FfmpegLogLevel::from_ffmpeg_level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("Quiet".parse(), Ok(FfmpegLogLevel::Quiet));
        assert_eq!("warn".parse(), Ok(FfmpegLogLevel::Warning));
        assert_eq!("DEBUG".parse(), Ok(FfmpegLogLevel::Debug));
        assert!("loud".parse::<FfmpegLogLevel>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for (_, level) in FfmpegLogLevel::NAMES {
            assert_eq!(level.to_string().parse(), Ok(level));
        }
    }

    #[test]
    fn levels_order_from_quiet_to_verbose() {
        assert!(FfmpegLogLevel::Quiet < FfmpegLogLevel::Error);
        assert!(FfmpegLogLevel::Warning < FfmpegLogLevel::Debug);
    }
}
