//! Container format detection for in-memory input.
//!
//! Without a file name FFmpeg cannot guess the demuxer from an extension, so
//! the first bytes of the blob are handed to `av_probe_input_format` instead.

use std::ffi::{CStr, c_int};
use std::ptr;

use ffmpeg_next::format::context::Input;
use ffmpeg_next::media::Type;
use ffmpeg_sys_next::{AVInputFormat, AVPROBE_PADDING_SIZE, AVProbeData, av_probe_input_format};

use crate::error::SamplerError;
use crate::memory_io::{MemoryCursor, Whence};

/// A demuxer chosen by probing.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ProbedFormat(*const AVInputFormat);

impl ProbedFormat {
    pub(crate) fn as_ptr(self) -> *const AVInputFormat {
        self.0
    }

    /// Short demuxer name, such as `mov,mp4,m4a,3gp,3g2,mj2`.
    pub(crate) fn name(self) -> String {
        // SAFETY: the pointer came from av_probe_input_format and refers to a
        // static demuxer description whose name is a NUL-terminated string.
        unsafe {
            let name = (*self.0).name;
            if name.is_null() {
                return "unknown".to_string();
            }
            CStr::from_ptr(name).to_string_lossy().into_owned()
        }
    }
}

/// Guess the container format from the first `probe_size` bytes of
/// `cursor`, then rewind it to the start.
///
/// The probe buffer is zero-padded by `AVPROBE_PADDING_SIZE` bytes as FFmpeg
/// requires.
///
/// # Errors
///
/// Returns [`SamplerError::FormatProbe`] if the input is empty or no
/// demuxer recognises it.
pub(crate) fn probe_input_format(
    cursor: &mut MemoryCursor,
    probe_size: usize,
) -> Result<ProbedFormat, SamplerError> {
    if cursor.is_empty() {
        return Err(SamplerError::FormatProbe("input is empty".to_string()));
    }

    let mut probe_buffer = vec![0u8; probe_size + AVPROBE_PADDING_SIZE as usize];
    let read = cursor.read(&mut probe_buffer[..probe_size]);
    cursor.seek(0, Whence::Set);

    let probe_data = AVProbeData {
        filename: c"".as_ptr(),
        buf: probe_buffer.as_mut_ptr(),
        buf_size: read as c_int,
        mime_type: ptr::null(),
    };

    // SAFETY: `probe_data` points at a live, padded buffer for the duration
    // of the call.
    let format = unsafe { av_probe_input_format(&probe_data, 1) };
    if format.is_null() {
        return Err(SamplerError::FormatProbe(format!(
            "no demuxer recognised the first {read} bytes"
        )));
    }

    let format = ProbedFormat(format);
    log::debug!("Probed input format: {}", format.name());
    Ok(format)
}

/// Index of the first video stream in `input`.
pub(crate) fn find_first_video_stream(input: &Input) -> Option<usize> {
    input
        .streams()
        .find(|stream| stream.parameters().medium() == Type::Video)
        .map(|stream| stream.index())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_rejected() {
        let mut cursor = MemoryCursor::new(Vec::new());
        let error = probe_input_format(&mut cursor, 4096).unwrap_err();
        assert!(matches!(error, SamplerError::FormatProbe(_)));
    }

    #[test]
    fn probing_rewinds_the_cursor() {
        let mut cursor = MemoryCursor::new(vec![0xAB; 64]);
        let _ = probe_input_format(&mut cursor, 32);
        assert_eq!(cursor.position(), 0);
    }
}
