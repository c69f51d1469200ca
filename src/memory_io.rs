//! Reading media from memory through FFmpeg's custom I/O hooks.
//!
//! [`MemoryCursor`] implements file-like `read` and `seek` over an owned
//! byte buffer. [`MemoryIo`] hands a cursor to an `AVIOContext` through C
//! callbacks so the demuxer can read an in-memory blob as if it were a file.

use std::ffi::{c_int, c_void};
use std::ptr;

use ffmpeg_next::format::context::Input;
use ffmpeg_sys_next::{
    AVERROR_EOF, AVFMT_FLAG_CUSTOM_IO, AVIOContext, AVSEEK_FORCE, AVSEEK_SIZE, av_freep,
    av_malloc, avformat_alloc_context, avformat_close_input, avformat_find_stream_info,
    avformat_open_input, avio_alloc_context, avio_context_free,
};

use crate::error::SamplerError;
use crate::probe::ProbedFormat;

/// Origin of a [`MemoryCursor::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// Absolute offset from the start.
    Set,
    /// Relative to the current position.
    Current,
    /// Relative to the end (`len + offset`).
    End,
    /// Report the total size without moving.
    Size,
}

impl Whence {
    /// Decode an FFmpeg `whence` argument. `AVSEEK_FORCE` is ignored.
    pub fn from_raw(whence: c_int) -> Option<Self> {
        let whence = whence & !(AVSEEK_FORCE as c_int);
        if whence & AVSEEK_SIZE as c_int != 0 {
            return Some(Whence::Size);
        }
        match whence {
            0 => Some(Whence::Set),
            1 => Some(Whence::Current),
            2 => Some(Whence::End),
            _ => None,
        }
    }
}

/// A read cursor over an owned byte buffer.
#[derive(Debug, Clone)]
pub struct MemoryCursor {
    data: Vec<u8>,
    position: usize,
}

impl MemoryCursor {
    /// Cursor at the start of `data`.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }

    /// Total size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current read offset.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Copy up to `dst.len()` bytes from the current position and advance.
    /// Returns the number of bytes copied, zero at the end.
    pub fn read(&mut self, dst: &mut [u8]) -> usize {
        let remaining = &self.data[self.position..];
        let count = remaining.len().min(dst.len());
        dst[..count].copy_from_slice(&remaining[..count]);
        self.position += count;
        count
    }

    /// Move the cursor and return the new offset, or the total size for
    /// [`Whence::Size`].
    ///
    /// Returns `None` and leaves the cursor in place if the target lies
    /// before the start or past the end.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Option<u64> {
        let base = match whence {
            Whence::Size => return Some(self.data.len() as u64),
            Whence::Set => 0,
            Whence::Current => self.position as i64,
            Whence::End => self.data.len() as i64,
        };
        let target = base.checked_add(offset)?;
        if target < 0 || target as usize > self.data.len() {
            return None;
        }
        self.position = target as usize;
        Some(target as u64)
    }
}

unsafe extern "C" fn read_packet(opaque: *mut c_void, buffer: *mut u8, buffer_size: c_int) -> c_int {
    if buffer_size <= 0 {
        return 0;
    }
    // SAFETY: `opaque` is the cursor leaked in `MemoryIo::new`, which stays
    // alive until the AVIOContext is freed. FFmpeg guarantees `buffer` holds
    // `buffer_size` writable bytes.
    let (cursor, dst) = unsafe {
        (
            &mut *(opaque as *mut MemoryCursor),
            std::slice::from_raw_parts_mut(buffer, buffer_size as usize),
        )
    };
    match cursor.read(dst) {
        0 => AVERROR_EOF,
        count => count as c_int,
    }
}

unsafe extern "C" fn seek_packet(opaque: *mut c_void, offset: i64, whence: c_int) -> i64 {
    // SAFETY: see `read_packet`.
    let cursor = unsafe { &mut *(opaque as *mut MemoryCursor) };
    Whence::from_raw(whence)
        .and_then(|whence| cursor.seek(offset, whence))
        .map_or(-1, |position| position as i64)
}

/// An `AVIOContext` reading from a [`MemoryCursor`].
///
/// Must outlive any demuxer opened on it: FFmpeg does not free custom I/O
/// contexts when closing an input.
pub(crate) struct MemoryIo {
    context: *mut AVIOContext,
    cursor: *mut MemoryCursor,
}

impl MemoryIo {
    /// Allocate an I/O context with a read buffer of `buffer_size` bytes.
    pub(crate) fn new(cursor: MemoryCursor, buffer_size: usize) -> Result<Self, SamplerError> {
        let cursor = Box::into_raw(Box::new(cursor));

        // SAFETY: the buffer comes from av_malloc as avio_alloc_context
        // requires, and is released through the context in `Drop` (FFmpeg may
        // replace it). On failure everything allocated here is freed before
        // returning.
        unsafe {
            let mut buffer = av_malloc(buffer_size) as *mut u8;
            if buffer.is_null() {
                drop(Box::from_raw(cursor));
                return Err(SamplerError::FfmpegError(
                    "Failed to allocate custom I/O buffer".to_string(),
                ));
            }

            let context = avio_alloc_context(
                buffer,
                buffer_size as c_int,
                0,
                cursor as *mut c_void,
                Some(read_packet),
                None,
                Some(seek_packet),
            );
            if context.is_null() {
                av_freep(&mut buffer as *mut *mut u8 as *mut c_void);
                drop(Box::from_raw(cursor));
                return Err(SamplerError::FfmpegError(
                    "Failed to allocate custom I/O context".to_string(),
                ));
            }

            Ok(Self { context, cursor })
        }
    }

    /// The underlying cursor, for probing before the demuxer is opened.
    pub(crate) fn cursor_mut(&mut self) -> &mut MemoryCursor {
        // SAFETY: the cursor is owned by `self` and FFmpeg only touches it
        // from inside demuxer calls, which cannot run while this borrow lives.
        unsafe { &mut *self.cursor }
    }

    /// Open a demuxer of the probed `format` that reads through this context.
    ///
    /// The returned [`Input`] must be dropped before `self`.
    pub(crate) fn open_input(&mut self, format: ProbedFormat) -> Result<Input, SamplerError> {
        // SAFETY: the format context is freshly allocated and handed to
        // avformat_open_input, which frees it on failure. CUSTOM_IO stops
        // FFmpeg from closing our AVIOContext when the input is closed.
        unsafe {
            let mut format_context = avformat_alloc_context();
            if format_context.is_null() {
                return Err(SamplerError::FfmpegError(
                    "Failed to allocate format context".to_string(),
                ));
            }
            (*format_context).pb = self.context;
            (*format_context).flags |= AVFMT_FLAG_CUSTOM_IO as c_int;

            let status = avformat_open_input(
                &mut format_context,
                c"".as_ptr(),
                format.as_ptr(),
                ptr::null_mut(),
            );
            if status < 0 {
                return Err(SamplerError::FormatProbe(format!(
                    "Failed to open {} input: {}",
                    format.name(),
                    ffmpeg_next::Error::from(status)
                )));
            }

            let status = avformat_find_stream_info(format_context, ptr::null_mut());
            if status < 0 {
                avformat_close_input(&mut format_context);
                return Err(SamplerError::FormatProbe(format!(
                    "Failed to read stream info: {}",
                    ffmpeg_next::Error::from(status)
                )));
            }

            Ok(Input::wrap(format_context))
        }
    }
}

impl Drop for MemoryIo {
    fn drop(&mut self) {
        // SAFETY: both pointers were created in `new` and are freed exactly
        // once here. The context's current buffer is freed first because
        // avio_context_free does not release it.
        unsafe {
            if !self.context.is_null() {
                av_freep(&mut (*self.context).buffer as *mut *mut u8 as *mut c_void);
                avio_context_free(&mut self.context);
            }
            drop(Box::from_raw(self.cursor));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_advances_and_stops_at_end() {
        let mut cursor = MemoryCursor::new(vec![1, 2, 3, 4, 5]);
        let mut dst = [0u8; 3];
        assert_eq!(cursor.read(&mut dst), 3);
        assert_eq!(dst, [1, 2, 3]);
        assert_eq!(cursor.read(&mut dst), 2);
        assert_eq!(&dst[..2], &[4, 5]);
        assert_eq!(cursor.read(&mut dst), 0);
        assert_eq!(cursor.position(), 5);
    }

    #[test]
    fn seek_follows_file_conventions() {
        let mut cursor = MemoryCursor::new(vec![0; 10]);
        assert_eq!(cursor.seek(4, Whence::Set), Some(4));
        assert_eq!(cursor.seek(3, Whence::Current), Some(7));
        assert_eq!(cursor.seek(-2, Whence::Current), Some(5));
        assert_eq!(cursor.seek(-3, Whence::End), Some(7));
        assert_eq!(cursor.seek(0, Whence::End), Some(10));
    }

    #[test]
    fn size_does_not_move_the_cursor() {
        let mut cursor = MemoryCursor::new(vec![0; 10]);
        cursor.seek(6, Whence::Set);
        assert_eq!(cursor.seek(0, Whence::Size), Some(10));
        assert_eq!(cursor.position(), 6);
    }

    #[test]
    fn out_of_range_seek_is_rejected() {
        let mut cursor = MemoryCursor::new(vec![0; 10]);
        cursor.seek(3, Whence::Set);
        assert_eq!(cursor.seek(-1, Whence::Set), None);
        assert_eq!(cursor.seek(11, Whence::Set), None);
        assert_eq!(cursor.seek(1, Whence::End), None);
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn whence_from_raw() {
        assert_eq!(Whence::from_raw(0), Some(Whence::Set));
        assert_eq!(Whence::from_raw(1), Some(Whence::Current));
        assert_eq!(Whence::from_raw(2), Some(Whence::End));
        assert_eq!(Whence::from_raw(AVSEEK_SIZE as c_int), Some(Whence::Size));
        assert_eq!(
            Whence::from_raw(AVSEEK_FORCE as c_int | 1),
            Some(Whence::Current)
        );
        assert_eq!(Whence::from_raw(7), None);
    }
}
