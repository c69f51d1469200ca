//! Packed RGB24 output layout.
//!
//! Output buffers hold consecutive frames of `3 × width × height` bytes,
//! rows and frames back to back with no padding. [`FrameLayout`] computes
//! those sizes and [`frame_image`] turns one frame of such a buffer back into
//! an [`image::RgbImage`].

use image::RgbImage;

use crate::error::SamplerError;

/// Bytes per pixel in the packed output.
pub const BYTES_PER_PIXEL: usize = 3;

/// Dimensions of one packed RGB24 frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameLayout {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

impl FrameLayout {
    /// Create a layout for `width × height` frames.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Bytes in one packed row (`3 × width`).
    pub fn bytes_per_row(&self) -> usize {
        BYTES_PER_PIXEL * self.width as usize
    }

    /// Bytes in one packed frame (`3 × width × height`).
    pub fn bytes_per_frame(&self) -> usize {
        self.bytes_per_row() * self.height as usize
    }

    /// Bytes needed for `frame_count` packed frames.
    pub fn buffer_len(&self, frame_count: usize) -> usize {
        self.bytes_per_frame() * frame_count
    }

    /// Check that `buffer` holds exactly `frame_count` frames.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::BufferSizeMismatch`] otherwise.
    pub fn check_buffer(&self, buffer: &[u8], frame_count: usize) -> Result<(), SamplerError> {
        let expected = self.buffer_len(frame_count);
        if buffer.len() != expected {
            return Err(SamplerError::BufferSizeMismatch {
                expected,
                actual: buffer.len(),
            });
        }
        Ok(())
    }
}

/// Copy frame `index` of a packed buffer into an [`RgbImage`].
///
/// # Errors
///
/// Returns [`SamplerError::BufferSizeMismatch`] if the buffer is too short to
/// contain that frame.
pub fn frame_image(
    buffer: &[u8],
    layout: FrameLayout,
    index: usize,
) -> Result<RgbImage, SamplerError> {
    let frame_bytes = layout.bytes_per_frame();
    let start = frame_bytes * index;
    let end = start + frame_bytes;
    if buffer.len() < end {
        return Err(SamplerError::BufferSizeMismatch {
            expected: end,
            actual: buffer.len(),
        });
    }

    RgbImage::from_raw(layout.width, layout.height, buffer[start..end].to_vec()).ok_or_else(
        || SamplerError::VideoDecodeError("Failed to construct RGB image from frame data".to_string()),
    )
}
