//! Packing decoded frames into the output buffer.
//!
//! [`RgbPacker`] converts each decoded frame to RGB24 with FFmpeg's software
//! scaler into a reusable temporary frame, then strips the row padding of
//! that frame while copying it into the destination with [`copy_rows`].

use ffmpeg_next::{
    format::Pixel,
    frame::Video as VideoFrame,
    software::scaling::Context as ScalingContext,
};

use crate::config::ScalingAlgorithm;
use crate::error::SamplerError;
use crate::layout::FrameLayout;

/// Writes one decoded frame into a packed RGB24 buffer.
pub trait PixelPacker<F: ?Sized> {
    /// Layout of every frame this packer writes.
    fn layout(&self) -> FrameLayout;

    /// Write `frame` into `dest` starting at `offset` and return the offset
    /// just past it (`offset + 3 × width × height`).
    ///
    /// Only `dest` is modified.
    ///
    /// # Errors
    ///
    /// Conversion failures, or [`SamplerError::BufferSizeMismatch`] when the
    /// frame does not fit at `offset`.
    fn pack(&mut self, dest: &mut [u8], frame: &F, offset: usize) -> Result<usize, SamplerError>;
}

/// Copy `rows` rows of `row_bytes` bytes from a plane whose rows start every
/// `stride` bytes into `dest` at `offset`, with no padding between rows.
///
/// Returns the offset just past the last copied row.
///
/// # Errors
///
/// Returns [`SamplerError::BufferSizeMismatch`] if `dest` is too short, or
/// [`SamplerError::VideoDecodeError`] if the plane is smaller than its
/// stride claims.
pub fn copy_rows(
    dest: &mut [u8],
    offset: usize,
    plane: &[u8],
    stride: usize,
    row_bytes: usize,
    rows: usize,
) -> Result<usize, SamplerError> {
    let end = offset + row_bytes * rows;
    if dest.len() < end {
        return Err(SamplerError::BufferSizeMismatch {
            expected: end,
            actual: dest.len(),
        });
    }
    if rows > 0 && plane.len() < stride * (rows - 1) + row_bytes {
        return Err(SamplerError::VideoDecodeError(format!(
            "Plane of {} bytes is too small for {rows} rows with stride {stride}",
            plane.len()
        )));
    }

    if stride == row_bytes {
        dest[offset..end].copy_from_slice(&plane[..row_bytes * rows]);
        return Ok(end);
    }

    let mut write_offset = offset;
    for row in 0..rows {
        let row_start = row * stride;
        dest[write_offset..write_offset + row_bytes]
            .copy_from_slice(&plane[row_start..row_start + row_bytes]);
        write_offset += row_bytes;
    }
    Ok(write_offset)
}

/// Converts FFmpeg frames of one source format to packed RGB24.
///
/// Owns the scaling context and the temporary RGB frame; both are released
/// when the packer is dropped.
pub struct RgbPacker {
    scaler: ScalingContext,
    rgb_frame: VideoFrame,
    layout: FrameLayout,
}

impl RgbPacker {
    /// Create a packer for frames of `format` at `width × height`. Output has
    /// the same dimensions.
    ///
    /// # Errors
    ///
    /// Returns an FFmpeg error if no conversion path to RGB24 exists.
    pub fn new(
        format: Pixel,
        width: u32,
        height: u32,
        algorithm: ScalingAlgorithm,
    ) -> Result<Self, SamplerError> {
        let scaler = ScalingContext::get(
            format,
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            algorithm.to_ffmpeg_flags(),
        )?;

        Ok(Self {
            scaler,
            rgb_frame: VideoFrame::new(Pixel::RGB24, width, height),
            layout: FrameLayout::new(width, height),
        })
    }
}

impl PixelPacker<VideoFrame> for RgbPacker {
    fn layout(&self) -> FrameLayout {
        self.layout
    }

    fn pack(
        &mut self,
        dest: &mut [u8],
        frame: &VideoFrame,
        offset: usize,
    ) -> Result<usize, SamplerError> {
        self.scaler.run(frame, &mut self.rgb_frame)?;

        copy_rows(
            dest,
            offset,
            self.rgb_frame.data(0),
            self.rgb_frame.stride(0),
            self.layout.bytes_per_row(),
            self.layout.height as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_rows_strips_padding() {
        // Two rows of 6 bytes each, padded to a stride of 8.
        let plane = [1, 2, 3, 4, 5, 6, 0, 0, 7, 8, 9, 10, 11, 12, 0, 0];
        let mut dest = [0xAA; 14];
        let end = copy_rows(&mut dest, 2, &plane, 8, 6, 2).unwrap();
        assert_eq!(end, 14);
        assert_eq!(dest, [0xAA, 0xAA, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn copy_rows_tight_plane() {
        let plane = [9u8; 12];
        let mut dest = [0u8; 12];
        assert_eq!(copy_rows(&mut dest, 0, &plane, 6, 6, 2).unwrap(), 12);
        assert_eq!(dest, plane);
    }

    #[test]
    fn copy_rows_allows_unpadded_last_row() {
        let plane = [1, 2, 0, 3, 4];
        let mut dest = [0u8; 4];
        copy_rows(&mut dest, 0, &plane, 3, 2, 2).unwrap();
        assert_eq!(dest, [1, 2, 3, 4]);
    }

    #[test]
    fn copy_rows_rejects_short_destination() {
        let plane = [0u8; 12];
        let mut dest = [0u8; 11];
        assert!(matches!(
            copy_rows(&mut dest, 0, &plane, 6, 6, 2),
            Err(SamplerError::BufferSizeMismatch { expected: 12, actual: 11 })
        ));
    }

    #[test]
    fn copy_rows_rejects_short_plane() {
        let plane = [0u8; 10];
        let mut dest = [0u8; 12];
        assert!(matches!(
            copy_rows(&mut dest, 0, &plane, 6, 6, 2),
            Err(SamplerError::VideoDecodeError(_))
        ));
    }
}
