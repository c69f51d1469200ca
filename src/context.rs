//! The FFmpeg-backed video stream.
//!
//! [`VideoStreamContext`] owns everything needed to decode one video stream:
//! the demuxer, the decoder, a reusable decoded frame, the stream's cached
//! metadata and, for in-memory input, the custom I/O context the demuxer
//! reads through. It implements [`FrameSource`] so any sampling strategy can
//! drive it.

use std::ffi::c_int;
use std::path::Path;

use ffmpeg_next::codec::context::Context as CodecContext;
use ffmpeg_next::decoder::Video as VideoDecoder;
use ffmpeg_next::format::context::Input;
use ffmpeg_next::frame::Video as VideoFrame;
use ffmpeg_next::{Error as FfmpegError, Packet};
use ffmpeg_sys_next::{AV_NOPTS_VALUE, AVSEEK_FLAG_BACKWARD, av_seek_frame};

use crate::config::{SamplingOptions, ScalingAlgorithm, StreamOptions};
use crate::conversion;
use crate::error::SamplerError;
use crate::layout::FrameLayout;
use crate::memory_io::{MemoryCursor, MemoryIo};
use crate::metadata::StreamMetadata;
use crate::packer::RgbPacker;
use crate::planner::KeyframeSeekPlanner;
use crate::probe;
use crate::sampler::{FrameSampler, SampleReport};
use crate::source::{DecodeStatus, FrameSource};

/// An open video stream ready for frame sampling.
///
/// Created with [`from_bytes`](VideoStreamContext::from_bytes) for encoded
/// video already in memory, or [`open`](VideoStreamContext::open) for a file
/// on disk. Sampling calls continue from wherever the previous call left
/// the decoder; open a new context to start over.
///
/// # Example
///
/// ```no_run
/// use framesampler::{SamplingOptions, VideoStreamContext};
///
/// let mut stream = VideoStreamContext::open("input.mp4")?;
/// let targets = [0, 10, 20];
/// let mut buffer = vec![0u8; stream.layout().buffer_len(targets.len())];
/// let report = stream.sample_frames(&mut buffer, &targets, &SamplingOptions::new())?;
/// println!("{} decoded, {} padded", report.decoded_frames, report.padded_frames);
/// # Ok::<(), framesampler::SamplerError>(())
/// ```
pub struct VideoStreamContext {
    input: Input,
    decoder: VideoDecoder,
    video_stream_index: usize,
    frame: VideoFrame,
    metadata: StreamMetadata,
    draining: bool,
    // Declared after `input` so the demuxer is closed before its I/O context
    // is freed.
    _io: Option<MemoryIo>,
}

impl VideoStreamContext {
    /// Open encoded video held in memory with default [`StreamOptions`].
    ///
    /// # Errors
    ///
    /// - [`SamplerError::FormatProbe`] if the container is not recognised.
    /// - [`SamplerError::NoVideoStream`] if it holds no video stream.
    /// - [`SamplerError::VideoDecodeError`] if no decoder can be opened.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, SamplerError> {
        Self::from_bytes_with_options(bytes, &StreamOptions::default())
    }

    /// Open encoded video held in memory.
    ///
    /// The bytes are owned by the context for its lifetime. The container
    /// format is probed from the first
    /// [`probe_size`](StreamOptions::with_probe_size) bytes.
    ///
    /// # Errors
    ///
    /// As for [`from_bytes`](VideoStreamContext::from_bytes).
    pub fn from_bytes_with_options(
        bytes: impl Into<Vec<u8>>,
        options: &StreamOptions,
    ) -> Result<Self, SamplerError> {
        ffmpeg_next::init().map_err(|error| {
            SamplerError::FormatProbe(format!("FFmpeg initialisation failed: {error}"))
        })?;

        let bytes = bytes.into();
        let probe_size = options.resolve_probe_size(bytes.len());
        log::debug!(
            "Opening {} bytes from memory (probe {probe_size} bytes, I/O buffer {} bytes)",
            bytes.len(),
            options.io_buffer_size
        );

        let mut io = MemoryIo::new(MemoryCursor::new(bytes), options.io_buffer_size)?;
        let format = probe::probe_input_format(io.cursor_mut(), probe_size)?;
        let input = io.open_input(format)?;
        Self::from_input(Some(io), input)
    }

    /// Open a video file.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::FileOpen`] if the file cannot be opened or
    /// recognised, otherwise as for
    /// [`from_bytes`](VideoStreamContext::from_bytes).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SamplerError> {
        let path = path.as_ref();
        log::debug!("Opening video file {}", path.display());

        ffmpeg_next::init().map_err(|error| SamplerError::FileOpen {
            path: path.to_path_buf(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input = ffmpeg_next::format::input(&path).map_err(|error| SamplerError::FileOpen {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
        Self::from_input(None, input)
    }

    // Parameters drop in reverse order, so on an early return `input` is
    // closed before `io` frees the I/O context it reads through.
    fn from_input(io: Option<MemoryIo>, input: Input) -> Result<Self, SamplerError> {
        let video_stream_index =
            probe::find_first_video_stream(&input).ok_or(SamplerError::NoVideoStream)?;

        let (decoder, metadata) = {
            let stream = input
                .stream(video_stream_index)
                .ok_or(SamplerError::NoVideoStream)?;
            let decoder_context =
                CodecContext::from_parameters(stream.parameters()).map_err(|error| {
                    SamplerError::VideoDecodeError(format!(
                        "Failed to read video codec parameters: {error}"
                    ))
                })?;
            let decoder = decoder_context.decoder().video().map_err(|error| {
                SamplerError::VideoDecodeError(format!("Failed to create video decoder: {error}"))
            })?;
            let metadata = read_metadata(&input, &stream, &decoder);
            (decoder, metadata)
        };

        log::debug!(
            "Video stream {video_stream_index}: {}x{} {} @ {:.3} fps, {} frames, time base {}",
            metadata.width,
            metadata.height,
            metadata.codec,
            metadata.frames_per_second,
            metadata.frame_count,
            metadata.time_base
        );

        Ok(Self {
            input,
            decoder,
            video_stream_index,
            frame: VideoFrame::empty(),
            metadata,
            draining: false,
            _io: io,
        })
    }

    /// Cached stream metadata.
    pub fn metadata(&self) -> &StreamMetadata {
        &self.metadata
    }

    /// Layout of one packed RGB frame of this stream.
    pub fn layout(&self) -> FrameLayout {
        FrameLayout::new(self.metadata.width, self.metadata.height)
    }

    /// A packer converting this stream's frames to RGB24 at native size.
    ///
    /// # Errors
    ///
    /// Returns an FFmpeg error if the decoder's pixel format has no
    /// conversion path to RGB24.
    pub fn rgb_packer(&self, algorithm: ScalingAlgorithm) -> Result<RgbPacker, SamplerError> {
        RgbPacker::new(
            self.decoder.format(),
            self.metadata.width,
            self.metadata.height,
            algorithm,
        )
    }

    /// Pack the frames at `targets` into `dest`.
    ///
    /// Shorthand for a [`FrameSampler`] with an [`RgbPacker`]; see
    /// [`FrameSampler::sample_frames`] for the semantics and errors.
    pub fn sample_frames(
        &mut self,
        dest: &mut [u8],
        targets: &[u64],
        options: &SamplingOptions,
    ) -> Result<SampleReport, SamplerError> {
        let packer = self.rgb_packer(options.scaling)?;
        FrameSampler::new(self, packer).sample_frames(dest, targets, options.seek, options.index_mode)
    }

    /// Pack the next `num_requested_frames` frames into `dest`.
    ///
    /// See [`FrameSampler::sample_sequential`].
    pub fn sample_sequential(
        &mut self,
        dest: &mut [u8],
        num_requested_frames: usize,
        scaling: ScalingAlgorithm,
    ) -> Result<SampleReport, SamplerError> {
        let packer = self.rgb_packer(scaling)?;
        FrameSampler::new(self, packer).sample_sequential(dest, num_requested_frames)
    }

    /// Pack a clip of `num_requested_frames` consecutive frames from a
    /// random position.
    ///
    /// See [`FrameSampler::sample_random_clip`].
    pub fn sample_random_clip(
        &mut self,
        dest: &mut [u8],
        num_requested_frames: usize,
        planner: &mut KeyframeSeekPlanner,
        scaling: ScalingAlgorithm,
    ) -> Result<SampleReport, SamplerError> {
        let packer = self.rgb_packer(scaling)?;
        FrameSampler::new(self, packer).sample_random_clip(dest, num_requested_frames, planner)
    }

    /// Read packets until one for the video stream has been sent to the
    /// decoder. At end of input the decoder is switched to draining.
    fn feed_decoder(&mut self) -> Result<(), SamplerError> {
        let mut packet = Packet::empty();
        loop {
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() == self.video_stream_index {
                        self.decoder.send_packet(&packet).map_err(|error| {
                            SamplerError::VideoDecodeError(format!("send_packet failed: {error}"))
                        })?;
                        return Ok(());
                    }
                }
                Err(FfmpegError::Eof) => break,
                Err(error) => {
                    log::debug!("Demuxer stopped with {error}; draining decoder");
                    break;
                }
            }
        }

        self.decoder.send_eof().map_err(|error| {
            SamplerError::VideoDecodeError(format!("send_eof failed: {error}"))
        })?;
        self.draining = true;
        Ok(())
    }
}

impl FrameSource for VideoStreamContext {
    type Frame = VideoFrame;

    fn metadata(&self) -> &StreamMetadata {
        &self.metadata
    }

    fn next_frame(&mut self) -> Result<DecodeStatus, SamplerError> {
        loop {
            match self.decoder.receive_frame(&mut self.frame) {
                Ok(()) => return Ok(DecodeStatus::Frame),
                Err(FfmpegError::Eof) => return Ok(DecodeStatus::EndOfStream),
                Err(FfmpegError::Other { errno }) if errno == ffmpeg_next::error::EAGAIN => {}
                Err(error) => {
                    return Err(SamplerError::VideoDecodeError(format!(
                        "receive_frame failed: {error}"
                    )));
                }
            }

            if self.draining {
                return Ok(DecodeStatus::EndOfStream);
            }
            self.feed_decoder()?;
        }
    }

    fn frame(&self) -> &VideoFrame {
        &self.frame
    }

    fn frame_pts(&self) -> i64 {
        self.frame
            .pts()
            .or_else(|| self.frame.timestamp())
            .unwrap_or(0)
    }

    fn seek_near(&mut self, timestamp: i64) -> Result<(), SamplerError> {
        // SAFETY: the format context is owned by `self.input` and stays open
        // for the duration of the call.
        let status = unsafe {
            av_seek_frame(
                self.input.as_mut_ptr(),
                self.video_stream_index as c_int,
                timestamp,
                AVSEEK_FLAG_BACKWARD as c_int,
            )
        };
        if status < 0 {
            return Err(SamplerError::SeekFailed {
                timestamp,
                reason: FfmpegError::from(status).to_string(),
            });
        }

        self.decoder.flush();
        self.draining = false;
        Ok(())
    }
}

fn read_metadata(
    input: &Input,
    stream: &ffmpeg_next::format::stream::Stream,
    decoder: &VideoDecoder,
) -> StreamMetadata {
    let time_base = stream.time_base();

    let duration = if stream.duration() > 0 {
        stream.duration()
    } else if input.duration() > 0 {
        // Container duration is in microseconds.
        conversion::rescale_round_down(
            input.duration(),
            i64::from(time_base.denominator()),
            i64::from(time_base.numerator()) * 1_000_000,
        )
        .unwrap_or(0)
    } else {
        0
    };

    let frame_rate = stream.avg_frame_rate();
    let frames_per_second = if frame_rate.denominator() != 0 && frame_rate.numerator() > 0 {
        f64::from(frame_rate)
    } else {
        let rate = stream.rate();
        if rate.denominator() != 0 {
            f64::from(rate)
        } else {
            0.0
        }
    };

    let frame_count = if stream.frames() > 0 {
        stream.frames() as u64
    } else if frames_per_second > 0.0 {
        (conversion::pts_to_seconds(duration, time_base) * frames_per_second) as u64
    } else {
        0
    };

    let start_time = match stream.start_time() {
        AV_NOPTS_VALUE => 0,
        start_time => start_time,
    };

    StreamMetadata {
        duration,
        frame_count,
        time_base,
        start_time,
        width: decoder.width(),
        height: decoder.height(),
        frames_per_second,
        codec: decoder.id().name().to_string(),
    }
}
