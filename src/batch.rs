//! Sampling clips from many videos in parallel.
//!
//! Decoder state is not shared between threads: each rayon worker opens its
//! own [`VideoStreamContext`] over its own input bytes.

use ::rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};

use crate::config::ScalingAlgorithm;
use crate::context::VideoStreamContext;
use crate::error::SamplerError;
use crate::layout::FrameLayout;
use crate::planner::KeyframeSeekPlanner;
use crate::sampler::SampleReport;

/// One clip produced by [`sample_clips_parallel`].
#[derive(Debug, Clone)]
pub struct SampledClip {
    /// Packed RGB24 frames, `num_frames × layout.bytes_per_frame()` bytes.
    pub frames: Vec<u8>,
    /// Layout of each frame in `frames`.
    pub layout: FrameLayout,
    /// What the sampler did to fill `frames`.
    pub report: SampleReport,
}

/// Sample one random clip of `num_frames` frames from each in-memory video.
///
/// Input `i` uses a planner seeded with `seed + i`, so a batch is
/// reproducible regardless of how work is scheduled. Results are in input
/// order; a video that fails to open or decode yields an `Err` entry
/// without affecting the others.
///
/// # Example
///
/// ```no_run
/// let videos = vec![std::fs::read("a.mp4")?, std::fs::read("b.mp4")?];
/// for clip in framesampler::batch::sample_clips_parallel(videos, 16, 7) {
///     match clip {
///         Ok(clip) => println!("{} bytes", clip.frames.len()),
///         Err(error) => eprintln!("{error}"),
///     }
/// }
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn sample_clips_parallel(
    inputs: Vec<Vec<u8>>,
    num_frames: usize,
    seed: u64,
) -> Vec<Result<SampledClip, SamplerError>> {
    inputs
        .into_par_iter()
        .enumerate()
        .map(|(index, bytes)| {
            let mut planner = KeyframeSeekPlanner::with_seed(seed.wrapping_add(index as u64));
            sample_clip(bytes, num_frames, &mut planner).inspect_err(|error| {
                log::warn!("Clip {index} failed: {error}");
            })
        })
        .collect()
}

fn sample_clip(
    bytes: Vec<u8>,
    num_frames: usize,
    planner: &mut KeyframeSeekPlanner,
) -> Result<SampledClip, SamplerError> {
    let mut stream = VideoStreamContext::from_bytes(bytes)?;
    let layout = stream.layout();
    let mut frames = vec![0u8; layout.buffer_len(num_frames)];
    let report =
        stream.sample_random_clip(&mut frames, num_frames, planner, ScalingAlgorithm::default())?;
    Ok(SampledClip {
        frames,
        layout,
        report,
    })
}
