//! FFmpeg-backed stream tests.
//!
//! Most tests require fixture files from `tests/fixtures/generate_fixtures.sh`
//! and return early when they are missing.

use std::path::Path;

use framesampler::{
    FrameSampler, IndexMode, KeyframeSeekPlanner, SamplerError, SamplingOptions,
    ScalingAlgorithm, StreamOptions, VideoStreamContext, frame_image,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

fn sample_audio_only_path() -> &'static str {
    "tests/fixtures/sample_audio_only.mp4"
}

fn read_fixture(path: &str) -> Option<Vec<u8>> {
    if !Path::new(path).exists() {
        return None;
    }
    Some(std::fs::read(path).expect("Failed to read fixture"))
}

// ── opening ───────────────────────────────────────────────────────

#[test]
fn open_nonexistent_file() {
    let result = VideoStreamContext::open("this_file_does_not_exist.mp4");
    let error_message = result.err().expect("open should fail").to_string();
    assert!(
        error_message.contains("Failed to open media file"),
        "Error message should mention file open failure: {error_message}",
    );
}

#[test]
fn empty_input_is_not_probed() {
    let result = VideoStreamContext::from_bytes(Vec::new());
    assert!(matches!(result, Err(SamplerError::FormatProbe(_))));
}

#[test]
fn garbage_input_is_rejected() {
    let result = VideoStreamContext::from_bytes(b"this is not a media file".to_vec());
    assert!(result.is_err(), "Expected error for invalid media");
}

#[test]
fn audio_only_input_has_no_video_stream() {
    let Some(bytes) = read_fixture(sample_audio_only_path()) else {
        return;
    };
    let result = VideoStreamContext::from_bytes(bytes);
    assert!(matches!(result, Err(SamplerError::NoVideoStream)));
}

#[test]
fn failed_memory_opens_release_cleanly() {
    let Some(audio_only) = read_fixture(sample_audio_only_path()) else {
        return;
    };
    let Some(video) = read_fixture(sample_video_path()) else {
        return;
    };

    // Each failure tears down a demuxer that was reading from memory.
    for _ in 0..16 {
        let result = VideoStreamContext::from_bytes(audio_only.clone());
        assert!(matches!(result, Err(SamplerError::NoVideoStream)));
    }

    let mut stream = VideoStreamContext::from_bytes(video).expect("Failed to open fixture");
    let mut buffer = vec![0u8; stream.layout().buffer_len(1)];
    stream
        .sample_frames(&mut buffer, &[3], &SamplingOptions::new())
        .expect("Sampling after failed opens should succeed");
}

#[test]
fn memory_and_file_inputs_agree_on_metadata() {
    let Some(bytes) = read_fixture(sample_video_path()) else {
        return;
    };

    let from_file = VideoStreamContext::open(sample_video_path()).expect("Failed to open fixture");
    let from_memory = VideoStreamContext::from_bytes_with_options(
        bytes,
        &StreamOptions::new().with_io_buffer_size(8 * 1024).with_probe_size(2048),
    )
    .expect("Failed to open fixture from memory");

    let metadata = from_memory.metadata();
    assert_eq!(metadata, from_file.metadata());
    assert_eq!((metadata.width, metadata.height), (160, 120));
    assert!(metadata.frame_count >= 100, "frame count {}", metadata.frame_count);
    assert!(metadata.duration > 0);
    assert!((metadata.frames_per_second - 30.0).abs() < 0.1);
    assert_eq!(metadata.codec, "h264");
}

// ── sampling ──────────────────────────────────────────────────────

#[test]
fn sample_frames_fills_the_buffer() {
    let Some(bytes) = read_fixture(sample_video_path()) else {
        return;
    };
    let mut stream = VideoStreamContext::from_bytes(bytes).expect("Failed to open fixture");
    let layout = stream.layout();
    let targets = [0, 5, 5, 10];
    let mut buffer = vec![0u8; layout.buffer_len(targets.len())];

    let report = stream
        .sample_frames(&mut buffer, &targets, &SamplingOptions::new())
        .expect("Sampling failed");

    assert_eq!(report.decoded_frames, 4);
    assert_eq!(report.padded_frames, 0);
    assert_eq!(report.bytes_written, buffer.len());

    let frame_bytes = layout.bytes_per_frame();
    assert_eq!(
        buffer[frame_bytes..2 * frame_bytes],
        buffer[2 * frame_bytes..3 * frame_bytes],
        "Repeated targets should pack the same frame",
    );
}

#[test]
fn seeking_matches_sequential_decoding() {
    let Some(bytes) = read_fixture(sample_video_path()) else {
        return;
    };
    let targets = [20, 47, 80];

    let mut scanned = VideoStreamContext::from_bytes(bytes.clone()).expect("Failed to open");
    let mut seeked = VideoStreamContext::from_bytes(bytes).expect("Failed to open");
    let mut from_scan = vec![0u8; scanned.layout().buffer_len(targets.len())];
    let mut from_seek = from_scan.clone();

    scanned
        .sample_frames(&mut from_scan, &targets, &SamplingOptions::new())
        .expect("Scanning failed");
    seeked
        .sample_frames(
            &mut from_seek,
            &targets,
            &SamplingOptions::new().with_seek(true),
        )
        .expect("Seeking failed");

    assert!(from_scan == from_seek, "Seeked frames differ from scanned frames");
}

#[test]
fn raw_timebase_targets_are_seconds() {
    let Some(bytes) = read_fixture(sample_video_path()) else {
        return;
    };
    let mut stream = VideoStreamContext::from_bytes(bytes).expect("Failed to open fixture");
    let mut buffer = vec![0u8; stream.layout().buffer_len(2)];

    let options = SamplingOptions::new()
        .with_seek(true)
        .with_index_mode(IndexMode::RawTimebase);
    let report = stream
        .sample_frames(&mut buffer, &[1, 2], &options)
        .expect("Sampling failed");
    assert_eq!(report.decoded_frames, 2);
}

#[test]
fn targets_past_the_end_are_padded() {
    let Some(bytes) = read_fixture(sample_video_path()) else {
        return;
    };
    let mut stream = VideoStreamContext::from_bytes(bytes).expect("Failed to open fixture");
    let past_end = stream.metadata().frame_count + 10;
    let layout = stream.layout();
    let mut buffer = vec![0u8; layout.buffer_len(3)];

    let report = stream
        .sample_frames(&mut buffer, &[3, past_end, past_end], &SamplingOptions::new())
        .expect("Sampling failed");

    assert_eq!(report.decoded_frames, 1);
    assert_eq!(report.padded_frames, 2);
    let frame_bytes = layout.bytes_per_frame();
    assert_eq!(buffer[..frame_bytes], buffer[2 * frame_bytes..]);
}

#[test]
fn sequential_sampling_pads_at_end_of_stream() {
    let Some(bytes) = read_fixture(sample_video_path()) else {
        return;
    };
    let mut stream = VideoStreamContext::from_bytes(bytes).expect("Failed to open fixture");
    let count = stream.metadata().frame_count as usize + 5;
    let mut buffer = vec![0u8; stream.layout().buffer_len(count)];

    let report = stream
        .sample_sequential(&mut buffer, count, ScalingAlgorithm::Bilinear)
        .expect("Sampling failed");

    assert!(report.padded_frames >= 5);
    assert_eq!(report.decoded_frames + report.padded_frames, count);

    let error = stream
        .sample_sequential(&mut buffer, count, ScalingAlgorithm::Bilinear)
        .unwrap_err();
    assert!(matches!(error, SamplerError::NoFramesAvailable));
}

#[test]
fn random_clip_is_reproducible() {
    let Some(bytes) = read_fixture(sample_video_path()) else {
        return;
    };
    let mut clips = Vec::new();
    for _ in 0..2 {
        let mut stream = VideoStreamContext::from_bytes(bytes.clone()).expect("Failed to open");
        let mut planner = KeyframeSeekPlanner::with_seed(1234);
        let mut buffer = vec![0u8; stream.layout().buffer_len(8)];
        let report = stream
            .sample_random_clip(&mut buffer, 8, &mut planner, ScalingAlgorithm::Bilinear)
            .expect("Clip sampling failed");
        assert_eq!(report.padded_frames, 0);
        clips.push((buffer, report.seek));
    }
    assert!(clips[0] == clips[1], "Seeded clips should be identical");
}

#[test]
fn sampler_with_explicit_packer() {
    let Some(bytes) = read_fixture(sample_video_path()) else {
        return;
    };
    let mut stream = VideoStreamContext::from_bytes(bytes).expect("Failed to open fixture");
    let packer = stream
        .rgb_packer(ScalingAlgorithm::Point)
        .expect("Failed to create packer");
    let mut sampler = FrameSampler::new(&mut stream, packer);
    let layout = sampler.layout();
    let mut buffer = vec![0u8; layout.buffer_len(2)];

    sampler
        .sample_frames(&mut buffer, &[1, 2], false, IndexMode::AverageDuration)
        .expect("Sampling failed");

    let image = frame_image(&buffer, layout, 1).expect("Failed to build image");
    assert_eq!(image.dimensions(), (160, 120));
    assert!(
        image.pixels().any(|pixel| pixel.0 != [0, 0, 0]),
        "The test pattern should not be black",
    );
}

#[test]
fn png_export_round_trips() {
    let Some(bytes) = read_fixture(sample_video_path()) else {
        return;
    };
    let mut stream = VideoStreamContext::from_bytes(bytes).expect("Failed to open fixture");
    let layout = stream.layout();
    let mut buffer = vec![0u8; layout.buffer_len(1)];
    stream
        .sample_frames(&mut buffer, &[12], &SamplingOptions::new())
        .expect("Sampling failed");

    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temporary_directory.path().join("frame.png");
    frame_image(&buffer, layout, 0)
        .expect("Failed to build image")
        .save(&path)
        .expect("Failed to save image");

    let reloaded = image::open(&path).expect("Failed to reload image").to_rgb8();
    assert_eq!(reloaded.as_raw(), &buffer);
}
