use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use framesampler::{
    FfmpegLogLevel, FrameLayout, IndexMode, KeyframeSeekPlanner, SampleReport, SamplingOptions,
    ScalingAlgorithm, VideoStreamContext, frame_image,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  framesampler metadata input.mp4 --json\n  framesampler sample input.mp4 --targets 0,15,30,45 --seek --png-dir frames\n  framesampler clip input.mp4 --count 16 --seed 7 --raw-out clip.rgb\n  framesampler completions zsh > _framesampler";

#[derive(Debug, Parser)]
#[command(
    name = "framesampler",
    version,
    about = "Sample video frames into packed RGB24 buffers",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional output.
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar while writing images.
    #[arg(long)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long)]
    overwrite: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Clone, Default, clap::Args)]
struct OutputOptions {
    /// Write the packed RGB24 buffer to this file.
    #[arg(long)]
    raw_out: Option<PathBuf>,

    /// Write each sampled frame as a PNG into this directory.
    #[arg(long)]
    png_dir: Option<PathBuf>,

    /// Scaling algorithm (bilinear, fast-bilinear, bicubic, point, area).
    #[arg(long, default_value = "bilinear")]
    scaling: String,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print metadata for the video stream.
    #[command(
        about = "Print video stream metadata",
        visible_alias = "probe",
        after_help = "Examples:\n  framesampler metadata input.mp4\n  framesampler metadata input.mp4 --json"
    )]
    Metadata {
        /// Input video path.
        input: PathBuf,

        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Sample specific frames, or the first N frames.
    #[command(
        about = "Sample frames by index",
        after_help = "Examples:\n  framesampler sample input.mp4 --count 8 --raw-out frames.rgb\n  framesampler sample input.mp4 --targets 5,5,6,20 --png-dir frames\n  framesampler sample input.mp4 --targets 2,4 --seek --index-model timebase"
    )]
    Sample {
        /// Input video path.
        input: PathBuf,
        /// Number of frames to sample. Defaults to the number of targets.
        #[arg(long)]
        count: Option<usize>,
        /// Comma-separated, non-decreasing target frames.
        #[arg(long)]
        targets: Option<String>,
        /// Seek near the first target before decoding.
        #[arg(long)]
        seek: bool,
        /// Index model: frame (average duration) or timebase (seconds).
        #[arg(long, default_value = "frame")]
        index_model: String,
        #[command(flatten)]
        output: OutputOptions,
    },

    /// Sample consecutive frames from a random position.
    #[command(
        about = "Sample a random clip",
        after_help = "Examples:\n  framesampler clip input.mp4 --count 16\n  framesampler clip input.mp4 --count 16 --seed 7 --png-dir clip"
    )]
    Clip {
        /// Input video path.
        input: PathBuf,
        /// Number of consecutive frames.
        #[arg(long)]
        count: usize,
        /// Seed for the seek position. Random when omitted.
        #[arg(long)]
        seed: Option<u64>,
        #[command(flatten)]
        output: OutputOptions,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_targets(value: &str) -> Result<Vec<u64>, String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u64>()
                .map_err(|_| format!("invalid target frame: {part}"))
        })
        .collect()
}

fn parse_index_mode(value: &str) -> Option<IndexMode> {
    match value.to_ascii_lowercase().as_str() {
        "frame" | "frames" | "average" => Some(IndexMode::AverageDuration),
        "timebase" | "raw" | "seconds" => Some(IndexMode::RawTimebase),
        _ => None,
    }
}

fn parse_scaling(value: &str) -> Option<ScalingAlgorithm> {
    match value.to_ascii_lowercase().as_str() {
        "bilinear" => Some(ScalingAlgorithm::Bilinear),
        "fast-bilinear" | "fast_bilinear" => Some(ScalingAlgorithm::FastBilinear),
        "bicubic" => Some(ScalingAlgorithm::Bicubic),
        "point" | "nearest" => Some(ScalingAlgorithm::Point),
        "area" => Some(ScalingAlgorithm::Area),
        _ => None,
    }
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

/// Reject existing outputs before any decoding starts.
fn check_outputs(
    output: &OutputOptions,
    overwrite: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &output.raw_out {
        ensure_writable_path(path, overwrite)?;
    }
    if let Some(directory) = &output.png_dir
        && directory.exists()
        && !overwrite
    {
        return Err(format!(
            "output directory already exists: {} (use --overwrite)",
            directory.display()
        )
        .into());
    }
    Ok(())
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        framesampler::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

fn open_from_memory(input: &Path) -> Result<VideoStreamContext, Box<dyn std::error::Error>> {
    let bytes = fs::read(input).map_err(|error| format!("{}: {error}", input.display()))?;
    Ok(VideoStreamContext::from_bytes(bytes)?)
}

fn print_report(report: &SampleReport, layout: FrameLayout, verbose: bool) {
    println!(
        "{} {} frames ({}x{}, {} bytes)",
        "sampled".green().bold(),
        report.decoded_frames + report.padded_frames,
        layout.width,
        layout.height,
        report.bytes_written,
    );
    if report.padded_frames > 0 {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!(
                "stream ended early; {} trailing frames repeat earlier ones",
                report.padded_frames
            )
            .yellow()
        );
    }
    if verbose {
        println!("Decoded: {}", report.decoded_frames);
        println!("Padded: {}", report.padded_frames);
        if let Some(plan) = report.seek {
            match plan.target_frame {
                Some(frame) => println!(
                    "Seek: frame {frame} ({:.3}s)",
                    plan.seek_distance_seconds
                ),
                None => println!("Seek: none (started at the first frame)"),
            }
        }
    }
}

fn write_outputs(
    buffer: &[u8],
    layout: FrameLayout,
    frame_count: usize,
    output: &OutputOptions,
    global: &GlobalOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &output.raw_out {
        fs::write(path, buffer)?;
        if global.verbose {
            println!("Wrote {}", path.display());
        }
    }

    if let Some(directory) = &output.png_dir {
        fs::create_dir_all(directory)?;

        let progress_bar = if global.progress {
            let bar = ProgressBar::new(frame_count as u64);
            let style =
                ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
            bar.set_style(style.progress_chars("##-"));
            Some(bar)
        } else {
            None
        };

        for index in 0..frame_count {
            let path = directory.join(format!("frame_{index:04}.png"));
            frame_image(buffer, layout, index)?.save(&path)?;
            if let Some(bar) = &progress_bar {
                bar.inc(1);
            }
            if global.verbose {
                println!("Saved {}", path.display());
            }
        }

        if let Some(bar) = progress_bar {
            bar.finish_with_message("done");
        }
    }

    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Metadata { input, json } => {
            let stream = VideoStreamContext::open(&input)?;
            let metadata = stream.metadata();
            if json {
                let payload = json!({
                    "width": metadata.width,
                    "height": metadata.height,
                    "codec": metadata.codec,
                    "fps": metadata.frames_per_second,
                    "frame_count": metadata.frame_count,
                    "duration": metadata.duration,
                    "duration_seconds": metadata.duration_seconds(),
                    "start_time": metadata.start_time,
                    "time_base": {
                        "num": metadata.time_base.numerator(),
                        "den": metadata.time_base.denominator(),
                    },
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!(
                    "Video: {}x{} @ {:.2} fps [{}]",
                    metadata.width, metadata.height, metadata.frames_per_second, metadata.codec,
                );
                println!(
                    "Duration: {:.3}s ({} ticks)",
                    metadata.duration_seconds(),
                    metadata.duration
                );
                println!("Frames: {}", metadata.frame_count);
                println!("Time base: {}", metadata.time_base);
                println!("Start time: {}", metadata.start_time);
            }
        }
        Commands::Sample {
            input,
            count,
            targets,
            seek,
            index_model,
            output,
        } => {
            let index_mode = parse_index_mode(&index_model)
                .ok_or(format!("unsupported --index-model: {index_model}"))?;
            let scaling = parse_scaling(&output.scaling)
                .ok_or(format!("unsupported --scaling: {}", output.scaling))?;
            let targets = targets.as_deref().map(parse_targets).transpose()?;

            let frame_count = match (&targets, count) {
                (Some(targets), Some(count)) if targets.len() != count => {
                    return Err(format!(
                        "--count {count} does not match {} targets",
                        targets.len()
                    )
                    .into());
                }
                (Some(targets), _) => targets.len(),
                (None, Some(count)) => count,
                (None, None) => return Err("either --count or --targets is required".into()),
            };
            if frame_count == 0 {
                return Err("nothing to sample".into());
            }
            if seek && targets.is_none() {
                return Err("--seek requires --targets".into());
            }
            check_outputs(&output, cli.global.overwrite)?;

            let mut stream = open_from_memory(&input)?;
            let layout = stream.layout();
            let mut buffer = vec![0u8; layout.buffer_len(frame_count)];

            let report = match &targets {
                Some(targets) => {
                    let options = SamplingOptions::new()
                        .with_seek(seek)
                        .with_index_mode(index_mode)
                        .with_scaling(scaling);
                    stream.sample_frames(&mut buffer, targets, &options)?
                }
                None => stream.sample_sequential(&mut buffer, frame_count, scaling)?,
            };

            print_report(&report, layout, cli.global.verbose);
            write_outputs(&buffer, layout, frame_count, &output, &cli.global)?;
        }
        Commands::Clip {
            input,
            count,
            seed,
            output,
        } => {
            if count == 0 {
                return Err("--count must be greater than 0".into());
            }
            let scaling = parse_scaling(&output.scaling)
                .ok_or(format!("unsupported --scaling: {}", output.scaling))?;

            let mut planner = match seed {
                Some(seed) => KeyframeSeekPlanner::with_seed(seed),
                None => KeyframeSeekPlanner::from_entropy(),
            };
            check_outputs(&output, cli.global.overwrite)?;

            let mut stream = open_from_memory(&input)?;
            let layout = stream.layout();
            let mut buffer = vec![0u8; layout.buffer_len(count)];
            let report = stream.sample_random_clip(&mut buffer, count, &mut planner, scaling)?;

            print_report(&report, layout, cli.global.verbose);
            write_outputs(&buffer, layout, count, &output, &cli.global)?;
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framesampler", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
