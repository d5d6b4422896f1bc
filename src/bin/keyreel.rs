use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use keyreel::{
    AssemblyAiClient, BrandContext, ContentPipeline, ContentRecord, ContentTone, DecodeOptions,
    FfmpegLogLevel, Fingerprint, GeminiClient, GenerationRequest, PollOptions, PollingTranscriber,
    ProcessingOptions, ProgressCallback, ProgressInfo, ResultCache, SelectionPolicy, TrackedSource,
    Transcriber, VideoDecoder, gemini, select,
};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  keyreel select input.mp4 --out frames --max-frames 8\n  keyreel select input.mp4 --out frames --policy stride --interval 30 --json\n  keyreel generate input.mp4 --tone humorous --brand Acme --platform Instagram\n  keyreel fingerprint input.mp4\n  keyreel transcribe input.mp4 --out transcript.txt\n  keyreel completions zsh > _keyreel";

const API_KEY_VARIABLE: &str = "ASSEMBLYAI_API_KEY";
const GEMINI_KEY_VARIABLE: &str = "GEMINI_API_KEY";

#[derive(Debug, Parser)]
#[command(
    name = "keyreel",
    version,
    about = "Select key frames from video, transcribe uploads, and generate copy",
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
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar where supported.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Args, Clone)]
struct SelectionArgs {
    /// Selection policy: change | stride | gated.
    #[arg(long, default_value = "change")]
    policy: String,
    /// Sampling stride in frames (stride policy).
    #[arg(long, default_value_t = 30)]
    interval: u64,
    /// Advisory sensitivity reported with change-ranked results.
    #[arg(long, default_value_t = 25)]
    sensitivity: u32,
    /// Minimum change magnitude (gated policy).
    #[arg(long, default_value_t = 10.0)]
    min_magnitude: f64,
    /// Maximum number of frames to keep.
    #[arg(long, default_value_t = 8)]
    max_frames: usize,
}

impl SelectionArgs {
    fn policy(&self) -> Result<SelectionPolicy, String> {
        parse_policy(
            &self.policy,
            self.interval,
            self.sensitivity,
            self.min_magnitude,
        )
        .ok_or(format!("unsupported --policy: {}", self.policy))
    }
}

#[derive(Debug, Args, Clone, Default)]
struct BrandArgs {
    /// Brand or company name.
    #[arg(long)]
    brand: Option<String>,
    /// Industry, e.g. Technology.
    #[arg(long)]
    industry: Option<String>,
    /// Target audience description.
    #[arg(long)]
    audience: Option<String>,
    /// Brand voice description.
    #[arg(long)]
    voice: Option<String>,
    /// Campaign name.
    #[arg(long)]
    campaign: Option<String>,
    /// Primary goal, e.g. "Brand Awareness".
    #[arg(long)]
    goal: Option<String>,
    /// Target platform; repeat for several.
    #[arg(long = "platform")]
    platforms: Vec<String>,
    /// Additional instructions for the copy.
    #[arg(long)]
    instructions: Option<String>,
    /// Content category, e.g. "Product Demonstration".
    #[arg(long)]
    category: Option<String>,
}

impl BrandArgs {
    fn into_context(self) -> BrandContext {
        BrandContext {
            brand: self.brand.unwrap_or_default(),
            industry: self.industry.unwrap_or_default(),
            audience: self.audience.unwrap_or_default(),
            voice: self.voice.unwrap_or_default(),
            campaign: self.campaign.unwrap_or_default(),
            goal: self.goal.unwrap_or_default(),
            platforms: self.platforms,
            instructions: self.instructions.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Select key frames and write them to a directory.
    #[command(
        about = "Select key frames",
        after_help = "Examples:\n  keyreel select input.mp4 --out frames\n  keyreel select input.mp4 --out frames --policy gated --min-magnitude 12.5"
    )]
    Select {
        /// Input video path.
        input: String,
        /// Output directory for the selected frames.
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        selection: SelectionArgs,
        /// Output image extension (png, jpg, jpeg, bmp, tiff).
        #[arg(long, default_value = "jpg")]
        ext: String,
        /// Print the selection as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate marketing copy from key frames and the transcript.
    #[command(
        about = "Generate marketing copy",
        after_help = "Examples:\n  GEMINI_API_KEY=... keyreel generate launch.mp4 --tone inspirational --brand Acme\n  keyreel generate a.mp4 b.mp4 --campaign \"Summer Launch\" --platform Instagram --platform TikTok --json\n  keyreel generate launch.mp4 --frames 0,2 --no-cache --out launch.json"
    )]
    Generate {
        /// Input video paths, processed in order through one result cache.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Content tone: professional, casual, humorous, inspirational, authoritative, informative.
        #[arg(long, default_value = "professional")]
        tone: String,
        #[command(flatten)]
        brand: BrandArgs,
        #[command(flatten)]
        selection: SelectionArgs,
        /// Indices of selected frames to show the generator (comma separated).
        #[arg(long, value_delimiter = ',')]
        frames: Vec<usize>,
        /// Neither read nor fill the result cache.
        #[arg(long)]
        no_cache: bool,
        /// Gemini API key; defaults to $GEMINI_API_KEY.
        #[arg(long)]
        gemini_key: Option<String>,
        /// Gemini model name.
        #[arg(long, default_value = gemini::DEFAULT_MODEL)]
        model: String,
        /// Transcription API key; defaults to $ASSEMBLYAI_API_KEY. Without
        /// one, copy is generated from the frames alone.
        #[arg(long)]
        assemblyai_key: Option<String>,
        /// Print the content records as JSON.
        #[arg(long)]
        json: bool,
        /// Write the content records as JSON to a file.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the content fingerprint used as a cache key.
    #[command(about = "Print content fingerprint")]
    Fingerprint {
        /// Input file path.
        input: PathBuf,
    },

    /// Transcribe a file through the hosted transcription service.
    #[command(
        about = "Transcribe audio",
        after_help = "Examples:\n  ASSEMBLYAI_API_KEY=... keyreel transcribe talk.wav\n  keyreel transcribe talk.mp4 --api-key KEY --poll-interval 2 --timeout 600 --out talk.txt"
    )]
    Transcribe {
        /// Input audio or video path.
        input: PathBuf,
        /// API key; defaults to $ASSEMBLYAI_API_KEY.
        #[arg(long)]
        api_key: Option<String>,
        /// Seconds between status checks.
        #[arg(long, default_value_t = 5)]
        poll_interval: u64,
        /// Seconds before giving up.
        #[arg(long, default_value_t = 300)]
        timeout: u64,
        /// Write the transcript to a file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

fn parse_policy(
    name: &str,
    interval: u64,
    sensitivity: u32,
    min_magnitude: f64,
) -> Option<SelectionPolicy> {
    match name.trim().to_ascii_lowercase().as_str() {
        "change" | "scene" | "ranked" => Some(SelectionPolicy::ChangeRanked { sensitivity }),
        "stride" | "interval" => Some(SelectionPolicy::FixedStride { interval }),
        "gated" => Some(SelectionPolicy::ChangeGated { min_magnitude }),
        _ => None,
    }
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !overwrite {
        return Err(format!(
            "{} already exists (pass --overwrite to replace it)",
            path.display()
        )
        .into());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn ensure_empty_directory(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !overwrite && fs::read_dir(path)?.next().is_some() {
        return Err(format!(
            "{} is not empty (pass --overwrite to write into it)",
            path.display()
        )
        .into());
    }
    Ok(())
}

fn api_key(explicit: Option<String>, variable: &str) -> Option<String> {
    explicit
        .or_else(|| std::env::var(variable).ok())
        .filter(|key| !key.trim().is_empty())
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed =
            FfmpegLogLevel::parse(level).ok_or(format!("unsupported --log-level: {level}"))?;
        keyreel::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

fn records_json(records: &[ContentRecord]) -> Result<String, Box<dyn std::error::Error>> {
    match records {
        [record] => Ok(record.to_json()?),
        _ => Ok(serde_json::to_string_pretty(records)?),
    }
}

struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new(total: Option<u64>) -> Self {
        let bar = match total {
            Some(total) => ProgressBar::new(total),
            None => ProgressBar::new_spinner(),
        };
        if let Ok(style) =
            ProgressStyle::with_template("{spinner} {msg} [{bar:40}] {pos}/{len} ({eta})")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        Self { bar }
    }
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_position(info.current);
        if let Some(total) = info.total {
            self.bar.set_length(total.max(info.current));
        }
        self.bar.set_message(format!("{:?}", info.operation));
    }
}

#[derive(Default)]
struct TerminalProgress;

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        match (info.total, info.current_timestamp) {
            (Some(total), _) => {
                eprintln!("{} {}/{}", "progress".cyan().bold(), info.current, total)
            }
            (None, Some(elapsed)) => eprintln!(
                "{} poll {} ({:.1}s elapsed)",
                "progress".cyan().bold(),
                info.current,
                elapsed.as_secs_f64()
            ),
            (None, None) => {}
        }
    }
}

fn poll_options(global: &GlobalOptions, interval: u64, timeout: u64) -> PollOptions {
    let options = PollOptions::new()
        .with_interval(Duration::from_secs(interval.max(1)))
        .with_timeout(Duration::from_secs(timeout));
    if global.progress || global.verbose {
        options.with_progress(Arc::new(TerminalProgress))
    } else {
        options
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Select {
            input,
            out,
            selection,
            ext,
            json,
        } => {
            let policy = selection.policy()?;
            let max_frames = selection.max_frames;
            ensure_empty_directory(&out, cli.global.overwrite)?;

            let bar = cli.global.progress.then(|| Arc::new(BarProgress::new(None)));
            let mut options = DecodeOptions::new().with_batch_size(10);
            if let Some(bar) = &bar {
                options = options.with_progress(Arc::clone(bar) as Arc<dyn ProgressCallback>);
            }

            let decoder = VideoDecoder::open(&input, &options)?;
            let metadata = decoder.metadata().clone();
            if cli.global.verbose {
                eprintln!(
                    "{} {}x{} @ {:.2} fps, ~{} frames ({})",
                    "video".green().bold(),
                    metadata.width,
                    metadata.height,
                    metadata.frames_per_second,
                    metadata.frame_count,
                    metadata.codec
                );
            }

            let frames = select(TrackedSource::new(decoder, &options), &policy, max_frames)?;
            if let Some(bar) = &bar {
                bar.bar.finish_and_clear();
            }

            let paths = keyreel::save_frames(&frames, &out, &ext)?;

            if json {
                let payload = json!({
                    "input": input,
                    "policy": format!("{policy:?}"),
                    "max_frames": max_frames,
                    "frames": frames.iter().zip(&paths).map(|(frame, path)| json!({
                        "ordinal": frame.ordinal(),
                        "timestamp_seconds": frame.timestamp(metadata.frames_per_second).as_secs_f64(),
                        "path": path.display().to_string(),
                    })).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for (frame, path) in frames.iter().zip(&paths) {
                    println!(
                        "{:>6}  {:>9.3}s  {}",
                        frame.ordinal(),
                        frame.timestamp(metadata.frames_per_second).as_secs_f64(),
                        path.display()
                    );
                }
                if cli.global.verbose {
                    eprintln!(
                        "{} {} of at most {} frames",
                        "selected".green().bold(),
                        frames.len(),
                        max_frames
                    );
                }
            }
        }
        Commands::Generate {
            inputs,
            tone,
            brand,
            selection,
            frames,
            no_cache,
            gemini_key,
            model,
            assemblyai_key,
            json,
            out,
        } => {
            let tone: ContentTone = tone.parse()?;
            let processing = ProcessingOptions::new()
                .with_policy(selection.policy()?)
                .with_max_frames(selection.max_frames)
                .with_cache(!no_cache);
            if let Some(path) = &out {
                ensure_writable_path(path, cli.global.overwrite)?;
            }

            let gemini_key = api_key(gemini_key, GEMINI_KEY_VARIABLE)
                .ok_or(format!("pass --gemini-key or set {GEMINI_KEY_VARIABLE}"))?;
            let generator = GeminiClient::new(gemini_key)?.with_model(model);
            let transcriber = match api_key(assemblyai_key, API_KEY_VARIABLE) {
                Some(key) => Some(PollingTranscriber::new(
                    AssemblyAiClient::new(key)?,
                    poll_options(&cli.global, 5, 300),
                )),
                None => {
                    if cli.global.verbose {
                        eprintln!(
                            "{} no {API_KEY_VARIABLE}; generating from frames only",
                            "note".yellow().bold()
                        );
                    }
                    None
                }
            };

            let cache = ResultCache::new();
            let pipeline = ContentPipeline::new(&cache, transcriber, generator, processing);
            let request = GenerationRequest::new(tone)
                .with_brand(brand.into_context())
                .with_selected(frames);

            let mut records = Vec::with_capacity(inputs.len());
            for input in &inputs {
                let upload = fs::read(input)?;
                let bar = cli.global.progress.then(|| Arc::new(BarProgress::new(None)));
                let mut options = DecodeOptions::new().with_batch_size(10);
                if let Some(bar) = &bar {
                    options = options.with_progress(Arc::clone(bar) as Arc<dyn ProgressCallback>);
                }

                let outcome = pipeline.run(&upload, &request, || {
                    VideoDecoder::open_tracked(input, &options)
                })?;
                if let Some(bar) = &bar {
                    bar.bar.finish_and_clear();
                }
                if cli.global.verbose {
                    let state = if outcome.from_cache { "cached" } else { "generated" };
                    eprintln!(
                        "{} {} ({}, {} frames)",
                        state.green().bold(),
                        input.display(),
                        outcome.fingerprint,
                        outcome.entry.frames().len()
                    );
                }

                let record = ContentRecord::new(&outcome, &request);
                if !json {
                    if inputs.len() > 1 {
                        println!("{}", format!("== {} ==", input.display()).bold());
                    }
                    println!("{}", record.content);
                }
                records.push(record);
            }

            if json {
                println!("{}", records_json(&records)?);
            }
            if let Some(path) = &out {
                fs::write(path, records_json(&records)?)?;
                if cli.global.verbose {
                    eprintln!("{} {}", "wrote".green().bold(), path.display());
                }
            }
        }
        Commands::Fingerprint { input } => {
            let file = fs::File::open(&input)?;
            let fingerprint = Fingerprint::from_reader(file)?;
            println!("{fingerprint}  {}", input.display());
        }
        Commands::Transcribe {
            input,
            api_key: key,
            poll_interval,
            timeout,
            out,
        } => {
            let key = api_key(key, API_KEY_VARIABLE)
                .ok_or(format!("pass --api-key or set {API_KEY_VARIABLE}"))?;
            if let Some(path) = &out {
                ensure_writable_path(path, cli.global.overwrite)?;
            }

            let audio = fs::read(&input)?;
            let transcriber = PollingTranscriber::new(
                AssemblyAiClient::new(key)?,
                poll_options(&cli.global, poll_interval, timeout),
            );
            let text = transcriber.transcribe(&audio)?;

            match out {
                Some(path) => {
                    fs::write(&path, &text)?;
                    if cli.global.verbose {
                        eprintln!("{} {}", "wrote".green().bold(), path.display());
                    }
                }
                None => println!("{text}"),
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "keyreel", &mut std::io::stdout());
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
