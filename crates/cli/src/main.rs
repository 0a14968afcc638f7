use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use facefind_core::jobs::domain::run_result::{RunResult, RunStatus, StatusReport};
use facefind_core::jobs::domain::run_store::RunStore;
use facefind_core::jobs::infrastructure::in_memory_run_store::InMemoryRunStore;
use facefind_core::jobs::infrastructure::json_file_run_store::JsonFileRunStore;
use facefind_core::jobs::job_facade::{JobFacade, RunRequest};
use facefind_core::pipeline::find_appearances_use_case::{
    FindAppearancesUseCase, ScanProgressFn,
};
use facefind_core::pipeline::find_config::FindConfig;
use facefind_core::pipeline::find_error::FindError;
use facefind_core::pipeline::pipeline_logger::LogPipelineLogger;
use facefind_core::presence::domain::appearance_interval::{
    filter_min_duration, AppearanceInterval,
};
use facefind_core::recognition::infrastructure::onnx_face_encoder::OnnxFaceEncoder;
use facefind_core::shared::constants::{
    DEFAULT_CONFIDENCE, DEFAULT_STRIDE_MS, DEFAULT_TOLERANCE, DETECTION_MODEL, EMBEDDING_MODEL,
    IMAGE_EXTENSIONS, PROGRESS_EVERY_SAMPLES,
};
use facefind_core::shared::model_resolver::{self, ModelSpec};
use facefind_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use facefind_core::video::infrastructure::image_file_reader::ImageFileReader;

/// Find when a reference face appears in a video.
#[derive(Parser)]
#[command(name = "facefind", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a video for a reference face and print its appearance intervals.
    Scan(ScanArgs),
    /// Print the stored status of an earlier run as JSON.
    Status {
        /// Run id printed by `scan`.
        id: String,

        /// Directory holding run records.
        #[arg(long)]
        store: PathBuf,
    },
}

#[derive(Args)]
struct ScanArgs {
    /// Video to scan.
    video: PathBuf,

    /// Image containing the face to look for.
    face: PathBuf,

    /// Milliseconds between analyzed frames.
    #[arg(long, default_value_t = DEFAULT_STRIDE_MS)]
    stride_ms: u32,

    /// Maximum cosine distance counted as a match (0.0-1.0].
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    tolerance: f64,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// Drop appearances shorter than this many seconds.
    #[arg(long, default_value_t = 0.0)]
    min_duration: f64,

    /// Persist run records as JSON files in this directory.
    #[arg(long)]
    store: Option<PathBuf>,

    /// Directory to load and download models from.
    #[arg(long)]
    models: Option<PathBuf>,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Scan(args) => run_scan(args),
        Command::Status { id, store } => run_status(&id, &store),
    }
}

fn run_scan(args: ScanArgs) -> Result<(), Box<dyn std::error::Error>> {
    validate(&args)?;
    let config = FindConfig {
        stride_ms: args.stride_ms,
        tolerance: args.tolerance,
        confidence: args.confidence,
    };
    config.validate()?;

    let detection_model = resolve_model(DETECTION_MODEL, args.models.as_deref())?;
    let embedding_model = resolve_model(EMBEDDING_MODEL, args.models.as_deref())?;

    let store: Arc<dyn RunStore> = match &args.store {
        Some(dir) => {
            let store = JsonFileRunStore::open(dir)?;
            log::info!("Recording runs in {}", store.dir().display());
            Arc::new(store)
        }
        None => Arc::new(InMemoryRunStore::new()),
    };
    let min_duration = args.min_duration;
    let executor = move |request: &RunRequest| -> Result<Vec<AppearanceInterval>, FindError> {
        let encoder = OnnxFaceEncoder::from_models(
            &detection_model,
            &embedding_model,
            request.config.confidence,
        )
        .map_err(|e| FindError::Encoder(e.to_string()))?;
        let mut use_case = FindAppearancesUseCase::new(
            Box::new(FfmpegReader::new()),
            Box::new(ImageFileReader::new()),
            Box::new(encoder),
            Box::new(LogPipelineLogger::new(
                request.id.clone(),
                PROGRESS_EVERY_SAMPLES,
            )),
            Some(scan_progress()),
        );
        let intervals =
            use_case.execute(&request.video, &request.reference_image, &request.config)?;
        Ok(filter_min_duration(intervals, min_duration))
    };

    let facade = JobFacade::new(store, Arc::new(executor), 1);
    let ticket = facade.submit(args.video.clone(), args.face.clone(), config)?;
    let id = ticket.id().to_string();
    eprintln!("Run {id}");
    let result = ticket.wait();
    eprintln!();

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&StatusReport::new(&id, Some(result.clone())))?
        );
    }
    match result.status() {
        RunStatus::Done => {
            if !args.json {
                print_intervals(&result);
            }
            Ok(())
        }
        _ => Err(format!(
            "Run {id} failed: {}",
            result.error().unwrap_or("unknown error")
        )
        .into()),
    }
}

fn run_status(id: &str, store_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !store_dir.is_dir() {
        return Err(format!("Store directory not found: {}", store_dir.display()).into());
    }
    let store = JsonFileRunStore::open(store_dir)?;
    let report = StatusReport::new(id, store.get(id)?);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_intervals(result: &RunResult) {
    let intervals = result.appearances().unwrap_or_default();
    if intervals.is_empty() {
        println!("No appearances found");
        return;
    }
    for interval in intervals {
        println!(
            "{:>8.2}s - {:>8.2}s  ({:.2}s)",
            interval.start_seconds,
            interval.end_seconds,
            interval.duration_seconds()
        );
    }
}

fn scan_progress() -> ScanProgressFn {
    Box::new(|processed, expected| {
        match expected {
            Some(total) => eprint!("\rAnalyzed {processed}/{total} sampled frames"),
            None => eprint!("\rAnalyzed {processed} sampled frames"),
        }
        true
    })
}

fn resolve_model(
    spec: ModelSpec,
    dir: Option<&Path>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {}", spec.name);
    let name = spec.name;
    let progress: model_resolver::ProgressFn = Box::new(move |downloaded, total| {
        if total > 0 {
            let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
            eprint!("\rDownloading {name}... {pct}%");
        } else {
            eprint!("\rDownloading {name}... {downloaded} bytes");
        }
    });
    let path = match dir {
        Some(dir) => model_resolver::resolve_in(dir, spec, Some(progress))?,
        None => model_resolver::resolve(spec, Some(progress))?,
    };
    Ok(path)
}

fn validate(args: &ScanArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.video.exists() {
        return Err(format!("Video file not found: {}", args.video.display()).into());
    }
    if !args.face.exists() {
        return Err(format!("Face image not found: {}", args.face.display()).into());
    }
    if !is_image(&args.face) {
        return Err(format!(
            "Face must be an image ({}), got {}",
            IMAGE_EXTENSIONS.join(", "),
            args.face.display()
        )
        .into());
    }
    if args.min_duration < 0.0 {
        return Err(format!(
            "Minimum duration must not be negative, got {}",
            args.min_duration
        )
        .into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
