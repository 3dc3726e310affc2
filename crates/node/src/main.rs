use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use thermotrack_core::detection::infrastructure::model_resolver;
use thermotrack_core::detection::infrastructure::onnx_face_detector::OnnxFaceDetector;
use thermotrack_core::io::domain::messages::{ImageMessage, PolygonMessage, StatusMessage};
use thermotrack_core::io::domain::publisher::NodeOutputs;
use thermotrack_core::io::infrastructure::channel_bus;
use thermotrack_core::pipeline::config::CoordinatorConfig;
use thermotrack_core::pipeline::coordinator::TrackingCoordinator;
use thermotrack_core::shared::constants::{DEFAULT_CONFIDENCE, FACE_MODEL_NAME, FACE_MODEL_URL};
use thermotrack_core::shared::frame::ThermalFrame;
use thermotrack_core::tracking::infrastructure::template_tracker::TemplateTracker;

const FRAME_EXTENSIONS: &[&str] = &["png", "pgm", "tif", "tiff"];

/// Face detection and region tracking over a replayed thermal stream.
#[derive(Parser)]
#[command(name = "thermotrack")]
struct Cli {
    /// Directory of 16-bit grayscale frames, replayed in filename order.
    frames: PathBuf,

    /// Frame rate used to synthesize timestamps.
    #[arg(long, default_value = "8.0")]
    fps: f64,

    /// ONNX face model path (resolved from cache or downloaded when omitted).
    #[arg(long)]
    model: Option<PathBuf>,

    /// JSON coordinator config overriding the built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// Write debug overlay frames to this directory.
    #[arg(long)]
    debug_dir: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = match &cli.config {
        Some(path) => CoordinatorConfig::load(path)?,
        None => CoordinatorConfig::default(),
    };

    let model_path = resolve_model(&cli)?;
    let detector = OnnxFaceDetector::new(&model_path, cli.confidence)?;

    let (eye_pub, eye_rx) = channel_bus::topic::<PolygonMessage>();
    let (mouth_pub, mouth_rx) = channel_bus::topic::<PolygonMessage>();
    let (rescaled_pub, _rescaled_rx) = channel_bus::topic::<ImageMessage>();
    let (debug_pub, debug_rx) = channel_bus::topic::<ImageMessage>();
    let (status_pub, status_rx) = channel_bus::topic::<StatusMessage>();

    let outputs = NodeOutputs {
        eye_region: Box::new(eye_pub),
        mouth_region: Box::new(mouth_pub),
        rescaled_image: Box::new(rescaled_pub),
        debug_image: Box::new(debug_pub),
        status: Box::new(status_pub),
    };

    let mut coordinator = TrackingCoordinator::new(
        config,
        Box::new(detector),
        Box::new(TemplateTracker::default()),
        Box::new(TemplateTracker::default()),
        outputs,
    );

    if let Some(ref dir) = cli.debug_dir {
        std::fs::create_dir_all(dir)?;
    }

    let frame_paths = list_frames(&cli.frames)?;
    log::info!("replaying {} frames from {}", frame_paths.len(), cli.frames.display());

    let mut detected_frames = 0usize;
    let mut last_status = false;

    for (index, path) in frame_paths.iter().enumerate() {
        let frame = load_frame(path, index as f64 / cli.fps)?;
        coordinator.process_frame(&frame);

        while let Ok(status) = status_rx.try_recv() {
            if status.detected != last_status {
                log::info!(
                    "face {} at {:.3}s",
                    if status.detected { "acquired" } else { "lost" },
                    status.stamp
                );
                last_status = status.detected;
            }
            if status.detected {
                detected_frames += 1;
            }
        }

        while let Ok(eye) = eye_rx.try_recv() {
            let mouth = mouth_rx.try_recv();
            log::debug!("eye region {:?}, mouth region {:?}", eye.points, mouth.map(|m| m.points));
        }

        while let Ok(debug) = debug_rx.try_recv() {
            if let Some(ref dir) = cli.debug_dir {
                save_debug_frame(dir, index, &debug)?;
            }
        }
    }

    log::info!(
        "done: {}/{} frames with a face lock",
        detected_frames,
        frame_paths.len()
    );
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.frames.is_dir() {
        return Err(format!("{} is not a directory", cli.frames.display()).into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err("confidence must be between 0.0 and 1.0".into());
    }
    if cli.fps <= 0.0 {
        return Err("fps must be positive".into());
    }
    Ok(())
}

fn resolve_model(cli: &Cli) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(ref path) = cli.model {
        if !path.exists() {
            return Err(format!("model file {} does not exist", path.display()).into());
        }
        return Ok(path.clone());
    }
    let path = model_resolver::resolve(
        FACE_MODEL_NAME,
        FACE_MODEL_URL,
        None,
        Some(Box::new(|done, total| {
            if total > 0 {
                log::info!("downloading model: {}%", done * 100 / total);
            }
        })),
    )?;
    Ok(path)
}

fn list_frames(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| FRAME_EXTENSIONS.contains(&e.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    if paths.is_empty() {
        return Err(format!("no frames found in {}", dir.display()).into());
    }
    paths.sort();
    Ok(paths)
}

fn load_frame(path: &Path, stamp: f64) -> Result<ThermalFrame, Box<dyn std::error::Error>> {
    let image = image::open(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?
        .to_luma16();
    let (width, height) = image.dimensions();
    Ok(ThermalFrame::new(image.into_raw(), width, height, stamp))
}

fn save_debug_frame(
    dir: &Path,
    index: usize,
    msg: &ImageMessage,
) -> Result<(), Box<dyn std::error::Error>> {
    let image = image::GrayImage::from_raw(msg.width, msg.height, msg.data.clone())
        .ok_or("debug image buffer does not match its dimensions")?;
    image.save(dir.join(format!("{index:06}.png")))?;
    Ok(())
}
