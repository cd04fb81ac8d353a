//! detection_filter - filter per-frame detections by label and confidence.
//!
//! This binary:
//! 1. Merges command-line flags with an optional config file
//! 2. Builds the filter policy
//! 3. Points the inference framework at its env file
//! 4. Replays recorded detections through the filter (when given)

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use detection_filter::config::{self, CliSettings, EffectiveSettings, FileConfig};
use detection_filter::labels::COMMON_LABELS_HELP;
use detection_filter::{run_replay, ReplaySource};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Filter object detections by label and confidence"
)]
struct Args {
    /// Path to a JSON or TOML config file. Its values override the flags below.
    #[arg(long, env = "DETECTION_CONFIG")]
    config: Option<PathBuf>,

    /// Labels to keep (e.g. --labels face 'cell phone' person).
    /// Aliases such as phone or people are accepted. Empty keeps every label.
    #[arg(long, num_args = 0.., env = "DETECTION_LABELS", value_delimiter = ',')]
    labels: Option<Vec<String>>,

    /// Minimum confidence threshold (0.0-1.0). Detections below it are dropped.
    #[arg(long, env = "DETECTION_MIN_CONFIDENCE", default_value_t = config::DEFAULT_MIN_CONFIDENCE)]
    min_confidence: f64,

    /// Show common detection labels and exit.
    #[arg(long)]
    list_common_labels: bool,

    /// Camera input. `usb` resolves to the USB camera device.
    #[arg(long, default_value = config::DEFAULT_INPUT)]
    input: String,

    /// Frame width.
    #[arg(long, default_value_t = config::DEFAULT_WIDTH)]
    width: u32,

    /// Frame height.
    #[arg(long, default_value_t = config::DEFAULT_HEIGHT)]
    height: u32,

    /// Frame rate.
    #[arg(long, default_value_t = config::DEFAULT_FRAMERATE)]
    framerate: u32,

    /// Recorded detections (JSON Lines, one frame per line) to replay; `-` for stdin.
    #[arg(long)]
    detections: Option<PathBuf>,
}

impl Args {
    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            input: self.input.clone(),
            width: self.width,
            height: self.height,
            framerate: self.framerate,
            labels: self.labels.clone(),
            min_confidence: self.min_confidence,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.list_common_labels {
        println!("{COMMON_LABELS_HELP}");
        return ExitCode::SUCCESS;
    }

    let file_cfg = match args.config.as_deref().map(FileConfig::load).transpose() {
        Ok(cfg) => cfg,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&args, file_cfg.as_ref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, file_cfg: Option<&FileConfig>) -> Result<()> {
    let settings = EffectiveSettings::resolve(args.cli_settings(), file_cfg);

    let env_file = config::env_file_path(&config::project_root());
    std::env::set_var(config::ENV_FILE_VAR, &env_file);
    log::debug!("{}={}", config::ENV_FILE_VAR, env_file.display());

    let policy = settings.policy()?;

    log::info!("starting detection filter");
    log::info!("  input: {}", settings.camera.input);
    log::info!(
        "  camera: {}x{} @ {} fps",
        settings.camera.width,
        settings.camera.height,
        settings.camera.framerate
    );
    log::info!("  confidence threshold: {}", settings.min_confidence);
    match &settings.labels {
        Some(labels) if !labels.is_empty() => {
            log::info!("  label filtering: yes, showing only {:?}", labels)
        }
        _ => log::info!("  label filtering: no"),
    }

    let Some(path) = &args.detections else {
        log::info!("no detections source given; nothing to replay");
        return Ok(());
    };

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || {
        handler_stop.store(true, Ordering::SeqCst);
    })
    .map_err(|e| anyhow!("error setting Ctrl-C handler: {}", e))?;

    let source = ReplaySource::open(path)?;
    let summary = run_replay(&policy, source, &stop)?;
    log::info!(
        "replay finished: frames={} skipped={} detections={} kept={} filtered={}",
        summary.frames,
        summary.skipped,
        summary.total,
        summary.kept,
        summary.filtered
    );
    Ok(())
}
