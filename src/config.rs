use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, PolicyError};
use crate::policy::FilterPolicy;

pub const DEFAULT_INPUT: &str = "usb";
pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;
pub const DEFAULT_FRAMERATE: u32 = 30;
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.0;

/// Device the `usb` input alias resolves to.
pub const USB_CAMERA_DEVICE: &str = "/dev/video8";

/// Environment variable pointing the downstream framework at its env file.
pub const ENV_FILE_VAR: &str = "HAILO_ENV_FILE";

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    detection: Option<DetectionConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectionConfigFile {
    camera: Option<CameraConfigFile>,
    labels: Option<Vec<String>>,
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    input: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    fps: Option<u32>,
}

/// A parsed config file. Only its recognized keys are kept.
#[derive(Debug, Default)]
pub struct FileConfig {
    file: ConfigFile,
}

impl FileConfig {
    /// Load a config file. `.toml` files are parsed as TOML, anything else as JSON.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let parsed: Result<ConfigFile, String> = if is_toml {
            toml::from_str(&raw).map_err(|e| e.to_string())
        } else {
            serde_json::from_str(&raw).map_err(|e| e.to_string())
        };
        let file = parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        log::info!("loaded config from {}", path.display());
        Ok(Self { file })
    }
}

/// Values taken from the command line, before any config file is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct CliSettings {
    pub input: String,
    pub width: u32,
    pub height: u32,
    pub framerate: u32,
    pub labels: Option<Vec<String>>,
    pub min_confidence: f64,
}

impl Default for CliSettings {
    fn default() -> Self {
        Self {
            input: DEFAULT_INPUT.to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            framerate: DEFAULT_FRAMERATE,
            labels: None,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraSettings {
    pub input: String,
    pub width: u32,
    pub height: u32,
    pub framerate: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveSettings {
    pub camera: CameraSettings,
    pub labels: Option<Vec<String>>,
    pub min_confidence: f64,
}

impl EffectiveSettings {
    /// Merge CLI values with an optional config file. File values win; keys
    /// the file leaves out keep their CLI value (not the fixed camera
    /// defaults, which only apply through the CLI defaults). A file label
    /// list only overrides when it is non-empty.
    pub fn resolve(cli: CliSettings, file: Option<&FileConfig>) -> Self {
        let detection = file.and_then(|f| f.file.detection.as_ref());
        let file_camera = detection.and_then(|d| d.camera.as_ref());

        let input = file_camera
            .and_then(|c| c.input.clone())
            .unwrap_or(cli.input);
        let camera = CameraSettings {
            input: resolve_input(&input),
            width: file_camera.and_then(|c| c.width).unwrap_or(cli.width),
            height: file_camera.and_then(|c| c.height).unwrap_or(cli.height),
            framerate: file_camera.and_then(|c| c.fps).unwrap_or(cli.framerate),
        };
        let labels = match detection.and_then(|d| d.labels.as_ref()) {
            Some(labels) if !labels.is_empty() => Some(labels.clone()),
            _ => cli.labels,
        };
        let min_confidence = detection
            .and_then(|d| d.confidence)
            .unwrap_or(cli.min_confidence);

        if file.is_some() {
            log::info!(
                "using config: input={}, labels={:?}, confidence={}",
                camera.input,
                labels,
                min_confidence
            );
        }

        Self {
            camera,
            labels,
            min_confidence,
        }
    }

    pub fn policy(&self) -> Result<FilterPolicy, PolicyError> {
        FilterPolicy::build(self.labels.as_deref(), Some(self.min_confidence))
    }
}

/// Resolve input aliases. Only `usb` is an alias.
pub fn resolve_input(input: &str) -> String {
    if input == "usb" {
        USB_CAMERA_DEVICE.to_string()
    } else {
        input.to_string()
    }
}

/// Project root: the parent of the directory holding the executable.
pub fn project_root() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent()?.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn env_file_path(project_root: &Path) -> PathBuf {
    project_root.join(".env")
}
