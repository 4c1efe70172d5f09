//! Startup configuration: argument validation and model path resolution

use std::path::{Path, PathBuf};

use crate::cli::Args;
use crate::error::{DetectionError, Result};

/// Model artifact expected next to the install directory
pub const MODEL_FILE: &str = "best.onnx";
/// Optional class-name table shipped alongside the model
pub const LABELS_FILE: &str = "labels.txt";

/// Input-source selection, evaluated once at startup.
/// Precedence is image > video > webcam.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Image(PathBuf),
    Video(PathBuf),
    Webcam,
}

/// Immutable configuration resolved once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub image: Option<PathBuf>,
    pub video: Option<PathBuf>,
    /// Minimum score a detection must meet to be kept (0-1]
    pub confidence_threshold: f32,
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
}

impl AppConfig {
    /// Resolve configuration from parsed arguments.
    ///
    /// The model file is located relative to the executable's install
    /// directory so the program behaves identically regardless of the
    /// caller's working directory. A missing model file is fatal.
    pub fn resolve(args: Args) -> Result<Self> {
        let model_dir = default_model_dir()?;
        Self::resolve_with_model_dir(args, &model_dir)
    }

    pub fn resolve_with_model_dir(args: Args, model_dir: &Path) -> Result<Self> {
        if !(args.conf > 0.0 && args.conf <= 1.0) {
            return Err(DetectionError::config(format!(
                "Confidence threshold must be in (0, 1], got {}",
                args.conf
            )));
        }

        let model_path = model_dir.join(MODEL_FILE);
        if !model_path.exists() {
            return Err(DetectionError::model_load(format!(
                "Model file not found at: {}",
                model_path.display()
            )));
        }

        Ok(Self {
            image: args.image,
            video: args.video,
            confidence_threshold: args.conf,
            model_path,
            labels_path: model_dir.join(LABELS_FILE),
        })
    }

    /// Select the processing mode. Pure branch, image wins over video,
    /// webcam is the default when neither path was supplied.
    pub fn mode(&self) -> Mode {
        if let Some(ref image) = self.image {
            Mode::Image(image.clone())
        } else if let Some(ref video) = self.video {
            Mode::Video(video.clone())
        } else {
            Mode::Webcam
        }
    }
}

/// Model directory relative to an install directory: `<exe-dir>/../models`
pub fn model_dir_for(exe_dir: &Path) -> PathBuf {
    exe_dir.join("..").join("models")
}

fn default_model_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let exe_dir = exe
        .parent()
        .ok_or_else(|| DetectionError::config("Executable has no parent directory"))?;
    Ok(model_dir_for(exe_dir))
}
