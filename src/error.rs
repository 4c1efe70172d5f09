//! Error types for the defect detection pipeline

use thiserror::Error;

/// Result type alias for the detection pipeline
pub type Result<T> = std::result::Result<T, DetectionError>;

/// Errors that can occur during startup and frame processing
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Model loading failed: {0}")]
    ModelLoadError(String),

    #[error("Failed to open input source: {0}")]
    SourceOpenError(String),

    #[error("Frame capture failed: {0}")]
    CaptureError(String),

    #[error("Image decoding failed: {0}")]
    DecodeError(String),

    #[error("Image preprocessing failed: {0}")]
    PreprocessingError(String),

    #[error("Inference failed: {0}")]
    InferenceError(String),

    #[error("Postprocessing failed: {0}")]
    PostprocessingError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("OpenCV error: {0}")]
    OpenCvError(#[from] opencv::Error),
}

impl DetectionError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn model_load<S: Into<String>>(msg: S) -> Self {
        Self::ModelLoadError(msg.into())
    }

    pub fn source_open<S: Into<String>>(msg: S) -> Self {
        Self::SourceOpenError(msg.into())
    }

    pub fn capture<S: Into<String>>(msg: S) -> Self {
        Self::CaptureError(msg.into())
    }

    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::DecodeError(msg.into())
    }

    pub fn preprocessing<S: Into<String>>(msg: S) -> Self {
        Self::PreprocessingError(msg.into())
    }

    pub fn inference<S: Into<String>>(msg: S) -> Self {
        Self::InferenceError(msg.into())
    }

    pub fn postprocessing<S: Into<String>>(msg: S) -> Self {
        Self::PostprocessingError(msg.into())
    }
}
