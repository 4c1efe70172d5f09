//! Conveyor Belt Defect Detection
//!
//! Runs a pretrained YOLOv8 model (exported to ONNX) over a single image,
//! a video file, or a live webcam feed, draws bounding boxes on each frame,
//! and displays/saves the result. Inference is delegated to ONNX Runtime,
//! capture and display to OpenCV.

pub mod annotate;
pub mod app;
pub mod capture;
pub mod cli;
pub mod config;
pub mod detector;
pub mod display;
pub mod error;
pub mod postprocess;
pub mod types;

pub use config::{AppConfig, Mode};
pub use detector::{Detect, YoloDetector};
pub use error::{DetectionError, Result};
pub use types::{BoundingBox, ClassLabels, Detection, DetectionResult, PixelBoundingBox};

/// Get library version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
