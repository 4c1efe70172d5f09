//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;

/// Conveyor belt defect detection using a YOLOv8 ONNX model
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to input image
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Path to input video
    #[arg(long)]
    pub video: Option<PathBuf>,

    /// Confidence threshold (default=0.5)
    #[arg(long, default_value_t = 0.5)]
    pub conf: f32,
}
