//! ONNX Runtime detector for YOLOv8-family models

use std::time::Instant;

use image::RgbImage;
use log::{debug, info};
use ndarray::{Array, IxDyn};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};

use crate::config::AppConfig;
use crate::error::{DetectionError, Result};
use crate::postprocess::Postprocessor;
use crate::types::DetectionResult;

/// Model input edge length; frames are resized to a square of this size
const INPUT_SIZE: u32 = 640;
/// NMS overlap threshold for duplicate suppression
const NMS_THRESHOLD: f32 = 0.45;

/// Common interface for object detectors, mainly a seam for stubbing
/// the model in tests of the frame-processing step.
pub trait Detect {
    /// Detect objects in a single frame
    fn detect(&mut self, frame: &RgbImage) -> Result<DetectionResult>;
}

/// YOLOv8 detector backed by an ONNX Runtime session.
/// The session is created once at startup and reused across all frames.
pub struct YoloDetector {
    session: Session,
    postprocessor: Postprocessor,
}

impl YoloDetector {
    /// Load the model from the configured path. Any load failure is fatal;
    /// there is no fallback model.
    pub fn new(config: &AppConfig) -> Result<Self> {
        info!("Loading detection model from {}", config.model_path.display());

        let session = Session::builder()
            .map_err(|e| DetectionError::model_load(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| DetectionError::model_load(e.to_string()))?
            .commit_from_file(&config.model_path)
            .map_err(|e| DetectionError::model_load(format!("Failed to load model: {}", e)))?;

        info!("Model loaded successfully.");

        Ok(Self {
            session,
            postprocessor: Postprocessor::new(
                config.confidence_threshold,
                NMS_THRESHOLD,
                (INPUT_SIZE, INPUT_SIZE),
            ),
        })
    }

    /// Resize to the model input size, normalize to [0, 1], CHW layout
    fn preprocess(&self, frame: &RgbImage) -> Array<f32, IxDyn> {
        use image::imageops::FilterType;

        let size = INPUT_SIZE as usize;
        let img = image::DynamicImage::ImageRgb8(frame.clone());
        let resized = img.resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
        let rgb = resized.to_rgb8();

        let mut input = Array::zeros((1, 3, size, size));
        for (x, y, pixel) in rgb.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }

        input.into_dyn()
    }
}

impl Detect for YoloDetector {
    fn detect(&mut self, frame: &RgbImage) -> Result<DetectionResult> {
        debug!("Running detection on {}x{} frame", frame.width(), frame.height());
        let started = Instant::now();

        let input_tensor = self.preprocess(frame);

        let tensor_ref = TensorRef::from_array_view(&input_tensor)
            .map_err(|e| DetectionError::inference(e.to_string()))?;

        let outputs = self
            .session
            .run(ort::inputs![tensor_ref])
            .map_err(|e| DetectionError::inference(e.to_string()))?;

        let output_array = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| DetectionError::postprocessing(e.to_string()))?
            .into_owned();

        // Release the borrow on the session before postprocessing
        drop(outputs);

        let detections = self.postprocessor.process(output_array.view())?;
        let inference_time_ms = started.elapsed().as_secs_f32() * 1000.0;

        debug!(
            "Detected {} objects in {:.1} ms",
            detections.len(),
            inference_time_ms
        );

        Ok(DetectionResult::new(
            detections,
            inference_time_ms,
            frame.width(),
            frame.height(),
        ))
    }
}
