//! Mode orchestration: image, video, and webcam processing loops

use std::path::Path;
use std::time::Instant;

use log::info;
use opencv::{
    core::{Mat, Vector},
    imgcodecs,
    prelude::*,
};

use crate::annotate::{annotate_frame, instantaneous_fps, overlay_fps};
use crate::capture::{mat_to_rgb_image, FrameRead, FrameSource};
use crate::config::{AppConfig, Mode};
use crate::detector::{Detect, YoloDetector};
use crate::display;
use crate::error::{DetectionError, Result};
use crate::types::ClassLabels;

/// Fixed output location for image mode, relative to the working directory
pub const OUTPUT_IMAGE_PATH: &str = "../outputs/result_image.jpg";

/// Default camera device for webcam mode
const CAMERA_INDEX: i32 = 0;

/// Load the model once, then branch into the selected mode
pub fn run(config: AppConfig) -> Result<()> {
    let labels = ClassLabels::load(&config.labels_path)?;
    let mut detector = YoloDetector::new(&config)?;

    match config.mode() {
        Mode::Image(path) => run_image(&mut detector, &labels, &path),
        Mode::Video(path) => run_video(&mut detector, &labels, &path),
        Mode::Webcam => run_webcam(&mut detector, &labels),
    }
}

/// Shared inference+annotate step: run the detector on one frame and
/// render the detections onto a copy of it
fn detect_and_annotate<D: Detect>(
    detector: &mut D,
    labels: &ClassLabels,
    frame: &Mat,
) -> Result<Mat> {
    let rgb = mat_to_rgb_image(frame)?;
    let result = detector.detect(&rgb)?;
    annotate_frame(frame, &result, labels)
}

fn run_image<D: Detect>(detector: &mut D, labels: &ClassLabels, path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(DetectionError::config(format!(
            "Image file not found: {}",
            path.display()
        )));
    }

    let path_str = path
        .to_str()
        .ok_or_else(|| DetectionError::config("Invalid image path"))?;
    let frame = imgcodecs::imread(path_str, imgcodecs::IMREAD_COLOR)?;
    if frame.empty() {
        // imread reports a corrupt file as an empty Mat, not an error
        return Err(DetectionError::decode(format!(
            "Failed to decode image: {}",
            path.display()
        )));
    }

    let annotated = detect_and_annotate(detector, labels, &frame)?;

    save_image(OUTPUT_IMAGE_PATH, &annotated)?;
    info!("Detection complete. Output saved at {}", OUTPUT_IMAGE_PATH);

    display::show(display::IMAGE_WINDOW, &annotated)?;
    display::wait_for_any_key()?;
    display::close_all()
}

fn run_video<D: Detect>(detector: &mut D, labels: &ClassLabels, path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(DetectionError::config(format!(
            "Video file not found: {}",
            path.display()
        )));
    }

    let source = FrameSource::open_file(path)?;
    run_detection_loop(detector, labels, source, display::VIDEO_WINDOW)
}

fn run_webcam<D: Detect>(detector: &mut D, labels: &ClassLabels) -> Result<()> {
    info!("Starting webcam detection. Press 'q' to exit.");

    let source = FrameSource::open_camera(CAMERA_INDEX)?;
    run_detection_loop(detector, labels, source, display::WEBCAM_WINDOW)
}

/// Frame loop shared by video and webcam modes. The capture handle is
/// released on every exit path, including errors.
fn run_detection_loop<D: Detect>(
    detector: &mut D,
    labels: &ClassLabels,
    mut source: FrameSource,
    window: &str,
) -> Result<()> {
    let outcome = process_frames(detector, labels, &mut source, |annotated| {
        display::show(window, annotated)?;
        Ok(!display::quit_requested()?)
    });

    drop(source);
    display::close_all()?;
    outcome
}

/// Core of the frame loop, one inference+annotate cycle per readable frame.
///
/// Each iteration reads one frame, runs the inference+annotate step,
/// overlays the iteration's instantaneous FPS, and hands the result to
/// `present`. The loop ends on stream exhaustion, device read failure, or
/// `present` returning `Ok(false)`.
fn process_frames<D: Detect, S: FrameRead>(
    detector: &mut D,
    labels: &ClassLabels,
    source: &mut S,
    mut present: impl FnMut(&Mat) -> Result<bool>,
) -> Result<()> {
    loop {
        let started = Instant::now();

        let frame = match source.read()? {
            Some(frame) => frame,
            None => break,
        };

        let mut annotated = detect_and_annotate(detector, labels, &frame)?;

        let fps = instantaneous_fps(started.elapsed());
        overlay_fps(&mut annotated, fps)?;

        if !present(&annotated)? {
            info!("Stopped by user after {} frames", source.frames_read());
            break;
        }
    }

    Ok(())
}

/// Persist an annotated frame, creating the containing directory if needed
fn save_image(path: &str, frame: &Mat) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let written = imgcodecs::imwrite(path, frame, &Vector::new())?;
    if !written {
        return Err(DetectionError::config(format!(
            "Failed to write output image: {}",
            path
        )));
    }
    Ok(())
}
