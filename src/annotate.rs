//! Detection overlay rendering

use std::time::Duration;

use opencv::{
    core::{Mat, Point, Rect, Scalar},
    imgproc,
    prelude::*,
};

use crate::error::Result;
use crate::types::{class_color, ClassLabels, DetectionResult};

const BOX_THICKNESS: i32 = 2;
const LABEL_FONT_SCALE: f64 = 0.5;

/// FPS overlay styling, fixed position and color
const FPS_ORIGIN: (i32, i32) = (20, 40);
const FPS_FONT_SCALE: f64 = 1.0;
const FPS_THICKNESS: i32 = 2;

/// Render detections onto a copy of the frame.
///
/// The input frame is never mutated; capture sources may hand out the same
/// buffer identity across iterations.
pub fn annotate_frame(frame: &Mat, result: &DetectionResult, labels: &ClassLabels) -> Result<Mat> {
    let mut annotated = frame.try_clone()?;

    for det in &result.detections {
        let bbox = det.bbox.to_pixels(result.image_width, result.image_height);
        let color = class_scalar(det.class_id);
        let rect = Rect::new(bbox.x, bbox.y, bbox.width as i32, bbox.height as i32);

        imgproc::rectangle(&mut annotated, rect, color, BOX_THICKNESS, imgproc::LINE_8, 0)?;

        let label = format!(
            "{} {:.0}%",
            labels.name(det.class_id),
            det.confidence * 100.0
        );
        // Keep the label inside the frame when the box touches the top edge
        let label_y = if bbox.y > 14 { bbox.y - 6 } else { bbox.y + 16 };
        imgproc::put_text(
            &mut annotated,
            &label,
            Point::new(bbox.x, label_y),
            imgproc::FONT_HERSHEY_SIMPLEX,
            LABEL_FONT_SCALE,
            color,
            1,
            imgproc::LINE_8,
            false,
        )?;
    }

    Ok(annotated)
}

/// Overlay the instantaneous FPS value as green text at a fixed position
pub fn overlay_fps(frame: &mut Mat, fps: u32) -> Result<()> {
    imgproc::put_text(
        frame,
        &format!("FPS: {}", fps),
        Point::new(FPS_ORIGIN.0, FPS_ORIGIN.1),
        imgproc::FONT_HERSHEY_SIMPLEX,
        FPS_FONT_SCALE,
        Scalar::new(0.0, 255.0, 0.0, 0.0),
        FPS_THICKNESS,
        imgproc::LINE_8,
        false,
    )?;
    Ok(())
}

/// Instantaneous frames-per-second for one loop iteration, as the
/// reciprocal of its wall-clock duration, truncated to an integer
pub fn instantaneous_fps(elapsed: Duration) -> u32 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        (1.0 / secs) as u32
    } else {
        0
    }
}

/// Deterministic per-class BGR color for OpenCV drawing
fn class_scalar(class_id: u32) -> Scalar {
    let [r, g, b] = class_color(class_id);
    Scalar::new(b as f64, g as f64, r as f64, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, Detection};
    use opencv::core::CV_8UC3;

    fn black_frame(width: i32, height: i32) -> Mat {
        Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::all(0.0)).unwrap()
    }

    #[test]
    fn test_fps_is_reciprocal_of_duration() {
        assert_eq!(instantaneous_fps(Duration::from_millis(40)), 25);
        assert_eq!(instantaneous_fps(Duration::from_millis(100)), 10);
        assert_eq!(instantaneous_fps(Duration::ZERO), 0);
    }

    #[test]
    fn test_fps_differs_across_latencies() {
        let fast = instantaneous_fps(Duration::from_millis(20));
        let slow = instantaneous_fps(Duration::from_millis(80));
        assert_ne!(fast, slow);
        assert!(fast > slow);
    }

    #[test]
    fn test_annotate_preserves_dimensions_and_input() {
        let frame = black_frame(64, 48);
        let detections = vec![Detection::new(
            0,
            0.9,
            BoundingBox::new(0.25, 0.25, 0.5, 0.5),
        )];
        let result = DetectionResult::new(detections, 1.0, 64, 48);
        let labels = ClassLabels::default();

        let annotated = annotate_frame(&frame, &result, &labels).unwrap();
        assert_eq!(annotated.cols(), 64);
        assert_eq!(annotated.rows(), 48);

        // The input frame stays untouched
        let first = *frame.at_2d::<opencv::core::Vec3b>(12, 16).unwrap();
        assert_eq!(first, opencv::core::Vec3b::from([0, 0, 0]));
    }

    #[test]
    fn test_annotate_empty_detections_is_copy() {
        let frame = black_frame(32, 32);
        let result = DetectionResult::new(Vec::new(), 1.0, 32, 32);
        let annotated = annotate_frame(&frame, &result, &ClassLabels::default()).unwrap();
        assert_eq!(annotated.cols(), frame.cols());
        assert_eq!(annotated.rows(), frame.rows());
    }

    #[test]
    fn test_overlay_fps_draws_in_place() {
        let mut frame = black_frame(128, 96);
        overlay_fps(&mut frame, 30).unwrap();
        // Some pixel near the overlay origin must now be green
        let mut found = false;
        for y in 20..45 {
            for x in 15..120 {
                let px = *frame.at_2d::<opencv::core::Vec3b>(y, x).unwrap();
                if px[1] > 200 {
                    found = true;
                }
            }
        }
        assert!(found);
    }
}
