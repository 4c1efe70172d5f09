//! Postprocessing: YOLOv8 output decoding, confidence filtering, NMS

use ndarray::ArrayViewD;

use crate::error::{DetectionError, Result};
use crate::types::{BoundingBox, Detection};

/// Converts raw model outputs into filtered detections
#[derive(Debug, Clone)]
pub struct Postprocessor {
    /// Confidence threshold for keeping detections
    confidence_threshold: f32,
    /// NMS threshold for removing duplicate detections
    nms_threshold: f32,
    /// Input size used during preprocessing (width, height)
    input_size: (u32, u32),
}

impl Postprocessor {
    pub fn new(confidence_threshold: f32, nms_threshold: f32, input_size: (u32, u32)) -> Self {
        Self {
            confidence_threshold,
            nms_threshold,
            input_size,
        }
    }

    /// Decode a YOLOv8 output tensor and apply confidence filtering and NMS.
    ///
    /// Expected shape is `[1, 4 + num_classes, num_anchors]` with boxes in
    /// center format, or `[1, 5, num_anchors]` for single-class models.
    /// Every returned detection has `confidence >= confidence_threshold`.
    pub fn process(&self, output: ArrayViewD<'_, f32>) -> Result<Vec<Detection>> {
        let detections = self.decode(output)?;
        Ok(self.non_max_suppression(detections))
    }

    fn decode(&self, output: ArrayViewD<'_, f32>) -> Result<Vec<Detection>> {
        let shape = output.shape();
        if shape.len() != 3 || shape[0] != 1 || shape[1] < 5 {
            return Err(DetectionError::postprocessing(format!(
                "Unexpected output shape: {:?}",
                shape
            )));
        }

        let num_channels = shape[1];
        let num_anchors = shape[2];
        let is_single_class = num_channels == 5;
        let (input_w, input_h) = (self.input_size.0 as f32, self.input_size.1 as f32);

        let mut detections = Vec::new();

        for i in 0..num_anchors {
            let x_center = output[[0, 0, i]];
            let y_center = output[[0, 1, i]];
            let width = output[[0, 2, i]];
            let height = output[[0, 3, i]];

            let (confidence, class_id) = if is_single_class {
                (output[[0, 4, i]], 0)
            } else {
                // Multi-class model: best class score wins
                let num_classes = num_channels - 4;
                let mut max_score = 0.0f32;
                let mut max_class = 0;
                for c in 0..num_classes {
                    let score = output[[0, 4 + c, i]];
                    if score > max_score {
                        max_score = score;
                        max_class = c;
                    }
                }
                (max_score, max_class as u32)
            };

            if confidence < self.confidence_threshold {
                continue;
            }

            // Normalize to [0, 1] relative to the model input size; the
            // annotation step maps back to frame pixels.
            let x = ((x_center - width / 2.0) / input_w).clamp(0.0, 1.0);
            let y = ((y_center - height / 2.0) / input_h).clamp(0.0, 1.0);
            let w = (width / input_w).max(0.0).min(1.0 - x);
            let h = (height / input_h).max(0.0).min(1.0 - y);

            detections.push(Detection::new(class_id, confidence, BoundingBox::new(x, y, w, h)));
        }

        Ok(detections)
    }

    /// Non-maximum suppression, class-aware: overlapping boxes of the same
    /// class keep only the highest-confidence instance.
    fn non_max_suppression(&self, mut detections: Vec<Detection>) -> Vec<Detection> {
        detections.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut keep = Vec::new();

        while !detections.is_empty() {
            let current = detections.remove(0);
            detections.retain(|det| {
                det.class_id != current.class_id
                    || current.bbox.iou(&det.bbox) < self.nms_threshold
            });
            keep.push(current);
        }

        keep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    /// Build a single-class output tensor [1, 5, N] from (cx, cy, w, h, conf) rows
    fn single_class_output(anchors: &[[f32; 5]]) -> ndarray::ArrayD<f32> {
        let mut arr = Array3::<f32>::zeros((1, 5, anchors.len()));
        for (i, anchor) in anchors.iter().enumerate() {
            for (c, &v) in anchor.iter().enumerate() {
                arr[[0, c, i]] = v;
            }
        }
        arr.into_dyn()
    }

    #[test]
    fn test_confidence_filtering() {
        let post = Postprocessor::new(0.5, 0.45, (640, 640));
        let output = single_class_output(&[
            [320.0, 320.0, 100.0, 100.0, 0.9],
            [100.0, 100.0, 50.0, 50.0, 0.3],
        ]);

        let detections = post.process(output.view()).unwrap();
        assert_eq!(detections.len(), 1);
        assert!((detections[0].confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_all_surfaced_detections_meet_threshold() {
        for threshold in [0.1, 0.5, 0.8, 1.0] {
            let post = Postprocessor::new(threshold, 0.45, (640, 640));
            let output = single_class_output(&[
                [100.0, 100.0, 40.0, 40.0, 0.15],
                [300.0, 300.0, 40.0, 40.0, 0.55],
                [500.0, 500.0, 40.0, 40.0, 0.85],
                [200.0, 400.0, 40.0, 40.0, 1.0],
            ]);

            let detections = post.process(output.view()).unwrap();
            assert!(detections.iter().all(|d| d.confidence >= threshold));
        }
    }

    #[test]
    fn test_box_decoding() {
        let post = Postprocessor::new(0.5, 0.45, (640, 640));
        let output = single_class_output(&[[320.0, 320.0, 320.0, 320.0, 0.9]]);

        let detections = post.process(output.view()).unwrap();
        let bbox = detections[0].bbox;
        assert!((bbox.x - 0.25).abs() < 1e-6);
        assert!((bbox.y - 0.25).abs() < 1e-6);
        assert!((bbox.width - 0.5).abs() < 1e-6);
        assert!((bbox.height - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_multi_class_argmax() {
        // [1, 4 + 3, 1]: class 2 has the best score
        let mut arr = Array3::<f32>::zeros((1, 7, 1));
        arr[[0, 0, 0]] = 320.0;
        arr[[0, 1, 0]] = 320.0;
        arr[[0, 2, 0]] = 100.0;
        arr[[0, 3, 0]] = 100.0;
        arr[[0, 4, 0]] = 0.2;
        arr[[0, 5, 0]] = 0.3;
        arr[[0, 6, 0]] = 0.8;
        let output = arr.into_dyn();

        let post = Postprocessor::new(0.5, 0.45, (640, 640));
        let detections = post.process(output.view()).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_id, 2);
    }

    #[test]
    fn test_nms_suppresses_same_class_overlap() {
        let post = Postprocessor::new(0.5, 0.45, (640, 640));
        // Two heavily overlapping boxes of the same class
        let output = single_class_output(&[
            [320.0, 320.0, 200.0, 200.0, 0.9],
            [330.0, 330.0, 200.0, 200.0, 0.7],
        ]);

        let detections = post.process(output.view()).unwrap();
        assert_eq!(detections.len(), 1);
        assert!((detections[0].confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_nms_keeps_different_classes() {
        let post = Postprocessor::new(0.5, 0.45, (640, 640));
        let mut arr = Array3::<f32>::zeros((1, 6, 2));
        for i in 0..2 {
            arr[[0, 0, i]] = 320.0;
            arr[[0, 1, i]] = 320.0;
            arr[[0, 2, i]] = 200.0;
            arr[[0, 3, i]] = 200.0;
        }
        arr[[0, 4, 0]] = 0.9; // class 0
        arr[[0, 5, 1]] = 0.8; // class 1
        let output = arr.into_dyn();

        let detections = post.process(output.view()).unwrap();
        assert_eq!(detections.len(), 2);
    }

    #[test]
    fn test_rejects_bad_shape() {
        let post = Postprocessor::new(0.5, 0.45, (640, 640));
        let output = ndarray::Array2::<f32>::zeros((5, 10)).into_dyn();
        assert!(post.process(output.view()).is_err());
    }
}
