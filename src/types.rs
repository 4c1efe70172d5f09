//! Type definitions for defect detection results

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Result;

/// Bounding box in normalized coordinates (0-1, relative to the frame)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// X coordinate of top-left corner
    pub x: f32,
    /// Y coordinate of top-left corner
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get area of bounding box
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Convert to pixel coordinates given frame dimensions
    pub fn to_pixels(&self, img_width: u32, img_height: u32) -> PixelBoundingBox {
        PixelBoundingBox {
            x: (self.x * img_width as f32) as i32,
            y: (self.y * img_height as f32) as i32,
            width: ((self.width * img_width as f32) as u32).max(1),
            height: ((self.height * img_height as f32) as u32).max(1),
        }
    }

    /// Check if two bounding boxes intersect
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        let x_overlap = self.x < other.x + other.width && self.x + self.width > other.x;
        let y_overlap = self.y < other.y + other.height && self.y + self.height > other.y;
        x_overlap && y_overlap
    }

    /// Calculate intersection over union (IoU) with another bounding box
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        if !self.intersects(other) {
            return 0.0;
        }

        let x_left = self.x.max(other.x);
        let y_top = self.y.max(other.y);
        let x_right = (self.x + self.width).min(other.x + other.width);
        let y_bottom = (self.y + self.height).min(other.y + other.height);

        let intersection_area = (x_right - x_left) * (y_bottom - y_top);
        let union_area = self.area() + other.area() - intersection_area;

        intersection_area / union_area
    }
}

/// Bounding box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Single detection: class, confidence score, bounding box
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub class_id: u32,
    /// Detection confidence score (0-1)
    pub confidence: f32,
    /// Bounding box in normalized coordinates
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(class_id: u32, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            class_id,
            confidence,
            bbox,
        }
    }
}

/// Detection results for a single frame
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub detections: Vec<Detection>,
    /// Inference time in milliseconds
    pub inference_time_ms: f32,
    /// Dimensions of the frame the detections refer to
    pub image_width: u32,
    pub image_height: u32,
}

impl DetectionResult {
    pub fn new(
        detections: Vec<Detection>,
        inference_time_ms: f32,
        image_width: u32,
        image_height: u32,
    ) -> Self {
        Self {
            detections,
            inference_time_ms,
            image_width,
            image_height,
        }
    }

    /// Get number of detections
    pub fn count(&self) -> usize {
        self.detections.len()
    }
}

/// Class-id to human-readable name mapping
///
/// Loaded from an optional `labels.txt` shipped next to the model artifact,
/// one name per line in class-id order. Unknown ids fall back to `class_N`.
#[derive(Debug, Clone, Default)]
pub struct ClassLabels {
    names: Vec<String>,
}

impl ClassLabels {
    pub fn from_names(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Load labels from a file; a missing file yields an empty table
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No label file at {}, using class-id names", path.display());
            return Ok(Self::default());
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut names = Vec::new();
        for line in reader.lines() {
            names.push(line?.trim().to_string());
        }

        log::info!("Loaded {} class labels from {}", names.len(), path.display());
        Ok(Self { names })
    }

    /// Get class name for an id, falling back to `class_N`
    pub fn name(&self, class_id: u32) -> String {
        match self.names.get(class_id as usize) {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("class_{}", class_id),
        }
    }
}

/// Generate a deterministic annotation color (RGB) per class id
pub fn class_color(class_id: u32) -> [u8; 3] {
    // Golden ratio prime hash keeps colors stable across runs
    let mut hash = class_id.wrapping_mul(2654435761);

    let r = (hash & 0xFF) as u16;
    hash = hash.wrapping_mul(2654435761);
    let g = (hash & 0xFF) as u16;
    hash = hash.wrapping_mul(2654435761);
    let b = (hash & 0xFF) as u16;

    // Cap brightness so labels stay readable over light backgrounds
    let max_value = 180u16;
    let min_bright = 100u16;

    let r = (r.min(max_value)).max(if r > g && r > b { min_bright } else { 40 });
    let g = (g.min(max_value)).max(if g > r && g > b { min_bright } else { 40 });
    let b = (b.min(max_value)).max(if b > r && b > g { min_bright } else { 40 });

    [r as u8, g as u8, b as u8]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_bounding_box_iou() {
        let bbox1 = BoundingBox::new(0.0, 0.0, 0.5, 0.5);
        let bbox2 = BoundingBox::new(0.25, 0.25, 0.5, 0.5);

        let iou = bbox1.iou(&bbox2);
        assert!(iou > 0.0 && iou < 1.0);

        let identical = bbox1.iou(&bbox1);
        assert!((identical - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_bounding_box_no_overlap() {
        let bbox1 = BoundingBox::new(0.0, 0.0, 0.2, 0.2);
        let bbox2 = BoundingBox::new(0.5, 0.5, 0.2, 0.2);

        assert!(!bbox1.intersects(&bbox2));
        assert_eq!(bbox1.iou(&bbox2), 0.0);
    }

    #[test]
    fn test_to_pixels() {
        let bbox = BoundingBox::new(0.5, 0.25, 0.25, 0.5);
        let pixels = bbox.to_pixels(640, 480);

        assert_eq!(pixels.x, 320);
        assert_eq!(pixels.y, 120);
        assert_eq!(pixels.width, 160);
        assert_eq!(pixels.height, 240);
    }

    #[test]
    fn test_label_fallback() {
        let labels = ClassLabels::default();
        assert_eq!(labels.name(3), "class_3");

        let labels = ClassLabels::from_names(vec!["tear".to_string(), "crack".to_string()]);
        assert_eq!(labels.name(0), "tear");
        assert_eq!(labels.name(1), "crack");
        assert_eq!(labels.name(2), "class_2");
    }

    #[test]
    fn test_label_load_missing_file() {
        let labels = ClassLabels::load(Path::new("/nonexistent/labels.txt")).unwrap();
        assert_eq!(labels.name(0), "class_0");
    }

    #[test]
    fn test_label_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.txt");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "tear").unwrap();
        writeln!(file, "seam damage").unwrap();

        let labels = ClassLabels::load(&path).unwrap();
        assert_eq!(labels.name(0), "tear");
        assert_eq!(labels.name(1), "seam damage");
    }

    #[test]
    fn test_class_color_deterministic() {
        assert_eq!(class_color(2), class_color(2));
        assert_ne!(class_color(0), class_color(1));
    }
}
