//! Frame acquisition from video files and camera devices

use std::path::Path;

use image::RgbImage;
use log::{info, warn};
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{VideoCapture, CAP_ANY},
};

use crate::error::{DetectionError, Result};

/// Sequential frame producer, the seam between the processing loop and
/// the capture backend. Mirrors the stubbing seam the detector has.
pub trait FrameRead {
    /// Read the next frame; `Ok(None)` is normal end-of-stream
    fn read(&mut self) -> Result<Option<Mat>>;

    /// Number of frames successfully read so far
    fn frames_read(&self) -> u64;
}

/// Exclusively-owned capture handle bound to a video file or camera.
///
/// The handle is released exactly once when the source is dropped, which
/// covers every exit path of the processing loop.
pub struct FrameSource {
    capture: VideoCapture,
    frame: Mat,
    frames_read: u64,
}

impl FrameSource {
    /// Open a video file; fails fast if the container cannot be opened
    pub fn open_file(path: &Path) -> Result<Self> {
        let path_str = path
            .to_str()
            .ok_or_else(|| DetectionError::source_open("Invalid video path"))?;

        let capture = VideoCapture::from_file(path_str, CAP_ANY)
            .map_err(|e| DetectionError::source_open(format!("Failed to open video file: {}", e)))?;

        Self::from_capture(capture, path_str)
    }

    /// Open a live camera device by index
    pub fn open_camera(index: i32) -> Result<Self> {
        let capture = VideoCapture::new(index, CAP_ANY).map_err(|e| {
            DetectionError::source_open(format!("Failed to open camera {}: {}", index, e))
        })?;

        Self::from_capture(capture, &format!("camera {}", index))
    }

    fn from_capture(capture: VideoCapture, source: &str) -> Result<Self> {
        if !capture.is_opened()? {
            return Err(DetectionError::source_open(format!(
                "Video source is not opened: {}",
                source
            )));
        }

        info!("Opened video source: {}", source);

        Ok(Self {
            capture,
            frame: Mat::default(),
            frames_read: 0,
        })
    }
}

impl FrameRead for FrameSource {
    /// Returns `Ok(None)` on end-of-stream or when the device stops
    /// delivering frames; both terminate the loop normally. The returned
    /// frame is an owned copy, never a view into the capture's reused
    /// internal buffer.
    fn read(&mut self) -> Result<Option<Mat>> {
        let read_success = self
            .capture
            .read(&mut self.frame)
            .map_err(|e| DetectionError::capture(format!("Failed to read frame: {}", e)))?;

        if !read_success || self.frame.empty() {
            info!("End of stream after {} frames", self.frames_read);
            return Ok(None);
        }

        self.frames_read += 1;
        Ok(Some(self.frame.try_clone()?))
    }

    fn frames_read(&self) -> u64 {
        self.frames_read
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            warn!("Failed to release capture handle: {}", e);
        }
    }
}

/// Convert an OpenCV BGR frame to an `RgbImage` for the detector
pub fn mat_to_rgb_image(mat: &Mat) -> Result<RgbImage> {
    let width = mat.cols() as u32;
    let height = mat.rows() as u32;

    let mut rgb_mat = Mat::default();
    imgproc::cvt_color(mat, &mut rgb_mat, imgproc::COLOR_BGR2RGB, 0)?;

    let data = rgb_mat.data_bytes()?.to_vec();

    RgbImage::from_vec(width, height, data)
        .ok_or_else(|| DetectionError::preprocessing("Frame buffer does not match its dimensions"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file_fails() {
        let result = FrameSource::open_file(Path::new("/nonexistent/video.mp4"));
        assert!(result.is_err());
    }
}
