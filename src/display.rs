//! Window display helpers over OpenCV highgui

use opencv::{core::Mat, highgui};

use crate::error::Result;

pub const IMAGE_WINDOW: &str = "Image Detection";
pub const VIDEO_WINDOW: &str = "Video Defect Detection";
pub const WEBCAM_WINDOW: &str = "Webcam Defect Detection";

const QUIT_KEY: char = 'q';

/// Show a frame in the named window
pub fn show(window: &str, frame: &Mat) -> Result<()> {
    highgui::imshow(window, frame)?;
    Ok(())
}

/// Block until the user presses any key
pub fn wait_for_any_key() -> Result<()> {
    highgui::wait_key(0)?;
    Ok(())
}

/// Poll for a key press with a short timeout; true when the quit key was hit
pub fn quit_requested() -> Result<bool> {
    Ok(is_quit_key(highgui::wait_key(1)?))
}

/// GTK/Qt backends report keycodes with lock and modifier bits set above
/// the low byte, so only the low byte identifies the key. The no-key value
/// -1 masks to 255 and matches nothing.
fn is_quit_key(key: i32) -> bool {
    key & 0xFF == QUIT_KEY as i32
}

/// Close all display windows
pub fn close_all() -> Result<()> {
    highgui::destroy_all_windows()?;
    Ok(())
}
