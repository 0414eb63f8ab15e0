//! Still capture.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::{thread, time};

use crate::module::util::conf::Capture;

/// One still capture, so the batch loop can run against a test double.
pub trait CameraDriver {
    /// Writes a single still image to `path`.
    fn capture_to(&mut self, path: &Path) -> Result<(), Box<dyn Error>>;
}

/// Captures stills through the `rpicam-still` command line tool.
///
/// The camera stack is configured per shot: manual focus at the configured
/// lens position, full-sensor resolution, highest JPEG quality. The settle
/// time runs before each exposure.
pub struct RpicamStill {
    conf: Capture,
}

impl RpicamStill {
    pub fn new(conf: Capture) -> Self {
        Self { conf }
    }
}

impl CameraDriver for RpicamStill {
    fn capture_to(&mut self, path: &Path) -> Result<(), Box<dyn Error>> {
        let output = Command::new("rpicam-still")
            .args([
                "--nopreview",
                "--autofocus-mode",
                "manual",
                "--lens-position",
                &self.conf.lens_position.to_string(),
                "--quality",
                &self.conf.quality.to_string(),
                "--width",
                &self.conf.width.to_string(),
                "--height",
                &self.conf.height.to_string(),
                "--timeout",
                &self.conf.settle_ms.to_string(),
            ])
            .arg("--output")
            .arg(path)
            .output()?;
        if !output.status.success() {
            return Err(format!(
                "rpicam-still exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )
            .into());
        }
        Ok(())
    }
}

/// Writes up to `count` stills named `{device}_{stamp}_{index}.jpg` (1-based
/// index) into `dir`, pausing `interval_ms` between shots.
///
/// Best effort: the batch stops at the first driver error and never panics.
/// The run continues with however many files were written.
/// Returns the number of images written.
pub fn capture_batch(
    driver: &mut dyn CameraDriver,
    dir: &str,
    device: &str,
    stamp: &str,
    count: u32,
    interval_ms: u64,
) -> u32 {
    let mut written = 0;
    for i in 1..=count {
        let file = format!("{}_{}_{}.jpg", device, stamp, i);
        let path = PathBuf::from(dir).join(&file);
        match driver.capture_to(&path) {
            Ok(()) => {
                log::info!("Image {} captured", file);
                written += 1;
            }
            Err(e) => {
                log::error!("Image not captured: {}", e);
                break;
            }
        }
        if i < count {
            thread::sleep(time::Duration::from_millis(interval_ms));
        }
    }
    written
}
