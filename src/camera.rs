use image::{ImageBuffer, Rgb};
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution},
    Camera,
};
use anyhow::{Result, Context, anyhow};

use crate::app::FrameSource;
use crate::error::CameraError;

/// Webcam opened for the whole run. The stream is stopped when this is dropped.
pub struct CameraSource {
    camera: Camera,
}

impl CameraSource {
    pub fn new(index: u32, width: u32, height: u32) -> Result<Self> {
        let cam_index = CameraIndex::Index(index);
        let wanted = CameraFormat::new(Resolution::new(width, height), FrameFormat::MJPEG, 30);
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(wanted));
        let mut camera = Camera::new(cam_index, requested).context("Failed to create camera instance")?;

        camera.open_stream().map_err(|e| anyhow!(e)).context("Failed to open camera stream")?;

        log::info!("Opened camera {}: {}", index, camera.info().human_name());
        log::info!("Format: {}", camera.camera_format());

        Ok(Self { camera })
    }

    /// Try `primary`, then `fallback` once.
    pub fn open_with_fallback(primary: u32, fallback: u32, width: u32, height: u32) -> Result<Self, CameraError> {
        log::info!("Initializing camera...");
        open_with_fallback(primary, fallback, |index| Self::new(index, width, height))
    }

    pub fn width(&self) -> u32 {
        self.camera.resolution().width()
    }

    pub fn height(&self) -> u32 {
        self.camera.resolution().height()
    }
}

impl FrameSource for CameraSource {
    fn capture(&mut self) -> Result<ImageBuffer<Rgb<u8>, Vec<u8>>> {
        let frame = self.camera.frame().map_err(|e| anyhow!(e)).context("Failed to get frame")?;
        let decoded = frame.decode_image::<RgbFormat>().map_err(|e| anyhow!(e)).context("Failed to decode frame")?;
        Ok(decoded)
    }

    fn name(&self) -> String {
        self.camera.info().human_name()
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            log::warn!("Failed to stop camera stream: {}", e);
        }
        log::info!("Camera released");
    }
}

/// Calls `open` with `primary`, and with `fallback` only if that fails.
pub fn open_with_fallback<T>(
    primary: u32,
    fallback: u32,
    mut open: impl FnMut(u32) -> Result<T>,
) -> Result<T, CameraError> {
    match open(primary) {
        Ok(cam) => Ok(cam),
        Err(first) => {
            log::warn!("Camera {} unavailable ({:#}). Trying different camera index...", primary, first);
            open(fallback).map_err(|source| CameraError::Unavailable {
                primary,
                fallback,
                source: source.into(),
            })
        }
    }
}

/// Prints the cameras the native backend can see.
pub fn list_cameras() -> Result<()> {
    let cameras = nokhwa::query(nokhwa::utils::ApiBackend::Auto)?;
    println!("Available Cameras:");
    println!("{:<5} | {:<30} | {:<10}", "Index", "Name", "Misc");
    println!("{}", "-".repeat(60));
    for cam in cameras {
        println!("{:<5} | {:<30} | {:?}", cam.index(), cam.human_name(), cam.misc());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_success_skips_fallback() {
        let mut tried = Vec::new();
        let opened = open_with_fallback(0, 1, |index| {
            tried.push(index);
            Ok(index)
        })
        .unwrap();
        assert_eq!(opened, 0);
        assert_eq!(tried, vec![0]);
    }

    #[test]
    fn primary_failure_tries_fallback_once() {
        let mut tried = Vec::new();
        let opened = open_with_fallback(0, 1, |index| {
            tried.push(index);
            if index == 0 {
                Err(anyhow!("no device"))
            } else {
                Ok(index)
            }
        })
        .unwrap();
        assert_eq!(opened, 1);
        assert_eq!(tried, vec![0, 1]);
    }

    #[test]
    fn both_failing_reports_both_indices() {
        let mut tried = Vec::new();
        let err = open_with_fallback(2, 5, |index| -> Result<()> {
            tried.push(index);
            Err(anyhow!("no device {}", index))
        })
        .unwrap_err();

        assert_eq!(tried, vec![2, 5]);
        match err {
            CameraError::Unavailable { primary, fallback, source } => {
                assert_eq!((primary, fallback), (2, 5));
                assert_eq!(source.to_string(), "no device 5");
            }
        }
    }
}
