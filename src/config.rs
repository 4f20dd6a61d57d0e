use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub camera: CameraConfig,
    pub detection: DetectionConfig,
    pub control: ControlConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub index: u32,
    pub fallback_index: u32,
    pub width: u32,
    pub height: u32,
    pub mirror: bool,
    pub read_retry_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub palm_model: String,
    pub landmark_model: String,
    pub min_detection_confidence: f32,
    pub min_presence_confidence: f32,
    pub simulate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub jump_key: String, // "space", "up" or a single character
    pub cooldown_secs: f64,
    pub warmup_secs: f64,
    pub quit_key: String,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub window_title: String,
    pub font_family: String,
    pub status_font_pt: f32,
    pub text_font_pt: f32,
    pub bitmap_scale: usize,
    pub show_landmarks: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            fallback_index: 1,
            width: 640,
            height: 480,
            mirror: true,
            read_retry_delay_ms: 100,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            palm_model: "models/palm_detection.onnx".to_string(),
            landmark_model: "models/hand_landmark.onnx".to_string(),
            min_detection_confidence: 0.8,
            min_presence_confidence: 0.5,
            simulate: false,
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            jump_key: "space".to_string(),
            cooldown_secs: 0.1,
            warmup_secs: 2.0,
            quit_key: "q".to_string(),
            dry_run: false,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_title: "Dino Control - PEACE".to_string(),
            font_family: "DejaVuSans".to_string(),
            status_font_pt: 36.0,
            text_font_pt: 18.0,
            bitmap_scale: 2,
            show_landmarks: true,
        }
    }
}

impl ControlConfig {
    pub fn cooldown(&self) -> Duration {
        seconds_or_default("cooldown_secs", self.cooldown_secs, Self::default().cooldown_secs)
    }

    pub fn warmup(&self) -> Duration {
        seconds_or_default("warmup_secs", self.warmup_secs, Self::default().warmup_secs)
    }
}

fn seconds_or_default(field: &str, secs: f64, default: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or_else(|e| {
        log::warn!("Invalid {} ({}): {}. Using {}.", field, secs, e, default);
        Duration::from_secs_f64(default)
    })
}

impl CameraConfig {
    pub fn read_retry_delay(&self) -> Duration {
        Duration::from_millis(self.read_retry_delay_ms)
    }
}

impl AppConfig {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            // Missing fields fall back to Default thanks to #[serde(default)]
            match serde_json::from_str::<AppConfig>(&content) {
                Ok(c) => {
                    log::info!("Loaded configuration from {}", path.display());
                    c
                }
                Err(e) => {
                    log::warn!("Error parsing config: {}. Loading defaults.", e);
                    Self::default()
                }
            }
        } else {
            log::info!("Configuration file not found. Creating default at {}", path.display());
            Self::default()
        };

        // Always save back so new fields show up in the file
        config.save_to(path)?;

        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "control": { "jump_key": "up" }, "camera": { "index": 2 } }"#).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.control.jump_key, "up");
        assert_eq!(config.control.cooldown_secs, 0.1);
        assert_eq!(config.camera.index, 2);
        assert_eq!(config.camera.fallback_index, 1);

        // Saved back with every field present
        let saved = fs::read_to_string(&path).unwrap();
        assert!(saved.contains("\"warmup_secs\""));
    }

    #[test]
    fn unparsable_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn durations() {
        let control = ControlConfig::default();
        assert_eq!(control.cooldown(), Duration::from_millis(100));
        assert_eq!(control.warmup(), Duration::from_secs(2));
        assert_eq!(CameraConfig::default().read_retry_delay(), Duration::from_millis(100));
    }

    #[test]
    fn out_of_range_durations_fall_back() {
        let control = ControlConfig {
            cooldown_secs: 1e20,
            warmup_secs: f64::INFINITY,
            ..ControlConfig::default()
        };
        assert_eq!(control.cooldown(), Duration::from_millis(100));
        assert_eq!(control.warmup(), Duration::from_secs(2));

        let negative = ControlConfig {
            cooldown_secs: -3.0,
            ..ControlConfig::default()
        };
        assert_eq!(negative.cooldown(), Duration::ZERO);
    }
}
