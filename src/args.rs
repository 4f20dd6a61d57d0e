use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the JSON configuration (created with defaults if missing)
    #[arg(long, default_value = "config.json")]
    pub config: String,

    /// Camera index (overrides config)
    #[arg(short, long)]
    pub cam_index: Option<u32>,

    /// Do not mirror the camera image
    #[arg(long)]
    pub no_mirror: bool,

    /// Use scripted hands instead of the ONNX models
    #[arg(long)]
    pub simulate: bool,

    /// Log key events instead of sending them to the OS
    #[arg(long)]
    pub dry_run: bool,

    /// List available cameras
    #[arg(long)]
    pub list: bool,
}

impl Args {
    pub fn apply(&self, config: &mut crate::config::AppConfig) {
        if let Some(index) = self.cam_index {
            config.camera.index = index;
        }
        if self.no_mirror {
            config.camera.mirror = false;
        }
        config.detection.simulate |= self.simulate;
        config.control.dry_run |= self.dry_run;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn no_flags_keeps_config() {
        let args = Args::parse_from(["dino-hands"]);
        let mut config = AppConfig::default();
        args.apply(&mut config);
        assert_eq!(config, AppConfig::default());
        assert_eq!(args.config, "config.json");
    }

    #[test]
    fn flags_override_config() {
        let args = Args::parse_from(["dino-hands", "-c", "2", "--no-mirror", "--dry-run"]);
        let mut config = AppConfig::default();
        args.apply(&mut config);
        assert_eq!(config.camera.index, 2);
        assert!(!config.camera.mirror);
        assert!(config.control.dry_run);
        assert!(!config.detection.simulate);
    }
}
