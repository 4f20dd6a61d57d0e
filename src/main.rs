use anyhow::{anyhow, Result};
use clap::Parser;
use colored::*;
use std::path::Path;

use dino_hands::app::{App, LoopSettings};
use dino_hands::args::Args;
use dino_hands::camera::{self, CameraSource};
use dino_hands::config::AppConfig;
use dino_hands::controller::JumpController;
use dino_hands::inference::HandLandmarkPipeline;
use dino_hands::keys::{EnigoInjector, JumpKey, KeyInjector, RecordingInjector};
use dino_hands::output::{self, WindowOutput};
use dino_hands::overlay::OverlayRenderer;
use dino_hands::pipeline::{HandPipeline, SimulatedHands};
use dino_hands::ttf::FontRenderer;

const SIMULATED_PHASE_FRAMES: u32 = 45;

fn create_pipeline(config: &AppConfig) -> Result<Box<dyn HandPipeline>> {
    let det = &config.detection;
    if det.simulate {
        return Ok(Box::new(SimulatedHands::new(SIMULATED_PHASE_FRAMES)));
    }
    if !Path::new(&det.landmark_model).exists() {
        log::warn!(
            "Hand landmark model not found at {}. Falling back to simulated hands.",
            det.landmark_model
        );
        return Ok(Box::new(SimulatedHands::new(SIMULATED_PHASE_FRAMES)));
    }
    Ok(Box::new(HandLandmarkPipeline::new(
        &det.landmark_model,
        &det.palm_model,
        det.min_detection_confidence,
        det.min_presence_confidence,
    )?))
}

fn create_injector(config: &AppConfig) -> Result<Box<dyn KeyInjector>> {
    if config.control.dry_run {
        log::info!("Dry run: key events are logged, not sent");
        Ok(Box::new(RecordingInjector::new()))
    } else {
        Ok(Box::new(EnigoInjector::new()?))
    }
}

fn print_banner(key: JumpKey, quit: &str) {
    println!("{}", "Dino Hand Controller - PEACE MODE".green().bold());
    println!("{}", "=".repeat(50));
    println!("{}", "GESTURE: PEACE SIGN ONLY".yellow());
    println!("How to:");
    println!("   - Raise INDEX FINGER + MIDDLE FINGER");
    println!("   - Lower THUMB + RING FINGER + PINKY");
    println!("   - Like when taking a photo");
    println!("Holding the sign holds '{}'", key);
    println!("Press '{}' in the camera window to exit", quit);
    println!("{}", "=".repeat(50));
}

fn run(args: Args) -> Result<()> {
    if args.list {
        return camera::list_cameras();
    }

    // 0. Config
    let mut config = AppConfig::load_from(&args.config)?;
    args.apply(&mut config);

    let key: JumpKey = config.control.jump_key.parse()?;
    let quit_key = output::parse_quit_key(&config.control.quit_key)
        .ok_or_else(|| anyhow!("Unsupported quit key '{}'", config.control.quit_key))?;

    // 1. Camera
    let cam = &config.camera;
    let source = CameraSource::open_with_fallback(cam.index, cam.fallback_index, cam.width, cam.height)?;
    log::info!("Camera OK!");

    // 2. Hand tracking
    let pipeline = create_pipeline(&config)?;
    log::info!("Active pipeline: {}", pipeline.name());

    // 3. Keyboard
    let controller = JumpController::new(create_injector(&config)?, key, config.control.cooldown());

    // 4. Display
    let renderer = OverlayRenderer::new(
        FontRenderer::try_load(&config.ui.font_family),
        config.ui.status_font_pt,
        config.ui.text_font_pt,
        config.ui.bitmap_scale,
        config.ui.show_landmarks,
    );
    let window = WindowOutput::new(
        &config.ui.window_title,
        source.width() as usize,
        source.height() as usize,
        quit_key,
    )?;

    print_banner(key, &config.control.quit_key);

    let mut app = App::new(source, pipeline, controller, renderer, window, LoopSettings::from(&config));
    let outcome = app.run();
    app.shutdown();
    outcome
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        eprintln!("Please try:");
        eprintln!("1. Close apps using the camera");
        eprintln!("2. Run with --list to see available cameras, then --cam-index <n>");
        eprintln!("3. Run with --simulate to check the window without a hand model");
    }
}
