//! The capture -> detect -> classify -> control -> render -> display loop.

use anyhow::Result;
use image::{ImageBuffer, Rgb};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::controller::{JumpController, JumpState};
use crate::gesture::{Gesture, GestureResult};
use crate::keys::KeyInjector;
use crate::overlay::OverlayRenderer;
use crate::pipeline::HandPipeline;

pub trait FrameSource {
    fn capture(&mut self) -> Result<ImageBuffer<Rgb<u8>, Vec<u8>>>;
    fn name(&self) -> String;
}

pub trait FrameSink {
    fn show(&mut self, frame: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> Result<()>;
    fn quit_requested(&self) -> bool;

    /// Process input while no frame is available.
    fn idle(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSettings {
    pub mirror: bool,
    pub warmup: Duration,
    pub read_retry_delay: Duration,
}

impl From<&AppConfig> for LoopSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            mirror: config.camera.mirror,
            warmup: config.control.warmup(),
            read_retry_delay: config.camera.read_retry_delay(),
        }
    }
}

// Field order matters on unwind: the controller (held key) goes before the camera.
pub struct App<S: FrameSource, D: FrameSink> {
    controller: JumpController<Box<dyn KeyInjector>>,
    pipeline: Box<dyn HandPipeline>,
    renderer: OverlayRenderer,
    source: S,
    sink: D,
    settings: LoopSettings,
    frame_count: u64,
}

impl<S: FrameSource, D: FrameSink> App<S, D> {
    pub fn new(
        source: S,
        pipeline: Box<dyn HandPipeline>,
        controller: JumpController<Box<dyn KeyInjector>>,
        renderer: OverlayRenderer,
        sink: D,
        settings: LoopSettings,
    ) -> Self {
        Self {
            controller,
            pipeline,
            renderer,
            source,
            sink,
            settings,
            frame_count: 0,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn jump_state(&self) -> JumpState {
        self.controller.state()
    }

    /// Runs until the sink reports the quit key. Frame read failures are
    /// logged and retried; anything else is returned.
    pub fn run(&mut self) -> Result<()> {
        if !self.settings.warmup.is_zero() {
            thread::sleep(self.settings.warmup);
        }
        log::info!(
            "Running on '{}' with {}",
            self.source.name(),
            self.pipeline.name()
        );

        while !self.sink.quit_requested() {
            let mut frame = match self.source.capture() {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!("Camera error! {:#}", e);
                    self.sink.idle()?;
                    if !self.sink.quit_requested() {
                        thread::sleep(self.settings.read_retry_delay);
                    }
                    continue;
                }
            };

            self.step(&mut frame, Instant::now());
            self.sink.show(&frame)?;
        }
        Ok(())
    }

    /// One iteration on an already captured frame.
    pub fn step(&mut self, frame: &mut ImageBuffer<Rgb<u8>, Vec<u8>>, now: Instant) -> GestureResult {
        self.frame_count += 1;

        if self.settings.mirror {
            image::imageops::flip_horizontal_in_place(frame);
        }

        let hand = match self.pipeline.process(frame) {
            Ok(hand) => hand,
            Err(e) => {
                log::warn!("Hand detection failed: {:#}", e);
                None
            }
        };

        let result = Gesture::classify(hand.as_ref().map(|h| &h.fingers)).result();
        let before = self.controller.state();
        let after = self.controller.handle(result.gesture, now);
        if before != after {
            log::debug!("{:?} -> {:?} on frame {}", before, after, self.frame_count);
        }

        self.renderer.render(frame, &result, self.frame_count, hand.as_ref());
        result
    }

    /// Releases a held key, then the camera, then the window.
    pub fn shutdown(self) {
        let App {
            controller,
            source,
            sink,
            ..
        } = self;
        controller.shutdown();
        drop(source);
        drop(sink);
        log::info!("Exited!");
    }
}
