use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use image::{ImageBuffer, Rgb};

use dino_hands::app::{App, FrameSink, FrameSource, LoopSettings};
use dino_hands::controller::{JumpController, JumpState, DEFAULT_COOLDOWN};
use dino_hands::error::KeyError;
use dino_hands::keys::{JumpKey, KeyInjector};
use dino_hands::overlay::OverlayRenderer;
use dino_hands::pipeline::HandPipeline;
use dino_hands::types::{FingerVector, HandObservation, Handedness};

type Frame = ImageBuffer<Rgb<u8>, Vec<u8>>;
type Log = Rc<RefCell<Vec<String>>>;

// What the hand pipeline reports for one frame; Err is a detection failure.
type Reading = Result<Option<[u8; 5]>, &'static str>;

const PEACE: Reading = Ok(Some([0, 1, 1, 0, 0]));
const OPEN: Reading = Ok(Some([1, 1, 1, 1, 1]));
const NONE: Reading = Ok(None);
const FAILED: Reading = Err("inference failed");

struct ScriptedSource {
    reads: VecDeque<bool>, // false = read failure
    log: Log,
}

impl FrameSource for ScriptedSource {
    fn capture(&mut self) -> Result<Frame> {
        match self.reads.pop_front() {
            Some(true) => Ok(ImageBuffer::from_pixel(64, 48, Rgb([20, 20, 20]))),
            Some(false) => Err(anyhow!("device busy")),
            None => Err(anyhow!("script exhausted")),
        }
    }

    fn name(&self) -> String {
        "scripted".to_string()
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.log.borrow_mut().push("camera released".to_string());
    }
}

struct ScriptedHands {
    script: VecDeque<Reading>,
}

impl HandPipeline for ScriptedHands {
    fn name(&self) -> String {
        "scripted hands".to_string()
    }

    fn process(&mut self, _frame: &Frame) -> Result<Option<HandObservation>> {
        let next = self.script.pop_front().unwrap_or(NONE).map_err(|msg| anyhow!(msg))?;
        Ok(next.map(|bits| HandObservation {
            landmarks: Vec::new(),
            handedness: Handedness::Right,
            score: 0.42,
            fingers: FingerVector::from_bits(bits),
        }))
    }
}

struct QuitAfter {
    remaining: u32,
    shown: Rc<RefCell<u32>>,
}

impl FrameSink for QuitAfter {
    fn show(&mut self, _frame: &Frame) -> Result<()> {
        *self.shown.borrow_mut() += 1;
        self.remaining = self.remaining.saturating_sub(1);
        Ok(())
    }

    fn quit_requested(&self) -> bool {
        self.remaining == 0
    }
}

/// Window that gets closed while the camera delivers nothing.
struct ClosedWhileStalled {
    idles: Rc<RefCell<u32>>,
}

impl FrameSink for ClosedWhileStalled {
    fn show(&mut self, _frame: &Frame) -> Result<()> {
        Ok(())
    }

    fn quit_requested(&self) -> bool {
        *self.idles.borrow() > 0
    }

    fn idle(&mut self) -> Result<()> {
        *self.idles.borrow_mut() += 1;
        Ok(())
    }
}

struct LoggedKeys {
    log: Log,
}

impl KeyInjector for LoggedKeys {
    fn press(&mut self, key: JumpKey) -> Result<(), KeyError> {
        self.log.borrow_mut().push(format!("press {}", key));
        Ok(())
    }

    fn release(&mut self, key: JumpKey) -> Result<(), KeyError> {
        self.log.borrow_mut().push(format!("release {}", key));
        Ok(())
    }
}

struct Harness {
    app: App<ScriptedSource, QuitAfter>,
    log: Log,
    shown: Rc<RefCell<u32>>,
}

fn harness(reads: &[bool], hands: &[Reading], quit_after: u32, mirror: bool) -> Harness {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let shown = Rc::new(RefCell::new(0));
    let source = ScriptedSource {
        reads: reads.iter().copied().collect(),
        log: log.clone(),
    };
    let pipeline = Box::new(ScriptedHands {
        script: hands.iter().copied().collect(),
    });
    let injector: Box<dyn KeyInjector> = Box::new(LoggedKeys { log: log.clone() });
    let controller = JumpController::new(injector, JumpKey::Space, DEFAULT_COOLDOWN);
    let sink = QuitAfter {
        remaining: quit_after,
        shown: shown.clone(),
    };
    let settings = LoopSettings {
        mirror,
        warmup: Duration::ZERO,
        read_retry_delay: Duration::ZERO,
    };
    let app = App::new(source, pipeline, controller, OverlayRenderer::plain(), sink, settings);
    Harness { app, log, shown }
}

fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

fn blank() -> Frame {
    ImageBuffer::from_pixel(64, 48, Rgb([0, 0, 0]))
}

#[test]
fn peace_sign_presses_space_once() {
    let mut h = harness(&[], &[PEACE], 1, false);
    let result = h.app.step(&mut blank(), Instant::now());

    assert_eq!(result.label, "PEACE - JUMP!");
    assert_eq!(h.app.jump_state(), JumpState::Jumping);
    assert_eq!(entries(&h.log), vec!["press space"]);
}

#[test]
fn open_palm_after_jump_releases_once() {
    let mut h = harness(&[], &[PEACE, OPEN, OPEN], 1, false);
    let t0 = Instant::now();
    h.app.step(&mut blank(), t0);
    let result = h.app.step(&mut blank(), t0 + Duration::from_millis(30));
    h.app.step(&mut blank(), t0 + Duration::from_millis(60));

    assert_eq!(result.label, "READY (5 FINGERS)");
    assert_eq!(entries(&h.log), vec!["press space", "release space"]);
}

#[test]
fn lost_hand_releases_on_first_frame_only() {
    let mut h = harness(&[], &[PEACE, NONE, NONE, NONE], 1, false);
    let t0 = Instant::now();
    h.app.step(&mut blank(), t0);
    for i in 1..=3 {
        let result = h.app.step(&mut blank(), t0 + Duration::from_millis(i * 30));
        assert_eq!(result.label, "NO HANDS");
    }
    assert_eq!(entries(&h.log), vec!["press space", "release space"]);
    assert_eq!(h.app.jump_state(), JumpState::Idle);
}

#[test]
fn detection_error_counts_as_no_hand() {
    let mut h = harness(&[], &[PEACE, FAILED, FAILED], 1, false);
    let t0 = Instant::now();
    h.app.step(&mut blank(), t0);
    for i in 1..=2 {
        let result = h.app.step(&mut blank(), t0 + Duration::from_millis(i * 30));
        assert_eq!(result.label, "NO HANDS");
    }

    assert_eq!(entries(&h.log), vec!["press space", "release space"]);
    assert_eq!(h.app.jump_state(), JumpState::Idle);
    assert_eq!(h.app.frame_count(), 3);
}

#[test]
fn flicker_inside_cooldown_presses_once() {
    let mut h = harness(&[], &[PEACE, OPEN, PEACE], 1, false);
    let t0 = Instant::now();
    h.app.step(&mut blank(), t0);
    h.app.step(&mut blank(), t0 + Duration::from_millis(40));
    h.app.step(&mut blank(), t0 + Duration::from_millis(80));

    assert_eq!(entries(&h.log), vec!["press space", "release space"]);
}

#[test]
fn read_failures_are_skipped() {
    let mut h = harness(&[false, true, false, false, true, true], &[NONE, OPEN, OPEN], 3, false);
    h.app.run().unwrap();

    assert_eq!(h.app.frame_count(), 3);
    assert_eq!(*h.shown.borrow(), 3);
    assert!(entries(&h.log).is_empty());
}

#[test]
fn quit_is_seen_while_reads_keep_failing() {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let idles = Rc::new(RefCell::new(0));
    let source = ScriptedSource {
        reads: VecDeque::new(),
        log: log.clone(),
    };
    let pipeline = Box::new(ScriptedHands {
        script: VecDeque::new(),
    });
    let injector: Box<dyn KeyInjector> = Box::new(LoggedKeys { log: log.clone() });
    let controller = JumpController::new(injector, JumpKey::Space, DEFAULT_COOLDOWN);
    let settings = LoopSettings {
        mirror: false,
        warmup: Duration::ZERO,
        read_retry_delay: Duration::from_secs(60),
    };
    let sink = ClosedWhileStalled { idles: idles.clone() };
    let mut app = App::new(source, pipeline, controller, OverlayRenderer::plain(), sink, settings);

    let started = Instant::now();
    app.run().unwrap();

    assert_eq!(*idles.borrow(), 1);
    assert_eq!(app.frame_count(), 0);
    assert!(started.elapsed() < Duration::from_secs(60));
}

#[test]
fn shutdown_releases_before_camera() {
    let mut h = harness(&[true, true], &[PEACE, PEACE], 2, false);
    h.app.run().unwrap();
    assert_eq!(h.app.jump_state(), JumpState::Jumping);

    let log = h.log.clone();
    h.app.shutdown();
    assert_eq!(
        entries(&log),
        vec!["press space", "release space", "camera released"]
    );
}

#[test]
fn shutdown_while_idle_sends_nothing() {
    let mut h = harness(&[true], &[OPEN], 1, false);
    h.app.run().unwrap();

    let log = h.log.clone();
    h.app.shutdown();
    assert_eq!(entries(&log), vec!["camera released"]);
}

#[test]
fn mirror_flips_before_rendering() {
    let mut h = harness(&[], &[NONE], 1, true);
    let mut frame = blank();
    frame.put_pixel(0, 47, Rgb([1, 2, 3]));

    h.app.step(&mut frame, Instant::now());
    assert_eq!(*frame.get_pixel(63, 47), Rgb([1, 2, 3]));
    assert_eq!(*frame.get_pixel(0, 47), Rgb([0, 0, 0]));
}
