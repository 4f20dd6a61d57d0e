use crate::types::{FingerVector, HandObservation, Handedness};
use anyhow::Result;
use image::{ImageBuffer, Rgb};

/// Turns a frame into at most one hand. Implementations may keep state
/// between frames (e.g. a tracked region).
pub trait HandPipeline {
    fn name(&self) -> String;
    fn process(&mut self, frame: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> Result<Option<HandObservation>>;
}

impl<P: HandPipeline + ?Sized> HandPipeline for Box<P> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn process(&mut self, frame: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> Result<Option<HandObservation>> {
        (**self).process(frame)
    }
}

// Used when the hand models are missing or `--simulate` is passed
pub struct SimulatedHands {
    frame_count: u32,
    phase_frames: u32,
}

impl SimulatedHands {
    const SCRIPT: [Option<[u8; 5]>; 4] = [
        None,
        Some([1, 1, 1, 1, 1]),
        Some([0, 1, 1, 0, 0]),
        Some([0, 1, 0, 0, 0]),
    ];

    pub fn new(phase_frames: u32) -> Self {
        Self {
            frame_count: 0,
            phase_frames: phase_frames.max(1),
        }
    }
}

impl HandPipeline for SimulatedHands {
    fn name(&self) -> String {
        "Simulated Hands (no model)".to_string()
    }

    fn process(&mut self, _frame: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> Result<Option<HandObservation>> {
        let phase = (self.frame_count / self.phase_frames) as usize % Self::SCRIPT.len();
        self.frame_count = self.frame_count.wrapping_add(1);

        Ok(Self::SCRIPT[phase].map(|bits| HandObservation {
            landmarks: Vec::new(),
            handedness: Handedness::Right,
            score: 1.0,
            fingers: FingerVector::from_bits(bits),
        }))
    }
}
