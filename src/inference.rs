use anyhow::{anyhow, Result};
use image::{imageops::FilterType, ImageBuffer, Rgb};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;

use crate::detector::{sigmoid, PalmDetector};
use crate::pipeline::HandPipeline;
use crate::types::{FingerVector, HandObservation, Handedness, Point3D, Rect};

const INPUT_SIZE: u32 = 224;
pub const NUM_LANDMARKS: usize = 21;

/// Fingertip landmark ids, thumb to pinky.
pub const TIP_IDS: [usize; 5] = [4, 8, 12, 16, 20];

/// Bones drawn by the overlay.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1), (1, 2), (2, 3), (3, 4),
    (0, 5), (5, 6), (6, 7), (7, 8),
    (5, 9), (9, 10), (10, 11), (11, 12),
    (9, 13), (13, 14), (14, 15), (15, 16),
    (13, 17), (17, 18), (18, 19), (19, 20),
    (0, 17),
];

/// Palm box -> landmark crop
const PALM_ROI_SCALE: f32 = 2.6;
const PALM_ROI_SHIFT_Y: f32 = -0.5;
/// Previous landmarks -> next frame's crop
const TRACK_ROI_SCALE: f32 = 2.0;
const TRACK_ROI_SHIFT_Y: f32 = -0.1;

/// Palm detection + hand landmark regression.
///
/// The palm detector only runs when there is no region carried over from
/// the previous frame's landmarks. Without a palm model the whole frame is
/// fed to the landmark model, which works when the hand fills the view.
pub struct HandLandmarkPipeline {
    landmark_session: Session,
    detector: Option<PalmDetector>,
    tracked_roi: Option<Rect>,
    min_presence: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct RawHand {
    landmarks: Vec<Point3D>, // model input pixels (0..224)
    presence: f32,
    handedness: f32, // > 0.5 means the model saw a right hand
}

impl HandLandmarkPipeline {
    pub fn new(
        landmark_path: &str,
        detector_path: &str,
        min_detection: f32,
        min_presence: f32,
    ) -> Result<Self> {
        let detector = if Path::new(detector_path).exists() {
            log::info!("Loading palm detector from {}...", detector_path);
            Some(PalmDetector::new(detector_path, min_detection)?)
        } else {
            log::warn!("Palm detector not found at {}. Using the full frame.", detector_path);
            None
        };

        log::info!("Loading hand landmarks from {}...", landmark_path);
        let landmark_session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .with_execution_providers([
                ort::execution_providers::CoreMLExecutionProvider::default().build(),
                ort::execution_providers::CPUExecutionProvider::default().build(),
            ])?
            .commit_from_file(landmark_path)?;

        Ok(Self {
            landmark_session,
            detector,
            tracked_roi: None,
            min_presence,
        })
    }

    fn find_roi(&mut self, frame: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> Result<Option<Rect>> {
        if let Some(roi) = self.tracked_roi {
            return Ok(Some(roi));
        }
        match &mut self.detector {
            Some(det) => Ok(det
                .detect(frame)?
                .map(|palm| palm.to_square(PALM_ROI_SCALE, PALM_ROI_SHIFT_Y))),
            None => {
                let (w, h) = (frame.width() as f32, frame.height() as f32);
                Ok(Some(Rect::new(0.0, 0.0, w, h)))
            }
        }
    }

    fn run_landmarks(&mut self, crop: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> Result<Vec<Vec<f32>>> {
        let resized = image::imageops::resize(crop, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
        let mut input_data = Vec::with_capacity((INPUT_SIZE * INPUT_SIZE * 3) as usize);
        for pixel in resized.pixels() {
            input_data.push(pixel[0] as f32 / 255.0);
            input_data.push(pixel[1] as f32 / 255.0);
            input_data.push(pixel[2] as f32 / 255.0);
        }

        let num_outputs = self.landmark_session.outputs.len();
        let input = ort::value::Tensor::from_array((vec![1, 224, 224, 3], input_data))?;
        let outputs = self.landmark_session.run(ort::inputs![input])?;

        let mut tensors = Vec::with_capacity(num_outputs);
        for i in 0..num_outputs {
            let (_shape, data) = outputs[i].try_extract_tensor::<f32>()?;
            tensors.push(data.to_vec());
        }
        Ok(tensors)
    }
}

impl HandPipeline for HandLandmarkPipeline {
    fn name(&self) -> String {
        if self.detector.is_some() {
            "Hand Landmarks (palm detection + 21 pts)".to_string()
        } else {
            "Hand Landmarks (full frame, 21 pts)".to_string()
        }
    }

    fn process(&mut self, frame: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> Result<Option<HandObservation>> {
        let roi = match self.find_roi(frame)? {
            Some(roi) => roi,
            None => return Ok(None),
        };
        let roi = match roi.clip(frame.width(), frame.height()) {
            Some(r) => r,
            None => {
                self.tracked_roi = None;
                return Ok(None);
            }
        };

        let crop = image::imageops::crop_imm(
            frame,
            roi.x as u32,
            roi.y as u32,
            roi.width as u32,
            roi.height as u32,
        )
        .to_image();

        let tensors = self.run_landmarks(&crop)?;
        let raw = parse_landmark_outputs(&tensors)
            .ok_or_else(|| anyhow!("Hand landmark model returned no 21-point output"))?;

        if raw.presence < self.min_presence {
            self.tracked_roi = None;
            return Ok(None);
        }

        let sx = roi.width / INPUT_SIZE as f32;
        let sy = roi.height / INPUT_SIZE as f32;
        let landmarks: Vec<Point3D> = raw
            .landmarks
            .iter()
            .map(|p| Point3D::new(roi.x + p.x * sx, roi.y + p.y * sy, p.z))
            .collect();

        self.tracked_roi =
            Rect::bounding(&landmarks).map(|b| b.to_square(TRACK_ROI_SCALE, TRACK_ROI_SHIFT_Y));

        // The model labels hands as seen in a selfie view; report the other side.
        let model_side = if raw.handedness > 0.5 {
            Handedness::Right
        } else {
            Handedness::Left
        };
        let handedness = model_side.flipped();
        let fingers = fingers_up(&landmarks, handedness);

        Ok(Some(HandObservation {
            landmarks,
            handedness,
            score: raw.presence,
            fingers,
        }))
    }
}

/// Picks the 63-value landmark tensor and the scalar presence/handedness
/// outputs, in model output order.
fn parse_landmark_outputs(tensors: &[Vec<f32>]) -> Option<RawHand> {
    let coords = tensors.iter().find(|t| t.len() == NUM_LANDMARKS * 3)?;
    let mut scalars = tensors.iter().filter(|t| t.len() == 1).map(|t| t[0]);
    let presence = as_probability(scalars.next()?);
    let handedness = scalars.next().map(as_probability).unwrap_or(1.0);

    let landmarks = coords
        .chunks_exact(3)
        .map(|c| Point3D::new(c[0], c[1], c[2]))
        .collect();

    Some(RawHand {
        landmarks,
        presence,
        handedness,
    })
}

// Some exports already apply the sigmoid, some emit logits
fn as_probability(v: f32) -> f32 {
    if (0.0..=1.0).contains(&v) {
        v
    } else {
        sigmoid(v)
    }
}

/// Finger extension from 21 landmarks (image coordinates, y grows down).
///
/// Index..pinky are up when the tip is above the joint two ids below it.
/// The thumb compares tip and IP joint along x, direction depending on the
/// hand's side.
pub fn fingers_up(landmarks: &[Point3D], handedness: Handedness) -> FingerVector {
    if landmarks.len() < NUM_LANDMARKS {
        return FingerVector::default();
    }

    let mut extended = [false; 5];

    let thumb_tip = landmarks[TIP_IDS[0]].x;
    let thumb_ip = landmarks[TIP_IDS[0] - 1].x;
    extended[0] = match handedness {
        Handedness::Right => thumb_tip > thumb_ip,
        Handedness::Left => thumb_tip < thumb_ip,
    };

    for finger in 1..5 {
        let tip = TIP_IDS[finger];
        extended[finger] = landmarks[tip].y < landmarks[tip - 2].y;
    }

    FingerVector::new(extended)
}
