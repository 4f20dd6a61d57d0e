use crate::types::Rect;
use anyhow::{anyhow, Result};
use image::{imageops::FilterType, ImageBuffer, Rgb};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;

const INPUT_SIZE: u32 = 192;
const VALUES_PER_ANCHOR: usize = 18; // box (4) + 7 palm keypoints (14)

/// SSD palm detector (MediaPipe palm_detection, 192x192 NHWC input).
pub struct PalmDetector {
    session: Session,
    anchors: Vec<(f32, f32)>, // cx, cy (normalized; anchors are fixed size 1x1)
    min_confidence: f32,
}

impl PalmDetector {
    pub fn new(model_path: &str, min_confidence: f32) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .with_execution_providers([
                ort::execution_providers::CoreMLExecutionProvider::default().build(),
                ort::execution_providers::CPUExecutionProvider::default().build(),
            ])?
            .commit_from_file(model_path)?;

        let anchors = generate_anchors(INPUT_SIZE as usize);
        Ok(Self {
            session,
            anchors,
            min_confidence,
        })
    }

    /// Best palm box in frame pixels, if any clears the confidence threshold.
    pub fn detect(&mut self, frame: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> Result<Option<Rect>> {
        let resized = image::imageops::resize(frame, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

        // NHWC [1, 192, 192, 3], 0..1
        let mut input_data = Vec::with_capacity((INPUT_SIZE * INPUT_SIZE * 3) as usize);
        for pixel in resized.pixels() {
            input_data.push(pixel[0] as f32 / 255.0);
            input_data.push(pixel[1] as f32 / 255.0);
            input_data.push(pixel[2] as f32 / 255.0);
        }

        let input_tensor = Tensor::from_array((vec![1, 192, 192, 3], input_data))?;
        let outputs = self.session.run(ort::inputs![input_tensor])?;
        if outputs.len() < 2 {
            return Err(anyhow!(
                "Palm detector returned {} output(s), expected boxes and scores",
                outputs.len()
            ));
        }

        let (_, first) = outputs[0].try_extract_tensor::<f32>()?;
        let (_, second) = outputs[1].try_extract_tensor::<f32>()?;
        let (boxes_raw, scores_raw) = split_outputs(first, second, self.anchors.len())?;

        let best = PalmDetector::post_process(&self.anchors, scores_raw, boxes_raw, self.min_confidence);

        Ok(best.map(|(rect, _score)| {
            let sx = frame.width() as f32;
            let sy = frame.height() as f32;
            Rect::new(rect.x * sx, rect.y * sy, rect.width * sx, rect.height * sy)
        }))
    }

    /// Highest scoring box in normalized coordinates.
    fn post_process(
        anchors: &[(f32, f32)],
        scores_raw: &[f32],
        boxes_raw: &[f32],
        threshold: f32,
    ) -> Option<(Rect, f32)> {
        let scale = INPUT_SIZE as f32;
        let mut best: Option<(Rect, f32)> = None;

        for (i, &(ax, ay)) in anchors.iter().enumerate() {
            let score = sigmoid(scores_raw[i].clamp(-100.0, 100.0));
            if score < threshold || best.is_some_and(|(_, s)| score <= s) {
                continue;
            }

            let raw = &boxes_raw[i * VALUES_PER_ANCHOR..i * VALUES_PER_ANCHOR + 4];
            let cx = raw[0] / scale + ax;
            let cy = raw[1] / scale + ay;
            let w = raw[2] / scale;
            let h = raw[3] / scale;

            best = Some((Rect::new(cx - w / 2.0, cy - h / 2.0, w, h), score));
        }

        best
    }
}

/// Orders the two raw outputs as (boxes, scores); exports differ in which comes first.
fn split_outputs<'a>(first: &'a [f32], second: &'a [f32], anchors: usize) -> Result<(&'a [f32], &'a [f32])> {
    let (boxes_raw, scores_raw) = if first.len() == anchors * VALUES_PER_ANCHOR {
        (first, second)
    } else {
        (second, first)
    };
    if boxes_raw.len() != anchors * VALUES_PER_ANCHOR || scores_raw.len() != anchors {
        return Err(anyhow!(
            "Unexpected palm detector output sizes: {} and {}",
            boxes_raw.len(),
            scores_raw.len()
        ));
    }
    Ok((boxes_raw, scores_raw))
}

pub(crate) fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

fn generate_anchors(input_size: usize) -> Vec<(f32, f32)> {
    // Palm SSD: 4 layers, consecutive layers with the same stride share a grid.
    // Each layer adds two anchors per cell (aspect 1.0 plus the interpolated scale).
    let strides = [8, 16, 16, 16];
    let mut anchors = Vec::new();

    let mut layer = 0;
    while layer < strides.len() {
        let stride = strides[layer];
        let mut per_cell = 0;
        while layer < strides.len() && strides[layer] == stride {
            per_cell += 2;
            layer += 1;
        }

        let grid = (input_size as f32 / stride as f32).ceil() as usize;
        for y in 0..grid {
            for x in 0..grid {
                let cx = (x as f32 + 0.5) / grid as f32;
                let cy = (y as f32 + 0.5) / grid as f32;
                for _ in 0..per_cell {
                    anchors.push((cx, cy));
                }
            }
        }
    }
    anchors
}
