//! Status banner, instructions, frame counter and hand skeleton.

use image::{ImageBuffer, Rgb};

use crate::font;
use crate::gesture::GestureResult;
use crate::inference::HAND_CONNECTIONS;
use crate::ttf::FontRenderer;
use crate::types::HandObservation;

pub const INSTRUCTIONS: [&str; 2] = [
    "Peace sign: Raise index + middle finger",
    "Lower other fingers down",
];

const BANNER_MARGIN: u32 = 10;
const BANNER_BOTTOM: u32 = 120;
const BORDER: u32 = 3;
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const LANDMARK_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
const BONE_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

#[derive(Debug, Clone, Copy)]
enum TextSize {
    Status,
    Body,
}

pub struct OverlayRenderer {
    font: Option<FontRenderer>,
    status_pt: f32,
    text_pt: f32,
    bitmap_scale: usize,
    show_landmarks: bool,
}

impl OverlayRenderer {
    pub fn new(font: Option<FontRenderer>, status_pt: f32, text_pt: f32, bitmap_scale: usize, show_landmarks: bool) -> Self {
        Self {
            font,
            status_pt,
            text_pt,
            bitmap_scale: bitmap_scale.max(1),
            show_landmarks,
        }
    }

    /// Bitmap font only, no landmarks.
    pub fn plain() -> Self {
        Self::new(None, 36.0, 18.0, 2, false)
    }

    pub fn render(
        &self,
        frame: &mut ImageBuffer<Rgb<u8>, Vec<u8>>,
        result: &GestureResult,
        frame_count: u64,
        hand: Option<&HandObservation>,
    ) {
        if self.show_landmarks {
            if let Some(hand) = hand {
                draw_hand(frame, hand);
            }
        }

        let width = frame.width();
        if width > 2 * BANNER_MARGIN {
            let (x0, y0) = (BANNER_MARGIN, BANNER_MARGIN);
            let (x1, y1) = (width - BANNER_MARGIN, BANNER_BOTTOM);
            fill_rect(frame, x0, y0, x1, y1, BLACK);
            stroke_rect(frame, x0, y0, x1, y1, BORDER, result.color);
        }

        let (status_y, line_ys, counter_y) = match self.font {
            Some(_) => (18, [62, 86], 16),
            None => (25, [65, 85], 20),
        };

        self.draw_text(frame, 20, status_y, &result.label, result.color, TextSize::Status);
        for (text, y) in INSTRUCTIONS.iter().zip(line_ys) {
            self.draw_text(frame, 20, y, text, WHITE, TextSize::Body);
        }

        let counter_x = width.saturating_sub(150) as usize;
        let counter = format!("Frame: {}", frame_count);
        self.draw_text(frame, counter_x, counter_y, &counter, WHITE, TextSize::Body);
    }

    fn draw_text(&self, frame: &mut ImageBuffer<Rgb<u8>, Vec<u8>>, x: usize, y: usize, text: &str, color: Rgb<u8>, size: TextSize) {
        let (w, h) = (frame.width() as usize, frame.height() as usize);
        let col = (color[0], color[1], color[2]);
        let buf: &mut [u8] = &mut **frame;

        match &self.font {
            Some(fr) => {
                let pt = match size {
                    TextSize::Status => self.status_pt,
                    TextSize::Body => self.text_pt,
                };
                fr.draw_text(buf, w, h, x, y, text, col, pt);
            }
            None => {
                let scale = match size {
                    TextSize::Status => self.bitmap_scale * 2,
                    TextSize::Body => self.bitmap_scale,
                };
                font::draw_text_line(buf, w, h, x, y, text, col, scale);
            }
        }
    }
}

fn put(frame: &mut ImageBuffer<Rgb<u8>, Vec<u8>>, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < frame.width() && (y as u32) < frame.height() {
        frame.put_pixel(x as u32, y as u32, color);
    }
}

/// Inclusive corners.
pub fn fill_rect(frame: &mut ImageBuffer<Rgb<u8>, Vec<u8>>, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
    for y in y0..=y1 {
        for x in x0..=x1 {
            put(frame, x as i64, y as i64, color);
        }
    }
}

/// Border drawn inward from the inclusive corners.
pub fn stroke_rect(frame: &mut ImageBuffer<Rgb<u8>, Vec<u8>>, x0: u32, y0: u32, x1: u32, y1: u32, thickness: u32, color: Rgb<u8>) {
    for t in 0..thickness {
        let (ax, ay, bx, by) = (x0 + t, y0 + t, x1.saturating_sub(t), y1.saturating_sub(t));
        if ax > bx || ay > by {
            break;
        }
        for x in ax..=bx {
            put(frame, x as i64, ay as i64, color);
            put(frame, x as i64, by as i64, color);
        }
        for y in ay..=by {
            put(frame, ax as i64, y as i64, color);
            put(frame, bx as i64, y as i64, color);
        }
    }
}

fn draw_line(frame: &mut ImageBuffer<Rgb<u8>, Vec<u8>>, from: (f32, f32), to: (f32, f32), color: Rgb<u8>) {
    let steps = (to.0 - from.0).abs().max((to.1 - from.1).abs()).ceil().max(1.0) as usize;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let x = from.0 + (to.0 - from.0) * t;
        let y = from.1 + (to.1 - from.1) * t;
        put(frame, x as i64, y as i64, color);
    }
}

fn draw_hand(frame: &mut ImageBuffer<Rgb<u8>, Vec<u8>>, hand: &HandObservation) {
    let pts = &hand.landmarks;
    for &(a, b) in HAND_CONNECTIONS.iter() {
        if let (Some(pa), Some(pb)) = (pts.get(a), pts.get(b)) {
            draw_line(frame, (pa.x, pa.y), (pb.x, pb.y), BONE_COLOR);
        }
    }
    for p in pts {
        let (cx, cy) = (p.x as i64, p.y as i64);
        for dy in -2..=2 {
            for dx in -2..=2 {
                if dx * dx + dy * dy <= 4 {
                    put(frame, cx + dx, cy + dy, LANDMARK_COLOR);
                }
            }
        }
    }
}
