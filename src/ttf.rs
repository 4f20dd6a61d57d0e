use rusttype::{point, Font, Scale};
use std::fs;
use std::path::Path;

pub struct FontRenderer {
    font: Font<'static>,
}

impl FontRenderer {
    pub fn try_load(family: &str) -> Option<Self> {
        // Common macOS / Linux / Windows locations, then the working directory
        let lower = family.to_lowercase();
        let paths = [
            format!("/Library/Fonts/{}.ttf", family),
            format!("/System/Library/Fonts/{}.ttf", family),
            format!("/System/Library/Fonts/Supplemental/{}.ttf", family),
            format!("/usr/share/fonts/truetype/{}.ttf", family),
            format!("/usr/share/fonts/truetype/{}/{}.ttf", lower, family),
            format!("/usr/share/fonts/TTF/{}.ttf", family),
            format!("C:\\Windows\\Fonts\\{}.ttf", lower),
            format!("{}.ttf", family),
        ];

        for p in paths.iter() {
            if !Path::new(p).exists() {
                continue;
            }
            if let Ok(data) = fs::read(p) {
                if let Some(font) = Font::try_from_vec(data) {
                    log::info!("Loaded font from {}", p);
                    return Some(Self { font });
                }
            }
        }

        log::info!("Could not find font family '{}'. Falling back to bitmap.", family);
        None
    }

    /// Draws `text` with its top-left corner at (x, y).
    pub fn draw_text(&self, buffer: &mut [u8], width: usize, height: usize, x: usize, y: usize, text: &str, color: (u8, u8, u8), size_pt: f32) {
        let scale = Scale::uniform(size_pt);
        let v_metrics = self.font.v_metrics(scale);
        let start_point = point(x as f32, y as f32 + v_metrics.ascent);

        for glyph in self.font.layout(text, scale, start_point) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, v| {
                if v < 0.2 {
                    return;
                }
                let px = bb.min.x + gx as i32;
                let py = bb.min.y + gy as i32;
                if px < 0 || py < 0 {
                    return;
                }
                let (px, py) = (px as usize, py as usize);
                if px < width && py < height {
                    let idx = (py * width + px) * 3;
                    if idx + 2 < buffer.len() {
                        // Coverage blend
                        buffer[idx] = blend(buffer[idx], color.0, v);
                        buffer[idx + 1] = blend(buffer[idx + 1], color.1, v);
                        buffer[idx + 2] = blend(buffer[idx + 2], color.2, v);
                    }
                }
            });
        }
    }
}

fn blend(dst: u8, src: u8, alpha: f32) -> u8 {
    let a = alpha.clamp(0.0, 1.0);
    (src as f32 * a + dst as f32 * (1.0 - a)).round() as u8
}
