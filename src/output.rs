use anyhow::Result;
use image::{ImageBuffer, Rgb};
use minifb::{Key, KeyRepeat};

use crate::app::FrameSink;

pub struct WindowOutput {
    window: minifb::Window,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
    quit_key: Key,
    quit: bool,
}

impl WindowOutput {
    pub fn new(title: &str, width: usize, height: usize, quit_key: Key) -> Result<Self> {
        let mut window = minifb::Window::new(
            title,
            width,
            height,
            minifb::WindowOptions {
                resize: true,
                ..minifb::WindowOptions::default()
            },
        ).map_err(|e| anyhow::anyhow!("Failed to create window: {}", e))?;

        window.set_target_fps(60);

        Ok(Self {
            window,
            buffer: vec![0; width * height],
            width,
            height,
            quit_key,
            quit: false,
        })
    }

    fn check_quit_keys(&mut self) {
        if self.window.is_key_pressed(self.quit_key, KeyRepeat::No)
            || self.window.is_key_down(Key::Escape)
        {
            self.quit = true;
        }
    }
}

impl FrameSink for WindowOutput {
    fn show(&mut self, frame: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> Result<()> {
        let target_w = frame.width() as usize;
        let target_h = frame.height() as usize;
        if target_w != self.width || target_h != self.height {
            self.width = target_w;
            self.height = target_h;
        }
        if self.buffer.len() != self.width * self.height {
            self.buffer.resize(self.width * self.height, 0);
        }

        // RGB8 -> 0RGB u32
        for (dst, pixel) in self.buffer.iter_mut().zip(frame.pixels()) {
            let r = pixel[0] as u32;
            let g = pixel[1] as u32;
            let b = pixel[2] as u32;
            *dst = (r << 16) | (g << 8) | b;
        }

        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)
            .map_err(|e| anyhow::anyhow!("Window update failed: {}", e))?;

        self.check_quit_keys();
        Ok(())
    }

    fn quit_requested(&self) -> bool {
        self.quit || !self.window.is_open()
    }

    fn idle(&mut self) -> Result<()> {
        self.window.update();
        self.check_quit_keys();
        Ok(())
    }
}

/// Maps a config key name ("q", "escape", ...) to a minifb key.
pub fn parse_quit_key(name: &str) -> Option<Key> {
    let name = name.trim().to_ascii_lowercase();
    if name == "escape" || name == "esc" {
        return Some(Key::Escape);
    }
    let mut chars = name.chars();
    let c = match (chars.next(), chars.next()) {
        (Some(c), None) => c,
        _ => return None,
    };
    let key = match c {
        'a' => Key::A, 'b' => Key::B, 'c' => Key::C, 'd' => Key::D, 'e' => Key::E,
        'f' => Key::F, 'g' => Key::G, 'h' => Key::H, 'i' => Key::I, 'j' => Key::J,
        'k' => Key::K, 'l' => Key::L, 'm' => Key::M, 'n' => Key::N, 'o' => Key::O,
        'p' => Key::P, 'q' => Key::Q, 'r' => Key::R, 's' => Key::S, 't' => Key::T,
        'u' => Key::U, 'v' => Key::V, 'w' => Key::W, 'x' => Key::X, 'y' => Key::Y,
        'z' => Key::Z,
        '0' => Key::Key0, '1' => Key::Key1, '2' => Key::Key2, '3' => Key::Key3,
        '4' => Key::Key4, '5' => Key::Key5, '6' => Key::Key6, '7' => Key::Key7,
        '8' => Key::Key8, '9' => Key::Key9,
        _ => return None,
    };
    Some(key)
}
