//! Synthesized keyboard events.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use enigo::{Direction, Enigo, Keyboard, Settings};

use crate::error::{KeyError, KeyParseError};

/// The key held while the player jumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKey {
    Space,
    Up,
    Char(char),
}

impl FromStr for JumpKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() {
            return Err(KeyParseError::Empty);
        }
        match name.to_ascii_lowercase().as_str() {
            "space" => Ok(JumpKey::Space),
            "up" => Ok(JumpKey::Up),
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_control() => Ok(JumpKey::Char(c)),
                    _ => Err(KeyParseError::Unknown(name.to_string())),
                }
            }
        }
    }
}

impl fmt::Display for JumpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JumpKey::Space => write!(f, "space"),
            JumpKey::Up => write!(f, "up"),
            JumpKey::Char(c) => write!(f, "{}", c),
        }
    }
}

impl From<JumpKey> for enigo::Key {
    fn from(key: JumpKey) -> Self {
        match key {
            JumpKey::Space => enigo::Key::Space,
            JumpKey::Up => enigo::Key::UpArrow,
            JumpKey::Char(c) => enigo::Key::Unicode(c),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Press(JumpKey),
    Release(JumpKey),
}

/// Simulates physical key presses for whatever window has input focus.
pub trait KeyInjector {
    fn press(&mut self, key: JumpKey) -> Result<(), KeyError>;
    fn release(&mut self, key: JumpKey) -> Result<(), KeyError>;
}

impl<K: KeyInjector + ?Sized> KeyInjector for Box<K> {
    fn press(&mut self, key: JumpKey) -> Result<(), KeyError> {
        (**self).press(key)
    }

    fn release(&mut self, key: JumpKey) -> Result<(), KeyError> {
        (**self).release(key)
    }
}

pub struct EnigoInjector {
    enigo: Enigo,
}

impl EnigoInjector {
    pub fn new() -> Result<Self, KeyError> {
        let enigo =
            Enigo::new(&Settings::default()).map_err(|e| KeyError::Backend(e.to_string()))?;
        Ok(Self { enigo })
    }

    fn send(&mut self, key: JumpKey, direction: Direction) -> Result<(), KeyError> {
        self.enigo
            .key(key.into(), direction)
            .map_err(|e| KeyError::Inject {
                action: match direction {
                    Direction::Release => "release",
                    _ => "press",
                },
                key: key.to_string(),
                message: e.to_string(),
            })
    }
}

impl KeyInjector for EnigoInjector {
    fn press(&mut self, key: JumpKey) -> Result<(), KeyError> {
        self.send(key, Direction::Press)
    }

    fn release(&mut self, key: JumpKey) -> Result<(), KeyError> {
        self.send(key, Direction::Release)
    }
}

/// Records events instead of touching the OS. Used by `--dry-run`.
///
/// Clones share the same log, so a clone kept outside the controller still
/// sees the events after the controller is gone.
#[derive(Debug, Clone, Default)]
pub struct RecordingInjector {
    events: Rc<RefCell<Vec<KeyEvent>>>,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<KeyEvent> {
        self.events.borrow().clone()
    }

    pub fn presses(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, KeyEvent::Press(_)))
            .count()
    }

    pub fn releases(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, KeyEvent::Release(_)))
            .count()
    }
}

impl KeyInjector for RecordingInjector {
    fn press(&mut self, key: JumpKey) -> Result<(), KeyError> {
        log::debug!("[dry-run] press {}", key);
        self.events.borrow_mut().push(KeyEvent::Press(key));
        Ok(())
    }

    fn release(&mut self, key: JumpKey) -> Result<(), KeyError> {
        log::debug!("[dry-run] release {}", key);
        self.events.borrow_mut().push(KeyEvent::Release(key));
        Ok(())
    }
}
