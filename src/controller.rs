//! Idle/Jumping state machine that owns the key injector.
//!
//! The key is pressed on entry to `Jumping` and released on every path back
//! to `Idle`, including shutdown and drop, so the OS never sees a key held
//! after the controller thinks it has let go.

use std::time::{Duration, Instant};

use crate::gesture::{Gesture, JumpRequest};
use crate::keys::{JumpKey, KeyInjector};

pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpState {
    Idle,
    Jumping,
}

pub struct JumpController<K: KeyInjector> {
    injector: K,
    key: JumpKey,
    cooldown: Duration,
    state: JumpState,
    last_action: Option<Instant>,
}

impl<K: KeyInjector> JumpController<K> {
    pub fn new(injector: K, key: JumpKey, cooldown: Duration) -> Self {
        Self {
            injector,
            key,
            cooldown,
            state: JumpState::Idle,
            last_action: None,
        }
    }

    pub fn state(&self) -> JumpState {
        self.state
    }

    pub fn is_jumping(&self) -> bool {
        self.state == JumpState::Jumping
    }

    /// Drive the machine from this frame's gesture. Returns the new state.
    pub fn handle(&mut self, gesture: Gesture, now: Instant) -> JumpState {
        self.apply(gesture.jump_request(), now)
    }

    pub fn apply(&mut self, request: JumpRequest, now: Instant) -> JumpState {
        match (self.state, request) {
            (JumpState::Idle, JumpRequest::Trigger) if self.cooldown_elapsed(now) => {
                self.trigger(now);
            }
            (JumpState::Jumping, JumpRequest::Release) => self.release(),
            _ => {}
        }
        self.state
    }

    /// Release a held jump. Called once on the way out.
    pub fn shutdown(mut self) {
        if self.is_jumping() {
            self.release();
        }
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        match self.last_action {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.cooldown,
        }
    }

    fn trigger(&mut self, now: Instant) {
        if let Err(e) = self.injector.press(self.key) {
            log::warn!("{}", e);
        }
        self.state = JumpState::Jumping;
        self.last_action = Some(now);
    }

    fn release(&mut self) {
        if let Err(e) = self.injector.release(self.key) {
            log::warn!("{}", e);
        }
        self.state = JumpState::Idle;
    }
}

impl<K: KeyInjector> Drop for JumpController<K> {
    fn drop(&mut self) {
        if self.is_jumping() {
            self.release();
        }
    }
}
