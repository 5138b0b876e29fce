//! Keyboard state tracking with both level-triggered and edge-triggered queries.
//!
//! - **Level-triggered (held):** `is_held(key)` is true every tick the key is
//!   physically down. Movement reads only this.
//!
//! - **Edge-triggered (just_pressed / just_released):** true only during the
//!   frame the transition happened, cleared by `end_frame()`. Engine commands
//!   (reset, pause, quit) read these so a held key fires once.
//!
//! `clear()` drops everything. The app calls it when the window loses focus:
//! the key-up for a key held at that moment is never delivered, and without
//! the reset the key would stay "held" forever.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Escape,
    R,
    P,
}

impl Key {
    /// The four movement keys in the order the actor evaluates them.
    pub const ARROWS: [Key; 4] = [Key::Left, Key::Right, Key::Up, Key::Down];

    /// Map a platform key identifier (`"ArrowLeft"`, `"Escape"`, ...) to a key.
    pub fn from_name(name: &str) -> Option<Key> {
        match name {
            "ArrowLeft" => Some(Key::Left),
            "ArrowRight" => Some(Key::Right),
            "ArrowUp" => Some(Key::Up),
            "ArrowDown" => Some(Key::Down),
            "Escape" => Some(Key::Escape),
            "r" | "R" | "KeyR" => Some(Key::R),
            "p" | "P" | "KeyP" => Some(Key::P),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    just_released: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(&key) {
            self.just_released.insert(key);
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(&key)
    }

    pub fn any_held(&self) -> bool {
        !self.held.is_empty()
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }

    /// Forget every key, held or transient.
    pub fn clear(&mut self) {
        if !self.held.is_empty() {
            log::debug!("Input cleared with {} key(s) still held", self.held.len());
        }
        self.held.clear();
        self.just_pressed.clear();
        self.just_released.clear();
    }
}
