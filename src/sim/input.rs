//! Input normalization
//!
//! Keyboard, pointer/touch and the on-screen virtual pad all feed one
//! [`Intent`] per tick. Held actions are OR-combined across sources; one-shot
//! actions (jump, pause, start, restart) are edge-triggered and consumed by
//! [`InputController::poll`].

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use crate::consts::*;

/// Keys the game listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    A,
    D,
    W,
    Shift,
    Space,
    Enter,
    Escape,
    P,
    R,
}

impl Key {
    /// Map a DOM `KeyboardEvent.code` to a game key
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ArrowLeft" => Some(Key::ArrowLeft),
            "ArrowRight" => Some(Key::ArrowRight),
            "ArrowUp" => Some(Key::ArrowUp),
            "KeyA" => Some(Key::A),
            "KeyD" => Some(Key::D),
            "KeyW" => Some(Key::W),
            "ShiftLeft" | "ShiftRight" => Some(Key::Shift),
            "Space" => Some(Key::Space),
            "Enter" | "NumpadEnter" => Some(Key::Enter),
            "Escape" => Some(Key::Escape),
            "KeyP" => Some(Key::P),
            "KeyR" => Some(Key::R),
            _ => None,
        }
    }
}

/// On-screen virtual pad buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PadButton {
    Left,
    Right,
    Fast,
    Jump,
    Pause,
}

/// Default pad layout in field coordinates
pub fn default_pad_layout() -> Vec<(PadButton, Rect)> {
    let size = 64.0;
    let y = FIELD_HEIGHT - size - 16.0;
    vec![
        (PadButton::Left, Rect::new(16.0, y, size, size)),
        (PadButton::Right, Rect::new(96.0, y, size, size)),
        (PadButton::Fast, Rect::new(176.0, y, size, size)),
        (PadButton::Jump, Rect::new(FIELD_WIDTH - size - 16.0, y, size, size)),
        (PadButton::Pause, Rect::new(FIELD_WIDTH - size - 16.0, 16.0, size, 40.0)),
    ]
}

/// Normalized per-tick intent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub move_left: bool,
    pub move_right: bool,
    pub fast_move: bool,
    pub jump_requested: bool,
    pub pause_requested: bool,
    pub start_requested: bool,
    pub restart_requested: bool,
}

impl Intent {
    /// Horizontal direction: -1, 0 or 1 (opposite directions cancel)
    pub fn horizontal(&self) -> f32 {
        match (self.move_left, self.move_right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

/// Session facts that change how raw input is read
#[derive(Debug, Clone, Copy, Default)]
pub struct InputContext {
    pub started: bool,
    pub game_over: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputController {
    keys_down: BTreeSet<Key>,
    /// Keys pressed since the last poll
    pressed: Vec<Key>,
    pad_visible: bool,
    pad_layout: Vec<(PadButton, Rect)>,
    /// Pointer id -> pad button it is holding
    pad_held: BTreeMap<u32, PadButton>,
    /// Pad buttons pressed since the last poll
    pad_pressed: Vec<PadButton>,
    /// A pointer went down outside every active control
    tapped: bool,
}

impl Default for InputController {
    fn default() -> Self {
        Self::new(default_pad_layout())
    }
}

impl InputController {
    pub fn new(pad_layout: Vec<(PadButton, Rect)>) -> Self {
        Self {
            keys_down: BTreeSet::new(),
            pressed: Vec::new(),
            pad_visible: false,
            pad_layout,
            pad_held: BTreeMap::new(),
            pad_pressed: Vec::new(),
            tapped: false,
        }
    }

    pub fn key_down(&mut self, key: Key) {
        // Auto-repeat keydowns are not new presses
        if self.keys_down.insert(key) {
            self.pressed.push(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        self.keys_down.remove(&key);
    }

    /// Release every held key (window blur)
    pub fn release_keys(&mut self) {
        self.keys_down.clear();
    }

    pub fn is_pad_visible(&self) -> bool {
        self.pad_visible
    }

    /// Show or hide the virtual pad; hidden buttons stop producing input
    pub fn set_virtual_pad_visible(&mut self, visible: bool) {
        if self.pad_visible == visible {
            return;
        }
        self.pad_visible = visible;
        if !visible {
            self.pad_held.clear();
            self.pad_pressed.clear();
        }
        log::debug!("Virtual pad {}", if visible { "shown" } else { "hidden" });
    }

    /// Which visible pad button, if any, covers `pos`
    pub fn pad_button_at(&self, pos: Vec2) -> Option<PadButton> {
        if !self.pad_visible {
            return None;
        }
        self.pad_layout
            .iter()
            .find(|(_, rect)| rect.contains_point(pos))
            .map(|(button, _)| *button)
    }

    pub fn pointer_down(&mut self, pointer_id: u32, pos: Vec2) {
        match self.pad_button_at(pos) {
            Some(button) => {
                self.pad_held.insert(pointer_id, button);
                self.pad_pressed.push(button);
            }
            None => self.tapped = true,
        }
    }

    pub fn pointer_up(&mut self, pointer_id: u32) {
        self.pad_held.remove(&pointer_id);
    }

    fn pad_holding(&self, button: PadButton) -> bool {
        self.pad_held.values().any(|b| *b == button)
    }

    fn key_held(&self, keys: &[Key]) -> bool {
        keys.iter().any(|k| self.keys_down.contains(k))
    }

    fn key_pressed(&self, keys: &[Key]) -> bool {
        self.pressed.iter().any(|k| keys.contains(k))
    }

    fn pad_was_pressed(&self, button: PadButton) -> bool {
        self.pad_pressed.contains(&button)
    }

    /// Merge all sources into this tick's intent and consume one-shot presses
    pub fn poll(&mut self, ctx: InputContext) -> Intent {
        let playing = ctx.started && !ctx.game_over;

        let intent = Intent {
            move_left: self.key_held(&[Key::ArrowLeft, Key::A]) || self.pad_holding(PadButton::Left),
            move_right: self.key_held(&[Key::ArrowRight, Key::D])
                || self.pad_holding(PadButton::Right),
            fast_move: self.key_held(&[Key::Shift]) || self.pad_holding(PadButton::Fast),
            jump_requested: playing
                && (self.key_pressed(&[Key::Space, Key::ArrowUp, Key::W])
                    || self.pad_was_pressed(PadButton::Jump)),
            pause_requested: playing
                && (self.key_pressed(&[Key::Escape, Key::P])
                    || self.pad_was_pressed(PadButton::Pause)),
            start_requested: !ctx.started
                && (self.key_pressed(&[Key::Enter, Key::Space]) || self.tapped),
            restart_requested: ctx.game_over
                && (self.key_pressed(&[Key::R, Key::Enter]) || self.tapped),
        };

        self.pressed.clear();
        self.pad_pressed.clear();
        self.tapped = false;
        intent
    }

    /// Forget every press and hold (restart)
    pub fn reset_transient(&mut self) {
        self.keys_down.clear();
        self.pressed.clear();
        self.pad_held.clear();
        self.pad_pressed.clear();
        self.tapped = false;
    }

    pub fn has_transient_state(&self) -> bool {
        !self.keys_down.is_empty()
            || !self.pressed.is_empty()
            || !self.pad_held.is_empty()
            || !self.pad_pressed.is_empty()
            || self.tapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYING: InputContext = InputContext {
        started: true,
        game_over: false,
    };

    fn pad_center(button: PadButton) -> Vec2 {
        default_pad_layout()
            .into_iter()
            .find(|(b, _)| *b == button)
            .map(|(_, r)| r.center())
            .expect("button in layout")
    }

    #[test]
    fn test_key_codes() {
        assert_eq!(Key::from_code("KeyA"), Some(Key::A));
        assert_eq!(Key::from_code("ShiftRight"), Some(Key::Shift));
        assert_eq!(Key::from_code("KeyZ"), None);
    }

    #[test]
    fn test_sources_are_or_combined() {
        let mut input = InputController::default();
        input.set_virtual_pad_visible(true);
        input.key_down(Key::A);
        input.pointer_down(1, pad_center(PadButton::Left));
        assert!(input.poll(PLAYING).move_left);

        // Releasing one source keeps the action alive through the other
        input.key_up(Key::A);
        assert!(input.poll(PLAYING).move_left);
        input.pointer_up(1);
        assert!(!input.poll(PLAYING).move_left);

        input.key_down(Key::ArrowLeft);
        input.key_down(Key::A);
        input.key_up(Key::ArrowLeft);
        assert!(input.poll(PLAYING).move_left);
    }

    #[test]
    fn test_opposite_directions_cancel() {
        let mut input = InputController::default();
        input.key_down(Key::ArrowLeft);
        input.key_down(Key::D);
        let intent = input.poll(PLAYING);
        assert_eq!(intent.horizontal(), 0.0);
    }

    #[test]
    fn test_one_shots_are_edge_triggered() {
        let mut input = InputController::default();
        input.key_down(Key::Space);
        input.key_down(Key::Space); // auto-repeat
        assert!(input.poll(PLAYING).jump_requested);
        assert!(!input.poll(PLAYING).jump_requested);

        input.key_up(Key::Space);
        input.key_down(Key::Space);
        assert!(input.poll(PLAYING).jump_requested);
    }

    #[test]
    fn test_tap_starts_only_before_start() {
        let mut input = InputController::default();
        input.pointer_down(1, Vec2::new(400.0, 300.0));
        assert!(input.poll(InputContext::default()).start_requested);

        input.pointer_down(1, Vec2::new(400.0, 300.0));
        let intent = input.poll(PLAYING);
        assert!(!intent.start_requested);
        assert!(!intent.jump_requested);
    }

    #[test]
    fn test_space_means_start_then_jump() {
        let mut input = InputController::default();
        input.key_down(Key::Space);
        let intent = input.poll(InputContext::default());
        assert!(intent.start_requested);
        assert!(!intent.jump_requested);
    }

    #[test]
    fn test_restart_only_when_game_over() {
        let mut input = InputController::default();
        input.key_down(Key::R);
        assert!(!input.poll(PLAYING).restart_requested);

        input.key_up(Key::R);
        input.key_down(Key::R);
        let over = InputContext {
            started: true,
            game_over: true,
        };
        let intent = input.poll(over);
        assert!(intent.restart_requested);
        assert!(!intent.pause_requested);
    }

    #[test]
    fn test_hidden_pad_is_not_interactive() {
        let mut input = InputController::default();
        input.set_virtual_pad_visible(true);
        input.pointer_down(7, pad_center(PadButton::Right));
        assert!(input.poll(PLAYING).move_right);

        // Hiding releases the held button
        input.set_virtual_pad_visible(false);
        assert!(!input.poll(PLAYING).move_right);

        // Hidden regions behave like the rest of the screen
        input.pointer_down(8, pad_center(PadButton::Right));
        let intent = input.poll(InputContext::default());
        assert!(!intent.move_right);
        assert!(intent.start_requested);
    }

    #[test]
    fn test_pad_jump_and_pause() {
        let mut input = InputController::default();
        input.set_virtual_pad_visible(true);
        input.pointer_down(1, pad_center(PadButton::Jump));
        input.pointer_down(2, pad_center(PadButton::Pause));
        input.pointer_down(3, pad_center(PadButton::Fast));
        let intent = input.poll(PLAYING);
        assert!(intent.jump_requested);
        assert!(intent.pause_requested);
        assert!(intent.fast_move);
        assert!(!intent.start_requested);
    }

    #[test]
    fn test_reset_transient() {
        let mut input = InputController::default();
        input.set_virtual_pad_visible(true);
        input.key_down(Key::Shift);
        input.pointer_down(1, pad_center(PadButton::Left));
        input.pointer_down(2, Vec2::new(400.0, 200.0));
        assert!(input.has_transient_state());

        input.reset_transient();
        assert!(!input.has_transient_state());
        assert_eq!(input.poll(PLAYING), Intent::default());
        assert!(input.is_pad_visible());
    }
}
