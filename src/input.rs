//! Keyboard state polled once per frame.

use std::collections::HashSet;

use winit::{
    event::{ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

/// Keys currently held down.
#[derive(Debug, Default, Clone)]
pub struct Input {
    pressed: HashSet<KeyCode>,
}

impl Input {
    /// Returns `true` when the event was a keyboard event.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => {
                self.set_key(*key, *state == ElementState::Pressed);
                true
            }
            WindowEvent::Focused(false) => {
                // Key releases are not delivered to unfocused windows.
                self.clear();
                false
            }
            _ => false,
        }
    }

    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.pressed.insert(key);
        } else {
            self.pressed.remove(&key);
        }
    }

    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    /// `1.0` if only `positive` is held, `-1.0` if only `negative` is held, `0.0` otherwise.
    pub fn axis(&self, positive: KeyCode, negative: KeyCode) -> f32 {
        let mut amount = 0.0;
        if self.is_pressed(positive) {
            amount += 1.0;
        }
        if self.is_pressed(negative) {
            amount -= 1.0;
        }
        amount
    }

    pub fn clear(&mut self) {
        self.pressed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_held_until_released() {
        let mut input = Input::default();
        input.set_key(KeyCode::KeyA, true);
        input.set_key(KeyCode::KeyA, true);
        assert!(input.is_pressed(KeyCode::KeyA));
        input.set_key(KeyCode::KeyA, false);
        assert!(!input.is_pressed(KeyCode::KeyA));
    }

    #[test]
    fn opposing_keys_cancel_out() {
        let mut input = Input::default();
        assert_eq!(input.axis(KeyCode::KeyW, KeyCode::KeyS), 0.0);
        input.set_key(KeyCode::KeyS, true);
        assert_eq!(input.axis(KeyCode::KeyW, KeyCode::KeyS), -1.0);
        input.set_key(KeyCode::KeyW, true);
        assert_eq!(input.axis(KeyCode::KeyW, KeyCode::KeyS), 0.0);
    }

    #[test]
    fn losing_focus_releases_everything() {
        let mut input = Input::default();
        input.set_key(KeyCode::Space, true);
        input.set_key(KeyCode::ShiftLeft, true);
        assert!(!input.handle_window_event(&WindowEvent::Focused(false)));
        assert!(!input.is_pressed(KeyCode::Space));
        assert!(!input.is_pressed(KeyCode::ShiftLeft));
    }
}
