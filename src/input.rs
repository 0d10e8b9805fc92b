//! Keyboard and mouse input.
//!
//! [`Input`] folds raw window events into per-frame state: keys pressed
//! this frame, buttons held, cursor movement and wheel lines. The app reads
//! it once per redraw, turns key presses into [`Action`]s and drags into
//! camera motion, then calls `begin_frame`.
//!
//! | Input | Effect |
//! |-------|--------|
//! | Left drag | Orbit |
//! | Right drag | Pan |
//! | Wheel | Zoom |
//! | `R` | Reset camera |
//! | `S` | Save PNG |
//! | `Space` | Toggle auto-rotate |
//! | `T` | Toggle theme |
//! | `P` | Pause simulation time |
//! | `1`-`6` | Load preset |
//! | `+` / `-` | Refine / coarsen fractal detail |
//! | `Escape` | Quit |

use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

/// Pixels per wheel line for touchpads reporting pixel deltas.
const PIXELS_PER_LINE: f32 = 100.0;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl From<WinitMouseButton> for MouseButton {
    fn from(btn: WinitMouseButton) -> Self {
        match btn {
            WinitMouseButton::Left => MouseButton::Left,
            WinitMouseButton::Right => MouseButton::Right,
            WinitMouseButton::Middle => MouseButton::Middle,
            _ => MouseButton::Left,
        }
    }
}

/// The keys the viewer responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    R,
    S,
    T,
    P,
    Space,
    Escape,
    Plus,
    Minus,
    /// Digit row `1`-`9`, `0`.
    Digit(u8),
    Other(u32),
}

impl From<WinitKeyCode> for KeyCode {
    fn from(key: WinitKeyCode) -> Self {
        match key {
            WinitKeyCode::KeyR => KeyCode::R,
            WinitKeyCode::KeyS => KeyCode::S,
            WinitKeyCode::KeyT => KeyCode::T,
            WinitKeyCode::KeyP => KeyCode::P,
            WinitKeyCode::Space => KeyCode::Space,
            WinitKeyCode::Escape => KeyCode::Escape,
            WinitKeyCode::Equal | WinitKeyCode::NumpadAdd => KeyCode::Plus,
            WinitKeyCode::Minus | WinitKeyCode::NumpadSubtract => KeyCode::Minus,

            WinitKeyCode::Digit0 | WinitKeyCode::Numpad0 => KeyCode::Digit(0),
            WinitKeyCode::Digit1 | WinitKeyCode::Numpad1 => KeyCode::Digit(1),
            WinitKeyCode::Digit2 | WinitKeyCode::Numpad2 => KeyCode::Digit(2),
            WinitKeyCode::Digit3 | WinitKeyCode::Numpad3 => KeyCode::Digit(3),
            WinitKeyCode::Digit4 | WinitKeyCode::Numpad4 => KeyCode::Digit(4),
            WinitKeyCode::Digit5 | WinitKeyCode::Numpad5 => KeyCode::Digit(5),
            WinitKeyCode::Digit6 | WinitKeyCode::Numpad6 => KeyCode::Digit(6),
            WinitKeyCode::Digit7 | WinitKeyCode::Numpad7 => KeyCode::Digit(7),
            WinitKeyCode::Digit8 | WinitKeyCode::Numpad8 => KeyCode::Digit(8),
            WinitKeyCode::Digit9 | WinitKeyCode::Numpad9 => KeyCode::Digit(9),

            _ => KeyCode::Other(key as u32),
        }
    }
}

/// A discrete command triggered by a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ResetCamera,
    SaveImage,
    ToggleAutoRotate,
    ToggleTheme,
    TogglePause,
    /// Zero-based index into the pipeline's preset list.
    LoadPreset(usize),
    RefineDetail,
    CoarsenDetail,
    Quit,
}

impl Action {
    /// The action bound to `key`, if any.
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::R => Some(Action::ResetCamera),
            KeyCode::S => Some(Action::SaveImage),
            KeyCode::Space => Some(Action::ToggleAutoRotate),
            KeyCode::T => Some(Action::ToggleTheme),
            KeyCode::P => Some(Action::TogglePause),
            KeyCode::Plus => Some(Action::RefineDetail),
            KeyCode::Minus => Some(Action::CoarsenDetail),
            KeyCode::Escape => Some(Action::Quit),
            KeyCode::Digit(d @ 1..=9) => Some(Action::LoadPreset(d as usize - 1)),
            KeyCode::Digit(_) | KeyCode::Other(_) => None,
        }
    }
}

/// Input state tracking for keyboard and mouse.
#[derive(Debug, Default)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    keys_pressed: Vec<KeyCode>,

    mouse_held: HashSet<MouseButton>,

    mouse_position: Vec2,
    mouse_delta: Vec2,
    cursor_seen: bool,

    scroll_lines: f32,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Key Queries ==========

    /// Actions for the keys pressed this frame, in press order.
    pub fn actions(&self) -> Vec<Action> {
        self.keys_pressed
            .iter()
            .filter_map(|&key| Action::from_key(key))
            .collect()
    }

    // ========== Mouse Queries ==========

    /// Check if a mouse button is currently held down.
    pub fn mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }

    /// Cursor movement since the last frame in pixels.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Wheel movement this frame in lines. Positive is away from the user.
    pub fn scroll_lines(&self) -> f32 {
        self.scroll_lines
    }

    /// Drag distance this frame while the left button is held.
    pub fn orbit_drag(&self) -> Option<Vec2> {
        self.drag(MouseButton::Left)
    }

    /// Drag distance this frame while the right button is held.
    pub fn pan_drag(&self) -> Option<Vec2> {
        self.drag(MouseButton::Right)
    }

    fn drag(&self, button: MouseButton) -> Option<Vec2> {
        (self.mouse_held(button) && self.mouse_delta != Vec2::ZERO).then_some(self.mouse_delta)
    }

    // ========== Internal Methods ==========

    /// Clear per-frame state. Call after the frame has consumed it.
    pub(crate) fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_delta = Vec2::ZERO;
        self.scroll_lines = 0.0;
    }

    /// Process a winit window event.
    pub(crate) fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(keycode) = event.physical_key {
                    self.key_event(KeyCode::from(keycode), event.state);
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let btn = MouseButton::from(*button);
                match state {
                    ElementState::Pressed => {
                        self.mouse_held.insert(btn);
                    }
                    ElementState::Released => {
                        self.mouse_held.remove(&btn);
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(Vec2::new(position.x as f32, position.y as f32));
            }

            WindowEvent::CursorLeft { .. } => {
                self.cursor_seen = false;
            }

            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_lines += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
                };
            }

            WindowEvent::Focused(false) => {
                self.keys_held.clear();
                self.mouse_held.clear();
            }

            _ => {}
        }
    }

    fn key_event(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                // No auto-repeat
                if self.keys_held.insert(key) {
                    self.keys_pressed.push(key);
                }
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
            }
        }
    }

    fn cursor_moved(&mut self, position: Vec2) {
        if self.cursor_seen {
            self.mouse_delta += position - self.mouse_position;
        }
        self.mouse_position = position;
        self.cursor_seen = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_state() {
        let mut input = Input::new();
        assert!(input.actions().is_empty());

        input.key_event(KeyCode::Space, ElementState::Pressed);
        assert_eq!(input.actions(), vec![Action::ToggleAutoRotate]);

        // After begin_frame, pressed is cleared but held remains
        input.begin_frame();
        assert!(input.actions().is_empty());
        assert!(input.keys_held.contains(&KeyCode::Space));
    }

    #[test]
    fn test_key_repeat_ignored() {
        let mut input = Input::new();
        input.key_event(KeyCode::S, ElementState::Pressed);
        input.begin_frame();
        input.key_event(KeyCode::S, ElementState::Pressed);
        assert!(input.actions().is_empty());

        input.key_event(KeyCode::S, ElementState::Released);
        input.key_event(KeyCode::S, ElementState::Pressed);
        assert_eq!(input.actions(), vec![Action::SaveImage]);
    }

    #[test]
    fn test_actions_in_press_order() {
        let mut input = Input::new();
        input.key_event(KeyCode::Digit(3), ElementState::Pressed);
        input.key_event(KeyCode::T, ElementState::Pressed);
        input.key_event(KeyCode::Other(42), ElementState::Pressed);

        assert_eq!(
            input.actions(),
            vec![Action::LoadPreset(2), Action::ToggleTheme]
        );
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(Action::from_key(KeyCode::R), Some(Action::ResetCamera));
        assert_eq!(Action::from_key(KeyCode::Digit(1)), Some(Action::LoadPreset(0)));
        assert_eq!(Action::from_key(KeyCode::Digit(0)), None);
        assert_eq!(Action::from_key(KeyCode::Plus), Some(Action::RefineDetail));
        assert_eq!(KeyCode::from(WinitKeyCode::Equal), KeyCode::Plus);
        assert_eq!(KeyCode::from(WinitKeyCode::Digit6), KeyCode::Digit(6));
    }

    #[test]
    fn test_drag_requires_button() {
        let mut input = Input::new();
        input.cursor_moved(Vec2::new(100.0, 100.0));
        input.cursor_moved(Vec2::new(110.0, 95.0));
        assert_eq!(input.mouse_delta(), Vec2::new(10.0, -5.0));
        assert_eq!(input.orbit_drag(), None);

        input.mouse_held.insert(MouseButton::Left);
        assert_eq!(input.orbit_drag(), Some(Vec2::new(10.0, -5.0)));
        assert_eq!(input.pan_drag(), None);
    }

    #[test]
    fn test_first_cursor_event_has_no_delta() {
        let mut input = Input::new();
        input.cursor_moved(Vec2::new(640.0, 360.0));
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
    }
}
