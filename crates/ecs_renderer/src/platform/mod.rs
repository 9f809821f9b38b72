//! Host collaborator interfaces
//!
//! Window/context creation and input polling belong to the host
//! application. The engine only sees the [`HostWindow`] and [`InputState`]
//! traits; [`HeadlessWindow`] and [`InputManager`] are in-process
//! implementations for tests, tools and the demo.

use std::collections::HashSet;

use crate::foundation::math::Vec2;

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A key
    A,
    /// D key
    D,
    /// E key
    E,
    /// Q key
    Q,
    /// S key
    S,
    /// W key
    W,
    /// Space key
    Space,
    /// Left shift
    LeftShift,
    /// Escape key
    Escape,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button
    Middle,
}

/// Input snapshot read by systems during a frame
pub trait InputState {
    /// Whether a key is held
    fn is_key_down(&self, key: KeyCode) -> bool;

    /// Whether a mouse button is held
    fn is_mouse_button_down(&self, button: MouseButton) -> bool;

    /// Cursor position in window pixels
    fn mouse_position(&self) -> Vec2;
}

/// Input state fed by host events
#[derive(Debug, Clone, Default)]
pub struct InputManager {
    keys: HashSet<KeyCode>,
    buttons: HashSet<MouseButton>,
    mouse: Vec2,
}

impl InputManager {
    /// Create a new input manager with nothing pressed
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle key input
    pub fn handle_key_input(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.keys.insert(key);
        } else {
            self.keys.remove(&key);
        }
    }

    /// Handle mouse button input
    pub fn handle_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            self.buttons.insert(button);
        } else {
            self.buttons.remove(&button);
        }
    }

    /// Handle mouse movement
    pub fn handle_mouse_move(&mut self, x: f32, y: f32) {
        self.mouse = Vec2::new(x, y);
    }

    /// Release everything
    pub fn reset(&mut self) {
        self.keys.clear();
        self.buttons.clear();
    }
}

impl InputState for InputManager {
    fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    fn is_mouse_button_down(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    fn mouse_position(&self) -> Vec2 {
        self.mouse
    }
}

/// Window and context owned by the host
pub trait HostWindow {
    /// Pump pending window and input events
    fn poll_events(&mut self);

    /// Present the finished frame
    fn swap_buffers(&mut self);

    /// Whether the host asked to close
    fn should_close(&self) -> bool;

    /// Framebuffer size in pixels
    fn size(&self) -> (u32, u32);

    /// Seconds since the previous call
    fn delta_time(&mut self) -> f32;

    /// Input state after the last `poll_events`
    fn input(&self) -> &dyn InputState;
}

/// Window without a display: fixed time step, closes after a frame budget
#[derive(Debug, Clone)]
pub struct HeadlessWindow {
    size: (u32, u32),
    time_step: f32,
    frames_left: u64,
    presented: u64,
    input: InputManager,
}

impl HeadlessWindow {
    /// Window that runs `frames` frames of `time_step` seconds
    pub fn new(size: (u32, u32), time_step: f32, frames: u64) -> Self {
        Self {
            size,
            time_step,
            frames_left: frames,
            presented: 0,
            input: InputManager::new(),
        }
    }

    /// Scripted input
    pub fn input_mut(&mut self) -> &mut InputManager {
        &mut self.input
    }

    /// Frames presented so far
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl HostWindow for HeadlessWindow {
    fn poll_events(&mut self) {}

    fn swap_buffers(&mut self) {
        self.presented += 1;
        self.frames_left = self.frames_left.saturating_sub(1);
    }

    fn should_close(&self) -> bool {
        self.frames_left == 0
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn delta_time(&mut self) -> f32 {
        self.time_step
    }

    fn input(&self) -> &dyn InputState {
        &self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_manager_tracks_presses() {
        let mut input = InputManager::new();
        input.handle_key_input(KeyCode::W, true);
        input.handle_mouse_button(MouseButton::Right, true);
        input.handle_mouse_move(10.0, 20.0);
        assert!(input.is_key_down(KeyCode::W));
        assert!(input.is_mouse_button_down(MouseButton::Right));
        assert_eq!(input.mouse_position(), Vec2::new(10.0, 20.0));

        input.handle_key_input(KeyCode::W, false);
        assert!(!input.is_key_down(KeyCode::W));
    }

    #[test]
    fn test_headless_window_closes_after_budget() {
        let mut window = HeadlessWindow::new((320, 240), 0.016, 2);
        assert!(!window.should_close());
        window.swap_buffers();
        window.swap_buffers();
        assert!(window.should_close());
        assert_eq!(window.presented(), 2);
    }
}
