//! Input system for handling keyboard and mouse input
//!
//! Keys map to one-shot `InputAction`s (game state, help pages, equipping the
//! light) plus held WASD movement; right-button drag rotates the active camera.
//! All speeds are per millisecond, matching `Graphics::update`.

use std::collections::HashSet;
use winit::event::{ElementState, MouseButton};
use winit::keyboard::KeyCode;
use winit::window::Window;
use tracing::{debug, warn};

use crate::component::Camera3D;
use crate::math::Vector3;

/// Discrete actions triggered by a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// F1
    Play,
    /// F2
    Edit,
    /// F3
    Help,
    /// Escape
    Menu,
    /// Right arrow
    NextHelpPage,
    /// Left arrow
    PreviousHelpPage,
    /// C
    ToggleLight,
}

impl InputAction {
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::F1 => Some(InputAction::Play),
            KeyCode::F2 => Some(InputAction::Edit),
            KeyCode::F3 => Some(InputAction::Help),
            KeyCode::Escape => Some(InputAction::Menu),
            KeyCode::ArrowRight => Some(InputAction::NextHelpPage),
            KeyCode::ArrowLeft => Some(InputAction::PreviousHelpPage),
            KeyCode::KeyC => Some(InputAction::ToggleLight),
            _ => None,
        }
    }
}

/// Configuration for InputSystem behavior
#[derive(Debug, Clone)]
pub struct InputConfig {
    /// Camera movement speed in units per millisecond
    pub move_speed: f32,
    /// Mouse sensitivity in radians per pixel
    pub mouse_sensitivity: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            move_speed: 0.01,
            mouse_sensitivity: 0.004,
        }
    }
}

/// InputSystem manages keyboard and mouse input state
pub struct InputSystem {
    pressed_keys: HashSet<KeyCode>,

    last_mouse_pos: (f64, f64),
    mouse_buttons: HashSet<MouseButton>,
    mouse_delta: (f32, f32),

    move_speed: f32,
    mouse_sensitivity: f32,

    first_mouse: bool,
    cursor_locked: bool,
}

impl InputSystem {
    pub fn new() -> Self {
        Self::with_config(InputConfig::default())
    }

    pub fn with_config(config: InputConfig) -> Self {
        Self {
            pressed_keys: HashSet::new(),
            last_mouse_pos: (0.0, 0.0),
            mouse_buttons: HashSet::new(),
            mouse_delta: (0.0, 0.0),
            move_speed: config.move_speed,
            mouse_sensitivity: config.mouse_sensitivity,
            first_mouse: true,
            cursor_locked: false,
        }
    }

    /// Process keyboard input event
    ///
    /// Returns the action for a fresh press; held keys and auto-repeat return `None`.
    pub fn on_keyboard_input(&mut self, keycode: KeyCode, state: ElementState) -> Option<InputAction> {
        match state {
            ElementState::Pressed => {
                if self.pressed_keys.insert(keycode) {
                    InputAction::from_key(keycode)
                } else {
                    None
                }
            }
            ElementState::Released => {
                self.pressed_keys.remove(&keycode);
                None
            }
        }
    }

    /// Process mouse button event
    /// Handles cursor locking when right button is pressed/released
    pub fn on_mouse_button(&mut self, window: &Window, button: MouseButton, state: ElementState) {
        self.track_mouse_button(button, state);
        if button == MouseButton::Right {
            match state {
                ElementState::Pressed => self.lock_cursor(window),
                ElementState::Released => self.unlock_cursor(window),
            }
        }
    }

    fn track_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.mouse_buttons.insert(button);
            }
            ElementState::Released => {
                self.mouse_buttons.remove(&button);
            }
        }
    }

    /// Process mouse movement event
    pub fn on_mouse_move(&mut self, position: (f64, f64)) {
        if self.first_mouse {
            self.last_mouse_pos = position;
            self.first_mouse = false;
            return;
        }

        let dx = (position.0 - self.last_mouse_pos.0) as f32;
        let dy = (position.1 - self.last_mouse_pos.1) as f32;
        self.mouse_delta = (self.mouse_delta.0 + dx, self.mouse_delta.1 + dy);
        self.last_mouse_pos = position;
    }

    /// Move and rotate the camera from the current input state
    /// Called every frame with delta time in milliseconds
    pub fn update_camera(&mut self, camera: &mut Camera3D, delta_time: f32) {
        self.handle_keyboard_movement(camera, delta_time);
        self.handle_mouse_rotation(camera);
        self.mouse_delta = (0.0, 0.0);
    }

    fn handle_keyboard_movement(&self, camera: &mut Camera3D, delta_time: f32) {
        let distance = self.move_speed * delta_time;
        let mut offset = Vector3::zeros();

        if self.pressed_keys.contains(&KeyCode::KeyW) {
            offset += camera.forward(true);
        }
        if self.pressed_keys.contains(&KeyCode::KeyS) {
            offset += camera.backward(true);
        }
        if self.pressed_keys.contains(&KeyCode::KeyA) {
            offset += camera.left(true);
        }
        if self.pressed_keys.contains(&KeyCode::KeyD) {
            offset += camera.right(true);
        }
        if self.pressed_keys.contains(&KeyCode::Space) {
            offset.y += 1.0;
        }
        if self.pressed_keys.contains(&KeyCode::KeyZ) {
            offset.y -= 1.0;
        }

        if offset != Vector3::zeros() {
            camera.adjust_position(offset * distance);
        }
    }

    fn handle_mouse_rotation(&mut self, camera: &mut Camera3D) {
        // Only rotate if right mouse button is pressed
        if !self.mouse_buttons.contains(&MouseButton::Right) {
            return;
        }

        if self.mouse_delta.0.abs() < 0.001 && self.mouse_delta.1.abs() < 0.001 {
            return;
        }

        let yaw = self.mouse_delta.0 * self.mouse_sensitivity;
        let pitch = self.mouse_delta.1 * self.mouse_sensitivity;
        camera.adjust_rotation_xyz(pitch, yaw, 0.0);
    }

    /// Lock and hide cursor for immersive camera control
    pub fn lock_cursor(&mut self, window: &Window) {
        if self.cursor_locked {
            return;
        }

        window.set_cursor_visible(false);

        // Confined is more widely supported than Locked
        if let Err(e) = window.set_cursor_grab(winit::window::CursorGrabMode::Confined) {
            if let Err(e2) = window.set_cursor_grab(winit::window::CursorGrabMode::Locked) {
                warn!(
                    "Failed to grab cursor (Confined: {}, Locked: {}). Cursor will remain visible but rotation still works.",
                    e, e2
                );
            } else {
                debug!("Cursor grabbed with Locked mode");
                self.cursor_locked = true;
            }
        } else {
            debug!("Cursor grabbed with Confined mode");
            self.cursor_locked = true;
        }
    }

    /// Unlock and show cursor
    pub fn unlock_cursor(&mut self, window: &Window) {
        window.set_cursor_visible(true);
        if !self.cursor_locked {
            return;
        }

        if let Err(e) = window.set_cursor_grab(winit::window::CursorGrabMode::None) {
            warn!("Failed to release cursor grab: {}", e);
        } else {
            debug!("Cursor grab released");
        }

        self.cursor_locked = false;
    }

    /// Reset mouse state (window lost focus)
    pub fn reset_mouse(&mut self) {
        self.mouse_delta = (0.0, 0.0);
        self.mouse_buttons.clear();
        self.first_mouse = true;
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    pub fn is_mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.mouse_buttons.contains(&button)
    }
}

impl Default for InputSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera3D {
        Camera3D::new("Main", Vector3::new(0.0, 9.0, -20.0))
    }

    #[test]
    fn test_press_emits_action_once() {
        let mut input = InputSystem::new();
        assert_eq!(input.on_keyboard_input(KeyCode::F2, ElementState::Pressed), Some(InputAction::Edit));
        assert_eq!(input.on_keyboard_input(KeyCode::F2, ElementState::Pressed), None);
        assert_eq!(input.on_keyboard_input(KeyCode::F2, ElementState::Released), None);
        assert_eq!(input.on_keyboard_input(KeyCode::F2, ElementState::Pressed), Some(InputAction::Edit));
        assert_eq!(input.on_keyboard_input(KeyCode::KeyW, ElementState::Pressed), None);
        assert!(input.is_key_pressed(KeyCode::KeyW));
    }

    #[test]
    fn test_walk_ignores_pitch() {
        let mut input = InputSystem::new();
        let mut camera = camera();
        camera.set_rotation_xyz(0.5, 0.0, 0.0);
        input.on_keyboard_input(KeyCode::KeyW, ElementState::Pressed);

        input.update_camera(&mut camera, 100.0);
        let p = camera.position();
        assert!((p.z - (-19.0)).abs() < 1e-5);
        assert_eq!(p.y, 9.0);
    }

    #[test]
    fn test_mouse_rotates_only_with_right_button() {
        let mut input = InputSystem::new();
        let mut camera = camera();

        input.on_mouse_move((100.0, 100.0));
        input.on_mouse_move((150.0, 100.0));
        input.update_camera(&mut camera, 16.0);
        assert_eq!(camera.rotation().y, 0.0);

        input.track_mouse_button(MouseButton::Right, ElementState::Pressed);
        input.on_mouse_move((200.0, 100.0));
        input.update_camera(&mut camera, 16.0);
        assert!((camera.rotation().y - 50.0 * 0.004).abs() < 1e-6);
        assert!(input.is_mouse_button_pressed(MouseButton::Right));
    }
}
