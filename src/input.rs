//! Keyboard state: held pan keys and edge-triggered commands

use std::collections::HashSet;

use glam::Vec2;
use particle_renderer::PAN_SPEED;
use winit::keyboard::KeyCode;

/// Discrete actions triggered by a single key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Reset,
    TogglePause,
    StepOnce,
    Exit,
}

#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<KeyCode>,
}

impl InputState {
    /// Record a key transition. Returns a command for fresh presses only;
    /// key repeat never re-triggers one.
    pub fn handle_key(&mut self, key: KeyCode, pressed: bool, repeat: bool) -> Option<Command> {
        if is_pan_key(key) {
            if pressed {
                self.held.insert(key);
            } else {
                self.held.remove(&key);
            }
            return None;
        }

        if !pressed || repeat {
            return None;
        }

        match key {
            KeyCode::KeyR => Some(Command::Reset),
            KeyCode::Space => Some(Command::TogglePause),
            KeyCode::KeyN => Some(Command::StepOnce),
            KeyCode::Escape => Some(Command::Exit),
            _ => None,
        }
    }

    /// Camera displacement for this frame from the held keys.
    pub fn pan_delta(&self) -> Vec2 {
        let held = |a: KeyCode, b: KeyCode| self.held.contains(&a) || self.held.contains(&b);

        let mut delta = Vec2::ZERO;
        if held(KeyCode::KeyW, KeyCode::ArrowUp) {
            delta.y += PAN_SPEED;
        }
        if held(KeyCode::KeyS, KeyCode::ArrowDown) {
            delta.y -= PAN_SPEED;
        }
        if held(KeyCode::KeyA, KeyCode::ArrowLeft) {
            delta.x -= PAN_SPEED;
        }
        if held(KeyCode::KeyD, KeyCode::ArrowRight) {
            delta.x += PAN_SPEED;
        }
        delta
    }

    /// Forget held keys, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.held.clear();
    }
}

fn is_pan_key(key: KeyCode) -> bool {
    matches!(
        key,
        KeyCode::KeyW
            | KeyCode::KeyA
            | KeyCode::KeyS
            | KeyCode::KeyD
            | KeyCode::ArrowUp
            | KeyCode::ArrowDown
            | KeyCode::ArrowLeft
            | KeyCode::ArrowRight
    )
}
