use std::collections::HashSet;

use anyhow::{anyhow, Result};
use glam::Vec2;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::camera::MoveDirection;

/// Per-frame input queries consumed by the fly camera.
pub trait InputSource {
    /// Whether the camera-drive condition holds this frame.
    fn is_activate_pressed(&self) -> bool;
    fn is_movement_pressed(&self, direction: MoveDirection) -> bool;
    fn pointer_position(&self) -> Vec2;
}

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
    Digit(u8),
}

impl KeyCode {
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(key) = parse_named_key(name) {
            return Some(Self::Named(key));
        }
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if ch.is_ascii_alphabetic() => {
                Some(Self::Character(ch.to_ascii_uppercase()))
            }
            (Some(ch), None) if ch.is_ascii_digit() => Some(Self::Digit(ch as u8 - b'0')),
            _ => None,
        }
    }
}

fn parse_named_key(name: &str) -> Option<NamedKey> {
    use NamedKey::*;
    let key = match name {
        "Space" => Space,
        "Enter" | "Return" => Enter,
        "Escape" | "Esc" => Escape,
        "Left" => Left,
        "Right" => Right,
        "Up" => Up,
        "Down" => Down,
        "PageUp" => PageUp,
        "PageDown" => PageDown,
        "LeftShift" | "LShift" => LeftShift,
        "RightShift" | "RShift" => RightShift,
        "LeftCtrl" | "LControl" => LeftCtrl,
        "RightCtrl" | "RControl" => RightCtrl,
        "LeftAlt" | "LAlt" => LeftAlt,
        "RightAlt" | "RAlt" => RightAlt,
        _ => return None,
    };
    Some(key)
}

/// Friendly names for the non-character keys the viewport binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    Space,
    Enter,
    Escape,
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    LeftShift,
    RightShift,
    LeftCtrl,
    RightCtrl,
    LeftAlt,
    RightAlt,
}

/// Identifier for a mouse button (left button is zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MouseButton(u8);

impl MouseButton {
    pub const LEFT: Self = Self(0);
    pub const RIGHT: Self = Self(1);

    pub fn new(index: u8) -> Self {
        Self(index)
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

/// A key or mouse button that an action is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputBinding {
    Key(KeyCode),
    Mouse(MouseButton),
}

impl InputBinding {
    /// Parses names such as `W`, `Space`, `Mouse` or `Mouse2` (1-based).
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(button) = parse_mouse_button(name) {
            return Some(Self::Mouse(button));
        }
        KeyCode::from_name(name).map(Self::Key)
    }
}

fn parse_mouse_button(name: &str) -> Option<MouseButton> {
    let prefix = name.get(..5)?;
    if !prefix.eq_ignore_ascii_case("mouse") {
        return None;
    }
    let suffix = &name[5..];
    if suffix.is_empty() {
        return Some(MouseButton::LEFT);
    }
    let index = suffix.parse::<u8>().ok()?;
    Some(MouseButton::new(index.saturating_sub(1)))
}

/// Thread-safe input snapshot written by the host event loop.
#[derive(Debug, Default)]
pub struct InputState {
    keys: RwLock<HashSet<KeyCode>>,
    mouse_buttons: RwLock<HashSet<MouseButton>>,
    mouse_position: RwLock<Vec2>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key_down(&self, key: KeyCode) {
        self.keys.write().insert(key);
    }

    pub fn set_key_up(&self, key: KeyCode) {
        self.keys.write().remove(&key);
    }

    pub fn set_mouse_button_down(&self, button: MouseButton) {
        self.mouse_buttons.write().insert(button);
    }

    pub fn set_mouse_button_up(&self, button: MouseButton) {
        self.mouse_buttons.write().remove(&button);
    }

    pub fn set_binding(&self, binding: InputBinding, down: bool) {
        match (binding, down) {
            (InputBinding::Key(key), true) => self.set_key_down(key),
            (InputBinding::Key(key), false) => self.set_key_up(key),
            (InputBinding::Mouse(button), true) => self.set_mouse_button_down(button),
            (InputBinding::Mouse(button), false) => self.set_mouse_button_up(button),
        }
    }

    pub fn set_mouse_position(&self, position: Vec2) {
        *self.mouse_position.write() = position;
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.read().contains(&key)
    }

    pub fn is_mouse_button_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons.read().contains(&button)
    }

    pub fn is_binding_down(&self, binding: InputBinding) -> bool {
        match binding {
            InputBinding::Key(key) => self.is_key_down(key),
            InputBinding::Mouse(button) => self.is_mouse_button_down(button),
        }
    }

    pub fn mouse_position(&self) -> Vec2 {
        *self.mouse_position.read()
    }
}

/// Inputs that drive the editor camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraBindings {
    pub activate: InputBinding,
    pub forward: InputBinding,
    pub backward: InputBinding,
    pub left: InputBinding,
    pub right: InputBinding,
    pub up: InputBinding,
    pub down: InputBinding,
}

impl Default for CameraBindings {
    fn default() -> Self {
        let key = |ch| InputBinding::Key(KeyCode::Character(ch));
        Self {
            activate: InputBinding::Mouse(MouseButton::RIGHT),
            forward: key('W'),
            backward: key('S'),
            left: key('A'),
            right: key('D'),
            up: key('E'),
            down: key('Q'),
        }
    }
}

impl CameraBindings {
    pub fn movement(&self, direction: MoveDirection) -> InputBinding {
        match direction {
            MoveDirection::Forward => self.forward,
            MoveDirection::Backward => self.backward,
            MoveDirection::Left => self.left,
            MoveDirection::Right => self.right,
            MoveDirection::Up => self.up,
            MoveDirection::Down => self.down,
        }
    }

    /// Rebinds one action by name. `action` is `activate` or a direction name.
    pub fn rebind(&mut self, action: &str, input_name: &str) -> Result<()> {
        let binding = InputBinding::from_name(input_name)
            .ok_or_else(|| anyhow!("unknown input name {input_name:?}"))?;
        let slot = match action {
            "activate" => &mut self.activate,
            other => {
                let direction = MoveDirection::from_name(other)
                    .ok_or_else(|| anyhow!("unknown camera action {other:?}"))?;
                match direction {
                    MoveDirection::Forward => &mut self.forward,
                    MoveDirection::Backward => &mut self.backward,
                    MoveDirection::Left => &mut self.left,
                    MoveDirection::Right => &mut self.right,
                    MoveDirection::Up => &mut self.up,
                    MoveDirection::Down => &mut self.down,
                }
            }
        };
        *slot = binding;
        Ok(())
    }
}

/// [`InputSource`] reading an [`InputState`] through [`CameraBindings`].
#[derive(Debug, Clone, Copy)]
pub struct BoundInput<'a> {
    state: &'a InputState,
    bindings: &'a CameraBindings,
    activate_gate: bool,
}

impl<'a> BoundInput<'a> {
    pub fn new(state: &'a InputState, bindings: &'a CameraBindings) -> Self {
        Self {
            state,
            bindings,
            activate_gate: true,
        }
    }

    /// Extra condition the activate binding is ANDed with, such as the
    /// viewport being hovered.
    pub fn gated(mut self, open: bool) -> Self {
        self.activate_gate = open;
        self
    }
}

impl InputSource for BoundInput<'_> {
    fn is_activate_pressed(&self) -> bool {
        self.activate_gate && self.state.is_binding_down(self.bindings.activate)
    }

    fn is_movement_pressed(&self, direction: MoveDirection) -> bool {
        self.state
            .is_binding_down(self.bindings.movement(direction))
    }

    fn pointer_position(&self) -> Vec2 {
        self.state.mouse_position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_and_character_keys() {
        assert_eq!(
            KeyCode::from_name("Space"),
            Some(KeyCode::Named(NamedKey::Space))
        );
        assert_eq!(KeyCode::from_name("a"), Some(KeyCode::Character('A')));
        assert_eq!(KeyCode::from_name("7"), Some(KeyCode::Digit(7)));
        assert_eq!(KeyCode::from_name("Nope"), None);
    }

    #[test]
    fn mouse_names_are_one_based() {
        assert_eq!(
            InputBinding::from_name("Mouse"),
            Some(InputBinding::Mouse(MouseButton::LEFT))
        );
        assert_eq!(
            InputBinding::from_name("mouse2"),
            Some(InputBinding::Mouse(MouseButton::RIGHT))
        );
        assert_eq!(InputBinding::from_name("Mo"), None);
    }

    #[test]
    fn input_state_tracks_bindings() {
        let state = InputState::new();
        let space = InputBinding::Key(KeyCode::Named(NamedKey::Space));
        state.set_binding(space, true);
        assert!(state.is_binding_down(space));
        state.set_binding(space, false);
        assert!(!state.is_binding_down(space));
    }

    #[test]
    fn bound_input_reads_default_bindings() {
        let state = InputState::new();
        let bindings = CameraBindings::default();
        state.set_mouse_button_down(MouseButton::RIGHT);
        state.set_key_down(KeyCode::Character('W'));
        state.set_mouse_position(Vec2::new(4.0, 2.0));

        let input = BoundInput::new(&state, &bindings);
        assert!(input.is_activate_pressed());
        assert!(input.is_movement_pressed(MoveDirection::Forward));
        assert!(!input.is_movement_pressed(MoveDirection::Backward));
        assert_eq!(input.pointer_position(), Vec2::new(4.0, 2.0));
        assert!(!input.gated(false).is_activate_pressed());
    }

    #[test]
    fn rebind_replaces_single_action() {
        let mut bindings = CameraBindings::default();
        bindings.rebind("up", "Space").unwrap();
        bindings.rebind("activate", "Mouse3").unwrap();
        assert_eq!(
            bindings.up,
            InputBinding::Key(KeyCode::Named(NamedKey::Space))
        );
        assert_eq!(bindings.activate, InputBinding::Mouse(MouseButton::new(2)));
        assert!(bindings.rebind("jump", "Space").is_err());
        assert!(bindings.rebind("up", "NotAKey").is_err());
    }
}
