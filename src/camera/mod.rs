//! Editor camera control.
//!
//! [`FlyCamera`] turns pointer drags and held movement inputs into rotation
//! and translation commands. It never owns the camera transform or the OS
//! cursor; both are reached through the narrow traits below so the
//! controller can be driven headless.

mod fly;
mod transform;

use glam::{Mat4, Vec2, Vec3};

use crate::viewport::Rect;

pub use fly::{CameraMode, FlyCamera, MoveDirection};
pub use transform::{CameraTransform, Lens};

/// Receives the camera's rotation and position commands.
pub trait TransformSink {
    /// Absolute rotation in radians: yaw about Y, pitch about X, roll about Z.
    fn set_rotation(&mut self, yaw: f32, pitch: f32, roll: f32);
    fn set_position(&mut self, position: Vec3);
    fn local_transform(&self) -> Mat4;
    fn position(&self) -> Vec3;
}

/// Host cursor capabilities needed while the camera is driven.
pub trait CursorController {
    fn set_cursor_visible(&mut self, visible: bool);
    fn confine_cursor(&mut self, rect: Rect);
    fn release_cursor_confinement(&mut self);
    fn set_cursor_position(&mut self, position: Vec2);
}
