use glam::{Mat4, Vec2, Vec3};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::{CursorController, TransformSink};
use crate::error::{Result, ViewportError};
use crate::input::InputSource;
use crate::settings::CameraSettings;
use crate::viewport::Rect;

/// Camera-relative movement inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

impl MoveDirection {
    /// Every direction, in the order movement is composed each frame.
    pub const ALL: [Self; 6] = [
        Self::Forward,
        Self::Backward,
        Self::Left,
        Self::Right,
        Self::Up,
        Self::Down,
    ];

    /// Unit vector in camera-local axes (forward is -Z).
    pub fn vector(self) -> Vec3 {
        match self {
            Self::Forward => Vec3::NEG_Z,
            Self::Backward => Vec3::Z,
            Self::Left => Vec3::NEG_X,
            Self::Right => Vec3::X,
            Self::Up => Vec3::Y,
            Self::Down => Vec3::NEG_Y,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|direction| direction.name().eq_ignore_ascii_case(name))
    }
}

/// Whether the camera is currently being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    Idle,
    Active,
}

/// State that only exists between an activation edge and the matching
/// deactivation edge.
#[derive(Debug, Clone, Copy)]
struct Activation {
    anchor: Vec2,
    confine: Rect,
    movement_held: bool,
}

/// First-person editor camera.
///
/// Yaw and pitch accumulate pointer travel (in pixel-seconds) and are scaled
/// by `sensitivity / rotation_normalizer` when emitted. Movement integrates
/// into a pending "apply" transform that the displayed position eases
/// towards every frame.
#[derive(Debug, Clone)]
pub struct FlyCamera {
    settings: CameraSettings,
    yaw: f32,
    pitch: f32,
    apply_transform: Mat4,
    activation: Option<Activation>,
}

impl FlyCamera {
    /// Creates an idle camera whose pending transform starts at `initial`.
    pub fn new(settings: CameraSettings, initial: Mat4) -> Self {
        Self {
            settings,
            yaw: 0.0,
            pitch: 0.0,
            apply_transform: initial,
            activation: None,
        }
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: CameraSettings) {
        self.settings = settings;
    }

    pub fn mode(&self) -> CameraMode {
        if self.activation.is_some() {
            CameraMode::Active
        } else {
            CameraMode::Idle
        }
    }

    /// Accumulated yaw before sensitivity scaling.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Accumulated pitch before sensitivity scaling.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn apply_transform(&self) -> Mat4 {
        self.apply_transform
    }

    /// Pointer position captured when the current activation began.
    pub fn anchor(&self) -> Option<Vec2> {
        self.activation.map(|activation| activation.anchor)
    }

    /// Seeds the accumulators so the next rotation command equals the given
    /// yaw and pitch in radians.
    pub fn set_orientation(&mut self, yaw: f32, pitch: f32) {
        let scale = self.rotation_scale();
        if scale.is_normal() {
            self.yaw = yaw / scale;
            self.pitch = pitch / scale;
        }
    }

    fn rotation_scale(&self) -> f32 {
        self.settings.sensitivity / self.settings.rotation_normalizer
    }

    /// Advances the camera by one frame.
    ///
    /// Handles the activation edges, drives rotation and movement while
    /// active, and always eases the sink's position towards the apply
    /// transform. A negative or non-finite `elapsed_seconds` is rejected
    /// before any state changes.
    pub fn update(
        &mut self,
        elapsed_seconds: f32,
        input: &dyn InputSource,
        cursor: &mut dyn CursorController,
        sink: &mut dyn TransformSink,
        confine: Rect,
    ) -> Result<CameraMode> {
        if !elapsed_seconds.is_finite() || elapsed_seconds < 0.0 {
            return Err(ViewportError::invalid(format!(
                "elapsed time must be finite and non-negative, got {elapsed_seconds}"
            )));
        }

        let activate = input.is_activate_pressed();
        match (self.activation, activate) {
            (None, true) => {
                cursor.set_cursor_visible(false);
                cursor.confine_cursor(confine);
                let anchor = input.pointer_position();
                self.activation = Some(Activation {
                    anchor,
                    confine,
                    movement_held: false,
                });
                debug!("camera activated at pointer {anchor}");
            }
            (Some(activation), false) => {
                cursor.set_cursor_visible(true);
                cursor.release_cursor_confinement();
                self.activation = None;
                debug!(
                    "camera released, confinement {:?} lifted",
                    activation.confine
                );
            }
            _ => {}
        }

        if self.activation.is_some() {
            self.drive(elapsed_seconds, input, cursor, sink);
        }

        let smoothness = self.settings.smoothness;
        let target = self.apply_transform.w_axis.truncate();
        sink.set_position(smoothness * sink.position() + (1.0 - smoothness) * target);

        Ok(self.mode())
    }

    fn drive(
        &mut self,
        elapsed_seconds: f32,
        input: &dyn InputSource,
        cursor: &mut dyn CursorController,
        sink: &mut dyn TransformSink,
    ) {
        let scale = self.rotation_scale();
        let Some(activation) = self.activation.as_mut() else {
            return;
        };

        // Reference minus current: dragging right turns the view right.
        let pointer = input.pointer_position();
        let delta_right = activation.anchor.x - pointer.x;
        let delta_up = activation.anchor.y - pointer.y;
        self.yaw += delta_right * elapsed_seconds;
        self.pitch += delta_up * elapsed_seconds;

        cursor.set_cursor_position(activation.anchor);

        sink.set_rotation(self.yaw * scale, self.pitch * scale, 0.0);

        let held: Vec<MoveDirection> = MoveDirection::ALL
            .into_iter()
            .filter(|direction| input.is_movement_pressed(*direction))
            .collect();
        let moving = !held.is_empty();
        if moving && !activation.movement_held {
            self.apply_transform = sink.local_transform();
            trace!("apply transform snapshot taken");
        }
        activation.movement_held = moving;

        let step = self.settings.speed * elapsed_seconds;
        for direction in held {
            self.apply_transform *= Mat4::from_translation(direction.vector() * step);
        }
    }
}
