use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::TransformSink;

/// Position and Euler orientation of the viewport camera.
///
/// Angles are radians; the rotation applies roll (Z), then pitch (X), then
/// yaw (Y).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraTransform {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl CameraTransform {
    /// Places the camera at a node's world transform. Scale is discarded.
    pub fn from_world_matrix(world: Mat4) -> Self {
        let (_, rotation, position) = world.to_scale_rotation_translation();
        let (yaw, pitch, roll) = rotation.to_euler(EulerRot::YXZ);
        Self {
            position,
            yaw,
            pitch,
            roll,
        }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, self.roll)
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.local_transform().inverse()
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation() * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation() * Vec3::Y
    }
}

impl TransformSink for CameraTransform {
    fn set_rotation(&mut self, yaw: f32, pitch: f32, roll: f32) {
        self.yaw = yaw;
        self.pitch = pitch;
        self.roll = roll;
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn local_transform(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation(), self.position)
    }

    fn position(&self) -> Vec3 {
        self.position
    }
}

/// Perspective lens with a `[0, 1]` depth range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lens {
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Lens {
    fn default() -> Self {
        Self {
            fov_y: 45.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Lens {
    pub fn with_fov(fov_y: f32) -> Self {
        Self {
            fov_y,
            ..Self::default()
        }
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), aspect.max(0.01), self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_vec3(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPSILON
    }

    #[test]
    fn default_looks_down_negative_z() {
        let camera = CameraTransform::default();
        assert_eq!(camera.forward(), Vec3::NEG_Z);
        assert_eq!(camera.right(), Vec3::X);
        assert_eq!(camera.up(), Vec3::Y);
        assert_eq!(camera.local_transform(), Mat4::IDENTITY);
    }

    #[test]
    fn positive_yaw_turns_left() {
        let mut camera = CameraTransform::default();
        camera.set_rotation(std::f32::consts::FRAC_PI_2, 0.0, 0.0);
        assert!(approx_vec3(camera.forward(), Vec3::NEG_X));
    }

    #[test]
    fn positive_pitch_looks_up() {
        let mut camera = CameraTransform::default();
        camera.set_rotation(0.0, std::f32::consts::FRAC_PI_2, 0.0);
        assert!(approx_vec3(camera.forward(), Vec3::Y));
    }

    #[test]
    fn view_matrix_moves_position_to_origin() {
        let mut camera = CameraTransform::default();
        camera.set_position(Vec3::new(1.0, 2.0, 3.0));
        camera.set_rotation(0.3, -0.2, 0.0);
        let eye = camera.view_matrix().transform_point3(camera.position);
        assert!(approx_vec3(eye, Vec3::ZERO));
    }

    #[test]
    fn from_world_matrix_recovers_pose() {
        let world = Mat4::from_translation(Vec3::new(0.0, 1.0, 5.0))
            * Mat4::from_rotation_y(0.5)
            * Mat4::from_scale(Vec3::splat(2.0));
        let camera = CameraTransform::from_world_matrix(world);
        assert!(approx_vec3(camera.position, Vec3::new(0.0, 1.0, 5.0)));
        assert!((camera.yaw - 0.5).abs() < EPSILON);
        assert!(camera.pitch.abs() < EPSILON);
        assert!(camera.roll.abs() < EPSILON);
    }

    #[test]
    fn from_world_matrix_keeps_pitch() {
        let world = Mat4::from_rotation_x(-0.3);
        let camera = CameraTransform::from_world_matrix(world);
        assert!((camera.pitch + 0.3).abs() < EPSILON);
        let expected = world.transform_vector3(Vec3::NEG_Z);
        assert!(approx_vec3(camera.forward(), expected));
    }
}
