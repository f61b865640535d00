//! Rays and axis-aligned bounding volumes.

use glam::{Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewportError};

/// Directions shorter than this are treated as zero-length.
const MIN_DIRECTION_LENGTH: f32 = 1e-6;

/// Half-line in world space. The direction is always unit length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Builds a ray, normalizing `direction`.
    ///
    /// Fails with [`ViewportError::InvalidArgument`] when the direction is
    /// zero-length or not finite.
    pub fn new(origin: Vec3, direction: Vec3) -> Result<Self> {
        if !direction.is_finite() || direction.length() < MIN_DIRECTION_LENGTH {
            return Err(ViewportError::invalid(format!(
                "ray direction must be finite and non-zero, got {direction}"
            )));
        }
        Ok(Self {
            origin,
            direction: direction.normalize(),
        })
    }

    /// Point reached after travelling `distance` along the ray.
    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Axis-aligned box stored as center plus half-extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub center: Vec3,
    pub extents: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            extents: Vec3::splat(0.5),
        }
    }
}

impl BoundingBox {
    pub fn new(center: Vec3, extents: Vec3) -> Self {
        Self {
            center,
            extents: extents.abs(),
        }
    }

    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        let lo = min.min(max);
        let hi = min.max(max);
        Self {
            center: (lo + hi) * 0.5,
            extents: (hi - lo) * 0.5,
        }
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.extents
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.extents
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        let offset = (point - self.center).abs();
        offset.cmple(self.extents).all()
    }

    /// Smallest axis-aligned box enclosing this box after `matrix` is applied.
    pub fn transformed(&self, matrix: Mat4) -> Self {
        let linear = Mat3::from_mat4(matrix);
        let abs = Mat3::from_cols(
            linear.x_axis.abs(),
            linear.y_axis.abs(),
            linear.z_axis.abs(),
        );
        Self {
            center: matrix.transform_point3(self.center),
            extents: abs * self.extents,
        }
    }

    /// Slab test returning the distance at which `ray` enters the box.
    ///
    /// The returned distance is negative when the origin lies inside the
    /// box. Returns `None` when the ray misses or the box is entirely behind
    /// the origin.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let min = self.min();
        let max = self.max();
        let mut t_enter = f32::MIN;
        let mut t_exit = f32::MAX;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];
            if direction.abs() < MIN_DIRECTION_LENGTH {
                // Parallel to this slab: must already be between its planes.
                if origin < min[axis] || origin > max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / direction;
            let t1 = (min[axis] - origin) * inv;
            let t2 = (max[axis] - origin) * inv;
            t_enter = t_enter.max(t1.min(t2));
            t_exit = t_exit.min(t1.max(t2));
        }

        if t_enter > t_exit || t_exit < 0.0 {
            None
        } else {
            Some(t_enter)
        }
    }
}
