//! Nearest-hit entity picking over a scene hierarchy.

use log::trace;

use crate::bounds::{BoundingBox, Ray};
use crate::error::Result;

/// Read-only view of a scene hierarchy used by [`RayPicker`].
pub trait SceneAccessor {
    type Node: Copy;

    /// World-space bounds of `node`, or `None` when it has no spatial
    /// representation.
    fn bounding_box(&self, node: Self::Node) -> Option<BoundingBox>;

    /// Children of `node` in scene order.
    fn children(&self, node: Self::Node) -> &[Self::Node];
}

/// Outcome of a pick query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickResult<N> {
    /// Nearest entity hit, if any.
    pub node: Option<N>,
    /// Distance to the hit, or the query's max distance when nothing was hit.
    pub distance: f32,
}

impl<N> PickResult<N> {
    pub fn is_hit(&self) -> bool {
        self.node.is_some()
    }
}

/// Finds the nearest entity whose bounds a ray passes through.
#[derive(Debug, Clone, Copy, Default)]
pub struct RayPicker;

impl RayPicker {
    pub fn new() -> Self {
        Self
    }

    /// Depth-first, pre-order search from `root` for the nearest node whose
    /// bounds the ray enters at a distance in `(0, max_distance)`.
    ///
    /// Equal distances keep the node visited first. The ray direction is
    /// normalized before testing; a zero-length direction is rejected.
    pub fn pick<S: SceneAccessor>(
        &self,
        scene: &S,
        root: S::Node,
        ray: Ray,
        max_distance: f32,
    ) -> Result<PickResult<S::Node>> {
        let ray = Ray::new(ray.origin, ray.direction)?;
        let mut best = PickResult {
            node: None,
            distance: max_distance,
        };

        let mut pending = vec![root];
        let mut visited = 0usize;
        while let Some(node) = pending.pop() {
            visited += 1;
            if let Some(distance) = scene
                .bounding_box(node)
                .and_then(|bounds| bounds.intersect_ray(&ray))
            {
                if 0.0 < distance && distance < best.distance {
                    best = PickResult {
                        node: Some(node),
                        distance,
                    };
                }
            }
            // Reversed so the first child is popped next.
            pending.extend(scene.children(node).iter().rev().copied());
        }

        trace!(
            "pick visited {visited} node(s), hit={} distance={}",
            best.is_hit(),
            best.distance
        );
        Ok(best)
    }
}
