//! Viewport geometry, pointer rays, cursor bookkeeping and selection.

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::bounds::Ray;
use crate::camera::CursorController;
use crate::error::{Result, ViewportError};
use crate::input::InputState;

/// Screen-space rectangle in pixels, `top` above `bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self::new(origin.x, origin.y, origin.x + size.x, origin.y + size.y)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width(), self.height())
    }

    pub fn aspect(&self) -> f32 {
        if self.height() > 0.0 {
            self.width() / self.height()
        } else {
            1.0
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left
            && point.x < self.right
            && point.y >= self.top
            && point.y < self.bottom
    }
}

/// Largest size with the given aspect ratio that fits inside `available`.
pub fn fit_aspect(available: Vec2, aspect: f32) -> Vec2 {
    if available.y <= 0.0 || aspect <= 0.0 {
        return available;
    }
    if available.x / available.y < aspect {
        Vec2::new(available.x, available.x / aspect)
    } else {
        Vec2::new(available.y * aspect, available.y)
    }
}

/// Builds the world-space ray under `pointer` for an image drawn in `rect`.
///
/// The pointer is unprojected at depth 0 and 1 of a `[0, 1]` depth-range
/// projection.
pub fn screen_ray(pointer: Vec2, rect: Rect, view: Mat4, projection: Mat4) -> Result<Ray> {
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return Err(ViewportError::invalid(format!(
            "viewport rect must have a positive area, got {rect:?}"
        )));
    }
    let view_projection = projection * view;
    let determinant = view_projection.determinant();
    if !determinant.is_finite() || determinant.abs() < f32::EPSILON * f32::EPSILON {
        return Err(ViewportError::invalid(
            "view-projection matrix is not invertible",
        ));
    }
    let inverse = view_projection.inverse();

    let local = pointer - Vec2::new(rect.left, rect.top);
    let ndc_x = 2.0 * local.x / rect.width() - 1.0;
    let ndc_y = 1.0 - 2.0 * local.y / rect.height();

    let near = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 0.0));
    let far = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
    Ray::new(near, far - near)
}

/// Headless [`CursorController`] that records what the camera asked for.
///
/// When attached to an [`InputState`], warps are written back as the new
/// pointer position, like an OS cursor warp would be observed by the next
/// input sample.
#[derive(Debug, Clone)]
pub struct VirtualCursor {
    visible: bool,
    confinement: Option<Rect>,
    position: Vec2,
    warps: usize,
    input: Option<Arc<InputState>>,
}

impl Default for VirtualCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualCursor {
    pub fn new() -> Self {
        Self {
            visible: true,
            confinement: None,
            position: Vec2::ZERO,
            warps: 0,
            input: None,
        }
    }

    pub fn attached(input: Arc<InputState>) -> Self {
        Self {
            position: input.mouse_position(),
            input: Some(input),
            ..Self::new()
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn confinement(&self) -> Option<Rect> {
        self.confinement
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn warp_count(&self) -> usize {
        self.warps
    }
}

impl CursorController for VirtualCursor {
    fn set_cursor_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn confine_cursor(&mut self, rect: Rect) {
        self.confinement = Some(rect);
    }

    fn release_cursor_confinement(&mut self) {
        self.confinement = None;
    }

    fn set_cursor_position(&mut self, position: Vec2) {
        self.position = position;
        self.warps += 1;
        if let Some(input) = &self.input {
            input.set_mouse_position(position);
        }
    }
}

/// Hovered and selected entity bookkeeping for the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<N> {
    hovered: Option<N>,
    selected: Option<N>,
}

impl<N> Default for Selection<N> {
    fn default() -> Self {
        Self {
            hovered: None,
            selected: None,
        }
    }
}

impl<N: Copy + PartialEq> Selection<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<N> {
        self.hovered
    }

    pub fn selected(&self) -> Option<N> {
        self.selected
    }

    /// Applies one frame of pointer state.
    ///
    /// `hovered` replaces the previous hover. A click selects the hovered
    /// entity when there is one; `cancel` clears the selection afterwards.
    /// Returns the newly selected entity when a click picked one.
    pub fn update(&mut self, hovered: Option<N>, clicked: bool, cancel: bool) -> Option<N> {
        self.hovered = hovered;
        let picked = if clicked { hovered } else { None };
        if let Some(node) = picked {
            self.selected = Some(node);
        }
        if cancel {
            self.selected = None;
        }
        picked
    }

    pub fn clear(&mut self) {
        self.hovered = None;
        self.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraTransform, Lens, TransformSink};

    const EPSILON: f32 = 1e-4;

    #[test]
    fn rect_dimensions_and_containment() {
        let rect = Rect::from_origin_size(Vec2::new(10.0, 20.0), Vec2::new(100.0, 50.0));
        assert_eq!(rect.width(), 100.0);
        assert_eq!(rect.height(), 50.0);
        assert_eq!(rect.aspect(), 2.0);
        assert!(rect.contains(Vec2::new(10.0, 20.0)));
        assert!(!rect.contains(Vec2::new(110.0, 20.0)));
        assert!(!rect.contains(Vec2::new(50.0, 5.0)));
    }

    #[test]
    fn fit_aspect_letterboxes() {
        let aspect = 2.0;
        assert_eq!(fit_aspect(Vec2::new(1600.0, 1200.0), aspect), Vec2::new(1600.0, 800.0));
        assert_eq!(fit_aspect(Vec2::new(3200.0, 900.0), aspect), Vec2::new(1800.0, 900.0));
        assert_eq!(fit_aspect(Vec2::new(100.0, 0.0), aspect), Vec2::new(100.0, 0.0));
    }

    #[test]
    fn center_pixel_ray_follows_camera_forward() {
        let rect = Rect::new(0.0, 0.0, 800.0, 600.0);
        let mut camera = CameraTransform::default();
        camera.set_position(Vec3::new(0.0, 0.0, 10.0));
        let projection = Lens::default().projection(rect.aspect());

        let ray =
            screen_ray(Vec2::new(400.0, 300.0), rect, camera.view_matrix(), projection).unwrap();
        assert!((ray.direction - Vec3::NEG_Z).length() < EPSILON);
        assert!((ray.origin - Vec3::new(0.0, 0.0, 9.9)).length() < EPSILON);
    }

    #[test]
    fn pointer_offsets_are_relative_to_rect() {
        let rect = Rect::new(100.0, 50.0, 300.0, 250.0);
        let camera = CameraTransform::default();
        let projection = Lens::with_fov(90.0).projection(rect.aspect());

        let ray =
            screen_ray(Vec2::new(300.0, 150.0), rect, camera.view_matrix(), projection).unwrap();
        // Right edge of a 90 degree square frustum is 45 degrees off axis.
        let expected = Vec3::new(1.0, 0.0, -1.0).normalize();
        assert!((ray.direction - expected).length() < EPSILON);

        let upper =
            screen_ray(Vec2::new(200.0, 50.0), rect, camera.view_matrix(), projection).unwrap();
        assert!(upper.direction.y > 0.0);
    }

    #[test]
    fn empty_rect_is_rejected() {
        let rect = Rect::new(0.0, 0.0, 0.0, 10.0);
        let err = screen_ray(Vec2::ZERO, rect, Mat4::IDENTITY, Mat4::IDENTITY).unwrap_err();
        assert!(matches!(err, ViewportError::InvalidArgument(_)));
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(screen_ray(Vec2::ZERO, rect, Mat4::ZERO, Mat4::IDENTITY).is_err());
    }

    #[test]
    fn attached_cursor_writes_back_warps() {
        let input = Arc::new(InputState::new());
        input.set_mouse_position(Vec2::new(5.0, 5.0));
        let mut cursor = VirtualCursor::attached(Arc::clone(&input));
        assert_eq!(cursor.position(), Vec2::new(5.0, 5.0));

        cursor.set_cursor_position(Vec2::new(1.0, 2.0));
        assert_eq!(input.mouse_position(), Vec2::new(1.0, 2.0));
        assert_eq!(cursor.warp_count(), 1);

        cursor.set_cursor_visible(false);
        cursor.confine_cursor(Rect::new(0.0, 0.0, 4.0, 4.0));
        assert!(!cursor.is_visible());
        cursor.release_cursor_confinement();
        assert_eq!(cursor.confinement(), None);
    }

    #[test]
    fn click_selects_hovered_and_escape_clears() {
        let mut selection = Selection::new();
        assert_eq!(selection.update(Some(3), false, false), None);
        assert_eq!(selection.hovered(), Some(3));
        assert_eq!(selection.selected(), None);

        assert_eq!(selection.update(Some(3), true, false), Some(3));
        assert_eq!(selection.selected(), Some(3));

        // Clicking empty space keeps the current selection.
        assert_eq!(selection.update(None, true, false), None);
        assert_eq!(selection.selected(), Some(3));

        selection.update(None, false, true);
        assert_eq!(selection.selected(), None);
    }
}
