use std::sync::Arc;

use glam::{Vec2, Vec3};
use log::{debug, info};

use crate::bounds::Ray;
use crate::camera::{CameraMode, CameraTransform, FlyCamera, Lens, TransformSink};
use crate::error::Result;
use crate::input::{BoundInput, InputState, KeyCode, MouseButton, NamedKey};
use crate::picking::{PickResult, RayPicker};
use crate::scene::{NodeId, SceneTree};
use crate::settings::ViewportSettings;
use crate::viewport::{fit_aspect, screen_ray, Rect, Selection, VirtualCursor};

/// Camera position used when the scene has no camera node.
const DEFAULT_CAMERA_POSITION: Vec3 = Vec3::new(0.0, 2.0, 6.0);

/// What happened during one [`ViewportSession::frame`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub mode: CameraMode,
    pub hovered: Option<NodeId>,
    /// Entity selected by a click this frame.
    pub picked: Option<NodeId>,
}

/// Headless viewport host wiring the scene, camera, cursor and selection
/// together the way the editor drives them each frame.
#[derive(Debug)]
pub struct ViewportSession {
    scene: SceneTree,
    settings: ViewportSettings,
    camera: FlyCamera,
    camera_transform: CameraTransform,
    lens: Lens,
    input: Arc<InputState>,
    cursor: VirtualCursor,
    selection: Selection<NodeId>,
    picker: RayPicker,
    rect: Rect,
    left_was_down: bool,
}

impl ViewportSession {
    /// Creates a session whose image is letterboxed into `available` pixels.
    pub fn new(
        scene: SceneTree,
        settings: ViewportSettings,
        input: Arc<InputState>,
        available: Vec2,
    ) -> Self {
        let (camera_transform, lens) = match scene.camera().and_then(|id| scene.node(id)) {
            Some(node) => (
                CameraTransform::from_world_matrix(node.world_matrix()),
                Lens::with_fov(node.object.fov),
            ),
            None => (
                CameraTransform {
                    position: DEFAULT_CAMERA_POSITION,
                    ..CameraTransform::default()
                },
                Lens::default(),
            ),
        };

        let mut camera = FlyCamera::new(settings.camera, camera_transform.local_transform());
        camera.set_orientation(camera_transform.yaw, camera_transform.pitch);

        let rect = Rect::from_origin_size(Vec2::ZERO, fit_aspect(available, settings.aspect_ratio));
        debug!("viewport rect {rect:?}, camera at {}", camera_transform.position);

        Self {
            scene,
            settings,
            camera,
            camera_transform,
            lens,
            cursor: VirtualCursor::attached(Arc::clone(&input)),
            input,
            selection: Selection::new(),
            picker: RayPicker::new(),
            rect,
            left_was_down: false,
        }
    }

    pub fn scene(&self) -> &SceneTree {
        &self.scene
    }

    pub fn settings(&self) -> &ViewportSettings {
        &self.settings
    }

    pub fn camera(&self) -> &FlyCamera {
        &self.camera
    }

    pub fn camera_transform(&self) -> &CameraTransform {
        &self.camera_transform
    }

    pub fn cursor(&self) -> &VirtualCursor {
        &self.cursor
    }

    pub fn selection(&self) -> &Selection<NodeId> {
        &self.selection
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// World-space ray under a pointer position given in viewport pixels.
    pub fn ray_at(&self, pointer: Vec2) -> Result<Ray> {
        screen_ray(
            pointer,
            self.rect,
            self.camera_transform.view_matrix(),
            self.lens.projection(self.rect.aspect()),
        )
    }

    /// Nearest entity under `pointer`, searching the whole scene.
    pub fn pick_at(&self, pointer: Vec2) -> Result<PickResult<NodeId>> {
        let ray = self.ray_at(pointer)?;
        self.picker
            .pick(&self.scene, self.scene.root(), ray, f32::MAX)
    }

    /// Runs one frame: camera first, then hover picking and selection.
    pub fn frame(&mut self, elapsed_seconds: f32) -> Result<FrameReport> {
        let pointer = self.input.mouse_position();
        let hovering = self.rect.contains(pointer);

        let bound = BoundInput::new(&self.input, &self.settings.bindings).gated(hovering);
        let mode = self.camera.update(
            elapsed_seconds,
            &bound,
            &mut self.cursor,
            &mut self.camera_transform,
            self.rect,
        )?;

        if !hovering {
            self.left_was_down = self.input.is_mouse_button_down(MouseButton::LEFT);
            self.selection.update(None, false, false);
            return Ok(FrameReport {
                mode,
                hovered: None,
                picked: None,
            });
        }

        let hit = self.pick_at(pointer)?;
        let left_down = self.input.is_mouse_button_down(MouseButton::LEFT);
        let clicked = left_down && !self.left_was_down;
        self.left_was_down = left_down;
        let cancel = self.input.is_key_down(KeyCode::Named(NamedKey::Escape));

        let picked = self.selection.update(hit.node, clicked, cancel);
        if let Some(node) = picked {
            let name = self.scene.full_name(node).unwrap_or_default();
            info!("Picked entity through selection: {name}");
        }

        Ok(FrameReport {
            mode,
            hovered: hit.node,
            picked,
        })
    }
}
