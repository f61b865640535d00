//! Scene picking and fly-camera core for editor viewports.
//!
//! The crate exposes the two pieces of viewport logic that are independent
//! of any particular window system or renderer: nearest-entity picking along
//! a ray through a scene hierarchy, and a smoothed first-person camera
//! controller. Host capabilities (cursor, transform, input, scene access)
//! are injected through small traits so everything runs headless.

pub mod app;
pub mod bounds;
pub mod camera;
pub mod error;
pub mod input;
pub mod picking;
pub mod scene;
pub mod settings;
pub mod viewport;

pub use app::{FrameReport, ViewportSession};
pub use bounds::{BoundingBox, Ray};
pub use camera::{
    CameraMode, CameraTransform, CursorController, FlyCamera, Lens, MoveDirection, TransformSink,
};
pub use error::{Result, ViewportError};
pub use input::{
    BoundInput, CameraBindings, InputBinding, InputSource, InputState, KeyCode, MouseButton,
    NamedKey,
};
pub use picking::{PickResult, RayPicker, SceneAccessor};
pub use scene::{NodeId, SceneNode, SceneObject, SceneTree, Transform};
pub use settings::{CameraSettings, SnapSettings, ViewportSettings};
pub use viewport::{fit_aspect, screen_ray, Rect, Selection, VirtualCursor};
