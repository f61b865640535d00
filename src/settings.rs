//! Host-supplied viewport configuration.
//!
//! Settings are read from a `<viewport>` XML element. Every element and
//! attribute is optional:
//!
//! ```xml
//! <viewport>
//!     <aspectRatio x="16" y="9"/>
//!     <camera smoothness="0.5" speed="5" sensitivity="300"/>
//!     <snap axis="0.1 0.1 0.1" angle="45" scale="0.1"/>
//!     <bindings activate="Mouse2" forward="W" up="Space"/>
//! </viewport>
//! ```

use std::ops::RangeInclusive;

use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use log::warn;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::camera::MoveDirection;
use crate::input::CameraBindings;
use crate::scene::parse_vec3;

pub const SMOOTHNESS_RANGE: RangeInclusive<f32> = 0.001..=1.0;
pub const SPEED_RANGE: RangeInclusive<f32> = 0.1..=1000.0;
pub const SENSITIVITY_RANGE: RangeInclusive<f32> = 0.1..=1000.0;

/// Tuning for the fly camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    /// Fraction of the previous position kept each frame.
    pub smoothness: f32,
    /// Units per second.
    pub speed: f32,
    pub sensitivity: f32,
    /// Divides `sensitivity` when converting pointer travel to radians.
    pub rotation_normalizer: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            smoothness: 0.5,
            speed: 5.0,
            sensitivity: 300.0,
            rotation_normalizer: 1000.0,
        }
    }
}

impl CameraSettings {
    /// Forces each field into its documented range, the same way the
    /// editor's drag widgets clamp them.
    pub fn clamped(self) -> Self {
        let defaults = Self::default();
        let normalizer = self.rotation_normalizer;
        let rotation_normalizer = if normalizer.is_finite() && normalizer > 0.0 {
            normalizer
        } else {
            warn!(
                "rotation_normalizer {normalizer} must be positive, using {}",
                defaults.rotation_normalizer
            );
            defaults.rotation_normalizer
        };
        Self {
            smoothness: clamp_field(
                "smoothness",
                self.smoothness,
                SMOOTHNESS_RANGE,
                defaults.smoothness,
            ),
            speed: clamp_field("speed", self.speed, SPEED_RANGE, defaults.speed),
            sensitivity: clamp_field(
                "sensitivity",
                self.sensitivity,
                SENSITIVITY_RANGE,
                defaults.sensitivity,
            ),
            rotation_normalizer,
        }
    }
}

fn clamp_field(name: &str, value: f32, range: RangeInclusive<f32>, fallback: f32) -> f32 {
    if value.is_nan() {
        warn!("{name} is NaN, using {fallback}");
        return fallback;
    }
    let clamped = value.clamp(*range.start(), *range.end());
    if clamped != value {
        warn!("{name} {value} is outside {range:?}, clamped to {clamped}");
    }
    clamped
}

/// Snap increments handed to the manipulation gizmo layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapSettings {
    pub axis: Vec3,
    pub angle_degrees: f32,
    pub scale: f32,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            axis: Vec3::splat(0.1),
            angle_degrees: 45.0,
            scale: 0.1,
        }
    }
}

/// Complete viewport configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSettings {
    /// Width over height of the rendered image.
    pub aspect_ratio: f32,
    pub camera: CameraSettings,
    pub snap: SnapSettings,
    pub bindings: CameraBindings,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            aspect_ratio: 16.0 / 9.0,
            camera: CameraSettings::default(),
            snap: SnapSettings::default(),
            bindings: CameraBindings::default(),
        }
    }
}

impl ViewportSettings {
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid viewport XML")?;
        let root = document.root_element();
        if !root.has_tag_name("viewport") {
            return Err(anyhow!(
                "expected <viewport> root element, found <{}>",
                root.tag_name().name()
            ));
        }

        let mut settings = Self::default();

        if let Some(node) = child(root, "aspectRatio") {
            let x = attribute_f32(node, "x")?.unwrap_or(16.0);
            let y = attribute_f32(node, "y")?.unwrap_or(9.0);
            if !(x > 0.0 && y > 0.0) {
                return Err(anyhow!("aspect ratio components must be positive, got {x}:{y}"));
            }
            settings.aspect_ratio = x / y;
        }

        if let Some(node) = child(root, "camera") {
            let camera = &mut settings.camera;
            if let Some(value) = attribute_f32(node, "smoothness")? {
                camera.smoothness = value;
            }
            if let Some(value) = attribute_f32(node, "speed")? {
                camera.speed = value;
            }
            if let Some(value) = attribute_f32(node, "sensitivity")? {
                camera.sensitivity = value;
            }
            if let Some(value) = attribute_f32(node, "normalizer")? {
                camera.rotation_normalizer = value;
            }
            *camera = camera.clamped();
        }

        if let Some(node) = child(root, "snap") {
            let snap = &mut settings.snap;
            snap.axis = parse_vec3(node.attribute("axis").map(str::to_string), snap.axis)
                .context("invalid snap axis")?;
            if let Some(value) = attribute_f32(node, "angle")? {
                snap.angle_degrees = value;
            }
            if let Some(value) = attribute_f32(node, "scale")? {
                snap.scale = value;
            }
        }

        if let Some(node) = child(root, "bindings") {
            let actions = std::iter::once("activate")
                .chain(MoveDirection::ALL.into_iter().map(MoveDirection::name));
            for action in actions {
                if let Some(name) = node.attribute(action) {
                    settings
                        .bindings
                        .rebind(action, name.trim())
                        .with_context(|| format!("invalid binding for {action}"))?;
                }
            }
        }

        Ok(settings)
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(tag))
}

fn attribute_f32(node: Node<'_, '_>, name: &str) -> Result<Option<f32>> {
    node.attribute(name)
        .map(|value| {
            value
                .trim()
                .parse::<f32>()
                .map_err(|err| anyhow!("failed to parse {name}={value:?}: {err}"))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputBinding, KeyCode, NamedKey};

    #[test]
    fn empty_viewport_uses_defaults() {
        let settings = ViewportSettings::from_xml("<viewport/>").unwrap();
        assert_eq!(settings, ViewportSettings::default());
    }

    #[test]
    fn parses_all_sections() {
        let xml = r#"
        <viewport>
            <aspectRatio x="4" y="3"/>
            <camera smoothness="0.25" speed="12" sensitivity="80"/>
            <snap axis="1 0.5 0.25" angle="15" scale="0.5"/>
            <bindings up="Space" down="LeftCtrl"/>
        </viewport>
        "#;
        let settings = ViewportSettings::from_xml(xml).unwrap();
        assert!((settings.aspect_ratio - 4.0 / 3.0).abs() < f32::EPSILON);
        assert_eq!(settings.camera.smoothness, 0.25);
        assert_eq!(settings.camera.speed, 12.0);
        assert_eq!(settings.camera.sensitivity, 80.0);
        assert_eq!(settings.snap.axis, Vec3::new(1.0, 0.5, 0.25));
        assert_eq!(settings.snap.angle_degrees, 15.0);
        assert_eq!(
            settings.bindings.up,
            InputBinding::Key(KeyCode::Named(NamedKey::Space))
        );
        assert_eq!(settings.bindings.forward, CameraBindings::default().forward);
    }

    #[test]
    fn out_of_range_camera_values_are_clamped() {
        let xml = r#"<viewport><camera smoothness="0" speed="5000" sensitivity="0.01"/></viewport>"#;
        let camera = ViewportSettings::from_xml(xml).unwrap().camera;
        assert_eq!(camera.smoothness, 0.001);
        assert_eq!(camera.speed, 1000.0);
        assert_eq!(camera.sensitivity, 0.1);
    }

    #[test]
    fn clamped_replaces_invalid_normalizer() {
        let camera = CameraSettings {
            rotation_normalizer: -3.0,
            ..CameraSettings::default()
        }
        .clamped();
        assert_eq!(camera.rotation_normalizer, 1000.0);
    }

    #[test]
    fn non_positive_aspect_ratio_is_an_error() {
        let xml = r#"<viewport><aspectRatio x="16" y="0"/></viewport>"#;
        assert!(ViewportSettings::from_xml(xml).is_err());
    }

    #[test]
    fn nan_aspect_ratio_is_an_error() {
        let xml = r#"<viewport><aspectRatio x="NaN" y="9"/></viewport>"#;
        assert!(ViewportSettings::from_xml(xml).is_err());
    }

    #[test]
    fn unparsable_number_is_an_error() {
        let xml = r#"<viewport><camera speed="fast"/></viewport>"#;
        assert!(ViewportSettings::from_xml(xml).is_err());
    }

    #[test]
    fn unknown_binding_is_an_error() {
        let xml = r#"<viewport><bindings forward="Joystick"/></viewport>"#;
        assert!(ViewportSettings::from_xml(xml).is_err());
    }
}
