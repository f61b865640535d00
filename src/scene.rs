use anyhow::{anyhow, Context, Result};
use glam::{Mat4, Vec3};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::bounds::BoundingBox;
use crate::picking::SceneAccessor;

/// Handle to a node inside a [`SceneTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Local placement of a node relative to its parent.
///
/// Rotation is stored in degrees and applied X, then Y, then Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: default_scale(),
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn matrix(&self) -> Mat4 {
        let rotation = Mat4::from_rotation_z(self.rotation.z.to_radians())
            * Mat4::from_rotation_y(self.rotation.y.to_radians())
            * Mat4::from_rotation_x(self.rotation.x.to_radians());
        Mat4::from_translation(self.position) * rotation * Mat4::from_scale(self.scale)
    }
}

/// Scene object as described by the authoring tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(default)]
    pub transform: Transform,
    /// Local-space bounds; objects without a spatial representation have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundingBox>,
    #[serde(default = "default_fov")]
    pub fov: f32,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            name: String::new(),
            object_type: String::new(),
            transform: Transform::default(),
            bounds: None,
            fov: default_fov(),
        }
    }
}

impl SceneObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            object_type: "mesh".to_string(),
            ..Self::default()
        }
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

fn default_fov() -> f32 {
    45.0
}

/// Node stored in the scene arena.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub object: SceneObject,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    world: Mat4,
    world_bounds: Option<BoundingBox>,
}

impl SceneNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn world_matrix(&self) -> Mat4 {
        self.world
    }

    /// World-space bounds, kept in sync with the node's transform chain.
    pub fn world_bounds(&self) -> Option<BoundingBox> {
        self.world_bounds
    }
}

/// Scene hierarchy with a single root and ordered children.
///
/// Nodes are only ever appended under an existing parent, so the tree
/// cannot contain cycles.
#[derive(Debug, Clone)]
pub struct SceneTree {
    nodes: Vec<SceneNode>,
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new("Scene")
    }
}

impl SceneTree {
    /// Creates a tree holding only an empty root.
    pub fn new(root_name: impl Into<String>) -> Self {
        let object = SceneObject {
            name: root_name.into(),
            object_type: "scene".to_string(),
            ..SceneObject::default()
        };
        let world = object.transform.matrix();
        Self {
            nodes: vec![SceneNode {
                object,
                parent: None,
                children: Vec::new(),
                world,
                world_bounds: None,
            }],
        }
    }

    /// Parses the nested scene XML produced by the authoring tools.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let root = document.root_element();
        if !root.has_tag_name("scene") {
            return Err(anyhow!(
                "expected <scene> root element, found <{}>",
                root.tag_name().name()
            ));
        }
        let mut tree = Self::new(root.attribute("name").unwrap_or("Scene"));
        let root_id = tree.root();
        let mut pending: Vec<(Node<'_, '_>, NodeId)> = object_children(root)
            .rev()
            .map(|node| (node, root_id))
            .collect();

        while let Some((node, parent)) = pending.pop() {
            let object = parse_object(&node)?;
            let id = tree.add_child(parent, object)?;
            pending.extend(object_children(node).rev().map(|child| (child, id)));
        }

        Ok(tree)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    /// Iterates nodes in insertion order, which is pre-order for parsed scenes.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    /// Appends `object` as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, object: SceneObject) -> Result<NodeId> {
        let parent_world = self
            .node(parent)
            .map(SceneNode::world_matrix)
            .ok_or_else(|| anyhow!("unknown parent node {}", parent.0))?;
        let id = NodeId(self.nodes.len());
        let world = parent_world * object.transform.matrix();
        let world_bounds = object.bounds.map(|bounds| bounds.transformed(world));
        self.nodes.push(SceneNode {
            object,
            parent: Some(parent),
            children: Vec::new(),
            world,
            world_bounds,
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Replaces a node's local transform and refreshes world data below it.
    pub fn set_transform(&mut self, id: NodeId, transform: Transform) -> Result<()> {
        let node = self
            .nodes
            .get_mut(id.0)
            .ok_or_else(|| anyhow!("unknown node {}", id.0))?;
        node.object.transform = transform;
        self.refresh_world(id);
        Ok(())
    }

    /// Replaces a node's local bounds; `None` removes its spatial representation.
    pub fn set_bounds(&mut self, id: NodeId, bounds: Option<BoundingBox>) -> Result<()> {
        let node = self
            .nodes
            .get_mut(id.0)
            .ok_or_else(|| anyhow!("unknown node {}", id.0))?;
        node.object.bounds = bounds;
        node.world_bounds = bounds.map(|bounds| bounds.transformed(node.world));
        Ok(())
    }

    fn refresh_world(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let parent_world = self.nodes[current.0]
                .parent
                .map(|parent| self.nodes[parent.0].world)
                .unwrap_or(Mat4::IDENTITY);
            let node = &mut self.nodes[current.0];
            node.world = parent_world * node.object.transform.matrix();
            node.world_bounds = node
                .object
                .bounds
                .map(|bounds| bounds.transformed(node.world));
            pending.extend(node.children.iter().copied());
        }
    }

    /// Finds the first node with the given name.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.iter()
            .find(|(_, node)| node.object.name == name)
            .map(|(id, _)| id)
    }

    /// Finds the first node typed as a camera.
    pub fn camera(&self) -> Option<NodeId> {
        self.iter()
            .find(|(_, node)| node.object.object_type == "camera")
            .map(|(id, _)| id)
    }

    /// Names from the root down to `id`, joined with `/`.
    pub fn full_name(&self, id: NodeId) -> Option<String> {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id)?;
            names.push(node.object.name.as_str());
            current = node.parent;
        }
        names.reverse();
        Some(names.join("/"))
    }
}

impl SceneAccessor for SceneTree {
    type Node = NodeId;

    fn bounding_box(&self, node: NodeId) -> Option<BoundingBox> {
        self.node(node).and_then(SceneNode::world_bounds)
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map(SceneNode::children).unwrap_or(&[])
    }
}

fn object_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl DoubleEndedIterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(|child| child.has_tag_name("object"))
        .collect::<Vec<_>>()
        .into_iter()
}

fn parse_object(node: &Node<'_, '_>) -> Result<SceneObject> {
    let name = required_text(node, "name")?;
    let mut object = SceneObject {
        name: name.clone(),
        object_type: optional_text(node, "type").unwrap_or_else(|| "mesh".to_string()),
        ..SceneObject::default()
    };
    let transform = &mut object.transform;
    transform.position = parse_vec3(optional_text(node, "position"), transform.position)
        .with_context(|| format!("invalid <position> on object {name}"))?;
    transform.rotation = parse_vec3(optional_text(node, "rotation"), transform.rotation)
        .with_context(|| format!("invalid <rotation> on object {name}"))?;
    transform.scale = parse_vec3(optional_text(node, "scale"), transform.scale)
        .with_context(|| format!("invalid <scale> on object {name}"))?;
    object.bounds = parse_bounds(optional_text(node, "bounds"))
        .with_context(|| format!("invalid <bounds> on object {name}"))?;
    object.fov = parse_f32(optional_text(node, "fov"), object.fov)?;
    Ok(object)
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

pub(crate) fn parse_floats(value: &str) -> Result<Vec<f32>> {
    value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("failed to parse float {component:?}: {err}"))
        })
        .collect()
}

pub(crate) fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    match parse_floats(&value)?[..] {
        [x, y, z] => Ok(Vec3::new(x, y, z)),
        _ => Err(anyhow!("vector needs exactly 3 components, got {value:?}")),
    }
}

fn parse_bounds(value: Option<String>) -> Result<Option<BoundingBox>> {
    let Some(value) = value else {
        return Ok(None);
    };
    match parse_floats(&value)?[..] {
        [cx, cy, cz, ex, ey, ez] => Ok(Some(BoundingBox::new(
            Vec3::new(cx, cy, cz),
            Vec3::new(ex, ey, ez),
        ))),
        _ => Err(anyhow!(
            "bounds need center and extents (6 components), got {value:?}"
        )),
    }
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float: {err}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <scene name="Level">
        <object>
            <name>Camera</name>
            <type>camera</type>
            <position>0 0 10</position>
            <fov>60</fov>
        </object>
        <object>
            <name>Group</name>
            <type>empty</type>
            <position>5 0 0</position>
            <object>
                <name>Crate</name>
                <position>0 1 0</position>
                <bounds>0 0 0 0.5 0.5 0.5</bounds>
            </object>
        </object>
    </scene>
    "#;

    #[test]
    fn parse_scene_builds_hierarchy() {
        let tree = SceneTree::from_xml(SAMPLE).unwrap();
        assert_eq!(tree.len(), 4);
        let root = tree.node(tree.root()).unwrap();
        assert_eq!(root.object.name, "Level");
        assert_eq!(root.children().len(), 2);

        let camera = tree.camera().unwrap();
        let camera = tree.node(camera).unwrap();
        assert_eq!(camera.object.fov, 60.0);
        assert_eq!(camera.object.transform.position, Vec3::new(0.0, 0.0, 10.0));
        assert!(camera.world_bounds().is_none());
    }

    #[test]
    fn world_bounds_follow_parent_chain() {
        let tree = SceneTree::from_xml(SAMPLE).unwrap();
        let crate_id = tree.find("Crate").unwrap();
        let bounds = tree.bounding_box(crate_id).unwrap();
        assert_eq!(bounds.center, Vec3::new(5.0, 1.0, 0.0));
        assert_eq!(bounds.extents, Vec3::splat(0.5));
        assert_eq!(tree.full_name(crate_id).unwrap(), "Level/Group/Crate");
    }

    #[test]
    fn set_transform_refreshes_descendant_bounds() {
        let mut tree = SceneTree::from_xml(SAMPLE).unwrap();
        let group = tree.find("Group").unwrap();
        let crate_id = tree.find("Crate").unwrap();
        tree.set_transform(group, Transform::from_position(Vec3::new(-2.0, 0.0, 3.0)))
            .unwrap();
        let bounds = tree.bounding_box(crate_id).unwrap();
        assert_eq!(bounds.center, Vec3::new(-2.0, 1.0, 3.0));
    }

    #[test]
    fn set_bounds_can_remove_spatial_representation() {
        let mut tree = SceneTree::from_xml(SAMPLE).unwrap();
        let crate_id = tree.find("Crate").unwrap();
        tree.set_bounds(crate_id, None).unwrap();
        assert!(tree.bounding_box(crate_id).is_none());
    }

    #[test]
    fn children_keep_document_order() {
        let tree = SceneTree::from_xml(SAMPLE).unwrap();
        let names: Vec<_> = tree
            .children(tree.root())
            .iter()
            .map(|id| tree.node(*id).unwrap().object.name.clone())
            .collect();
        assert_eq!(names, ["Camera", "Group"]);
    }

    #[test]
    fn missing_name_is_an_error() {
        let bad = "<scene><object><type>mesh</type></object></scene>";
        assert!(SceneTree::from_xml(bad).is_err());
    }

    #[test]
    fn malformed_bounds_are_an_error() {
        let bad = "<scene><object><name>A</name><bounds>0 0 0 1</bounds></object></scene>";
        assert!(SceneTree::from_xml(bad).is_err());
    }

    #[test]
    fn wrong_root_element_is_an_error() {
        assert!(SceneTree::from_xml("<level/>").is_err());
    }

    #[test]
    fn unknown_nodes_have_no_children() {
        let tree = SceneTree::default();
        assert!(tree.children(NodeId(42)).is_empty());
        assert!(tree.bounding_box(NodeId(42)).is_none());
        assert!(tree.full_name(NodeId(42)).is_none());
    }
}
