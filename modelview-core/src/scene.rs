//! Scene graph: named nodes, lights and the scene container

use crate::bounds::Aabb;
use crate::color::Color;
use crate::mesh::Mesh;
use crate::point::*;
use crate::traits::Drawable;
use crate::transform::NodeTransform;
use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

/// A node in the scene graph. Mesh nodes carry a [`Mesh`]; group nodes don't.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    pub transform: NodeTransform,
    pub visible: bool,
    pub mesh: Option<Mesh>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Empty group node
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            ..Self::default()
        }
    }

    pub fn with_mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            mesh: Some(mesh),
            ..Self::group(name)
        }
    }

    pub fn with_transform(mut self, transform: NodeTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    /// Depth-first, pre-order visit of this node and all descendants,
    /// regardless of visibility
    pub fn traverse<F: FnMut(&SceneNode)>(&self, f: &mut F) {
        f(self);
        for child in &self.children {
            child.traverse(f);
        }
    }

    pub fn traverse_mut<F: FnMut(&mut SceneNode)>(&mut self, f: &mut F) {
        f(self);
        for child in &mut self.children {
            child.traverse_mut(f);
        }
    }

    /// Visit every mesh in the subtree
    pub fn for_each_mesh_mut<F: FnMut(&str, &mut Mesh)>(&mut self, f: &mut F) {
        self.traverse_mut(&mut |node| {
            if let Some(mesh) = node.mesh.as_mut() {
                f(&node.name, mesh);
            }
        });
    }

    /// First node in pre-order whose name matches exactly
    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(name))
    }

    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.traverse(&mut |node| {
            if node.is_mesh() {
                count += 1;
            }
        });
        count
    }

    /// Visit every node with its world matrix, `parent` being the world
    /// matrix of this node's parent
    pub fn for_each_world<F: FnMut(&SceneNode, &Matrix4<f32>)>(&self, parent: &Matrix4<f32>, f: &mut F) {
        let world = parent * self.transform.to_matrix();
        f(self, &world);
        for child in &self.children {
            child.for_each_world(&world, f);
        }
    }

    /// Like [`for_each_world`](Self::for_each_world) but prunes hidden subtrees
    pub fn for_each_visible_world<F: FnMut(&SceneNode, &Matrix4<f32>)>(
        &self,
        parent: &Matrix4<f32>,
        f: &mut F,
    ) {
        if !self.visible {
            return;
        }
        let world = parent * self.transform.to_matrix();
        f(self, &world);
        for child in &self.children {
            child.for_each_visible_world(&world, f);
        }
    }

    /// Like [`for_each_visible_world`](Self::for_each_visible_world), also
    /// passing the child-index path from this node (empty for this node)
    pub fn for_each_visible_path<F: FnMut(&[usize], &SceneNode, &Matrix4<f32>)>(
        &self,
        parent: &Matrix4<f32>,
        f: &mut F,
    ) {
        let mut path = Vec::new();
        self.visit_visible_path(parent, &mut path, f);
    }

    fn visit_visible_path<F: FnMut(&[usize], &SceneNode, &Matrix4<f32>)>(
        &self,
        parent: &Matrix4<f32>,
        path: &mut Vec<usize>,
        f: &mut F,
    ) {
        if !self.visible {
            return;
        }
        let world = parent * self.transform.to_matrix();
        f(path, self, &world);
        for (i, child) in self.children.iter().enumerate() {
            path.push(i);
            child.visit_visible_path(&world, path, f);
            path.pop();
        }
    }

    /// World-space box around every mesh in the subtree, treating this node
    /// as a scene root. Each mesh contributes its local box transformed by
    /// its world matrix.
    pub fn world_bounding_box(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        self.for_each_world(&Matrix4::identity(), &mut |node, world| {
            if let Some(mesh) = &node.mesh {
                aabb.union(&mesh.geometry.bounding_box().transformed(world));
            }
        });
        aabb
    }
}

impl Drawable for SceneNode {
    fn bounding_box(&self) -> Aabb {
        self.world_bounding_box()
    }
}

/// Light sources understood by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Light {
    Ambient {
        color: Color,
        intensity: f32,
    },
    /// Shines from `position` toward the origin
    Directional {
        color: Color,
        intensity: f32,
        position: Point3f,
        cast_shadow: bool,
    },
}

/// Handle to a top-level node added to a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Scene container: background, lights and top-level nodes
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub background: Color,
    lights: Vec<Light>,
    slots: Vec<Option<SceneNode>>,
}

impl Scene {
    pub fn new(background: Color) -> Self {
        Self {
            background,
            lights: Vec::new(),
            slots: Vec::new(),
        }
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Attach a top-level node
    pub fn add(&mut self, node: SceneNode) -> NodeId {
        self.slots.push(Some(node));
        NodeId(self.slots.len() - 1)
    }

    pub fn remove(&mut self, id: NodeId) -> Option<SceneNode> {
        self.slots.get_mut(id.0).and_then(Option::take)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Top-level nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.slots.iter().flatten()
    }

    /// Top-level nodes with their ids, in insertion order. Ids of removed
    /// nodes are never handed out again.
    pub fn entries(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|node| (NodeId(i), node)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use crate::mesh::TriangleMesh;
    use approx::assert_relative_eq;

    fn unit_triangle() -> Mesh {
        Mesh::new(
            TriangleMesh::from_vertices_and_faces(
                vec![Point3f::new(0.0, 0.0, 0.0), Point3f::new(1.0, 0.0, 0.0), Point3f::new(0.0, 1.0, 0.0)],
                vec![[0, 1, 2]],
            ),
            Material::default(),
        )
    }

    #[test]
    fn test_find_is_exact_and_case_sensitive() {
        let root = SceneNode::group("root")
            .with_child(SceneNode::group("arm").with_child(SceneNode::with_mesh("mesh_64", unit_triangle())));
        assert!(root.find("mesh_64").is_some());
        assert!(root.find("MESH_64").is_none());
        assert!(root.find("mesh_6").is_none());
    }

    #[test]
    fn test_world_bounding_box_composes_parents() {
        let child = SceneNode::with_mesh("tri", unit_triangle())
            .with_transform(NodeTransform::from_translation(Vector3f::new(0.0, 5.0, 0.0)));
        let mut root = SceneNode::group("root").with_child(child);
        root.transform.set_uniform_scale(2.0);

        let aabb = root.world_bounding_box();
        assert_relative_eq!(aabb.min.y, 10.0);
        assert_relative_eq!(aabb.max.y, 12.0);
        assert_relative_eq!(aabb.max.x, 2.0);
    }

    #[test]
    fn test_visible_walk_prunes_hidden_subtree() {
        let mut hidden = SceneNode::group("hidden").with_child(SceneNode::with_mesh("inner", unit_triangle()));
        hidden.visible = false;
        let root = SceneNode::group("root").with_child(hidden);

        let mut seen = Vec::new();
        root.for_each_visible_world(&Matrix4::identity(), &mut |n, _| seen.push(n.name.clone()));
        assert_eq!(seen, vec!["root".to_string()]);
        assert_eq!(root.mesh_count(), 1);
    }

    #[test]
    fn test_scene_slots() {
        let mut scene = Scene::new(Color::WHITE);
        let a = scene.add(SceneNode::group("a"));
        let b = scene.add(SceneNode::group("b"));
        assert!(scene.remove(a).is_some());
        assert!(scene.node(a).is_none());
        assert_eq!(scene.node(b).map(|n| n.name.as_str()), Some("b"));
        assert_eq!(scene.nodes().count(), 1);

        let c = scene.add(SceneNode::group("c"));
        assert_ne!(c, a);
        let ids: Vec<NodeId> = scene.entries().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![b, c]);
    }

    #[test]
    fn test_visible_paths() {
        let mut hidden = SceneNode::with_mesh("hidden", unit_triangle());
        hidden.visible = false;
        let root = SceneNode::group("root")
            .with_child(hidden)
            .with_child(SceneNode::group("arm").with_child(SceneNode::with_mesh("hand", unit_triangle())));

        let mut seen = Vec::new();
        root.for_each_visible_path(&Matrix4::identity(), &mut |path, n, _| seen.push((path.to_vec(), n.name.clone())));
        assert_eq!(
            seen,
            vec![
                (vec![], "root".to_string()),
                (vec![1], "arm".to_string()),
                (vec![1, 0], "hand".to_string()),
            ]
        );
    }
}
