//! glTF 2.0 import into the scene graph
//!
//! Each glTF node becomes a [`SceneNode`] carrying its local TRS transform.
//! A node whose mesh has a single triangle primitive is itself a mesh node;
//! a mesh with several primitives turns into one child mesh node per
//! primitive. Textures are not read.
//!
//! Names follow the usual web loader conventions so that role names such as
//! `mesh_64` line up:
//! - names are sanitized (whitespace to `_`, `[ ] . : /` removed) and made
//!   unique across the import with `_1`, `_2`, ... suffixes
//! - each primitive takes its mesh name, or `mesh_{index}` when the mesh is
//!   unnamed
//! - a named node overrides the name of its mesh object
//! - a mesh used by several nodes gets `_instance_{n}` per use

use crate::{IoError, SceneReader};
use modelview_core::{Color, Material, Mesh, NodeTransform, Point3f, SceneNode, TriangleMesh, Vector3f};
use std::collections::HashMap;
use std::path::Path;

/// Reader for `.gltf` and `.glb` files
pub struct GltfReader;

impl GltfReader {
    /// Parse a glTF or GLB document held in memory. External buffers are
    /// resolved relative to `base`.
    pub fn from_slice(bytes: &[u8], base: Option<&Path>) -> Result<SceneNode, IoError> {
        let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes)?;
        let buffers = gltf::import_buffers(&document, base, blob)?;
        convert_document(&document, &buffers)
    }
}

impl SceneReader for GltfReader {
    fn read_scene<P: AsRef<Path>>(path: P) -> Result<SceneNode, IoError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => IoError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => IoError::Io(e),
        })?;
        Self::from_slice(&bytes, path.parent())
    }
}

/// Characters that cannot appear in an object name
const RESERVED_NAME_CHARS: [char; 5] = ['[', ']', '.', ':', '/'];

/// Replace whitespace with `_` and drop reserved characters
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !RESERVED_NAME_CHARS.contains(c))
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Hands out unique object names in import order
#[derive(Debug, Default)]
pub struct NameRegistry {
    used: HashMap<String, usize>,
}

impl NameRegistry {
    /// The sanitized `name`, suffixed with `_{n}` if it was handed out before
    pub fn unique(&mut self, name: &str) -> String {
        let base = sanitize_name(name);
        match self.used.get_mut(&base) {
            Some(count) => {
                *count += 1;
                format!("{}_{}", base, count)
            }
            None => {
                self.used.insert(base.clone(), 0);
                base
            }
        }
    }
}

struct Importer<'a> {
    buffers: &'a [gltf::buffer::Data],
    names: NameRegistry,
    /// Primitive names per mesh index, assigned on first use
    mesh_names: HashMap<usize, Vec<String>>,
    mesh_refs: Vec<usize>,
    mesh_uses: Vec<usize>,
}

fn convert_document(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Result<SceneNode, IoError> {
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| IoError::ParseError {
            message: "glTF contains no scenes".to_string(),
        })?;

    let mesh_count = document.meshes().count();
    let mut mesh_refs = vec![0; mesh_count];
    for mesh in document.nodes().filter_map(|n| n.mesh()) {
        mesh_refs[mesh.index()] += 1;
    }
    let mut importer = Importer {
        buffers,
        names: NameRegistry::default(),
        mesh_names: HashMap::new(),
        mesh_refs,
        mesh_uses: vec![0; mesh_count],
    };

    let scene_name = scene.name().map(|n| importer.names.unique(n)).unwrap_or_default();
    let mut root = SceneNode::group(scene_name);
    for node in scene.nodes() {
        root.children.push(importer.convert_node(&node)?);
    }

    tracing::debug!(
        "Imported scene '{}' with {} mesh nodes",
        root.name,
        root.mesh_count()
    );
    Ok(root)
}

impl Importer<'_> {
    fn convert_node(&mut self, node: &gltf::Node<'_>) -> Result<SceneNode, IoError> {
        let node_name = node.name().map(|n| self.names.unique(n));

        let (translation, rotation, scale) = node.transform().decomposed();
        let mut out = SceneNode::group("").with_transform(NodeTransform::from_decomposed(translation, rotation, scale));

        if let Some(mesh) = node.mesh() {
            let names = self.primitive_names(&mesh);
            let mut parts = Vec::new();
            for (primitive, name) in mesh.primitives().zip(names) {
                if primitive.mode() != gltf::mesh::Mode::Triangles {
                    tracing::debug!("Skipping non-triangle primitive {:?} in '{}'", primitive.mode(), name);
                    continue;
                }
                parts.push(SceneNode::with_mesh(name, self.convert_primitive(&primitive)?));
            }

            let suffix = self.instance_suffix(mesh.index());
            if parts.len() == 1 {
                if let Some(part) = parts.pop() {
                    out.name = part.name + &suffix;
                    out.mesh = part.mesh;
                }
            } else {
                out.name = suffix;
                out.children = parts;
            }
        }

        if let Some(name) = node_name {
            out.name = name;
        }

        for child in node.children() {
            out.children.push(self.convert_node(&child)?);
        }
        Ok(out)
    }

    /// One name per primitive, including the ones skipped on import
    fn primitive_names(&mut self, mesh: &gltf::Mesh<'_>) -> Vec<String> {
        if let Some(names) = self.mesh_names.get(&mesh.index()) {
            return names.clone();
        }
        let base = mesh
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
        let names: Vec<String> = mesh.primitives().map(|_| self.names.unique(&base)).collect();
        self.mesh_names.insert(mesh.index(), names.clone());
        names
    }

    fn instance_suffix(&mut self, mesh: usize) -> String {
        if self.mesh_refs[mesh] <= 1 {
            return String::new();
        }
        let n = self.mesh_uses[mesh];
        self.mesh_uses[mesh] += 1;
        format!("_instance_{}", n)
    }

    fn convert_primitive(&self, primitive: &gltf::Primitive<'_>) -> Result<Mesh, IoError> {
        convert_primitive(primitive, self.buffers)
    }
}

fn convert_primitive(primitive: &gltf::Primitive<'_>, buffers: &[gltf::buffer::Data]) -> Result<Mesh, IoError> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));

    let vertices: Vec<Point3f> = reader
        .read_positions()
        .ok_or_else(|| IoError::ParseError {
            message: "primitive has no POSITION attribute".to_string(),
        })?
        .map(Point3f::from)
        .collect();

    let indices: Vec<usize> = match reader.read_indices() {
        Some(indices) => indices.into_u32().map(|i| i as usize).collect(),
        None => (0..vertices.len()).collect(),
    };
    if let Some(&bad) = indices.iter().find(|&&i| i >= vertices.len()) {
        return Err(IoError::ParseError {
            message: format!("index {} out of range for {} vertices", bad, vertices.len()),
        });
    }
    let faces = indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();

    let mut geometry = TriangleMesh::from_vertices_and_faces(vertices, faces);
    if let Some(normals) = reader.read_normals() {
        geometry.set_normals(normals.map(Vector3f::from).collect());
    }

    Ok(Mesh::new(geometry, convert_material(&primitive.material())))
}

fn convert_material(material: &gltf::Material<'_>) -> Material {
    let pbr = material.pbr_metallic_roughness();
    // Factors are linear, `Color` is sRGB
    let [r, g, b, _] = pbr.base_color_factor();
    let mut out = Material::standard(Color::from_linear(r, g, b), pbr.roughness_factor());
    out.metalness = pbr.metallic_factor();
    out.double_sided = material.double_sided();
    if let Some(name) = material.name() {
        out = out.with_name(name);
    }
    out
}
