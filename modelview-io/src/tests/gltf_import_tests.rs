//! Tests for glTF import

use super::fixtures::{write_sample_gltf, write_unnamed_gltf};
use crate::{read_scene, sanitize_name, GltfReader, IoError, NameRegistry, SceneReader};
use approx::assert_relative_eq;
use modelview_core::Color;
use tempfile::tempdir;

#[test]
fn test_import_keeps_hierarchy_and_names() {
    let dir = tempdir().unwrap();
    let path = write_sample_gltf(dir.path());

    let root = read_scene(&path).unwrap();
    assert_eq!(root.name, "Scene");
    assert_eq!(root.children.len(), 1);

    let body = &root.children[0];
    assert_eq!(body.name, "body");
    assert!(!body.is_mesh());
    assert!(root.find("mesh_64").is_some_and(|n| n.is_mesh()));
}

#[test]
fn test_import_reads_transform_and_geometry() {
    let dir = tempdir().unwrap();
    let root = GltfReader::read_scene(write_sample_gltf(dir.path())).unwrap();

    let node = root.find("mesh_64").unwrap();
    assert_relative_eq!(node.transform.translation.x, 100.0);
    let mesh = node.mesh.as_ref().unwrap();
    assert_eq!(mesh.geometry.vertex_count(), 4);
    assert_eq!(mesh.geometry.faces, vec![[0, 1, 2], [0, 2, 3]]);
}

#[test]
fn test_import_reads_material() {
    let dir = tempdir().unwrap();
    let root = read_scene(write_sample_gltf(dir.path())).unwrap();

    let material = &root.find("mesh_64").unwrap().mesh.as_ref().unwrap().material;
    // Linear factors come back out of the sRGB color unchanged
    let [r, g, _] = material.color.to_linear();
    assert_relative_eq!(r, 0.8, epsilon = 1e-5);
    assert_relative_eq!(g, 0.2, epsilon = 1e-5);
    assert_eq!(material.color.to_hex(), "#e77c59");
    assert_relative_eq!(material.roughness, 0.25);
    assert_eq!(material.name.as_deref(), Some("paint"));
}

#[test]
fn test_multi_primitive_mesh_splits_into_children() {
    let dir = tempdir().unwrap();
    let root = read_scene(write_sample_gltf(dir.path())).unwrap();

    let split = root.find("mesh_58").unwrap();
    assert!(!split.is_mesh());
    let names: Vec<&str> = split.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["split", "split_1"]);

    // First primitive has no material and gets the glTF default
    let default = &split.children[0].mesh.as_ref().unwrap().material;
    assert_eq!(default.color.to_hex(), Color::WHITE.to_hex());
    assert_relative_eq!(default.metalness, 1.0);
    assert_eq!(root.mesh_count(), 3);
}

#[test]
fn test_unnamed_meshes_fall_back_to_mesh_index() {
    let dir = tempdir().unwrap();
    let path = write_unnamed_gltf(dir.path());
    let bytes = std::fs::read(&path).unwrap();
    let root = GltfReader::from_slice(&bytes, Some(dir.path())).unwrap();

    assert_eq!(root.name, "");
    assert!(root.find("mesh_0").is_some_and(|n| n.is_mesh()));
    assert!(root.find("mesh_1").is_some_and(|n| n.is_mesh()));
}

#[test]
fn test_node_names_are_sanitized_and_shared_meshes_instanced() {
    let dir = tempdir().unwrap();
    let root = read_scene(write_unnamed_gltf(dir.path())).unwrap();

    let names: Vec<&str> = root.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["mesh_0", "mesh_1", "left_door001", "door_instance_1"]);
}

#[test]
fn test_name_registry_suffixes_repeats() {
    let mut names = NameRegistry::default();
    assert_eq!(names.unique("mesh_60"), "mesh_60");
    assert_eq!(names.unique("mesh_60"), "mesh_60_1");
    assert_eq!(names.unique("mesh_60"), "mesh_60_2");
    assert_eq!(names.unique("a b"), "a_b");
    assert_eq!(names.unique("a_b"), "a_b_1");
    assert_eq!(sanitize_name("Wheel [L].001:x/y"), "Wheel_L001xy");
}

#[test]
fn test_unsupported_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.obj");
    std::fs::write(&path, b"v 0 0 0").unwrap();
    assert!(matches!(read_scene(&path), Err(IoError::InvalidFormat { .. })));
}

#[test]
fn test_missing_file() {
    let dir = tempdir().unwrap();
    let result = read_scene(dir.path().join("absent.glb"));
    assert!(matches!(result, Err(IoError::FileNotFound { .. })));
}

#[test]
fn test_garbage_is_a_gltf_error() {
    let result = GltfReader::from_slice(b"not a model", None);
    assert!(matches!(result, Err(IoError::Gltf(_))));
}
