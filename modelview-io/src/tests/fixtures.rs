//! Programmatic glTF fixtures

use serde_json::json;
use std::path::{Path, PathBuf};

/// Quad spanning [0, 100] on X and Y in its local frame, two triangles
pub const QUAD_POSITIONS: [[f32; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [100.0, 0.0, 0.0],
    [100.0, 100.0, 0.0],
    [0.0, 100.0, 0.0],
];
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

fn quad_buffer() -> Vec<u8> {
    let mut bytes = Vec::new();
    for p in QUAD_POSITIONS {
        for c in p {
            bytes.extend_from_slice(&c.to_le_bytes());
        }
    }
    for i in QUAD_INDICES {
        bytes.extend_from_slice(&i.to_le_bytes());
    }
    bytes
}

/// Scene layout:
///
/// ```text
/// body
/// ├── mesh_64   (red-ish material, translated +100 on X)
/// └── mesh_58   (two primitives)
/// ```
pub fn write_sample_gltf(dir: &Path) -> PathBuf {
    let buffer = quad_buffer();
    std::fs::write(dir.join("sample.bin"), &buffer).expect("write bin");

    let document = json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "name": "Scene", "nodes": [0] }],
        "nodes": [
            { "name": "body", "children": [1, 2] },
            { "name": "mesh_64", "mesh": 0, "translation": [100.0, 0.0, 0.0] },
            { "name": "mesh_58", "mesh": 1 }
        ],
        "meshes": [
            { "name": "plate", "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 }] },
            { "name": "split", "primitives": [
                { "attributes": { "POSITION": 0 }, "indices": 1 },
                { "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 }
            ] }
        ],
        "materials": [{
            "name": "paint",
            "pbrMetallicRoughness": {
                "baseColorFactor": [0.8, 0.2, 0.1, 1.0],
                "roughnessFactor": 0.25,
                "metallicFactor": 0.0
            }
        }],
        "buffers": [{ "uri": "sample.bin", "byteLength": buffer.len() }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 48 },
            { "buffer": 0, "byteOffset": 48, "byteLength": 12 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 4, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [100.0, 100.0, 0.0] },
            { "bufferView": 1, "componentType": 5123, "count": 6, "type": "SCALAR" }
        ]
    });

    let path = dir.join("sample.gltf");
    std::fs::write(&path, serde_json::to_vec_pretty(&document).expect("json")).expect("write gltf");
    path
}

/// Unnamed nodes and meshes, plus one mesh shared by two nodes:
///
/// ```text
/// (node)               -> mesh 0, unnamed
/// (node)               -> mesh 1, unnamed
/// "left door.001"      -> mesh 2 "door"
/// (node)               -> mesh 2 "door"
/// ```
pub fn write_unnamed_gltf(dir: &Path) -> PathBuf {
    let buffer = quad_buffer();
    std::fs::write(dir.join("unnamed.bin"), &buffer).expect("write bin");

    let primitives = json!([{ "attributes": { "POSITION": 0 }, "indices": 1 }]);
    let document = json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0, 1, 2, 3] }],
        "nodes": [
            { "mesh": 0 },
            { "mesh": 1 },
            { "name": "left door.001", "mesh": 2 },
            { "mesh": 2 }
        ],
        "meshes": [
            { "primitives": primitives },
            { "primitives": primitives },
            { "name": "door", "primitives": primitives }
        ],
        "buffers": [{ "uri": "unnamed.bin", "byteLength": buffer.len() }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 48 },
            { "buffer": 0, "byteOffset": 48, "byteLength": 12 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 4, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [100.0, 100.0, 0.0] },
            { "bufferView": 1, "componentType": 5123, "count": 6, "type": "SCALAR" }
        ]
    });

    let path = dir.join("unnamed.gltf");
    std::fs::write(&path, serde_json::to_vec_pretty(&document).expect("json")).expect("write gltf");
    path
}
