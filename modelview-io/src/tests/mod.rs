//! Test modules for modelview-io
//!
//! glTF fixtures are generated on the fly into temporary directories.

pub mod fixtures;
pub mod gltf_import_tests;
